//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Color math and conversions
//! - Logging utilities

pub mod math;
pub mod logging;
