//! Core configuration shared by the parser, the resolver and the tools

pub mod config;
