//! Passthrough materials
//!
//! A card may carry renderer-native material text as numbered lines:
//!
//! ```text
//! Render.Ospray.0001 = # A custom OSPRay material
//! Render.Ospray.0002 = mat.%NAME%.type = principled
//! ```
//!
//! The lines for one renderer are concatenated in sequence order and handed
//! to that renderer verbatim, after pseudovariable substitution.

use crate::assets::materials::MaterialCard;
use super::resolver::ResolutionContext;

/// One numbered line of renderer-native text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughLine {
    /// Sequence number, 1 to 9999
    pub sequence: u16,
    /// Line text, taken literally
    pub text: String,
}

/// All passthrough lines of a card for one renderer, in sequence order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughBlock {
    /// Renderer name
    pub renderer: String,
    /// Lines sorted by sequence number
    pub lines: Vec<PassthroughLine>,
}

impl PassthroughBlock {
    /// Lines joined with newlines
    pub fn script(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Copy of the block with pseudovariables substituted in every line
    pub fn substitute(&self, ctx: &ResolutionContext) -> Self {
        Self {
            renderer: self.renderer.clone(),
            lines: self
                .lines
                .iter()
                .map(|l| PassthroughLine {
                    sequence: l.sequence,
                    text: substitute_pseudovariables(&l.text, ctx),
                })
                .collect(),
        }
    }
}

/// Parse a 4-digit sequence suffix; `0000` is not a valid sequence
fn parse_sequence(suffix: &str) -> Option<u16> {
    if suffix.len() != 4 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok().filter(|&n| n > 0)
}

/// Collects passthrough lines from cards
pub struct PassthroughAssembler;

impl PassthroughAssembler {
    /// Assemble the passthrough block of a renderer
    ///
    /// Matches keys `Render.<renderer>.<NNNN>` exactly (case-sensitive,
    /// exactly four digits). Returns `None` when the card has no line for
    /// this renderer.
    pub fn assemble(card: &MaterialCard, renderer: &str) -> Option<PassthroughBlock> {
        let prefix = format!("Render.{}.", renderer);
        let mut lines: Vec<PassthroughLine> = card
            .with_prefix(&prefix)
            .filter_map(|(suffix, entry)| {
                parse_sequence(suffix).map(|sequence| PassthroughLine {
                    sequence,
                    text: entry.value.clone(),
                })
            })
            .collect();

        if lines.is_empty() {
            return None;
        }

        // Stable: equal sequences keep card order
        lines.sort_by_key(|l| l.sequence);
        log::debug!("Assembled {} passthrough lines for renderer '{}'", lines.len(), renderer);

        Some(PassthroughBlock {
            renderer: renderer.to_string(),
            lines,
        })
    }

    /// Names of all renderers with passthrough lines in a card, sorted
    pub fn renderers(card: &MaterialCard) -> Vec<String> {
        let mut names: Vec<String> = card
            .with_prefix("Render.")
            .filter_map(|(rest, _)| {
                let (renderer, suffix) = rest.rsplit_once('.')?;
                (!renderer.is_empty() && !renderer.contains('.') && parse_sequence(suffix).is_some())
                    .then(|| renderer.to_string())
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Replace `%NAME%`, `%RED%`, `%GREEN%` and `%BLUE%` in a line
///
/// Color components are written with six decimals. Substituted text is not
/// scanned again, so an object name may itself contain `%RED%`.
pub fn substitute_pseudovariables(line: &str, ctx: &ResolutionContext) -> String {
    let color = ctx.default_color;
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let replacement = [
            ("%NAME%", ctx.name.clone()),
            ("%RED%", format!("{:.6}", color.x)),
            ("%GREEN%", format!("{:.6}", color.y)),
            ("%BLUE%", format!("{:.6}", color.z)),
        ]
        .into_iter()
        .find(|(token, _)| tail.starts_with(token));

        match replacement {
            Some((token, value)) => {
                out.push_str(&value);
                rest = &tail[token.len()..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::materials::CardParser;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_lines_sorted_by_sequence() {
        let card = CardParser::parse(
            "Render.Foo.0002 = foo\nRender.Foo.0001 = bar\nRender.Foo.0010 = baz\n",
        )
        .unwrap();

        let block = PassthroughAssembler::assemble(&card, "Foo").unwrap();
        let texts: Vec<&str> = block.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["bar", "foo", "baz"]);
        assert_eq!(block.script(), "bar\nfoo\nbaz");
    }

    #[test]
    fn test_only_exact_four_digit_suffixes() {
        let card = CardParser::parse(
            r#"
Render.Foo.0000 = zero
Render.Foo.001 = short
Render.Foo.00001 = long
Render.Foo.00a1 = letters
Render.foo.0001 = lowercase renderer
Render.Foo.Color = (1, 1, 1)
Render.Foo.0003 = kept
"#,
        )
        .unwrap();

        let block = PassthroughAssembler::assemble(&card, "Foo").unwrap();
        assert_eq!(block.lines, vec![PassthroughLine { sequence: 3, text: "kept".to_string() }]);
        assert!(PassthroughAssembler::assemble(&card, "Bar").is_none());
    }

    #[test]
    fn test_renderers() {
        let card = CardParser::parse(
            "Render.Type = Diffuse\nRender.Ospray.0001 = a\nRender.Cycles.0001 = b\nRender.Ospray.0002 = c\nRender.Diffuse.Color = (1, 1, 1)\n",
        )
        .unwrap();
        assert_eq!(PassthroughAssembler::renderers(&card), ["Cycles", "Ospray"]);
    }

    #[test]
    fn test_pseudovariables() {
        let ctx = ResolutionContext::new("Cube", Vec3::new(0.5, 0.25, 1.0));
        assert_eq!(
            substitute_pseudovariables("mat.%NAME%.kd = %RED% %GREEN% %BLUE% # %NAME%", &ctx),
            "mat.Cube.kd = 0.500000 0.250000 1.000000 # Cube"
        );

        let card = CardParser::parse("Render.Foo.0001 = name %NAME%\n").unwrap();
        let block = PassthroughAssembler::assemble(&card, "Foo").unwrap().substitute(&ctx);
        assert_eq!(block.script(), "name Cube");
    }

    #[test]
    fn test_pseudovariables_not_rescanned() {
        let ctx = ResolutionContext::new("Part%RED%", Vec3::new(0.5, 0.5, 0.5));
        assert_eq!(substitute_pseudovariables("name %NAME%", &ctx), "name Part%RED%");
        assert_eq!(substitute_pseudovariables("100% %%RED% %BLUE", &ctx), "100% %0.500000 %BLUE");
    }
}
