//! MJML-subset to HTML approximation for live preview.
//!
//! This is an ordered list of textual rewrites applied once each, left to
//! right, over the whole input. It does not build a tree, validate nesting,
//! honour attributes or escape inner text. Body, section and column tags only
//! match in their bare form; carrying attributes they pass through untouched.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

/// Shown instead of an empty preview.
pub const PLACEHOLDER_HTML: &str = "<p>No content to preview</p>";

const BODY_OPEN: &str =
    r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">"#;
const SECTION_OPEN: &str = r#"<div style="padding: 20px 0;">"#;
const COLUMN_OPEN: &str = r#"<div style="padding: 0 10px;">"#;
const TEXT_OPEN: &str = r#"<div style="line-height: 1.6; color: #333;">"#;
const BUTTON_OPEN: &str = r#"<a style="display: inline-block; padding: 12px 24px; background-color: #007bff; color: white; text-decoration: none; border-radius: 4px; margin: 10px 0;">"#;
const DIVIDER: &str = r#"<hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">"#;
const SPACER: &str = r#"<div style="height: 20px;"></div>"#;

enum Matcher {
    /// Exact substring.
    Literal(&'static str),
    /// `<tag ...>` with any attributes, which are discarded.
    OpenTag(Regex),
}

struct RewriteRule {
    matcher: Matcher,
    replacement: &'static str,
}

impl RewriteRule {
    fn literal(pattern: &'static str, replacement: &'static str) -> Self {
        Self {
            matcher: Matcher::Literal(pattern),
            replacement,
        }
    }

    fn open_tag(tag: &str, replacement: &'static str) -> Self {
        let pattern = format!("<{}[^>]*>", regex::escape(tag));
        Self {
            matcher: Matcher::OpenTag(Regex::new(&pattern).expect("hardcoded regex")),
            replacement,
        }
    }

    fn apply(&self, input: &str) -> String {
        match &self.matcher {
            Matcher::Literal(pattern) => input.replace(pattern, self.replacement),
            Matcher::OpenTag(re) => re.replace_all(input, NoExpand(self.replacement)).into_owned(),
        }
    }
}

static RULES: Lazy<Vec<RewriteRule>> = Lazy::new(|| {
    vec![
        RewriteRule::literal("<mjml>", ""),
        RewriteRule::literal("</mjml>", ""),
        RewriteRule::literal("<mj-body>", BODY_OPEN),
        RewriteRule::literal("</mj-body>", "</div>"),
        RewriteRule::literal("<mj-section>", SECTION_OPEN),
        RewriteRule::literal("</mj-section>", "</div>"),
        RewriteRule::literal("<mj-column>", COLUMN_OPEN),
        RewriteRule::literal("</mj-column>", "</div>"),
        RewriteRule::open_tag("mj-text", TEXT_OPEN),
        RewriteRule::literal("</mj-text>", "</div>"),
        RewriteRule::open_tag("mj-button", BUTTON_OPEN),
        RewriteRule::literal("</mj-button>", "</a>"),
        RewriteRule::open_tag("mj-divider", DIVIDER),
        RewriteRule::open_tag("mj-spacer", SPACER),
    ]
});

/// Render `content` to preview HTML. Pure: the same input always produces
/// the same output. Blank input renders [`PLACEHOLDER_HTML`].
pub fn render_preview(content: &str) -> String {
    if content.trim().is_empty() {
        return PLACEHOLDER_HTML.to_string();
    }

    let html = RULES
        .iter()
        .fold(content.to_string(), |acc, rule| rule.apply(&acc));

    metrics::counter!("preview.renders").increment(1);
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_block() {
        assert_eq!(
            render_preview("<mj-text>Hi</mj-text>"),
            r#"<div style="line-height: 1.6; color: #333;">Hi</div>"#
        );
    }

    #[test]
    fn test_blank_input_renders_placeholder() {
        assert_eq!(render_preview(""), PLACEHOLDER_HTML);
        assert_eq!(render_preview("   "), PLACEHOLDER_HTML);
        assert_eq!(render_preview("\n\t "), PLACEHOLDER_HTML);
    }

    #[test]
    fn test_deterministic() {
        let input = "<mjml><mj-body><mj-section><mj-column><mj-text>Hello</mj-text></mj-column></mj-section></mj-body></mjml>";
        assert_eq!(render_preview(input), render_preview(input));
    }

    #[test]
    fn test_full_document() {
        let input = concat!(
            "<mjml><mj-body><mj-section><mj-column>",
            "<mj-text font-size=\"20px\">Welcome</mj-text>",
            "<mj-button href=\"https://example.com\">Shop</mj-button>",
            "</mj-column></mj-section></mj-body></mjml>"
        );
        let expected = format!(
            "{}{}{}{}Welcome</div>{}Shop</a></div></div></div>",
            BODY_OPEN, SECTION_OPEN, COLUMN_OPEN, TEXT_OPEN, BUTTON_OPEN
        );
        assert_eq!(render_preview(input), expected);
    }

    #[test]
    fn test_attributes_are_discarded() {
        let html = render_preview(r#"<mj-button href="https://x.test" background-color="red">Go</mj-button>"#);
        assert_eq!(html, format!("{}Go</a>", BUTTON_OPEN));
        assert!(!html.contains("x.test"));
    }

    #[test]
    fn test_self_closing_divider_and_spacer() {
        assert_eq!(render_preview("<mj-divider />"), DIVIDER);
        assert_eq!(render_preview(r#"<mj-spacer height="40px" />"#), SPACER);
        assert_eq!(render_preview("<mj-divider>"), DIVIDER);
    }

    #[test]
    fn test_section_with_attributes_passes_through() {
        let input = r##"<mj-section background-color="#fff">x</mj-section>"##;
        assert_eq!(
            render_preview(input),
            r##"<mj-section background-color="#fff">x</div>"##
        );
    }

    #[test]
    fn test_inner_text_is_not_escaped() {
        let html = render_preview("<mj-text><b>bold</b> & <i>it</i></mj-text>");
        assert!(html.contains("<b>bold</b> & <i>it</i>"));
    }

    #[test]
    fn test_dollar_signs_survive_rewrite() {
        let html = render_preview("<mj-text>Save $20 today</mj-text>");
        assert!(html.contains("Save $20 today"));
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(render_preview("just words"), "just words");
    }
}
