//! Reference synthesis.
//!
//! Computes the text that replaces each build block and splices it into the
//! document.

use std::sync::LazyLock;

use regex::Regex;

use crate::block::{Block, BlockTable, LineEnding};
use crate::directive::{CSS, ConditionalComment, JS, REMOVE};
use crate::handler::BlockContext;
use crate::options::TransformOptions;
use crate::splice::Splices;

/// Stylesheet link element, anywhere on one line.
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)link[^\r\n]*?(?:>|\))").unwrap());

/// Script element: `script` followed by a closing tag or paren.
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)script\b.*?(?:</script>|\))").unwrap());

/// Rewrite `content`, replacing every resolved block in `table`.
///
/// `table` must have been extracted from `content`.
#[must_use]
pub fn synthesize(content: &str, table: &BlockTable<'_>, options: &TransformOptions) -> String {
    let line_ending = table.line_ending();
    let mut splices = Splices::with_capacity(table.len());

    for block in table.blocks() {
        if let Some(replacement) = replacement(block, line_ending, options) {
            splices.add(block.span(), replacement);
        } else {
            tracing::debug!(
                line = block.line_number(),
                kind = %block.directive().kind,
                "Build block left unchanged"
            );
        }
    }

    splices.apply(content)
}

/// Text to put in place of `block`, or `None` to leave it untouched.
fn replacement(
    block: &Block<'_>,
    line_ending: LineEnding,
    options: &TransformOptions,
) -> Option<String> {
    let directive = block.directive();
    let inner = block.inner_content(line_ending);
    let target = directive.target_or_default();
    let attributes = directive.attributes.as_deref();

    let reference = match directive.kind.as_str() {
        CSS => css_reference(&inner, target, attributes),
        JS => js_reference(&inner, target, attributes),
        REMOVE => String::new(),
        kind => {
            let handler = options.handler(kind)?;
            handler.process(&BlockContext {
                content: &inner,
                target,
                attributes,
                alternate_search_paths: directive.alternate_search_paths.as_deref(),
                line: block.line_number(),
            })?
        }
    };

    if options.noconcat() {
        return Some(inner);
    }

    let indent = block.indent();
    let reference = format!("{indent}{reference}");

    tracing::debug!(
        line = block.line_number(),
        kind = %directive.kind,
        output = target,
        "Synthesized reference"
    );

    let text = block.text(line_ending);
    let wrapped = match ConditionalComment::find(&text) {
        Some(cc) => {
            let newline = line_ending.as_str();
            format!(
                "{indent}{}{newline}{reference}{newline}{indent}{}",
                cc.opener, cc.closer
            )
        }
        None => reference,
    };
    Some(wrapped)
}

/// Stylesheet reference, or an empty string if the block links no stylesheet.
fn css_reference(inner: &str, target: &str, attributes: Option<&str>) -> String {
    if !LINK_RE.is_match(inner) {
        return String::new();
    }
    match attributes {
        Some(attributes) => format!(r#"<link rel="stylesheet" href="{target}" {attributes}>"#),
        None => format!(r#"<link rel="stylesheet" href="{target}">"#),
    }
}

/// Script reference, or an empty string if the block holds no script.
fn js_reference(inner: &str, target: &str, attributes: Option<&str>) -> String {
    if !SCRIPT_RE.is_match(inner) {
        return String::new();
    }
    match attributes {
        Some(attributes) => format!(r#"<script src="{target}" {attributes}></script>"#),
        None => format!(r#"<script src="{target}"></script>"#),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rewrite(content: &str, options: &TransformOptions) -> String {
        let table = BlockTable::extract(content);
        synthesize(content, &table, options)
    }

    #[test]
    fn test_css_reference() {
        assert_eq!(
            css_reference("<link href=\"a.css\">", "out.css", None),
            r#"<link rel="stylesheet" href="out.css">"#
        );
        assert_eq!(
            css_reference("<link href=\"a.css\">", "out.css", Some("media=\"print\"")),
            r#"<link rel="stylesheet" href="out.css" media="print">"#
        );
        assert_eq!(css_reference("<!-- nothing -->", "out.css", None), "");
    }

    #[test]
    fn test_js_reference() {
        assert_eq!(
            js_reference("<script src=\"a.js\"></script>", "out.js", None),
            r#"<script src="out.js"></script>"#
        );
        assert_eq!(
            js_reference("<script src=\"a.js\"></script>", "out.js", Some("defer")),
            r#"<script src="out.js" defer></script>"#
        );
        assert_eq!(js_reference("   ", "out.js", None), "");
    }

    #[test]
    fn test_script_spanning_lines() {
        assert!(SCRIPT_RE.is_match("<script>\n  var a = 1;\n</script>"));
        assert!(!SCRIPT_RE.is_match("<scripts src=\"a.js\">"));
    }

    #[test]
    fn test_rewrite_keeps_indent_and_surroundings() {
        let content = "<head>\n    <!-- build:css out.css -->\n    <link href=\"a.css\">\n    <!-- endbuild -->\n</head>\n";
        assert_eq!(
            rewrite(content, &TransformOptions::new()),
            "<head>\n    <link rel=\"stylesheet\" href=\"out.css\">\n</head>\n"
        );
    }

    #[test]
    fn test_remove_block_deleted() {
        let content = "a\n<!-- build:remove -->\n<script src=\"dev.js\"></script>\n<!-- endbuild -->\nb\n";
        assert_eq!(rewrite(content, &TransformOptions::new()), "a\n\nb\n");
    }

    #[test]
    fn test_missing_target_defaults_to_replace() {
        let content = "<!-- build:js -->\n<script src=\"a.js\"></script>\n<!-- endbuild -->";
        assert_eq!(
            rewrite(content, &TransformOptions::new()),
            r#"<script src="replace"></script>"#
        );
    }

    #[test]
    fn test_unknown_type_left_unchanged() {
        let content = "<!-- build:img sprite.png -->\n<img src=\"a.png\">\n<!-- endbuild -->\n";
        assert_eq!(rewrite(content, &TransformOptions::new()), content);
    }

    #[test]
    fn test_handler_output_used() {
        let options = TransformOptions::new()
            .with_handler("img", |ctx: &BlockContext<'_>| {
                Some(format!("<img src=\"{}\" data-from=\"{}\">", ctx.target, ctx.content.trim()))
            })
            .unwrap();
        let content = "  <!-- build:img sprite.png -->\n  <img src=\"a.png\">\n  <!-- endbuild -->\n";
        assert_eq!(
            rewrite(content, &options),
            "  <img src=\"sprite.png\" data-from=\"<img src=\"a.png\">\">\n"
        );
    }

    #[test]
    fn test_handler_receives_block_details() {
        let options = TransformOptions::new()
            .with_handler("inline", |ctx: &BlockContext<'_>| {
                Some(format!(
                    "{}|{}|{}|{}",
                    ctx.target,
                    ctx.attributes.unwrap_or("-"),
                    ctx.alternate_search_paths.unwrap_or("-"),
                    ctx.line
                ))
            })
            .unwrap();
        let content = "x\n<!-- build:inline(app) out.html async -->\n<!-- endbuild -->";
        assert_eq!(rewrite(content, &options), "x\nout.html|async|app|2");
    }

    #[test]
    fn test_handler_declining_leaves_block() {
        let options = TransformOptions::new()
            .with_handler("img", |_: &BlockContext<'_>| -> Option<String> { None })
            .unwrap();
        let content = "<!-- build:img a.png -->\n<img src=\"b.png\">\n<!-- endbuild -->";
        assert_eq!(rewrite(content, &options), content);
    }

    #[test]
    fn test_noconcat_inlines_block_content() {
        let options = TransformOptions::new().with_noconcat(true);
        let content = "<!-- build:js out.js -->\n<script src=\"a.js\"></script>\n<script src=\"b.js\"></script>\n<!-- endbuild -->\n";
        assert_eq!(
            rewrite(content, &options),
            "<script src=\"a.js\"></script>\n<script src=\"b.js\"></script>\n"
        );
    }

    #[test]
    fn test_noconcat_keeps_unhandled_blocks() {
        let options = TransformOptions::new().with_noconcat(true);
        let content = "<!-- build:custom out -->\nbody\n<!-- endbuild -->";
        assert_eq!(rewrite(content, &options), content);
    }

    #[test]
    fn test_conditional_comment_preserved() {
        let content = "  <!-- build:js scripts/ie.js -->\n  <!--[if lt IE 9]>\n  <script src=\"html5shiv.js\"></script>\n  <![endif]-->\n  <!-- endbuild -->\n";
        assert_eq!(
            rewrite(content, &TransformOptions::new()),
            "  <!--[if lt IE 9]>\n  <script src=\"scripts/ie.js\"></script>\n  <![endif]-->\n"
        );
    }

    #[test]
    fn test_crlf_document() {
        let content = "<p>\r\n<!-- build:js out.js -->\r\n<!--[if IE]>\r\n<script src=\"a.js\"></script>\r\n<![endif]-->\r\n<!-- endbuild -->\r\n</p>\r\n";
        assert_eq!(
            rewrite(content, &TransformOptions::new()),
            "<p>\r\n<!--[if IE]>\r\n<script src=\"out.js\"></script>\r\n<![endif]-->\r\n</p>\r\n"
        );
    }

    #[test]
    fn test_identical_blocks_rewritten_independently() {
        let content = "<!-- build:js a.js -->\n<script src=\"x.js\"></script>\n<!-- endbuild -->\n<!-- build:js a.js -->\n<script src=\"x.js\"></script>\n<!-- endbuild -->\n";
        assert_eq!(
            rewrite(content, &TransformOptions::new()),
            "<script src=\"a.js\"></script>\n<script src=\"a.js\"></script>\n"
        );
    }

    #[test]
    fn test_unterminated_block_left_unchanged() {
        let content = "<!-- build:css a.css -->\n<link href=\"x.css\">\n";
        assert_eq!(rewrite(content, &TransformOptions::new()), content);
    }
}
