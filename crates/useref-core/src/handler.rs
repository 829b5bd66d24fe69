//! Custom block handlers.
//!
//! Blocks whose type is not `css`, `js` or `remove` are passed to the handler
//! registered for that type. A handler returns the reference text to put in
//! place of the block, or `None` to leave the block untouched.

use crate::error::OptionsError;

/// Block data handed to a [`BlockHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockContext<'a> {
    /// Lines between the directive and the terminator, joined with the
    /// document's line ending.
    pub content: &'a str,
    /// Directive target, `replace` when the directive has none.
    pub target: &'a str,
    /// Directive attributes.
    pub attributes: Option<&'a str>,
    /// Raw alternate search paths from the directive.
    pub alternate_search_paths: Option<&'a str>,
    /// Line number of the directive (1-indexed).
    pub line: usize,
}

/// Handler for a custom block type.
///
/// Implemented for any `Fn(&BlockContext) -> Option<String>` closure.
///
/// # Example
///
/// ```
/// use useref_core::{BlockContext, TransformOptions, transform};
///
/// let options = TransformOptions::new()
///     .with_handler("img", |ctx: &BlockContext<'_>| {
///         Some(format!(r#"<img src="{}">"#, ctx.target))
///     })
///     .unwrap();
///
/// let html = "<!-- build:img sprite.png -->\n<img src=\"a.png\">\n<!-- endbuild -->";
/// let result = transform(html, &options);
/// assert_eq!(result.content, r#"<img src="sprite.png">"#);
/// ```
pub trait BlockHandler: Send + Sync {
    /// Produce the replacement for a block, or `None` to keep it as is.
    fn process(&self, ctx: &BlockContext<'_>) -> Option<String>;
}

impl<F> BlockHandler for F
where
    F: Fn(&BlockContext<'_>) -> Option<String> + Send + Sync,
{
    fn process(&self, ctx: &BlockContext<'_>) -> Option<String> {
        self(ctx)
    }
}

/// Placeholder available in a [`TemplateHandler`] template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Target,
    Attributes,
    SearchPaths,
    Content,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "target" => Some(Self::Target),
            "attributes" => Some(Self::Attributes),
            "search_paths" => Some(Self::SearchPaths),
            "content" => Some(Self::Content),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Placeholder(Placeholder),
}

/// Handler that renders a fixed text template.
///
/// Supported placeholders: `{target}`, `{attributes}`, `{search_paths}` and
/// `{content}`. Absent values render as empty strings. Braces around anything
/// that is not an identifier (`{ color: red }`) are kept literally.
///
/// # Example
///
/// ```
/// use useref_core::{BlockContext, BlockHandler, TemplateHandler};
///
/// let handler = TemplateHandler::parse("img", r#"<img src="{target}">"#).unwrap();
/// let ctx = BlockContext {
///     content: "",
///     target: "sprite.png",
///     attributes: None,
///     alternate_search_paths: None,
///     line: 1,
/// };
/// assert_eq!(handler.process(&ctx).as_deref(), Some(r#"<img src="sprite.png">"#));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateHandler {
    segments: Vec<Segment>,
}

impl TemplateHandler {
    /// Parse a template for block type `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::UnknownPlaceholder`] for an identifier in braces
    /// that is not a supported placeholder.
    pub fn parse(kind: &str, template: &str) -> Result<Self, OptionsError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut remaining = template;

        while let Some(open) = remaining.find('{') {
            text.push_str(&remaining[..open]);
            let after = &remaining[open + 1..];

            let Some(close) = after.find('}') else {
                text.push_str(&remaining[open..]);
                remaining = "";
                break;
            };

            let name = &after[..close];
            if let Some(placeholder) = Placeholder::from_name(name) {
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Placeholder(placeholder));
            } else if crate::directive::is_valid_type(name) {
                return Err(OptionsError::UnknownPlaceholder {
                    kind: kind.to_owned(),
                    placeholder: name.to_owned(),
                });
            } else {
                text.push_str(&remaining[open..=open + close + 1]);
            }
            remaining = &after[close + 1..];
        }

        text.push_str(remaining);
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self { segments })
    }

    fn render(&self, ctx: &BlockContext<'_>) -> String {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Placeholder(Placeholder::Target) => output.push_str(ctx.target),
                Segment::Placeholder(Placeholder::Attributes) => {
                    output.push_str(ctx.attributes.unwrap_or_default());
                }
                Segment::Placeholder(Placeholder::SearchPaths) => {
                    output.push_str(ctx.alternate_search_paths.unwrap_or_default());
                }
                Segment::Placeholder(Placeholder::Content) => output.push_str(ctx.content),
            }
        }
        output
    }
}

impl BlockHandler for TemplateHandler {
    fn process(&self, ctx: &BlockContext<'_>) -> Option<String> {
        Some(self.render(ctx))
    }
}
