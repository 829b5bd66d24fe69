//! Build directive syntax parsing.
//!
//! Recognizes block-start comments of the form
//! `<!-- build:type(alternate) target attributes -->` (or the `//-` line-comment
//! variant), the matching `<!-- endbuild -->` terminator, and IE conditional
//! comment spans that wrap a block.

use std::sync::LazyLock;

use regex::Regex;

/// Directive type for stylesheet blocks.
pub const CSS: &str = "css";
/// Directive type for script blocks.
pub const JS: &str = "js";
/// Directive type for blocks that are dropped from the output.
pub const REMOVE: &str = "remove";

/// Types with built-in reference synthesis. Handlers cannot be registered for these.
pub const RESERVED_TYPES: [&str; 3] = [CSS, JS, REMOVE];

/// Target used when a directive does not name one.
pub const DEFAULT_TARGET: &str = "replace";

const OPENERS: [&str; 2] = ["<!--", "//-"];
const CLOSER: &str = "-->";
const BUILD_PREFIX: &str = "build:";

static END_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:<!--|//-)\s*endbuild\s*-->").unwrap());

/// IE conditional comment: `$1` is the opening comment, `$2` the closing one.
static CONDITIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(<!--\[if\s.*?\]>)(?s:.*?)(<!\[endif\]-->)").unwrap()
});

/// Parsed block-start directive.
///
/// # Example
///
/// ```
/// use useref_core::Directive;
///
/// let directive = Directive::parse(r#"<!-- build:js(app) scripts/app.js defer -->"#).unwrap();
/// assert_eq!(directive.kind, "js");
/// assert_eq!(directive.alternate_search_paths.as_deref(), Some("app"));
/// assert_eq!(directive.target.as_deref(), Some("scripts/app.js"));
/// assert_eq!(directive.attributes.as_deref(), Some("defer"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Directive type (`css`, `js`, `remove` or a custom identifier).
    pub kind: String,
    /// Raw text from the parenthesized argument, passed through untouched.
    pub alternate_search_paths: Option<String>,
    /// Output path of the built artifact.
    pub target: Option<String>,
    /// Extra attributes spliced into the synthesized tag.
    pub attributes: Option<String>,
}

impl Directive {
    /// Parse a line as a block-start directive.
    ///
    /// The first comment opener on the line that forms a complete directive
    /// wins. Returns `None` if the line holds no directive.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        line.char_indices().find_map(|(pos, _)| {
            let rest = &line[pos..];
            OPENERS
                .iter()
                .find_map(|opener| rest.strip_prefix(*opener))
                .and_then(parse_after_opener)
        })
    }

    /// Target path, falling back to [`DEFAULT_TARGET`].
    #[must_use]
    pub fn target_or_default(&self) -> &str {
        self.target.as_deref().unwrap_or(DEFAULT_TARGET)
    }
}

/// Check whether a line carries a block terminator (`<!-- endbuild -->`).
#[must_use]
pub fn is_end_marker(line: &str) -> bool {
    END_MARKER_RE.is_match(line)
}

/// Parse the text following a comment opener.
fn parse_after_opener(rest: &str) -> Option<Directive> {
    let rest = rest.trim_start().strip_prefix(BUILD_PREFIX)?;

    let kind_len = rest
        .find(|c: char| !is_type_char(c))
        .unwrap_or(rest.len());
    if kind_len == 0 {
        return None;
    }
    let (kind, mut rest) = rest.split_at(kind_len);

    let mut alternate_search_paths = None;
    if let Some((alternate, after)) = parse_parens(rest)
        && after.contains(CLOSER)
    {
        alternate_search_paths = Some(alternate.to_owned());
        rest = after;
    }

    let (target, tail) = split_target(rest.trim_start());
    let close = tail.rfind(CLOSER)?;
    let attributes = non_empty(tail[..close].trim());

    Some(Directive {
        kind: kind.to_owned(),
        alternate_search_paths,
        target: target.map(ToOwned::to_owned),
        attributes,
    })
}

/// Parse `(...)` with at least one character inside.
///
/// Returns (inner text, remainder after the closing paren).
fn parse_parens(s: &str) -> Option<(&str, &str)> {
    let inner = s.strip_prefix('(')?;
    let end = inner.find(')')?;
    if end == 0 {
        return None;
    }
    Some((&inner[..end], &inner[end + 1..]))
}

/// Split the target token off the front of `s`.
///
/// A token that runs straight into the closer (`file.css-->`) ends before it.
/// A token is only a target when a closer follows it, so a bare `-->` never is.
fn split_target(s: &str) -> (Option<&str>, &str) {
    let run_len = s.find(char::is_whitespace).unwrap_or(s.len());
    let run = &s[..run_len];

    if let Some(close) = run.rfind(CLOSER).filter(|&i| i > 0) {
        return (Some(&run[..close]), &s[close..]);
    }
    if run_len > 0 && s[run_len..].contains(CLOSER) {
        return (Some(run), &s[run_len..]);
    }
    (None, s)
}

/// Characters allowed in a directive type identifier.
pub(crate) fn is_type_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Check if a name is a valid directive type identifier.
pub(crate) fn is_valid_type(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_type_char)
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}

/// IE conditional comment span wrapping a build block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionalComment<'a> {
    /// Opening comment, e.g. `<!--[if lt IE 9]>`.
    pub opener: &'a str,
    /// Closing comment: `<![endif]-->`.
    pub closer: &'a str,
}

impl<'a> ConditionalComment<'a> {
    /// Find the first conditional comment span in `text`.
    #[must_use]
    pub fn find(text: &'a str) -> Option<Self> {
        let caps = CONDITIONAL_RE.captures(text)?;
        Some(Self {
            opener: caps.get(1)?.as_str(),
            closer: caps.get(2)?.as_str(),
        })
    }
}
