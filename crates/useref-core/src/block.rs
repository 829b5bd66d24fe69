//! Build block extraction.
//!
//! Scans a document line by line and groups the lines between a start directive
//! and its `endbuild` terminator into [`Block`]s.
//!
//! Blocks do not nest. A start directive seen while a block is still open
//! abandons the open block: it keeps the lines collected so far, never receives
//! a terminator and is reported through [`BlockTable::unterminated`] instead of
//! being rewritten.

use std::collections::HashSet;
use std::ops::Range;

use crate::directive::{self, DEFAULT_TARGET, Directive, REMOVE};

/// Line terminator used to reassemble synthesized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix line endings (`\n`).
    #[default]
    Lf,
    /// Windows line endings (`\r\n`).
    CrLf,
}

impl LineEnding {
    /// Detect the document's line ending: `\r\n` if it occurs anywhere, `\n` otherwise.
    #[must_use]
    pub fn detect(content: &str) -> Self {
        if content.contains("\r\n") {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    /// The terminator text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Identity of a block within one extraction pass.
///
/// Two blocks with the same type, target and attributes get distinct keys
/// through [`suffix`](Self::suffix), assigned from a per-pass counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockKey {
    /// Directive type.
    pub kind: String,
    /// Directive target. For `remove` blocks this is the block's ordinal.
    pub target: Option<String>,
    /// Directive attributes.
    pub attributes: Option<String>,
    /// Disambiguation index for repeated keys.
    pub suffix: Option<usize>,
}

impl BlockKey {
    /// Target name used for the manifest slot of this block.
    ///
    /// Missing targets fall back to [`DEFAULT_TARGET`]; a disambiguation suffix
    /// is appended verbatim (`out.css` becomes `out.css0`).
    #[must_use]
    pub fn manifest_target(&self) -> String {
        let target = self.target.as_deref().unwrap_or(DEFAULT_TARGET);
        match self.suffix {
            Some(suffix) => format!("{target}{suffix}"),
            None => target.to_owned(),
        }
    }
}

/// A build block: the directive line, its content lines and the terminator line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    key: BlockKey,
    directive: Directive,
    lines: Vec<&'a str>,
    span: Range<usize>,
    line_number: usize,
    terminated: bool,
}

impl<'a> Block<'a> {
    /// Block key.
    #[must_use]
    pub fn key(&self) -> &BlockKey {
        &self.key
    }

    /// Directive parsed from the block's first line (before any `remove` renumbering).
    #[must_use]
    pub fn directive(&self) -> &Directive {
        &self.directive
    }

    /// All lines of the block, directive and terminator included, without line endings.
    #[must_use]
    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    /// Lines between the directive and the terminator.
    #[must_use]
    pub fn inner_lines(&self) -> &[&'a str] {
        match self.lines.len() {
            0..=2 => &[],
            len => &self.lines[1..len - 1],
        }
    }

    /// Inner lines joined with `line_ending`.
    #[must_use]
    pub fn inner_content(&self, line_ending: LineEnding) -> String {
        self.inner_lines().join(line_ending.as_str())
    }

    /// Whole block joined with `line_ending`.
    #[must_use]
    pub fn text(&self, line_ending: LineEnding) -> String {
        self.lines.join(line_ending.as_str())
    }

    /// Leading whitespace of the directive line.
    #[must_use]
    pub fn indent(&self) -> &'a str {
        let first = self.lines.first().copied().unwrap_or_default();
        let end = first
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(first.len());
        &first[..end]
    }

    /// Byte range in the source document, from the start of the directive line to
    /// the end of the last line (line ending excluded).
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// 1-indexed line number of the directive.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Whether the block was closed by an `endbuild` marker.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

/// All blocks found in a document, in document order.
///
/// # Example
///
/// ```
/// use useref_core::BlockTable;
///
/// let html = "<!-- build:js app.js -->\n<script src=\"a.js\"></script>\n<!-- endbuild -->\n";
/// let table = BlockTable::extract(html);
///
/// let block = table.blocks().next().unwrap();
/// assert_eq!(block.key().kind, "js");
/// assert_eq!(block.inner_lines(), &["<script src=\"a.js\"></script>"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BlockTable<'a> {
    blocks: Vec<Block<'a>>,
    line_ending: LineEnding,
}

impl<'a> BlockTable<'a> {
    /// Extract build blocks from `content`.
    #[must_use]
    pub fn extract(content: &'a str) -> Self {
        let mut extractor = Extractor::default();
        let mut offset = 0;

        for (idx, raw) in content.split_inclusive('\n').enumerate() {
            let start = offset;
            offset += raw.len();
            let line = match raw.strip_suffix('\n') {
                Some(line) => line.strip_suffix('\r').unwrap_or(line),
                None => raw,
            };
            extractor.push_line(line, start..start + line.len(), idx + 1);
        }

        let table = Self {
            blocks: extractor.finish(),
            line_ending: LineEnding::detect(content),
        };

        for block in table.unterminated() {
            tracing::warn!(
                line = block.line_number(),
                kind = %block.key().kind,
                "Build block is never closed by an endbuild marker"
            );
        }

        table
    }

    /// Terminated blocks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block<'a>> {
        self.blocks.iter().filter(|block| block.terminated)
    }

    /// Blocks that were opened but never closed, in document order.
    pub fn unterminated(&self) -> impl Iterator<Item = &Block<'a>> {
        self.blocks.iter().filter(|block| !block.terminated)
    }

    /// Line ending detected in the source document.
    #[must_use]
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Number of terminated blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks().count()
    }

    /// Check if the document holds no terminated blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks().next().is_none()
    }
}

/// Single-flag scanner state.
#[derive(Default)]
struct Extractor<'a> {
    blocks: Vec<Block<'a>>,
    /// Index of the open block, if any.
    current: Option<usize>,
    /// Rendered `(type, manifest target, attributes)` of every key handed out.
    seen: HashSet<(String, String, Option<String>)>,
    remove_index: usize,
    collision_index: usize,
}

impl<'a> Extractor<'a> {
    fn push_line(&mut self, line: &'a str, span: Range<usize>, line_number: usize) {
        if let Some(directive) = Directive::parse(line) {
            self.open(directive, span.start, line_number);
        }

        let Some(idx) = self.current else {
            return;
        };
        let block = &mut self.blocks[idx];
        block.lines.push(line);
        block.span.end = span.end;

        if directive::is_end_marker(line) {
            block.terminated = true;
            self.current = None;
        }
    }

    fn open(&mut self, directive: Directive, start: usize, line_number: usize) {
        if let Some(abandoned) = self.current {
            tracing::debug!(
                line = self.blocks[abandoned].line_number,
                "Build block abandoned by a new start directive"
            );
        }

        let target = if directive.kind == REMOVE {
            let ordinal = self.remove_index.to_string();
            self.remove_index += 1;
            Some(ordinal)
        } else {
            directive.target.clone()
        };

        let mut key = BlockKey {
            kind: directive.kind.clone(),
            target,
            attributes: directive.attributes.clone(),
            suffix: None,
        };
        // Suffixed targets can coincide with literal ones (`app.js` + `0` vs `app.js0`).
        while !self.seen.insert((
            key.kind.clone(),
            key.manifest_target(),
            key.attributes.clone(),
        )) {
            key.suffix = Some(self.collision_index);
            self.collision_index += 1;
        }

        tracing::debug!(
            line = line_number,
            kind = %key.kind,
            output = %key.manifest_target(),
            "Build block opened"
        );

        self.current = Some(self.blocks.len());
        self.blocks.push(Block {
            key,
            directive,
            lines: Vec::new(),
            span: start..start,
            line_number,
            terminated: false,
        });
    }

    fn finish(self) -> Vec<Block<'a>> {
        self.blocks
    }
}
