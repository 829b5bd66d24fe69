//! Single-pass span splicing.
//!
//! Collects byte-range replacements and applies them in one pass over the source.

use std::ops::Range;

/// Collects span replacements for single-pass application.
///
/// Each block registers the exact byte range it occupies in the source document
/// together with its replacement text. [`apply()`](Self::apply) then copies the
/// untouched bytes between spans verbatim, so identical blocks elsewhere in the
/// document are never rewritten by accident.
///
/// # Example
///
/// ```
/// use useref_core::Splices;
///
/// let source = "head <old> tail";
/// let mut splices = Splices::new();
/// splices.add(5..10, "<new>");
///
/// assert_eq!(splices.apply(source), "head <new> tail");
/// ```
#[derive(Debug, Default)]
pub struct Splices {
    items: Vec<(Range<usize>, String)>,
}

impl Splices {
    /// Create a new empty splice collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new splice collector with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Register a replacement of `span` with `to`.
    ///
    /// Spans must not overlap. They may be added in any order.
    pub fn add(&mut self, span: Range<usize>, to: impl Into<String>) {
        self.items.push((span, to.into()));
    }

    /// Apply all registered splices to `source`.
    ///
    /// Note: This consumes the splices to prevent accidental reuse.
    #[must_use]
    pub fn apply(mut self, source: &str) -> String {
        if self.items.is_empty() {
            return source.to_owned();
        }

        self.items.sort_by_key(|(span, _)| span.start);

        let mut output = String::with_capacity(source.len());
        let mut cursor = 0;
        for (span, to) in self.items {
            debug_assert!(span.start >= cursor, "overlapping splice spans");
            output.push_str(&source[cursor..span.start]);
            output.push_str(&to);
            cursor = span.end;
        }
        output.push_str(&source[cursor..]);
        output
    }

    /// Check if there are any splices registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of registered splices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }
}
