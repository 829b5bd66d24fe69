//! Build-block reference rewriting for asset pipelines.
//!
//! Templates declare build intent inline with comment directives:
//!
//! ```html
//! <!-- build:css /css/combined.css -->
//! <link rel="stylesheet" href="/css/one.css">
//! <link rel="stylesheet" href="/css/two.css">
//! <!-- endbuild -->
//! ```
//!
//! [`transform`] replaces each block with a single reference to the built
//! artifact and returns a [`Manifest`] listing the assets that feed it.
//!
//! # Architecture
//!
//! The transform is a straight pipeline over the input text:
//!
//! 1. **Extraction** ([`BlockTable::extract`]): a single-pass line scanner that
//!    recognizes [`Directive`]s and groups lines into blocks.
//! 2. **Synthesis** ([`synthesize`]): computes the replacement for each block
//!    and splices it into the document.
//! 3. **Manifest** ([`Manifest::compile`]): collects the assets referenced
//!    inside each block.
//!
//! Synthesis and manifest compilation both read the block table and are
//! independent of each other.
//!
//! # Example
//!
//! ```
//! use useref_core::{TransformOptions, transform};
//!
//! let html = r#"<!-- build:js scripts/app.min.js -->
//! <script src="scripts/a.js"></script>
//! <script src="scripts/b.js"></script>
//! <!-- endbuild -->"#;
//!
//! let result = transform(html, &TransformOptions::default());
//!
//! assert_eq!(result.content, r#"<script src="scripts/app.min.js"></script>"#);
//! let entry = result.manifest.get("js", "scripts/app.min.js").unwrap();
//! assert_eq!(entry.assets, vec!["scripts/a.js", "scripts/b.js"]);
//! ```

mod block;
mod directive;
mod error;
mod handler;
mod manifest;
mod options;
mod reference;
mod splice;

pub use block::{Block, BlockKey, BlockTable, LineEnding};
pub use directive::{
    CSS, ConditionalComment, DEFAULT_TARGET, Directive, JS, REMOVE, RESERVED_TYPES, is_end_marker,
};
pub use error::OptionsError;
pub use handler::{BlockContext, BlockHandler, TemplateHandler};
pub use manifest::{Manifest, ManifestEntry};
pub use options::TransformOptions;
pub use reference::synthesize;
pub use splice::Splices;

/// Build block that was opened but never closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnterminatedBlock {
    /// Line number of the directive (1-indexed).
    pub line: usize,
    /// Directive type.
    pub kind: String,
}

/// Result of [`transform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    /// Rewritten document.
    pub content: String,
    /// Assets declared by each block.
    pub manifest: Manifest,
    /// Blocks left alone because they were never closed.
    pub unterminated: Vec<UnterminatedBlock>,
}

/// Rewrite build blocks in `content` and compile the asset manifest.
///
/// Never fails: unrecognized syntax is treated as ordinary content.
#[must_use]
pub fn transform(content: &str, options: &TransformOptions) -> Transformed {
    let table = BlockTable::extract(content);

    let rewritten = synthesize(content, &table, options);
    let manifest = Manifest::compile(&table);
    let unterminated = table
        .unterminated()
        .map(|block| UnterminatedBlock {
            line: block.line_number(),
            kind: block.key().kind.clone(),
        })
        .collect();

    tracing::debug!(
        blocks = table.len(),
        entries = manifest.len(),
        "Transformed document"
    );

    Transformed {
        content: rewritten,
        manifest,
        unterminated,
    }
}

/// [`transform`] with default options.
#[must_use]
pub fn transform_default(content: &str) -> Transformed {
    transform(content, &TransformOptions::default())
}
