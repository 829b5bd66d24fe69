//! Asset manifest compilation.
//!
//! Collects the assets referenced inside each build block, keyed by block type
//! and output target:
//!
//! ```json
//! {
//!   "css": {
//!     "/css/combined.css": { "assets": ["/css/one.css", "/css/two.css"] }
//!   },
//!   "js": {
//!     "scripts/app.js": { "assets": ["scripts/a.js"], "searchPaths": "{.tmp,app}" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::block::{Block, BlockTable};

/// First `href="..."` or `src='...'` attribute on a line.
static ASSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(href|src)=["']([^'"]+)["']"#).unwrap());

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Assets feeding one output target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManifestEntry {
    /// Referenced asset paths in order of first appearance.
    pub assets: Vec<String>,
    /// Alternate search paths from the directive, passed through unchanged.
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "searchPaths",
            default,
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub search_paths: Option<String>,
}

impl ManifestEntry {
    fn push_asset(&mut self, asset: &str) {
        if !asset.is_empty() && !self.assets.iter().any(|existing| existing == asset) {
            self.assets.push(asset.to_owned());
        }
    }
}

/// Assets declared by build blocks, as `type -> target -> entry`.
///
/// Keys are kept sorted so serialized manifests are stable.
///
/// # Example
///
/// ```
/// use useref_core::{BlockTable, Manifest};
///
/// let html = "<!-- build:css(.tmp) site.css -->\n<link href=\"a.css\">\n<link href=\"b.css\">\n<!-- endbuild -->";
/// let manifest = Manifest::compile(&BlockTable::extract(html));
///
/// let entry = manifest.get("css", "site.css").unwrap();
/// assert_eq!(entry.assets, vec!["a.css", "b.css"]);
/// assert_eq!(entry.search_paths.as_deref(), Some(".tmp"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Manifest {
    entries: BTreeMap<String, BTreeMap<String, ManifestEntry>>,
}

impl Manifest {
    /// Compile the manifest for all terminated blocks in `table`.
    ///
    /// Blocks sharing a type and target (but differing in attributes) add to
    /// the same entry: assets are appended without duplicates and the first
    /// block's search paths are kept. Later blocks never replace an earlier
    /// block's entry.
    #[must_use]
    pub fn compile(table: &BlockTable<'_>) -> Self {
        let mut manifest = Self::default();
        for block in table.blocks() {
            manifest.add_block(block);
        }
        manifest
    }

    fn add_block(&mut self, block: &Block<'_>) {
        let key = block.key();
        let entry = self
            .entries
            .entry(key.kind.clone())
            .or_default()
            .entry(key.manifest_target())
            .or_default();

        if entry.search_paths.is_none() {
            entry
                .search_paths
                .clone_from(&block.directive().alternate_search_paths);
        }

        let inner = strip_comments(&block.inner_lines().join("\n"));
        for line in inner.lines() {
            let Some(caps) = ASSET_RE.captures(line) else {
                continue;
            };
            for asset in caps[2].split(',') {
                entry.push_asset(asset.trim());
            }
        }
    }

    /// Entry for `kind` and `target`.
    #[must_use]
    pub fn get(&self, kind: &str, target: &str) -> Option<&ManifestEntry> {
        self.entries.get(kind)?.get(target)
    }

    /// Entries of one block type, keyed by target.
    #[must_use]
    pub fn targets(&self, kind: &str) -> Option<&BTreeMap<String, ManifestEntry>> {
        self.entries.get(kind)
    }

    /// Iterate over `(type, target, entry)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ManifestEntry)> {
        self.entries.iter().flat_map(|(kind, targets)| {
            targets
                .iter()
                .map(move |(target, entry)| (kind.as_str(), target.as_str(), entry))
        })
    }

    /// Number of entries across all types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Check if the manifest has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Remove markup comments so commented-out references are not collected.
///
/// IE conditional comments (`<!--[if IE]>`) and the `<!-->` / `<!--<!` forms
/// used by downlevel-revealed conditionals are kept. A comment without a
/// closing `-->` is kept as well.
fn strip_comments(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut remaining = text;

    while let Some(open) = remaining.find(COMMENT_OPEN) {
        let body = &remaining[open + COMMENT_OPEN.len()..];
        if is_kept_comment(body) {
            output.push_str(&remaining[..=open]);
            remaining = &remaining[open + 1..];
            continue;
        }
        let Some(close) = body.find(COMMENT_CLOSE) else {
            break;
        };
        output.push_str(&remaining[..open]);
        remaining = &body[close + COMMENT_CLOSE.len()..];
    }

    output.push_str(remaining);
    output
}

/// Whether the text following `<!--` starts a comment that must survive stripping.
fn is_kept_comment(body: &str) -> bool {
    let body = body.trim_start();
    if body.starts_with("<!") || body.starts_with('>') {
        return true;
    }
    body.strip_prefix("[if ")
        .and_then(|condition| condition.find(']'))
        .is_some_and(|end| end > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compile(content: &str) -> Manifest {
        Manifest::compile(&BlockTable::extract(content))
    }

    fn assets(manifest: &Manifest, kind: &str, target: &str) -> Vec<String> {
        manifest.get(kind, target).unwrap().assets.clone()
    }

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("a<!-- b -->c"), "ac");
        assert_eq!(strip_comments("a<!--\nb\n-->c"), "ac");
        assert_eq!(strip_comments("<!-- x --><!-- y -->z"), "z");
        assert_eq!(strip_comments("a<!-- open"), "a<!-- open");
    }

    #[test]
    fn test_strip_comments_keeps_conditionals() {
        let text = "<!--[if lt IE 9]><script src=\"a.js\"></script><![endif]-->";
        assert_eq!(strip_comments(text), text);
        assert_eq!(strip_comments("<!--> x"), "<!--> x");
        assert_eq!(strip_comments("<!--<![endif]-->"), "<!--<![endif]-->");
    }

    #[test]
    fn test_assets_in_order() {
        let manifest = compile(
            "<!-- build:js app.js -->\n<script src=\"b.js\"></script>\n<script src='a.js'></script>\n<!-- endbuild -->",
        );
        assert_eq!(assets(&manifest, "js", "app.js"), vec!["b.js", "a.js"]);
        assert_eq!(manifest.get("js", "app.js").unwrap().search_paths, None);
    }

    #[test]
    fn test_commented_out_assets_skipped() {
        let manifest = compile(
            "<!-- build:js app.js -->\n<!-- <script src=\"old.js\"></script> -->\n<!--\n<script src=\"older.js\"></script>\n-->\n<script src=\"new.js\"></script>\n<!-- endbuild -->",
        );
        assert_eq!(assets(&manifest, "js", "app.js"), vec!["new.js"]);
    }

    #[test]
    fn test_conditional_comment_assets_collected() {
        let manifest = compile(
            "<!-- build:js ie.js -->\n<!--[if lt IE 9]>\n<script src=\"shiv.js\"></script>\n<![endif]-->\n<!-- endbuild -->",
        );
        assert_eq!(assets(&manifest, "js", "ie.js"), vec!["shiv.js"]);
    }

    #[test]
    fn test_comma_separated_values_expand() {
        let manifest = compile(
            "<!-- build:js app.js -->\n<script src=\"a.js, b.js,,c.js\"></script>\n<script src=\"b.js\"></script>\n<!-- endbuild -->",
        );
        assert_eq!(
            assets(&manifest, "js", "app.js"),
            vec!["a.js", "b.js", "c.js"]
        );
    }

    #[test]
    fn test_first_match_per_line() {
        let manifest = compile(
            "<!-- build:css site.css -->\n<link href=\"a.css\"><link href=\"b.css\">\n<!-- endbuild -->",
        );
        assert_eq!(assets(&manifest, "css", "site.css"), vec!["a.css"]);
    }

    #[test]
    fn test_search_paths() {
        let manifest = compile("<!-- build:js({.tmp,app}) app.js -->\n<!-- endbuild -->");
        let entry = manifest.get("js", "app.js").unwrap();
        assert_eq!(entry.search_paths.as_deref(), Some("{.tmp,app}"));
        assert!(entry.assets.is_empty());
    }

    #[test]
    fn test_remove_blocks_recorded() {
        let manifest = compile(
            "<!-- build:remove -->\n<script src=\"a.js\"></script>\n<!-- endbuild -->\n<!-- build:remove -->\n<script src=\"b.js\"></script>\n<!-- endbuild -->",
        );
        assert_eq!(assets(&manifest, "remove", "0"), vec!["a.js"]);
        assert_eq!(assets(&manifest, "remove", "1"), vec!["b.js"]);
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn test_duplicate_blocks_get_distinct_entries() {
        let manifest = compile(
            "<!-- build:js app.js -->\n<script src=\"a.js\"></script>\n<!-- endbuild -->\n<!-- build:js app.js -->\n<script src=\"b.js\"></script>\n<!-- endbuild -->",
        );
        assert_eq!(assets(&manifest, "js", "app.js"), vec!["a.js"]);
        assert_eq!(assets(&manifest, "js", "app.js0"), vec!["b.js"]);
    }

    #[test]
    fn test_suffixed_block_does_not_share_literal_target_entry() {
        let manifest = compile(
            "<!-- build:js app.js -->\n<script src=\"a.js\"></script>\n<!-- endbuild -->\n<!-- build:js app.js -->\n<script src=\"b.js\"></script>\n<!-- endbuild -->\n<!-- build:js app.js0 -->\n<script src=\"c.js\"></script>\n<!-- endbuild -->",
        );
        assert_eq!(manifest.len(), 3);
        assert_eq!(assets(&manifest, "js", "app.js"), vec!["a.js"]);
        assert_eq!(assets(&manifest, "js", "app.js0"), vec!["b.js"]);
        assert_eq!(assets(&manifest, "js", "app.js01"), vec!["c.js"]);
    }

    #[test]
    fn test_same_target_different_attributes_merge() {
        let manifest = compile(
            "<!-- build:css site.css -->\n<link href=\"a.css\">\n<!-- endbuild -->\n<!-- build:css site.css media=\"print\" -->\n<link href=\"b.css\">\n<link href=\"a.css\">\n<!-- endbuild -->",
        );
        assert_eq!(assets(&manifest, "css", "site.css"), vec!["a.css", "b.css"]);
        assert_eq!(manifest.len(), 1);
    }

    #[test]
    fn test_unterminated_blocks_skipped() {
        let manifest = compile("<!-- build:js app.js -->\n<script src=\"a.js\"></script>\n");
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_iter_and_targets() {
        let manifest = compile(
            "<!-- build:js b.js -->\n<!-- endbuild -->\n<!-- build:css a.css -->\n<!-- endbuild -->\n<!-- build:js a.js -->\n<!-- endbuild -->",
        );
        let keys: Vec<_> = manifest.iter().map(|(kind, target, _)| (kind, target)).collect();
        assert_eq!(keys, vec![("css", "a.css"), ("js", "a.js"), ("js", "b.js")]);
        assert_eq!(manifest.targets("js").unwrap().len(), 2);
        assert!(manifest.targets("remove").is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_json() {
        let manifest = compile(
            "<!-- build:css(.tmp) /css/combined.css -->\n<link href=\"/css/one.css\">\n<!-- endbuild -->\n<!-- build:js app.js -->\n<!-- endbuild -->",
        );
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "css": {
                    "/css/combined.css": { "assets": ["/css/one.css"], "searchPaths": ".tmp" }
                },
                "js": {
                    "app.js": { "assets": [] }
                }
            })
        );
    }
}
