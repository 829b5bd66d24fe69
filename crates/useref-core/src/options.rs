//! Transform options.

use std::collections::HashMap;
use std::fmt;

use crate::directive::{RESERVED_TYPES, is_valid_type};
use crate::error::OptionsError;
use crate::handler::BlockHandler;

/// Options for [`transform`](crate::transform).
///
/// Holds the handlers for custom block types and the no-concatenation
/// preview toggle. Options are read-only during a transform and can be shared
/// between threads.
#[derive(Default)]
pub struct TransformOptions {
    handlers: HashMap<String, Box<dyn BlockHandler>>,
    noconcat: bool,
}

impl TransformOptions {
    /// Create options with no handlers and preview mode off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a custom block type.
    ///
    /// A later registration for the same type replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::ReservedType`] for `css`, `js` and `remove`, and
    /// [`OptionsError::InvalidType`] for names a directive cannot carry.
    pub fn with_handler<H>(
        mut self,
        kind: impl Into<String>,
        handler: H,
    ) -> Result<Self, OptionsError>
    where
        H: BlockHandler + 'static,
    {
        let kind = kind.into();
        if RESERVED_TYPES.contains(&kind.as_str()) {
            return Err(OptionsError::ReservedType(kind));
        }
        if !is_valid_type(&kind) {
            return Err(OptionsError::InvalidType(kind));
        }
        self.handlers.insert(kind, Box::new(handler));
        Ok(self)
    }

    /// Enable or disable no-concatenation preview mode.
    ///
    /// In preview mode every block that would be rewritten is replaced by its
    /// own content instead of the synthesized reference.
    #[must_use]
    pub fn with_noconcat(mut self, noconcat: bool) -> Self {
        self.noconcat = noconcat;
        self
    }

    /// Handler registered for `kind`.
    #[must_use]
    pub fn handler(&self, kind: &str) -> Option<&dyn BlockHandler> {
        self.handlers.get(kind).map(|handler| handler.as_ref())
    }

    /// Whether no-concatenation preview mode is enabled.
    #[must_use]
    pub fn noconcat(&self) -> bool {
        self.noconcat
    }
}

impl fmt::Debug for TransformOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("TransformOptions")
            .field("handlers", &kinds)
            .field("noconcat", &self.noconcat)
            .finish()
    }
}
