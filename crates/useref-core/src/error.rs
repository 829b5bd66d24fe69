//! Error types.

/// Error raised while assembling [`TransformOptions`](crate::TransformOptions).
///
/// Documents never fail to transform; only a misconfigured handler registry does.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    /// Handler registered for a type with built-in behavior.
    #[error("cannot register a handler for built-in block type '{0}'")]
    ReservedType(String),
    /// Handler registered under a name no directive can carry.
    #[error("invalid block type '{0}': expected letters, digits or underscores")]
    InvalidType(String),
    /// Template references a placeholder that does not exist.
    #[error("unknown placeholder '{{{placeholder}}}' in template for '{kind}'")]
    UnknownPlaceholder {
        /// Block type the template belongs to.
        kind: String,
        /// Placeholder name without braces.
        placeholder: String,
    },
}
