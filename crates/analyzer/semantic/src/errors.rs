//! Typed errors for store mutations and queries.
//!
//! Query misses surface as [`StoreError`] values; refused mutations return
//! [`RegistrationError`] without touching state. Conflicts that should reach
//! the editor convert into diagnostics via [`RegistrationError::into_report`].

use thiserror::Error;
use vls_analyzer_diagnostics::Report;
use vls_analyzer_syntax::Range;

/// Failed lookups on the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("cannot find symbol `{name}` in module `{module}`")]
    SymbolNotFound { module: String, name: String },
    #[error("file `{path}` is not tracked by the store")]
    UnknownFile { path: String },
}

/// Refused symbol registrations and graph edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A second declaration of the same name appears later in the same file.
    #[error("duplicate declaration of `{name}`")]
    DuplicateDeclaration { name: String, range: Range },
    /// A re-registration carrying a file version that is not newer than the
    /// stored one. Callers treat this as a silent no-op.
    #[error("stale registration of `{name}` at version {version}")]
    StaleVersion { name: String, version: i64 },
    /// A same-name child already exists on the parent symbol.
    #[error("`{child}` already exists in `{parent}`")]
    ChildExists { parent: String, child: String },
}

impl RegistrationError {
    pub const fn range(&self) -> Option<Range> {
        match self {
            Self::DuplicateDeclaration { range, .. } => Some(*range),
            _ => None,
        }
    }

    /// Whether the caller should keep going as if the registration happened.
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::StaleVersion { .. })
    }

    pub fn into_report(self, file_path: &str) -> Report {
        let range = self.range().unwrap_or_default();
        Report::error(self.to_string(), range, file_path)
    }
}

/// Errors from the deferred resolver's registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    /// The symbol already waits on this identifier; the caller should have
    /// updated the existing entry instead of re-registering.
    #[error("symbol is already waiting on `{ident}`")]
    AlreadyRegistered { ident: String },
}
