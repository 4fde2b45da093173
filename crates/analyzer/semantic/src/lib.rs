//! # VLS Semantic Analysis
//!
//! The persistent semantic graph behind the VLS language server: every
//! symbol and lexical scope of an open workspace, updated file by file as
//! edits arrive, without rebuilding the world.
//!
//! ## Architecture
//!
//! The graph is a set of flat arenas addressed by integer ids, so the
//! heavily cross-referenced data (parent type, return type, children) stays
//! cycle-safe by construction:
//!
//! 1. **[`SymbolManager`]** owns the symbol arena and the per-module index.
//! 2. **[`ScopeManager`]** owns byte-range scope trees, one per open file.
//! 3. **[`Resolver`]** parks symbols whose dependencies have not been seen
//!    yet and wakes them when the dependency registers.
//! 4. **[`Store`]** coordinates the three, plus file paths, imports, and the
//!    module dependency tree. [`Store::with`] opens a per-file
//!    [`AnalyzerContext`] that carries the inference walker.
//!
//! All mutation is serial: the enclosing server hands the store exclusive
//! access per editor event. Nothing here blocks or does I/O.

pub mod builtins;
pub mod dep_graph;
pub mod errors;
pub mod imports;
pub mod infer;
pub mod resolver;
pub mod scope;
pub mod store;
pub mod symbol;
pub mod symbols;

pub use dep_graph::{DependencyNode, DependencyTree};
pub use errors::{RegistrationError, ResolverError, StoreError};
pub use imports::Import;
pub use resolver::{BranchKind, ResolutionInfo, Resolver};
pub use scope::{ScopeId, ScopeManager, ScopeTree};
pub use store::{AnalyzerContext, FileId, Store};
pub use symbol::{
    InfoSource, Symbol, SymbolAccess, SymbolFlags, SymbolId, SymbolKind, SymbolLanguage,
};
pub use symbols::SymbolManager;
