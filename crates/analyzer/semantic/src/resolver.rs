//! Deferred symbol resolution.
//!
//! When the walker meets a reference to a symbol that has no definition yet
//! (a forward reference, or a module still being loaded), it parks the
//! referring symbol here under the dependency's global identifier
//! `"{module_dir}/{name}"`. [`crate::Store::register_symbol`] is the single
//! wake point: every registration calls [`Resolver::resolve_with`], which
//! assigns the now-valid dependency to each waiter and drops it. Waiters
//! that fail (type mismatch, projection out of range) stay behind with their
//! error so a later compatible registration can recover them, and so
//! [`Resolver::report`] can surface what never resolved.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;
use tracing::{debug, trace};
use vls_analyzer_diagnostics::{DiagnosticSink, Report};

use crate::errors::ResolverError;
use crate::store::FileId;
use crate::symbol::{InfoSource, SymbolId, SymbolKind};
use crate::symbols::SymbolManager;

/// The construct a pending reference sits inside, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    If,
    Match,
    OrBlock,
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::If => write!(f, "if"),
            Self::Match => write!(f, "match"),
            Self::OrBlock => write!(f, "or"),
        }
    }
}

/// One symbol waiting for a dependency to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionInfo {
    /// The waiting symbol whose `return_sym` will be filled in.
    pub sym: SymbolId,
    /// Position in a multi-return tuple the waiter expects.
    pub index: usize,
    /// Text of the surrounding branch, if any.
    pub branch: Option<String>,
    pub branch_kind: Option<BranchKind>,
    /// Failure recorded by a resolution attempt; kept until `recover`.
    pub error: Option<String>,
}

impl ResolutionInfo {
    pub fn new(sym: SymbolId) -> Self {
        Self {
            sym,
            index: 0,
            branch: None,
            branch_kind: None,
            error: None,
        }
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn in_branch(mut self, kind: BranchKind, text: impl Into<String>) -> Self {
        self.branch_kind = Some(kind);
        self.branch = Some(text.into());
        self
    }

    pub fn has_err(&self) -> bool {
        self.error.is_some()
    }

    fn branch_suffix(&self) -> String {
        match (&self.branch_kind, &self.branch) {
            (Some(kind), Some(text)) => format!(" (in {kind} branch `{text}`)"),
            _ => String::new(),
        }
    }
}

type Waiters = SmallVec<[ResolutionInfo; 2]>;

/// Pending-dependency registry keyed by global identifiers.
#[derive(Debug, Default)]
pub struct Resolver {
    pending: FxHashMap<String, Waiters>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Waiters currently parked under an identifier.
    pub fn waiters(&self, ident: &str) -> &[ResolutionInfo] {
        self.pending.get(ident).map(|w| w.as_slice()).unwrap_or_default()
    }

    /// Park a waiter under an identifier. A symbol may wait on an identifier
    /// only once; callers holding a second reference should have updated the
    /// first entry.
    pub fn register(&mut self, ident: &str, info: ResolutionInfo) -> Result<(), ResolverError> {
        let waiters = self.pending.entry(ident.to_string()).or_default();
        if waiters.iter().any(|existing| existing.sym == info.sym) {
            return Err(ResolverError::AlreadyRegistered {
                ident: ident.to_string(),
            });
        }
        trace!(ident, sym = ?info.sym, "registered resolver waiter");
        waiters.push(info);
        Ok(())
    }

    /// Wake every waiter under `ident` with the freshly-registered symbol.
    ///
    /// The dependency is dereferenced through its return type when it is a
    /// returnable (variable, field, function). Waiters whose return type is
    /// already set to something else record a type mismatch; a multi-return
    /// dependency is projected by the waiter's tuple index. Successfully
    /// resolved waiters are dropped, errored ones stay for `report`.
    pub fn resolve_with(&mut self, symbols: &mut SymbolManager, ident: &str, depended: SymbolId) {
        let dep_info = symbols.get_info(depended);
        let dep_id = if dep_info.kind.is_returnable() {
            dep_info.return_sym
        } else {
            depended
        };

        let dep = symbols.get_info(dep_id);
        if dep_id.is_void() || dep.kind.is_void_like() {
            return;
        }
        let dep_kind = dep.kind;
        let dep_name = dep.name.clone();
        let dep_children: Vec<SymbolId> = dep.children.clone();

        let Some(waiters) = self.pending.get_mut(ident) else {
            return;
        };
        debug!(ident, count = waiters.len(), "resolving waiters");

        for waiter in waiters.iter_mut().filter(|w| !w.has_err()) {
            let target = symbols.get_info(waiter.sym);
            if !target.return_sym.is_void() && target.return_sym != dep_id {
                let expected = symbols.get_info(target.return_sym).name.clone();
                waiter.error = Some(format!(
                    "type mismatch for `{}`: expected `{}`, found `{}` at return value #{}{}",
                    target.name,
                    expected,
                    dep_name,
                    waiter.index + 1,
                    waiter.branch_suffix(),
                ));
            } else if dep_kind == SymbolKind::MultiReturn {
                match dep_children.get(waiter.index) {
                    Some(&component) => symbols.set_return_type(waiter.sym, component),
                    None => {
                        waiter.error = Some(format!(
                            "`{}` returns {} values, but value #{} was requested{}",
                            dep_name,
                            dep_children.len(),
                            waiter.index + 1,
                            waiter.branch_suffix(),
                        ));
                    }
                }
            } else {
                symbols.set_return_type(waiter.sym, dep_id);
            }
        }

        waiters.retain(|waiter| waiter.has_err());
        if waiters.is_empty() {
            self.pending.remove(ident);
        }
    }

    /// Clear the error flags under an identifier so the waiters take part in
    /// the next resolution round again.
    pub fn recover(&mut self, ident: &str) {
        if let Some(waiters) = self.pending.get_mut(ident) {
            for waiter in waiters.iter_mut() {
                waiter.error = None;
            }
        }
    }

    /// Emit diagnostics for every waiter living in the given file: its
    /// stored error, or `unresolved symbol` when its return type is still
    /// void.
    pub fn report(
        &self,
        symbols: &SymbolManager,
        sink: &mut dyn DiagnosticSink,
        file_id: FileId,
        file_path: &str,
    ) {
        for waiters in self.pending.values() {
            for waiter in waiters {
                let sym = symbols.get_info(waiter.sym);
                if sym.file_id != file_id {
                    continue;
                }
                if let Some(error) = &waiter.error {
                    sink.report(Report::error(error.clone(), sym.range, file_path));
                } else if sym.return_sym.is_void() {
                    sink.report(Report::error(
                        format!("unresolved symbol `{}`", sym.name),
                        sym.range,
                        file_path,
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;
    use vls_analyzer_diagnostics::CollectedDiagnostics;

    fn variable(symbols: &mut SymbolManager, name: &str) -> SymbolId {
        symbols.create_new_symbol_with(Symbol::new(name, SymbolKind::Variable))
    }

    #[test]
    fn duplicate_waiter_is_refused() {
        let mut symbols = SymbolManager::new();
        let x = variable(&mut symbols, "x");

        let mut resolver = Resolver::new();
        resolver.register("/pkg/T", ResolutionInfo::new(x)).unwrap();
        let err = resolver
            .register("/pkg/T", ResolutionInfo::new(x))
            .unwrap_err();
        assert!(matches!(err, ResolverError::AlreadyRegistered { .. }));
    }

    #[test]
    fn resolution_fills_return_type_and_drops_waiter() {
        let mut symbols = SymbolManager::new();
        let x = variable(&mut symbols, "x");
        let t = symbols.create_new_symbol_with(Symbol::new("T", SymbolKind::Struct));

        let mut resolver = Resolver::new();
        resolver.register("/pkg/T", ResolutionInfo::new(x)).unwrap();
        resolver.resolve_with(&mut symbols, "/pkg/T", t);

        assert_eq!(symbols.get_info(x).return_sym, t);
        assert!(resolver.waiters("/pkg/T").is_empty());
        assert!(resolver.is_empty());
    }

    #[test]
    fn void_dependency_is_ignored() {
        let mut symbols = SymbolManager::new();
        let x = variable(&mut symbols, "x");
        let never = symbols.create_new_symbol_with(Symbol::new("panic", SymbolKind::Never));

        let mut resolver = Resolver::new();
        resolver.register("/pkg/T", ResolutionInfo::new(x)).unwrap();
        resolver.resolve_with(&mut symbols, "/pkg/T", never);

        assert!(symbols.get_info(x).return_sym.is_void());
        assert_eq!(resolver.waiters("/pkg/T").len(), 1);
    }

    #[test]
    fn mismatched_waiters_keep_errors_until_recover() {
        let mut symbols = SymbolManager::new();
        let int = symbols.create_new_symbol_with(Symbol::new("int", SymbolKind::Struct));
        let string = symbols.create_new_symbol_with(Symbol::new("string", SymbolKind::Struct));
        let mut x = Symbol::new("x", SymbolKind::Variable);
        x.return_sym = int;
        let x = symbols.create_new_symbol_with(x);

        let mut resolver = Resolver::new();
        resolver.register("/pkg/s", ResolutionInfo::new(x)).unwrap();
        resolver.resolve_with(&mut symbols, "/pkg/s", string);

        // Invariant: after resolve_with, every remaining waiter is errored.
        let waiters = resolver.waiters("/pkg/s");
        assert_eq!(waiters.len(), 1);
        assert!(waiters.iter().all(ResolutionInfo::has_err));
        let message = waiters[0].error.clone().unwrap();
        assert!(message.contains("type mismatch"));
        assert!(message.contains("at return value #1"));

        resolver.recover("/pkg/s");
        assert!(resolver.waiters("/pkg/s").iter().all(|w| !w.has_err()));
    }

    #[test]
    fn report_emits_unresolved_and_stored_errors() {
        let mut symbols = SymbolManager::new();
        let x = variable(&mut symbols, "x");

        let mut resolver = Resolver::new();
        resolver.register("/pkg/T", ResolutionInfo::new(x)).unwrap();

        let mut sink = CollectedDiagnostics::new();
        resolver.report(&symbols, &mut sink, FileId::from_raw(0), "main.vv");
        assert_eq!(sink.len(), 1);
        assert!(sink.all()[0].message.contains("unresolved symbol `x`"));
    }
}
