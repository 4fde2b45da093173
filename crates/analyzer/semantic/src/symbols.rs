//! The store-wide symbol arena and per-module index.
//!
//! Ids are append-only: a [`SymbolId`] handed out once stays valid for the
//! life of the store. Deletion only drops index entries; arena slots become
//! unreachable, never reused.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::errors::RegistrationError;
use crate::store::FileId;
use crate::symbol::{InfoSource, Symbol, SymbolId, SymbolKind};

/// Arena of symbols plus the module-path → ids index.
#[derive(Debug)]
pub struct SymbolManager {
    symbols: index_vec::IndexVec<SymbolId, Symbol>,
    module_symbols: FxHashMap<String, Vec<SymbolId>>,
    void_sym: Symbol,
}

impl Default for SymbolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolManager {
    pub fn new() -> Self {
        Self {
            symbols: index_vec::IndexVec::new(),
            module_symbols: FxHashMap::default(),
            void_sym: Symbol::void(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn is_valid_id(&self, id: SymbolId) -> bool {
        !id.is_void() && id.index() < self.symbols.len()
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        if id.is_void() {
            return None;
        }
        self.symbols.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        if id.is_void() {
            return None;
        }
        self.symbols.get_mut(id)
    }

    /// Module index for a directory; empty when the module is unknown.
    pub fn module_ids(&self, module_path: &str) -> &[SymbolId] {
        self.module_symbols
            .get(module_path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.module_symbols.keys().map(String::as_str)
    }

    /// Linear scan of a module's index for a name.
    pub fn find_in_module(&self, module_path: &str, name: &str) -> Option<SymbolId> {
        self.module_ids(module_path)
            .iter()
            .copied()
            .find(|&id| self.get(id).is_some_and(|sym| sym.name == name))
    }

    /// Copy-free variant of the by-name lookup; the void record on a miss.
    pub fn get_info_by_name(&self, module_path: &str, name: &str) -> &Symbol {
        match self.find_in_module(module_path, name) {
            Some(id) => self.get_info(id),
            None => &self.void_sym,
        }
    }

    /// Lookup by declaration position, used to catch identifier renames at
    /// the same source row.
    pub fn find_in_module_at_row(
        &self,
        module_path: &str,
        file_id: FileId,
        row: usize,
    ) -> Option<SymbolId> {
        self.module_ids(module_path).iter().copied().find(|&id| {
            self.get(id)
                .is_some_and(|sym| sym.file_id == file_id && sym.range.start_point.row == row)
        })
    }

    /// All top-level and transitively-reachable symbols of a module that
    /// live in the given file, de-duplicated by name at each nesting level.
    pub fn get_symbols_by_file_id(&self, module_path: &str, file_id: FileId) -> Vec<SymbolId> {
        let mut out = Vec::new();
        self.filter_by_file_id(self.module_ids(module_path), file_id, &mut out);
        out
    }

    fn filter_by_file_id(&self, ids: &[SymbolId], file_id: FileId, out: &mut Vec<SymbolId>) {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for &id in ids {
            let Some(sym) = self.get(id) else { continue };
            if !seen.insert(sym.name.as_str()) {
                continue;
            }
            if sym.file_id == file_id {
                out.push(id);
            }
            self.filter_by_file_id(&sym.children, file_id, out);
        }
    }

    /// Append a symbol to the arena; its id is the insertion index.
    pub fn create_new_symbol_with(&mut self, mut info: Symbol) -> SymbolId {
        let id = SymbolId::new(self.symbols.len());
        info.id = id;
        trace!(name = %info.name, kind = %info.kind, ?id, "new symbol");
        self.symbols.push(info);
        id
    }

    /// Add an id to a module's index. Already-present ids are skipped so the
    /// index never holds duplicates.
    pub fn add_symbol_to_module(&mut self, module_path: &str, id: SymbolId) {
        let ids = self.module_symbols.entry(module_path.to_string()).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    /// Drop a module's index entirely. Arena slots stay allocated.
    pub fn remove_module(&mut self, module_path: &str) {
        self.module_symbols.remove(module_path);
    }

    /// Drop the first same-name id from a module's index.
    pub fn remove_symbol_from_module(&mut self, module_path: &str, name: &str) -> Option<SymbolId> {
        let id = self.find_in_module(module_path, name)?;
        if let Some(ids) = self.module_symbols.get_mut(module_path) {
            ids.retain(|&existing| existing != id);
        }
        Some(id)
    }

    /// Overwrite a symbol's semantic fields, preserving its id and the
    /// top-level/const property bits.
    pub fn update_symbol(&mut self, id: SymbolId, info: &Symbol) {
        if let Some(sym) = self.get_mut(id) {
            let keep_id = sym.id;
            let keep_flags = sym.flags;
            *sym = info.clone();
            sym.id = keep_id;
            sym.flags = keep_flags;
        }
    }

    /// Apply the module-symbol update policy.
    ///
    /// Placeholders may be replaced by anything. A real symbol rejects a
    /// same-file declaration on a later row (duplicate) and a same-kind
    /// same-file re-registration whose file version is not newer (stale).
    pub fn update_module_symbol(
        &mut self,
        id: SymbolId,
        info: &Symbol,
    ) -> Result<(), RegistrationError> {
        let Some(existing) = self.get(id) else {
            return Ok(());
        };

        if existing.kind != SymbolKind::Placeholder {
            if existing.file_id == info.file_id
                && info.range.start_point.row > existing.range.start_point.row
            {
                return Err(RegistrationError::DuplicateDeclaration {
                    name: info.name.clone(),
                    range: info.range,
                });
            }
            if existing.kind == info.kind
                && existing.file_id == info.file_id
                && existing.file_version >= info.file_version
            {
                return Err(RegistrationError::StaleVersion {
                    name: info.name.clone(),
                    version: info.file_version,
                });
            }
        }

        self.update_symbol(id, info);
        Ok(())
    }

    /// Apply the scope-local update policy: stale versions are refused, and
    /// only the fields a local binding can legally change are copied. Kind,
    /// parent, children, and owning scope never change for a local.
    pub fn update_local_symbol(
        &mut self,
        id: SymbolId,
        info: &Symbol,
    ) -> Result<(), RegistrationError> {
        let Some(sym) = self.get_mut(id) else {
            return Ok(());
        };

        if sym.file_version >= info.file_version {
            return Err(RegistrationError::StaleVersion {
                name: info.name.clone(),
                version: info.file_version,
            });
        }

        sym.name = info.name.clone();
        sym.access = info.access;
        sym.range = info.range;
        sym.file_id = info.file_id;
        sym.file_version = info.file_version;
        sym.return_sym = info.return_sym;
        Ok(())
    }

    /// Set a symbol's return type directly; the resolver's assignment path.
    pub(crate) fn set_return_type(&mut self, id: SymbolId, return_sym: SymbolId) {
        if let Some(sym) = self.get_mut(id) {
            sym.return_sym = return_sym;
        }
    }

    /// Append a child, refusing same-name duplicates.
    pub fn add_child(&mut self, parent: SymbolId, child: SymbolId) -> Result<(), RegistrationError> {
        let Some(child_name) = self.get(child).map(|sym| sym.name.clone()) else {
            return Ok(());
        };
        let Some(parent_sym) = self.get(parent) else {
            return Ok(());
        };
        if self
            .find_symbol_by_name(&parent_sym.children, &child_name)
            .is_some()
        {
            return Err(RegistrationError::ChildExists {
                parent: parent_sym.name.clone(),
                child: child_name,
            });
        }
        if let Some(parent_sym) = self.get_mut(parent) {
            parent_sym.children.push(child);
        }
        Ok(())
    }

    /// Append a child without the uniqueness check; container type
    /// parameters use this, where same-name components are legal.
    pub fn add_child_allow_duplicated(&mut self, parent: SymbolId, child: SymbolId) {
        if let Some(parent_sym) = self.get_mut(parent) {
            parent_sym.children.push(child);
        }
    }

    /// Detach a same-name child; method deletion for receivers.
    pub fn remove_child_by_name(&mut self, parent: SymbolId, name: &str) -> Option<SymbolId> {
        let parent_sym = self.get(parent)?;
        let (child, _) = self.find_symbol_by_name(&parent_sym.children, name)?;
        if let Some(parent_sym) = self.get_mut(parent) {
            parent_sym.children.retain(|&id| id != child);
        }
        Some(child)
    }

    /// How many `&` layers wrap the type.
    pub fn pointer_depth(&self, id: SymbolId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(sym) = self.get(current) {
            if !sym.kind.is_reference() || depth > 8 {
                break;
            }
            depth += 1;
            current = sym.parent;
        }
        depth
    }

    /// Follow `&T` to its pointee; identity for everything else.
    pub fn deref_id(&self, id: SymbolId) -> SymbolId {
        self.get(id).map_or(id, Symbol::deref)
    }

    /// Whether a function type matches the given signature: same arity,
    /// same return type id, same parameter type ids, and (when requested)
    /// the same parameter names.
    pub fn compare_params_and_ret_type(
        &self,
        fn_type: SymbolId,
        param_types: &[SymbolId],
        param_names: Option<&[String]>,
        return_sym: SymbolId,
    ) -> bool {
        let Some(sym) = self.get(fn_type) else {
            return false;
        };
        if sym.kind != SymbolKind::FunctionType
            || sym.return_sym != return_sym
            || sym.children.len() != param_types.len()
        {
            return false;
        }
        sym.children.iter().enumerate().all(|(index, &child)| {
            let param = self.get_info(child);
            param.return_sym == param_types[index]
                && param_names
                    .is_none_or(|names| names.get(index).is_some_and(|name| *name == param.name))
        })
    }

    /// Follow typedef chains to the underlying type.
    pub fn unwrap_typedef(&self, id: SymbolId) -> SymbolId {
        let mut current = id;
        for _ in 0..8 {
            match self.get(current) {
                Some(sym) if sym.kind == SymbolKind::Typedef && !sym.parent.is_void() => {
                    current = sym.parent;
                }
                _ => break,
            }
        }
        current
    }
}

impl InfoSource for SymbolManager {
    fn get_info(&self, id: SymbolId) -> &Symbol {
        self.get(id).unwrap_or(&self.void_sym)
    }
}
