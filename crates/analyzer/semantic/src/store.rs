//! The top-level store coordinating symbols, scopes, and resolution.
//!
//! One [`Store`] holds the semantic graph for the whole workspace. Modules
//! are directories; a file's module is its parent directory. All mutation
//! entry points assume exclusive access, matching the serial editor event
//! loop that drives them.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};
use vls_analyzer_syntax::{Field, Node, NodeKind};

use crate::dep_graph::DependencyTree;
use crate::errors::{RegistrationError, StoreError};
use crate::imports::Import;
use crate::resolver::Resolver;
use crate::scope::{ScopeId, ScopeManager};
use crate::symbol::{InfoSource, Symbol, SymbolId, SymbolKind, SymbolLanguage};
use crate::symbols::SymbolManager;

index_vec::define_index_type! {
    /// Index of a file path in the store's append-only path arena.
    pub struct FileId = u32;

    MAX_INDEX = (u32::MAX - 1) as usize;
    DEBUG_FORMAT = "file{}";
}

/// The directory part of a file path, with `/` separators.
pub(crate) fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(index) => &path[..index],
        None => "",
    }
}

/// The file-name part of a file path.
pub(crate) fn base_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[index + 1..],
        None => path,
    }
}

/// Where a binded (`C.` / `JS.`) symbol lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindedSymbolLocation {
    pub language: SymbolLanguage,
    pub name: String,
    pub module_path: String,
}

/// Redirects member lookups on derived types (`[]T`, `map[K]V`, `chan T`,
/// `?T`, `!T`) to the builtin base type that carries their methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSymbolLocation {
    pub module_name: String,
    pub symbol_name: String,
    pub for_kind: SymbolKind,
}

/// Top-level coordinator owning the arenas and the store-level tables.
#[derive(Debug, Default)]
pub struct Store {
    file_paths: index_vec::IndexVec<FileId, String>,
    pub symbols: SymbolManager,
    pub scopes: ScopeManager,
    pub resolver: Resolver,
    pub dependency_tree: DependencyTree,
    imports: FxHashMap<String, Vec<Import>>,
    auto_imports: FxHashMap<String, String>,
    binded_symbol_locations: Vec<BindedSymbolLocation>,
    base_symbol_locations: Vec<BaseSymbolLocation>,
    anon_fn_counter: usize,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with the builtin module bootstrapped.
    pub fn with_builtins() -> Self {
        let mut store = Self::new();
        crate::builtins::register_builtins(&mut store);
        store
    }

    // ---- file paths -----------------------------------------------------

    /// Intern a file path; reuse is by value.
    pub fn intern_file_path(&mut self, path: &str) -> FileId {
        if let Some(existing) = self.file_id_of(path) {
            return existing;
        }
        self.file_paths.push(path.to_string())
    }

    pub fn file_id_of(&self, path: &str) -> Option<FileId> {
        self.file_paths
            .iter_enumerated()
            .find_map(|(id, existing)| (existing == path).then_some(id))
    }

    pub fn file_path(&self, id: FileId) -> Option<&str> {
        self.file_paths.get(id).map(String::as_str)
    }

    pub fn has_file_path(&self, path: &str) -> bool {
        self.file_id_of(path).is_some()
    }

    /// The module directory a file belongs to.
    pub fn module_dir_of(&self, id: FileId) -> &str {
        self.file_path(id).map(parent_dir).unwrap_or("")
    }

    // ---- identifiers ----------------------------------------------------

    /// The resolver key of a symbol: `"{module_dir}/{name}"`. Module and
    /// type names never contain `/`, so the law
    /// `ident == dir(file_paths[sym.file_id]) + "/" + sym.name` holds.
    pub fn get_ident_of_symbol(&self, id: SymbolId) -> Option<String> {
        let sym = self.symbols.get(id)?;
        let path = self.file_path(sym.file_id)?;
        Some(format!("{}/{}", parent_dir(path), sym.name))
    }

    /// The next anonymous function-type name: `#anon_1`, `#anon_2`, ...
    pub(crate) fn next_anon_fn_name(&mut self) -> String {
        self.anon_fn_counter += 1;
        format!("#anon_{}", self.anon_fn_counter)
    }

    // ---- imports --------------------------------------------------------

    pub fn add_import(&mut self, dir: &str, import: Import) {
        self.imports.entry(dir.to_string()).or_default().push(import);
    }

    pub fn imports_of(&self, dir: &str) -> &[Import] {
        self.imports.get(dir).map(Vec::as_slice).unwrap_or_default()
    }

    /// Auto-imported modules resolve unqualified and bootstrap lookups; at
    /// minimum the importer registers `builtin` here, aliased to `""`.
    pub fn register_auto_import(&mut self, import: &Import, alias: &str) {
        self.auto_imports
            .insert(alias.to_string(), import.path.clone());
    }

    pub fn is_auto_import_dir(&self, dir: &str) -> bool {
        self.auto_imports.values().any(|path| path == dir)
    }

    /// The directory an auto-imported module name resolves to.
    pub fn auto_import_dir(&self, module_name: &str) -> Option<&str> {
        self.auto_imports.get(module_name).map(String::as_str)
    }

    /// The import a file refers to by `module_name` (declared name or the
    /// file's alias).
    pub fn find_import_of_module(&self, file_path: &str, module_name: &str) -> Option<&Import> {
        if module_name.is_empty() {
            return None;
        }
        let file_name = base_name(file_path);
        self.imports_of(parent_dir(file_path))
            .iter()
            .find(|import| import.name_for_file(file_name) == module_name)
    }

    /// Whether `name` refers to a module inside the given file.
    pub fn is_module(&self, file_path: &str, name: &str) -> bool {
        self.find_import_of_module(file_path, name).is_some()
            || self.auto_imports.contains_key(name)
    }

    /// Whether the file imports the module (by declaration, not auto).
    pub fn is_imported(&self, file_path: &str, module_name: &str) -> bool {
        self.find_import_of_module(file_path, module_name)
            .is_some_and(|import| import.used_by_file(base_name(file_path)))
    }

    // ---- binded and base symbol tables ----------------------------------

    pub fn add_binded_symbol_location(
        &mut self,
        language: SymbolLanguage,
        name: &str,
        module_path: &str,
    ) {
        let exists = self
            .binded_symbol_locations
            .iter()
            .any(|loc| loc.language == language && loc.name == name);
        if !exists {
            self.binded_symbol_locations.push(BindedSymbolLocation {
                language,
                name: name.to_string(),
                module_path: module_path.to_string(),
            });
        }
    }

    pub fn remove_binded_symbol_location(&mut self, name: &str) {
        self.binded_symbol_locations.retain(|loc| loc.name != name);
    }

    pub fn add_base_symbol_location(
        &mut self,
        module_name: &str,
        symbol_name: &str,
        for_kind: SymbolKind,
    ) {
        self.base_symbol_locations.push(BaseSymbolLocation {
            module_name: module_name.to_string(),
            symbol_name: symbol_name.to_string(),
            for_kind,
        });
    }

    /// The builtin base type carrying members for a derived kind
    /// (`array` for `[]T`, `map` for `map[K]V`, `chan` for `chan T`,
    /// `IError` for `?T` / `!T`).
    pub fn base_symbol_of(&self, kind: SymbolKind) -> Option<SymbolId> {
        let location = self
            .base_symbol_locations
            .iter()
            .find(|loc| loc.for_kind == kind)?;
        let dir = self.auto_imports.get(&location.module_name)?;
        self.symbols.find_in_module(dir, &location.symbol_name)
    }

    // ---- registration ---------------------------------------------------

    /// The central symbol registration entry point.
    ///
    /// Finds an update candidate by name in the symbol's module, or (for
    /// nominal kinds) by declaration row, which catches identifier renames
    /// on the same source line. Typedefs always insert (alias chains), and a
    /// named symbol never updates an anonymous function type. Every
    /// registration wakes the resolver waiters parked on the symbol's
    /// global identifier.
    pub fn register_symbol(&mut self, info: Symbol) -> Result<SymbolId, RegistrationError> {
        let module_path = self.module_dir_of(info.file_id).to_string();

        let mut candidate = self.symbols.find_in_module(&module_path, &info.name);
        if candidate.is_none()
            && info.kind != SymbolKind::Placeholder
            && !info.kind.is_container()
        {
            candidate = self.symbols.find_in_module_at_row(
                &module_path,
                info.file_id,
                info.range.start_point.row,
            );
        }

        let takes_update_path = candidate.is_some_and(|id| {
            info.kind != SymbolKind::Typedef
                && self.symbols.get_info(id).kind != SymbolKind::FunctionType
        });

        let name = info.name.clone();
        let language = info.language;
        let id = if takes_update_path {
            let id = candidate.unwrap_or(SymbolId::VOID);
            match self.symbols.update_module_symbol(id, &info) {
                Ok(()) => {}
                Err(err) if err.is_silent() => {
                    trace!(name = %name, "stale re-registration ignored");
                }
                Err(err) => return Err(err),
            }
            id
        } else {
            let id = self.symbols.create_new_symbol_with(info);
            self.symbols.add_symbol_to_module(&module_path, id);
            if language != SymbolLanguage::V {
                self.add_binded_symbol_location(language, &name, &module_path);
            }
            id
        };

        let ident = format!("{}/{}", module_path, name);
        self.resolver.resolve_with(&mut self.symbols, &ident, id);
        debug!(%ident, ?id, "registered symbol");
        Ok(id)
    }

    // ---- lookup ---------------------------------------------------------

    /// Resolve `(file, module, name)` to a symbol id.
    ///
    /// Order: the named (or own) module, auto-imports, binded locations for
    /// `C.` / `JS.` names, then selectively-imported symbols.
    pub fn find_symbol(
        &self,
        file_path: &str,
        module_name: &str,
        name: &str,
    ) -> Result<SymbolId, StoreError> {
        let module_path = self
            .find_import_of_module(file_path, module_name)
            .map(|import| import.path.clone())
            .unwrap_or_else(|| parent_dir(file_path).to_string());
        if let Some(id) = self.symbols.find_in_module(&module_path, name) {
            return Ok(id);
        }

        if let Some(dir) = self.auto_imports.get(module_name) {
            if let Some(id) = self.symbols.find_in_module(dir, name) {
                return Ok(id);
            }
        }

        if name.starts_with("C.") || name.starts_with("JS.") {
            if let Some(location) = self
                .binded_symbol_locations
                .iter()
                .find(|loc| loc.name == name)
            {
                if let Some(id) = self.symbols.find_in_module(&location.module_path, name) {
                    return Ok(id);
                }
            }
        }

        let file_name = base_name(file_path);
        for import in self.imports_of(parent_dir(file_path)) {
            if import.imports_symbol(file_name, name) {
                if let Some(id) = self.symbols.find_in_module(&import.path, name) {
                    return Ok(id);
                }
            }
        }

        Err(StoreError::SymbolNotFound {
            module: if module_name.is_empty() {
                module_path
            } else {
                module_name.to_string()
            },
            name: name.to_string(),
        })
    }

    /// Find a function type in a module with the given signature, unwrapping
    /// typedef-over-function_type aliases. Anonymous function-type dedup
    /// goes through here.
    pub fn find_fn_symbol(
        &self,
        module_path: &str,
        param_types: &[SymbolId],
        param_names: Option<&[String]>,
        return_sym: SymbolId,
    ) -> Option<SymbolId> {
        self.symbols
            .module_ids(module_path)
            .iter()
            .copied()
            .find(|&id| {
                let target = self.symbols.unwrap_typedef(id);
                self.symbols
                    .compare_params_and_ret_type(target, param_types, param_names, return_sym)
            })
    }

    /// All symbols of a file: top-level plus reachable children.
    pub fn get_symbols_by_file_path(&self, file_path: &str) -> Vec<SymbolId> {
        let Some(file_id) = self.file_id_of(file_path) else {
            return Vec::new();
        };
        self.symbols
            .get_symbols_by_file_id(parent_dir(file_path), file_id)
    }

    // ---- deletion -------------------------------------------------------

    /// Delete a module directory and, recursively, the dependencies nothing
    /// else needs. Auto-imported modules and modules with live dependents
    /// are left untouched.
    pub fn delete(&mut self, dir: &str) {
        self.delete_excluding(dir, &[]);
    }

    pub fn delete_excluding(&mut self, dir: &str, excluded: &[&str]) {
        if excluded.contains(&dir) || self.is_auto_import_dir(dir) {
            return;
        }
        if self.dependency_tree.has_dependents(dir, excluded) {
            trace!(dir, "delete skipped, module still has dependents");
            return;
        }

        let dependencies = self
            .dependency_tree
            .get_node(dir)
            .map(|node| node.dependencies.clone())
            .unwrap_or_default();
        {
            // Passing ourselves as excluded terminates dependency cycles.
            let mut nested: Vec<&str> = excluded.to_vec();
            nested.push(dir);
            for dependency in &dependencies {
                self.delete_excluding(dependency, &nested);
            }
        }

        self.dependency_tree.delete(dir);
        self.symbols.remove_module(dir);
        self.imports.remove(dir);
        debug!(dir, "deleted module");
    }

    /// Remove the symbols declared by the file's top-level nodes whose start
    /// row falls inside the line window. Methods detach from their receiver
    /// type instead of the module index; binded declarations also drop their
    /// location entries.
    pub fn delete_symbol_at_node(
        &mut self,
        file_path: &str,
        root: Node<'_>,
        start_line: usize,
        end_line: usize,
    ) {
        let dir = parent_dir(file_path).to_string();
        let file_name = base_name(file_path).to_string();

        for child in root.children() {
            let row = child.range().start_point.row;
            if row < start_line || row > end_line {
                continue;
            }
            match child.kind() {
                NodeKind::ConstDeclaration | NodeKind::GlobalVarDeclaration => {
                    for spec in child.children() {
                        if let Some(name) = spec.child_by_field(Field::Name) {
                            self.symbols.remove_symbol_from_module(&dir, name.text());
                        }
                    }
                }
                NodeKind::FunctionDeclaration => {
                    let Some(name_node) = child.child_by_field(Field::Name) else {
                        continue;
                    };
                    let name = name_node.text();
                    match child.child_by_field(Field::Receiver) {
                        Some(receiver) => self.remove_method(&dir, receiver, name),
                        None => {
                            self.symbols.remove_symbol_from_module(&dir, name);
                        }
                    }
                    if name.starts_with("C.") || name.starts_with("JS.") {
                        self.remove_binded_symbol_location(name);
                    }
                }
                NodeKind::InterfaceDeclaration
                | NodeKind::EnumDeclaration
                | NodeKind::TypeDeclaration
                | NodeKind::StructDeclaration => {
                    if let Some(name) = child.child_by_field(Field::Name) {
                        self.symbols.remove_symbol_from_module(&dir, name.text());
                    }
                }
                NodeKind::ImportDeclaration => {
                    if let Some(path_node) = child.child_by_field(Field::Path) {
                        self.remove_import_for_file(&dir, &file_name, path_node.text());
                    }
                }
                _ => {}
            }
        }
    }

    fn remove_method(&mut self, dir: &str, receiver: Node<'_>, method_name: &str) {
        let Some(declaration) = receiver.named_child(0) else {
            return;
        };
        let Some(type_node) = declaration.child_by_field(Field::Type) else {
            return;
        };
        // Methods hang off the base type, not the pointer wrapper.
        let type_name = match type_node.kind() {
            NodeKind::PointerType => match type_node.child_by_field(Field::Type) {
                Some(inner) => inner.text(),
                None => return,
            },
            _ => type_node.text(),
        };
        if let Some(owner) = self.symbols.find_in_module(dir, type_name) {
            self.symbols.remove_child_by_name(owner, method_name);
        }
    }

    fn remove_import_for_file(&mut self, dir: &str, file_name: &str, module_name: &str) {
        let Some(imports) = self.imports.get_mut(dir) else {
            return;
        };
        for index in (0..imports.len()).rev() {
            let matches = imports[index].name_for_file(file_name) == module_name
                || imports[index].module_name == module_name;
            if matches && imports[index].remove_file(file_name) {
                imports.remove(index);
            }
        }
    }

    // ---- per-file contexts ----------------------------------------------

    /// Open a per-request context for a file at version 0.
    pub fn with(&mut self, file_path: &str) -> AnalyzerContext<'_> {
        self.with_version(file_path, 0)
    }

    /// Open a per-request context carrying the file's edit generation.
    pub fn with_version(&mut self, file_path: &str, file_version: i64) -> AnalyzerContext<'_> {
        let file_id = self.intern_file_path(file_path);
        AnalyzerContext {
            file_id,
            file_path: file_path.to_string(),
            module_dir: parent_dir(file_path).to_string(),
            file_version,
            store: self,
        }
    }
}

/// Per-request context: a file plus exclusive access to the store. The
/// inference walker ([`crate::infer`]) hangs off this type.
pub struct AnalyzerContext<'s> {
    pub store: &'s mut Store,
    file_id: FileId,
    file_path: String,
    module_dir: String,
    file_version: i64,
}

impl AnalyzerContext<'_> {
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn module_dir(&self) -> &str {
        &self.module_dir
    }

    pub fn file_version(&self) -> i64 {
        self.file_version
    }

    /// A symbol skeleton carrying this context's file identity.
    pub fn new_symbol(&self, name: impl Into<String>, kind: SymbolKind) -> Symbol {
        Symbol::new(name, kind).with_file(self.file_id, self.file_version)
    }

    pub fn find_symbol(&self, module_name: &str, name: &str) -> Result<SymbolId, StoreError> {
        self.store.find_symbol(&self.file_path, module_name, name)
    }

    pub fn register_symbol(&mut self, info: Symbol) -> Result<SymbolId, RegistrationError> {
        self.store.register_symbol(info)
    }

    pub fn get_scope_from_node(&mut self, node: Node<'_>) -> ScopeId {
        self.store.scopes.get_scope_from_node(self.file_id, node)
    }

    /// Register a local symbol into the scope that owns the node.
    pub fn register_local_symbol(&mut self, scope_id: ScopeId, info: Symbol) -> SymbolId {
        let store = &mut *self.store;
        store.scopes.register_symbol(&mut store.symbols, scope_id, info)
    }
}
