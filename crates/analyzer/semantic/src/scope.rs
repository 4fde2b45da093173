//! Lexical scope trees.
//!
//! Each open file owns one scope tree rooted at a scope that spans the whole
//! source. A scope contains a byte offset `p` iff
//! `start_byte <= p <= end_byte`; nesting is strict containment. Scopes hold
//! the ids of their local symbols; the symbol records themselves live in the
//! symbol arena.

use rustc_hash::FxHashMap;
use tracing::trace;
use vls_analyzer_syntax::{Node, NodeKind};

use crate::store::FileId;
use crate::symbol::{InfoSource, Symbol, SymbolId};
use crate::symbols::SymbolManager;

index_vec::define_index_type! {
    /// Index of a scope in the store-wide arena.
    pub struct ScopeId = u32;

    MAX_INDEX = (u32::MAX - 1) as usize;
    DEBUG_FORMAT = "scope{}";
}

impl ScopeId {
    /// Sentinel for "no scope": the parent of file roots and the scope of
    /// top-level symbols.
    pub const DETACHED: Self = Self::from_raw_unchecked(u32::MAX);

    pub fn is_detached(self) -> bool {
        self == Self::DETACHED
    }
}

/// A byte-range lexical region owning local symbols and nested scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeTree {
    pub id: ScopeId,
    pub parent: ScopeId,
    pub children: Vec<ScopeId>,
    pub symbols: Vec<SymbolId>,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl ScopeTree {
    pub const fn contains(&self, byte: usize) -> bool {
        self.start_byte <= byte && byte <= self.end_byte
    }

    /// Strict containment: covers the range and is not identical to it.
    pub const fn strictly_contains(&self, start_byte: usize, end_byte: usize) -> bool {
        self.contains(start_byte)
            && self.contains(end_byte)
            && !(self.start_byte == start_byte && self.end_byte == end_byte)
    }

    /// Local symbol names, for logs and tests.
    pub fn debug_str(&self, info: &impl InfoSource) -> String {
        let names: Vec<&str> = self
            .symbols
            .iter()
            .map(|&id| info.symbol_name(id))
            .collect();
        format!(
            "scope {}..{} [{}]",
            self.start_byte,
            self.end_byte,
            names.join(", ")
        )
    }
}

/// Arena of scopes plus the file → root-scope index.
#[derive(Debug, Default)]
pub struct ScopeManager {
    scopes: index_vec::IndexVec<ScopeId, ScopeTree>,
    file_scopes: FxHashMap<FileId, ScopeId>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn get(&self, id: ScopeId) -> Option<&ScopeTree> {
        if id.is_detached() {
            return None;
        }
        self.scopes.get(id)
    }

    /// The root scope of a file, if the file has been opened.
    pub fn root_scope(&self, file_id: FileId) -> Option<ScopeId> {
        self.file_scopes.get(&file_id).copied()
    }

    fn new_root(&mut self, file_id: FileId, start_byte: usize, end_byte: usize) -> ScopeId {
        let id = ScopeId::new(self.scopes.len());
        self.scopes.push(ScopeTree {
            id,
            parent: ScopeId::DETACHED,
            children: Vec::new(),
            symbols: Vec::new(),
            start_byte,
            end_byte,
        });
        self.file_scopes.insert(file_id, id);
        trace!(?file_id, scope = ?id, "created root scope");
        id
    }

    fn new_child(&mut self, parent: ScopeId, start_byte: usize, end_byte: usize) -> ScopeId {
        let id = ScopeId::new(self.scopes.len());
        self.scopes.push(ScopeTree {
            id,
            parent,
            children: Vec::new(),
            symbols: Vec::new(),
            start_byte,
            end_byte,
        });
        self.scopes[parent].children.push(id);
        id
    }

    /// The scope a node belongs to, creating scopes as needed.
    ///
    /// For the file root the root scope is created or re-stretched to the
    /// node's range. For any other node the innermost existing scope is
    /// located; if it strictly contains the node's range a child scope is
    /// created, otherwise the found scope is reused.
    pub fn get_scope_from_node(&mut self, file_id: FileId, node: Node<'_>) -> ScopeId {
        if node.is_root() || node.kind() == NodeKind::SourceFile {
            return match self.file_scopes.get(&file_id).copied() {
                Some(root) => {
                    let scope = &mut self.scopes[root];
                    scope.start_byte = node.start_byte();
                    scope.end_byte = node.end_byte();
                    root
                }
                None => self.new_root(file_id, node.start_byte(), node.end_byte()),
            };
        }

        let root = match self.file_scopes.get(&file_id).copied() {
            Some(root) => root,
            None => {
                let range = node.tree().root().range();
                self.new_root(file_id, range.start_byte, range.end_byte)
            }
        };

        let found = self
            .innermost(root, node.start_byte(), node.end_byte())
            .unwrap_or(root);
        if self.scopes[found].strictly_contains(node.start_byte(), node.end_byte()) {
            self.new_child(found, node.start_byte(), node.end_byte())
        } else {
            found
        }
    }

    /// The smallest descendant of `scope` containing both offsets, or `None`
    /// when no child does.
    pub fn innermost(&self, scope: ScopeId, start_byte: usize, end_byte: usize) -> Option<ScopeId> {
        let tree = self.get(scope)?;
        for &child in &tree.children {
            let child_tree = &self.scopes[child];
            if child_tree.contains(start_byte) && child_tree.contains(end_byte) {
                return Some(
                    self.innermost(child, start_byte, end_byte)
                        .unwrap_or(child),
                );
            }
        }
        None
    }

    /// Register a local symbol into a scope.
    ///
    /// A same-name local is updated in place (stale file versions are
    /// dropped by the update policy); otherwise a new symbol is created and
    /// appended. A symbol starting before the scope grows the scope
    /// leftward.
    pub fn register_symbol(
        &mut self,
        symbols: &mut SymbolManager,
        scope_id: ScopeId,
        mut info: Symbol,
    ) -> SymbolId {
        if self.get(scope_id).is_none() {
            return SymbolId::VOID;
        }

        if let Some((existing, _)) =
            symbols.find_symbol_by_name(&self.scopes[scope_id].symbols, &info.name)
        {
            let _ = symbols.update_local_symbol(existing, &info);
            return existing;
        }

        info.scope = scope_id;
        let start_byte = info.range.start_byte;
        let id = symbols.create_new_symbol_with(info);
        let scope = &mut self.scopes[scope_id];
        scope.symbols.push(id);
        if start_byte < scope.start_byte {
            scope.start_byte = start_byte;
        }
        id
    }

    /// Drop every local symbol whose range falls inside the line window,
    /// recursing into child scopes. A child that ends up with no symbols and
    /// no children is detached from its parent. Returns whether this scope
    /// is now empty.
    pub fn remove_symbols_by_line(
        &mut self,
        symbols: &SymbolManager,
        scope_id: ScopeId,
        start_line: usize,
        end_line: usize,
    ) -> bool {
        if self.get(scope_id).is_none() {
            return false;
        }
        {
            let scope = &mut self.scopes[scope_id];
            scope.symbols.retain(|&id| {
                !symbols
                    .get_info(id)
                    .range
                    .within_rows(start_line, end_line)
            });
        }

        // Reverse order keeps in-place removal index-safe.
        let child_count = self.scopes[scope_id].children.len();
        for index in (0..child_count).rev() {
            let child = self.scopes[scope_id].children[index];
            if self.remove_symbols_by_line(symbols, child, start_line, end_line) {
                self.scopes[scope_id].children.remove(index);
            }
        }

        let scope = &self.scopes[scope_id];
        scope.symbols.is_empty() && scope.children.is_empty()
    }

    /// All local symbols visible at `byte`: starting from the innermost
    /// scope containing it, walk parents to the file root collecting ids
    /// whose range ends at or before `byte`.
    pub fn symbols_before(
        &self,
        symbols: &SymbolManager,
        file_id: FileId,
        byte: usize,
    ) -> Vec<SymbolId> {
        let Some(root) = self.root_scope(file_id) else {
            return Vec::new();
        };
        let mut current = self.innermost(root, byte, byte).unwrap_or(root);
        let mut out = Vec::new();
        loop {
            let scope = &self.scopes[current];
            out.extend(
                scope
                    .symbols
                    .iter()
                    .copied()
                    .filter(|&id| symbols.get_info(id).range.end_byte <= byte),
            );
            if scope.parent.is_detached() {
                break;
            }
            current = scope.parent;
        }
        out
    }

    /// Forget a file's root scope. Arena slots stay allocated but become
    /// unreachable, matching the store's deletion policy.
    pub fn remove_file(&mut self, file_id: FileId) {
        self.file_scopes.remove(&file_id);
    }
}
