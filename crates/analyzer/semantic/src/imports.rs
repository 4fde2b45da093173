//! Import records supplied by the importer.
//!
//! One [`Import`] describes one imported module for one importing directory.
//! Aliases, selectively-imported symbols, and declaration ranges are tracked
//! per importing *file*, because sibling files of a module may import the
//! same module differently.

use rustc_hash::{FxHashMap, FxHashSet};
use vls_analyzer_syntax::Range;

/// One imported module, as seen from one importing directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Import {
    /// The module's declared name (`os`, `net.http`).
    pub module_name: String,
    /// Resolved directory of the module.
    pub path: String,
    /// Per-file alias (`import strings as str`).
    pub aliases: FxHashMap<String, String>,
    /// Per-file selective imports (`import os { args }`).
    pub symbols: FxHashMap<String, FxHashSet<String>>,
    /// Per-file ranges of the import declarations.
    pub ranges: FxHashMap<String, Vec<Range>>,
}

impl Import {
    pub fn new(module_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn set_alias(&mut self, file_name: impl Into<String>, alias: impl Into<String>) {
        self.aliases.insert(file_name.into(), alias.into());
    }

    pub fn add_symbol(&mut self, file_name: impl Into<String>, symbol: impl Into<String>) {
        self.symbols
            .entry(file_name.into())
            .or_default()
            .insert(symbol.into());
    }

    pub fn add_range(&mut self, file_name: impl Into<String>, range: Range) {
        self.ranges.entry(file_name.into()).or_default().push(range);
    }

    /// The name this module goes by inside the given file.
    pub fn name_for_file(&self, file_name: &str) -> &str {
        self.aliases
            .get(file_name)
            .map(String::as_str)
            .unwrap_or(&self.module_name)
    }

    /// Whether the file selectively imports the given symbol.
    pub fn imports_symbol(&self, file_name: &str, symbol: &str) -> bool {
        self.symbols
            .get(file_name)
            .is_some_and(|names| names.contains(symbol))
    }

    /// Whether the file declares this import at all.
    pub fn used_by_file(&self, file_name: &str) -> bool {
        self.ranges.contains_key(file_name)
    }

    /// Forget one file's view of this import; true when no file uses the
    /// import anymore.
    pub fn remove_file(&mut self, file_name: &str) -> bool {
        self.aliases.remove(file_name);
        self.symbols.remove(file_name);
        self.ranges.remove(file_name);
        self.ranges.is_empty()
    }
}
