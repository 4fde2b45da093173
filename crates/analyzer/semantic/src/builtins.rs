//! Builtin module bootstrapper.
//!
//! Seeds the virtual `/builtin` module with the primitive types, the base
//! container types that carry members for derived types, and the handful of
//! symbols the walker asks for by name (`none`, `[]string`). Runs once per
//! store, before any file is analyzed.

use vls_analyzer_syntax::{Point, Range};

use crate::imports::Import;
use crate::store::{FileId, Store};
use crate::symbol::{Symbol, SymbolAccess, SymbolId, SymbolKind};

pub const BUILTIN_MODULE_DIR: &str = "/builtin";
pub const BUILTIN_FILE_PATH: &str = "/builtin/builtin.vv";

const PRIMITIVE_TYPES: &[&str] = &[
    "bool", "i8", "i16", "int", "i64", "isize", "u8", "u16", "u32", "u64", "usize", "f32", "f64",
    "rune", "char", "voidptr", "byteptr", "charptr",
];

/// Bootstrap names any real declaration may replace.
const LOW_PRIORITY: &[&str] = &["IError", "string", "array", "map"];

struct Bootstrapper<'s> {
    store: &'s mut Store,
    file_id: FileId,
    row: usize,
}

impl Bootstrapper<'_> {
    /// Each bootstrap symbol gets its own declaration row so the rename-at-
    /// row heuristic never confuses two of them.
    fn next_range(&mut self) -> Range {
        let row = self.row;
        self.row += 1;
        Range::new(
            row * 32,
            row * 32 + 8,
            Point::new(row, 0),
            Point::new(row, 8),
        )
    }

    fn declare(&mut self, name: &str, kind: SymbolKind) -> SymbolId {
        let version = if LOW_PRIORITY.contains(&name) { -1 } else { 0 };
        let range = self.next_range();
        let sym = Symbol::new(name, kind)
            .with_file(self.file_id, version)
            .with_range(range)
            .with_access(SymbolAccess::Public)
            .top_level();
        self.store.register_symbol(sym).unwrap_or(SymbolId::VOID)
    }

    fn member(&mut self, owner: SymbolId, name: &str, kind: SymbolKind, member_type: SymbolId) {
        let sym = Symbol::new(name, kind)
            .with_file(self.file_id, 0)
            .with_access(SymbolAccess::Public)
            .with_return(member_type);
        let id = self.store.symbols.create_new_symbol_with(sym);
        let _ = self.store.symbols.add_child(owner, id);
    }
}

/// Register the builtin universe into a fresh store.
pub fn register_builtins(store: &mut Store) {
    let file_id = store.intern_file_path(BUILTIN_FILE_PATH);

    let builtin_import = Import::new("builtin", BUILTIN_MODULE_DIR);
    store.register_auto_import(&builtin_import, "");
    store.register_auto_import(&builtin_import, "builtin");

    let mut boot = Bootstrapper {
        store,
        file_id,
        row: 0,
    };

    // `void` answers name lookups; absent ids go through the arena sentinel.
    boot.declare("void", SymbolKind::Void);
    boot.declare("never", SymbolKind::Never);
    for name in PRIMITIVE_TYPES {
        boot.declare(name, SymbolKind::Struct);
    }
    let int = boot
        .store
        .symbols
        .find_in_module(BUILTIN_MODULE_DIR, "int")
        .unwrap_or(SymbolId::VOID);

    let string = boot.declare("string", SymbolKind::Struct);
    boot.member(string, "len", SymbolKind::Field, int);

    let array = boot.declare("array", SymbolKind::Struct);
    boot.member(array, "len", SymbolKind::Field, int);
    boot.member(array, "cap", SymbolKind::Field, int);

    let map = boot.declare("map", SymbolKind::Struct);
    boot.member(map, "len", SymbolKind::Field, int);

    let chan = boot.declare("chan", SymbolKind::Struct);
    boot.member(chan, "len", SymbolKind::Field, int);
    boot.member(chan, "cap", SymbolKind::Field, int);
    boot.member(chan, "close", SymbolKind::Function, SymbolId::VOID);

    let ierror = boot.declare("IError", SymbolKind::Interface);
    boot.member(ierror, "msg", SymbolKind::Function, string);
    boot.member(ierror, "code", SymbolKind::Function, int);
    if let Some(sym) = boot.store.symbols.get_mut(ierror) {
        sym.interface_children_len = 2;
    }

    boot.declare("none", SymbolKind::Struct);

    let string_array = boot.declare("[]string", SymbolKind::Array);
    boot.store
        .symbols
        .add_child_allow_duplicated(string_array, string);

    store.add_base_symbol_location("builtin", "array", SymbolKind::Array);
    store.add_base_symbol_location("builtin", "map", SymbolKind::Map);
    store.add_base_symbol_location("builtin", "chan", SymbolKind::Chan);
    store.add_base_symbol_location("builtin", "IError", SymbolKind::Optional);
    store.add_base_symbol_location("builtin", "IError", SymbolKind::Result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::InfoSource;

    #[test]
    fn primitives_resolve_unqualified() {
        let store = Store::with_builtins();
        for name in ["int", "bool", "string", "rune", "u8"] {
            let id = store.find_symbol("/pkg/main.vv", "", name).unwrap();
            assert_eq!(store.symbols.get_info(id).name, name);
        }
    }

    #[test]
    fn low_priority_names_register_at_negative_version() {
        let store = Store::with_builtins();
        let string = store.find_symbol("/pkg/main.vv", "", "string").unwrap();
        assert_eq!(store.symbols.get_info(string).file_version, -1);
        let int = store.find_symbol("/pkg/main.vv", "", "int").unwrap();
        assert_eq!(store.symbols.get_info(int).file_version, 0);
    }

    #[test]
    fn base_symbols_redirect_derived_kinds() {
        let store = Store::with_builtins();
        let array = store.base_symbol_of(SymbolKind::Array).unwrap();
        assert_eq!(store.symbols.get_info(array).name, "array");

        let for_option = store.base_symbol_of(SymbolKind::Optional).unwrap();
        let for_result = store.base_symbol_of(SymbolKind::Result).unwrap();
        assert_eq!(for_option, for_result);
        assert_eq!(store.symbols.get_info(for_option).name, "IError");
        assert_eq!(store.symbols.get_info(for_option).interface_children_len, 2);
    }

    #[test]
    fn string_array_is_prebuilt() {
        let store = Store::with_builtins();
        let id = store.find_symbol("/pkg/main.vv", "", "[]string").unwrap();
        let sym = store.symbols.get_info(id);
        assert_eq!(sym.kind, SymbolKind::Array);
        let element = sym.children.first().copied().unwrap();
        assert_eq!(store.symbols.get_info(element).name, "string");
    }
}
