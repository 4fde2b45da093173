//! Store-level laws: identifier construction, registration idempotence,
//! lookup order, and per-file symbol listings.

mod common;

use common::{module_symbol, test_store};
use vls_analyzer_semantic::{Import, InfoSource, Symbol, SymbolKind};
use vls_analyzer_syntax::Range;

#[test]
fn ident_construction_law_holds() {
    let mut store = test_store();
    let info = module_symbol(&mut store, "/pkg/sub/main.vv", "Thing", SymbolKind::Struct, 0, 0);
    let id = store.register_symbol(info).unwrap();

    let sym = store.symbols.get_info(id).clone();
    let expected = format!(
        "{}/{}",
        store
            .file_path(sym.file_id)
            .map(|path| &path[..path.rfind('/').unwrap()])
            .unwrap(),
        sym.name
    );
    assert_eq!(store.get_ident_of_symbol(id).unwrap(), expected);
    assert_eq!(expected, "/pkg/sub/Thing");
}

#[test]
fn reregistration_of_identical_symbol_is_idempotent() {
    let mut store = test_store();
    let info = module_symbol(&mut store, "/pkg/main.vv", "Foo", SymbolKind::Struct, 2, 1);
    let first = store.register_symbol(info.clone()).unwrap();
    let snapshot = store.symbols.get_info(first).clone();

    let second = store.register_symbol(info).unwrap();
    assert_eq!(first, second);
    assert_eq!(store.symbols.get_info(first), &snapshot);
    assert_eq!(store.symbols.module_ids("/pkg").len(), 1);
}

#[test]
fn register_then_find_round_trips() {
    let mut store = test_store();
    let info = module_symbol(&mut store, "/pkg/main.vv", "Foo", SymbolKind::Struct, 0, 0);
    let id = store.register_symbol(info).unwrap();

    assert_eq!(store.find_symbol("/pkg/main.vv", "", "Foo").unwrap(), id);
    // Sibling files of the module see it too.
    assert_eq!(store.find_symbol("/pkg/other.vv", "", "Foo").unwrap(), id);
    // Foreign modules do not.
    assert!(store.find_symbol("/elsewhere/main.vv", "", "Foo").is_err());
}

#[test]
fn lookup_prefers_own_module_over_builtin() {
    let mut store = test_store();
    // A module-local `string` shadows the builtin one.
    let info = module_symbol(&mut store, "/pkg/main.vv", "string", SymbolKind::Struct, 0, 3);
    let local = store.register_symbol(info).unwrap();

    assert_eq!(store.find_symbol("/pkg/main.vv", "", "string").unwrap(), local);
    let builtin = store.find_symbol("/other/main.vv", "", "string").unwrap();
    assert_ne!(builtin, local);
}

#[test]
fn selective_imports_resolve_unqualified() {
    let mut store = test_store();
    let info = module_symbol(&mut store, "/dep/dep.vv", "Helper", SymbolKind::Struct, 0, 0);
    let helper = store.register_symbol(info).unwrap();

    let mut import = Import::new("dep", "/dep");
    import.add_range("main.vv", Range::default());
    import.add_symbol("main.vv", "Helper");
    store.add_import("/app", import);

    // Unqualified from the importing file.
    assert_eq!(store.find_symbol("/app/main.vv", "", "Helper").unwrap(), helper);
    // Sibling files without the selective import miss it.
    assert!(store.find_symbol("/app/other.vv", "", "Helper").is_err());
    // Qualified access works through the same import.
    assert_eq!(store.find_symbol("/app/main.vv", "dep", "Helper").unwrap(), helper);
}

#[test]
fn aliased_imports_answer_module_queries() {
    let mut store = test_store();
    let info = module_symbol(&mut store, "/vlib/strings/b.vv", "Builder", SymbolKind::Struct, 0, 0);
    store.register_symbol(info).unwrap();

    let mut import = Import::new("strings", "/vlib/strings");
    import.set_alias("main.vv", "str");
    import.add_range("main.vv", Range::default());
    store.add_import("/app", import);

    assert!(store.is_module("/app/main.vv", "str"));
    assert!(!store.is_module("/app/other.vv", "str"));
    assert!(store.is_imported("/app/main.vv", "str"));
    assert!(store.find_symbol("/app/main.vv", "str", "Builder").is_ok());
    // The original name is claimed by the alias inside this file.
    assert!(store.find_symbol("/app/main.vv", "strings", "Builder").is_err());
}

#[test]
fn file_symbol_listing_follows_file_ids() {
    let mut store = test_store();

    let in_main = module_symbol(&mut store, "/pkg/main.vv", "Main", SymbolKind::Struct, 0, 0);
    let in_main = store.register_symbol(in_main).unwrap();
    let in_util = module_symbol(&mut store, "/pkg/util.vv", "Util", SymbolKind::Struct, 0, 0);
    let in_util = store.register_symbol(in_util).unwrap();

    // A field declared in util.vv on a struct from main.vv is reachable
    // through children.
    let field_file = store.intern_file_path("/pkg/util.vv");
    let field = store.symbols.create_new_symbol_with(
        Symbol::new("embedded", SymbolKind::Field).with_file(field_file, 0),
    );
    store.symbols.add_child(in_main, field).unwrap();

    assert_eq!(store.get_symbols_by_file_path("/pkg/main.vv"), vec![in_main]);
    // Module order: `Main` is scanned first, surfacing its util.vv field
    // before util.vv's own top-level symbol.
    assert_eq!(
        store.get_symbols_by_file_path("/pkg/util.vv"),
        vec![field, in_util]
    );
    assert!(store.get_symbols_by_file_path("/pkg/unknown.vv").is_empty());
}
