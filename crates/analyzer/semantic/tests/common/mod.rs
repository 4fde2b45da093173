//! Shared fixtures for the semantic integration tests.
//!
//! Trees are built directly through the syntax adapter's builder, the same
//! seam the real parser feeds, so no grammar is needed here.

#![allow(dead_code)]

use vls_analyzer_semantic::{Store, Symbol, SymbolKind};
use vls_analyzer_syntax::{Field, NodeKind, Point, Range, SourceText, SyntaxTree, TreeBuilder};

/// A store with the builtin module bootstrapped.
pub fn test_store() -> Store {
    Store::with_builtins()
}

/// A fabricated declaration range on the given row.
pub fn range_at_row(row: usize) -> Range {
    Range::new(
        row * 40,
        row * 40 + 10,
        Point::new(row, 0),
        Point::new(row, 10),
    )
}

/// A top-level symbol skeleton living in `path` at the given row.
pub fn module_symbol(
    store: &mut Store,
    path: &str,
    name: &str,
    kind: SymbolKind,
    row: usize,
    version: i64,
) -> Symbol {
    let file_id = store.intern_file_path(path);
    Symbol::new(name, kind)
        .with_file(file_id, version)
        .with_range(range_at_row(row))
        .top_level()
}

/// `[]elem`: an array type node as the single child of a source file.
pub fn array_type_tree(elem: &str) -> SyntaxTree {
    let source = format!("[]{elem}");
    let len = source.len();
    let mut builder = TreeBuilder::new(SourceText::new(source));
    let root = builder.root(NodeKind::SourceFile);
    let array = builder.push(root, NodeKind::ArrayType, 0, len);
    builder.push_field(array, Field::Element, NodeKind::TypeIdentifier, 2, len);
    builder.build()
}

/// `[limit]elem`: a fixed array type node.
pub fn fixed_array_type_tree(limit: &str, elem: &str) -> SyntaxTree {
    let source = format!("[{limit}]{elem}");
    let len = source.len();
    let elem_start = 2 + limit.len();
    let mut builder = TreeBuilder::new(SourceText::new(source));
    let root = builder.root(NodeKind::SourceFile);
    let array = builder.push(root, NodeKind::FixedArrayType, 0, len);
    builder.push_field(array, Field::Limit, NodeKind::IntLiteral, 1, 1 + limit.len());
    builder.push_field(array, Field::Element, NodeKind::TypeIdentifier, elem_start, len);
    builder.build()
}

/// `map[key]value`: a map type node.
pub fn map_type_tree(key: &str, value: &str) -> SyntaxTree {
    let source = format!("map[{key}]{value}");
    let len = source.len();
    let key_start = 4;
    let key_end = key_start + key.len();
    let mut builder = TreeBuilder::new(SourceText::new(source));
    let root = builder.root(NodeKind::SourceFile);
    let map = builder.push(root, NodeKind::MapType, 0, len);
    builder.push_field(map, Field::Key, NodeKind::TypeIdentifier, key_start, key_end);
    builder.push_field(map, Field::Value, NodeKind::TypeIdentifier, key_end + 1, len);
    builder.build()
}

/// `&inner`: a pointer type node.
pub fn pointer_type_tree(inner: &str) -> SyntaxTree {
    let source = format!("&{inner}");
    let len = source.len();
    let mut builder = TreeBuilder::new(SourceText::new(source));
    let root = builder.root(NodeKind::SourceFile);
    let pointer = builder.push(root, NodeKind::PointerType, 0, len);
    builder.push_field(pointer, Field::Type, NodeKind::TypeIdentifier, 1, len);
    builder.build()
}

/// `chan inner`: a channel type node.
pub fn channel_type_tree(inner: &str) -> SyntaxTree {
    let source = format!("chan {inner}");
    let len = source.len();
    let mut builder = TreeBuilder::new(SourceText::new(source));
    let root = builder.root(NodeKind::SourceFile);
    let chan = builder.push(root, NodeKind::ChannelType, 0, len);
    builder.push_field(chan, Field::Type, NodeKind::TypeIdentifier, 5, len);
    builder.build()
}

/// `?inner` / `!inner`: option and result type nodes; `None` for the bare
/// forms.
pub fn option_type_tree(inner: Option<&str>) -> SyntaxTree {
    wrapped_type_tree(NodeKind::OptionType, '?', inner)
}

pub fn result_type_tree(inner: Option<&str>) -> SyntaxTree {
    wrapped_type_tree(NodeKind::ResultType, '!', inner)
}

fn wrapped_type_tree(kind: NodeKind, sigil: char, inner: Option<&str>) -> SyntaxTree {
    let source = match inner {
        Some(inner) => format!("{sigil}{inner}"),
        None => sigil.to_string(),
    };
    let len = source.len();
    let mut builder = TreeBuilder::new(SourceText::new(source));
    let root = builder.root(NodeKind::SourceFile);
    let node = builder.push(root, kind, 0, len);
    if inner.is_some() {
        builder.push_field(node, Field::Type, NodeKind::TypeIdentifier, 1, len);
    }
    builder.build()
}

/// `...inner`: a variadic type node.
pub fn variadic_type_tree(inner: &str) -> SyntaxTree {
    let source = format!("...{inner}");
    let len = source.len();
    let mut builder = TreeBuilder::new(SourceText::new(source));
    let root = builder.root(NodeKind::SourceFile);
    let variadic = builder.push(root, NodeKind::VariadicType, 0, len);
    builder.push_field(variadic, Field::Type, NodeKind::TypeIdentifier, 3, len);
    builder.build()
}

/// A bare type identifier node.
pub fn type_ident_tree(name: &str) -> SyntaxTree {
    let len = name.len();
    let mut builder = TreeBuilder::new(SourceText::new(name));
    let root = builder.root(NodeKind::SourceFile);
    builder.push(root, NodeKind::TypeIdentifier, 0, len);
    builder.build()
}

/// `module.Name`: a qualified type node.
pub fn qualified_type_tree(module: &str, name: &str) -> SyntaxTree {
    let source = format!("{module}.{name}");
    let len = source.len();
    let mut builder = TreeBuilder::new(SourceText::new(source));
    let root = builder.root(NodeKind::SourceFile);
    let qualified = builder.push(root, NodeKind::QualifiedType, 0, len);
    builder.push_field(qualified, Field::Module, NodeKind::Identifier, 0, module.len());
    builder.push_field(qualified, Field::Name, NodeKind::TypeIdentifier, module.len() + 1, len);
    builder.build()
}

/// `fn (a int, b string) ret`: a function type node with named parameters.
pub fn fn_type_tree(params: &[(&str, &str)], ret: Option<&str>) -> SyntaxTree {
    let mut source = String::from("fn (");
    let mut spans = Vec::new();
    for (index, (name, ty)) in params.iter().enumerate() {
        if index > 0 {
            source.push_str(", ");
        }
        let name_start = source.len();
        source.push_str(name);
        let name_end = source.len();
        source.push(' ');
        let type_start = source.len();
        source.push_str(ty);
        spans.push((name_start, name_end, type_start, source.len()));
    }
    let params_end = source.len() + 1;
    source.push(')');
    let ret_span = ret.map(|ret| {
        source.push(' ');
        let start = source.len();
        source.push_str(ret);
        (start, source.len())
    });
    let len = source.len();

    let mut builder = TreeBuilder::new(SourceText::new(source));
    let root = builder.root(NodeKind::SourceFile);
    let fn_type = builder.push(root, NodeKind::FunctionType, 0, len);
    let list = builder.push_field(fn_type, Field::Parameters, NodeKind::ParameterList, 3, params_end);
    for (name_start, name_end, type_start, type_end) in spans {
        let param = builder.push(list, NodeKind::ParameterDeclaration, name_start, type_end);
        builder.push_field(param, Field::Name, NodeKind::Identifier, name_start, name_end);
        builder.push_field(param, Field::Type, NodeKind::TypeIdentifier, type_start, type_end);
    }
    if let Some((start, end)) = ret_span {
        builder.push_field(fn_type, Field::Result, NodeKind::TypeIdentifier, start, end);
    }
    builder.build()
}

/// The single type node under a tree built by the helpers above.
pub fn type_node(tree: &SyntaxTree) -> vls_analyzer_syntax::Node<'_> {
    tree.root()
        .named_child(0)
        .expect("fixture trees carry one type node")
}
