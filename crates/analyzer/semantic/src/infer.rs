//! The type-inference walker.
//!
//! Two entry points on [`AnalyzerContext`]: [`infer_symbol_from_node`]
//! resolves a node to the symbol it *declares or names* (an identifier's
//! variable, a call's function, a type node's type), while
//! [`infer_value_type_from_node`] resolves it to the *type of the value* the
//! expression produces. Both dispatch on [`NodeKind`] and fall back to the
//! void sentinel instead of failing: absence is reported by higher layers.
//!
//! Derived types (`&T`, `[]T`, `map[K]V`, `chan T`, `?T`, `!T`, `...T`,
//! multi-returns, anonymous function types) are constructed on the fly the
//! first time they are mentioned and de-duplicated by their printable name;
//! this is how the type universe grows lazily.
//!
//! [`infer_symbol_from_node`]: AnalyzerContext::infer_symbol_from_node
//! [`infer_value_type_from_node`]: AnalyzerContext::infer_value_type_from_node

use tracing::trace;
use vls_analyzer_syntax::{Field, Node, NodeKind};

use crate::store::AnalyzerContext;
use crate::symbol::{InfoSource, Symbol, SymbolAccess, SymbolId, SymbolKind};

/// Synthesized records for these names register at version `-1` so the real
/// declarations, when they arrive, always win the version check.
const LOW_PRIORITY_NAMES: &[&str] = &["IError", "string", "array", "map"];

/// Compute `(kind, module, printable name)` for a type node.
///
/// The printable forms (`&T`, `[]T`, `map[K]V`, `chan T`, `?T`, `!T`,
/// `...T`) double as the lookup keys inside a module. An option or result
/// over `void` collapses to a bare `?` / `!`.
pub fn symbol_name_from_node(node: Node<'_>) -> (SymbolKind, String, String) {
    match node.kind() {
        NodeKind::PointerType => {
            let (module, name) = inner_name(node, Field::Type);
            (SymbolKind::Ref, module, format!("&{name}"))
        }
        NodeKind::ArrayType => {
            let (module, name) = inner_name(node, Field::Element);
            (SymbolKind::Array, module, format!("[]{name}"))
        }
        NodeKind::FixedArrayType => {
            let limit = node
                .child_by_field(Field::Limit)
                .map(|n| n.text())
                .unwrap_or_default();
            let (module, name) = inner_name(node, Field::Element);
            (SymbolKind::Array, module, format!("[{limit}]{name}"))
        }
        NodeKind::MapType => {
            let (key_module, key_name) = inner_name(node, Field::Key);
            let (value_module, value_name) = inner_name(node, Field::Value);
            // The key's module wins when both are set.
            let module = if key_module.is_empty() {
                value_module
            } else {
                key_module
            };
            (SymbolKind::Map, module, format!("map[{key_name}]{value_name}"))
        }
        NodeKind::ChannelType => {
            let (module, name) = inner_name(node, Field::Type);
            (SymbolKind::Chan, module, format!("chan {name}"))
        }
        NodeKind::OptionType => {
            let (module, name) = inner_name(node, Field::Type);
            if name.is_empty() || name == "void" {
                (SymbolKind::Optional, String::new(), "?".to_string())
            } else {
                (SymbolKind::Optional, module, format!("?{name}"))
            }
        }
        NodeKind::ResultType => {
            let (module, name) = inner_name(node, Field::Type);
            if name.is_empty() || name == "void" {
                (SymbolKind::Result, String::new(), "!".to_string())
            } else {
                (SymbolKind::Result, module, format!("!{name}"))
            }
        }
        NodeKind::VariadicType => {
            let (module, name) = inner_name(node, Field::Type);
            (SymbolKind::Variadic, module, format!("...{name}"))
        }
        NodeKind::MultiReturnType => (
            SymbolKind::MultiReturn,
            String::new(),
            node.text().to_string(),
        ),
        NodeKind::GenericType => node
            .named_child(0)
            .map(symbol_name_from_node)
            .unwrap_or((SymbolKind::Placeholder, String::new(), String::new())),
        NodeKind::FunctionType | NodeKind::FnLiteral => {
            (SymbolKind::FunctionType, String::new(), String::new())
        }
        NodeKind::CallExpression => node
            .child_by_field(Field::Function)
            .map(symbol_name_from_node)
            .unwrap_or((
                SymbolKind::Placeholder,
                String::new(),
                node.text().to_string(),
            )),
        NodeKind::QualifiedType => {
            let module = node
                .child_by_field(Field::Module)
                .map(|n| n.text().to_string())
                .unwrap_or_default();
            let name = node
                .child_by_field(Field::Name)
                .map(|n| n.text().to_string())
                .unwrap_or_default();
            (SymbolKind::Placeholder, module, name)
        }
        _ => (
            SymbolKind::Placeholder,
            String::new(),
            node.text().to_string(),
        ),
    }
}

fn inner_name(node: Node<'_>, field: Field) -> (String, String) {
    node.child_by_field(field)
        .map(|inner| {
            let (_, module, name) = symbol_name_from_node(inner);
            (module, name)
        })
        .unwrap_or_default()
}

impl AnalyzerContext<'_> {
    /// Resolve a type node to its symbol, synthesizing derived types and
    /// placeholders on the fly. `None` only for malformed nodes.
    pub fn find_symbol_by_type_node(&mut self, node: Node<'_>) -> Option<SymbolId> {
        match node.kind() {
            NodeKind::GenericType => {
                return node
                    .named_child(0)
                    .and_then(|inner| self.find_symbol_by_type_node(inner));
            }
            NodeKind::CallExpression => {
                return node
                    .child_by_field(Field::Function)
                    .and_then(|function| self.find_symbol_by_type_node(function));
            }
            _ => {}
        }

        let (kind, module, name) = symbol_name_from_node(node);
        if kind == SymbolKind::FunctionType {
            return self.find_fn_symbol_by_type_node(node);
        }
        if name.is_empty() {
            return None;
        }
        if let Ok(id) = self.find_symbol(&module, &name) {
            return Some(id);
        }
        self.synthesize_type(node, kind, &module, &name)
    }

    /// Build and register the record for a type that has no symbol yet.
    fn synthesize_type(
        &mut self,
        node: Node<'_>,
        kind: SymbolKind,
        module: &str,
        name: &str,
    ) -> Option<SymbolId> {
        // Resolve components first; they also decide where the new record
        // lives when the type is unqualified.
        let mut parent = SymbolId::VOID;
        let mut children: Vec<SymbolId> = Vec::new();
        match node.kind() {
            NodeKind::ArrayType | NodeKind::FixedArrayType => {
                let element = node
                    .child_by_field(Field::Element)
                    .and_then(|n| self.find_symbol_by_type_node(n))?;
                children.push(element);
            }
            NodeKind::MapType => {
                let key = node
                    .child_by_field(Field::Key)
                    .and_then(|n| self.find_symbol_by_type_node(n))?;
                let value = node
                    .child_by_field(Field::Value)
                    .and_then(|n| self.find_symbol_by_type_node(n))?;
                children.push(key);
                children.push(value);
            }
            NodeKind::PointerType | NodeKind::ChannelType => {
                parent = node
                    .child_by_field(Field::Type)
                    .and_then(|n| self.find_symbol_by_type_node(n))?;
            }
            NodeKind::OptionType | NodeKind::ResultType => {
                // A missing inner type is the bare `?` / `!` form.
                parent = node
                    .child_by_field(Field::Type)
                    .and_then(|n| self.find_symbol_by_type_node(n))
                    .unwrap_or(SymbolId::VOID);
            }
            NodeKind::VariadicType => {
                let inner = node
                    .child_by_field(Field::Type)
                    .and_then(|n| self.find_symbol_by_type_node(n))?;
                children.push(inner);
            }
            NodeKind::MultiReturnType => {
                for component in node.children() {
                    let id = self.find_symbol_by_type_node(component)?;
                    children.push(id);
                }
            }
            _ => {}
        }

        let module_dir = self.placement_dir(module, parent, &children);
        let placeholder_path = format!("{module_dir}/placeholder.vv");
        let file_id = self.store.intern_file_path(&placeholder_path);
        let file_version = if LOW_PRIORITY_NAMES.contains(&name) { -1 } else { 0 };

        let sym = Symbol::new(name, kind)
            .with_file(file_id, file_version)
            .with_access(SymbolAccess::Public)
            .with_parent(parent)
            .top_level();
        trace!(name, %kind, %module_dir, "synthesizing type record");
        let id = self.store.register_symbol(sym).ok()?;
        for child in children {
            self.store.symbols.add_child_allow_duplicated(id, child);
        }
        Some(id)
    }

    /// The module directory a synthesized record belongs to: the named
    /// module when qualified, otherwise the module of the inner type, and
    /// the current file's module as the last resort.
    fn placement_dir(&self, module: &str, parent: SymbolId, children: &[SymbolId]) -> String {
        if !module.is_empty() {
            if let Some(import) = self.store.find_import_of_module(self.file_path(), module) {
                return import.path.clone();
            }
            if let Some(dir) = self.store.auto_import_dir(module) {
                return dir.to_string();
            }
            return self.module_dir().to_string();
        }
        let anchor = if !parent.is_void() {
            parent
        } else if let Some(&first) = children.first() {
            first
        } else {
            return self.module_dir().to_string();
        };
        let file_id = self.store.symbols.get_info(anchor).file_id;
        let dir = self.store.module_dir_of(file_id);
        if dir.is_empty() {
            self.module_dir().to_string()
        } else {
            dir.to_string()
        }
    }

    /// Resolve a function type or fn literal, reusing an existing anonymous
    /// function type with the identical signature.
    pub fn find_fn_symbol_by_type_node(&mut self, node: Node<'_>) -> Option<SymbolId> {
        let return_sym = node
            .child_by_field(Field::Result)
            .and_then(|result| self.find_symbol_by_type_node(result))
            .unwrap_or(SymbolId::VOID);

        let mut param_types = Vec::new();
        let mut param_names = Vec::new();
        if let Some(parameters) = node.child_by_field(Field::Parameters) {
            for (index, parameter) in parameters.children().enumerate() {
                if parameter.kind() != NodeKind::ParameterDeclaration {
                    continue;
                }
                let name = parameter
                    .child_by_field(Field::Name)
                    .map(|n| n.text().to_string())
                    .unwrap_or_else(|| format!("arg{}", index + 1));
                let param_type = parameter
                    .child_by_field(Field::Type)
                    .and_then(|n| self.find_symbol_by_type_node(n))
                    .unwrap_or(SymbolId::VOID);
                param_names.push(name);
                param_types.push(param_type);
            }
        }

        let module_dir = self.module_dir().to_string();
        if let Some(existing) =
            self.store
                .find_fn_symbol(&module_dir, &param_types, None, return_sym)
        {
            return Some(existing);
        }

        let placeholder_path = format!("{module_dir}/placeholder.vv");
        let file_id = self.store.intern_file_path(&placeholder_path);
        let name = self.store.next_anon_fn_name();

        let mut params = Vec::new();
        for (param_name, &param_type) in param_names.iter().zip(&param_types) {
            let param = Symbol::new(param_name.clone(), SymbolKind::Variable)
                .with_file(file_id, 0)
                .with_return(param_type);
            params.push(self.store.symbols.create_new_symbol_with(param));
        }

        let sym = Symbol::new(name, SymbolKind::FunctionType)
            .with_file(file_id, 0)
            .with_access(SymbolAccess::Public)
            .with_return(return_sym)
            .with_children(params)
            .top_level();
        self.store.register_symbol(sym).ok()
    }

    /// The symbol a node declares or names: an identifier's binding, a
    /// selector's member, a call's function, a type node's type.
    pub fn infer_symbol_from_node(&mut self, node: Node<'_>) -> SymbolId {
        match node.kind() {
            kind if kind.is_type() => self
                .find_symbol_by_type_node(node)
                .unwrap_or(SymbolId::VOID),
            NodeKind::Identifier => self.resolve_identifier(node),
            NodeKind::SelectorExpression => self.resolve_selector(node),
            NodeKind::CallExpression => node
                .child_by_field(Field::Function)
                .map(|function| self.infer_symbol_from_node(function))
                .unwrap_or(SymbolId::VOID),
            NodeKind::FnLiteral => self
                .find_fn_symbol_by_type_node(node)
                .unwrap_or(SymbolId::VOID),
            NodeKind::TypeInitializer => node
                .child_by_field(Field::Type)
                .and_then(|ty| self.find_symbol_by_type_node(ty))
                .unwrap_or(SymbolId::VOID),
            NodeKind::ParenthesizedExpression => node
                .named_child(0)
                .map(|inner| self.infer_symbol_from_node(inner))
                .unwrap_or(SymbolId::VOID),
            _ => self.infer_value_type_from_node(node),
        }
    }

    /// The type of the value an expression node produces.
    pub fn infer_value_type_from_node(&mut self, node: Node<'_>) -> SymbolId {
        match node.kind() {
            NodeKind::IntLiteral => self.builtin_type("int"),
            NodeKind::FloatLiteral => self.builtin_type("f64"),
            NodeKind::RuneLiteral => self.builtin_type("rune"),
            NodeKind::InterpretedStringLiteral | NodeKind::RawStringLiteral => {
                self.builtin_type("string")
            }
            NodeKind::CStringLiteral => self.builtin_type("charptr"),
            NodeKind::True | NodeKind::False => self.builtin_type("bool"),
            NodeKind::NoneLiteral => self.builtin_type("none"),
            NodeKind::Identifier => {
                let sym = self.resolve_identifier(node);
                self.returnable_type(sym)
            }
            NodeKind::SelectorExpression => {
                let sym = self.resolve_selector(node);
                self.returnable_type(sym)
            }
            NodeKind::CallExpression => self.infer_call_value(node),
            NodeKind::OptionPropagation | NodeKind::ResultPropagation => {
                let Some(inner) = node.named_child(0) else {
                    return SymbolId::VOID;
                };
                let value = self.infer_value_type_from_node(inner);
                let info = self.store.symbols.get_info(value);
                match info.kind {
                    SymbolKind::Optional | SymbolKind::Result => info.parent,
                    _ => value,
                }
            }
            NodeKind::IndexExpression => self.infer_index_value(node),
            NodeKind::SliceExpression => node
                .child_by_field(Field::Operand)
                .map(|operand| self.infer_value_type_from_node(operand))
                .unwrap_or(SymbolId::VOID),
            NodeKind::UnaryExpression => self.infer_unary_value(node),
            NodeKind::BinaryExpression => self.infer_binary_value(node),
            NodeKind::ParenthesizedExpression => node
                .named_child(0)
                .map(|inner| self.infer_value_type_from_node(inner))
                .unwrap_or(SymbolId::VOID),
            NodeKind::FnLiteral => self
                .find_fn_symbol_by_type_node(node)
                .unwrap_or(SymbolId::VOID),
            NodeKind::TypeInitializer => node
                .child_by_field(Field::Type)
                .and_then(|ty| self.find_symbol_by_type_node(ty))
                .unwrap_or(SymbolId::VOID),
            kind if kind.is_type() => self
                .find_symbol_by_type_node(node)
                .unwrap_or(SymbolId::VOID),
            _ => SymbolId::VOID,
        }
    }

    /// Locals visible before the node, innermost scope first, then module
    /// and builtin lookup.
    fn resolve_identifier(&mut self, node: Node<'_>) -> SymbolId {
        let name = node.text();
        let locals = self.store.scopes.symbols_before(
            &self.store.symbols,
            self.file_id(),
            node.start_byte(),
        );
        if let Some((id, _)) = self.store.symbols.find_symbol_by_name(&locals, name) {
            return id;
        }
        self.find_symbol("", name).unwrap_or(SymbolId::VOID)
    }

    fn resolve_selector(&mut self, node: Node<'_>) -> SymbolId {
        let Some(operand) = node.child_by_field(Field::Operand) else {
            return SymbolId::VOID;
        };
        let Some(member) = node.child_by_field(Field::FieldName) else {
            return SymbolId::VOID;
        };
        let member_name = member.text();

        if operand.kind() == NodeKind::Identifier {
            let operand_name = operand.text();
            // `C.x` / `JS.x` resolve through the binded symbol table.
            if operand_name == "C" || operand_name == "JS" {
                let binded = format!("{operand_name}.{member_name}");
                if let Ok(id) = self.find_symbol("", &binded) {
                    return id;
                }
            }
            // `mod.x` resolves inside the imported module.
            if self.store.is_module(self.file_path(), operand_name) {
                if let Ok(id) = self.find_symbol(operand_name, member_name) {
                    return id;
                }
                return SymbolId::VOID;
            }
        }

        let base = self.infer_value_type_from_node(operand);
        self.member_of(base, member_name)
    }

    /// Field or method lookup on a type, through pointers, typedefs, the
    /// base-type redirect for derived kinds, and one level of embedded
    /// fields.
    fn member_of(&self, type_id: SymbolId, member_name: &str) -> SymbolId {
        if type_id.is_void() {
            return SymbolId::VOID;
        }
        let symbols = &self.store.symbols;
        let mut target = symbols.unwrap_typedef(symbols.deref_id(type_id));

        let kind = symbols.get_info(target).kind;
        if kind.is_container() {
            if let Some(base) = self.store.base_symbol_of(kind) {
                target = base;
            }
        }

        let target_info = symbols.get_info(target);
        if let Some((id, _)) = symbols.find_symbol_by_name(&target_info.children, member_name) {
            return id;
        }
        for &child in &target_info.children {
            let child_info = symbols.get_info(child);
            if child_info.kind != SymbolKind::EmbeddedField {
                continue;
            }
            let embedded = symbols.unwrap_typedef(symbols.deref_id(child_info.return_sym));
            if let Some((id, _)) =
                symbols.find_symbol_by_name(&symbols.get_info(embedded).children, member_name)
            {
                return id;
            }
        }
        SymbolId::VOID
    }

    fn infer_call_value(&mut self, node: Node<'_>) -> SymbolId {
        let Some(function) = node.child_by_field(Field::Function) else {
            return SymbolId::VOID;
        };
        let callee = self.infer_symbol_from_node(function);
        let info = self.store.symbols.get_info(callee);
        if info.kind == SymbolKind::Function {
            return info.return_sym;
        }
        // Calling a value of function type: a fn variable, field, or literal.
        let value_type = if info.kind.is_returnable() {
            info.return_sym
        } else {
            callee
        };
        let value_info = self.store.symbols.get_info(value_type);
        if value_info.kind == SymbolKind::FunctionType {
            value_info.return_sym
        } else {
            SymbolId::VOID
        }
    }

    fn infer_index_value(&mut self, node: Node<'_>) -> SymbolId {
        let Some(operand) = node.child_by_field(Field::Operand) else {
            return SymbolId::VOID;
        };
        let value = self.infer_value_type_from_node(operand);
        let symbols = &self.store.symbols;
        let target = symbols.unwrap_typedef(symbols.deref_id(value));
        let info = symbols.get_info(target);
        match info.kind {
            SymbolKind::Array => info.children.first().copied().unwrap_or(SymbolId::VOID),
            SymbolKind::Map => info.children.get(1).copied().unwrap_or(SymbolId::VOID),
            _ if info.name == "string" => self.builtin_type("u8"),
            _ => SymbolId::VOID,
        }
    }

    fn infer_unary_value(&mut self, node: Node<'_>) -> SymbolId {
        let operator = node
            .child_by_field(Field::Operator)
            .map(|n| n.text())
            .unwrap_or_default();
        let Some(operand) = node.child_by_field(Field::Operand) else {
            return SymbolId::VOID;
        };
        match operator {
            "&" => {
                let inner = self.infer_value_type_from_node(operand);
                if inner.is_void() || self.store.symbols.pointer_depth(inner) > 2 {
                    return SymbolId::VOID;
                }
                self.ref_type_of(inner)
            }
            "*" => {
                let inner = self.infer_value_type_from_node(operand);
                let info = self.store.symbols.get_info(inner);
                if info.kind.is_reference() {
                    info.parent
                } else {
                    SymbolId::VOID
                }
            }
            "!" => self.builtin_type("bool"),
            "-" | "~" => self.infer_value_type_from_node(operand),
            "<-" => {
                let inner = self.infer_value_type_from_node(operand);
                let info = self.store.symbols.get_info(inner);
                if info.kind == SymbolKind::Chan {
                    info.parent
                } else {
                    SymbolId::VOID
                }
            }
            _ => SymbolId::VOID,
        }
    }

    fn infer_binary_value(&mut self, node: Node<'_>) -> SymbolId {
        let operator = node
            .child_by_field(Field::Operator)
            .map(|n| n.text())
            .unwrap_or_default();
        let is_boolean = matches!(
            operator,
            "==" | "!=" | "<" | "<=" | ">" | ">=" | "&&" | "||" | "in" | "!in" | "is" | "!is"
        );
        if is_boolean {
            return self.builtin_type("bool");
        }
        node.child_by_field(Field::Left)
            .map(|left| self.infer_value_type_from_node(left))
            .unwrap_or(SymbolId::VOID)
    }

    /// Find or create the `&T` record for a type, next to the type itself.
    fn ref_type_of(&mut self, inner: SymbolId) -> SymbolId {
        let inner_info = self.store.symbols.get_info(inner);
        let name = format!("&{}", inner_info.name);
        let module_dir = {
            let dir = self.store.module_dir_of(inner_info.file_id);
            if dir.is_empty() {
                self.module_dir().to_string()
            } else {
                dir.to_string()
            }
        };
        if let Some(id) = self.store.symbols.find_in_module(&module_dir, &name) {
            return id;
        }
        let placeholder_path = format!("{module_dir}/placeholder.vv");
        let file_id = self.store.intern_file_path(&placeholder_path);
        let sym = Symbol::new(name, SymbolKind::Ref)
            .with_file(file_id, 0)
            .with_access(SymbolAccess::Public)
            .with_parent(inner)
            .top_level();
        self.store.register_symbol(sym).unwrap_or(SymbolId::VOID)
    }

    /// A returnable's declared type; anything else evaluates to itself.
    fn returnable_type(&self, id: SymbolId) -> SymbolId {
        let info = self.store.symbols.get_info(id);
        if info.kind.is_returnable() {
            info.return_sym
        } else {
            id
        }
    }

    fn builtin_type(&self, name: &str) -> SymbolId {
        self.find_symbol("", name).unwrap_or(SymbolId::VOID)
    }
}
