//! Arena-backed syntax trees and cursors.
//!
//! Nodes are stored flat in an [`IndexVec`]; a [`Node`] is a copyable cursor
//! pairing the tree with a node id. The tag and field sets are closed enums,
//! so the semantic walker dispatches with exhaustive matches instead of
//! string comparisons.

use std::fmt;

use index_vec::IndexVec;

use crate::source::{Range, SourceText};

index_vec::define_index_type! {
    /// Index of a node within its tree's arena.
    pub struct NodeId = u32;

    MAX_INDEX = (u32::MAX - 1) as usize;
    DEBUG_FORMAT = "node{}";
}

/// The closed set of syntax node tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // File structure and declarations
    SourceFile,
    ModuleClause,
    ImportDeclaration,
    ImportPath,
    ConstDeclaration,
    ConstSpec,
    GlobalVarDeclaration,
    GlobalVarSpec,
    FunctionDeclaration,
    Receiver,
    ParameterList,
    ParameterDeclaration,
    InterfaceDeclaration,
    EnumDeclaration,
    TypeDeclaration,
    StructDeclaration,
    Block,

    // Type nodes
    PointerType,
    ArrayType,
    FixedArrayType,
    MapType,
    ChannelType,
    OptionType,
    ResultType,
    VariadicType,
    MultiReturnType,
    GenericType,
    FunctionType,
    QualifiedType,
    TypeIdentifier,

    // Expressions
    Identifier,
    SelectorExpression,
    CallExpression,
    ArgumentList,
    IndexExpression,
    SliceExpression,
    UnaryExpression,
    BinaryExpression,
    ParenthesizedExpression,
    FnLiteral,
    TypeInitializer,
    OptionPropagation,
    ResultPropagation,
    IntLiteral,
    FloatLiteral,
    RuneLiteral,
    InterpretedStringLiteral,
    RawStringLiteral,
    CStringLiteral,
    True,
    False,
    NoneLiteral,

    // Operator and punctuation tokens kept as plain nodes
    Operator,
}

impl NodeKind {
    /// The tree-sitter-style tag string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SourceFile => "source_file",
            Self::ModuleClause => "module_clause",
            Self::ImportDeclaration => "import_declaration",
            Self::ImportPath => "import_path",
            Self::ConstDeclaration => "const_declaration",
            Self::ConstSpec => "const_spec",
            Self::GlobalVarDeclaration => "global_var_declaration",
            Self::GlobalVarSpec => "global_var_spec",
            Self::FunctionDeclaration => "function_declaration",
            Self::Receiver => "receiver",
            Self::ParameterList => "parameter_list",
            Self::ParameterDeclaration => "parameter_declaration",
            Self::InterfaceDeclaration => "interface_declaration",
            Self::EnumDeclaration => "enum_declaration",
            Self::TypeDeclaration => "type_declaration",
            Self::StructDeclaration => "struct_declaration",
            Self::Block => "block",
            Self::PointerType => "pointer_type",
            Self::ArrayType => "array_type",
            Self::FixedArrayType => "fixed_array_type",
            Self::MapType => "map_type",
            Self::ChannelType => "channel_type",
            Self::OptionType => "option_type",
            Self::ResultType => "result_type",
            Self::VariadicType => "variadic_type",
            Self::MultiReturnType => "multi_return_type",
            Self::GenericType => "generic_type",
            Self::FunctionType => "function_type",
            Self::QualifiedType => "qualified_type",
            Self::TypeIdentifier => "type_identifier",
            Self::Identifier => "identifier",
            Self::SelectorExpression => "selector_expression",
            Self::CallExpression => "call_expression",
            Self::ArgumentList => "argument_list",
            Self::IndexExpression => "index_expression",
            Self::SliceExpression => "slice_expression",
            Self::UnaryExpression => "unary_expression",
            Self::BinaryExpression => "binary_expression",
            Self::ParenthesizedExpression => "parenthesized_expression",
            Self::FnLiteral => "fn_literal",
            Self::TypeInitializer => "type_initializer",
            Self::OptionPropagation => "option_propagation",
            Self::ResultPropagation => "result_propagation",
            Self::IntLiteral => "int_literal",
            Self::FloatLiteral => "float_literal",
            Self::RuneLiteral => "rune_literal",
            Self::InterpretedStringLiteral => "interpreted_string_literal",
            Self::RawStringLiteral => "raw_string_literal",
            Self::CStringLiteral => "c_string_literal",
            Self::True => "true",
            Self::False => "false",
            Self::NoneLiteral => "none",
            Self::Operator => "operator",
        }
    }

    /// Whether this tag names a type expression.
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            Self::PointerType
                | Self::ArrayType
                | Self::FixedArrayType
                | Self::MapType
                | Self::ChannelType
                | Self::OptionType
                | Self::ResultType
                | Self::VariadicType
                | Self::MultiReturnType
                | Self::GenericType
                | Self::FunctionType
                | Self::QualifiedType
                | Self::TypeIdentifier
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field tags a node can attach to its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Type,
    Result,
    Receiver,
    Function,
    Parameters,
    Arguments,
    Element,
    Key,
    Value,
    Operand,
    Operator,
    Left,
    Right,
    Limit,
    FieldName,
    Module,
    Path,
    Body,
}

impl Field {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Type => "type",
            Self::Result => "result",
            Self::Receiver => "receiver",
            Self::Function => "function",
            Self::Parameters => "parameters",
            Self::Arguments => "arguments",
            Self::Element => "element",
            Self::Key => "key",
            Self::Value => "value",
            Self::Operand => "operand",
            Self::Operator => "operator",
            Self::Left => "left",
            Self::Right => "right",
            Self::Limit => "limit",
            Self::FieldName => "field",
            Self::Module => "module",
            Self::Path => "path",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    range: Range,
    field: Option<Field>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An immutable syntax tree plus its source text.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: SourceText,
    nodes: IndexVec<NodeId, NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    pub fn root(&self) -> Node<'_> {
        Node {
            tree: self,
            id: self.root,
        }
    }

    pub fn source(&self) -> &SourceText {
        &self.source
    }

    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { tree: self, id }
    }
}

/// A cursor into a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    tree: &'tree SyntaxTree,
    id: NodeId,
}

impl<'tree> Node<'tree> {
    fn data(&self) -> &'tree NodeData {
        &self.tree.nodes[self.id]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'tree SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    pub fn range(&self) -> Range {
        self.data().range
    }

    pub fn start_byte(&self) -> usize {
        self.data().range.start_byte
    }

    pub fn end_byte(&self) -> usize {
        self.data().range.end_byte
    }

    pub fn parent(&self) -> Option<Node<'tree>> {
        self.data().parent.map(|id| self.tree.node(id))
    }

    pub fn named_child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'tree>> {
        self.data()
            .children
            .get(index)
            .map(|&id| self.tree.node(id))
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'tree>> + '_ {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| tree.node(id))
    }

    /// The first child carrying the given field tag.
    pub fn child_by_field(&self, field: Field) -> Option<Node<'tree>> {
        self.children().find(|child| child.data().field == Some(field))
    }

    /// The source text this node spans.
    pub fn text(&self) -> &'tree str {
        let range = self.data().range;
        self.tree.source.slice(range.start_byte, range.end_byte)
    }

    pub fn is_root(&self) -> bool {
        self.id == self.tree.root
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {})", self.kind(), self.range())
    }
}

/// Incremental tree construction, shared by the parser adapter and tests.
#[derive(Debug)]
pub struct TreeBuilder {
    source: SourceText,
    nodes: IndexVec<NodeId, NodeData>,
    root: Option<NodeId>,
}

impl TreeBuilder {
    pub fn new(source: SourceText) -> Self {
        Self {
            source,
            nodes: IndexVec::new(),
            root: None,
        }
    }

    /// Create the root node spanning the whole source. Must be called once,
    /// before any `push`.
    pub fn root(&mut self, kind: NodeKind) -> NodeId {
        debug_assert!(self.root.is_none(), "tree already has a root");
        let range = self.source.range_between(0, self.source.len());
        let id = self.nodes.push(NodeData {
            kind,
            range,
            field: None,
            parent: None,
            children: Vec::new(),
        });
        self.root = Some(id);
        id
    }

    /// Append a child node covering the given byte range.
    pub fn push(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        start_byte: usize,
        end_byte: usize,
    ) -> NodeId {
        self.push_node(parent, None, kind, start_byte, end_byte)
    }

    /// Append a child node attached to a field of its parent.
    pub fn push_field(
        &mut self,
        parent: NodeId,
        field: Field,
        kind: NodeKind,
        start_byte: usize,
        end_byte: usize,
    ) -> NodeId {
        self.push_node(parent, Some(field), kind, start_byte, end_byte)
    }

    fn push_node(
        &mut self,
        parent: NodeId,
        field: Option<Field>,
        kind: NodeKind,
        start_byte: usize,
        end_byte: usize,
    ) -> NodeId {
        let range = self.source.range_between(start_byte, end_byte);
        let id = self.nodes.push(NodeData {
            kind,
            range,
            field,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn build(mut self) -> SyntaxTree {
        let root = match self.root {
            Some(root) => root,
            None => {
                let range = self.source.range_between(0, self.source.len());
                self.nodes.push(NodeData {
                    kind: NodeKind::SourceFile,
                    range,
                    field: None,
                    parent: None,
                    children: Vec::new(),
                })
            }
        };
        SyntaxTree {
            source: self.source,
            nodes: self.nodes,
            root,
        }
    }
}
