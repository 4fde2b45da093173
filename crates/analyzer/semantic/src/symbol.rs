//! Symbol records and their capability predicates.
//!
//! A [`Symbol`] is one semantic entity: a type, function, field, or local
//! binding. Symbols reference each other only through [`SymbolId`]s; the
//! arena in [`crate::symbols::SymbolManager`] owns the actual records.
//!
//! Three fields are role-overloaded, which keeps the record flat:
//!
//! - `parent`: original type of a typedef, receiver type of a method, or
//!   inner type of `&T` / `?T` / `!T` / `chan T`.
//! - `return_sym`: return type of a function, declared type of a variable
//!   or field.
//! - `children`: type parameters of container types, parameters of a
//!   function, fields and methods of a struct or interface, variants of an
//!   enum, members of a multi-return.

use std::fmt;

use bitflags::bitflags;
use itertools::Itertools;
use vls_analyzer_syntax::Range;

use crate::store::FileId;

index_vec::define_index_type! {
    /// Index of a symbol in the store-wide arena.
    pub struct SymbolId = u32;

    MAX_INDEX = (u32::MAX - 1) as usize;
    DEBUG_FORMAT = "sym{}";
}

impl SymbolId {
    /// Sentinel standing in for "no symbol" / the `void` type.
    pub const VOID: Self = Self::from_raw_unchecked(u32::MAX);

    pub fn is_void(self) -> bool {
        self == Self::VOID
    }
}

/// Every kind of semantic entity the analyzer tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Void,
    Placeholder,
    Ref,
    Array,
    Map,
    MultiReturn,
    Optional,
    Result,
    Chan,
    Variadic,
    Function,
    Struct,
    Enum,
    Typedef,
    Interface,
    Field,
    EmbeddedField,
    Variable,
    Sumtype,
    FunctionType,
    Never,
}

impl SymbolKind {
    /// Kinds whose `return_sym` denotes the symbol's type.
    pub const fn is_returnable(self) -> bool {
        matches!(self, Self::Variable | Self::Field | Self::Function)
    }

    /// Kinds that introduce a type name.
    pub const fn is_type_defining(self) -> bool {
        matches!(
            self,
            Self::Struct
                | Self::Enum
                | Self::Interface
                | Self::Typedef
                | Self::Sumtype
                | Self::FunctionType
        )
    }

    /// Derived container kinds whose identity is structural, not nominal.
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Self::Ref
                | Self::Array
                | Self::Map
                | Self::MultiReturn
                | Self::Optional
                | Self::Result
                | Self::Chan
                | Self::Variadic
        )
    }

    pub const fn is_reference(self) -> bool {
        matches!(self, Self::Ref)
    }

    /// Kinds that never resolve anything: the sentinel and `never`.
    pub const fn is_void_like(self) -> bool {
        matches!(self, Self::Void | Self::Never)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Placeholder => "placeholder",
            Self::Ref => "ref",
            Self::Array => "array",
            Self::Map => "map",
            Self::MultiReturn => "multi_return",
            Self::Optional => "optional",
            Self::Result => "result",
            Self::Chan => "chan",
            Self::Variadic => "variadic",
            Self::Function => "function",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Typedef => "typedef",
            Self::Interface => "interface",
            Self::Field => "field",
            Self::EmbeddedField => "embedded_field",
            Self::Variable => "variable",
            Self::Sumtype => "sumtype",
            Self::FunctionType => "function_type",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of a symbol within its module.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolAccess {
    #[default]
    Private,
    PrivateMutable,
    Public,
    PublicMutable,
    Global,
}

impl fmt::Display for SymbolAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => Ok(()),
            Self::PrivateMutable => write!(f, "mut "),
            Self::Public => write!(f, "pub "),
            Self::PublicMutable => write!(f, "pub mut "),
            Self::Global => write!(f, "__global "),
        }
    }
}

/// Which language a symbol belongs to; `C` and `JS` mark binded interop
/// symbols.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolLanguage {
    #[default]
    V,
    C,
    Js,
}

impl fmt::Display for SymbolLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V => write!(f, "v"),
            Self::C => write!(f, "c"),
            Self::Js => write!(f, "js"),
        }
    }
}

bitflags! {
    /// Property bits preserved across module-symbol updates.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SymbolFlags: u8 {
        /// Declared at the top level of a file, not inside a scope.
        const TOP_LEVEL = 1 << 0;
        /// A `const` binding.
        const CONST = 1 << 1;
    }
}

/// One semantic entity. See the module docs for the role overloading of
/// `parent`, `return_sym`, and `children`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub access: SymbolAccess,
    pub range: Range,
    pub language: SymbolLanguage,
    pub flags: SymbolFlags,
    /// Number of generic placeholders declared on the symbol (`[T, U]`).
    pub generic_placeholder_len: usize,
    /// Number of members the interface itself declares, before embedding.
    pub interface_children_len: usize,
    pub file_id: FileId,
    /// Edit generation of the declaring file. `-1` marks bootstrap symbols
    /// that any real declaration may replace.
    pub file_version: i64,
    /// Owning scope for locals; `ScopeId::DETACHED` for top-level symbols.
    pub scope: crate::scope::ScopeId,
    pub docstrings: Vec<String>,
    pub parent: SymbolId,
    pub return_sym: SymbolId,
    pub children: Vec<SymbolId>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            id: SymbolId::VOID,
            name: name.into(),
            kind,
            access: SymbolAccess::Private,
            range: Range::default(),
            language: SymbolLanguage::V,
            flags: SymbolFlags::empty(),
            generic_placeholder_len: 0,
            interface_children_len: 0,
            file_id: FileId::from_raw(0),
            file_version: 0,
            scope: crate::scope::ScopeId::DETACHED,
            docstrings: Vec::new(),
            parent: SymbolId::VOID,
            return_sym: SymbolId::VOID,
            children: Vec::new(),
        }
    }

    /// The record behind the `SymbolId::VOID` sentinel.
    pub fn void() -> Self {
        Self::new("void", SymbolKind::Void)
    }

    pub fn with_access(mut self, access: SymbolAccess) -> Self {
        self.access = access;
        self
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }

    pub fn with_file(mut self, file_id: FileId, file_version: i64) -> Self {
        self.file_id = file_id;
        self.file_version = file_version;
        self
    }

    pub fn with_language(mut self, language: SymbolLanguage) -> Self {
        self.language = language;
        self
    }

    pub fn with_parent(mut self, parent: SymbolId) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_return(mut self, return_sym: SymbolId) -> Self {
        self.return_sym = return_sym;
        self
    }

    pub fn with_children(mut self, children: Vec<SymbolId>) -> Self {
        self.children = children;
        self
    }

    pub fn top_level(mut self) -> Self {
        self.flags |= SymbolFlags::TOP_LEVEL;
        self
    }

    pub fn constant(mut self) -> Self {
        self.flags |= SymbolFlags::CONST;
        self
    }

    pub fn is_top_level(&self) -> bool {
        self.flags.contains(SymbolFlags::TOP_LEVEL)
    }

    pub fn is_const(&self) -> bool {
        self.flags.contains(SymbolFlags::CONST)
    }

    /// For `&T`, the pointee id; otherwise the symbol's own id.
    pub fn deref(&self) -> SymbolId {
        if self.kind.is_reference() {
            self.parent
        } else {
            self.id
        }
    }

    /// One-line form shown by hover and completion surfaces.
    pub fn signature(&self, info: &impl InfoSource) -> String {
        match self.kind {
            SymbolKind::Function => {
                let params = self
                    .children
                    .iter()
                    .map(|&child| {
                        let param = info.get_info(child);
                        format!("{} {}", param.name, info.symbol_name(param.return_sym))
                    })
                    .join(", ");
                let mut out = format!("fn {}({})", self.name, params);
                if !self.return_sym.is_void() {
                    out.push(' ');
                    out.push_str(info.symbol_name(self.return_sym));
                }
                out
            }
            SymbolKind::FunctionType => {
                let params = self
                    .children
                    .iter()
                    .map(|&child| info.symbol_name(info.get_info(child).return_sym).to_string())
                    .join(", ");
                let mut out = format!("fn ({})", params);
                if !self.return_sym.is_void() {
                    out.push(' ');
                    out.push_str(info.symbol_name(self.return_sym));
                }
                out
            }
            SymbolKind::Variable | SymbolKind::Field | SymbolKind::EmbeddedField => {
                if self.return_sym.is_void() {
                    format!("{}{}", self.access, self.name)
                } else {
                    format!(
                        "{}{} {}",
                        self.access,
                        self.name,
                        info.symbol_name(self.return_sym)
                    )
                }
            }
            SymbolKind::Struct => format!("struct {}", self.name),
            SymbolKind::Enum => format!("enum {}", self.name),
            SymbolKind::Interface => format!("interface {}", self.name),
            SymbolKind::Typedef => {
                format!("type {} = {}", self.name, info.symbol_name(self.parent))
            }
            SymbolKind::Sumtype => {
                let variants = self
                    .children
                    .iter()
                    .map(|&child| info.symbol_name(child).to_string())
                    .join(" | ");
                format!("type {} = {}", self.name, variants)
            }
            _ => self.name.clone(),
        }
    }

    /// Compact form used in logs and test assertions.
    pub fn debug_str(&self, info: &impl InfoSource) -> String {
        let mut out = format!("{} ({})", self.name, self.kind);
        if self.kind.is_returnable() && !self.return_sym.is_void() {
            out.push_str(" -> ");
            out.push_str(info.symbol_name(self.return_sym));
        }
        out
    }
}

/// The capability set display and debug helpers need. [`crate::symbols::SymbolManager`]
/// is the canonical implementation; tests can provide fakes.
pub trait InfoSource {
    fn get_info(&self, id: SymbolId) -> &Symbol;

    fn get_infos(&self, ids: &[SymbolId]) -> Vec<&Symbol> {
        ids.iter().map(|&id| self.get_info(id)).collect()
    }

    /// Scan an id list for a name, skipping invalid ids.
    fn find_symbol_by_name(&self, ids: &[SymbolId], name: &str) -> Option<(SymbolId, usize)> {
        ids.iter().enumerate().find_map(|(index, &id)| {
            let sym = self.get_info(id);
            (sym.kind != SymbolKind::Void && sym.name == name).then_some((id, index))
        })
    }

    fn symbol_name(&self, id: SymbolId) -> &str {
        &self.get_info(id).name
    }

    fn symbol_range(&self, id: SymbolId) -> Range {
        self.get_info(id).range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Arena-less [`InfoSource`] backed by a plain vector.
    struct FakeSource {
        symbols: Vec<Symbol>,
        void: Symbol,
    }

    impl FakeSource {
        fn new(symbols: Vec<Symbol>) -> Self {
            Self {
                symbols,
                void: Symbol::void(),
            }
        }
    }

    impl InfoSource for FakeSource {
        fn get_info(&self, id: SymbolId) -> &Symbol {
            if id.is_void() {
                return &self.void;
            }
            self.symbols.get(id.index()).unwrap_or(&self.void)
        }
    }

    fn sym(id: usize, name: &str, kind: SymbolKind) -> Symbol {
        let mut sym = Symbol::new(name, kind);
        sym.id = SymbolId::new(id);
        sym
    }

    #[test]
    fn kind_predicates() {
        assert!(SymbolKind::Variable.is_returnable());
        assert!(SymbolKind::Function.is_returnable());
        assert!(!SymbolKind::Struct.is_returnable());

        assert!(SymbolKind::Optional.is_container());
        assert!(SymbolKind::Variadic.is_container());
        assert!(!SymbolKind::Struct.is_container());

        assert!(SymbolKind::Never.is_void_like());
        assert!(!SymbolKind::Placeholder.is_void_like());
    }

    #[test]
    fn deref_returns_pointee() {
        let int = sym(0, "int", SymbolKind::Struct);
        let mut ptr = sym(1, "&int", SymbolKind::Ref);
        ptr.parent = int.id;

        assert_eq!(ptr.deref(), int.id);
        assert_eq!(int.deref(), int.id);
    }

    #[test]
    fn function_signature_lists_params_and_return() {
        let int = sym(0, "int", SymbolKind::Struct);
        let mut a = sym(1, "a", SymbolKind::Variable);
        a.return_sym = int.id;
        let mut b = sym(2, "b", SymbolKind::Variable);
        b.return_sym = int.id;
        let mut add = sym(3, "add", SymbolKind::Function);
        add.children = vec![a.id, b.id];
        add.return_sym = int.id;

        let source = FakeSource::new(vec![int, a, b, add.clone()]);
        insta::assert_snapshot!(add.signature(&source), @"fn add(a int, b int) int");
    }

    #[test]
    fn field_signature_includes_access() {
        let string = sym(0, "string", SymbolKind::Struct);
        let mut field = sym(1, "name", SymbolKind::Field);
        field.return_sym = string.id;
        field.access = SymbolAccess::PublicMutable;

        let source = FakeSource::new(vec![string, field.clone()]);
        insta::assert_snapshot!(field.signature(&source), @"pub mut name string");
    }

    #[test]
    fn find_symbol_by_name_skips_invalid_ids() {
        let a = sym(0, "a", SymbolKind::Variable);
        let b = sym(1, "b", SymbolKind::Variable);
        let source = FakeSource::new(vec![a, b]);

        let ids = [SymbolId::VOID, SymbolId::new(1)];
        let (found, index) = source.find_symbol_by_name(&ids, "b").unwrap();
        assert_eq!(found, SymbolId::new(1));
        assert_eq!(index, 1);
        assert!(source.find_symbol_by_name(&ids, "a").is_none());
    }
}
