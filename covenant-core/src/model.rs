//! Contract model representation
//!
//! This module provides the core types describing one compiled unit of a
//! contracted program: the element tree (types, methods, variables), the
//! declarative clauses attached to those elements, and the synthesized
//! contract methods that the code generator later serializes.
//!
//! # Clause semantics
//!
//! ## Preconditions (`Requires`)
//! - Evaluated before the contracted method body runs
//! - Failures blame the caller
//! - Across an override chain, effective preconditions are OR-combined:
//!   an override may only *weaken* what it requires
//!
//! ## Postconditions (`Ensures`) and exceptional postconditions (`ThrowEnsures`)
//! - Evaluated after the contracted method completes (normally, or by
//!   raising, for `ThrowEnsures`)
//! - Failures blame the implementation
//! - Across an override chain they are AND-combined: an override may only
//!   *strengthen* what it guarantees
//!
//! ## Invariants
//! - Attached to a whole type; checked around every public operation
//! - The effective invariant of a type is the conjunction of every
//!   invariant declared anywhere in its ancestor chain
//!
//! Clause bodies are opaque boolean expression strings copied verbatim from
//! the declaration site; the model never parses or evaluates them.

use serde::{Deserialize, Serialize};

use crate::errors::{CovenantError, CovenantResult};

/// Primitive type names that take a `(t)0` default value in generated stubs.
const NUMERIC_TYPES: &[&str] = &["char", "byte", "short", "int", "long", "float", "double"];

/// A declared type name, as it appears in source
///
/// This is the erased, textual form used when emitting generated code; it
/// may carry generic arguments (`List<String>`), which [`TypeName::erasure`]
/// strips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeName(String);

impl TypeName {
    /// Create a type name from its declared textual form
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The declared name, verbatim
    pub fn declared_name(&self) -> &str {
        &self.0
    }

    /// Whether this is the void-equivalent return type
    pub fn is_void(&self) -> bool {
        self.0 == "void"
    }

    /// The erased form of this name (generic arguments stripped)
    pub fn erasure(&self) -> TypeName {
        match self.0.find('<') {
            Some(idx) => TypeName(self.0[..idx].trim_end().to_string()),
            None => self.clone(),
        }
    }

    /// A default value expression of this type, for generated stub bodies
    ///
    /// booleans default to `false`, numeric categories to a zero of that
    /// category, and everything else to a null-equivalent.
    pub fn default_value(&self) -> String {
        let name = self.declared_name();
        if name == "boolean" {
            "false".to_string()
        } else if NUMERIC_TYPES.contains(&name) {
            format!("({})0", name)
        } else {
            format!("({})null", name)
        }
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Element modifiers, ordered the way they are emitted
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Static,
    Final,
}

impl Modifier {
    /// Source keyword for this modifier
    pub fn keyword(&self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Abstract => "abstract",
            Modifier::Static => "static",
            Modifier::Final => "final",
        }
    }
}

/// Kinds of type declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Enum,
    Interface,
}

impl TypeKind {
    /// Source keyword introducing this kind of type
    pub fn keyword(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Enum => "enum",
            TypeKind::Interface => "interface",
        }
    }
}

/// Kinds of variable declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    /// An ordinary field
    Field,
    /// An enumeration constant, emitted with the enum header
    Constant,
}

/// The four recognized contract clause kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClauseKind {
    Invariant,
    Requires,
    Ensures,
    ThrowEnsures,
}

impl ClauseKind {
    /// Parse a raw metadata tag; unrecognized tags yield `None`
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Invariant" => Some(ClauseKind::Invariant),
            "Requires" => Some(ClauseKind::Requires),
            "Ensures" => Some(ClauseKind::Ensures),
            "ThrowEnsures" => Some(ClauseKind::ThrowEnsures),
            _ => None,
        }
    }

    /// Uppercase name used in generated metadata records
    pub fn metadata_name(&self) -> &'static str {
        match self {
            ClauseKind::Invariant => "INVARIANT",
            ClauseKind::Requires => "REQUIRES",
            ClauseKind::Ensures => "ENSURES",
            ClauseKind::ThrowEnsures => "THROW_ENSURES",
        }
    }

    /// Stem used when naming synthesized contract methods
    pub fn method_stem(&self) -> &'static str {
        match self {
            ClauseKind::Invariant => "invariant",
            ClauseKind::Requires => "requires",
            ClauseKind::Ensures => "ensures",
            ClauseKind::ThrowEnsures => "throwEnsures",
        }
    }

    /// Fully qualified error type raised by generated checks of this kind
    pub fn error_class(&self) -> &'static str {
        match self {
            ClauseKind::Invariant => "covenant.runtime.InvariantError",
            ClauseKind::Requires => "covenant.runtime.PreconditionError",
            ClauseKind::Ensures => "covenant.runtime.PostconditionError",
            ClauseKind::ThrowEnsures => "covenant.runtime.ThrowEnsuresError",
        }
    }
}

/// Originating source line of one clause sub-expression, when known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    /// 1-based line number in the declaring source file
    pub line: Option<u64>,
}

impl Provenance {
    /// A provenance record with a known line
    pub fn known(line: u64) -> Self {
        Self { line: Some(line) }
    }

    /// A provenance record for an unavailable location
    pub fn unknown() -> Self {
        Self { line: None }
    }

    /// Sentinel value emitted for unknown lines in metadata records
    pub fn sentinel(&self) -> i64 {
        match self.line {
            Some(line) => line as i64,
            None => -1,
        }
    }
}

/// One declarative clause attached to a program element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractClause {
    /// Kind of clause
    pub kind: ClauseKind,

    /// Declared directly on the element (`true`) or inherited (`false`)
    pub primary: bool,

    /// Whether this clause participates in override combination
    ///
    /// `false` for clauses on interfaces themselves, and for static,
    /// final or private members that cannot be overridden.
    pub is_virtual: bool,

    /// Name of the targeted method; empty when the clause scopes the
    /// whole type (invariants)
    pub target: String,

    /// Optional disambiguating id within (kind, target)
    pub id: Option<u32>,

    /// Raw boolean expression strings, copied verbatim
    pub expressions: Vec<String>,

    /// Parallel provenance records (one per expression), or empty when
    /// source locations were unavailable
    pub provenance: Vec<Provenance>,

    /// Erased return type of the targeted method, used to synthesize
    /// default-valued stubs; `None` for type-scoped clauses and
    /// constructors
    pub return_type: Option<TypeName>,
}

impl ContractClause {
    /// Expression/provenance pairs; provenance is `unknown` when the
    /// clause carries no records
    pub fn expressions_with_provenance(&self) -> impl Iterator<Item = (&str, Provenance)> {
        self.expressions.iter().enumerate().map(|(i, expr)| {
            let prov = self
                .provenance
                .get(i)
                .copied()
                .unwrap_or_else(Provenance::unknown);
            (expr.as_str(), prov)
        })
    }
}

/// Where a generated line came from, for diagnostics
///
/// Attached to exactly those generated lines that map 1:1 to a real clause
/// sub-expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseOrigin {
    /// Kind of the originating clause
    pub kind: ClauseKind,
    /// Target of the originating clause (empty for type scope)
    pub target: String,
    /// Originating source line, when known
    pub line: Option<u64>,
    /// The literal sub-expression text
    pub expression: String,
}

/// One line of a synthesized contract method body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyLine {
    /// The generated source text (without trailing newline)
    pub text: String,
    /// Set when this line maps 1:1 to a clause sub-expression
    pub origin: Option<ClauseOrigin>,
}

impl BodyLine {
    /// A plain generated line with no clause origin
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: None,
        }
    }

    /// A generated line originating from a clause sub-expression
    pub fn from_clause(text: impl Into<String>, origin: ClauseOrigin) -> Self {
        Self {
            text: text.into(),
            origin: Some(origin),
        }
    }
}

/// A synthesized contract method
///
/// One executable unit representing a clause group of a given
/// (kind, target, id) on a given type. No two contract methods within a
/// type may share an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractMethod {
    /// Role of this contract method
    pub kind: ClauseKind,

    /// Targeted method name, or empty for whole-type scope
    pub target: String,

    /// Disambiguating id within (kind, target)
    pub id: u32,

    /// Synthesized method name
    pub name: String,

    /// Modifiers for the emitted declaration
    pub modifiers: Vec<Modifier>,

    /// Return type of the emitted declaration
    pub return_type: TypeName,

    /// Parameters mirrored from the contracted method, when applicable
    pub parameters: Vec<VariableElement>,

    /// Generated check body, one entry per emitted line
    pub body: Vec<BodyLine>,

    /// Originating source lines for the metadata record (`None` entries
    /// are emitted as the `-1` sentinel)
    pub lines: Vec<Option<u64>>,

    /// Whether this is a helper-kind body (actual check code, eligible
    /// for debug tracing)
    pub helper: bool,

    /// Literal clause text for debug diagnostics
    pub clause_text: Option<String>,
}

impl ContractMethod {
    /// Identity triple; unique within the enclosing type
    pub fn identity(&self) -> (ClauseKind, &str, u32) {
        (self.kind, self.target.as_str(), self.id)
    }
}

/// A variable declaration (field, constant or parameter)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableElement {
    /// Simple name
    pub name: String,
    /// Field or enum constant
    pub kind: VariableKind,
    /// Declared type
    pub type_name: TypeName,
    /// Modifiers
    pub modifiers: Vec<Modifier>,
}

/// A method or constructor declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodElement {
    /// Simple name; constructors use the conventional `<init>` name
    pub name: String,
    /// Modifiers
    pub modifiers: Vec<Modifier>,
    /// Generic type parameters
    pub type_parameters: Vec<TypeName>,
    /// Declared return type; `None` for constructors
    pub return_type: Option<TypeName>,
    /// Formal parameters, in order
    pub parameters: Vec<VariableElement>,
    /// Declared thrown exception types
    pub exceptions: Vec<TypeName>,
    /// Whether this is a constructor
    pub is_constructor: bool,
}

impl MethodElement {
    /// Whether this method can participate in override dispatch
    pub fn is_overridable(&self) -> bool {
        !self.modifiers.contains(&Modifier::Static)
            && !self.modifiers.contains(&Modifier::Final)
            && !self.modifiers.contains(&Modifier::Private)
    }
}

/// A type declaration and everything it encloses
///
/// The root of a contract model is exactly one top-level type per compiled
/// unit; nested types hang off `enclosed`. The tree is acyclic and each
/// element is owned exclusively by its enclosing type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeElement {
    /// Simple name used in declarations
    pub simple_name: String,
    /// Fully qualified name, used for cross-unit contract lookup
    pub qualified_name: String,
    /// Class, enum or interface
    pub kind: TypeKind,
    /// Modifiers
    pub modifiers: Vec<Modifier>,
    /// Generic type parameters
    pub type_parameters: Vec<TypeName>,
    /// Declared superclass, if any
    pub superclass: Option<TypeName>,
    /// Qualified name of the superclass, for ancestor-chain walking
    pub super_qualified: Option<String>,
    /// Argument types of the superclass constructor that generated stubs
    /// must forward to
    pub super_arguments: Vec<TypeName>,
    /// Implemented (or, for interfaces, extended) interfaces
    pub interfaces: Vec<TypeName>,
    /// Import names visible at the declaration site; clause text is
    /// copied verbatim and must resolve under the same names
    pub imports: Vec<String>,
    /// Clauses attached to this type or its methods
    pub clauses: Vec<ContractClause>,
    /// Enclosed elements, in declaration order
    pub enclosed: Vec<Element>,
}

impl TypeElement {
    /// Create an empty type element
    pub fn new(
        simple_name: impl Into<String>,
        qualified_name: impl Into<String>,
        kind: TypeKind,
    ) -> Self {
        Self {
            simple_name: simple_name.into(),
            qualified_name: qualified_name.into(),
            kind,
            modifiers: Vec::new(),
            type_parameters: Vec::new(),
            superclass: None,
            super_qualified: None,
            super_arguments: Vec::new(),
            interfaces: Vec::new(),
            imports: Vec::new(),
            clauses: Vec::new(),
            enclosed: Vec::new(),
        }
    }

    /// Package portion of the qualified name, or empty for the default
    /// package
    pub fn package_name(&self) -> &str {
        match self.qualified_name.rfind('.') {
            Some(idx) => &self.qualified_name[..idx],
            None => "",
        }
    }

    /// Declared methods, in order
    pub fn methods(&self) -> impl Iterator<Item = &MethodElement> {
        self.enclosed.iter().filter_map(|e| match e {
            Element::Method(m) => Some(m),
            _ => None,
        })
    }

    /// Look up a declared method by simple name
    pub fn find_method(&self, name: &str) -> Option<&MethodElement> {
        self.methods().find(|m| m.name == name)
    }

    /// Synthesized contract methods, in order
    pub fn contract_methods(&self) -> impl Iterator<Item = &ContractMethod> {
        self.enclosed.iter().filter_map(|e| match e {
            Element::Contract(c) => Some(c),
            _ => None,
        })
    }

    /// Enum constants, in declaration order
    pub fn constants(&self) -> impl Iterator<Item = &VariableElement> {
        self.enclosed.iter().filter_map(|e| match e {
            Element::Variable(v) if v.kind == VariableKind::Constant => Some(v),
            _ => None,
        })
    }

    /// Next free contract-method id for the given (kind, target)
    pub fn next_contract_id(&self, kind: ClauseKind, target: &str) -> u32 {
        self.contract_methods()
            .filter(|c| c.kind == kind && c.target == target)
            .map(|c| c.id + 1)
            .max()
            .unwrap_or(0)
    }

    /// Append an enclosed element
    pub fn add_element(&mut self, element: Element) {
        self.enclosed.push(element);
    }

    /// Verify that synthesized contract-method identities are pairwise
    /// unique, recursing into nested types
    pub fn validate_identities(&self) -> CovenantResult<()> {
        let mut seen = Vec::new();
        for element in &self.enclosed {
            match element {
                Element::Contract(c) => {
                    let identity = c.identity();
                    if seen.contains(&identity) {
                        return Err(CovenantError::DuplicateIdentity {
                            type_name: self.qualified_name.clone(),
                            kind: c.kind,
                            target: c.target.clone(),
                            id: c.id,
                        });
                    }
                    seen.push(identity);
                }
                Element::Type(nested) => nested.validate_identities()?,
                _ => {}
            }
        }
        Ok(())
    }
}

/// A program element, as a closed set of tagged variants
///
/// Traversals pattern-match exhaustively over this enum instead of
/// dispatching through visitor objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element {
    Type(TypeElement),
    Method(MethodElement),
    Variable(VariableElement),
    Contract(ContractMethod),
}

/// Backslash-quotes a string for inclusion in generated source code
pub fn quote_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
