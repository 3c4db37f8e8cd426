//! Code synthesizer
//!
//! Serializes a contract model into a compilable source unit, one per root
//! type, plus a mapping from generated line numbers back to clause
//! provenance. Nested types are written recursively through one shared
//! emission context so line numbers stay consistent for the whole file.
//!
//! The generated unit contains structurally valid stubs only: real method
//! bodies come from the original compiled unit at merge time. Synthesized
//! contract methods carry their full check bodies, preceded by a metadata
//! record that identifies them to the post-compile instrumentation step.

use rustc_hash::FxHashMap;
use tracing::debug;

use covenant_core::model::{
    quote_string, ClauseOrigin, ContractMethod, Element, MethodElement, Modifier, Provenance,
    TypeElement, TypeKind, TypeName, VariableElement, VariableKind,
};

/// Annotation name of the generated contract-method metadata record
pub const CONTRACT_METHOD_SIGNATURE: &str = "covenant.agent.ContractMethodSignature";

/// Qualified enum referenced by the metadata record's `kind` field
pub const CLAUSE_KIND_ENUM: &str = "covenant.model.ClauseKind";

/// A synthesized source unit and its diagnostic line map
#[derive(Debug, Clone, Default)]
pub struct SynthesizedUnit {
    /// Generated source text
    pub source: String,
    /// Generated line number (1-based) to originating clause
    /// sub-expression; populated only for lines that map 1:1 to a real
    /// sub-expression
    pub line_map: FxHashMap<u64, ClauseOrigin>,
}

impl SynthesizedUnit {
    /// The clause origin of a generated line, if any
    pub fn origin_at(&self, line: u64) -> Option<&ClauseOrigin> {
        self.line_map.get(&line)
    }

    /// Format an error message with the originating source location
    pub fn format_error(&self, line: u64, message: &str) -> String {
        match self.origin_at(line).and_then(|origin| origin.line) {
            Some(source_line) => format!("line {}: {}", source_line, message),
            None => message.to_string(),
        }
    }
}

/// Shared emission context: output buffer, monotonically increasing line
/// counter and the line-to-provenance map
///
/// One context is threaded by mutable reference through the recursive
/// writer, so nested types extend the same buffer and numbering.
struct Emitter {
    buf: String,
    line: u64,
    map: FxHashMap<u64, ClauseOrigin>,
}

impl Emitter {
    fn new() -> Self {
        Self {
            buf: String::new(),
            line: 1,
            map: FxHashMap::default(),
        }
    }

    fn push(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    fn end_line(&mut self) {
        self.buf.push('\n');
        self.line += 1;
    }

    fn end_line_with(&mut self, origin: ClauseOrigin) {
        self.map.insert(self.line, origin);
        self.end_line();
    }

    fn push_join<'x>(&mut self, items: impl IntoIterator<Item = &'x str>, separator: &str) {
        let mut first = true;
        for item in items {
            if !first {
                self.push(separator);
            }
            self.push(item);
            first = false;
        }
    }
}

/// Declaration data shared by ordinary and contract methods
struct MethodSig<'a> {
    modifiers: &'a [Modifier],
    type_parameters: &'a [TypeName],
    return_type: Option<&'a TypeName>,
    name: &'a str,
    parameters: &'a [VariableElement],
    exceptions: &'a [TypeName],
    is_constructor: bool,
}

/// Writes a contract model as compilable source text
#[derive(Debug, Clone, Copy, Default)]
pub struct Synthesizer {
    debug_trace: bool,
}

impl Synthesizer {
    /// Create a synthesizer without debug tracing
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable interleaved diagnostic trace calls
    pub fn with_debug_trace(mut self, debug_trace: bool) -> Self {
        self.debug_trace = debug_trace;
        self
    }

    /// Serialize one root type into a source unit
    pub fn synthesize(&self, root: &TypeElement) -> SynthesizedUnit {
        let mut em = Emitter::new();
        self.write_type(&mut em, root, true);
        debug!(
            type_name = %root.qualified_name,
            lines = em.line - 1,
            mapped = em.map.len(),
            "synthesized contract unit"
        );
        SynthesizedUnit {
            source: em.buf,
            line_map: em.map,
        }
    }

    fn write_type(&self, em: &mut Emitter, ty: &TypeElement, is_root: bool) {
        if is_root {
            self.write_package(em, ty);
            self.write_imports(em, ty);
        }

        em.push("@SuppressWarnings(\"unchecked\")");
        em.end_line();

        self.write_modifiers(em, ty, &ty.modifiers);
        em.push(ty.kind.keyword());
        em.push(" ");
        em.push(&ty.simple_name);
        self.write_generic_signature(em, &ty.type_parameters);

        if ty.kind != TypeKind::Enum {
            if let Some(superclass) = &ty.superclass {
                em.push(" extends ");
                em.push(superclass.declared_name());
            }
        }

        if !ty.interfaces.is_empty() {
            em.push(if ty.kind == TypeKind::Interface {
                " extends "
            } else {
                " implements "
            });
            em.push_join(ty.interfaces.iter().map(TypeName::declared_name), ", ");
        }

        em.push(" {");
        em.end_line();

        if ty.kind == TypeKind::Enum {
            self.write_enum_header(em, ty);
        }

        for element in &ty.enclosed {
            match element {
                Element::Type(nested) => self.write_type(em, nested, false),
                Element::Method(method) => {
                    // Enum constructors are handled with the enum header.
                    if ty.kind == TypeKind::Enum && method.is_constructor {
                        continue;
                    }
                    self.write_method(em, ty, method);
                }
                Element::Variable(variable) => {
                    if variable.kind == VariableKind::Constant {
                        continue;
                    }
                    self.write_variable(em, variable);
                }
                Element::Contract(contract) => self.write_contract(em, ty, contract),
            }
        }

        em.push("}");
        em.end_line();
    }

    /// Enum constants on one line, then a private no-argument constructor
    /// stub; real constant arguments and constructor bodies come from the
    /// original compiled unit at merge time
    fn write_enum_header(&self, em: &mut Emitter, ty: &TypeElement) {
        let constants: Vec<&str> = ty.constants().map(|c| c.name.as_str()).collect();
        if !constants.is_empty() {
            em.push_join(constants, ", ");
            em.push(";");
            em.end_line();
        }
        em.push("private ");
        em.push(&ty.simple_name);
        em.push("() {");
        em.end_line();
        em.push("}");
        em.end_line();
    }

    fn write_package(&self, em: &mut Emitter, ty: &TypeElement) {
        let package = ty.package_name();
        if !package.is_empty() {
            em.push("package ");
            em.push(package);
            em.push(";");
            em.end_line();
        }
    }

    fn write_imports(&self, em: &mut Emitter, ty: &TypeElement) {
        for import in &ty.imports {
            em.push("import ");
            em.push(import);
            em.push(";");
            em.end_line();
        }
    }

    /// Sorted modifiers followed by one space; interfaces drop `abstract`
    fn write_modifiers(&self, em: &mut Emitter, ty: &TypeElement, modifiers: &[Modifier]) {
        let mut modifiers: Vec<Modifier> = modifiers.to_vec();
        if ty.kind == TypeKind::Interface {
            modifiers.retain(|m| *m != Modifier::Abstract);
        }
        modifiers.sort();
        modifiers.dedup();
        if !modifiers.is_empty() {
            em.push_join(modifiers.iter().map(Modifier::keyword), " ");
            em.push(" ");
        }
    }

    fn write_generic_signature(&self, em: &mut Emitter, signature: &[TypeName]) {
        if !signature.is_empty() {
            em.push("<");
            em.push_join(signature.iter().map(TypeName::declared_name), ", ");
            em.push(">");
        }
    }

    fn write_variable_declaration(&self, em: &mut Emitter, ty: &TypeElement, variable: &VariableElement) {
        self.write_modifiers(em, ty, &variable.modifiers);
        em.push(variable.type_name.declared_name());
        em.push(" ");
        em.push(&variable.name);
    }

    fn write_variable(&self, em: &mut Emitter, variable: &VariableElement) {
        let mut modifiers: Vec<Modifier> = variable.modifiers.clone();
        modifiers.sort();
        if !modifiers.is_empty() {
            em.push_join(modifiers.iter().map(Modifier::keyword), " ");
            em.push(" ");
        }
        em.push(variable.type_name.declared_name());
        em.push(" ");
        em.push(&variable.name);
        // Immutable fields must be definitely assigned in the stub unit.
        if variable.modifiers.contains(&Modifier::Final) {
            em.push(" = ");
            em.push(&variable.type_name.default_value());
        }
        em.push(";");
        em.end_line();
    }

    fn write_method_header(&self, em: &mut Emitter, ty: &TypeElement, sig: &MethodSig<'_>) {
        self.write_modifiers(em, ty, sig.modifiers);
        self.write_generic_signature(em, sig.type_parameters);

        if sig.is_constructor {
            em.push(&ty.simple_name);
        } else {
            let return_name = sig
                .return_type
                .map(TypeName::declared_name)
                .unwrap_or("void");
            em.push(return_name);
            em.push(" ");
            em.push(sig.name);
        }

        em.push("(");
        let mut first = true;
        for parameter in sig.parameters {
            if !first {
                em.push(", ");
            }
            self.write_variable_declaration(em, ty, parameter);
            first = false;
        }
        em.push(")");

        if !sig.exceptions.is_empty() {
            em.push(" throws ");
            em.push_join(sig.exceptions.iter().map(TypeName::declared_name), ", ");
        }
    }

    fn write_method(&self, em: &mut Emitter, ty: &TypeElement, method: &MethodElement) {
        self.write_method_header(
            em,
            ty,
            &MethodSig {
                modifiers: &method.modifiers,
                type_parameters: &method.type_parameters,
                return_type: method.return_type.as_ref(),
                name: &method.name,
                parameters: &method.parameters,
                exceptions: &method.exceptions,
                is_constructor: method.is_constructor,
            },
        );

        if ty.kind == TypeKind::Interface || method.modifiers.contains(&Modifier::Abstract) {
            em.push(";");
            em.end_line();
            return;
        }

        em.push(" {");
        em.end_line();
        if method.is_constructor {
            self.write_constructor_stub(em, ty);
        } else {
            self.write_method_stub(em, method);
        }
        em.push("}");
        em.end_line();
    }

    /// Constructors forward to the superclass constructor with
    /// default-valued arguments
    fn write_constructor_stub(&self, em: &mut Emitter, ty: &TypeElement) {
        if !ty.super_arguments.is_empty() {
            em.push("super(");
            let defaults: Vec<String> = ty
                .super_arguments
                .iter()
                .map(TypeName::default_value)
                .collect();
            em.push_join(defaults.iter().map(String::as_str), ", ");
            em.push(");");
            em.end_line();
        }
    }

    /// Non-constructors return a default value of the declared type
    fn write_method_stub(&self, em: &mut Emitter, method: &MethodElement) {
        if let Some(return_type) = &method.return_type {
            if !return_type.is_void() {
                em.push("return ");
                em.push(&return_type.default_value());
                em.push(";");
                em.end_line();
            }
        }
    }

    /// The identifying metadata record emitted before each contract method
    fn write_contract_signature(&self, em: &mut Emitter, contract: &ContractMethod) {
        em.push("@");
        em.push(CONTRACT_METHOD_SIGNATURE);
        em.push("(kind = ");
        em.push(CLAUSE_KIND_ENUM);
        em.push(".");
        em.push(contract.kind.metadata_name());

        em.push(&format!(", id = {}", contract.id));

        if !contract.target.is_empty() {
            em.push(", target = \"");
            em.push(&contract.target);
            em.push("\"");
        }

        if !contract.lines.is_empty() {
            em.push(", lines = { ");
            let rendered: Vec<String> = contract
                .lines
                .iter()
                .map(|&line| Provenance { line }.sentinel().to_string())
                .collect();
            em.push_join(rendered.iter().map(String::as_str), ", ");
            em.push(" }");
        }

        em.push(")");
        em.end_line();
    }

    fn write_contract(&self, em: &mut Emitter, ty: &TypeElement, contract: &ContractMethod) {
        self.write_contract_signature(em, contract);
        self.write_method_header(
            em,
            ty,
            &MethodSig {
                modifiers: &contract.modifiers,
                type_parameters: &[],
                return_type: Some(&contract.return_type),
                name: &contract.name,
                parameters: &contract.parameters,
                exceptions: &[],
                is_constructor: false,
            },
        );
        em.push(" {");
        em.end_line();

        if self.debug_trace && contract.helper {
            em.push("covenant.util.DebugUtils.contractInfo(\"checking contract: ");
            em.push(&quote_string(&ty.qualified_name));
            em.push(".");
            em.push(&quote_string(&contract.name));
            if let Some(clause_text) = &contract.clause_text {
                em.push(": ");
                em.push(&quote_string(clause_text));
            }
            em.push("\");");
            em.end_line();
        }

        for body_line in &contract.body {
            em.push(&body_line.text);
            match &body_line.origin {
                Some(origin) => em.end_line_with(origin.clone()),
                None => em.end_line(),
            }
        }

        em.push("}");
        em.end_line();
    }
}

#[cfg(test)]
mod synthesizer_tests;
