//! Model builder
//!
//! Converts raw per-element clause metadata, as delivered by an external
//! discovery collaborator, into [`ContractClause`] and [`ContractMethod`]
//! nodes attached to the contract model. Unrecognized metadata is skipped,
//! and source-location lookup degrades gracefully when unavailable.

use tracing::{debug, trace, warn};

use crate::model::{
    quote_string, BodyLine, ClauseKind, ClauseOrigin, ContractClause, ContractMethod, Element,
    Modifier, Provenance, TypeElement, TypeKind, TypeName, VariableElement, VariableKind,
};

/// One raw clause record from the metadata source
///
/// Records arrive in declaration order. The `tag` is the raw metadata name;
/// only the four clause kinds are recognized, every other tag is ignored so
/// unrelated metadata never breaks the build.
#[derive(Debug, Clone, PartialEq)]
pub struct ClauseRecord {
    /// Raw metadata tag (e.g. `"Requires"`)
    pub tag: String,
    /// Ordered raw boolean expression strings, copied verbatim
    pub expressions: Vec<String>,
    /// Parallel originating line numbers, when the metadata source had
    /// them; empty otherwise
    pub lines: Vec<Option<u64>>,
}

impl ClauseRecord {
    /// Create a record with no line information
    pub fn new(tag: impl Into<String>, expressions: Vec<String>) -> Self {
        Self {
            tag: tag.into(),
            expressions,
            lines: Vec::new(),
        }
    }

    /// Attach parallel line numbers (builder pattern)
    pub fn with_lines(mut self, lines: Vec<Option<u64>>) -> Self {
        self.lines = lines;
        self
    }
}

/// The declaration site clause records attach to
#[derive(Debug, Clone, PartialEq)]
pub enum ClauseSite {
    /// The whole type (invariants)
    Type,
    /// A declared method, by simple name
    Method(String),
}

/// Optional source-location introspection capability
///
/// Implementations are probed at startup; when none is available the
/// [`NullLocator`] default is used and every lookup degrades to an empty
/// result instead of aborting the build.
pub trait SourceLocator {
    /// Line numbers for each sub-expression of a clause, if known
    fn clause_lines(
        &self,
        _type_name: &str,
        _site: &ClauseSite,
        _kind: ClauseKind,
        _count: usize,
    ) -> Option<Vec<Option<u64>>> {
        None
    }

    /// Import names visible at the type's declaration site, if known
    fn import_names(&self, _type_name: &str) -> Option<Vec<String>> {
        None
    }
}

/// No-op locator used when no introspection service is present
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLocator;

impl SourceLocator for NullLocator {}

/// Builds contract-model nodes from raw clause metadata
pub struct ModelBuilder {
    locator: Box<dyn SourceLocator>,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder {
    /// Create a builder with the no-op locator
    pub fn new() -> Self {
        Self {
            locator: Box::new(NullLocator),
        }
    }

    /// Create a builder using the given introspection capability
    pub fn with_locator(locator: Box<dyn SourceLocator>) -> Self {
        Self { locator }
    }

    /// Record the import names visible at the type's declaration site
    ///
    /// Clause expression text is copied verbatim into generated code and
    /// must resolve under the same visible names. Degrades to an empty
    /// set when introspection is unavailable.
    pub fn attach_imports(&self, ty: &mut TypeElement) {
        match self.locator.import_names(&ty.qualified_name) {
            Some(imports) => ty.imports = imports,
            None => trace!(type_name = %ty.qualified_name, "no import introspection available"),
        }
    }

    /// Attach the clause records declared at `site` to the model
    ///
    /// Appends one [`ContractClause`] and one lowered [`ContractMethod`]
    /// per recognized record. Returns the number of clauses attached.
    /// Malformed records are skipped, never fatal.
    pub fn attach_clauses(
        &self,
        ty: &mut TypeElement,
        site: &ClauseSite,
        records: &[ClauseRecord],
        primary: bool,
    ) -> usize {
        let mut attached = 0;
        for record in records {
            let Some(kind) = ClauseKind::from_tag(&record.tag) else {
                trace!(tag = %record.tag, "ignoring unrecognized metadata tag");
                continue;
            };
            if record.expressions.is_empty() {
                warn!(
                    type_name = %ty.qualified_name,
                    tag = %record.tag,
                    "skipping clause with no expressions"
                );
                continue;
            }

            let (target, is_virtual, return_type, parameters) = match site {
                ClauseSite::Type => (String::new(), ty.kind != TypeKind::Interface, None, vec![]),
                ClauseSite::Method(name) => {
                    let Some(method) = ty.find_method(name) else {
                        warn!(
                            type_name = %ty.qualified_name,
                            target = %name,
                            "skipping clause for unknown method"
                        );
                        continue;
                    };
                    let is_virtual = ty.kind != TypeKind::Interface && method.is_overridable();
                    let return_type = method.return_type.as_ref().map(TypeName::erasure);
                    let mut parameters = method.parameters.clone();
                    if kind == ClauseKind::Ensures {
                        if let Some(rt) = &return_type {
                            if !rt.is_void() {
                                parameters.push(VariableElement {
                                    name: "result".to_string(),
                                    kind: VariableKind::Field,
                                    type_name: rt.clone(),
                                    modifiers: vec![Modifier::Final],
                                });
                            }
                        }
                    }
                    (name.clone(), is_virtual, return_type, parameters)
                }
            };

            let provenance = self.resolve_provenance(ty, site, kind, record);
            let clause = ContractClause {
                kind,
                primary,
                is_virtual,
                target: target.clone(),
                id: None,
                expressions: record.expressions.clone(),
                provenance: provenance.clone(),
                return_type: return_type.clone(),
            };

            let id = ty.next_contract_id(kind, &target);
            let pairs: Vec<(String, Provenance)> = clause
                .expressions_with_provenance()
                .map(|(expr, prov)| (expr.to_string(), prov))
                .collect();
            let contract = ContractMethod {
                kind,
                target: target.clone(),
                id,
                name: contract_method_name(kind, &target, id),
                modifiers: vec![Modifier::Private],
                return_type: TypeName::new("void"),
                parameters,
                body: lower_check_body(kind, &target, &pairs),
                lines: pairs.iter().map(|(_, prov)| prov.line).collect(),
                helper: true,
                clause_text: Some(record.expressions.join(", ")),
            };

            debug!(
                type_name = %ty.qualified_name,
                kind = ?kind,
                target = %target,
                id,
                "attached contract clause"
            );
            ty.clauses.push(clause);
            ty.add_element(Element::Contract(contract));
            attached += 1;
        }
        attached
    }

    /// Best-effort provenance: prefer lines delivered with the record,
    /// fall back to the locator, degrade to empty
    fn resolve_provenance(
        &self,
        ty: &TypeElement,
        site: &ClauseSite,
        kind: ClauseKind,
        record: &ClauseRecord,
    ) -> Vec<Provenance> {
        let count = record.expressions.len();
        let lines = if record.lines.is_empty() {
            match self
                .locator
                .clause_lines(&ty.qualified_name, site, kind, count)
            {
                Some(lines) => lines,
                None => return Vec::new(),
            }
        } else {
            record.lines.clone()
        };

        let mut provenance: Vec<Provenance> = lines
            .into_iter()
            .take(count)
            .map(|line| Provenance { line })
            .collect();
        provenance.resize(count, Provenance::unknown());
        provenance
    }
}

/// Name of a synthesized contract method
pub(crate) fn contract_method_name(kind: ClauseKind, target: &str, id: u32) -> String {
    if target.is_empty() {
        format!("covenant${}${}", kind.method_stem(), id)
    } else {
        format!("covenant${}${}${}", kind.method_stem(), target, id)
    }
}

/// Lower a clause group into the generated check body
///
/// Each sub-expression becomes a guard raising the error type of the
/// clause kind with the verbatim expression text as message. The guard
/// line is the one that maps 1:1 to the sub-expression and carries its
/// origin.
pub(crate) fn lower_check_body(
    kind: ClauseKind,
    target: &str,
    expressions: &[(String, Provenance)],
) -> Vec<BodyLine> {
    let mut body = Vec::with_capacity(expressions.len() * 3);
    for (expr, prov) in expressions {
        let origin = ClauseOrigin {
            kind,
            target: target.to_string(),
            line: prov.line,
            expression: expr.clone(),
        };
        body.push(BodyLine::from_clause(format!("if (!({})) {{", expr), origin));
        body.push(BodyLine::plain(format!(
            "  throw new {}(\"{}\");",
            kind.error_class(),
            quote_string(expr)
        )));
        body.push(BodyLine::plain("}"));
    }
    body
}
