//! Clause combinator
//!
//! Applies the override combination law across a type's ancestor chain:
//! preconditions weaken (OR), postconditions and exceptional
//! postconditions strengthen (AND), and invariants accumulate by
//! conjunction. Original clauses are never edited; combination appends
//! new derived [`ContractMethod`]s carrying the combined expression.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::builder::contract_method_name;
use crate::errors::{CovenantError, CovenantResult};
use crate::model::{
    BodyLine, ClauseKind, ContractClause, ContractMethod, Element, Modifier, TypeElement,
    TypeName, VariableElement, VariableKind,
};

/// The contracts of one type, as visible to other compilation units
///
/// Base-type contracts must be resolvable by qualified name even when the
/// base was built separately, so this is the cross-unit currency of the
/// combinator.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeContracts {
    /// Fully qualified type name
    pub qualified_name: String,
    /// Qualified name of the superclass, if any
    pub superclass: Option<String>,
    /// Clauses declared on the type and its methods
    pub clauses: Vec<ContractClause>,
}

impl TypeContracts {
    /// Capture the combinable surface of a built type element
    pub fn of(ty: &TypeElement) -> Self {
        Self {
            qualified_name: ty.qualified_name.clone(),
            superclass: ty.super_qualified.clone(),
            clauses: ty.clauses.clone(),
        }
    }
}

/// Cross-unit contract lookup by qualified type name
pub trait ContractRegistry {
    /// The contracts of the named type, if it is known to the registry
    fn lookup(&self, qualified_name: &str) -> Option<&TypeContracts>;
}

/// Registry backed by an in-memory map
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    contracts: FxHashMap<String, TypeContracts>,
}

impl InMemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the contracts of one type
    pub fn add(&mut self, contracts: TypeContracts) {
        self.contracts
            .insert(contracts.qualified_name.clone(), contracts);
    }

    /// Convenience: capture and add a built type element
    pub fn register_type(&mut self, ty: &TypeElement) {
        self.add(TypeContracts::of(ty));
    }
}

impl ContractRegistry for InMemoryRegistry {
    fn lookup(&self, qualified_name: &str) -> Option<&TypeContracts> {
        self.contracts.get(qualified_name)
    }
}

/// Applies the inheritance combination law to one type
pub struct ClauseCombinator<'a> {
    registry: &'a dyn ContractRegistry,
}

impl<'a> ClauseCombinator<'a> {
    /// Create a combinator resolving ancestors through `registry`
    pub fn new(registry: &'a dyn ContractRegistry) -> Self {
        Self { registry }
    }

    /// Combine inherited clauses into `ty`, appending derived contract
    /// methods where an ancestor contributes
    pub fn combine(&self, ty: &mut TypeElement) -> CovenantResult<()> {
        let ancestors = self.ancestors_of(ty)?;
        if ancestors.is_empty() {
            trace!(type_name = %ty.qualified_name, "no contracted ancestors");
            return Ok(());
        }

        self.combine_invariants(ty, &ancestors);

        let targets: Vec<String> = ty
            .methods()
            .filter(|m| m.is_overridable() && !m.is_constructor)
            .map(|m| m.name.clone())
            .collect();
        for target in targets {
            for kind in [ClauseKind::Requires, ClauseKind::Ensures, ClauseKind::ThrowEnsures] {
                self.combine_method_clauses(ty, &ancestors, kind, &target);
            }
        }
        Ok(())
    }

    /// Walk the ancestor chain through the registry, nearest first
    ///
    /// An ancestor missing from the registry ends the walk: it either has
    /// no contracts or lives in a unit that was built without them.
    fn ancestors_of(&self, ty: &TypeElement) -> CovenantResult<Vec<&'a TypeContracts>> {
        let mut chain = Vec::new();
        let mut visited = vec![ty.qualified_name.clone()];
        let mut next = ty.super_qualified.clone();
        while let Some(name) = next {
            if visited.contains(&name) {
                return Err(CovenantError::InheritanceCycle(name));
            }
            visited.push(name.clone());
            match self.registry.lookup(&name) {
                Some(contracts) => {
                    next = contracts.superclass.clone();
                    chain.push(contracts);
                }
                None => break,
            }
        }
        Ok(chain)
    }

    fn combine_invariants(&self, ty: &mut TypeElement, ancestors: &[&TypeContracts]) {
        let own = invariant_group(&ty.clauses);
        let inherited: Vec<Contribution> = ancestors
            .iter()
            .filter_map(|a| invariant_group(&a.clauses))
            .collect();
        if inherited.is_empty() {
            return;
        }

        let mut chain: Vec<Contribution> = Vec::new();
        chain.extend(own);
        chain.extend(inherited);
        self.append_derived(ty, ClauseKind::Invariant, "", chain, vec![]);
    }

    fn combine_method_clauses(
        &self,
        ty: &mut TypeElement,
        ancestors: &[&TypeContracts],
        kind: ClauseKind,
        target: &str,
    ) {
        let own = clause_group(&ty.clauses, kind, target);
        let inherited: Vec<Contribution> = ancestors
            .iter()
            .filter_map(|a| clause_group(&a.clauses, kind, target))
            .collect();
        if inherited.is_empty() {
            return;
        }

        let mut chain: Vec<Contribution> = Vec::new();
        chain.extend(own);
        chain.extend(inherited);

        let parameters = derived_parameters(ty, kind, target);
        self.append_derived(ty, kind, target, chain, parameters);
    }

    /// Append the derived contract method holding the combined expression
    fn append_derived(
        &self,
        ty: &mut TypeElement,
        kind: ClauseKind,
        target: &str,
        chain: Vec<Contribution>,
        parameters: Vec<VariableElement>,
    ) {
        // Preconditions weaken; everything else strengthens.
        let op = match kind {
            ClauseKind::Requires => "||",
            _ => "&&",
        };
        let combined = chain
            .iter()
            .map(|c| format!("({})", c.expression))
            .collect::<Vec<_>>()
            .join(&format!(" {} ", op));
        let lines: Vec<Option<u64>> = chain.iter().flat_map(|c| c.lines.clone()).collect();

        let id = ty.next_contract_id(kind, target);
        let mut body = Vec::with_capacity(3);
        body.push(BodyLine::plain(format!("if (!({})) {{", combined)));
        body.push(BodyLine::plain(format!(
            "  throw new {}(\"{}\");",
            kind.error_class(),
            crate::model::quote_string(&combined)
        )));
        body.push(BodyLine::plain("}"));

        debug!(
            type_name = %ty.qualified_name,
            kind = ?kind,
            target = %target,
            id,
            "derived combined contract method"
        );
        ty.add_element(Element::Contract(ContractMethod {
            kind,
            target: target.to_string(),
            id,
            name: contract_method_name(kind, target, id),
            modifiers: vec![Modifier::Private],
            return_type: TypeName::new("void"),
            parameters,
            body,
            lines,
            helper: true,
            clause_text: Some(combined),
        }));
    }
}

/// One type's contribution to a combination chain
struct Contribution {
    expression: String,
    lines: Vec<Option<u64>>,
}

/// Conjoin every expression a type declares for (kind, target)
///
/// Within a single declaration site, all sub-expressions of all clauses
/// must hold, so they are conjoined before chain combination applies.
fn clause_group(clauses: &[ContractClause], kind: ClauseKind, target: &str) -> Option<Contribution> {
    let matching: Vec<&ContractClause> = clauses
        .iter()
        .filter(|c| c.kind == kind && c.target == target && c.is_virtual)
        .collect();
    conjoin(&matching)
}

/// Conjoin every invariant a type declares
fn invariant_group(clauses: &[ContractClause]) -> Option<Contribution> {
    let matching: Vec<&ContractClause> = clauses
        .iter()
        .filter(|c| c.kind == ClauseKind::Invariant)
        .collect();
    conjoin(&matching)
}

fn conjoin(clauses: &[&ContractClause]) -> Option<Contribution> {
    let expressions: Vec<String> = clauses
        .iter()
        .flat_map(|c| c.expressions.iter())
        .map(|e| format!("({})", e))
        .collect();
    if expressions.is_empty() {
        return None;
    }
    let lines = clauses
        .iter()
        .flat_map(|c| {
            c.expressions_with_provenance()
                .map(|(_, prov)| prov.line)
                .collect::<Vec<_>>()
        })
        .collect();
    Some(Contribution {
        expression: expressions.join(" && "),
        lines,
    })
}

/// Parameters of a derived method-targeted check
fn derived_parameters(ty: &TypeElement, kind: ClauseKind, target: &str) -> Vec<VariableElement> {
    let Some(method) = ty.find_method(target) else {
        return vec![];
    };
    let mut parameters = method.parameters.clone();
    if kind == ClauseKind::Ensures {
        if let Some(rt) = method.return_type.as_ref().map(TypeName::erasure) {
            if !rt.is_void() {
                parameters.push(VariableElement {
                    name: "result".to_string(),
                    kind: VariableKind::Field,
                    type_name: rt,
                    modifiers: vec![Modifier::Final],
                });
            }
        }
    }
    parameters
}
