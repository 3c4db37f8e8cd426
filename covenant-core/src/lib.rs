//! Covenant contract model
//!
//! This crate provides the compile-time half of the Covenant contract
//! system: the model representing contract clauses attached to program
//! elements, the builder that turns raw clause metadata into that model,
//! and the combinator that applies the inheritance combination law across
//! override chains.
//!
//! Clause bodies are opaque boolean expressions copied verbatim from the
//! declaration site; nothing here parses or verifies them. The model is
//! transient: built fresh per compiled unit, consumed once by the
//! combinator and the code synthesizer, then discarded.

pub mod builder;
pub mod combinator;
pub mod errors;
pub mod model;

pub use builder::{ClauseRecord, ClauseSite, ModelBuilder, NullLocator, SourceLocator};
pub use combinator::{ClauseCombinator, ContractRegistry, InMemoryRegistry, TypeContracts};
pub use errors::{CovenantError, CovenantResult};
pub use model::{
    quote_string, BodyLine, ClauseKind, ClauseOrigin, ContractClause, ContractMethod, Element,
    MethodElement, Modifier, Provenance, TypeElement, TypeKind, TypeName, VariableElement,
    VariableKind,
};
