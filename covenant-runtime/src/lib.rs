//! Runtime support for Covenant-synthesized checking code
//!
//! Generated contract methods lean on this crate for everything that is
//! not the clause expression itself: activation tracking so reentrant
//! clause expressions do not recurse into their own checks, typed
//! violation errors with outer-to-inner message chains, pre-state
//! capture for postconditions that reference entry-time values, and an
//! optional startup verification that contracted types really loaded
//! with their contracts.

pub mod context;
pub mod errors;
pub mod prestate;
pub mod selfcheck;

pub use context::{enter, leave, ActivationGuard};
pub use errors::{ContractViolation, SpecificationError, ViolationKind};
pub use prestate::{magic_cast, OldValue};
pub use selfcheck::ContractedChecker;
