//! Covenant code synthesis backend
//!
//! Turns a built contract model into a compilable source unit with a
//! line-to-provenance map, and repairs cross-unit bridge-accessor
//! references after the generated unit is compiled and merged back into
//! the original compiled unit.

pub mod fixup;
pub mod synthesizer;

pub use fixup::{
    fix_unit, CompiledUnit, FixupError, Insn, MethodUnit, BRIDGE_ACCESSOR_PREFIX,
    SYNTHETIC_MEMBER_PREFIX,
};
pub use synthesizer::{SynthesizedUnit, Synthesizer, CLAUSE_KIND_ENUM, CONTRACT_METHOD_SIGNATURE};
