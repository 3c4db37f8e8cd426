//! Post-compile binary fixup pass
//!
//! The synthesizer's output is compiled separately from the original
//! source, and its contract methods are merged into the real compiled
//! unit afterwards. Both compilations may generate bridge accessors for
//! nested-scope member access, with positionally assigned synthetic names
//! (`access$0`, `access$1`, ...). Because the two units are numbered
//! independently, a merged contract method's call to "the nth bridge
//! accessor" can bind to the wrong member after the merge.
//!
//! The fix decouples contract code from either numbering: inside methods
//! tagged as contract-synthesized, every call to a bridge accessor is
//! rewritten to a reserved alias (fixed prefix + original name) that the
//! merge step guarantees to be present. The pass is total: anything it is
//! not responsible for passes through unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

/// Reserved prefix under which merged contract members are aliased
pub const SYNTHETIC_MEMBER_PREFIX: &str = "com$covenant$";

/// Naming convention of compiler-generated bridge accessors
pub const BRIDGE_ACCESSOR_PREFIX: &str = "access$";

/// One instruction of a compiled method
///
/// The compiled unit is modeled as an explicit, inspectable instruction
/// list, so the fixup transform stays a pure function that is testable
/// without any external toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Insn {
    /// Call a named method on a named owner type
    Invoke {
        owner: String,
        name: String,
        descriptor: String,
    },
    /// Read a field
    GetField { owner: String, name: String },
    /// Write a field
    PutField { owner: String, name: String },
    /// Load a local variable slot
    LoadLocal(u16),
    /// Store a local variable slot
    StoreLocal(u16),
    /// Push an integer constant
    PushConst(i64),
    /// Relative jump
    Jump(i32),
    /// Relative jump when the top of stack is falsy
    JumpIfNot(i32),
    /// Return from the method
    Return,
}

/// One compiled method and its tag state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodUnit {
    /// Method name
    pub name: String,
    /// Type descriptor
    pub descriptor: String,
    /// Whether this method was synthesized by the contract compiler
    pub contract_tagged: bool,
    /// Whether this method is marked synthetic in the merged unit
    pub synthetic: bool,
    /// Instruction stream
    pub instructions: Vec<Insn>,
}

/// One compiled unit, post-merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledUnit {
    /// Qualified name of the unit's root type
    pub name: String,
    /// Methods, in declaration order
    pub methods: Vec<MethodUnit>,
}

/// Hard failures of the fixup pass
///
/// The pass is total over well-formed input; anything that prevents it
/// from proceeding indicates an incompatible toolchain, not a recoverable
/// condition.
#[derive(Error, Debug)]
pub enum FixupError {
    /// The instruction stream references an unnamed symbol
    #[error("malformed compiled unit '{unit}': empty call target in method '{method}'")]
    EmptyCallTarget { unit: String, method: String },
}

/// Rewrite bridge-accessor references inside contract-tagged methods
///
/// Untagged methods, and tagged methods with no matching call sites, pass
/// through unchanged. Tagged methods are additionally marked synthetic in
/// the output.
pub fn fix_unit(unit: &CompiledUnit) -> Result<CompiledUnit, FixupError> {
    let mut fixed = unit.clone();
    for method in &mut fixed.methods {
        if !method.contract_tagged {
            continue;
        }
        method.synthetic = true;
        for insn in &mut method.instructions {
            if let Insn::Invoke { name, .. } = insn {
                if name.is_empty() {
                    return Err(FixupError::EmptyCallTarget {
                        unit: unit.name.clone(),
                        method: method.name.clone(),
                    });
                }
                if name.starts_with(BRIDGE_ACCESSOR_PREFIX) {
                    let alias = format!("{}{}", SYNTHETIC_MEMBER_PREFIX, name);
                    trace!(unit = %unit.name, method = %method.name, from = %name, to = %alias, "rewrote bridge accessor call");
                    *name = alias;
                }
            }
        }
    }
    debug!(unit = %unit.name, "fixup pass complete");
    Ok(fixed)
}
