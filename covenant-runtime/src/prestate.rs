//! Pre-state capture for postconditions
//!
//! A postcondition may reference the value an expression had on entry to
//! the contracted operation. Generated code captures that value into an
//! untyped [`OldValue`] holder at entry, and at exit casts the holder
//! back through [`magic_cast`], using an unevaluated duplicate of the
//! original expression as a type witness. The duplicate sits behind a
//! constant-false branch in the generated code, so it is never evaluated
//! at run time; it only pins the static type of the cast. This yields a
//! type-correct result without a separate type-inference mechanism.

use std::any::Any;

use crate::errors::SpecificationError;

/// Untyped holder for a value captured at operation entry
#[derive(Debug)]
pub struct OldValue(Box<dyn Any + Send>);

impl OldValue {
    /// Capture a pre-state value
    pub fn capture<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }
}

/// Cast a captured pre-state value to the static type of its witness
///
/// The witness argument is the constant-false-guarded duplicate of the
/// old value expression; generated code always passes `None`, and the
/// argument's only purpose is to let inference fix `T`. The cast is
/// identity-preserving.
///
/// # Panics
///
/// Panics with a [`SpecificationError`] message when the captured value
/// does not have type `T`. That can only happen when the generated code
/// is malformed, which is a contract-compiler defect, not a recoverable
/// runtime condition.
pub fn magic_cast<T: Any>(old: OldValue, type_witness: Option<&T>) -> T {
    // Never evaluated at run time; only pins T.
    let _ = type_witness;
    match old.0.downcast::<T>() {
        Ok(value) => *value,
        Err(_) => panic!(
            "{}",
            SpecificationError(
                "captured old value does not match the type of its witness expression".to_string()
            )
        ),
    }
}
