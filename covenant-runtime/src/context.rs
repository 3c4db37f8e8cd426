//! Thread-local contract activation context
//!
//! Synthesized checking code wraps clause evaluation in `enter`/`leave`
//! and only evaluates assertions in the outermost activation of the
//! current thread. This keeps a clause whose own expression calls back
//! into a contracted operation from triggering unbounded or duplicate
//! checking. The state is per-thread; nothing here synchronizes across
//! threads.

use std::cell::Cell;

thread_local! {
    static ACTIVATION_DEPTH: Cell<u32> = Cell::new(0);
}

/// Mark one contract activation on the current thread
///
/// Returns `true` iff this is the outermost activation, i.e. assertions
/// should actually be evaluated.
pub fn enter() -> bool {
    ACTIVATION_DEPTH.with(|depth| {
        let current = depth.get();
        depth.set(current + 1);
        current == 0
    })
}

/// Reverse one [`enter`] on the current thread
pub fn leave() {
    ACTIVATION_DEPTH.with(|depth| {
        let current = depth.get();
        debug_assert!(current > 0, "leave() without matching enter()");
        depth.set(current.saturating_sub(1));
    });
}

/// RAII wrapper around `enter`/`leave`
///
/// Restores the prior activation state on drop, including when a check
/// raises and unwinds through the contracted frame.
#[derive(Debug)]
pub struct ActivationGuard {
    outermost: bool,
}

impl ActivationGuard {
    /// Enter a contract activation scope
    pub fn enter() -> Self {
        Self { outermost: enter() }
    }

    /// Whether assertions should be evaluated in this scope
    pub fn is_outermost(&self) -> bool {
        self.outermost
    }
}

impl Drop for ActivationGuard {
    fn drop(&mut self) {
        leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outermost_activation_only() {
        assert!(enter());
        assert!(!enter());
        assert!(!enter());
        leave();
        leave();
        leave();
        // Fully unwound: the next activation is outermost again.
        assert!(enter());
        leave();
    }

    #[test]
    fn test_guard_restores_state() {
        {
            let outer = ActivationGuard::enter();
            assert!(outer.is_outermost());
            {
                let inner = ActivationGuard::enter();
                assert!(!inner.is_outermost());
            }
        }
        assert!(ActivationGuard::enter().is_outermost());
    }

    #[test]
    fn test_guard_restores_state_across_unwind() {
        let result = std::panic::catch_unwind(|| {
            let _guard = ActivationGuard::enter();
            panic!("precondition violated");
        });
        assert!(result.is_err());
        // leave() ran during the unwind.
        assert!(ActivationGuard::enter().is_outermost());
    }

    #[test]
    fn test_recursive_contracted_call_checks_once() {
        // A contracted operation whose precondition expression calls
        // back into the operation itself: only the outermost activation
        // evaluates checks.
        fn contracted(depth: u32, evaluations: &mut u32) {
            let guard = ActivationGuard::enter();
            if guard.is_outermost() {
                *evaluations += 1;
                // The clause expression re-enters the operation.
                if depth < 3 {
                    contracted(depth + 1, evaluations);
                }
            }
        }
        let mut evaluations = 0;
        contracted(0, &mut evaluations);
        assert_eq!(evaluations, 1);
    }

    #[test]
    fn test_state_is_per_thread() {
        let _guard = ActivationGuard::enter();
        let handle = std::thread::spawn(|| ActivationGuard::enter().is_outermost());
        // Another thread sees its own fresh activation state.
        assert!(handle.join().unwrap());
    }
}
