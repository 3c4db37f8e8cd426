//! Startup verification of contract instrumentation
//!
//! A deployment can load a type's compiled form without its synthesized
//! contract form, silently running uncontracted. The checker records
//! which types were loaded with contracts attached and, in strict mode,
//! turns any gap into a hard startup failure instead of a silent
//! degradation.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::errors::SpecificationError;

/// Tracks which contracted types actually loaded with their contracts
#[derive(Debug, Default)]
pub struct ContractedChecker {
    strict: bool,
    loaded: Mutex<FxHashMap<String, bool>>,
}

impl ContractedChecker {
    /// Create a checker in lenient mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a checker that fails startup on any uncontracted type
    pub fn with_strict(strict: bool) -> Self {
        Self {
            strict,
            loaded: Mutex::new(FxHashMap::default()),
        }
    }

    /// Record that a type was loaded, and whether its contract form came
    /// with it
    pub fn record_loaded(&self, qualified_name: impl Into<String>, contracted: bool) {
        let qualified_name = qualified_name.into();
        if contracted {
            debug!(type_name = %qualified_name, "loaded with contracts");
        } else {
            warn!(type_name = %qualified_name, "loaded without contracts");
        }
        self.loaded.lock().insert(qualified_name, contracted);
    }

    /// Fail unless every recorded type loaded with its contracts
    pub fn assert_contracted(&self) -> Result<(), SpecificationError> {
        let loaded = self.loaded.lock();
        let mut missing: Vec<&str> = loaded
            .iter()
            .filter(|(_, contracted)| !**contracted)
            .map(|(name, _)| name.as_str())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        Err(SpecificationError(format!(
            "types loaded without their contracts: {}",
            missing.join(", ")
        )))
    }

    /// Startup hook: a no-op in lenient mode, [`assert_contracted`] in
    /// strict mode
    ///
    /// [`assert_contracted`]: ContractedChecker::assert_contracted
    pub fn startup_check(&self) -> Result<(), SpecificationError> {
        if self.strict {
            self.assert_contracted()
        } else {
            Ok(())
        }
    }
}
