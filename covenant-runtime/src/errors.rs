//! Contract violation error types
//!
//! One error category per clause kind, plus a specification-error
//! category for malformed contracts. Violations may chain to the prior
//! contract error that triggered them; the chained message list reads
//! outer-to-inner. Construction trims the leading stack frames belonging
//! to the checking machinery itself so user-visible traces start at the
//! genuine check site.

use std::backtrace::Backtrace;
use std::fmt;

use thiserror::Error;

/// Which clause kind was violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    Precondition,
    Postcondition,
    Invariant,
    ThrowEnsures,
}

impl ViolationKind {
    /// Human-readable label used in the display form
    pub fn label(&self) -> &'static str {
        match self {
            ViolationKind::Precondition => "Precondition violated",
            ViolationKind::Postcondition => "Postcondition violated",
            ViolationKind::Invariant => "Invariant violated",
            ViolationKind::ThrowEnsures => "Exceptional postcondition violated",
        }
    }
}

/// A contract violation raised by synthesized checking code
///
/// The message is the verbatim text of the failed clause. Violations are
/// raised synchronously on the calling thread and propagate as ordinary
/// failures; they are never retried.
#[derive(Debug)]
pub struct ContractViolation {
    kind: ViolationKind,
    message: String,
    cause: Option<Box<ContractViolation>>,
    trace: Vec<String>,
}

impl ContractViolation {
    /// Raise a violation with no prior cause
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
            trace: cleaned_trace(),
        }
    }

    /// Raise a violation chained to the prior contract error that
    /// triggered it
    pub fn with_cause(kind: ViolationKind, message: impl Into<String>, cause: ContractViolation) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: Some(Box::new(cause)),
            trace: cleaned_trace(),
        }
    }

    /// The violated clause kind
    pub fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// The verbatim clause text
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The prior contract error, if this violation chains to one
    pub fn cause(&self) -> Option<&ContractViolation> {
        self.cause.as_deref()
    }

    /// The ordered outer-to-inner message list of the whole chain
    pub fn messages(&self) -> Vec<String> {
        let mut list = Vec::new();
        let mut current = Some(self);
        while let Some(violation) = current {
            list.push(violation.message.clone());
            current = violation.cause();
        }
        list
    }

    /// Captured stack frames, machinery frames already trimmed
    ///
    /// Best-effort: empty when no backtrace could be captured.
    pub fn trace(&self) -> &[String] {
        &self.trace
    }
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::error::Error for ContractViolation {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|c| c.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// A malformed or unsatisfiable contract specification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("specification error: {0}")]
pub struct SpecificationError(pub String);

/// Capture the current backtrace and drop the leading frames that belong
/// to the contract-checking machinery, keeping the genuine check-site
/// frame and everything below it
fn cleaned_trace() -> Vec<String> {
    let rendered = Backtrace::force_capture().to_string();
    let mut frames: Vec<String> = Vec::new();
    for line in rendered.lines() {
        let trimmed = line.trim_start();
        // Frame header lines look like "3: path::to::symbol"; location
        // lines ("at src/...") belong to the preceding frame.
        let Some((index, symbol)) = trimmed.split_once(": ") else {
            continue;
        };
        if index.chars().all(|c| c.is_ascii_digit()) && !index.is_empty() {
            frames.push(symbol.to_string());
        }
    }
    let skip = frames
        .iter()
        .take_while(|symbol| is_machinery_frame(symbol))
        .count();
    frames.split_off(skip)
}

fn is_machinery_frame(symbol: &str) -> bool {
    symbol.starts_with("std::backtrace")
        || symbol.contains("backtrace::backtrace")
        || symbol.contains("covenant_runtime::errors")
}
