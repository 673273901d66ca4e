use thiserror::Error;

/// Errors surfaced by the library. Everything a caller can see goes through
/// this enum; BCP conflicts are *not* errors, they are an ordinary UNSAT
/// signal handled inside the engines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The DIMACS input or the raw clause list violates the input contract.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// An unknown heuristic name, cutting method or a conflicting
    /// combination of solver options.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A bookkeeping field no longer matches its definition. Always a
    /// programmer bug; reported instead of being silently repaired.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A heuristic returned no literal although unresolved clauses remain.
    /// The engines resolve this themselves (it degrades to a final
    /// satisfaction check), so callers normally never observe it.
    #[error("no branching literal available while unresolved clauses remain")]
    NoProgress,
}
