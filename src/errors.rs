use thiserror::Error;

/// Errors surfaced by automaton and transducer operations.
///
/// Every operation that can fail returns one of these kinds and leaves its
/// inputs untouched. Predicates on well-formed inputs answer with booleans
/// instead of raising.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AutomataError {
    /// Malformed input: an out-of-range parameter, a bad level annotation, a
    /// symbol name that is not what the alphabet expects.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A transition, state, or symbol an operation expected was absent.
    #[error("not found: {0}")]
    NotFound(String),
    /// An algorithmic precondition was violated, e.g. determinizing an
    /// automaton that still carries epsilon transitions.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// A transducer state's level is inconsistent with its transitions, or
    /// two transducers with different tape counts were combined.
    #[error("level mismatch: {0}")]
    LevelMismatch(String),
}

pub type Result<T> = std::result::Result<T, AutomataError>;
