//! Typed errors for every fallible interpreter operation.
//!
//! Every error is fatal to the `load` or `run` that raised it: the operand
//! stack and frame stack are reset before the error is returned, leaving the
//! interpreter otherwise usable (word and local tables, program bindings and
//! the persistent list tail all survive).

use thiserror::Error;

/// Failures of the tokenizer and the cell converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("source too long")]
    SourceTooLong,
    #[error("unterminated list")]
    UnterminatedList,
    #[error("unterminated tuple")]
    UnterminatedTuple,
    #[error("unmatched `)`")]
    UnmatchedParen,
    #[error("too many atoms")]
    TooManyAtoms,
    #[error("too many list nodes")]
    TooManyNodes,
    #[error("chunk needs {0} cells, output buffer too small")]
    ChunkOverflow(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("stack overflow")]
    StackOverflow,
    #[error("stack empty")]
    StackEmpty,
    #[error("invalid stack index")]
    BadIndex,

    #[error("stackframe overflow")]
    FrameOverflow,
    #[error("no active stackframe")]
    NoFrame,
    #[error("too many locals")]
    TooManyLocals,
    #[error("too many locals in ()")]
    TupleTooLong,
    #[error("empty () tuple")]
    EmptyTuple,
    #[error("no local")]
    NoLocal,

    #[error("too many words")]
    TooManyWords,
    #[error("undefined word `{0}`")]
    UndefinedWord(String),
    #[error("duplicate word `{0}`")]
    DuplicateWord(String),
    #[error("word already defined")]
    AlreadyDefined,

    #[error("def needs a wordref")]
    DefNeedsWordRef,
    #[error("def needs a list")]
    DefNeedsList,
    #[error("cannot persist list")]
    PersistFailed,

    #[error("list arena overflow")]
    ListOverflow,
    #[error("list index out of range")]
    ListIndexOutOfRange,
    #[error("not a dynamic list")]
    NotADynList,

    #[error("eval needs a list")]
    EvalNeedsList,
    #[error("need a number")]
    NeedNumber,
    #[error("divide by zero")]
    DivideByZero,

    #[error("bad program id {0}")]
    BadProgId(usize),
    #[error("program slot rebound with a different chunk")]
    ProgMismatch,
    #[error("no program bound")]
    NoProg,
    #[error("invalid chunk")]
    InvalidChunk,

    /// Raised by native words on behalf of the host.
    #[error("{0}")]
    Host(String),
}

impl Error {
    /// Convenience for native words reporting host-level failures.
    pub fn host(msg: impl Into<String>) -> Error {
        Error::Host(msg.into())
    }
}
