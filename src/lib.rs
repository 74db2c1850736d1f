//! An embeddable interpreter for a small stack-based, concatenative
//! language with an S-expression-flavored surface syntax.
//!
//! A host creates an [`Interp`], registers native words, compiles source
//! text into a flat chunk of [`Cell`]s with [`Interp::load`], and executes
//! chunks under program slots with [`Interp::run`]. Programs push values
//! onto the operand stack, bind frame-scoped locals with `(name ...)`
//! tuples, and can define new words at runtime from first-class lists:
//!
//! ```
//! use rill::{Cell, Interp, Value, CHUNK_CELLS};
//!
//! let mut interp = Interp::new();
//! let mut chunk = vec![Cell::default(); CHUNK_CELLS];
//! let n = interp
//!     .load(b"[(x) $x $x] 'dup def 21 dup +", &mut chunk)
//!     .unwrap();
//! interp.run(0, Some(&chunk[..n])).unwrap();
//! assert_eq!(interp.stack().values(), &[Value::Int(42)]);
//! ```
//!
//! Errors are typed and fatal to the run that raised them: the operand and
//! frame stacks are cleared before [`Error`] is returned, while the word
//! table, interned locals, program bindings and persisted lists survive.

pub mod cell;
pub mod error;
pub mod internals;
pub mod runtime;
pub mod stack;

pub use cell::{Cell, Tag, CHUNK_CELLS};
pub use error::{Error, ParseError};
pub use internals::words::NativeFn;
pub use runtime::Interp;
pub use stack::{DynList, List, LocalId, Stack, StaticList, Value, WordId};
