//! Supporting engines behind the public runtime surface.

pub mod builtin;
pub mod debug;
pub mod inner;
pub mod parser;
pub mod words;
