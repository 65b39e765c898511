//! Bridge between console input and the exchange engine.

pub mod commands;
pub mod runtime;
