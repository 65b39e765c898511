//! Console rendering.

pub mod presenter;
