//! DOT pipeline graph toolchain for Forge.
//!
//! Lexes and parses the pipeline digraph dialect into a [`Graph`], renders
//! graphs back to canonical DOT, and hosts the in-place passes (edge IDs,
//! color coding) that editors and exporters run between the two.

pub mod color;
pub mod diagnostics;
pub mod errors;
pub mod graph;
pub mod lexer;
pub mod parse;
pub mod serialize;
pub mod transforms;

pub use color::*;
pub use diagnostics::*;
pub use errors::*;
pub use graph::*;
pub use lexer::*;
pub use parse::*;
pub use serialize::*;
pub use transforms::*;
