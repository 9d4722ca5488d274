//! CLI commands for the impact engine.

pub mod align;
pub mod evaluate;
pub mod inputs;
pub mod validate;

pub use align::{run_align, AlignArgs};
pub use evaluate::{run_evaluate, EvaluateArgs};
pub use inputs::{InputArgs, OutputFormat};
pub use validate::{run_validate, ValidateArgs};
