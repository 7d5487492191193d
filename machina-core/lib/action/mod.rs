//! The middleware action pipeline.
//!
//! A [`Builder`] holds an ordered list of [`StepSpec`]s. The [`Runner`] compiles it into a
//! [`Chain`] of [`Action`]s, runs it against an [`Environment`] and, if a step fails, walks back
//! through the steps that were entered so each can recover.

mod builder;
mod deferred;
mod environment;
mod hook;
mod runner;
mod step;

pub mod builtin;
pub mod lifecycle;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use builder::*;
pub use deferred::*;
pub use environment::*;
pub use hook::*;
pub use runner::*;
pub use step::*;
