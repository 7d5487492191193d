//! `machina` drives the lifecycle of development machines through a middleware action pipeline.
//!
//! # Overview
//!
//! Every lifecycle operation (bringing a machine up, halting it, destroying it, provisioning it)
//! is a chain of small steps. Each step does some work on the way in, hands the shared
//! [`Environment`](action::Environment) to the next step, and can do more work on the way out.
//! When a step fails, the steps that were already entered get a chance to clean up in reverse
//! order before the error reaches the caller.
//!
//! # Architecture
//!
//! - **Steps**: the [`Action`](action::Action) trait and its compiled links
//! - **Builder**: an ordered, editable list of step specs compiled into a chain
//! - **Runner**: runs a chain, applies registered hooks and performs the recovery pass
//! - **Call**: runs a nested chain and extends the pipeline based on its result
//! - **Lock**: file based mutual exclusion around a sub-chain
//! - **Built-in steps**: confirmations, predicates, provisioning, boot waiting, box handling,
//!   synced folders
//!
//! # Modules
//!
//! - [`action`] - The pipeline engine and built-in steps
//! - [`config`] - Machine configuration types and defaults
//! - [`machine`] - The machine and the collaborator contracts the steps drive
//! - [`provision`] - Provisioner ordering and the provisioning sentinel
//! - [`ui`] - Leveled user output and prompts
//! - [`utils`] - Common utilities and helpers

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod action;
pub mod config;
pub mod machine;
pub mod provision;
pub mod ui;
pub mod utils;

pub use error::*;
