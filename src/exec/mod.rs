// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`handler`] defines the `TaskHandler` contract the stage runner calls.
//! - [`process`] provides the `ProcessRunner` trait and the production
//!   `ShellProcessRunner`, which tests can replace with a recording fake.
//! - [`tasks`] holds one handler per task kind and `default_registry`.

pub mod handler;
pub mod process;
pub mod tasks;

pub use handler::{HandlerFuture, TaskContext, TaskHandler};
pub use process::{CommandOutput, CommandSpec, ProcessFuture, ProcessRunner, ShellProcessRunner};
pub use tasks::{ApprovalPolicy, default_registry};
