//! # Release Orchestration Engine
//!
//! Components A-G from spec §2, built on the domain types and seams in
//! `release_shared`. `Coordinator` wires the components together behind the
//! [`jobs::JobHandler`] contract; `registry`/`release_engine` expose the
//! Rust API an external REST layer would call into (spec §6).

pub mod engine;
pub mod health;
pub mod jobs;
pub mod poller;
pub mod registry;
pub mod release_engine;
pub mod task_engine;

pub use engine::Coordinator;
pub use jobs::{InProcessDispatcher, Job, JobDispatcher, JobHandler, JobQueue};
