//! Core library for the `workfarm` harness binaries.
//!
//! This crate provides the building blocks used by the `nodemanager` and
//! `workgen` binaries: the wire protocol shared with the master, the node
//! manager's dispatch and host-reservation logic, the trace replay engine,
//! CLI argument types, and the error taxonomy. The primary user-facing
//! interface is the pair of command-line applications; library APIs may
//! evolve as they grow.
pub mod args;
pub mod error;
pub mod logger;
pub mod manager;
pub mod protocol;
pub mod trace;
