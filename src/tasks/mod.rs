//! Tasks Module
//!
//! Workloads that drive a shared cache from several threads.
//!
//! # Tasks
//! - Workload: get-or-add traffic over a fixed key space

mod workload;

pub use workload::{run_workload, WorkloadReport};
