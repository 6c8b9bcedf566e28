//! drillplan-core: Day assembly and spaced-repetition scheduling.
//!
//! This crate holds the data model, the curriculum table, the scheduling
//! logic and the storage seams the rest of drillplan builds on.

pub mod assembler;
pub mod classifier;
pub mod curriculum;
pub mod error;
pub mod memory;
pub mod model;
pub mod mutator;
pub mod review;
pub mod scheduler;
pub mod statistics;
pub mod traits;

pub use error::{Result, SchedulerError, StoreError};
pub use scheduler::{Scheduler, SchedulerConfig};
