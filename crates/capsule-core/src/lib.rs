//! Scenario-driven selection of digital-object encapsulation strategies.
//!
//! Operators describe a preservation scenario as a set of weighted criteria,
//! the decision mechanism ranks the registered algorithms against it, and the
//! encapsulator applies the chosen algorithm to a dataset once it has checked
//! the algorithm can process that dataset.

pub mod config;
pub mod decision;
pub mod encapsulation;
pub mod error;
pub mod telemetry;
