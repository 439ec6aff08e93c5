//! Capability contract for encapsulation strategies and the dispatch that
//! applies them to datasets.

pub mod algorithm;
pub mod algorithms;
pub mod dataset;
pub mod encapsulator;

#[cfg(test)]
mod tests;

pub use algorithm::{AlgorithmRegistry, EncapsulationAlgorithm, PackagingError, RegistryError};
pub use algorithms::{CarrierTrailer, DirectoryBag};
pub use dataset::{Dataset, DatasetKind};
pub use encapsulator::{Artifact, EncapsulationError, EncapsulationOutcome, Encapsulator};
