use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::algorithms::{CarrierTrailer, DirectoryBag};
use super::dataset::{Dataset, DatasetKind};
use crate::decision::{CriterionCatalogue, CriterionId, SUITABILITY_MAX};

/// Capability contract every encapsulation strategy satisfies.
///
/// `encapsulate` writes the artifact somewhere below `staging` and returns its
/// path; the encapsulator moves it into the artifact store afterwards.
pub trait EncapsulationAlgorithm: Debug + Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn supported_kinds(&self) -> &[DatasetKind];

    /// Rating in `0..=SUITABILITY_MAX`; criteria the algorithm does not rate score zero.
    fn suitability(&self, criterion: &CriterionId) -> u8;

    fn supports(&self, kind: DatasetKind) -> bool {
        self.supported_kinds().contains(&kind)
    }

    fn encapsulate(&self, dataset: &Dataset, staging: &Path) -> Result<PathBuf, PackagingError>;

    /// Restores carrier and payloads from an artifact this algorithm produced.
    fn decapsulate(&self, artifact: &Path, restore_dir: &Path)
        -> Result<Vec<PathBuf>, PackagingError>;
}

/// Failure inside an algorithm's own packaging or restore step.
#[derive(Debug, thiserror::Error)]
pub enum PackagingError {
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed artifact: {0}")]
    MalformedArtifact(String),
    #[error("checksum mismatch for {0}")]
    ChecksumMismatch(String),
    #[error("{0} already exists")]
    AlreadyExists(PathBuf),
    #[error("more than one entry named '{0}'")]
    DuplicateEntry(String),
}

impl PackagingError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| PackagingError::Io { path, source }
    }
}

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("algorithm '{0}' is already registered")]
    Duplicate(String),
    #[error("algorithm '{algorithm}' rates '{criterion}' at {rating}, above {max}")]
    RatingOutOfRange {
        algorithm: String,
        criterion: CriterionId,
        rating: u8,
        max: u8,
    },
}

/// Ordered set of candidate algorithms; registration order breaks ranking ties.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    algorithms: Vec<Arc<dyn EncapsulationAlgorithm>>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the bundled strategies, trailer first.
    pub fn standard() -> Self {
        Self {
            algorithms: vec![
                Arc::new(CarrierTrailer::new()) as Arc<dyn EncapsulationAlgorithm>,
                Arc::new(DirectoryBag::new()),
            ],
        }
    }

    /// Adds an algorithm after checking its id is unused and its ratings for
    /// the catalogue's criteria stay within bounds.
    pub fn register(
        &mut self,
        algorithm: Arc<dyn EncapsulationAlgorithm>,
        catalogue: &CriterionCatalogue,
    ) -> Result<(), RegistryError> {
        if self.get(algorithm.id()).is_some() {
            return Err(RegistryError::Duplicate(algorithm.id().to_string()));
        }

        for definition in &catalogue.definitions {
            let rating = algorithm.suitability(&definition.id);
            if rating > SUITABILITY_MAX {
                return Err(RegistryError::RatingOutOfRange {
                    algorithm: algorithm.id().to_string(),
                    criterion: definition.id.clone(),
                    rating,
                    max: SUITABILITY_MAX,
                });
            }
        }

        self.algorithms.push(algorithm);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn EncapsulationAlgorithm>> {
        self.algorithms
            .iter()
            .find(|algorithm| algorithm.id() == id)
    }

    pub fn algorithms(&self) -> &[Arc<dyn EncapsulationAlgorithm>] {
        &self.algorithms
    }

    /// Algorithms declaring support for `kind`, in registration order.
    pub fn applicable(&self, kind: DatasetKind) -> Vec<Arc<dyn EncapsulationAlgorithm>> {
        self.algorithms
            .iter()
            .filter(|algorithm| algorithm.supports(kind))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }
}
