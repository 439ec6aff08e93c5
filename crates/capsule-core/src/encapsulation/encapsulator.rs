use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::algorithm::{EncapsulationAlgorithm, PackagingError};
use super::algorithms::digest_path;
use super::dataset::{Dataset, DatasetKind};
use crate::decision::RankedAlgorithm;

const STAGING_PREFIX: &str = ".staging-";

/// Reference to a produced artifact in the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub algorithm: String,
    pub kind: DatasetKind,
    /// Digest of the file, or of every relative path and file body in a bag.
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

/// Either a produced artifact or the refusal of every algorithm tried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EncapsulationOutcome {
    Produced(Artifact),
    /// None of `algorithms` declares support for `kind`; nothing was written.
    NotApplicable {
        algorithms: Vec<String>,
        kind: DatasetKind,
    },
}

impl EncapsulationOutcome {
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            EncapsulationOutcome::Produced(artifact) => Some(artifact),
            EncapsulationOutcome::NotApplicable { .. } => None,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            EncapsulationOutcome::Produced(artifact) => format!(
                "{} produced {} (sha256 {})",
                artifact.algorithm,
                artifact.path.display(),
                artifact.sha256
            ),
            EncapsulationOutcome::NotApplicable { algorithms, kind } => {
                if algorithms.is_empty() {
                    format!("no algorithm available for {kind} datasets")
                } else {
                    format!("{} cannot process {kind} datasets", algorithms.join(", "))
                }
            }
        }
    }
}

/// Failure of an applicable algorithm, distinct from the not-applicable outcome.
#[derive(Debug, thiserror::Error)]
pub enum EncapsulationError {
    #[error("encapsulation with '{algorithm}' failed: {source}")]
    Failed {
        algorithm: String,
        #[source]
        source: PackagingError,
    },
    #[error("restoring with '{algorithm}' failed: {source}")]
    RestoreFailed {
        algorithm: String,
        #[source]
        source: PackagingError,
    },
}

/// Gates algorithm execution behind the applicability check and moves
/// finished artifacts into the output directory.
///
/// Algorithms write into a staging directory inside `output_dir`; it is
/// removed on drop, so failed runs leave nothing behind. Placement never
/// replaces an existing artifact.
#[derive(Debug, Clone)]
pub struct Encapsulator {
    output_dir: PathBuf,
}

impl Encapsulator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn encapsulate(
        &self,
        dataset: &Dataset,
        algorithm: &dyn EncapsulationAlgorithm,
    ) -> Result<EncapsulationOutcome, EncapsulationError> {
        if !algorithm.supports(dataset.kind) {
            debug!(
                algorithm = algorithm.id(),
                kind = %dataset.kind,
                "algorithm not applicable to dataset"
            );
            return Ok(EncapsulationOutcome::NotApplicable {
                algorithms: vec![algorithm.id().to_string()],
                kind: dataset.kind,
            });
        }

        match self.produce(dataset, algorithm) {
            Ok(artifact) => {
                info!(
                    algorithm = algorithm.id(),
                    path = %artifact.path.display(),
                    "artifact produced"
                );
                Ok(EncapsulationOutcome::Produced(artifact))
            }
            Err(source) => {
                warn!(algorithm = algorithm.id(), error = %source, "encapsulation failed");
                Err(EncapsulationError::Failed {
                    algorithm: algorithm.id().to_string(),
                    source,
                })
            }
        }
    }

    /// Tries ranked algorithms in order, skipping those that cannot process the
    /// dataset. A failure of an applicable algorithm stops the attempt.
    pub fn encapsulate_ranked(
        &self,
        dataset: &Dataset,
        ranking: &[RankedAlgorithm],
    ) -> Result<EncapsulationOutcome, EncapsulationError> {
        let mut refused = Vec::new();
        for ranked in ranking {
            match self.encapsulate(dataset, ranked.algorithm.as_ref())? {
                EncapsulationOutcome::NotApplicable { algorithms, .. } => refused.extend(algorithms),
                produced => return Ok(produced),
            }
        }
        Ok(EncapsulationOutcome::NotApplicable {
            algorithms: refused,
            kind: dataset.kind,
        })
    }

    /// Restores into a staging directory first and only then moves the files
    /// into `restore_dir`; a failed restore leaves `restore_dir` as it was.
    pub fn decapsulate(
        &self,
        artifact: &Path,
        algorithm: &dyn EncapsulationAlgorithm,
        restore_dir: &Path,
    ) -> Result<Vec<PathBuf>, EncapsulationError> {
        let restored = restore(artifact, algorithm, restore_dir).map_err(|source| {
            warn!(algorithm = algorithm.id(), error = %source, "restore failed");
            EncapsulationError::RestoreFailed {
                algorithm: algorithm.id().to_string(),
                source,
            }
        })?;
        info!(
            algorithm = algorithm.id(),
            files = restored.len(),
            "artifact restored"
        );
        Ok(restored)
    }

    fn produce(
        &self,
        dataset: &Dataset,
        algorithm: &dyn EncapsulationAlgorithm,
    ) -> Result<Artifact, PackagingError> {
        fs::create_dir_all(&self.output_dir).map_err(PackagingError::io(&self.output_dir))?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.output_dir)
            .map_err(PackagingError::io(&self.output_dir))?;

        let staged = algorithm.encapsulate(dataset, staging.path())?;
        if !staged.starts_with(staging.path()) {
            return Err(PackagingError::MalformedArtifact(format!(
                "algorithm wrote outside its staging area: {}",
                staged.display()
            )));
        }
        let file_name = staged.file_name().ok_or_else(|| {
            PackagingError::MalformedArtifact(format!("unnamed artifact {}", staged.display()))
        })?;

        let target = self.output_dir.join(file_name);
        let sha256 = digest_path(&staged)?;
        place(&staged, &target)?;

        Ok(Artifact {
            path: target,
            algorithm: algorithm.id().to_string(),
            kind: dataset.kind,
            sha256,
            created_at: Utc::now(),
        })
    }
}

fn restore(
    artifact: &Path,
    algorithm: &dyn EncapsulationAlgorithm,
    restore_dir: &Path,
) -> Result<Vec<PathBuf>, PackagingError> {
    fs::create_dir_all(restore_dir).map_err(PackagingError::io(restore_dir))?;
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(restore_dir)
        .map_err(PackagingError::io(restore_dir))?;

    let staged = algorithm.decapsulate(artifact, staging.path())?;
    let mut placed = Vec::with_capacity(staged.len());
    for file in staged {
        let result = staged_name(&file, staging.path()).and_then(|name| {
            let target = restore_dir.join(name);
            place(&file, &target).map(|()| target)
        });
        match result {
            Ok(target) => placed.push(target),
            Err(err) => {
                for target in &placed {
                    if let Err(cleanup) = fs::remove_file(target) {
                        warn!(
                            path = %target.display(),
                            error = %cleanup,
                            "could not roll back restored file"
                        );
                    }
                }
                return Err(err);
            }
        }
    }
    Ok(placed)
}

fn staged_name<'a>(
    file: &'a Path,
    staging: &Path,
) -> Result<&'a std::ffi::OsStr, PackagingError> {
    file.strip_prefix(staging)
        .ok()
        .filter(|relative| relative.components().count() == 1)
        .and_then(|relative| relative.file_name())
        .ok_or_else(|| {
            PackagingError::MalformedArtifact(format!(
                "algorithm restored outside its staging area: {}",
                file.display()
            ))
        })
}

/// Moves a staged file or directory to `target`, failing with `AlreadyExists`
/// instead of replacing anything found there.
///
/// Files are hard-linked, which refuses an existing target atomically; the
/// staged link goes away with the staging directory. Directories first claim
/// the name with `create_dir`, then rename over the empty claim.
fn place(staged: &Path, target: &Path) -> Result<(), PackagingError> {
    if staged.is_dir() {
        fs::create_dir(target).map_err(|err| claim_error(target, err))?;
        if let Err(source) = fs::rename(staged, target) {
            let _ = fs::remove_dir(target);
            return Err(PackagingError::Io {
                path: target.to_path_buf(),
                source,
            });
        }
    } else {
        fs::hard_link(staged, target).map_err(|err| claim_error(target, err))?;
    }
    Ok(())
}

fn claim_error(target: &Path, source: io::Error) -> PackagingError {
    if source.kind() == io::ErrorKind::AlreadyExists {
        PackagingError::AlreadyExists(target.to_path_buf())
    } else {
        PackagingError::Io {
            path: target.to_path_buf(),
            source,
        }
    }
}
