use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::decision::catalogue::{CARRIER_AUTHENTICITY, CARRIER_PROCESSABILITY};
use crate::decision::{
    CriterionCatalogue, CriterionDefinition, CriterionId, DecisionMechanism, Scenario,
    ScenarioController, ScenarioId,
};
use crate::encapsulation::{
    AlgorithmRegistry, Dataset, DatasetKind, EncapsulationAlgorithm, PackagingError,
};

/// Algorithm stub with fixed ratings; packaging is never exercised here.
#[derive(Debug)]
pub(super) struct RatedAlgorithm {
    pub(super) id: String,
    pub(super) kinds: Vec<DatasetKind>,
    pub(super) ratings: BTreeMap<CriterionId, u8>,
}

impl RatedAlgorithm {
    pub(super) fn new(id: &str, kinds: &[DatasetKind], ratings: &[(&str, u8)]) -> Self {
        Self {
            id: id.to_string(),
            kinds: kinds.to_vec(),
            ratings: ratings
                .iter()
                .map(|(criterion, rating)| (CriterionId::new(*criterion), *rating))
                .collect(),
        }
    }
}

impl EncapsulationAlgorithm for RatedAlgorithm {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn supported_kinds(&self) -> &[DatasetKind] {
        &self.kinds
    }

    fn suitability(&self, criterion: &CriterionId) -> u8 {
        self.ratings.get(criterion).copied().unwrap_or(0)
    }

    fn encapsulate(&self, _dataset: &Dataset, _staging: &Path) -> Result<PathBuf, PackagingError> {
        Err(PackagingError::MalformedArtifact("stub".to_string()))
    }

    fn decapsulate(
        &self,
        _artifact: &Path,
        _restore_dir: &Path,
    ) -> Result<Vec<PathBuf>, PackagingError> {
        Ok(Vec::new())
    }
}

pub(super) fn processability() -> CriterionId {
    CriterionId::new(CARRIER_PROCESSABILITY)
}

pub(super) fn authenticity() -> CriterionId {
    CriterionId::new(CARRIER_AUTHENTICITY)
}

/// Two-criterion catalogue keeping score arithmetic easy to follow.
pub(super) fn small_catalogue() -> CriterionCatalogue {
    CriterionCatalogue {
        version: 1,
        definitions: vec![
            CriterionDefinition {
                id: processability(),
                name: "carrier processability".to_string(),
                default_value: 50,
                default_active: true,
            },
            CriterionDefinition {
                id: authenticity(),
                name: "carrier authenticity".to_string(),
                default_value: 50,
                default_active: true,
            },
        ],
    }
}

pub(super) fn small_scenario(id: &str) -> Scenario {
    Scenario::from_catalogue(ScenarioId::new(id), id, &small_catalogue()).expect("valid catalogue")
}

/// `embedder` favours processability, `archiver` favours authenticity.
pub(super) fn candidates() -> Vec<Arc<dyn EncapsulationAlgorithm>> {
    vec![
        Arc::new(RatedAlgorithm::new(
            "embedder",
            &[DatasetKind::Pdf],
            &[(CARRIER_PROCESSABILITY, 90), (CARRIER_AUTHENTICITY, 10)],
        )),
        Arc::new(RatedAlgorithm::new(
            "archiver",
            &DatasetKind::ALL,
            &[(CARRIER_PROCESSABILITY, 20), (CARRIER_AUTHENTICITY, 80)],
        )),
    ]
}

pub(super) fn registry() -> AlgorithmRegistry {
    let catalogue = small_catalogue();
    let mut registry = AlgorithmRegistry::new();
    for algorithm in candidates() {
        registry
            .register(algorithm, &catalogue)
            .expect("candidates register");
    }
    registry
}

pub(super) fn controller() -> ScenarioController {
    ScenarioController::new(DecisionMechanism::new())
}

pub(super) fn small_controller() -> ScenarioController {
    ScenarioController::with_catalogue(DecisionMechanism::new(), small_catalogue())
        .expect("valid catalogue")
}

pub(super) fn ranked_ids(ranking: &[crate::decision::RankedAlgorithm]) -> Vec<String> {
    ranking
        .iter()
        .map(|entry| entry.algorithm.id().to_string())
        .collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
