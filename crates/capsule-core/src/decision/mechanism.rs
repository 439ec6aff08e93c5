use std::sync::Arc;

use serde::Serialize;

use super::criterion::{CriterionId, CRITERION_MAX};
use super::scenario::Scenario;
use crate::encapsulation::{DatasetKind, EncapsulationAlgorithm};

/// Highest suitability an algorithm may declare for a criterion.
pub const SUITABILITY_MAX: u8 = 100;

/// Stateless scorer ranking algorithms against a scenario's active criteria.
///
/// The score of an algorithm is the sum of `value * suitability` over the
/// active criteria only. Ranking is a stable sort on that score, so ties keep
/// the order in which the algorithms were supplied.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionMechanism;

impl DecisionMechanism {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, scenario: &Scenario, algorithm: &dyn EncapsulationAlgorithm) -> Score {
        let components: Vec<ScoreComponent> = scenario
            .active_criteria()
            .map(|criterion| {
                let suitability = algorithm.suitability(criterion.id());
                ScoreComponent {
                    criterion: criterion.id().clone(),
                    value: criterion.value(),
                    suitability,
                    contribution: u64::from(criterion.value()) * u64::from(suitability),
                }
            })
            .collect();

        Score {
            total: components.iter().map(|component| component.contribution).sum(),
            active_criteria: components.len(),
            components,
        }
    }

    pub fn rank(
        &self,
        scenario: &Scenario,
        algorithms: &[Arc<dyn EncapsulationAlgorithm>],
    ) -> Vec<RankedAlgorithm> {
        let mut ranking: Vec<RankedAlgorithm> = algorithms
            .iter()
            .map(|algorithm| RankedAlgorithm {
                algorithm: Arc::clone(algorithm),
                score: self.score(scenario, algorithm.as_ref()),
            })
            .collect();

        // `sort_by` is stable; equal totals stay in registration order.
        ranking.sort_by(|left, right| right.score.total.cmp(&left.score.total));
        ranking
    }

    /// Highest ranked algorithm that declares support for `kind`.
    pub fn best_applicable(
        &self,
        scenario: &Scenario,
        algorithms: &[Arc<dyn EncapsulationAlgorithm>],
        kind: DatasetKind,
    ) -> Option<RankedAlgorithm> {
        self.rank(scenario, algorithms)
            .into_iter()
            .find(|ranked| ranked.algorithm.supports(kind))
    }
}

/// Discrete contribution of one active criterion, kept for audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreComponent {
    pub criterion: CriterionId,
    pub value: u8,
    pub suitability: u8,
    pub contribution: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Score {
    pub total: u64,
    pub active_criteria: usize,
    pub components: Vec<ScoreComponent>,
}

impl Score {
    /// Share of the best achievable total over the active criteria, in `0.0..=1.0`.
    pub fn normalized(&self) -> f64 {
        if self.active_criteria == 0 {
            return 0.0;
        }
        let ceiling =
            self.active_criteria as f64 * f64::from(CRITERION_MAX) * f64::from(SUITABILITY_MAX);
        self.total as f64 / ceiling
    }
}

#[derive(Debug, Clone)]
pub struct RankedAlgorithm {
    pub algorithm: Arc<dyn EncapsulationAlgorithm>,
    pub score: Score,
}

impl RankedAlgorithm {
    pub fn view(&self) -> RankingEntryView {
        RankingEntryView {
            algorithm_id: self.algorithm.id().to_string(),
            algorithm_name: self.algorithm.name().to_string(),
            supported_kinds: self.algorithm.supported_kinds().to_vec(),
            score: self.score.total,
            normalized: self.score.normalized(),
            components: self.score.components.clone(),
        }
    }
}

/// Serializable projection of a ranking entry for API and CLI output.
#[derive(Debug, Clone, Serialize)]
pub struct RankingEntryView {
    pub algorithm_id: String,
    pub algorithm_name: String,
    pub supported_kinds: Vec<DatasetKind>,
    pub score: u64,
    pub normalized: f64,
    pub components: Vec<ScoreComponent>,
}
