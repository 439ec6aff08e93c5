//! Scenario and criterion model, the scoring mechanism, and the controller that
//! keeps the decision context consistent.

pub mod catalogue;
pub mod controller;
pub mod criterion;
pub mod mechanism;
pub mod router;
pub mod scenario;

#[cfg(test)]
mod tests;

pub use catalogue::{CriterionCatalogue, CriterionDefinition, DEFAULT_CRITERION_VALUE};
pub use controller::{Deletion, ScenarioController, START_SCENARIO_ID};
pub use criterion::{validate_value, Criterion, CriterionId, CRITERION_MAX, CRITERION_MIN};
pub use mechanism::{
    DecisionMechanism, RankedAlgorithm, RankingEntryView, Score, ScoreComponent, SUITABILITY_MAX,
};
pub use router::{scenario_router, DecisionState};
pub use scenario::{Scenario, ScenarioId};

/// Failures raised while looking up or mutating decision state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    #[error("criterion value {value} outside {min}..={max}")]
    OutOfRange { value: i64, min: u8, max: u8 },
    #[error("scenario '{0}' not found")]
    ScenarioNotFound(ScenarioId),
    #[error("criterion '{criterion}' not found in scenario '{scenario}'")]
    CriterionNotFound {
        scenario: ScenarioId,
        criterion: CriterionId,
    },
    #[error("scenario '{0}' already exists")]
    DuplicateScenario(ScenarioId),
    #[error("criterion '{0}' defined more than once in catalogue")]
    DuplicateCriterion(CriterionId),
}
