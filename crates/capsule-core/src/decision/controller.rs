use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use super::catalogue::CriterionCatalogue;
use super::criterion::{Criterion, CriterionId};
use super::mechanism::{DecisionMechanism, RankedAlgorithm};
use super::scenario::{Scenario, ScenarioId};
use super::DecisionError;
use crate::encapsulation::AlgorithmRegistry;

/// Identifier of the scenario created alongside every controller.
pub const START_SCENARIO_ID: &str = "start";
const START_SCENARIO_NAME: &str = "Start scenario";

/// Result of a deletion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Deletion {
    Removed,
    /// The scenario was the last one left and has been kept.
    RefusedLastScenario,
}

struct ControllerState {
    scenarios: Vec<Scenario>,
    next_sequence: u64,
}

impl ControllerState {
    fn position(&self, id: &ScenarioId) -> Result<usize, DecisionError> {
        self.scenarios
            .iter()
            .position(|scenario| scenario.id() == id)
            .ok_or_else(|| DecisionError::ScenarioNotFound(id.clone()))
    }

    fn scenario_mut(&mut self, id: &ScenarioId) -> Result<&mut Scenario, DecisionError> {
        let index = self.position(id)?;
        Ok(&mut self.scenarios[index])
    }

    fn contains(&self, id: &ScenarioId) -> bool {
        self.scenarios.iter().any(|scenario| scenario.id() == id)
    }
}

/// Owns the live scenarios and funnels every mutation through one lock.
///
/// The scenario set is never empty: a start scenario is created on
/// construction and the last remaining scenario cannot be deleted.
/// Callers only ever receive cloned snapshots.
pub struct ScenarioController {
    mechanism: DecisionMechanism,
    catalogue: CriterionCatalogue,
    template: Vec<Criterion>,
    state: Mutex<ControllerState>,
}

impl ScenarioController {
    /// Controller over the standard catalogue.
    pub fn new(mechanism: DecisionMechanism) -> Self {
        let catalogue = CriterionCatalogue::standard();
        let template = CriterionCatalogue::standard_template();
        Self::from_parts(mechanism, catalogue, template)
    }

    /// Builds a controller around a custom catalogue, rejecting duplicate or out-of-range definitions.
    pub fn with_catalogue(
        mechanism: DecisionMechanism,
        catalogue: CriterionCatalogue,
    ) -> Result<Self, DecisionError> {
        catalogue.validate()?;
        let template = catalogue.instantiate()?;
        Ok(Self::from_parts(mechanism, catalogue, template))
    }

    fn from_parts(
        mechanism: DecisionMechanism,
        catalogue: CriterionCatalogue,
        template: Vec<Criterion>,
    ) -> Self {
        let start = Scenario::from_template(
            ScenarioId::new(START_SCENARIO_ID),
            START_SCENARIO_NAME,
            template.clone(),
        );

        Self {
            mechanism,
            catalogue,
            template,
            state: Mutex::new(ControllerState {
                scenarios: vec![start],
                next_sequence: 1,
            }),
        }
    }

    // Every mutation restores the invariants before releasing the guard, so a
    // poisoned lock still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn catalogue(&self) -> &CriterionCatalogue {
        &self.catalogue
    }

    pub fn mechanism(&self) -> &DecisionMechanism {
        &self.mechanism
    }

    pub fn scenarios(&self) -> Vec<Scenario> {
        self.lock().scenarios.clone()
    }

    pub fn scenario_count(&self) -> usize {
        self.lock().scenarios.len()
    }

    pub fn scenario(&self, id: &ScenarioId) -> Result<Scenario, DecisionError> {
        let state = self.lock();
        let index = state.position(id)?;
        Ok(state.scenarios[index].clone())
    }

    pub fn add_scenario(&self, scenario: Scenario) -> Result<(), DecisionError> {
        let mut state = self.lock();
        if state.contains(scenario.id()) {
            warn!(scenario = %scenario.id(), "refusing duplicate scenario id");
            return Err(DecisionError::DuplicateScenario(scenario.id().clone()));
        }
        debug!(scenario = %scenario.id(), "scenario added");
        state.scenarios.push(scenario);
        Ok(())
    }

    /// Creates a scenario with a fresh id and the catalogue defaults.
    pub fn create_new_scenario(&self) -> Scenario {
        let mut state = self.lock();
        let (id, sequence) = loop {
            let sequence = state.next_sequence;
            state.next_sequence += 1;
            let candidate = ScenarioId(format!("scenario-{sequence}"));
            if !state.contains(&candidate) {
                break (candidate, sequence);
            }
        };

        let scenario =
            Scenario::from_template(id, format!("Scenario {sequence}"), self.template.clone());
        debug!(scenario = %scenario.id(), "scenario created");
        state.scenarios.push(scenario.clone());
        scenario
    }

    /// Removes a scenario unless it is the only one left.
    pub fn delete_scenario(&self, id: &ScenarioId) -> Result<Deletion, DecisionError> {
        self.delete_scenario_counted(id).map(|(deletion, _)| deletion)
    }

    /// Like `delete_scenario`, also returning the scenario count observed
    /// under the same lock.
    pub fn delete_scenario_counted(
        &self,
        id: &ScenarioId,
    ) -> Result<(Deletion, usize), DecisionError> {
        let mut state = self.lock();
        let index = state.position(id)?;
        if state.scenarios.len() == 1 {
            debug!(scenario = %id, "kept last remaining scenario");
            return Ok((Deletion::RefusedLastScenario, 1));
        }
        state.scenarios.remove(index);
        debug!(scenario = %id, "scenario deleted");
        Ok((Deletion::Removed, state.scenarios.len()))
    }

    pub fn rename_scenario(
        &self,
        id: &ScenarioId,
        name: impl Into<String>,
    ) -> Result<(), DecisionError> {
        let mut state = self.lock();
        state.scenario_mut(id)?.set_name(name.into());
        Ok(())
    }

    /// Writes the value of a criterion the caller already mutated on a snapshot
    /// back into the owned scenario.
    pub fn update_criterion_value_change(
        &self,
        scenario: &ScenarioId,
        criterion: &Criterion,
    ) -> Result<(), DecisionError> {
        self.set_criterion_value(scenario, criterion.id(), criterion.value())
    }

    pub fn set_criterion_value(
        &self,
        scenario: &ScenarioId,
        criterion: &CriterionId,
        value: u8,
    ) -> Result<(), DecisionError> {
        let mut state = self.lock();
        let owned = state.scenario_mut(scenario)?.criterion_mut(criterion)?;
        owned.set_value(value)?;
        debug!(%scenario, %criterion, value, "criterion value changed");
        Ok(())
    }

    pub fn criterion_activation_change(
        &self,
        scenario: &ScenarioId,
        criterion: &CriterionId,
        active: bool,
    ) -> Result<(), DecisionError> {
        let mut state = self.lock();
        state
            .scenario_mut(scenario)?
            .criterion_mut(criterion)?
            .set_active(active);
        debug!(%scenario, %criterion, active, "criterion activation changed");
        Ok(())
    }

    /// Ranks the registry against a snapshot taken under the lock.
    pub fn rank(
        &self,
        scenario: &ScenarioId,
        registry: &AlgorithmRegistry,
    ) -> Result<Vec<RankedAlgorithm>, DecisionError> {
        let snapshot = self.scenario(scenario)?;
        Ok(self.mechanism.rank(&snapshot, registry.algorithms()))
    }
}

impl Default for ScenarioController {
    fn default() -> Self {
        Self::new(DecisionMechanism::new())
    }
}
