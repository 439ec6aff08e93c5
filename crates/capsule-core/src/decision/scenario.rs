use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalogue::CriterionCatalogue;
use super::criterion::{Criterion, CriterionId};
use super::DecisionError;

/// Identifier wrapper for scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScenarioId(pub String);

impl ScenarioId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named decision context holding one criterion per catalogue definition.
///
/// A scenario only stores criteria; scoring lives in the decision mechanism.
#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    id: ScenarioId,
    name: String,
    criteria: Vec<Criterion>,
}

impl Scenario {
    pub fn from_catalogue(
        id: ScenarioId,
        name: impl Into<String>,
        catalogue: &CriterionCatalogue,
    ) -> Result<Self, DecisionError> {
        catalogue.validate()?;
        Ok(Self::from_template(id, name, catalogue.instantiate()?))
    }

    /// Builds a scenario from criteria already checked for unique ids.
    pub(crate) fn from_template(
        id: ScenarioId,
        name: impl Into<String>,
        criteria: Vec<Criterion>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            criteria,
        }
    }

    pub fn id(&self) -> &ScenarioId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn active_criteria(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter().filter(|criterion| criterion.is_active())
    }

    pub fn criterion(&self, id: &CriterionId) -> Result<&Criterion, DecisionError> {
        self.criteria
            .iter()
            .find(|criterion| criterion.id() == id)
            .ok_or_else(|| self.missing(id))
    }

    pub fn criterion_mut(&mut self, id: &CriterionId) -> Result<&mut Criterion, DecisionError> {
        let scenario = self.id.clone();
        self.criteria
            .iter_mut()
            .find(|criterion| criterion.id() == id)
            .ok_or_else(|| DecisionError::CriterionNotFound {
                scenario,
                criterion: id.clone(),
            })
    }

    fn missing(&self, id: &CriterionId) -> DecisionError {
        DecisionError::CriterionNotFound {
            scenario: self.id.clone(),
            criterion: id.clone(),
        }
    }
}
