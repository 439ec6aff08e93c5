use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::criterion::{validate_value, Criterion, CriterionId};
use super::DecisionError;

/// Default value assigned to every catalogue criterion.
pub const DEFAULT_CRITERION_VALUE: u8 = 50;

pub const CARRIER_PROCESSABILITY: &str = "carrier_processability";
pub const CARRIER_RESTORABILITY: &str = "carrier_restorability";
pub const PAYLOAD_RESTORABILITY: &str = "payload_restorability";
pub const CARRIER_AUTHENTICITY: &str = "carrier_authenticity";
pub const PAYLOAD_AUTHENTICITY: &str = "payload_authenticity";
pub const VISIBILITY: &str = "visibility";
pub const DETECTABILITY: &str = "detectability";
pub const STANDARD_COMPLIANCE: &str = "standard_compliance";
pub const COMPRESSION: &str = "compression";
pub const VELOCITY: &str = "velocity";

/// Template for one criterion attached to every new scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionDefinition {
    pub id: CriterionId,
    pub name: String,
    pub default_value: u8,
    #[serde(default = "default_active")]
    pub default_active: bool,
}

fn default_active() -> bool {
    true
}

impl CriterionDefinition {
    fn standard(id: &str, name: &str) -> Self {
        Self {
            id: CriterionId::new(id),
            name: name.to_string(),
            default_value: DEFAULT_CRITERION_VALUE,
            default_active: true,
        }
    }

    pub fn instantiate(&self) -> Result<Criterion, DecisionError> {
        let mut criterion = Criterion::new(self.id.clone(), self.name.clone(), self.default_value)?;
        criterion.set_active(self.default_active);
        Ok(criterion)
    }
}

/// Versioned list of criterion definitions injected into scenario construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionCatalogue {
    pub version: u32,
    pub definitions: Vec<CriterionDefinition>,
}

impl CriterionCatalogue {
    /// Preservation criteria shipped with the advisor.
    pub fn standard() -> Self {
        Self {
            version: 1,
            definitions: vec![
                CriterionDefinition::standard(CARRIER_PROCESSABILITY, "carrier processability"),
                CriterionDefinition::standard(CARRIER_RESTORABILITY, "carrier restorability"),
                CriterionDefinition::standard(PAYLOAD_RESTORABILITY, "payload restorability"),
                CriterionDefinition::standard(CARRIER_AUTHENTICITY, "carrier authenticity"),
                CriterionDefinition::standard(PAYLOAD_AUTHENTICITY, "payload authenticity"),
                CriterionDefinition::standard(VISIBILITY, "visibility"),
                CriterionDefinition::standard(DETECTABILITY, "detectability"),
                CriterionDefinition::standard(STANDARD_COMPLIANCE, "standard compliance"),
                CriterionDefinition::standard(COMPRESSION, "compression"),
                CriterionDefinition::standard(VELOCITY, "encapsulation velocity"),
            ],
        }
    }

    /// Criteria of `standard()`, which uses unique ids and the default value throughout.
    pub(crate) fn standard_template() -> Vec<Criterion> {
        Self::standard()
            .definitions
            .into_iter()
            .map(|definition| Criterion::at_default(definition.id, definition.name))
            .collect()
    }

    /// Checks ids are unique and defaults are in range.
    pub fn validate(&self) -> Result<(), DecisionError> {
        let mut seen = BTreeSet::new();
        for definition in &self.definitions {
            if !seen.insert(&definition.id) {
                return Err(DecisionError::DuplicateCriterion(definition.id.clone()));
            }
            validate_value(i64::from(definition.default_value))?;
        }
        Ok(())
    }

    pub fn instantiate(&self) -> Result<Vec<Criterion>, DecisionError> {
        self.definitions
            .iter()
            .map(CriterionDefinition::instantiate)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for CriterionCatalogue {
    fn default() -> Self {
        Self::standard()
    }
}
