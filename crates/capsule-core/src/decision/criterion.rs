use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalogue::DEFAULT_CRITERION_VALUE;
use super::DecisionError;

/// Lowest value a criterion accepts.
pub const CRITERION_MIN: u8 = 0;
/// Highest value a criterion accepts.
pub const CRITERION_MAX: u8 = 100;

const _: () = assert!(DEFAULT_CRITERION_VALUE <= CRITERION_MAX);

/// Identifier wrapper for criteria; one per catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriterionId(pub String);

impl CriterionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single decision factor with a bounded value and an activation flag.
#[derive(Debug, Clone, Serialize)]
pub struct Criterion {
    id: CriterionId,
    name: String,
    value: u8,
    active: bool,
}

impl Criterion {
    pub fn new(id: CriterionId, name: impl Into<String>, value: u8) -> Result<Self, DecisionError> {
        check_bounds(value)?;
        Ok(Self {
            id,
            name: name.into(),
            value,
            active: true,
        })
    }

    /// Active criterion at `DEFAULT_CRITERION_VALUE`, which is in range at compile time.
    pub(crate) fn at_default(id: CriterionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            value: DEFAULT_CRITERION_VALUE,
            active: true,
        }
    }

    pub fn id(&self) -> &CriterionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Rejects values outside `CRITERION_MIN..=CRITERION_MAX` and leaves the current value in place.
    pub fn set_value(&mut self, value: u8) -> Result<(), DecisionError> {
        check_bounds(value)?;
        self.value = value;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl PartialEq for Criterion {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Criterion {}

/// Converts raw operator input into a criterion value without clamping.
pub fn validate_value(raw: i64) -> Result<u8, DecisionError> {
    if (i64::from(CRITERION_MIN)..=i64::from(CRITERION_MAX)).contains(&raw) {
        Ok(raw as u8)
    } else {
        Err(DecisionError::OutOfRange {
            value: raw,
            min: CRITERION_MIN,
            max: CRITERION_MAX,
        })
    }
}

fn check_bounds(value: u8) -> Result<(), DecisionError> {
    validate_value(i64::from(value)).map(|_| ())
}
