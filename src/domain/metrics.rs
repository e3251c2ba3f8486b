//! Health metric input types for diabetes risk screening.
//!
//! The five screening fields follow the Pima-style intake form used by the
//! remote scoring service.

use serde::{Deserialize, Serialize};

/// The screening features, in canonical declaration order.
///
/// The order matters: validation reports the first failing field in this
/// order, and ranked views break ties by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Number of pregnancies (0-20)
    Pregnancies,
    /// Plasma glucose concentration in mg/dL (0-300)
    Glucose,
    /// Diastolic blood pressure in mmHg (0-200)
    BloodPressure,
    /// Body mass index in kg/m² (10-70)
    Bmi,
    /// Age in years (1-120)
    Age,
}

impl Feature {
    /// All features in canonical order.
    pub const ALL: [Feature; 5] = [
        Feature::Pregnancies,
        Feature::Glucose,
        Feature::BloodPressure,
        Feature::Bmi,
        Feature::Age,
    ];

    /// Wire name of the feature, as the scoring service spells it.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pregnancies => "Pregnancies",
            Self::Glucose => "Glucose",
            Self::BloodPressure => "BloodPressure",
            Self::Bmi => "BMI",
            Self::Age => "Age",
        }
    }

    /// Closed range of accepted values.
    #[must_use]
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Self::Pregnancies => (0.0, 20.0),
            Self::Glucose => (0.0, 300.0),
            Self::BloodPressure => (0.0, 200.0),
            Self::Bmi => (10.0, 70.0),
            Self::Age => (1.0, 120.0),
        }
    }

    /// Position in canonical declaration order.
    #[must_use]
    pub fn canonical_index(&self) -> usize {
        match self {
            Self::Pregnancies => 0,
            Self::Glucose => 1,
            Self::BloodPressure => 2,
            Self::Bmi => 3,
            Self::Age => 4,
        }
    }

    /// Parse a feature from its wire name (case-insensitive).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Validation failure for a candidate input.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing value for {field}")]
    MissingField { field: Feature },

    #[error("{field} value {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: Feature,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// A fully validated set of screening metrics.
///
/// Values are carried as `f64` feature values in model order; the
/// integer-valued fields (pregnancies, age) keep their closed integer
/// ranges through validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    #[serde(rename = "Pregnancies")]
    pub pregnancies: f64,
    #[serde(rename = "Glucose")]
    pub glucose: f64,
    #[serde(rename = "BloodPressure")]
    pub blood_pressure: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "Age")]
    pub age: f64,
}

impl HealthMetrics {
    /// Read a single field by feature.
    #[must_use]
    pub fn value(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Pregnancies => self.pregnancies,
            Feature::Glucose => self.glucose,
            Feature::BloodPressure => self.blood_pressure,
            Feature::Bmi => self.bmi,
            Feature::Age => self.age,
        }
    }

    /// Copy of these metrics with exactly one field replaced.
    #[must_use]
    pub fn with_value(&self, feature: Feature, value: f64) -> Self {
        let mut out = *self;
        match feature {
            Feature::Pregnancies => out.pregnancies = value,
            Feature::Glucose => out.glucose = value,
            Feature::BloodPressure => out.blood_pressure = value,
            Feature::Bmi => out.bmi = value,
            Feature::Age => out.age = value,
        }
        out
    }

    /// Feature vector in canonical order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        Feature::ALL.iter().map(|f| self.value(*f)).collect()
    }

    /// Re-check every field against its closed range.
    ///
    /// Used when a field is overridden after the original validation.
    ///
    /// # Errors
    /// Returns `ValidationError::OutOfRange` for the first field (in
    /// canonical order) outside its bounds. NaN never satisfies a range.
    pub fn check_ranges(&self) -> Result<(), ValidationError> {
        for feature in Feature::ALL {
            let value = self.value(feature);
            let (min, max) = feature.bounds();
            if !(min..=max).contains(&value) {
                return Err(ValidationError::OutOfRange {
                    field: feature,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Candidate input as produced by a form or the command line.
///
/// Every field is optional; `validate` is the only way to obtain a
/// [`HealthMetrics`] from it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsDraft {
    pub pregnancies: Option<f64>,
    pub glucose: Option<f64>,
    pub blood_pressure: Option<f64>,
    pub bmi: Option<f64>,
    pub age: Option<f64>,
}

impl MetricsDraft {
    fn field(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::Pregnancies => self.pregnancies,
            Feature::Glucose => self.glucose,
            Feature::BloodPressure => self.blood_pressure,
            Feature::Bmi => self.bmi,
            Feature::Age => self.age,
        }
    }

    /// Validate the candidate input.
    ///
    /// Checks run in canonical field order: presence first, then ranges.
    /// The first failure wins; nothing here touches the network.
    ///
    /// # Errors
    /// `ValidationError::MissingField` naming the first absent field, or
    /// `ValidationError::OutOfRange` naming the first out-of-bounds field
    /// with its value and allowed bounds.
    pub fn validate(&self) -> Result<HealthMetrics, ValidationError> {
        for feature in Feature::ALL {
            if self.field(feature).is_none() {
                return Err(ValidationError::MissingField { field: feature });
            }
        }

        let metrics = HealthMetrics {
            pregnancies: self.pregnancies.unwrap_or_default(),
            glucose: self.glucose.unwrap_or_default(),
            blood_pressure: self.blood_pressure.unwrap_or_default(),
            bmi: self.bmi.unwrap_or_default(),
            age: self.age.unwrap_or_default(),
        };
        metrics.check_ranges()?;
        Ok(metrics)
    }
}

impl From<HealthMetrics> for MetricsDraft {
    fn from(m: HealthMetrics) -> Self {
        Self {
            pregnancies: Some(m.pregnancies),
            glucose: Some(m.glucose),
            blood_pressure: Some(m.blood_pressure),
            bmi: Some(m.bmi),
            age: Some(m.age),
        }
    }
}
