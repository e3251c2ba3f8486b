//! What-if delta engine: single-field counterfactual probes.

use std::sync::Arc;

use crate::domain::{Feature, HealthMetrics, Prediction, WhatIfScenario};
use crate::ports::ScoringService;
use crate::Result;

/// Service evaluating what-if scenarios against the session baseline.
pub struct WhatIfService<C: ScoringService> {
    client: Arc<C>,
}

impl<C: ScoringService> WhatIfService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Re-score the baseline with exactly one field overridden and
    /// compute the signed probability delta.
    ///
    /// The modified input is validated locally first; an out-of-range
    /// override never reaches the network. The delta is
    /// `modified probability − baseline probability`: negative means the
    /// override lowers the diabetes probability, positive means it raises
    /// it. Downstream improvement/worsening classification must follow
    /// this sign.
    ///
    /// # Errors
    /// `GlycoscopeError::Validation` if the override leaves the allowed
    /// range; `GlycoscopeError::Scoring` if the remote probe fails.
    pub fn evaluate(
        &self,
        baseline_input: &HealthMetrics,
        baseline_result: &Prediction,
        feature: Feature,
        new_value: f64,
    ) -> Result<WhatIfScenario> {
        let modified_input = baseline_input.with_value(feature, new_value);
        modified_input.check_ranges()?;

        let outcome = self.client.what_if(baseline_input, feature, new_value)?;
        let probability_delta = outcome.modified_probability - baseline_result.probability;

        tracing::debug!(
            "What-if {}={}: probability {:.4} -> {:.4} ({:+.4})",
            feature,
            new_value,
            baseline_result.probability,
            outcome.modified_probability,
            probability_delta
        );

        Ok(WhatIfScenario {
            baseline_input: *baseline_input,
            feature,
            override_value: new_value,
            baseline: *baseline_result,
            modified_classification: outcome.modified_classification,
            modified_probability: outcome.modified_probability,
            probability_delta,
        })
    }
}
