//! Confidence scoring
//!
//! Table-driven: each link method has a base score which decays linearly
//! with distance across the proximity window.

use std::collections::BTreeMap;

use panlink_core::{
    CandidateRelation, ConfidenceBucket, ConfidenceThresholds, LinkingConfig, PanlinkError, Result,
};

/// Maps (method, distance) to a confidence in [0, 1]
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    base_scores: BTreeMap<String, f32>,
    window_size: usize,
    thresholds: ConfidenceThresholds,
}

impl ConfidenceScorer {
    pub fn new(
        base_scores: BTreeMap<String, f32>,
        window_size: usize,
        thresholds: ConfidenceThresholds,
    ) -> Self {
        Self {
            base_scores,
            window_size,
            thresholds,
        }
    }

    pub fn from_config(config: &LinkingConfig) -> Self {
        Self::new(
            config.method_base_scores.clone(),
            config.window_size,
            config.confidence_thresholds,
        )
    }

    /// Base score configured for `method`
    pub fn base_score(&self, method: &str) -> Result<f32> {
        self.base_scores
            .get(method)
            .copied()
            .ok_or_else(|| PanlinkError::UnknownMethod(method.to_string()))
    }

    /// `base * max(0, 1 - distance / W)`, clamped to [0, 1]
    pub fn score(&self, method: &str, distance: usize) -> Result<f32> {
        let base = self.base_score(method)?;
        let window = self.window_size.max(1) as f32;
        let decay = (1.0 - distance as f32 / window).max(0.0);

        Ok((base * decay).clamp(0.0, 1.0))
    }

    /// Produce a scored copy of `candidate`
    pub fn score_candidate(&self, candidate: CandidateRelation) -> Result<CandidateRelation> {
        let confidence = self.score(&candidate.method, candidate.distance)?;
        Ok(candidate.scored(confidence))
    }

    /// Reporting bucket for a score
    pub fn bucket(&self, confidence: f32) -> ConfidenceBucket {
        ConfidenceBucket::classify(confidence, &self.thresholds)
    }
}
