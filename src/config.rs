//! Configuration for the retrieval pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Tunable parameters for [`ContextualRetriever`](crate::retriever::ContextualRetriever).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrieverConfig {
    /// Similarity search fetches `k * oversample_factor` candidates.
    pub oversample_factor: usize,
    /// MMR keeps `k * diversify_factor` of the oversampled candidates.
    pub diversify_factor: usize,
    /// MMR relevance/diversity trade-off in `[0, 1]`; higher favors
    /// relevance.
    pub mmr_lambda: f32,
    /// Optional bound on extension steps per candidate. `None` lets
    /// extension run to its natural fixed point; the bound is a runtime
    /// tunable, not a correctness requirement.
    pub max_extension_steps: Option<usize>,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            oversample_factor: 5,
            diversify_factor: 2,
            mmr_lambda: 0.5,
            max_extension_steps: None,
        }
    }
}

impl RetrieverConfig {
    /// Create a new builder for constructing a [`RetrieverConfig`].
    pub fn builder() -> RetrieverConfigBuilder {
        RetrieverConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RetrieverConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrieverConfigBuilder {
    config: RetrieverConfig,
}

impl RetrieverConfigBuilder {
    /// Set the oversampling factor for the similarity search.
    pub fn oversample_factor(mut self, factor: usize) -> Self {
        self.config.oversample_factor = factor;
        self
    }

    /// Set the diversification factor for MMR selection.
    pub fn diversify_factor(mut self, factor: usize) -> Self {
        self.config.diversify_factor = factor;
        self
    }

    /// Set the MMR relevance/diversity trade-off parameter.
    pub fn mmr_lambda(mut self, lambda: f32) -> Self {
        self.config.mmr_lambda = lambda;
        self
    }

    /// Bound the number of extension steps per candidate.
    pub fn max_extension_steps(mut self, steps: usize) -> Self {
        self.config.max_extension_steps = Some(steps);
        self
    }

    /// Build the [`RetrieverConfig`], validating that parameters are
    /// consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::ConfigError`] if:
    /// - either factor is zero
    /// - `diversify_factor > oversample_factor`
    /// - `mmr_lambda` is outside `[0, 1]`
    pub fn build(self) -> Result<RetrieverConfig> {
        let config = self.config;
        if config.oversample_factor == 0 || config.diversify_factor == 0 {
            return Err(RetrievalError::ConfigError(
                "oversample_factor and diversify_factor must be greater than zero".to_string(),
            ));
        }
        if config.diversify_factor > config.oversample_factor {
            return Err(RetrievalError::ConfigError(format!(
                "diversify_factor ({}) must not exceed oversample_factor ({})",
                config.diversify_factor, config.oversample_factor
            )));
        }
        if !(0.0..=1.0).contains(&config.mmr_lambda) {
            return Err(RetrievalError::ConfigError(format!(
                "mmr_lambda ({}) must be within [0, 1]",
                config.mmr_lambda
            )));
        }
        Ok(config)
    }
}
