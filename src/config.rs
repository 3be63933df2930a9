//! Configuration for the staged fitting pipeline.
//!
//! The configuration system is designed to be:
//! - **Serializable** - Load/save configurations from TOML or JSON files
//! - **Validated** - Degenerate budgets are rejected at construction time
//! - **Defaulted** - Sensible defaults work for small experiments
//!
//! # Budgets
//!
//! Two budgets drive the staged fit:
//!
//! | Parameter | Default | Description |
//! |-----------|---------|-------------|
//! | `component_budget` | 100 | Raw samples buffered before the kernel approximator fits |
//! | `sample_budget` | 1000 | Transformed samples buffered before the classifier fits |
//! | `num_classes` | 10 | Number of output classes |
//!
//! The component budget is capped by the sample budget: fitting the
//! approximator from more landmarks than the classifier will ever see adds
//! nothing, so the effective threshold is
//! `min(component_budget, sample_budget)`.
//!
//! # Example
//!
//! ```rust
//! use staged_fit_pipeline_rs::config::PipelineConfig;
//!
//! // Using defaults
//! let config = PipelineConfig::default();
//!
//! // Using the builder
//! let config = PipelineConfig::builder()
//!     .component_budget(50)
//!     .sample_budget(500)
//!     .num_classes(10)
//!     .build();
//!
//! // Loading from a file
//! // let config = PipelineConfig::from_file("pipeline.toml")?;
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

/// Configuration for a [`StagedFitPipeline`](crate::StagedFitPipeline).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Target number of raw samples to buffer before fitting the kernel
    /// approximator.
    ///
    /// The fit uses the *entire* buffer at the moment the threshold is
    /// crossed, so the landmark set may overshoot this value when the
    /// crossing batch is larger than the remaining budget.
    #[serde(default = "default_component_budget")]
    pub component_budget: usize,

    /// Target number of transformed samples to buffer before fitting the
    /// final classifier.
    ///
    /// Also caps the label buffer: labels arriving beyond this count are
    /// silently dropped (and counted).
    #[serde(default = "default_sample_budget")]
    pub sample_budget: usize,

    /// Number of output classes.
    ///
    /// Determines the width of every prediction, including the cold-start
    /// placeholder distributions emitted before the classifier is fit.
    #[serde(default = "default_num_classes")]
    pub num_classes: usize,

    /// Whether to collect ingestion and fit metrics.
    ///
    /// Counter updates only; overhead is negligible.
    #[serde(default = "default_collect_metrics")]
    pub collect_metrics: bool,
}

// Default value functions for serde
fn default_component_budget() -> usize {
    100
}
fn default_sample_budget() -> usize {
    1000
}
fn default_num_classes() -> usize {
    10
}
fn default_collect_metrics() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            component_budget: default_component_budget(),
            sample_budget: default_sample_budget(),
            num_classes: default_num_classes(),
            collect_metrics: default_collect_metrics(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the file cannot be read or
    /// parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| PipelineError::Config {
            detail: format!("failed to read config file: {e}"),
        })?;
        toml::from_str(&content).map_err(|e| PipelineError::Config {
            detail: format!("failed to parse config file: {e}"),
        })
    }

    /// The threshold at which the kernel approximator actually fits.
    ///
    /// Buffering more landmarks than the classifier's sample budget is
    /// pointless, so the configured component budget is capped by it.
    #[must_use]
    pub fn effective_component_budget(&self) -> usize {
        self.component_budget.min(self.sample_budget)
    }

    /// Validates the configuration.
    ///
    /// Run at pipeline construction so that a budget which can never trigger
    /// a fit is reported immediately instead of manifesting as a pipeline
    /// that collects forever.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DegenerateBudget`] if any budget or the
    /// class count is zero.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.sample_budget == 0 {
            return Err(PipelineError::DegenerateBudget {
                detail: "sample_budget is zero; the classifier fit can never trigger".to_string(),
            });
        }
        if self.component_budget == 0 {
            return Err(PipelineError::DegenerateBudget {
                detail: "component_budget is zero; the kernel approximator fit can never trigger"
                    .to_string(),
            });
        }
        if self.num_classes == 0 {
            return Err(PipelineError::DegenerateBudget {
                detail: "num_classes is zero; predictions would be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    component_budget: Option<usize>,
    sample_budget: Option<usize>,
    num_classes: Option<usize>,
    collect_metrics: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Sets the raw-sample threshold for the kernel approximator fit.
    #[must_use]
    pub fn component_budget(mut self, budget: usize) -> Self {
        self.component_budget = Some(budget);
        self
    }

    /// Sets the transformed-sample threshold for the classifier fit.
    #[must_use]
    pub fn sample_budget(mut self, budget: usize) -> Self {
        self.sample_budget = Some(budget);
        self
    }

    /// Sets the number of output classes.
    #[must_use]
    pub fn num_classes(mut self, classes: usize) -> Self {
        self.num_classes = Some(classes);
        self
    }

    /// Enables or disables metrics collection.
    #[must_use]
    pub fn collect_metrics(mut self, collect: bool) -> Self {
        self.collect_metrics = Some(collect);
        self
    }

    /// Builds the configuration, filling unset fields with defaults.
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            component_budget: self.component_budget.unwrap_or(defaults.component_budget),
            sample_budget: self.sample_budget.unwrap_or(defaults.sample_budget),
            num_classes: self.num_classes.unwrap_or(defaults.num_classes),
            collect_metrics: self.collect_metrics.unwrap_or(defaults.collect_metrics),
        }
    }
}
