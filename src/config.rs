//! User-facing configuration of an autoencoder and of its training runs.
//!
//! Both structs deserialize from the camelCase keys used in configuration files, e.g.
//!
//! ```json
//! { "nInputs": 9, "nHidden": 2, "activation": "tanh" }
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{error::ConfigError, optim::Method, train::TrainConfig};

/// One layer of an explicitly designed encoder or decoder.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    /// Number of outputs of the layer.
    #[serde(alias = "nOut")]
    pub output_size: usize,
    /// Name of the activation function; no nonlinearity when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<String>,
}

impl LayerConfig {
    /// A layer with the named activation.
    #[must_use]
    pub fn new(output_size: usize, activation: &str) -> Self {
        Self {
            output_size,
            activation: Some(activation.to_string()),
        }
    }

    /// A layer with no nonlinearity.
    #[must_use]
    pub fn linear(output_size: usize) -> Self {
        Self {
            output_size,
            activation: None,
        }
    }
}

/// Construction parameters of an [`Autoencoder`](crate::Autoencoder).
///
/// The topology comes from `encoder`/`decoder` when both are non-empty, and is otherwise derived
/// from `n_inputs`, `n_hidden`, `n_layers` and `activation`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoencoderConfig {
    /// Explicit encoder layers, input side first.
    pub encoder: Vec<LayerConfig>,
    /// Explicit decoder layers, hidden side first.
    pub decoder: Vec<LayerConfig>,
    /// Number of input features.
    pub n_inputs: Option<usize>,
    /// Size of the bottleneck.
    pub n_hidden: Option<usize>,
    /// Number of layers in each of the encoder and the decoder.
    pub n_layers: usize,
    /// Activation of every derived layer except the decoder output.
    pub activation: String,
    /// Whether data is min-max normalized around the networks.
    pub scale: bool,
    /// Seed for weight initialization; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for AutoencoderConfig {
    fn default() -> Self {
        Self {
            encoder: Vec::new(),
            decoder: Vec::new(),
            n_inputs: None,
            n_hidden: None,
            n_layers: 2,
            activation: "relu".to_string(),
            scale: true,
            seed: None,
        }
    }
}

impl AutoencoderConfig {
    /// A configuration whose topology is derived from the input and bottleneck sizes.
    #[must_use]
    pub fn auto(n_inputs: usize, n_hidden: usize) -> Self {
        Self {
            n_inputs: Some(n_inputs),
            n_hidden: Some(n_hidden),
            ..Self::default()
        }
    }

    /// A configuration with explicitly designed encoder and decoder layers.
    #[must_use]
    pub fn explicit(encoder: Vec<LayerConfig>, decoder: Vec<LayerConfig>) -> Self {
        Self {
            encoder,
            decoder,
            ..Self::default()
        }
    }

    /// Sets the number of derived layers per side.
    #[must_use]
    pub fn with_layers(mut self, n_layers: usize) -> Self {
        self.n_layers = n_layers;
        self
    }

    /// Sets the activation of derived layers.
    #[must_use]
    pub fn with_activation(mut self, activation: &str) -> Self {
        self.activation = activation.to_string();
        self
    }

    /// Enables or disables normalization.
    #[must_use]
    pub fn with_scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    /// Fixes the weight initialization seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Options of a call to [`Autoencoder::fit`](crate::Autoencoder::fit).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FitOptions {
    /// Step size of the optimization method.
    pub step_size: f64,
    /// Number of optimizer steps.
    pub iterations: usize,
    /// Samples per step; `round(rows / 50)` when absent.
    pub batch_size: Option<usize>,
    /// Name of the optimization method.
    pub method: String,
    /// Log the full-dataset loss every this many steps; zero disables it.
    pub log_interval: usize,
    /// Seed for minibatch sampling; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            step_size: 0.05,
            iterations: 100,
            batch_size: None,
            method: "adagrad".to_string(),
            log_interval: 0,
            seed: None,
        }
    }
}

impl FitOptions {
    /// Sets the step size.
    #[must_use]
    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    /// Sets the number of optimizer steps.
    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the number of samples per step.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Sets the optimization method by name.
    #[must_use]
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    /// Fixes the minibatch sampling seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Resolves the options into a training configuration for a dataset of `rows` rows.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownMethod`] if the method name does not resolve.
    pub fn train_config(&self, rows: usize) -> Result<TrainConfig, ConfigError> {
        let method = Method::named(&self.method, self.step_size)?;
        let batch_size = self
            .batch_size
            .unwrap_or_else(|| (rows as f64 / 50.0).round() as usize);
        if batch_size == 0 {
            warn!(rows, "batch size rounds to zero, using 1");
        }
        Ok(TrainConfig {
            iterations: self.iterations,
            batch_size: batch_size.max(1),
            method,
            log_interval: self.log_interval,
            seed: self.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AutoencoderConfig::default();
        assert_eq!(config.n_layers, 2);
        assert_eq!(config.activation, "relu");
        assert!(config.scale);

        let train = FitOptions::default().train_config(500).unwrap();
        assert_eq!(train.iterations, 100);
        assert_eq!(train.batch_size, 10);
        assert_eq!(train.method, Method::adagrad(0.05));
    }

    #[test]
    fn batch_size_rounds_half_up_and_never_hits_zero() {
        let options = FitOptions::default();
        assert_eq!(options.train_config(75).unwrap().batch_size, 2);
        assert_eq!(options.train_config(10).unwrap().batch_size, 1);
        assert_eq!(
            options.with_batch_size(7).train_config(10).unwrap().batch_size,
            7
        );
    }

    #[test]
    fn unknown_method_is_a_config_error() {
        let err = FitOptions::default()
            .with_method("newton")
            .train_config(10)
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownMethod("newton".into()));
    }
}
