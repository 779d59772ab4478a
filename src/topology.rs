//! Derivation of the encoder and decoder layer schedules.

use crate::{
    config::{AutoencoderConfig, LayerConfig},
    error::ConfigError,
    nn::{Activation, LayerSpec},
};

/// The layers of both halves of an autoencoder.
///
/// The last encoder layer has `n_hidden` outputs and the last decoder layer has `n_inputs`
/// outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopologySpec {
    /// Encoder layers, input side first.
    pub encoder: Vec<LayerSpec>,
    /// Decoder layers, hidden side first.
    pub decoder: Vec<LayerSpec>,
}

impl TopologySpec {
    /// Number of input features, the output size of the last decoder layer.
    #[must_use]
    pub fn n_inputs(&self) -> usize {
        self.decoder.last().map_or(0, |l| l.output_size)
    }

    /// Size of the bottleneck, the output size of the last encoder layer.
    #[must_use]
    pub fn n_hidden(&self) -> usize {
        self.encoder.last().map_or(0, |l| l.output_size)
    }
}

/// Builds the topology described by `config`.
///
/// Explicit encoder and decoder layers take precedence when both are non-empty. Otherwise the
/// layers are derived with [`derive`] from `n_inputs` and `n_hidden`.
///
/// # Errors
///
/// Returns [`ConfigError::InsufficientParameters`] if neither form is complete, and the errors
/// of [`explicit`] and [`derive`].
pub fn build(config: &AutoencoderConfig) -> Result<TopologySpec, ConfigError> {
    if !config.encoder.is_empty() && !config.decoder.is_empty() {
        return explicit(&config.encoder, &config.decoder);
    }
    match (config.n_inputs, config.n_hidden) {
        (Some(n_inputs), Some(n_hidden)) if n_inputs > 0 && n_hidden > 0 => {
            let activation = config.activation.parse()?;
            derive(n_inputs, n_hidden, config.n_layers, activation)
        }
        _ => Err(ConfigError::InsufficientParameters),
    }
}

/// Resolves explicitly designed layers. Intermediate sizes are taken as given.
///
/// # Errors
///
/// Returns [`ConfigError::InsufficientParameters`] if either side is empty,
/// [`ConfigError::UnknownActivation`] for an unresolvable activation name and
/// [`ConfigError::EmptyLayer`] for a layer with no outputs.
pub fn explicit(
    encoder: &[LayerConfig],
    decoder: &[LayerConfig],
) -> Result<TopologySpec, ConfigError> {
    if encoder.is_empty() || decoder.is_empty() {
        return Err(ConfigError::InsufficientParameters);
    }
    Ok(TopologySpec {
        encoder: resolve(encoder)?,
        decoder: resolve(decoder)?,
    })
}

fn resolve(layers: &[LayerConfig]) -> Result<Vec<LayerSpec>, ConfigError> {
    layers
        .iter()
        .enumerate()
        .map(|(index, layer)| {
            if layer.output_size == 0 {
                return Err(ConfigError::EmptyLayer { index });
            }
            let activation = match &layer.activation {
                Some(name) => name.parse()?,
                None => Activation::Identity,
            };
            Ok(LayerSpec::new(layer.output_size, activation))
        })
        .collect()
}

/// Derives `n_layers` encoder layers shrinking from `n_inputs` to `n_hidden`, and a mirrored
/// decoder growing back.
///
/// Layer `i` of the encoder has `n_inputs - round((i + 1) * (n_inputs - n_hidden) / n_layers)`
/// outputs and layer `i` of the decoder has `n_hidden + round(...)` of the same quantity. Halves
/// round up, towards positive infinity, also when the model is overcomplete and the quantity is
/// negative. Each size is rounded on its own, so neighbouring layers can end up the same size.
/// Every layer uses `activation` except the last decoder layer, which is linear.
///
/// # Errors
///
/// Returns [`ConfigError::InsufficientParameters`] if any argument is zero.
pub fn derive(
    n_inputs: usize,
    n_hidden: usize,
    n_layers: usize,
    activation: Activation,
) -> Result<TopologySpec, ConfigError> {
    if n_inputs == 0 || n_hidden == 0 || n_layers == 0 {
        return Err(ConfigError::InsufficientParameters);
    }
    let span = n_inputs as f64 - n_hidden as f64;
    let mut encoder = Vec::with_capacity(n_layers);
    let mut decoder = Vec::with_capacity(n_layers);
    for i in 0..n_layers {
        let step = ((i + 1) as f64 * span / n_layers as f64 + 0.5).floor();
        let encoder_size = (n_inputs as f64 - step) as usize;
        let decoder_size = (n_hidden as f64 + step) as usize;
        let decoder_activation = if i + 1 < n_layers {
            activation
        } else {
            Activation::Identity
        };
        encoder.push(LayerSpec::new(encoder_size, activation));
        decoder.push(LayerSpec::new(decoder_size, decoder_activation));
    }
    Ok(TopologySpec { encoder, decoder })
}
