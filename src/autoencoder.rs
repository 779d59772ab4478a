//! A symmetric encoder/decoder network trained to reconstruct its input.

use std::borrow::Cow;

use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use crate::{
    config::{AutoencoderConfig, FitOptions},
    dataset::{check_width, Dataset, FeatureVector, Sample},
    error::{Error, Result},
    nn::{Mlp, Network, Sequence},
    scaler::MinMaxScaler,
    topology::{self, TopologySpec},
    train::{self, Loss, TrainReport},
};

/// An autoencoder over rows of `n_inputs` features with an `n_hidden` wide bottleneck.
///
/// When scaling is enabled, inputs are min-max normalized before entering the encoder and the
/// decoder's outputs are mapped back to the original feature space. Both directions use the one
/// scaler fitted on the training inputs, so [`Autoencoder::decode`] denormalizes with the input
/// ranges even though it takes hidden-space rows.
///
/// The model is not thread safe. Calls to [`Autoencoder::fit`] take `&mut self`, which serializes
/// them against inference.
#[derive(Debug)]
pub struct Autoencoder {
    n_inputs: usize,
    n_hidden: usize,
    scale: bool,
    topology: TopologySpec,
    scaler: MinMaxScaler,
    encoder: Mlp,
    decoder: Mlp,
    net: Sequence,
    fitted: bool,
}

impl Autoencoder {
    /// Builds an untrained autoencoder with randomly initialized weights.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the topology can't be built from `config`.
    pub fn new(config: &AutoencoderConfig) -> Result<Self> {
        let topology = topology::build(config)?;
        let n_inputs = topology.n_inputs();
        let n_hidden = topology.n_hidden();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let encoder = Mlp::rand(&mut rng, n_inputs, &topology.encoder);
        let decoder = Mlp::rand(&mut rng, n_hidden, &topology.decoder);
        let net = Sequence::new(vec![Box::new(encoder.clone()), Box::new(decoder.clone())]);
        info!(
            n_inputs,
            n_hidden,
            encoder = ?layer_sizes(&encoder),
            decoder = ?layer_sizes(&decoder),
            scale = config.scale,
            "autoencoder built"
        );
        Ok(Self {
            n_inputs,
            n_hidden,
            scale: config.scale,
            topology,
            scaler: MinMaxScaler::new(),
            encoder,
            decoder,
            net,
            fitted: false,
        })
    }

    /// Trains the network to reproduce `x`.
    ///
    /// With scaling enabled the scaler is refitted on `x` first, replacing any earlier ranges.
    /// Weights are updated in place and carry over into later calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] if `x` has no rows, [`Error::ShapeMismatch`] if a row is not
    /// `n_inputs` wide and [`Error::Config`] if the optimization method is unknown. Nothing is
    /// modified on error.
    pub fn fit(&mut self, x: &[FeatureVector], options: &FitOptions) -> Result<TrainReport> {
        if x.is_empty() {
            return Err(Error::EmptyDataset);
        }
        check_width(x, self.n_inputs)?;
        let config = options.train_config(x.len())?;
        let xs = if self.scale {
            self.scaler.fit_transform(x)?
        } else {
            x.to_vec()
        };
        let samples: Vec<_> = xs.into_iter().map(Sample::reconstruction).collect();
        let report = train::train(&self.net, &samples, Loss::Regression, &config)?;
        self.fitted = true;
        Ok(report)
    }

    /// Maps rows of input features to their `n_hidden` wide codes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] before the first fit and [`Error::ShapeMismatch`] if a row is
    /// not `n_inputs` wide.
    pub fn encode(&self, x: &[FeatureVector]) -> Result<Dataset> {
        self.ensure_fitted()?;
        check_width(x, self.n_inputs)?;
        let xs = self.normalize(x)?;
        Ok(eval_rows(&self.encoder, &xs))
    }

    /// Maps `n_hidden` wide codes back to rows of input features.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] before the first fit and [`Error::ShapeMismatch`] if a row is
    /// not `n_hidden` wide.
    pub fn decode(&self, y: &[FeatureVector]) -> Result<Dataset> {
        self.ensure_fitted()?;
        check_width(y, self.n_hidden)?;
        self.denormalize(eval_rows(&self.decoder, y))
    }

    /// Reconstructs rows of input features with a single pass through the full network.
    ///
    /// # Errors
    ///
    /// See [`Autoencoder::encode`].
    pub fn predict(&self, x: &[FeatureVector]) -> Result<Dataset> {
        self.ensure_fitted()?;
        check_width(x, self.n_inputs)?;
        let xs = self.normalize(x)?;
        self.denormalize(eval_rows(&self.net, &xs))
    }

    /// Mean squared difference between each row and its reconstruction, in the original feature
    /// space.
    ///
    /// # Errors
    ///
    /// See [`Autoencoder::encode`].
    pub fn reconstruction_error(&self, x: &[FeatureVector]) -> Result<Vec<f64>> {
        let reconstructed = self.predict(x)?;
        Ok(x
            .iter()
            .zip(&reconstructed)
            .map(|(row, rec)| {
                let sum: f64 = row.iter().zip(rec).map(|(a, b)| (a - b) * (a - b)).sum();
                sum / self.n_inputs as f64
            })
            .collect())
    }

    /// Number of input features.
    #[must_use]
    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    /// Size of the bottleneck.
    #[must_use]
    pub fn n_hidden(&self) -> usize {
        self.n_hidden
    }

    /// Whether data is normalized around the networks.
    #[must_use]
    pub fn scale(&self) -> bool {
        self.scale
    }

    /// Returns true once [`Autoencoder::fit`] has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// The layer schedule the networks were built from.
    #[must_use]
    pub fn topology(&self) -> &TopologySpec {
        &self.topology
    }

    /// The scaler fitted on the training inputs.
    #[must_use]
    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    /// The input-to-code network.
    #[must_use]
    pub fn encoder(&self) -> &Mlp {
        &self.encoder
    }

    /// The code-to-input network.
    #[must_use]
    pub fn decoder(&self) -> &Mlp {
        &self.decoder
    }

    /// The encoder followed by the decoder, sharing their weights.
    #[must_use]
    pub fn net(&self) -> &Sequence {
        &self.net
    }

    fn ensure_fitted(&self) -> Result<()> {
        if self.fitted {
            Ok(())
        } else {
            Err(Error::NotFitted)
        }
    }

    fn normalize<'a>(&self, x: &'a [FeatureVector]) -> Result<Cow<'a, [FeatureVector]>> {
        if self.scale {
            Ok(Cow::Owned(self.scaler.transform(x)?))
        } else {
            Ok(Cow::Borrowed(x))
        }
    }

    fn denormalize(&self, y: Dataset) -> Result<Dataset> {
        if self.scale {
            self.scaler.inverse_transform(&y)
        } else {
            Ok(y)
        }
    }
}

fn eval_rows<N: Network + ?Sized>(net: &N, rows: &[FeatureVector]) -> Dataset {
    rows.iter().map(|row| net.eval(row)).collect()
}

fn layer_sizes(mlp: &Mlp) -> Vec<usize> {
    mlp.specs().iter().map(|s| s.output_size).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerConfig;

    fn rows() -> Dataset {
        vec![
            vec![1.0, -10.0, 8.0, 0.5],
            vec![4.0, 9.0, 8.0, 0.25],
            vec![6.0, 7.0, 8.0, 0.75],
        ]
    }

    #[test]
    fn networks_follow_the_topology() {
        let config = AutoencoderConfig::auto(9, 2).with_layers(4).with_seed(1);
        let ae = Autoencoder::new(&config).unwrap();
        assert_eq!(ae.encoder().input_size(), 9);
        assert_eq!(ae.encoder().specs(), ae.topology().encoder);
        assert_eq!(ae.decoder().input_size(), 2);
        assert_eq!(ae.decoder().specs(), ae.topology().decoder);
        assert_eq!(ae.net().input_size(), 9);
        assert_eq!(ae.net().output_size(), 9);
        assert_eq!(
            ae.net().parameters().len(),
            ae.encoder().parameters().len() + ae.decoder().parameters().len()
        );
    }

    #[test]
    fn inference_before_fit_fails() {
        let ae = Autoencoder::new(&AutoencoderConfig::auto(4, 2).with_seed(1)).unwrap();
        assert!(!ae.is_fitted());
        assert!(matches!(ae.encode(&rows()), Err(Error::NotFitted)));
        assert!(matches!(ae.decode(&[vec![0.0, 0.0]]), Err(Error::NotFitted)));
        assert!(matches!(ae.predict(&rows()), Err(Error::NotFitted)));

        let config = AutoencoderConfig::auto(4, 2).with_scale(false).with_seed(1);
        let unscaled = Autoencoder::new(&config).unwrap();
        assert!(matches!(unscaled.predict(&rows()), Err(Error::NotFitted)));
    }

    #[test]
    fn fit_refits_the_scaler() {
        let mut ae = Autoencoder::new(&AutoencoderConfig::auto(4, 2).with_seed(1)).unwrap();
        let options = FitOptions::default().with_iterations(2).with_seed(2);
        ae.fit(&rows(), &options).unwrap();
        assert_eq!(ae.scaler().min(), Some(&[1.0, -10.0, 8.0, 0.25][..]));
        ae.fit(&[vec![0.0; 4], vec![2.0; 4]], &options).unwrap();
        assert_eq!(ae.scaler().min(), Some(&[0.0; 4][..]));
        assert_eq!(ae.scaler().max(), Some(&[2.0; 4][..]));
    }

    #[test]
    fn unscaled_model_leaves_the_scaler_empty() {
        let config = AutoencoderConfig::auto(4, 2).with_scale(false).with_seed(1);
        let mut ae = Autoencoder::new(&config).unwrap();
        ae.fit(&rows(), &FitOptions::default().with_iterations(2).with_seed(2))
            .unwrap();
        assert!(!ae.scaler().is_fitted());
        let codes = ae.encode(&rows()).unwrap();
        assert_eq!(codes, eval_rows(ae.encoder(), &rows()));
    }

    #[test]
    fn fit_errors_leave_the_model_untouched() {
        let mut ae = Autoencoder::new(&AutoencoderConfig::auto(4, 2).with_seed(1)).unwrap();
        assert!(matches!(
            ae.fit(&[], &FitOptions::default()),
            Err(Error::EmptyDataset)
        ));
        assert!(matches!(
            ae.fit(&[vec![1.0, 2.0]], &FitOptions::default()),
            Err(Error::ShapeMismatch { expected: 4, .. })
        ));
        let err = ae
            .fit(&rows(), &FitOptions::default().with_method("bfgs"))
            .unwrap_err();
        assert!(err.is_config());
        assert!(!ae.is_fitted());
        assert!(!ae.scaler().is_fitted());
    }

    #[test]
    fn explicit_layers_set_sizes() {
        let config = AutoencoderConfig::explicit(
            vec![LayerConfig::new(3, "tanh"), LayerConfig::new(1, "sigmoid")],
            vec![LayerConfig::new(3, "tanh"), LayerConfig::linear(4)],
        );
        let ae = Autoencoder::new(&config.with_seed(3)).unwrap();
        assert_eq!((ae.n_inputs(), ae.n_hidden()), (4, 1));
        assert!(ae.scale());
    }
}
