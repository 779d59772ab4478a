//! A symmetric autoencoder for tabular numeric data.
//!
//! The encoder and decoder layer schedules are either derived from the input and bottleneck
//! sizes or given explicitly. Data is min-max normalized on the way in and mapped back on the way
//! out, and training runs minibatch gradient descent on a scalar reverse mode autodiff engine.
//!
//! ```no_run
//! use autoencoder::{Autoencoder, AutoencoderConfig, FitOptions};
//!
//! let rows = vec![vec![1.0, -10.0, 8.0], vec![4.0, 9.0, 8.0], vec![6.0, 7.0, 8.0]];
//! let mut ae = Autoencoder::new(&AutoencoderConfig::auto(3, 1))?;
//! ae.fit(&rows, &FitOptions::default())?;
//! let codes = ae.encode(&rows)?;
//! let reconstructed = ae.decode(&codes)?;
//! # Ok::<(), autoencoder::Error>(())
//! ```

#![deny(unsafe_code, rust_2018_idioms, rust_2021_compatibility)]
#![warn(missing_docs)]

pub mod autoencoder;
pub mod config;
pub mod dataset;
pub mod error;
pub mod nn;
pub mod optim;
pub mod scaler;
pub mod topology;
pub mod train;

pub use crate::{
    autoencoder::Autoencoder,
    config::{AutoencoderConfig, FitOptions, LayerConfig},
    dataset::{Dataset, FeatureVector},
    error::{ConfigError, Error, Result},
    scaler::MinMaxScaler,
    topology::TopologySpec,
};
