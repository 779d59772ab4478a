//! Minibatch training of a network against a loss function.

use std::time::{Duration, Instant};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::{
    dataset::{check_width, Sample},
    error::{Error, Result},
    nn::{Network, Var},
    optim::{Method, Optimizer},
};

/// The objective minimized during training.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Loss {
    /// Mean squared error over the output features.
    #[default]
    Regression,
}

impl Loss {
    /// Computes the loss of a prediction against its target.
    #[must_use]
    pub fn compute(self, pred: &[Var], target: &[Var]) -> Var {
        match self {
            Self::Regression => mse(pred, target),
        }
    }
}

fn mse(pred: &[Var], target: &[Var]) -> Var {
    let mut loss = Var::new(0.0);
    for (p, t) in pred.iter().zip(target) {
        let diff = p - t;
        loss = &loss + &(&diff * &diff);
    }
    &loss / &Var::new(target.len().max(1) as f64)
}

/// Settings of a training run.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainConfig {
    /// Number of optimizer steps.
    pub iterations: usize,
    /// Number of samples drawn for each step.
    pub batch_size: usize,
    /// The optimization method.
    pub method: Method,
    /// Log the loss over the full dataset every this many steps; zero disables it.
    pub log_interval: usize,
    /// Seed for minibatch sampling; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            batch_size: 1,
            method: Method::adagrad(0.05),
            log_interval: 0,
            seed: None,
        }
    }
}

/// Summary of a finished training run.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainReport {
    /// Number of optimizer steps taken.
    pub iterations: usize,
    /// Number of samples in each step.
    pub batch_size: usize,
    /// Mean loss over the last minibatch.
    pub loss: f64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Trains `net` on `samples`, updating its weights in place.
///
/// Every step draws `batch_size` samples uniformly at random with replacement, so the batch size
/// may exceed the number of samples.
///
/// # Errors
///
/// Returns [`Error::EmptyDataset`] if there are no samples and [`Error::ShapeMismatch`] if a
/// sample's input or output does not match the network.
pub fn train<N>(
    net: &N,
    samples: &[Sample],
    loss: Loss,
    config: &TrainConfig,
) -> Result<TrainReport>
where
    N: Network + ?Sized,
{
    if samples.is_empty() {
        return Err(Error::EmptyDataset);
    }
    let inputs: Vec<_> = samples.iter().map(|s| s.input.as_slice()).collect();
    let outputs: Vec<_> = samples.iter().map(|s| s.output.as_slice()).collect();
    check_width(&inputs, net.input_size())?;
    check_width(&outputs, net.output_size())?;

    let batch_size = config.batch_size.max(1);
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let parameters = net.parameters();
    let mut optimizer = Optimizer::new(config.method);
    info!(
        iterations = config.iterations,
        batch_size,
        method = %config.method.kind,
        step_size = config.method.step_size,
        parameters = parameters.len(),
        "training started"
    );

    let start = Instant::now();
    let mut last_loss = f64::NAN;
    for iteration in 0..config.iterations {
        let batch: Vec<_> = (0..batch_size)
            .map(|_| &samples[rng.gen_range(0..samples.len())])
            .collect();
        let batch_loss = mean_loss(net, &batch, loss);
        batch_loss.backward();
        optimizer.step(&parameters);
        last_loss = batch_loss.value();

        if config.log_interval != 0 && (iteration + 1) % config.log_interval == 0 {
            let all: Vec<_> = samples.iter().collect();
            let full = mean_loss(net, &all, loss).value();
            debug!(iteration = iteration + 1, loss = full, "training progress");
        }
    }
    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        loss = last_loss,
        "training finished"
    );

    Ok(TrainReport {
        iterations: config.iterations,
        batch_size,
        loss: last_loss,
        elapsed,
    })
}

/// Mean loss over `samples`.
pub fn mean_loss<N>(net: &N, samples: &[&Sample], loss: Loss) -> Var
where
    N: Network + ?Sized,
{
    let mut total = Var::new(0.0);
    for sample in samples {
        let input: Vec<_> = sample.input.iter().copied().map(Var::new).collect();
        let target: Vec<_> = sample.output.iter().copied().map(Var::new).collect();
        let pred = net.forward(&input);
        total = &total + &loss.compute(&pred, &target);
    }
    &total / &Var::new(samples.len().max(1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{Activation, LayerSpec, Mlp};

    fn line_samples() -> Vec<Sample> {
        (0..20)
            .map(|i| {
                let x = f64::from(i) / 20.0;
                Sample {
                    input: vec![x],
                    output: vec![2.0 * x - 0.5],
                }
            })
            .collect()
    }

    #[test]
    fn fits_a_line() {
        let mut rng = StdRng::seed_from_u64(3);
        let net = Mlp::rand(&mut rng, 1, &[LayerSpec::linear(1)]);
        let samples = line_samples();
        let refs: Vec<_> = samples.iter().collect();
        let before = mean_loss(&net, &refs, Loss::Regression).value();
        let config = TrainConfig {
            iterations: 2000,
            batch_size: 5,
            method: Method::sgd(0.1),
            seed: Some(5),
            ..TrainConfig::default()
        };
        let report = train(&net, &samples, Loss::Regression, &config).unwrap();
        let after = mean_loss(&net, &refs, Loss::Regression).value();
        assert_eq!(report.iterations, 2000);
        assert!(after < before);
        assert!(after < 1e-3, "loss after training: {after}");
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let mut rng = StdRng::seed_from_u64(3);
        let net = Mlp::rand(&mut rng, 1, &[LayerSpec::new(1, Activation::Tanh)]);
        let config = TrainConfig {
            iterations: 1,
            batch_size: 0,
            seed: Some(1),
            ..TrainConfig::default()
        };
        let report = train(&net, &line_samples(), Loss::Regression, &config).unwrap();
        assert_eq!(report.batch_size, 1);
        assert!(report.loss.is_finite());
    }

    #[test]
    fn logs_full_dataset_loss_over_many_samples() {
        let mut rng = StdRng::seed_from_u64(3);
        let net = Mlp::rand(&mut rng, 1, &[LayerSpec::linear(1)]);
        let samples: Vec<_> = (0..50_000)
            .map(|i| {
                let x = f64::from(i) / 50_000.0;
                Sample {
                    input: vec![x],
                    output: vec![x],
                }
            })
            .collect();
        let config = TrainConfig {
            iterations: 2,
            batch_size: 4,
            log_interval: 1,
            seed: Some(1),
            ..TrainConfig::default()
        };
        let report = train(&net, &samples, Loss::Regression, &config).unwrap();
        assert_eq!(report.iterations, 2);
        assert!(report.loss.is_finite());
    }

    #[test]
    fn rejects_bad_samples() {
        let mut rng = StdRng::seed_from_u64(3);
        let net = Mlp::rand(&mut rng, 2, &[LayerSpec::linear(1)]);
        let config = TrainConfig::default();
        assert!(matches!(
            train(&net, &[], Loss::Regression, &config),
            Err(Error::EmptyDataset)
        ));
        let bad = [Sample {
            input: vec![1.0],
            output: vec![1.0],
        }];
        assert!(matches!(
            train(&net, &bad, Loss::Regression, &config),
            Err(Error::ShapeMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }
}
