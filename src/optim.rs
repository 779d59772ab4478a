//! Gradient-based optimization methods.

use std::{fmt, str::FromStr};

use crate::{error::ConfigError, nn::Var};

const EPSILON: f64 = 1e-8;
const RMSPROP_DECAY: f64 = 0.9;
const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;

/// The family of update rule used by an optimizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// Plain stochastic gradient descent.
    Sgd,
    /// Per-parameter step sizes scaled by the accumulated squared gradients.
    Adagrad,
    /// Per-parameter step sizes scaled by a decaying average of squared gradients.
    RmsProp,
    /// Bias-corrected first and second moment estimates.
    Adam,
}

impl MethodKind {
    /// The canonical name of the method.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sgd => "sgd",
            Self::Adagrad => "adagrad",
            Self::RmsProp => "rmsprop",
            Self::Adam => "adam",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MethodKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sgd" => Ok(Self::Sgd),
            "adagrad" => Ok(Self::Adagrad),
            "rmsprop" => Ok(Self::RmsProp),
            "adam" => Ok(Self::Adam),
            other => Err(ConfigError::UnknownMethod(other.to_string())),
        }
    }
}

/// An optimization method together with its step size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Method {
    /// The update rule.
    pub kind: MethodKind,
    /// The step size (learning rate).
    pub step_size: f64,
}

impl Method {
    /// Looks up a method by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownMethod`] if no method has this name.
    pub fn named(name: &str, step_size: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            kind: name.parse()?,
            step_size,
        })
    }

    /// Stochastic gradient descent.
    #[must_use]
    pub fn sgd(step_size: f64) -> Self {
        Self {
            kind: MethodKind::Sgd,
            step_size,
        }
    }

    /// Adagrad.
    #[must_use]
    pub fn adagrad(step_size: f64) -> Self {
        Self {
            kind: MethodKind::Adagrad,
            step_size,
        }
    }

    /// RMSProp.
    #[must_use]
    pub fn rmsprop(step_size: f64) -> Self {
        Self {
            kind: MethodKind::RmsProp,
            step_size,
        }
    }

    /// Adam.
    #[must_use]
    pub fn adam(step_size: f64) -> Self {
        Self {
            kind: MethodKind::Adam,
            step_size,
        }
    }
}

/// Applies a [`Method`] to a fixed list of parameters, keeping the per-parameter state the method
/// needs between steps.
#[derive(Debug)]
pub struct Optimizer {
    method: Method,
    moments: Vec<[f64; 2]>,
    steps: u32,
}

impl Optimizer {
    /// Creates an optimizer with empty state.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            moments: Vec::new(),
            steps: 0,
        }
    }

    /// The method this optimizer applies.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Moves every parameter against its accumulated gradient, then zeroes the gradients.
    ///
    /// The parameters must be passed in the same order on every call.
    pub fn step(&mut self, params: &[Var]) {
        if self.moments.len() != params.len() {
            self.moments = vec![[0.0; 2]; params.len()];
            self.steps = 0;
        }
        self.steps = self.steps.saturating_add(1);
        let rate = self.method.step_size;
        let t = f64::from(self.steps);
        for (param, [m, v]) in params.iter().zip(&mut self.moments) {
            let g = param.grad();
            let delta = match self.method.kind {
                MethodKind::Sgd => rate * g,
                MethodKind::Adagrad => {
                    *v += g * g;
                    rate * g / (v.sqrt() + EPSILON)
                }
                MethodKind::RmsProp => {
                    *v = RMSPROP_DECAY * *v + (1.0 - RMSPROP_DECAY) * g * g;
                    rate * g / (v.sqrt() + EPSILON)
                }
                MethodKind::Adam => {
                    *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * g;
                    *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * g * g;
                    let m_hat = *m / (1.0 - ADAM_BETA1.powf(t));
                    let v_hat = *v / (1.0 - ADAM_BETA2.powf(t));
                    rate * m_hat / (v_hat.sqrt() + EPSILON)
                }
            };
            param.set_value(param.value() - delta);
            param.zero_grad();
        }
    }
}
