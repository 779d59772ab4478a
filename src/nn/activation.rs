//! The library of named activation functions.

use std::{fmt, str::FromStr};

use crate::{error::ConfigError, nn::Var};

/// A nonlinearity applied to the output of every neuron in a layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Activation {
    /// Passes its input through unchanged.
    #[default]
    Identity,
    /// `max(0, x)`
    Relu,
    /// The hyperbolic tangent.
    Tanh,
    /// The logistic function `1 / (1 + exp(-x))`.
    Sigmoid,
}

impl Activation {
    /// Every activation in the library.
    pub const ALL: [Self; 4] = [Self::Identity, Self::Relu, Self::Tanh, Self::Sigmoid];

    /// The canonical name of the activation.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Relu => "relu",
            Self::Tanh => "tanh",
            Self::Sigmoid => "sigmoid",
        }
    }

    /// Applies the activation to a variable.
    #[must_use]
    pub fn apply(self, x: &Var) -> Var {
        match self {
            Self::Identity => x.identity(),
            Self::Relu => x.relu(),
            Self::Tanh => x.tanh(),
            Self::Sigmoid => x.sigmoid(),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity" | "linear" | "none" => Ok(Self::Identity),
            "relu" => Ok(Self::Relu),
            "tanh" => Ok(Self::Tanh),
            "sigmoid" => Ok(Self::Sigmoid),
            other => Err(ConfigError::UnknownActivation(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for activation in Activation::ALL {
            assert_eq!(activation.name().parse::<Activation>(), Ok(activation));
        }
        assert_eq!("linear".parse::<Activation>(), Ok(Activation::Identity));
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_eq!(
            "softmax".parse::<Activation>(),
            Err(ConfigError::UnknownActivation("softmax".into()))
        );
    }

    #[test]
    fn apply_matches_scalar_functions() {
        let x = Var::new(-0.5);
        assert_eq!(Activation::Identity.apply(&x).value(), -0.5);
        assert_eq!(Activation::Relu.apply(&x).value(), 0.0);
        assert!((Activation::Tanh.apply(&x).value() - (-0.5f64).tanh()).abs() < 1e-12);
        let s = 1.0 / (1.0 + 0.5f64.exp());
        assert!((Activation::Sigmoid.apply(&x).value() - s).abs() < 1e-12);
    }
}
