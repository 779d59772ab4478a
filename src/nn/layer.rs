//! Fully connected layers of neurons.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::nn::{Activation, Var};

/// The shape of one fully connected layer: how many outputs it has and the nonlinearity applied
/// to them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerSpec {
    /// Number of neurons in the layer.
    pub output_size: usize,
    /// Nonlinearity applied to each neuron's output.
    pub activation: Activation,
}

impl LayerSpec {
    /// Creates a layer spec.
    #[must_use]
    pub fn new(output_size: usize, activation: Activation) -> Self {
        Self {
            output_size,
            activation,
        }
    }

    /// Creates a layer spec with no nonlinearity.
    #[must_use]
    pub fn linear(output_size: usize) -> Self {
        Self::new(output_size, Activation::Identity)
    }
}

/// A neuron with a bias and weights.
#[derive(Clone, Debug)]
pub struct Neuron {
    bias: Var,
    weights: Vec<Var>,
    activation: Activation,
}

impl Neuron {
    /// Creates a neuron with zero bias and weights drawn from `N(0, 1 / input_size)`.
    pub fn rand<R>(rng: &mut R, activation: Activation, input_size: usize) -> Self
    where
        R: Rng,
    {
        let scale = (input_size.max(1) as f64).sqrt().recip();
        let weights = (0..input_size)
            .map(|_| Var::new(scale * rng.sample::<f64, _>(StandardNormal)))
            .collect();
        Self {
            bias: Var::new(0.0),
            weights,
            activation,
        }
    }

    /// Number of inputs the neuron takes.
    #[must_use]
    pub fn input_size(&self) -> usize {
        self.weights.len()
    }

    /// Computes the output of the neuron given an input.
    ///
    /// # Panics
    ///
    /// Panics if the input size mismatches the weights size.
    #[must_use]
    pub fn forward(&self, input: &[Var]) -> Var {
        assert_eq!(input.len(), self.weights.len());
        let z = self
            .weights
            .iter()
            .zip(input)
            .fold(self.bias.clone(), |acc, (w, x)| &acc + &(w * x));
        self.activation.apply(&z)
    }

    fn parameters(&self) -> impl Iterator<Item = &Var> {
        self.weights.iter().chain(std::iter::once(&self.bias))
    }
}

/// A layer of neurons sharing the same input.
#[derive(Clone, Debug)]
pub struct Layer {
    neurons: Vec<Neuron>,
    activation: Activation,
}

impl Layer {
    /// Creates a new layer of neurons with random weights.
    pub fn rand<R>(rng: &mut R, input_size: usize, spec: LayerSpec) -> Self
    where
        R: Rng,
    {
        let neurons = (0..spec.output_size)
            .map(|_| Neuron::rand(rng, spec.activation, input_size))
            .collect();
        Self {
            neurons,
            activation: spec.activation,
        }
    }

    /// Number of inputs the layer takes.
    #[must_use]
    pub fn input_size(&self) -> usize {
        self.neurons.first().map_or(0, Neuron::input_size)
    }

    /// Number of outputs the layer produces.
    #[must_use]
    pub fn output_size(&self) -> usize {
        self.neurons.len()
    }

    /// The shape of this layer.
    #[must_use]
    pub fn spec(&self) -> LayerSpec {
        LayerSpec::new(self.output_size(), self.activation)
    }

    /// Computes the output of the layer given an input.
    ///
    /// # Panics
    ///
    /// Panics if the input size mismatches the layer's input size.
    #[must_use]
    pub fn forward(&self, input: &[Var]) -> Vec<Var> {
        self.neurons.iter().map(|n| n.forward(input)).collect()
    }

    /// Gets the parameters of the layer.
    pub fn parameters(&self) -> Vec<Var> {
        self.neurons
            .iter()
            .flat_map(|n| n.parameters())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn layer_shapes() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = Layer::rand(&mut rng, 3, LayerSpec::new(4, Activation::Tanh));
        assert_eq!(layer.input_size(), 3);
        assert_eq!(layer.output_size(), 4);
        assert_eq!(layer.spec(), LayerSpec::new(4, Activation::Tanh));
        // 4 neurons with 3 weights and a bias each.
        assert_eq!(layer.parameters().len(), 16);

        let input: Vec<_> = [0.1, -0.2, 0.3].into_iter().map(Var::new).collect();
        let output = layer.forward(&input);
        assert_eq!(output.len(), 4);
        assert!(output.iter().all(|y| y.value().abs() < 1.0));
    }

    #[test]
    fn relu_neuron_is_nonnegative() {
        let mut rng = StdRng::seed_from_u64(11);
        let neuron = Neuron::rand(&mut rng, Activation::Relu, 2);
        for x in [[-3.0, 2.0], [1.0, 1.0], [5.0, -5.0]] {
            let input: Vec<_> = x.into_iter().map(Var::new).collect();
            assert!(neuron.forward(&input).value() >= 0.0);
        }
    }
}
