//! Feed-forward networks and their serial composition.

use std::{collections::HashSet, fmt};

use rand::Rng;

use crate::nn::{Layer, LayerSpec, Var};

/// A differentiable function from a fixed-size input vector to a fixed-size output vector.
pub trait Network: fmt::Debug {
    /// Number of inputs the network takes.
    fn input_size(&self) -> usize;

    /// Number of outputs the network produces.
    fn output_size(&self) -> usize;

    /// Computes the output of the network, recording the computation graph.
    ///
    /// # Panics
    ///
    /// Implementations panic if `input` does not hold exactly [`Network::input_size`] values.
    fn forward(&self, input: &[Var]) -> Vec<Var>;

    /// Every trainable parameter of the network, without duplicates.
    fn parameters(&self) -> Vec<Var>;

    /// Computes the output values of the network for plain input values.
    ///
    /// # Panics
    ///
    /// Panics if `input` does not hold exactly [`Network::input_size`] values.
    fn eval(&self, input: &[f64]) -> Vec<f64> {
        let input: Vec<_> = input.iter().copied().map(Var::new).collect();
        self.forward(&input).iter().map(Var::value).collect()
    }
}

/// A multi-layer perceptron.
///
/// Cloning an `Mlp` yields a handle sharing the same weights, so a clone placed inside a
/// [`Sequence`] is trained together with the original.
#[derive(Clone, Debug)]
pub struct Mlp {
    input_size: usize,
    layers: Vec<Layer>,
}

impl Mlp {
    /// Creates a multi-layer perceptron taking `input_size` inputs, with one randomly initialized
    /// layer per spec.
    pub fn rand<R>(rng: &mut R, input_size: usize, specs: &[LayerSpec]) -> Self
    where
        R: Rng,
    {
        let mut layers = Vec::with_capacity(specs.len());
        let mut size = input_size;
        for spec in specs {
            layers.push(Layer::rand(rng, size, *spec));
            size = spec.output_size;
        }
        Self { input_size, layers }
    }

    /// The layers of the perceptron, first to last.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The shapes of the layers, first to last.
    #[must_use]
    pub fn specs(&self) -> Vec<LayerSpec> {
        self.layers.iter().map(Layer::spec).collect()
    }
}

impl Network for Mlp {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.layers.last().map_or(self.input_size, Layer::output_size)
    }

    fn forward(&self, input: &[Var]) -> Vec<Var> {
        match self.layers.split_first() {
            Some((layer, ls)) => ls
                .iter()
                .fold(layer.forward(input), |acc, layer| layer.forward(&acc)),
            None => input.to_vec(),
        }
    }

    fn parameters(&self) -> Vec<Var> {
        self.layers.iter().flat_map(Layer::parameters).collect()
    }
}

/// Networks applied one after the other, each stage's output feeding the next stage's input.
#[derive(Debug)]
pub struct Sequence {
    stages: Vec<Box<dyn Network>>,
}

impl Sequence {
    /// Composes the given stages in order.
    ///
    /// # Panics
    ///
    /// Panics if a stage's output size differs from the input size of the stage after it.
    #[must_use]
    pub fn new(stages: Vec<Box<dyn Network>>) -> Self {
        for pair in stages.windows(2) {
            assert_eq!(
                pair[0].output_size(),
                pair[1].input_size(),
                "adjacent stages must agree on their shared size"
            );
        }
        Self { stages }
    }

    /// The composed stages, first to last.
    #[must_use]
    pub fn stages(&self) -> &[Box<dyn Network>] {
        &self.stages
    }
}

impl Network for Sequence {
    fn input_size(&self) -> usize {
        self.stages.first().map_or(0, |s| s.input_size())
    }

    fn output_size(&self) -> usize {
        self.stages.last().map_or(0, |s| s.output_size())
    }

    fn forward(&self, input: &[Var]) -> Vec<Var> {
        self.stages
            .iter()
            .fold(input.to_vec(), |acc, stage| stage.forward(&acc))
    }

    fn parameters(&self) -> Vec<Var> {
        let mut seen = HashSet::new();
        self.stages
            .iter()
            .flat_map(|s| s.parameters())
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }
}
