//! Neural network building blocks on top of scalar reverse mode auto-differentiation.

mod activation;
mod layer;
mod network;
mod var;

pub use activation::Activation;
pub use layer::{Layer, LayerSpec, Neuron};
pub use network::{Mlp, Network, Sequence};
pub use var::Var;
