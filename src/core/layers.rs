use crate::prelude::*;
use crate::core::activations::sigmoid_forward;
use ndarray_rand::rand_distr::StandardNormal;
use rand::Rng;

/// A fully connected sigmoid layer. `w` has one row per neuron of this
/// layer and one column per neuron of the previous layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Dense {
    pub w: Array2<f64>,
    pub b: Array1<f64>,
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(perceptron: usize, prev: usize, rng: &mut R) -> Result<Self> {
        if perceptron == 0 || prev == 0 {
            return Err(NNError::InvalidTopology(
                "Layer dimensions must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            w: Array2::random_using((perceptron, prev), StandardNormal, rng),
            b: Array1::random_using(perceptron, StandardNormal, rng),
        })
    }

    pub fn from_parts(w: Array2<f64>, b: Array1<f64>) -> Result<Self> {
        if w.nrows() == 0 || w.ncols() == 0 {
            return Err(NNError::InvalidTopology(format!(
                "weight matrix {:?} has an empty dimension",
                w.dim()
            )));
        }
        if b.len() != w.nrows() {
            return Err(NNError::InvalidTopology(format!(
                "bias length {} does not match {} weight rows",
                b.len(),
                w.nrows()
            )));
        }
        Ok(Self { w, b })
    }

    /// Same shape as `self`, all zeros. Used for gradient accumulators.
    pub fn zeroed(&self) -> Self {
        Self {
            w: Array2::zeros(self.w.raw_dim()),
            b: Array1::zeros(self.b.raw_dim()),
        }
    }

    pub fn inputs(&self) -> usize {
        self.w.ncols()
    }

    pub fn outputs(&self) -> usize {
        self.w.nrows()
    }

    pub fn param_count(&self) -> usize {
        self.w.len() + self.b.len()
    }

    pub fn typ(&self) -> String {
        "Dense".into()
    }

    /// Returns `(z, sigmoid(z))` for the given previous-layer activation.
    pub fn forward(&self, a: &Array1<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        if a.len() != self.inputs() {
            return Err(NNError::DimensionMismatch(format!(
                "layer expects {} inputs, got {}",
                self.inputs(),
                a.len()
            )));
        }
        let z = self.w.dot(a) + &self.b;
        let a = sigmoid_forward(&z);
        Ok((z, a))
    }

    pub(crate) fn accumulate(&mut self, other: &Dense) {
        self.w += &other.w;
        self.b += &other.b;
    }
}
