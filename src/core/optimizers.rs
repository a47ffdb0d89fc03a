use crate::prelude::*;

pub const DEFAULT_LEARNING_RATE: f64 = 3.0;

pub trait Optimization {
    /// Applies one descent step from gradients summed over `batch_len` samples.
    fn optimize(&mut self, grad: &Dense, learning_rate: f64, batch_len: usize);
}

/// `param -= (learning_rate / batch_len) * summed_grad`, elementwise.
///
/// The gradients must be the plain sum over the batch; the division by the
/// batch length happens here, once, on the step size.
pub fn apply_optimization(
    weights: &mut Array2<f64>,
    bias: &mut Array1<f64>,
    dw: &Array2<f64>,
    db: &Array1<f64>,
    learning_rate: f64,
    batch_len: usize,
) {
    if batch_len == 0 {
        return;
    }
    let step = learning_rate / batch_len as f64;
    weights.zip_mut_with(dw, |w, &g| *w -= step * g);
    bias.zip_mut_with(db, |b, &g| *b -= step * g);
}

impl Optimization for Dense {
    fn optimize(&mut self, grad: &Dense, learning_rate: f64, batch_len: usize) {
        apply_optimization(&mut self.w, &mut self.b, &grad.w, &grad.b, learning_rate, batch_len);
    }
}
