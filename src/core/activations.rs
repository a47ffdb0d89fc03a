use ndarray::Array1;

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Derivative of the sigmoid, expressed through the sigmoid itself.
pub fn sigmoid_prime(z: f64) -> f64 {
    let s = sigmoid(z);
    s * (1.0 - s)
}

pub fn sigmoid_forward(z: &Array1<f64>) -> Array1<f64> {
    z.mapv(sigmoid)
}

pub fn sigmoid_backward(z: &Array1<f64>) -> Array1<f64> {
    z.mapv(sigmoid_prime)
}
