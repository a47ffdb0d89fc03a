use crate::prelude::*;

/// Quadratic cost `0.5 * ||a - y||^2` for one sample.
pub fn quadratic(output: &Array1<f64>, target: &Array1<f64>) -> Result<f64> {
    check_shapes(output, target)?;
    Ok(0.5 * (output - target).mapv(|d| d * d).sum())
}

/// Derivative of the quadratic cost with respect to the output activation.
pub fn cost_derivative(output: &Array1<f64>, target: &Array1<f64>) -> Result<Array1<f64>> {
    check_shapes(output, target)?;
    Ok(output - target)
}

fn check_shapes(output: &Array1<f64>, target: &Array1<f64>) -> Result<()> {
    if output.len() != target.len() {
        return Err(NNError::DimensionMismatch(format!(
            "Prediction length {} doesn't match target length {}",
            output.len(),
            target.len()
        )));
    }
    Ok(())
}
