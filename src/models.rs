use crate::prelude::*;
use crate::config::TrainConfig;
use crate::core::activations::sigmoid_backward;
use crate::core::losses::{cost_derivative, quadratic};
use crate::core::optimizers::{Optimization, DEFAULT_LEARNING_RATE};
use crate::core::progress::{EpochListener, EpochReport, LogListener};
use crate::data::{mini_batches, Sample};
use crate::utils::argmax;
use log::{info, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Feed-forward sigmoid network trained with mini-batch gradient descent
/// on the quadratic cost.
#[derive(Debug, Clone)]
pub struct Network {
    sizes: Vec<usize>,
    layers: Vec<Dense>,
    learning_rate: f64,
    rng: StdRng,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    sizes: Vec<usize>,
    learning_rate: Option<f64>,
    seed: Option<u64>,
}

impl NetworkBuilder {
    pub fn layers(mut self, sizes: &[usize]) -> Self {
        self.sizes = sizes.to_vec();
        self
    }

    pub fn add_layer(mut self, size: usize) -> Self {
        self.sizes.push(size);
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = Some(learning_rate);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<Network> {
        validate_topology(&self.sizes)?;
        let learning_rate = self.learning_rate.unwrap_or(DEFAULT_LEARNING_RATE);
        validate_learning_rate(learning_rate)?;

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let layers = self
            .sizes
            .windows(2)
            .map(|pair| Dense::new(pair[1], pair[0], &mut rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(Network {
            sizes: self.sizes,
            layers,
            learning_rate,
            rng,
        })
    }
}

fn validate_topology(sizes: &[usize]) -> Result<()> {
    if sizes.len() < 2 {
        return Err(NNError::InvalidTopology(format!(
            "need at least an input and an output layer, got {:?}",
            sizes
        )));
    }
    if sizes.iter().any(|&n| n == 0) {
        return Err(NNError::InvalidTopology(format!(
            "every layer needs at least one neuron, got {:?}",
            sizes
        )));
    }
    Ok(())
}

fn validate_learning_rate(learning_rate: f64) -> Result<()> {
    if !learning_rate.is_finite() || learning_rate <= 0.0 {
        return Err(NNError::InvalidTrainingConfig(format!(
            "learning rate must be positive and finite, got {}",
            learning_rate
        )));
    }
    Ok(())
}

/// On-disk form written by `Network::save`.
#[derive(Serialize, Deserialize)]
struct ModelFile {
    layers: Vec<Dense>,
    learning_rate: f64,
}

fn outer(column: &Array1<f64>, row: &Array1<f64>) -> Array2<f64> {
    column
        .view()
        .insert_axis(Axis(1))
        .dot(&row.view().insert_axis(Axis(0)))
}

impl Network {
    pub fn builder() -> NetworkBuilder {
        NetworkBuilder::default()
    }

    /// Randomly initialized network with the given layer sizes.
    pub fn new(sizes: &[usize]) -> Result<Self> {
        Self::builder().layers(sizes).build()
    }

    pub fn with_seed(sizes: &[usize], seed: u64) -> Result<Self> {
        Self::builder().layers(sizes).seed(seed).build()
    }

    pub fn from_config(sizes: &[usize], config: &TrainConfig) -> Result<Self> {
        let mut builder = Self::builder()
            .layers(sizes)
            .learning_rate(config.learning_rate);
        if let Some(seed) = config.seed {
            builder = builder.seed(seed);
        }
        builder.build()
    }

    /// Rebuilds a network around existing parameters. Consecutive layers must chain.
    pub fn from_layers(layers: Vec<Dense>) -> Result<Self> {
        let first = layers.first().ok_or_else(|| {
            NNError::InvalidTopology("a network needs at least one layer".to_string())
        })?;

        let mut sizes = vec![first.inputs()];
        for (i, layer) in layers.iter().enumerate() {
            if layer.b.len() != layer.outputs() {
                return Err(NNError::InvalidTopology(format!(
                    "layer {} has {} biases for {} neurons",
                    i,
                    layer.b.len(),
                    layer.outputs()
                )));
            }
            let expected = sizes[sizes.len() - 1];
            if layer.inputs() != expected {
                return Err(NNError::InvalidTopology(format!(
                    "layer {} takes {} inputs but the previous layer has {} neurons",
                    i,
                    layer.inputs(),
                    expected
                )));
            }
            sizes.push(layer.outputs());
        }
        validate_topology(&sizes)?;

        Ok(Self {
            sizes,
            layers,
            learning_rate: DEFAULT_LEARNING_RATE,
            rng: StdRng::from_entropy(),
        })
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        validate_learning_rate(learning_rate)?;
        self.learning_rate = learning_rate;
        Ok(())
    }

    pub fn input_size(&self) -> usize {
        self.sizes[0]
    }

    pub fn output_size(&self) -> usize {
        self.sizes[self.sizes.len() - 1]
    }

    pub fn count_parameters(&self) -> usize {
        self.layers.iter().map(Dense::param_count).sum()
    }

    pub fn summary(&self) -> String {
        let mut res = "\nModel Network\n".to_string();
        res.push_str("-------------------------------------------------------------\n");
        res.push_str("Layer (Type)\t\t Output shape\t\t No.of params\n");
        res.push_str(&format!("Input\t\t\t  (None, {})\t\t  0\n", self.input_size()));
        for layer in self.layers.iter() {
            res.push_str(&format!(
                "{}\t\t\t  (None, {})\t\t  {}\n",
                layer.typ(),
                layer.outputs(),
                layer.param_count()
            ));
        }
        res.push_str("-------------------------------------------------------------\n");
        res.push_str(&format!("Total params: {}\n", self.count_parameters()));
        info!("{}", res);
        res
    }

    /// One zero accumulator per layer, shaped like that layer's parameters.
    pub fn zero_gradients(&self) -> Vec<Dense> {
        self.layers.iter().map(Dense::zeroed).collect()
    }

    fn check_input(&self, input: &Array1<f64>) -> Result<()> {
        if input.len() != self.input_size() {
            return Err(NNError::DimensionMismatch(format!(
                "input has length {}, network expects {}",
                input.len(),
                self.input_size()
            )));
        }
        Ok(())
    }

    fn check_sample(&self, sample: &Sample) -> Result<()> {
        self.check_sample_parts(&sample.input, &sample.target)
    }

    fn check_samples(&self, samples: &[Sample]) -> Result<()> {
        samples.iter().try_for_each(|s| self.check_sample(s))
    }

    pub fn feedforward(&self, input: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_input(input)?;
        let mut a = input.clone();
        for layer in self.layers.iter() {
            (_, a) = layer.forward(&a)?;
        }
        Ok(a)
    }

    /// Gradient of the quadratic cost of one sample with respect to every
    /// weight and bias, in the same shapes as the parameters.
    pub fn backprop(&self, input: &Array1<f64>, target: &Array1<f64>) -> Result<Vec<Dense>> {
        self.check_sample_parts(input, target)?;

        // forward pass, keeping every z and activation
        let mut activations = vec![input.clone()];
        let mut zs = Vec::with_capacity(self.layers.len());
        for layer in self.layers.iter() {
            let (z, a) = layer.forward(&activations[activations.len() - 1])?;
            zs.push(z);
            activations.push(a);
        }

        let last = self.layers.len() - 1;
        let mut nabla = self.zero_gradients();

        let mut delta = cost_derivative(&activations[last + 1], target)? * sigmoid_backward(&zs[last]);
        nabla[last].w = outer(&delta, &activations[last]);
        nabla[last].b = delta.clone();

        for l in (0..last).rev() {
            delta = self.layers[l + 1].w.t().dot(&delta) * sigmoid_backward(&zs[l]);
            nabla[l].w = outer(&delta, &activations[l]);
            nabla[l].b = delta.clone();
        }

        Ok(nabla)
    }

    fn check_sample_parts(&self, input: &Array1<f64>, target: &Array1<f64>) -> Result<()> {
        self.check_input(input)?;
        if target.len() != self.output_size() {
            return Err(NNError::DimensionMismatch(format!(
                "target has length {}, network outputs {}",
                target.len(),
                self.output_size()
            )));
        }
        Ok(())
    }

    /// Sums the per-sample gradients of `batch` and takes one descent step
    /// of `learning_rate / batch.len()`.
    pub fn update_mini_batch(&mut self, batch: &[Sample]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.check_samples(batch)?;

        // Samples are independent until accumulation; collect in batch order
        // so the sum below is the same as a serial pass.
        let this = &*self;
        let deltas = batch
            .par_iter()
            .map(|sample| this.backprop(&sample.input, &sample.target))
            .collect::<Result<Vec<_>>>()?;

        let mut nabla = self.zero_gradients();
        for delta in deltas.iter() {
            for (acc, d) in nabla.iter_mut().zip(delta.iter()) {
                acc.accumulate(d);
            }
        }

        let learning_rate = self.learning_rate;
        for (layer, grad) in self.layers.iter_mut().zip(nabla.iter()) {
            layer.optimize(grad, learning_rate, batch.len());
        }
        trace!("updated parameters from a batch of {}", batch.len());
        Ok(())
    }

    /// Mini-batch SGD. `training_data` is reshuffled in place every epoch.
    /// Progress goes to the `log` facade; see `train_with` for other listeners.
    pub fn train(
        &mut self,
        training_data: &mut [Sample],
        epochs: usize,
        batch_size: usize,
        test_data: Option<&[Sample]>,
    ) -> Result<()> {
        self.train_with(training_data, epochs, batch_size, test_data, &mut LogListener)
    }

    pub fn train_with<L: EpochListener + ?Sized>(
        &mut self,
        training_data: &mut [Sample],
        epochs: usize,
        batch_size: usize,
        test_data: Option<&[Sample]>,
        listener: &mut L,
    ) -> Result<()> {
        // Reject misuse before the first update.
        if batch_size == 0 {
            return Err(NNError::InvalidTrainingConfig(
                "batch size must be greater than 0".to_string(),
            ));
        }
        self.check_samples(training_data)?;
        if let Some(test_data) = test_data {
            self.check_samples(test_data)?;
        }

        for epoch in 0..epochs {
            training_data.shuffle(&mut self.rng);
            for batch in mini_batches(training_data, batch_size)? {
                self.update_mini_batch(batch)?;
            }

            let report = match test_data {
                Some(test_data) => EpochReport::Evaluated {
                    epoch,
                    correct: self.evaluate(test_data)?,
                    total: test_data.len(),
                },
                None => EpochReport::Completed { epoch },
            };
            listener.on_epoch(&report);
        }
        Ok(())
    }

    /// Trains with the epochs, batch size and learning rate of `config`.
    pub fn train_config<L: EpochListener + ?Sized>(
        &mut self,
        config: &TrainConfig,
        training_data: &mut [Sample],
        test_data: Option<&[Sample]>,
        listener: &mut L,
    ) -> Result<()> {
        self.set_learning_rate(config.learning_rate)?;
        self.train_with(training_data, config.epochs, config.batch_size, test_data, listener)
    }

    /// Number of samples whose predicted class (arg-max of the output)
    /// equals the arg-max of the target.
    pub fn evaluate(&self, test_data: &[Sample]) -> Result<usize> {
        let mut correct = 0;
        for sample in test_data {
            self.check_sample(sample)?;
            let output = self.feedforward(&sample.input)?;
            if argmax(&output) == argmax(&sample.target) {
                correct += 1;
            }
        }
        Ok(correct)
    }

    /// Mean quadratic cost over `data`; zero for an empty set.
    pub fn cost(&self, data: &[Sample]) -> Result<f64> {
        if data.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for sample in data {
            self.check_sample(sample)?;
            total += quadratic(&self.feedforward(&sample.input)?, &sample.target)?;
        }
        Ok(total / data.len() as f64)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = ModelFile {
            layers: self.layers.clone(),
            learning_rate: self.learning_rate,
        };
        let encoded: Vec<u8> = bincode::serialize(&file)?;
        File::create(path)?.write_all(&encoded)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Network> {
        let mut buffer = Vec::new();
        File::open(path)?.read_to_end(&mut buffer)?;
        let file: ModelFile = bincode::deserialize(&buffer)?;
        let mut network = Network::from_layers(file.layers)?;
        network.set_learning_rate(file.learning_rate)?;
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(input: Array1<f64>, target: Array1<f64>) -> Sample {
        Sample::new(input, target)
    }

    #[test]
    fn rejects_invalid_topologies() {
        for sizes in [&[][..], &[3][..], &[2, 0, 1][..], &[0, 2][..]] {
            assert!(
                matches!(Network::new(sizes), Err(NNError::InvalidTopology(_))),
                "{:?} should be rejected",
                sizes
            );
        }
    }

    #[test]
    fn rejects_non_positive_learning_rate() {
        let res = Network::builder().layers(&[2, 1]).learning_rate(0.0).build();
        assert!(matches!(res, Err(NNError::InvalidTrainingConfig(_))));
    }

    #[test]
    fn parameters_follow_topology() {
        let net = Network::with_seed(&[4, 3, 2], 11).unwrap();
        assert_eq!(net.sizes(), &[4, 3, 2]);
        assert_eq!(net.layers()[0].w.dim(), (3, 4));
        assert_eq!(net.layers()[0].b.len(), 3);
        assert_eq!(net.layers()[1].w.dim(), (2, 3));
        assert_eq!(net.layers()[1].b.len(), 2);
        assert_eq!(net.count_parameters(), 3 * 4 + 3 + 2 * 3 + 2);
        assert_eq!(net.learning_rate(), DEFAULT_LEARNING_RATE);
    }

    #[test]
    fn same_seed_same_parameters() {
        let a = Network::with_seed(&[3, 5, 2], 42).unwrap();
        let b = Network::with_seed(&[3, 5, 2], 42).unwrap();
        assert_eq!(a.layers(), b.layers());
    }

    #[test]
    fn feedforward_checks_input_length() {
        let net = Network::with_seed(&[2, 3, 1], 0).unwrap();
        assert!(matches!(
            net.feedforward(&array![1.0, 2.0, 3.0]),
            Err(NNError::DimensionMismatch(_))
        ));
        assert_eq!(net.feedforward(&array![1.0, 2.0]).unwrap().len(), 1);
    }

    #[test]
    fn feedforward_matches_hand_computation() {
        let net = Network::from_layers(vec![
            Dense::from_parts(array![[1.0, 1.0]], array![-1.0]).unwrap(),
        ])
        .unwrap();
        let out = net.feedforward(&array![0.5, 0.5]).unwrap();
        assert_eq!(out, array![0.5]);
    }

    #[test]
    fn backprop_matches_numerical_gradient() {
        let net = Network::with_seed(&[3, 4, 2], 5).unwrap();
        let x = array![0.3, -0.7, 0.9];
        let y = array![1.0, 0.0];
        let grads = net.backprop(&x, &y).unwrap();

        let h = 1e-6;
        for l in 0..net.layers().len() {
            let (rows, cols) = net.layers()[l].w.dim();
            for i in 0..rows {
                for j in 0..cols {
                    let mut plus = net.layers().to_vec();
                    let mut minus = net.layers().to_vec();
                    plus[l].w[[i, j]] += h;
                    minus[l].w[[i, j]] -= h;
                    let c_plus = quadratic(
                        &Network::from_layers(plus).unwrap().feedforward(&x).unwrap(),
                        &y,
                    )
                    .unwrap();
                    let c_minus = quadratic(
                        &Network::from_layers(minus).unwrap().feedforward(&x).unwrap(),
                        &y,
                    )
                    .unwrap();
                    let numeric = (c_plus - c_minus) / (2.0 * h);
                    assert!((grads[l].w[[i, j]] - numeric).abs() < 1e-6);
                }
                let mut plus = net.layers().to_vec();
                let mut minus = net.layers().to_vec();
                plus[l].b[i] += h;
                minus[l].b[i] -= h;
                let c_plus =
                    quadratic(&Network::from_layers(plus).unwrap().feedforward(&x).unwrap(), &y)
                        .unwrap();
                let c_minus =
                    quadratic(&Network::from_layers(minus).unwrap().feedforward(&x).unwrap(), &y)
                        .unwrap();
                assert!((grads[l].b[i] - (c_plus - c_minus) / (2.0 * h)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn backprop_gradients_are_shaped_like_parameters() {
        let net = Network::with_seed(&[2, 5, 3, 4], 3).unwrap();
        let grads = net.backprop(&array![1.0, 0.0], &array![0.0, 1.0, 0.0, 0.0]).unwrap();
        for (g, layer) in grads.iter().zip(net.layers()) {
            assert_eq!(g.w.dim(), layer.w.dim());
            assert_eq!(g.b.len(), layer.b.len());
        }
    }

    #[test]
    fn mini_batch_update_is_sum_then_scale() {
        let mut net = Network::with_seed(&[2, 3, 2], 17).unwrap();
        let batch = vec![
            sample(array![0.1, 0.9], array![1.0, 0.0]),
            sample(array![0.8, 0.2], array![0.0, 1.0]),
            sample(array![0.5, 0.5], array![1.0, 0.0]),
        ];

        let mut expected = net.layers().to_vec();
        let mut sum = net.zero_gradients();
        for s in &batch {
            let g = net.backprop(&s.input, &s.target).unwrap();
            for (acc, d) in sum.iter_mut().zip(g.iter()) {
                acc.w = &acc.w + &d.w;
                acc.b = &acc.b + &d.b;
            }
        }
        let step = net.learning_rate() / batch.len() as f64;
        for (layer, grad) in expected.iter_mut().zip(sum.iter()) {
            layer.w = &layer.w - &(step * &grad.w);
            layer.b = &layer.b - &(step * &grad.b);
        }

        net.update_mini_batch(&batch).unwrap();
        assert_eq!(net.layers(), expected.as_slice());
    }

    #[test]
    fn bad_sample_in_batch_changes_nothing() {
        let mut net = Network::with_seed(&[2, 2], 1).unwrap();
        let before = net.layers().to_vec();
        let batch = vec![
            sample(array![1.0, 0.0], array![1.0, 0.0]),
            sample(array![1.0], array![1.0, 0.0]),
        ];
        assert!(matches!(
            net.update_mini_batch(&batch),
            Err(NNError::DimensionMismatch(_))
        ));
        assert_eq!(net.layers(), before.as_slice());
    }

    #[test]
    fn evaluate_counts_argmax_matches() {
        let net = Network::from_layers(vec![Dense::from_parts(
            array![[10.0, 0.0], [0.0, 10.0]],
            array![0.0, 0.0],
        )
        .unwrap()])
        .unwrap();

        let all_right = vec![
            sample(array![1.0, 0.0], array![1.0, 0.0]),
            sample(array![0.0, 1.0], array![0.0, 1.0]),
            sample(array![3.0, 1.0], array![1.0, 0.0]),
        ];
        assert_eq!(net.evaluate(&all_right).unwrap(), 3);

        let all_wrong = vec![
            sample(array![1.0, 0.0], array![0.0, 1.0]),
            sample(array![0.0, 1.0], array![1.0, 0.0]),
        ];
        assert_eq!(net.evaluate(&all_wrong).unwrap(), 0);
    }

    #[test]
    fn cost_of_empty_set_is_zero() {
        let net = Network::with_seed(&[2, 2], 1).unwrap();
        assert_eq!(net.cost(&[]).unwrap(), 0.0);
    }

    #[test]
    fn from_layers_requires_chained_shapes() {
        let layers = vec![
            Dense::from_parts(Array2::zeros((3, 2)), Array1::zeros(3)).unwrap(),
            Dense::from_parts(Array2::zeros((1, 4)), Array1::zeros(1)).unwrap(),
        ];
        assert!(matches!(
            Network::from_layers(layers),
            Err(NNError::InvalidTopology(_))
        ));
        assert!(Network::from_layers(vec![]).is_err());
    }

    #[test]
    fn summary_lists_every_layer() {
        let net = Network::with_seed(&[2, 3, 1], 0).unwrap();
        let summary = net.summary();
        assert_eq!(summary.matches("Dense").count(), 2);
        assert!(summary.contains("Total params: 13"));
    }
}
