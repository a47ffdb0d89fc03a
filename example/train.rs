use handcode::data::{read_labeled_csv, CsvOptions};
use handcode::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Points in the unit square, labeled by which side of `x + y = 1` they fall on.
fn synthetic(n: usize, rng: &mut StdRng) -> Result<Vec<Sample>> {
    (0..n)
        .map(|_| {
            let x: f64 = rng.gen();
            let y: f64 = rng.gen();
            let label = if x + y > 1.0 { 1 } else { 0 };
            Sample::labeled(array![x, y], label, 2)
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // train_demo [train.csv test.csv num_classes]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = TrainConfig {
        seed: Some(7),
        ..TrainConfig::default()
    };

    let (mut training, test, classes) = match args.as_slice() {
        [train, test, classes] => {
            let classes: usize = classes
                .parse()
                .map_err(|e| NNError::Other(format!("bad class count {:?}: {}", classes, e)))?;
            let options = CsvOptions {
                has_headers: true,
                scale: 255.0,
            };
            (
                read_labeled_csv(train, classes, options)?,
                read_labeled_csv(test, classes, options)?,
                classes,
            )
        }
        _ => {
            let mut rng = StdRng::seed_from_u64(1);
            (synthetic(500, &mut rng)?, synthetic(100, &mut rng)?, 2)
        }
    };

    let inputs = training
        .first()
        .map(|s| s.input.len())
        .ok_or_else(|| NNError::Other("training set is empty".to_string()))?;

    let mut model = Network::from_config(&[inputs, 16, classes], &config)?;
    model.summary();

    let mut history = History::new();
    let mut listener = |report: &EpochReport| {
        LogListener.on_epoch(report);
        history.on_epoch(report);
    };
    model.train_config(&config, &mut training, Some(&test), &mut listener)?;

    if let Some(best) = history.accuracies().iter().cloned().reduce(f64::max) {
        log::info!("best accuracy: {:.3}", best);
    }
    log::info!("final cost: {:.5}", model.cost(&test)?);

    model.save("./handcode.model")?;

    Ok(())
}
