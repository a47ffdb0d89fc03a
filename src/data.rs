use crate::prelude::*;
use csv::ReaderBuilder;
use std::path::Path;

/// One labeled example: an input vector and a dense target vector.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Sample {
    pub input: Array1<f64>,
    pub target: Array1<f64>,
}

impl Sample {
    pub fn new(input: Array1<f64>, target: Array1<f64>) -> Self {
        Self { input, target }
    }

    /// Sample whose target is the one-hot encoding of `label`.
    pub fn labeled(input: Array1<f64>, label: usize, num_classes: usize) -> Result<Self> {
        Ok(Self::new(input, one_hot(label, num_classes)?))
    }
}

impl From<(Array1<f64>, Array1<f64>)> for Sample {
    fn from((input, target): (Array1<f64>, Array1<f64>)) -> Self {
        Self::new(input, target)
    }
}

pub fn one_hot(label: usize, num_classes: usize) -> Result<Array1<f64>> {
    if label >= num_classes {
        return Err(NNError::DimensionMismatch(format!(
            "label {} out of range for {} classes",
            label, num_classes
        )));
    }
    Ok(Array1::from_shape_fn(num_classes, |i| if i == label { 1.0 } else { 0.0 }))
}

/// Consecutive batches of `batch_size`; the last one may be shorter and is kept.
pub fn mini_batches<T>(data: &[T], batch_size: usize) -> Result<std::slice::Chunks<'_, T>> {
    if batch_size == 0 {
        return Err(NNError::InvalidTrainingConfig(
            "batch size must be greater than 0".to_string(),
        ));
    }
    Ok(data.chunks(batch_size))
}

#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub has_headers: bool,
    /// Every feature is divided by this value (e.g. 255 for greyscale pixels).
    pub scale: f64,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_headers: true,
            scale: 1.0,
        }
    }
}

/// Reads `label,x1,x2,...` rows into one-hot labeled samples.
pub fn read_labeled_csv<P: AsRef<Path>>(
    path: P,
    num_classes: usize,
    options: CsvOptions,
) -> Result<Vec<Sample>> {
    let file = std::fs::File::open(path)?;
    read_labeled(file, num_classes, options)
}

pub fn read_labeled<R: std::io::Read>(
    reader: R,
    num_classes: usize,
    options: CsvOptions,
) -> Result<Vec<Sample>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(options.has_headers)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples = vec![];
    let mut num_features = None;

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let values = record
            .iter()
            .map(|field| {
                field.parse::<f64>().map_err(|e| {
                    NNError::Other(format!("row {}: cannot parse {:?}: {}", row, field, e))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let (label, features) = match values.split_first() {
            Some((label, features)) if !features.is_empty() => (*label, features),
            _ => {
                return Err(NNError::DimensionMismatch(format!(
                    "row {} needs a label and at least one feature",
                    row
                )))
            }
        };
        if label < 0.0 || label.fract() != 0.0 {
            return Err(NNError::Other(format!("row {}: label {} is not a class index", row, label)));
        }

        match num_features {
            None => num_features = Some(features.len()),
            Some(n) if n != features.len() => {
                return Err(NNError::DimensionMismatch(format!(
                    "row {} has {} features, expected {}",
                    row,
                    features.len(),
                    n
                )))
            }
            _ => {}
        }

        let input = features.iter().map(|x| x / options.scale).collect::<Array1<f64>>();
        samples.push(Sample::labeled(input, label as usize, num_classes)?);
    }

    Ok(samples)
}
