use log::info;

/// What happened at the end of one training epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochReport {
    /// The epoch was followed by an evaluation pass.
    Evaluated {
        epoch: usize,
        correct: usize,
        total: usize,
    },
    /// No evaluation set was supplied.
    Completed { epoch: usize },
}

impl EpochReport {
    pub fn epoch(&self) -> usize {
        match self {
            EpochReport::Evaluated { epoch, .. } | EpochReport::Completed { epoch } => *epoch,
        }
    }
}

/// Receives per-epoch progress from `Network::train_with`.
pub trait EpochListener {
    fn on_epoch(&mut self, report: &EpochReport);
}

impl<F: FnMut(&EpochReport)> EpochListener for F {
    fn on_epoch(&mut self, report: &EpochReport) {
        self(report)
    }
}

/// Emits progress through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogListener;

impl EpochListener for LogListener {
    fn on_epoch(&mut self, report: &EpochReport) {
        match report {
            EpochReport::Evaluated { epoch, correct, total } => {
                info!("Epoch {}: {} / {}", epoch, correct, total)
            }
            EpochReport::Completed { epoch } => info!("Epoch {} complete", epoch),
        }
    }
}

/// Keeps every report in order.
#[derive(Debug, Default, Clone)]
pub struct History {
    pub reports: Vec<EpochReport>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// `correct / total` for each evaluated epoch.
    pub fn accuracies(&self) -> Vec<f64> {
        self.reports
            .iter()
            .filter_map(|r| match r {
                EpochReport::Evaluated { correct, total, .. } if *total > 0 => {
                    Some(*correct as f64 / *total as f64)
                }
                _ => None,
            })
            .collect()
    }
}

impl EpochListener for History {
    fn on_epoch(&mut self, report: &EpochReport) {
        self.reports.push(*report);
    }
}
