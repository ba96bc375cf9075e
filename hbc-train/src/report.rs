//! Classification report (precision, recall, F1 per class)

use std::collections::BTreeSet;
use std::fmt;

use smartcore::metrics;

/// Scores for one class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true samples of this class
    pub support: usize,
}

/// Averaged scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Evaluation of predictions against ground truth
///
/// Classes are the sorted union of true and predicted labels. Undefined
/// ratios (no predictions or no true samples for a class) count as 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub total: usize,
}

/// Zero-division ratios come back from the library as NaN
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// 1.0 where the label matches, 0.0 elsewhere
fn one_vs_rest(values: &[String], label: &str) -> Vec<f64> {
    values
        .iter()
        .map(|v| if v == label { 1.0 } else { 0.0 })
        .collect()
}

fn support_weighted(
    classes: &[ClassMetrics],
    total: usize,
    metric: impl Fn(&ClassMetrics) -> f64,
) -> f64 {
    let sum: f64 = classes.iter().map(|c| metric(c) * c.support as f64).sum();
    sum / total.max(1) as f64
}

impl ClassificationReport {
    /// Compute the report; `y_true` and `y_pred` are paired by position
    pub fn compute(y_true: &[String], y_pred: &[String]) -> Self {
        let total = y_true.len().min(y_pred.len());
        let (y_true, y_pred) = (&y_true[..total], &y_pred[..total]);
        let labels: BTreeSet<&String> = y_true.iter().chain(y_pred).collect();

        let classes: Vec<ClassMetrics> = labels
            .iter()
            .map(|label| {
                let truth = one_vs_rest(y_true, label);
                let predicted = one_vs_rest(y_pred, label);

                ClassMetrics {
                    label: (*label).clone(),
                    precision: finite_or_zero(metrics::precision(&truth, &predicted)),
                    recall: finite_or_zero(metrics::recall(&truth, &predicted)),
                    f1: finite_or_zero(metrics::f1(&truth, &predicted, 1.0)),
                    support: truth.iter().filter(|v| **v == 1.0).count(),
                }
            })
            .collect();

        let accuracy = if total == 0 {
            0.0
        } else {
            let index = |v: &String| labels.iter().position(|l| *l == v).unwrap_or(0) as u32;
            let truth: Vec<u32> = y_true.iter().map(index).collect();
            let predicted: Vec<u32> = y_pred.iter().map(index).collect();
            metrics::accuracy(&truth, &predicted)
        };

        let n_classes = classes.len().max(1) as f64;
        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / n_classes,
        };

        let weighted_avg = AverageMetrics {
            precision: support_weighted(&classes, total, |c| c.precision),
            recall: support_weighted(&classes, total, |c| c.recall),
            f1: support_weighted(&classes, total, |c| c.f1),
        };

        Self {
            accuracy,
            classes,
            macro_avg,
            weighted_avg,
            total,
        }
    }

    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        Ok(())
    }
}
