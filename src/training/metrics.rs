//! Classifier evaluation metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary confusion matrix: predicted vs. actual counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionMatrix {
    /// Count outcomes over paired label vectors; values above 0.5 read as
    /// the positive class
    pub fn from_labels(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut matrix = Self {
            true_negatives: 0,
            false_positives: 0,
            false_negatives: 0,
            true_positives: 0,
        };

        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            match (*t > 0.5, *p > 0.5) {
                (false, false) => matrix.true_negatives += 1,
                (false, true) => matrix.false_positives += 1,
                (true, false) => matrix.false_negatives += 1,
                (true, true) => matrix.true_positives += 1,
            }
        }

        matrix
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .total()
            .max(1)
            .to_string()
            .len();
        writeln!(
            f,
            "[[{:>width$} {:>width$}]",
            self.true_negatives, self.false_positives
        )?;
        write!(
            f,
            " [{:>width$} {:>width$}]]",
            self.false_negatives, self.true_positives
        )
    }
}

/// Per-class evaluation row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision/recall/F1 report with accuracy and averages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    /// Evaluate binary predictions against true labels.
    ///
    /// `labels` names the negative and positive class, in that order.
    pub fn from_predictions(
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
        labels: [&str; 2],
    ) -> Self {
        let confusion = ConfusionMatrix::from_labels(y_true, y_pred);
        let (tn, fp, fn_, tp) = (
            confusion.true_negatives,
            confusion.false_positives,
            confusion.false_negatives,
            confusion.true_positives,
        );

        // Class 0 treats "negative" as its positive outcome
        let negative = class_metrics(labels[0], tn, fn_, fp, tn + fp);
        let positive = class_metrics(labels[1], tp, fp, fn_, tp + fn_);

        let total = confusion.total();
        let accuracy = if total > 0 {
            (tp + tn) as f64 / total as f64
        } else {
            0.0
        };

        Self {
            classes: vec![negative, positive],
            accuracy,
            confusion,
        }
    }

    /// Unweighted mean of (precision, recall, f1) across classes
    pub fn macro_avg(&self) -> (f64, f64, f64) {
        let n = self.classes.len().max(1) as f64;
        let sum = self.classes.iter().fold((0.0, 0.0, 0.0), |acc, c| {
            (acc.0 + c.precision, acc.1 + c.recall, acc.2 + c.f1)
        });
        (sum.0 / n, sum.1 / n, sum.2 / n)
    }

    /// Support-weighted mean of (precision, recall, f1) across classes
    pub fn weighted_avg(&self) -> (f64, f64, f64) {
        let total: usize = self.classes.iter().map(|c| c.support).sum();
        if total == 0 {
            return (0.0, 0.0, 0.0);
        }
        let sum = self.classes.iter().fold((0.0, 0.0, 0.0), |acc, c| {
            let w = c.support as f64;
            (
                acc.0 + w * c.precision,
                acc.1 + w * c.recall,
                acc.2 + w * c.f1,
            )
        });
        let total = total as f64;
        (sum.0 / total, sum.1 / total, sum.2 / total)
    }

    /// Total number of evaluated samples
    pub fn support(&self) -> usize {
        self.classes.iter().map(|c| c.support).sum()
    }
}

fn class_metrics(label: &str, tp: usize, fp: usize, fn_: usize, support: usize) -> ClassMetrics {
    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    };
    let recall = if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassMetrics {
        label: label.to_string(),
        precision,
        recall,
        f1,
        support,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        for class in &self.classes {
            writeln!(
                f,
                "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                class.label, class.precision, class.recall, class.f1, class.support
            )?;
        }

        let total = self.support();
        let (mp, mr, mf) = self.macro_avg();
        let (wp, wr, wf) = self.weighted_avg();

        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, total
        )?;
        writeln!(
            f,
            "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
            "macro avg", mp, mr, mf, total
        )?;
        write!(
            f,
            "{:>14} {:>10.2} {:>10.2} {:>10.2} {:>10}",
            "weighted avg", wp, wr, wf, total
        )
    }
}
