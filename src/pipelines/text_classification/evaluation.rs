use std::fmt;

use log::debug;

use super::{Model, ModelError};

/// Label values greater than zero are the positive class, as in training
fn is_positive(value: f64) -> bool {
    value > 0.0
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Fraction of rows whose predicted labels all match the truth
pub fn exact_match_accuracy(truth: &[Vec<f64>], predicted: &[Vec<u8>]) -> f64 {
    let matches = truth
        .iter()
        .zip(predicted)
        .filter(|(expected, actual)| {
            expected.len() == actual.len()
                && expected
                    .iter()
                    .zip(actual.iter())
                    .all(|(expected, actual)| is_positive(*expected) == (*actual == 1))
        })
        .count();

    ratio(matches, truth.len())
}

/// Precision, recall and F1 for the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scores {
    /// Positive predictions that are correct
    pub precision: f64,

    /// Positive labels that were predicted
    pub recall: f64,

    /// Harmonic mean of precision and recall
    pub f1: f64,

    /// Number of positive labels
    pub support: usize,
}

/// The scores of a single label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScores {
    /// The label column
    pub name: String,

    /// Positive-class scores
    pub scores: Scores,

    /// Fraction of rows where the prediction matches the truth
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    true_positive: usize,
    false_positive: usize,
    false_negative: usize,
}

impl Counts {
    fn scores(&self) -> Scores {
        let precision = ratio(self.true_positive, self.true_positive + self.false_positive);
        let recall = ratio(self.true_positive, self.true_positive + self.false_negative);

        Scores {
            precision,
            recall,
            f1: f1(precision, recall),
            support: self.true_positive + self.false_negative,
        }
    }
}

/// Weighted mean of the per-label scores; zero when the weights sum to zero
fn average(labels: &[LabelScores], weight: impl Fn(&Scores) -> f64, support: usize) -> Scores {
    let total: f64 = labels.iter().map(|label| weight(&label.scores)).sum();

    if total == 0.0 {
        return Scores {
            support,
            ..Scores::default()
        };
    }

    let mean = |field: fn(&Scores) -> f64| {
        labels
            .iter()
            .map(|label| field(&label.scores) * weight(&label.scores))
            .sum::<f64>()
            / total
    };

    Scores {
        precision: mean(|scores| scores.precision),
        recall: mean(|scores| scores.recall),
        f1: mean(|scores| scores.f1),
        support,
    }
}

/// A multi-label classification report
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Per-label scores, in label order
    pub labels: Vec<LabelScores>,

    /// Scores over the pooled label decisions
    pub micro: Scores,

    /// Unweighted mean of the per-label scores
    pub macro_avg: Scores,

    /// Mean of the per-label scores weighted by support
    pub weighted: Scores,

    /// Mean of the per-row scores
    pub samples: Scores,

    /// Fraction of rows predicted entirely correctly
    pub exact_match: f64,
}

impl Report {
    /// Score predictions against the true labels
    pub fn compute(
        truth: &[Vec<f64>],
        predicted: &[Vec<u8>],
        names: &[String],
    ) -> Result<Self, ModelError> {
        if truth.len() != predicted.len() {
            return Err(ModelError::ShapeMismatch(format!(
                "{} label rows but {} predictions",
                truth.len(),
                predicted.len()
            )));
        }

        if let Some(row) = truth
            .iter()
            .map(Vec::len)
            .chain(predicted.iter().map(Vec::len))
            .find(|width| *width != names.len())
        {
            return Err(ModelError::ShapeMismatch(format!(
                "a row has {} labels but there are {} label names",
                row,
                names.len()
            )));
        }

        let mut per_label = vec![Counts::default(); names.len()];
        let mut correct = vec![0usize; names.len()];

        let mut samples = Scores::default();

        for (expected, actual) in truth.iter().zip(predicted) {
            let mut row = Counts::default();

            for (column, (expected, actual)) in expected.iter().zip(actual).enumerate() {
                let expected = is_positive(*expected);
                let actual = *actual == 1;

                let counts = &mut per_label[column];
                match (expected, actual) {
                    (true, true) => {
                        counts.true_positive += 1;
                        row.true_positive += 1;
                    }
                    (false, true) => {
                        counts.false_positive += 1;
                        row.false_positive += 1;
                    }
                    (true, false) => {
                        counts.false_negative += 1;
                        row.false_negative += 1;
                    }
                    (false, false) => {}
                }

                if expected == actual {
                    correct[column] += 1;
                }
            }

            let scores = row.scores();
            samples.precision += scores.precision;
            samples.recall += scores.recall;
            samples.f1 += scores.f1;
            samples.support += scores.support;
        }

        let n_rows = truth.len();
        if n_rows > 0 {
            samples.precision /= n_rows as f64;
            samples.recall /= n_rows as f64;
            samples.f1 /= n_rows as f64;
        }

        let pooled = per_label.iter().fold(Counts::default(), |total, counts| Counts {
            true_positive: total.true_positive + counts.true_positive,
            false_positive: total.false_positive + counts.false_positive,
            false_negative: total.false_negative + counts.false_negative,
        });

        let labels: Vec<LabelScores> = names
            .iter()
            .zip(&per_label)
            .zip(&correct)
            .map(|((name, counts), correct)| LabelScores {
                name: name.clone(),
                scores: counts.scores(),
                accuracy: ratio(*correct, n_rows),
            })
            .collect();

        let micro = pooled.scores();

        let macro_avg = average(&labels, |_| 1.0, micro.support);
        let weighted = average(&labels, |scores| scores.support as f64, micro.support);

        Ok(Self {
            labels,
            micro,
            macro_avg,
            weighted,
            samples,
            exact_match: exact_match_accuracy(truth, predicted),
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const AVERAGES: [&str; 4] = ["micro avg", "macro avg", "weighted avg", "samples avg"];

        let width = self
            .labels
            .iter()
            .map(|label| label.name.len())
            .chain(AVERAGES.iter().map(|name| name.len()))
            .max()
            .unwrap_or_default();

        let line = |f: &mut fmt::Formatter<'_>, name: &str, scores: &Scores| {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name,
                scores.precision,
                scores.recall,
                scores.f1,
                scores.support,
                width = width
            )
        };

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "",
            "precision",
            "recall",
            "f1-score",
            "support",
            width = width
        )?;
        writeln!(f)?;

        for label in &self.labels {
            line(f, &label.name, &label.scores)?;
        }
        writeln!(f)?;

        for (name, scores) in AVERAGES
            .into_iter()
            .zip([&self.micro, &self.macro_avg, &self.weighted, &self.samples])
        {
            line(f, name, scores)?;
        }
        writeln!(f)?;

        for label in &self.labels {
            writeln!(f, "{} -- {}", label.name, label.accuracy)?;
        }

        write!(f, "accuracy = {}", self.exact_match)
    }
}

/// Predict the held-out texts, print the classification report and return it
pub fn evaluate_model<M: Model + ?Sized>(
    model: &M,
    texts: &[String],
    labels: &[Vec<f64>],
    label_names: &[String],
) -> Result<Report, ModelError> {
    if !model.is_fitted() {
        return Err(ModelError::NotFitted);
    }

    debug!("Evaluating on {} rows", texts.len());

    let predicted = model.predict(texts)?;
    let report = Report::compute(labels, &predicted, label_names)?;

    println!("{}", report);

    Ok(report)
}
