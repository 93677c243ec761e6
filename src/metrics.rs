//! Binary classification metrics for imbalanced problems.
//!
//! Fraud-style datasets are dominated by negatives, so accuracy is nearly
//! meaningless and the primary metric here is average precision (AUC-PR),
//! with ROC-AUC as a secondary view. Thresholded metrics return 0.0 on a
//! zero denominator; ranking metrics return NaN when a class is entirely
//! absent, since no meaningful value exists.

use serde::{Deserialize, Serialize};

/// Confusion counts at a threshold: `(tp, fp, tn, fn)`.
///
/// A sample is predicted positive when its score is ≥ the threshold.
///
/// # Panics
///
/// Panics if the slices have different lengths.
///
/// # Examples
///
/// ```
/// use entrelazar::metrics::confusion_counts;
///
/// let y_true = [0, 0, 1, 1];
/// let scores = [-0.5, 0.3, -0.1, 0.8];
/// assert_eq!(confusion_counts(&y_true, &scores, 0.0), (1, 1, 1, 1));
/// ```
#[must_use]
pub fn confusion_counts(
    y_true: &[usize],
    scores: &[f64],
    threshold: f64,
) -> (usize, usize, usize, usize) {
    assert_eq!(y_true.len(), scores.len(), "labels and scores must align");

    let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
    for (&label, &score) in y_true.iter().zip(scores) {
        match (label == 1, score >= threshold) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
            (true, false) => fn_ += 1,
        }
    }
    (tp, fp, tn, fn_)
}

/// Precision tp/(tp+fp); 0.0 when nothing is predicted positive.
#[must_use]
pub fn precision(tp: usize, fp: usize) -> f64 {
    if tp + fp == 0 {
        return 0.0;
    }
    tp as f64 / (tp + fp) as f64
}

/// Recall tp/(tp+fn); 0.0 when there are no positives.
#[must_use]
pub fn recall(tp: usize, fn_: usize) -> f64 {
    if tp + fn_ == 0 {
        return 0.0;
    }
    tp as f64 / (tp + fn_) as f64
}

/// F1 score, the harmonic mean of precision and recall; 0.0 when both
/// are 0.
#[must_use]
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

/// Area under the ROC curve, computed from tied ranks.
///
/// Equivalent to the probability that a random positive outranks a random
/// negative, with ties counting half. Returns NaN when either class is
/// absent.
///
/// # Panics
///
/// Panics if the slices have different lengths.
///
/// # Examples
///
/// ```
/// use entrelazar::metrics::roc_auc;
///
/// let y_true = [0, 0, 1, 1];
/// let scores = [0.1, 0.4, 0.35, 0.8];
/// assert!((roc_auc(&y_true, &scores) - 0.75).abs() < 1e-12);
/// ```
#[must_use]
pub fn roc_auc(y_true: &[usize], scores: &[f64]) -> f64 {
    assert_eq!(y_true.len(), scores.len(), "labels and scores must align");

    let n = y_true.len();
    let n_pos = y_true.iter().filter(|&&label| label == 1).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return f64::NAN;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[a]
            .partial_cmp(&scores[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Average ranks within tied score groups.
    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let rank_sum_pos: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|(&label, _)| label == 1)
        .map(|(_, &rank)| rank)
        .sum();
    let n_pos_f = n_pos as f64;
    (rank_sum_pos - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg as f64)
}

/// Average precision (area under the precision-recall curve, step-wise).
///
/// AP = Σₖ (Rₖ − Rₖ₋₁) · Pₖ over the ranking by descending score, which
/// reduces to the mean of precision-at-each-positive-hit. Returns NaN
/// when there are no positives. On imbalanced data this is the primary
/// metric; its baseline is the positive prevalence, not 0.5.
///
/// # Panics
///
/// Panics if the slices have different lengths.
///
/// # Examples
///
/// ```
/// use entrelazar::metrics::average_precision;
///
/// let y_true = [1, 0, 1, 0];
/// let scores = [0.9, 0.8, 0.7, 0.1];
/// // Hits at ranks 1 and 3: (1/1 + 2/3) / 2.
/// assert!((average_precision(&y_true, &scores) - 5.0 / 6.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn average_precision(y_true: &[usize], scores: &[f64]) -> f64 {
    assert_eq!(y_true.len(), scores.len(), "labels and scores must align");

    let n_pos = y_true.iter().filter(|&&label| label == 1).count();
    if n_pos == 0 {
        return f64::NAN;
    }

    let mut order: Vec<usize> = (0..y_true.len()).collect();
    // Descending score; index ascending breaks ties deterministically.
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut hits = 0usize;
    let mut sum = 0.0;
    for (rank, &idx) in order.iter().enumerate() {
        if y_true[idx] == 1 {
            hits += 1;
            sum += hits as f64 / (rank + 1) as f64;
        }
    }
    sum / n_pos as f64
}

/// The decision threshold maximizing F1 over the observed scores.
///
/// Candidates are the distinct score values. Ties on F1 resolve to the
/// lower threshold, which favors recall — the right bias when missing a
/// positive costs more than a false alarm. Returns `None` when the set
/// has no positives (F1 is identically 0 and no threshold is better than
/// another).
///
/// # Panics
///
/// Panics if the slices have different lengths.
#[must_use]
pub fn best_f1_threshold(y_true: &[usize], scores: &[f64]) -> Option<f64> {
    assert_eq!(y_true.len(), scores.len(), "labels and scores must align");

    if !y_true.iter().any(|&label| label == 1) {
        return None;
    }

    let mut candidates: Vec<f64> = scores.to_vec();
    candidates.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    candidates.dedup();

    let mut best: Option<(f64, f64)> = None;
    for &threshold in &candidates {
        let (tp, fp, _, fn_) = confusion_counts(y_true, scores, threshold);
        let f1 = f1_score(precision(tp, fp), recall(tp, fn_));
        // Descending scan: >= moves ties toward the lower threshold.
        match best {
            Some((best_f1, _)) if f1 < best_f1 => {}
            _ => best = Some((f1, threshold)),
        }
    }
    best.map(|(_, threshold)| threshold)
}

/// Full evaluation summary at a fixed threshold.
///
/// # Examples
///
/// ```
/// use entrelazar::metrics::BinaryMetrics;
///
/// let y_true = [0, 0, 0, 1];
/// let scores = [-0.9, -0.4, 0.2, 0.7];
/// let m = BinaryMetrics::compute(&y_true, &scores, 0.0);
/// assert_eq!(m.tp, 1);
/// assert_eq!(m.fp, 1);
/// assert!((m.recall - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    /// Threshold the confusion counts were taken at.
    pub threshold: f64,
    /// True positives.
    pub tp: usize,
    /// False positives.
    pub fp: usize,
    /// True negatives.
    pub tn: usize,
    /// False negatives.
    pub fn_: usize,
    /// Accuracy at the threshold. Reported for completeness; on
    /// imbalanced data the all-negative classifier already scores high
    /// here, so never read it alone.
    pub accuracy: f64,
    /// Fraction of positives in the labels — the baseline AUC-PR of a
    /// random ranker.
    pub prevalence: f64,
    /// Precision at the threshold.
    pub precision: f64,
    /// Recall at the threshold.
    pub recall: f64,
    /// F1 at the threshold.
    pub f1: f64,
    /// Threshold-free ROC-AUC (NaN if a class is absent).
    pub roc_auc: f64,
    /// Threshold-free average precision (NaN if no positives).
    pub average_precision: f64,
}

impl BinaryMetrics {
    /// Computes all metrics for a score vector at the given threshold.
    ///
    /// # Panics
    ///
    /// Panics if the slices have different lengths.
    #[must_use]
    pub fn compute(y_true: &[usize], scores: &[f64], threshold: f64) -> Self {
        let (tp, fp, tn, fn_) = confusion_counts(y_true, scores, threshold);
        let precision = precision(tp, fp);
        let recall = recall(tp, fn_);
        let n = y_true.len() as f64;
        Self {
            threshold,
            tp,
            fp,
            tn,
            fn_,
            accuracy: (tp + tn) as f64 / n,
            prevalence: (tp + fn_) as f64 / n,
            precision,
            recall,
            f1: f1_score(precision, recall),
            roc_auc: roc_auc(y_true, scores),
            average_precision: average_precision(y_true, scores),
        }
    }

    /// Plain-text summary, one metric per line.
    #[must_use]
    pub fn report(&self) -> String {
        format!(
            "threshold          {:.4}\n\
             tp/fp/tn/fn        {}/{}/{}/{}\n\
             accuracy           {:.4}\n\
             prevalence         {:.4}\n\
             precision          {:.4}\n\
             recall             {:.4}\n\
             f1                 {:.4}\n\
             roc_auc            {:.4}\n\
             average_precision  {:.4}",
            self.threshold,
            self.tp,
            self.fp,
            self.tn,
            self.fn_,
            self.accuracy,
            self.prevalence,
            self.precision,
            self.recall,
            self.f1,
            self.roc_auc,
            self.average_precision,
        )
    }
}
