//! Gradient-boosted trees for up-move classification
//!
//! Binary logistic objective: depth-limited regression trees are fit to the
//! logistic gradients, with Newton leaf values and L2 leaf regularization.
//! Training is deterministic at the default parameters; the seed only feeds
//! the optional row subsampling.

use crate::data::Dataset;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from model training and inference.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("training failed: empty dataset")]
    EmptyDataset,

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("model not trained")]
    NotTrained,

    #[error("feature count mismatch: expected {expected}, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("model file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Boosting hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmParams {
    /// Number of boosting rounds (trees)
    pub n_trees: usize,
    /// Maximum tree depth
    pub max_depth: u32,
    /// Shrinkage applied to each tree's contribution
    pub learning_rate: f64,
    /// Minimum samples required in each leaf
    pub min_samples_leaf: usize,
    /// Row subsample ratio per round; 1.0 disables subsampling
    pub subsample: f64,
    /// L2 regularization on leaf values
    pub l2: f64,
    /// Seed for the subsampling RNG
    pub seed: u64,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 3,
            learning_rate: 0.1,
            min_samples_leaf: 1,
            subsample: 1.0,
            l2: 1.0,
            seed: 42,
        }
    }
}

/// One node of a regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: &[f64]) -> f64 {
        match self {
            Node::Leaf { value } => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Gradient-boosted binary classifier over the fixed feature schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmClassifier {
    params: GbmParams,
    feature_names: Vec<String>,
    base_score: f64,
    trees: Vec<Node>,
}

impl GbmClassifier {
    pub fn new() -> Self {
        Self::with_params(GbmParams::default())
    }

    pub fn with_params(params: GbmParams) -> Self {
        Self {
            params,
            feature_names: Vec::new(),
            base_score: 0.0,
            trees: Vec::new(),
        }
    }

    pub fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn params(&self) -> &GbmParams {
        &self.params
    }

    /// Fit on a labeled dataset. Rows must be fully finite.
    pub fn fit(&mut self, dataset: &Dataset) -> Result<(), ModelError> {
        if dataset.is_empty() {
            return Err(ModelError::EmptyDataset);
        }
        if dataset
            .features
            .iter()
            .any(|row| row.iter().any(|v| !v.is_finite()))
        {
            return Err(ModelError::InvalidData(
                "feature matrix contains non-finite values".to_string(),
            ));
        }

        let n = dataset.len();
        let y: Vec<f64> = dataset.labels.iter().map(|&l| l as f64).collect();

        info!(
            samples = n,
            features = dataset.num_features(),
            trees = self.params.n_trees,
            "training classifier"
        );

        // Start from the log-odds of the base rate.
        let positive_rate = (y.iter().sum::<f64>() / n as f64).clamp(1e-6, 1.0 - 1e-6);
        self.base_score = (positive_rate / (1.0 - positive_rate)).ln();
        self.feature_names = dataset.feature_names.clone();
        self.trees = Vec::with_capacity(self.params.n_trees);

        let mut scores = vec![self.base_score; n];
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let all_rows: Vec<usize> = (0..n).collect();

        for round in 0..self.params.n_trees {
            let mut grad = Vec::with_capacity(n);
            let mut hess = Vec::with_capacity(n);
            for i in 0..n {
                let p = sigmoid(scores[i]);
                grad.push(y[i] - p);
                hess.push(p * (1.0 - p));
            }

            let rows = if self.params.subsample < 1.0 {
                let take = ((n as f64 * self.params.subsample) as usize).max(1);
                let mut sampled: Vec<usize> =
                    all_rows.choose_multiple(&mut rng, take).copied().collect();
                sampled.sort_unstable();
                sampled
            } else {
                all_rows.clone()
            };

            let tree = self.build_node(&dataset.features, &rows, &grad, &hess, 0);

            for i in 0..n {
                scores[i] += self.params.learning_rate * tree.predict(&dataset.features[i]);
            }
            self.trees.push(tree);

            if (round + 1) % 25 == 0 {
                debug!(round = round + 1, "boosting progress");
            }
        }

        info!("classifier training completed");

        Ok(())
    }

    fn build_node(
        &self,
        features: &[Vec<f64>],
        rows: &[usize],
        grad: &[f64],
        hess: &[f64],
        depth: u32,
    ) -> Node {
        let leaf = |rows: &[usize]| {
            let g: f64 = rows.iter().map(|&i| grad[i]).sum();
            let h: f64 = rows.iter().map(|&i| hess[i]).sum();
            Node::Leaf {
                value: g / (h + self.params.l2),
            }
        };

        if depth >= self.params.max_depth || rows.len() < 2 * self.params.min_samples_leaf.max(1) {
            return leaf(rows);
        }

        let total_g: f64 = rows.iter().map(|&i| grad[i]).sum();
        let total_h: f64 = rows.iter().map(|&i| hess[i]).sum();
        let parent_score = total_g * total_g / (total_h + self.params.l2);

        let n_features = features[rows[0]].len();
        let mut best: Option<(f64, usize, f64)> = None; // (gain, feature, threshold)

        for feature in 0..n_features {
            let mut order: Vec<usize> = rows.to_vec();
            order.sort_by(|&a, &b| {
                features[a][feature]
                    .partial_cmp(&features[b][feature])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_g = 0.0;
            let mut left_h = 0.0;
            for pos in 0..order.len() - 1 {
                left_g += grad[order[pos]];
                left_h += hess[order[pos]];

                let here = features[order[pos]][feature];
                let next = features[order[pos + 1]][feature];
                if here == next {
                    continue;
                }
                let left_len = pos + 1;
                let right_len = order.len() - left_len;
                if left_len < self.params.min_samples_leaf || right_len < self.params.min_samples_leaf
                {
                    continue;
                }

                let right_g = total_g - left_g;
                let right_h = total_h - left_h;
                let gain = left_g * left_g / (left_h + self.params.l2)
                    + right_g * right_g / (right_h + self.params.l2)
                    - parent_score;

                if gain > best.map_or(1e-12, |(g, _, _)| g) {
                    best = Some((gain, feature, (here + next) / 2.0));
                }
            }
        }

        let (_, feature, threshold) = match best {
            Some(found) => found,
            None => return leaf(rows),
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&i| features[i][feature] <= threshold);

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.build_node(features, &left_rows, grad, hess, depth + 1)),
            right: Box::new(self.build_node(features, &right_rows, grad, hess, depth + 1)),
        }
    }

    /// Probability of the positive (up-move) class for one feature row.
    ///
    /// Errors on a missing (non-finite) feature value; callers are expected
    /// to guard first.
    pub fn predict_proba(&self, row: &[f64]) -> Result<f64, ModelError> {
        if !self.is_trained() {
            return Err(ModelError::NotTrained);
        }
        if row.len() != self.feature_names.len() {
            return Err(ModelError::FeatureMismatch {
                expected: self.feature_names.len(),
                got: row.len(),
            });
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidData(
                "feature row contains missing values".to_string(),
            ));
        }

        let margin: f64 = self.base_score
            + self
                .trees
                .iter()
                .map(|t| self.params.learning_rate * t.predict(row))
                .sum::<f64>();

        Ok(sigmoid(margin))
    }

    /// Hard 0/1 prediction at the 0.5 threshold.
    pub fn predict(&self, row: &[f64]) -> Result<u8, ModelError> {
        Ok(if self.predict_proba(row)? >= 0.5 { 1 } else { 0 })
    }

    /// Accuracy on a held-out dataset, in [0, 1]. Advisory only.
    pub fn evaluate(&self, dataset: &Dataset) -> Result<f64, ModelError> {
        if dataset.is_empty() {
            debug!("evaluation set is empty, reporting zero accuracy");
            return Ok(0.0);
        }

        let mut correct = 0usize;
        for (row, &label) in dataset.features.iter().zip(dataset.labels.iter()) {
            if self.predict(row)? == label {
                correct += 1;
            }
        }

        Ok(correct as f64 / dataset.len() as f64)
    }

    /// Persist the fitted ensemble as JSON. Utility only; the live analysis
    /// path always retrains.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        if !self.is_trained() {
            return Err(ModelError::NotTrained);
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously saved ensemble.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl Default for GbmClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    // Linearly separable on the first feature.
    fn separable_dataset(n: usize) -> Dataset {
        let mut ds = Dataset::new(vec!["x1".to_string(), "x2".to_string()]);
        for i in 0..n {
            let x1 = (i as f64) / (n as f64 / 2.0) - 1.0;
            let x2 = ((i as f64) / 25.0).sin();
            ds.push(vec![x1, x2], u8::from(x1 > 0.0), Utc::now());
        }
        ds
    }

    #[test]
    fn fit_rejects_empty_dataset() {
        let ds = Dataset::new(vec!["x".to_string()]);
        let err = GbmClassifier::new().fit(&ds).unwrap_err();
        assert!(matches!(err, ModelError::EmptyDataset));
    }

    #[test]
    fn learns_separable_data() {
        let ds = separable_dataset(200);
        let mut model = GbmClassifier::new();
        model.fit(&ds).unwrap();

        let accuracy = model.evaluate(&ds).unwrap();
        assert!(accuracy > 0.95, "accuracy was {accuracy}");

        let up = model.predict_proba(&[0.8, 0.0]).unwrap();
        let down = model.predict_proba(&[-0.8, 0.0]).unwrap();
        assert!(up > 0.6, "up probability was {up}");
        assert!(down < 0.4, "down probability was {down}");
    }

    #[test]
    fn probabilities_stay_in_unit_interval() {
        let ds = separable_dataset(120);
        let mut model = GbmClassifier::new();
        model.fit(&ds).unwrap();

        for row in &ds.features {
            let p = model.predict_proba(row).unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn training_is_deterministic_at_default_params() {
        let ds = separable_dataset(100);
        let mut a = GbmClassifier::new();
        let mut b = GbmClassifier::new();
        a.fit(&ds).unwrap();
        b.fit(&ds).unwrap();

        let row = [0.3, 0.5];
        assert_eq!(
            a.predict_proba(&row).unwrap(),
            b.predict_proba(&row).unwrap()
        );
    }

    #[test]
    fn predict_proba_rejects_missing_values() {
        let ds = separable_dataset(100);
        let mut model = GbmClassifier::new();
        model.fit(&ds).unwrap();

        let err = model.predict_proba(&[f64::NAN, 0.0]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidData(_)));
    }

    #[test]
    fn predict_proba_rejects_wrong_arity() {
        let ds = separable_dataset(100);
        let mut model = GbmClassifier::new();
        model.fit(&ds).unwrap();

        let err = model.predict_proba(&[0.1]).unwrap_err();
        assert!(matches!(err, ModelError::FeatureMismatch { .. }));
    }

    #[test]
    fn untrained_model_refuses_to_predict() {
        let model = GbmClassifier::new();
        assert!(matches!(
            model.predict_proba(&[0.0, 0.0]),
            Err(ModelError::NotTrained)
        ));
    }

    #[test]
    fn save_load_round_trip_preserves_predictions() {
        let ds = separable_dataset(150);
        let mut model = GbmClassifier::new();
        model.fit(&ds).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        model.save(&path).unwrap();

        let loaded = GbmClassifier::load(&path).unwrap();
        for row in ds.features.iter().take(20) {
            assert_eq!(
                model.predict_proba(row).unwrap(),
                loaded.predict_proba(row).unwrap()
            );
        }
    }
}
