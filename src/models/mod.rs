//! Machine learning models: the gradient-boosted up-move classifier

pub mod gbm;

pub use gbm::{GbmClassifier, GbmParams, ModelError};
