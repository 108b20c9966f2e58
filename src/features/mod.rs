//! Feature engineering: technical indicators and the labeled feature table

pub mod engineering;
pub mod technical;

pub use engineering::{FeatureEngineer, FeatureTable, FEATURE_COLUMNS, FORWARD_HORIZON};
