//! Adapters layer: Concrete implementations of ports.
//!
//! - `sklearn`: exported scikit-learn scaler and random forest
//! - `sanitize`: clinical value and identifier filtering for logs

pub mod sanitize;
pub mod sklearn;
