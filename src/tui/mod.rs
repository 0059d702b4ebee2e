//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a medical-themed interface for:
//! - Dashboard with artifact status and session counts
//! - Clinical data input
//! - Prediction result display

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
