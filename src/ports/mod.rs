//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the numeric binding that evaluates the
//! fitted artifacts.

mod artifact_source;
mod model;

pub use artifact_source::ArtifactSource;
pub use model::{Classifier, ModelArtifacts, Scaler};
