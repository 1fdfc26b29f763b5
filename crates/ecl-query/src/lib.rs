pub mod catalog;
pub mod render;

pub use catalog::{Experiment, experiment_catalog};
pub use render::render;
