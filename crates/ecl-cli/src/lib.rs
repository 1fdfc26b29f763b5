//! CLI library components for the ECL query lab.

pub mod logging;
