//! Experimentation layer: single runs, batch matrices, metrics, ranking

pub mod batch;
pub mod compare;
pub mod metrics;
pub mod runner;
