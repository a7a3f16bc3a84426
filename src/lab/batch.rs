//! Batch matrix expansion and concurrent execution
//!
//! Expands a provider/model/strategy/constraint matrix into cells, runs
//! every cell against one shared snapshot, and returns rows in expansion
//! order regardless of completion order.

use crate::config::{LabBatchConfig, LabSingleConfig};
use crate::lab::runner::{run_single_experiment, RunOptions};
use crate::logger::RunLogger;
use crate::prompt::PromptLibrary;
use crate::providers::Registry;
use crate::types::{ChangeSnapshot, EngineResult};
use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::Serialize;

/// One executed cell of the batch matrix.
#[derive(Debug, Clone, Serialize)]
pub struct BatchExperimentRow {
    pub config_id: String,
    pub provider: String,
    pub model: String,
    pub strategy: String,
    pub constraint_label: String,
    pub result: EngineResult,
}

impl BatchExperimentRow {
    /// Grouping key for metrics: the configuration without the row index.
    pub fn config_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.provider, self.model, self.strategy, self.constraint_label
        )
    }
}

/// Expand the matrix in provider, model, strategy, constraint-set order.
/// Returns each cell's constraint label with its single-run config.
pub fn expand_matrix(batch: &LabBatchConfig) -> Vec<(String, LabSingleConfig)> {
    let mut cells = Vec::new();
    for entry in &batch.providers {
        for model in &entry.models {
            for strategy in &batch.strategies {
                for set in &batch.constraints {
                    cells.push((
                        set.label.clone(),
                        LabSingleConfig {
                            provider: entry.provider.clone(),
                            model: model.clone(),
                            strategy: strategy.clone(),
                            constraints: set.bounds(),
                        },
                    ));
                }
            }
        }
    }
    cells
}

/// Run every matrix cell with bounded concurrency.
///
/// Cells may finish in any order; rows come back sorted by their
/// position in the expanded matrix, and each row is logged after the
/// whole batch has completed.
pub async fn run_batch(
    registry: &Registry,
    prompts: &PromptLibrary,
    snapshot: &ChangeSnapshot,
    batch: &LabBatchConfig,
    options: &RunOptions,
    workers: usize,
    logger: Option<&RunLogger>,
) -> Result<Vec<BatchExperimentRow>> {
    let cells = expand_matrix(batch);

    let mut indexed: Vec<(usize, BatchExperimentRow)> = stream::iter(
        cells.into_iter().enumerate().map(|(index, (label, config))| {
            let options = options.clone();
            async move {
                let result =
                    run_single_experiment(registry, prompts, snapshot, &config, &options).await;
                let row = BatchExperimentRow {
                    config_id: format!(
                        "{}:{}:{}:{}:{}",
                        index + 1,
                        config.provider,
                        config.model,
                        config.strategy,
                        label
                    ),
                    provider: config.provider,
                    model: config.model,
                    strategy: config.strategy,
                    constraint_label: label,
                    result,
                };
                (index, row)
            }
        }),
    )
    .buffer_unordered(workers.max(1))
    .collect()
    .await;

    indexed.sort_by_key(|(index, _)| *index);
    let rows: Vec<BatchExperimentRow> = indexed.into_iter().map(|(_, row)| row).collect();

    if let Some(logger) = logger {
        for row in &rows {
            logger.log_run(&row.result)?;
        }
    }

    Ok(rows)
}
