//! Side-by-side optimization for two dialects

use crate::optimizer::{OptimizeError, QueryOptimizer};
use sqlround_core::{DatabaseType, OptimizationResult, OptimizerConfig};
use sqlround_llm::LlmClient;
use sqlround_store::{FileHandler, MetadataStore};
use std::path::Path;
use std::sync::Arc;

/// Results of optimizing one source file for two dialects
#[derive(Debug, Clone)]
pub struct DialectComparison {
    pub first: OptimizationResult,
    pub second: OptimizationResult,
}

impl DialectComparison {
    pub fn results(&self) -> [&OptimizationResult; 2] {
        [&self.first, &self.second]
    }
}

/// Optimize `sql_file` for both `dialects` concurrently
///
/// Both runs share the LLM client, file handler and store. Their records
/// never clash because the identity hash includes the dialect. The first
/// failure is returned; the other run may still have persisted its record.
pub async fn compare_dialects(
    sql_file: &Path,
    dialects: [DatabaseType; 2],
    llm_client: Arc<dyn LlmClient>,
    file_handler: Arc<dyn FileHandler>,
    metadata_store: Arc<dyn MetadataStore>,
    config: &OptimizerConfig,
) -> Result<DialectComparison, OptimizeError> {
    let [first, second] = dialects;
    if first == second {
        return Err(OptimizeError::DuplicateDialect(first));
    }

    let optimizer_for = |database_type| {
        QueryOptimizer::new(
            Arc::clone(&llm_client),
            Arc::clone(&file_handler),
            Arc::clone(&metadata_store),
            OptimizerConfig {
                database_type,
                ..config.clone()
            },
        )
    };
    let first_optimizer = optimizer_for(first);
    let second_optimizer = optimizer_for(second);

    tracing::info!("Comparing {} and {} for {}", first, second, sql_file.display());

    let (first, second) = tokio::join!(
        first_optimizer.optimize_query(sql_file),
        second_optimizer.optimize_query(sql_file)
    );

    Ok(DialectComparison {
        first: first?,
        second: second?,
    })
}
