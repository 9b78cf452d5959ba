//! Round-trip query optimizer
//!
//! One invocation walks these stages strictly in order:
//!
//! ```text
//! READ_SOURCE -> HASH -> LOAD_OR_INIT -> EXPLAIN -> SYNTHESIZE
//!     -> UPDATE -> PERSIST -> WRITE_OUTPUT
//! ```
//!
//! Any failure aborts the run. The metadata record is rebuilt in memory and
//! only handed to the store after both LLM stages have succeeded, so a
//! failed run never changes persisted history.

use sqlround_core::{
    DatabaseType, MetadataVersion, OptimizationResult, OptimizationStage, OptimizerConfig, QueryMetadata,
};
use sqlround_llm::{LlmClient, LlmError};
use sqlround_prompt::{create_prompt_generator, PromptGenerator};
use sqlround_store::{output_path_for, FileError, FileHandler, MetadataStore, StoreError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Errors aborting an optimization run
#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("{} stage failed: {source}", .stage.as_str())]
    Llm {
        stage: OptimizationStage,
        #[source]
        source: LlmError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Hash collision on {hash}: stored record targets {stored} with different query text or dialect than this {requested} run")]
    HashCollision {
        hash: String,
        stored: DatabaseType,
        requested: DatabaseType,
    },

    #[error("Metadata version {version} for {hash} cannot be bumped further")]
    VersionExhausted {
        hash: String,
        version: MetadataVersion,
    },

    #[error("Cannot compare {0} with itself")]
    DuplicateDialect(DatabaseType),

    #[error("Failed to serialize metadata: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Optimizer for one target dialect
pub struct QueryOptimizer {
    llm_client: Arc<dyn LlmClient>,
    file_handler: Arc<dyn FileHandler>,
    metadata_store: Arc<dyn MetadataStore>,
    prompt_generator: Box<dyn PromptGenerator>,
    config: OptimizerConfig,
}

impl QueryOptimizer {
    /// Create an optimizer for `config.database_type`
    pub fn new(
        llm_client: Arc<dyn LlmClient>,
        file_handler: Arc<dyn FileHandler>,
        metadata_store: Arc<dyn MetadataStore>,
        config: OptimizerConfig,
    ) -> Self {
        let prompt_generator = create_prompt_generator(config.database_type);

        Self {
            llm_client,
            file_handler,
            metadata_store,
            prompt_generator,
            config,
        }
    }

    /// Dialect this optimizer targets
    pub fn database_type(&self) -> DatabaseType {
        self.prompt_generator.database_type()
    }

    /// Where the output document for `sql_file` is written
    pub fn output_path(&self, sql_file: &Path) -> PathBuf {
        output_path_for(sql_file, self.database_type())
    }

    /// Optimize the query in `sql_file`
    pub async fn optimize_query(&self, sql_file: &Path) -> Result<OptimizationResult, OptimizeError> {
        tracing::info!(
            database = %self.database_type(),
            provider = self.llm_client.provider_name(),
            "Starting optimization for: {}",
            sql_file.display()
        );

        let result = self.run(sql_file).await;

        match &result {
            Ok(result) => tracing::info!(
                version = %result.metadata.version,
                "Optimization completed successfully"
            ),
            Err(e) => tracing::error!("Error during optimization: {}", e),
        }

        result
    }

    async fn run(&self, sql_file: &Path) -> Result<OptimizationResult, OptimizeError> {
        let database_type = self.database_type();

        let original_query = self.file_handler.read_sql_file(sql_file).await?;
        let query_hash = self.metadata_store.generate_hash(database_type, &original_query);
        tracing::debug!(hash = %query_hash, "Query hashed");

        let checked_out = self.checkout_metadata(&query_hash, &original_query).await?;

        tracing::info!("Converting SQL to natural language...");
        let explanation = self
            .run_stage(OptimizationStage::SqlToNatural, &original_query)
            .await?;

        tracing::info!("Converting natural language to optimized SQL...");
        let optimized_query = self
            .run_stage(OptimizationStage::NaturalToSql, &explanation)
            .await?;

        let updated = checked_out.with_explanation(explanation.clone());
        let metadata = self.metadata_store.save(&query_hash, updated).await?;

        let output_path = self.output_path(sql_file);
        self.file_handler
            .write_json_file(&output_path, &metadata.to_json_value()?)
            .await?;

        Ok(OptimizationResult {
            original_query,
            explained_query: explanation,
            optimized_query,
            database_type,
            metadata,
        })
    }

    /// Next record for this hash: bumped copy of the stored one, or a fresh `0.0`
    async fn checkout_metadata(&self, query_hash: &str, query: &str) -> Result<QueryMetadata, OptimizeError> {
        let database_type = self.database_type();

        let Some(existing) = self.metadata_store.get(query_hash).await else {
            tracing::debug!(hash = query_hash, "No metadata yet, starting at 0.0");
            return Ok(QueryMetadata::new(query, database_type));
        };

        if existing.database_type != database_type || existing.query_sql != query {
            return Err(OptimizeError::HashCollision {
                hash: query_hash.to_string(),
                stored: existing.database_type,
                requested: database_type,
            });
        }

        let mut next = QueryMetadata::clone(&existing);
        next.version = existing
            .version
            .bump()
            .ok_or_else(|| OptimizeError::VersionExhausted {
                hash: query_hash.to_string(),
                version: existing.version,
            })?;
        tracing::debug!(hash = query_hash, from = %existing.version, to = %next.version, "Bumping metadata version");

        Ok(next)
    }

    async fn run_stage(&self, stage: OptimizationStage, text: &str) -> Result<String, OptimizeError> {
        let prompt = self.prompt_generator.prompt_for(stage, text);

        self.llm_client
            .generate(&prompt, &self.config.generation_params())
            .await
            .map_err(|source| OptimizeError::Llm { stage, source })
    }
}
