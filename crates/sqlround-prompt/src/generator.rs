//! Prompt generator trait and dialect factory

use crate::oracle::OraclePromptGenerator;
use crate::sqlite::SqlitePromptGenerator;
use sqlround_core::{DatabaseType, OptimizationStage};

/// Errors resolving a prompt generator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("Unsupported database type: '{0}'. Supported: oracle, sqlite")]
    UnsupportedDialect(String),
}

/// Builds the two round-trip prompts for one dialect
pub trait PromptGenerator: Send + Sync {
    /// Stage 1: ask for a plain-language summary of `sql_query`
    fn sql_to_natural_prompt(&self, sql_query: &str) -> String;

    /// Stage 2: ask for a query implementing `explanation`
    ///
    /// The prompt must ask for the query text only, since the answer is
    /// used as-is.
    fn natural_to_sql_prompt(&self, explanation: &str) -> String;

    /// Dialect this generator targets
    fn database_type(&self) -> DatabaseType;

    /// Prompt for an arbitrary stage
    fn prompt_for(&self, stage: OptimizationStage, text: &str) -> String {
        match stage {
            OptimizationStage::SqlToNatural => self.sql_to_natural_prompt(text),
            OptimizationStage::NaturalToSql => self.natural_to_sql_prompt(text),
        }
    }
}

/// Generator for a dialect
pub fn create_prompt_generator(database_type: DatabaseType) -> Box<dyn PromptGenerator> {
    match database_type {
        DatabaseType::Oracle => Box::new(OraclePromptGenerator),
        DatabaseType::Sqlite => Box::new(SqlitePromptGenerator),
    }
}

/// Generator for a dialect tag such as `"oracle"`
pub fn prompt_generator_for_tag(tag: &str) -> Result<Box<dyn PromptGenerator>, PromptError> {
    let database_type = tag
        .parse::<DatabaseType>()
        .map_err(|_| PromptError::UnsupportedDialect(tag.to_string()))?;

    Ok(create_prompt_generator(database_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_resolves_every_dialect() {
        for database_type in DatabaseType::ALL {
            assert_eq!(create_prompt_generator(database_type).database_type(), database_type);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let result = prompt_generator_for_tag("mysql");
        assert_eq!(
            result.err(),
            Some(PromptError::UnsupportedDialect("mysql".to_string()))
        );
    }

    #[test]
    fn prompt_for_dispatches_on_stage() {
        let generator = prompt_generator_for_tag("sqlite").unwrap();
        let text = "List every user older than 18";

        assert_eq!(
            generator.prompt_for(OptimizationStage::NaturalToSql, text),
            generator.natural_to_sql_prompt(text)
        );
        assert_eq!(
            generator.prompt_for(OptimizationStage::SqlToNatural, text),
            generator.sql_to_natural_prompt(text)
        );
    }
}
