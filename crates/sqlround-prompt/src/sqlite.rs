//! SQLite prompts

use crate::generator::PromptGenerator;
use sqlround_core::DatabaseType;

/// Prompts tuned for SQLite
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlitePromptGenerator;

impl PromptGenerator for SqlitePromptGenerator {
    fn sql_to_natural_prompt(&self, sql_query: &str) -> String {
        format!(
            r#"You are an expert SQLite database analyst. Your task is to explain the following SQLite query in simple, natural language.

SQL Query:
```sql
{sql_query}
```

Please provide a concise explanation of what this query does. Focus on:
- What data it retrieves or modifies
- Which tables/views are involved
- Key conditions and filters
- Any joins, subqueries or common table expressions
- SQLite-specific behaviour in use (type affinity, LIMIT/OFFSET, date() and strftime(), json_* functions)

Keep the explanation clear and minimal - avoid technical jargon where possible.

Explanation:"#
        )
    }

    fn natural_to_sql_prompt(&self, explanation: &str) -> String {
        format!(
            r#"You are an expert SQLite developer. Based on the following natural language description, write an optimized SQLite query.

Description: {explanation}

Requirements:
- Write SQLite-specific SQL syntax (SQLite 3.35 or later)
- Focus on performance optimization for a single-file embedded database
- SQLite has no optimizer hints; use INDEXED BY only when an index must be forced
- Use LIMIT/OFFSET for row limiting and window functions where they avoid correlated subqueries
- Keep predicates sargable and prefer covering or partial indexes in the query shape
- Use built-in functions such as date(), strftime(), ifnull(), coalesce() and json_extract() where relevant
- Avoid features SQLite lacks (RIGHT JOIN before 3.39, stored procedures, sequences)

Please provide only the SQL query without additional explanation:"#
        )
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }
}
