//! Oracle Database prompts

use crate::generator::PromptGenerator;
use sqlround_core::DatabaseType;

/// Prompts tuned for Oracle SQL
#[derive(Debug, Clone, Copy, Default)]
pub struct OraclePromptGenerator;

impl PromptGenerator for OraclePromptGenerator {
    fn sql_to_natural_prompt(&self, sql_query: &str) -> String {
        format!(
            r#"You are an expert Oracle database analyst. Your task is to explain the following Oracle SQL query in simple, natural language.

SQL Query:
```sql
{sql_query}
```

Please provide a concise explanation of what this query does. Focus on:
- What data it retrieves or modifies
- Which tables/views are involved
- Key conditions and filters
- Any joins, subqueries or analytic operations
- Oracle-specific features in use (hints, ROWNUM, CONNECT BY, analytic functions, PL/SQL calls)

Keep the explanation clear and minimal - avoid technical jargon where possible.

Explanation:"#
        )
    }

    fn natural_to_sql_prompt(&self, explanation: &str) -> String {
        format!(
            r#"You are an expert Oracle SQL developer. Based on the following natural language description, write an optimized Oracle SQL query.

Description: {explanation}

Requirements:
- Write Oracle-specific SQL syntax (Oracle Database 19c or later)
- Focus on performance optimization
- Use optimizer hints such as /*+ INDEX */, /*+ LEADING */ or /*+ PARALLEL */ only where they are clearly beneficial
- Prefer analytic functions (ROW_NUMBER, RANK, LAG, LEAD) over self-joins
- Use FETCH FIRST n ROWS ONLY instead of ROWNUM filters for row limiting
- Keep predicates sargable so B-tree and function-based indexes can be used
- Use NVL, DECODE or CASE, and TO_DATE/TO_CHAR with explicit format masks where relevant

Please provide only the SQL query without additional explanation:"#
        )
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::Oracle
    }
}
