use serde_json::Value as JsonValue;

use crate::schema::{self, ColumnDef};

/// Prompt instructing the generator to translate a question into a single
/// fenced SQL statement against the `data` relation. Deterministic: identical
/// `(schema, question)` pairs always produce an identical prompt.
pub fn build_sql_prompt(schema: &[ColumnDef], question: &str) -> String {
    format!(
        r#"You are an expert data analyst. The database has a single table named 'data'.
Schema:
{schema}

User question: "{question}"

Translate this to a precise SQL query that answers the question. Consider ambiguities like date ranges (e.g., 'last quarter' might mean the most recent 3 months based on data).

IMPORTANT: You must respond with ONLY the SQL query wrapped in ```sql and ``` markers. Do not include any other text, explanations, or formatting.

Example format:
```sql
SELECT column1, column2 FROM data WHERE condition;
```

Your response:"#,
        schema = schema::render(schema),
        question = question
    )
}

/// Prompt asking the generator for a concise explanation of the executed
/// query's results, covering insights, trends, and caveats.
pub fn build_explanation_prompt(question: &str, sql_query: &str, rows: &[JsonValue]) -> String {
    let result_json = serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"You are an expert data analyst.
User question: "{question}"
SQL query used: {sql_query}
Query results:
{result_json}

Provide a clear natural language explanation of the results, including key insights, trends, and any caveats (e.g., data assumptions or limitations). Keep it concise."#,
        question = question,
        sql_query = sql_query,
        result_json = result_json
    )
}
