use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::extract;
use crate::fallback;
use crate::gateway::GenerationGateway;
use crate::metrics::{
    record_analysis_duration, record_analysis_error, record_analysis_request,
    record_explanation_fallback, record_query_executed, record_sql_fallback,
};
use crate::prompt;
use crate::schema;
use crate::store::TabularStore;

/// The terminal artifact of one analysis invocation. Exactly one shape is
/// produced; fields are never partially populated across the two shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResponse {
    Success {
        explanation: String,
        result: Vec<JsonValue>,
        sql_query: String,
    },
    Error {
        error: String,
        sql_query: Option<String>,
        result: Option<()>,
    },
}

/// Composes ingestion, schema introspection, SQL generation, extraction,
/// execution, and explanation into the end-to-end pipeline, with an
/// independent heuristic fallback behind each of the two gateway calls.
pub struct Analyst {
    gateway: Arc<dyn GenerationGateway>,
}

impl Analyst {
    pub fn new(gateway: Arc<dyn GenerationGateway>) -> Self {
        Self { gateway }
    }

    /// Runs the full question-to-answer pipeline over one CSV payload. The
    /// dataset lives only for the duration of this call; failures come back
    /// as the structured error shape, never as a panic.
    pub async fn analyze(&self, csv_text: &str, question: &str) -> AnalysisResponse {
        record_analysis_request();
        let start = Instant::now();

        let response = match self.run_pipeline(csv_text, question).await {
            Ok(response) => response,
            Err(err) => {
                record_analysis_error(err.code());
                AnalysisResponse::Error {
                    error: err.to_string(),
                    sql_query: err.attempted_sql().map(str::to_string),
                    result: None,
                }
            }
        };

        record_analysis_duration(start);
        response
    }

    async fn run_pipeline(&self, csv_text: &str, question: &str) -> Result<AnalysisResponse> {
        let store = TabularStore::load(csv_text)?;
        let dataset_schema = schema::describe(&store)?;
        let columns = schema::column_names(&dataset_schema);
        debug!(columns = columns.len(), "Dataset ingested");

        let sql_query = self.generate_sql(question, &dataset_schema, &columns).await?;

        let result = store.execute(&sql_query)?;
        record_query_executed();
        let rows = result.to_row_objects();
        debug!(rows = rows.len(), "Query executed");

        let explanation = self.generate_explanation(question, &sql_query, &rows).await;

        Ok(AnalysisResponse::Success {
            explanation,
            result: rows,
            sql_query,
        })
    }

    async fn generate_sql(
        &self,
        question: &str,
        dataset_schema: &[schema::ColumnDef],
        columns: &[&str],
    ) -> Result<String> {
        let sql_prompt = prompt::build_sql_prompt(dataset_schema, question);
        match self.gateway.generate(&sql_prompt).await {
            Ok(raw) => match extract::extract(&raw) {
                Some(sql) => Ok(sql),
                None => {
                    info!("No SQL extracted from generated text, using heuristic tier");
                    self.fallback_sql(question, columns)
                }
            },
            Err(err) => {
                info!(error = %err, "SQL generation failed, using heuristic tier");
                self.fallback_sql(question, columns)
            }
        }
    }

    fn fallback_sql(&self, question: &str, columns: &[&str]) -> Result<String> {
        record_sql_fallback();
        let sql = fallback::generate_sql(question, columns);
        if extract::is_valid_sql(&sql) {
            Ok(sql)
        } else {
            Err(Error::FallbackExhausted(format!(
                "heuristic tier produced no usable statement for question: {}",
                question
            )))
        }
    }

    async fn generate_explanation(
        &self,
        question: &str,
        sql_query: &str,
        rows: &[JsonValue],
    ) -> String {
        let explain_prompt = prompt::build_explanation_prompt(question, sql_query, rows);
        match self.gateway.generate(&explain_prompt).await {
            Ok(text) => text,
            Err(err) => {
                info!(error = %err, "Explanation generation failed, using heuristic tier");
                record_explanation_fallback();
                fallback::generate_explanation(sql_query, rows.len())
            }
        }
    }
}
