use metrics::{counter, histogram};
use std::time::Instant;

pub fn record_analysis_request() {
    counter!("analysis_requests_total").increment(1);
}

pub fn record_analysis_error(code: i32) {
    counter!("analysis_errors_total", "code" => code.to_string()).increment(1);
}

pub fn record_analysis_duration(start: Instant) {
    let duration = start.elapsed().as_secs_f64();
    histogram!("analysis_duration_seconds").record(duration);
}

pub fn record_query_executed() {
    counter!("queries_executed_total").increment(1);
}

pub fn record_sql_fallback() {
    counter!("sql_fallback_total").increment(1);
}

pub fn record_explanation_fallback() {
    counter!("explanation_fallback_total").increment(1);
}
