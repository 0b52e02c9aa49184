//! Deterministic heuristic tier: synthesizes SQL and explanations without
//! the generation gateway. This is the pipeline's only guaranteed-available
//! analysis path.

/// Column-name keywords treated as numeric-semantic for aggregate targets.
const NUMERIC_KEYWORDS: &[&str] = &[
    "salary", "price", "amount", "value", "cost", "revenue", "income", "age", "count", "number",
];

/// Column-name keywords treated as grouping-semantic.
const GROUPING_KEYWORDS: &[&str] = &["department", "category", "region", "type", "group", "class"];

/// Question words that imply a grouped aggregate.
const GROUPING_TRIGGERS: &[&str] = &["by", "group", "department", "category", "region"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregate {
    Avg,
    Sum,
    Count,
    Max,
    Min,
}

struct Rule {
    triggers: &'static [&'static str],
    aggregate: Aggregate,
}

/// Ordered decision table, evaluated top to bottom; first match wins.
const RULES: &[Rule] = &[
    Rule {
        triggers: &["average", "mean", "avg"],
        aggregate: Aggregate::Avg,
    },
    Rule {
        triggers: &["sum", "total"],
        aggregate: Aggregate::Sum,
    },
    Rule {
        triggers: &["count", "how many", "number of"],
        aggregate: Aggregate::Count,
    },
    Rule {
        triggers: &["max", "maximum", "highest"],
        aggregate: Aggregate::Max,
    },
    Rule {
        triggers: &["min", "minimum", "lowest"],
        aggregate: Aggregate::Min,
    },
];

const DEFAULT_SQL: &str = "SELECT * FROM data LIMIT 10";

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn first_matching_column<'a>(columns: &'a [&str], keywords: &[&str]) -> Option<&'a str> {
    columns
        .iter()
        .find(|col| contains_any(&col.to_lowercase(), keywords))
        .copied()
}

/// Synthesizes a SQL statement from question keywords and column names.
/// Always returns a statement; the `SELECT * FROM data LIMIT 10` default
/// covers questions no rule matches and rules whose required column is
/// absent.
pub fn generate_sql(question: &str, columns: &[&str]) -> String {
    let question_lower = question.to_lowercase();

    let Some(rule) = RULES
        .iter()
        .find(|rule| contains_any(&question_lower, rule.triggers))
    else {
        return DEFAULT_SQL.to_string();
    };

    let wants_grouping = contains_any(&question_lower, GROUPING_TRIGGERS);
    let group_col = first_matching_column(columns, GROUPING_KEYWORDS);

    match rule.aggregate {
        Aggregate::Count => match (wants_grouping, group_col) {
            (true, Some(group)) => format!(
                "SELECT {group}, COUNT(*) as count FROM data GROUP BY {group}",
                group = group
            ),
            _ => "SELECT COUNT(*) as total_count FROM data".to_string(),
        },
        aggregate => {
            let Some(col) = first_matching_column(columns, NUMERIC_KEYWORDS) else {
                return DEFAULT_SQL.to_string();
            };
            match aggregate {
                Aggregate::Avg => grouped_or_plain("AVG", "average", col, wants_grouping, group_col),
                Aggregate::Sum => grouped_or_plain("SUM", "total", col, wants_grouping, group_col),
                Aggregate::Max => format!("SELECT MAX({col}) as max_{col} FROM data", col = col),
                Aggregate::Min => format!("SELECT MIN({col}) as min_{col} FROM data", col = col),
                Aggregate::Count => unreachable!(),
            }
        }
    }
}

fn grouped_or_plain(
    func: &str,
    alias_prefix: &str,
    col: &str,
    wants_grouping: bool,
    group_col: Option<&str>,
) -> String {
    match (wants_grouping, group_col) {
        (true, Some(group)) => format!(
            "SELECT {group}, {func}({col}) as {prefix}_{col} FROM data GROUP BY {group}",
            group = group,
            func = func,
            col = col,
            prefix = alias_prefix
        ),
        _ => format!(
            "SELECT {func}({col}) as {prefix}_{col} FROM data",
            func = func,
            col = col,
            prefix = alias_prefix
        ),
    }
}

/// Deterministic explanation for when the gateway fails. Selects wording by
/// which aggregate appears in the executed SQL (case-insensitive substring,
/// AVG/SUM/COUNT/MAX/MIN order, first match wins), reports the row count,
/// and always includes the literal SQL text.
pub fn generate_explanation(sql_query: &str, row_count: usize) -> String {
    if row_count == 0 {
        return "No data was returned from the query.".to_string();
    }

    let sql_upper = sql_query.to_uppercase();

    if sql_upper.contains("AVG") {
        explanation_line("average", row_count, sql_query)
    } else if sql_upper.contains("SUM") {
        explanation_line("total", row_count, sql_query)
    } else if sql_upper.contains("COUNT") {
        format!(
            "The analysis shows the count of records: {} total records found. The query used was: {}",
            row_count, sql_query
        )
    } else if sql_upper.contains("MAX") {
        explanation_line("maximum", row_count, sql_query)
    } else if sql_upper.contains("MIN") {
        explanation_line("minimum", row_count, sql_query)
    } else {
        format!(
            "The analysis returned {} records based on your question. The query used was: {}",
            row_count, sql_query
        )
    }
}

fn explanation_line(adjective: &str, row_count: usize, sql_query: &str) -> String {
    format!(
        "The analysis shows the {} values across {} records. The query used was: {}",
        adjective, row_count, sql_query
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_grouped() {
        let sql = generate_sql(
            "What is the average salary by department?",
            &["salary", "department"],
        );
        assert_eq!(
            sql,
            "SELECT department, AVG(salary) as average_salary FROM data GROUP BY department"
        );
    }

    #[test]
    fn test_average_ungrouped() {
        let sql = generate_sql("average salary", &["name", "salary"]);
        assert_eq!(sql, "SELECT AVG(salary) as average_salary FROM data");
    }

    #[test]
    fn test_average_no_numeric_column_falls_to_default() {
        let sql = generate_sql("what is the average?", &["name", "city"]);
        assert_eq!(sql, DEFAULT_SQL);
    }

    #[test]
    fn test_average_grouping_word_but_no_group_column() {
        let sql = generate_sql("average salary by team", &["salary", "team"]);
        assert_eq!(sql, "SELECT AVG(salary) as average_salary FROM data");
    }

    #[test]
    fn test_sum_grouped() {
        let sql = generate_sql(
            "total revenue by region",
            &["revenue", "region"],
        );
        assert_eq!(
            sql,
            "SELECT region, SUM(revenue) as total_revenue FROM data GROUP BY region"
        );
    }

    #[test]
    fn test_sum_ungrouped() {
        let sql = generate_sql("sum of cost", &["cost"]);
        assert_eq!(sql, "SELECT SUM(cost) as total_cost FROM data");
    }

    #[test]
    fn test_count_plain() {
        let sql = generate_sql("How many rows are there?", &["x", "y"]);
        assert_eq!(sql, "SELECT COUNT(*) as total_count FROM data");
    }

    #[test]
    fn test_count_grouped() {
        let sql = generate_sql("how many employees by category?", &["name", "category"]);
        assert_eq!(
            sql,
            "SELECT category, COUNT(*) as count FROM data GROUP BY category"
        );
    }

    #[test]
    fn test_count_grouping_word_without_group_column() {
        let sql = generate_sql("how many by team?", &["name", "team"]);
        assert_eq!(sql, "SELECT COUNT(*) as total_count FROM data");
    }

    #[test]
    fn test_max() {
        let sql = generate_sql("highest price?", &["item", "price"]);
        assert_eq!(sql, "SELECT MAX(price) as max_price FROM data");
    }

    #[test]
    fn test_min() {
        let sql = generate_sql("lowest age", &["name", "age"]);
        assert_eq!(sql, "SELECT MIN(age) as min_age FROM data");
    }

    #[test]
    fn test_no_rule_matches_default() {
        let sql = generate_sql("show me something interesting", &["a", "b"]);
        assert_eq!(sql, DEFAULT_SQL);
    }

    #[test]
    fn test_rule_precedence_average_before_sum() {
        // "average total cost" matches the average rule first.
        let sql = generate_sql("average total cost", &["cost"]);
        assert_eq!(sql, "SELECT AVG(cost) as average_cost FROM data");
    }

    #[test]
    fn test_first_numeric_column_wins() {
        let sql = generate_sql("average", &["price", "salary"]);
        assert_eq!(sql, "SELECT AVG(price) as average_price FROM data");
    }

    #[test]
    fn test_column_keyword_match_is_substring() {
        let sql = generate_sql("average", &["base_salary"]);
        assert_eq!(sql, "SELECT AVG(base_salary) as average_base_salary FROM data");
    }

    #[test]
    fn test_explanation_empty_result() {
        assert_eq!(
            generate_explanation("SELECT AVG(x) FROM data", 0),
            "No data was returned from the query."
        );
    }

    #[test]
    fn test_explanation_avg() {
        let text = generate_explanation("SELECT AVG(salary) as average_salary FROM data", 1);
        assert_eq!(
            text,
            "The analysis shows the average values across 1 records. The query used was: SELECT AVG(salary) as average_salary FROM data"
        );
    }

    #[test]
    fn test_explanation_sum() {
        let text = generate_explanation("SELECT SUM(cost) as total_cost FROM data", 3);
        assert!(text.contains("total values across 3 records"));
        assert!(text.contains("SELECT SUM(cost) as total_cost FROM data"));
    }

    #[test]
    fn test_explanation_count() {
        let text = generate_explanation("SELECT COUNT(*) as total_count FROM data", 1);
        assert!(text.contains("count of records: 1 total records found"));
    }

    #[test]
    fn test_explanation_max_min() {
        assert!(generate_explanation("SELECT MAX(v) FROM data", 1).contains("maximum values"));
        assert!(generate_explanation("SELECT MIN(v) FROM data", 1).contains("minimum values"));
    }

    #[test]
    fn test_explanation_precedence_avg_over_count() {
        // AVG wins when both appear, per the fixed check order.
        let text = generate_explanation("SELECT AVG(x), COUNT(*) FROM data", 2);
        assert!(text.contains("average values"));
    }

    #[test]
    fn test_explanation_generic() {
        let text = generate_explanation("SELECT * FROM data LIMIT 10", 10);
        assert_eq!(
            text,
            "The analysis returned 10 records based on your question. The query used was: SELECT * FROM data LIMIT 10"
        );
    }

    #[test]
    fn test_explanation_case_insensitive_verb_check() {
        let text = generate_explanation("select avg(salary) from data", 1);
        assert!(text.contains("average values"));
    }
}
