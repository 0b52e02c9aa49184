use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Connection;
use serde_json::{json, Map, Number, Value as JsonValue};

use crate::error::{Error, Result};
use crate::schema::{ColumnDef, ColumnType};

const TABLE_NAME: &str = "data";
const INSERT_BATCH_SIZE: usize = 1000;

pub fn quote_identifier(name: &str) -> String {
    name.replace('"', "\"\"")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// Result of a query against the `data` relation: columns in projection
/// order, rows in the engine's natural result order (no implicit sort).
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<JsonValue>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One JSON object per row, keyed by column name.
    pub fn to_row_objects(&self) -> Vec<JsonValue> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::with_capacity(self.columns.len());
                for (col, value) in self.columns.iter().zip(row.iter()) {
                    obj.insert(col.name.clone(), value.clone());
                }
                JsonValue::Object(obj)
            })
            .collect()
    }
}

/// One ephemeral in-memory relation named `data`, built from CSV text and
/// exclusively owned by a single analysis invocation.
pub struct TabularStore {
    conn: Connection,
}

impl TabularStore {
    /// Parses CSV text (header row first) into the `data` relation, inferring
    /// each column's type from value inspection. Replaces any prior relation
    /// of the same name.
    pub fn load(csv_text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().from_reader(csv_text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| Error::Ingestion(format!("Failed to parse CSV header: {}", e)))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(Error::Ingestion("CSV input has no header row".into()));
        }

        let mut records: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| Error::Ingestion(format!("Malformed CSV row: {}", e)))?;
            records.push(record.iter().map(|f| f.to_string()).collect());
        }

        let schema = infer_schema(&headers, &records);

        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Ingestion(format!("Failed to open in-memory store: {}", e)))?;

        let column_sql: Vec<String> = schema
            .iter()
            .map(|col| format!("\"{}\" {}", quote_identifier(&col.name), col.column_type.as_str()))
            .collect();

        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{table}\"; CREATE TABLE \"{table}\" ({columns});",
            table = TABLE_NAME,
            columns = column_sql.join(", ")
        ))
        .map_err(|e| Error::Ingestion(format!("Failed to create relation: {}", e)))?;

        let store = Self { conn };
        store.insert_rows(&schema, &records)?;
        Ok(store)
    }

    fn insert_rows(&self, schema: &[ColumnDef], records: &[Vec<String>]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let placeholders = vec!["?"; schema.len()].join(", ");
        let insert_sql = format!(
            "INSERT INTO \"{}\" VALUES ({})",
            TABLE_NAME, placeholders
        );

        for chunk in records.chunks(INSERT_BATCH_SIZE) {
            self.conn
                .execute_batch("BEGIN")
                .map_err(|e| Error::Ingestion(format!("Failed to begin insert: {}", e)))?;

            let mut stmt = self
                .conn
                .prepare_cached(&insert_sql)
                .map_err(|e| Error::Ingestion(format!("Failed to prepare insert: {}", e)))?;

            for record in chunk {
                let params: Vec<SqlValue> = schema
                    .iter()
                    .zip(record.iter())
                    .map(|(col, raw)| csv_field_to_sql(raw, col.column_type))
                    .collect();
                stmt.execute(rusqlite::params_from_iter(params))
                    .map_err(|e| Error::Ingestion(format!("Failed to insert row: {}", e)))?;
            }

            drop(stmt);
            self.conn
                .execute_batch("COMMIT")
                .map_err(|e| Error::Ingestion(format!("Failed to commit insert: {}", e)))?;
        }

        Ok(())
    }

    /// Runs `sql` against the relation. Read statements do not mutate it;
    /// write statements are permitted but the relation is per-request anyway.
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        let mut stmt = self.conn.prepare(sql).map_err(|e| Error::SqlExecution {
            message: e.to_string(),
            sql: sql.to_string(),
        })?;

        let columns: Vec<ColumnInfo> = stmt
            .columns()
            .iter()
            .map(|col| ColumnInfo {
                name: col.name().to_string(),
                data_type: ColumnType::from_declared(col.decl_type().unwrap_or(""))
                    .as_str()
                    .to_string(),
            })
            .collect();
        let column_count = columns.len();

        let mut rows = stmt.query([]).map_err(|e| Error::SqlExecution {
            message: e.to_string(),
            sql: sql.to_string(),
        })?;

        let mut out: Vec<Vec<JsonValue>> = Vec::new();
        loop {
            let row = rows.next().map_err(|e| Error::SqlExecution {
                message: e.to_string(),
                sql: sql.to_string(),
            })?;
            let Some(row) = row else { break };

            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                let value = row.get_ref(idx).map_err(|e| Error::SqlExecution {
                    message: e.to_string(),
                    sql: sql.to_string(),
                })?;
                values.push(sql_value_to_json(value));
            }
            out.push(values);
        }

        Ok(QueryResult {
            columns,
            rows: out,
        })
    }

    /// Ordered `(name, declared type)` pairs for the `data` relation.
    pub(crate) fn table_info(&self) -> Result<Vec<ColumnDef>> {
        let mut stmt = self
            .conn
            .prepare("PRAGMA table_info(data)")
            .map_err(|e| Error::Internal(format!("Failed to introspect schema: {}", e)))?;

        let columns = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let declared: String = row.get(2)?;
                Ok(ColumnDef::new(name, ColumnType::from_declared(&declared)))
            })
            .map_err(|e| Error::Internal(format!("Failed to introspect schema: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Internal(format!("Failed to introspect schema: {}", e)))?;

        Ok(columns)
    }
}

fn infer_schema(headers: &[String], records: &[Vec<String>]) -> Vec<ColumnDef> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let column_type = infer_column_type(records.iter().filter_map(|r| r.get(idx)));
            ColumnDef::new(name.clone(), column_type)
        })
        .collect()
}

fn infer_column_type<'a>(values: impl Iterator<Item = &'a String>) -> ColumnType {
    let mut saw_value = false;
    let mut all_integer = true;
    let mut all_numeric = true;

    for raw in values {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        saw_value = true;
        if trimmed.parse::<i64>().is_err() {
            all_integer = false;
        }
        if trimmed.parse::<f64>().is_err() {
            all_numeric = false;
            break;
        }
    }

    if !saw_value {
        ColumnType::Text
    } else if all_integer {
        ColumnType::Integer
    } else if all_numeric {
        ColumnType::Real
    } else {
        ColumnType::Text
    }
}

fn csv_field_to_sql(raw: &str, column_type: ColumnType) -> SqlValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return SqlValue::Null;
    }
    match column_type {
        ColumnType::Integer => trimmed
            .parse::<i64>()
            .map(SqlValue::Integer)
            .unwrap_or(SqlValue::Null),
        ColumnType::Real => trimmed
            .parse::<f64>()
            .map(SqlValue::Real)
            .unwrap_or(SqlValue::Null),
        _ => SqlValue::Text(raw.to_string()),
    }
}

fn sql_value_to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => json!(i),
        ValueRef::Real(f) => Number::from_f64(f).map(JsonValue::Number).unwrap_or(JsonValue::Null),
        ValueRef::Text(t) => JsonValue::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => JsonValue::String(String::from_utf8_lossy(b).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_round_trip() {
        let store = TabularStore::load("name,salary\nA,100\nB,200\nC,300\n").unwrap();
        let result = store.execute("SELECT * FROM data").unwrap();
        assert_eq!(result.row_count(), 3);
        assert_eq!(result.columns[0].name, "name");
        assert_eq!(result.columns[1].name, "salary");
    }

    #[test]
    fn test_load_infers_integer_and_text() {
        let store = TabularStore::load("name,salary\nA,100\nB,200\n").unwrap();
        let schema = store.table_info().unwrap();
        assert_eq!(schema[0].column_type, ColumnType::Text);
        assert_eq!(schema[1].column_type, ColumnType::Integer);
    }

    #[test]
    fn test_load_infers_real_for_mixed_numeric() {
        let store = TabularStore::load("price\n1.5\n2\n").unwrap();
        let schema = store.table_info().unwrap();
        assert_eq!(schema[0].column_type, ColumnType::Real);
    }

    #[test]
    fn test_load_empty_input_fails() {
        let result = TabularStore::load("");
        assert!(matches!(result, Err(Error::Ingestion(_))));
    }

    #[test]
    fn test_load_inconsistent_row_width_fails() {
        let result = TabularStore::load("a,b\n1,2\n3,4,5\n");
        assert!(matches!(result, Err(Error::Ingestion(_))));
    }

    #[test]
    fn test_load_empty_fields_become_null() {
        let store = TabularStore::load("name,salary\nA,\nB,200\n").unwrap();
        let result = store
            .execute("SELECT COUNT(*) as n FROM data WHERE salary IS NULL")
            .unwrap();
        assert_eq!(result.rows[0][0], json!(1));
    }

    #[test]
    fn test_execute_aggregate() {
        let store = TabularStore::load("name,salary\nA,100\nB,200\n").unwrap();
        let result = store
            .execute("SELECT AVG(salary) as average_salary FROM data")
            .unwrap();
        assert_eq!(result.rows[0][0], json!(150.0));
        assert_eq!(result.columns[0].name, "average_salary");
    }

    #[test]
    fn test_execute_invalid_sql() {
        let store = TabularStore::load("a\n1\n").unwrap();
        let err = store.execute("SELECT nope FROM data").unwrap_err();
        match err {
            Error::SqlExecution { sql, .. } => assert_eq!(sql, "SELECT nope FROM data"),
            other => panic!("Expected SqlExecution, got {:?}", other),
        }
    }

    #[test]
    fn test_execute_preserves_natural_order() {
        let store = TabularStore::load("v\n3\n1\n2\n").unwrap();
        let result = store.execute("SELECT v FROM data").unwrap();
        let values: Vec<_> = result.rows.iter().map(|r| r[0].clone()).collect();
        assert_eq!(values, vec![json!(3), json!(1), json!(2)]);
    }

    #[test]
    fn test_to_row_objects_keys_match_columns() {
        let store = TabularStore::load("name,salary\nA,100\n").unwrap();
        let result = store.execute("SELECT * FROM data").unwrap();
        let objects = result.to_row_objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["name"], json!("A"));
        assert_eq!(objects[0]["salary"], json!(100));
    }

    #[test]
    fn test_quoted_column_names() {
        let store = TabularStore::load("first name,age\nA,30\n").unwrap();
        let result = store.execute("SELECT \"first name\" FROM data").unwrap();
        assert_eq!(result.rows[0][0], json!("A"));
    }

    #[test]
    fn test_write_statement_permitted() {
        let store = TabularStore::load("v\n1\n").unwrap();
        store.execute("INSERT INTO data VALUES (2)").unwrap();
        let result = store.execute("SELECT COUNT(*) as n FROM data").unwrap();
        assert_eq!(result.rows[0][0], json!(2));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("plain"), "plain");
        assert_eq!(quote_identifier("has\"quote"), "has\"\"quote");
    }

    #[test]
    fn test_query_result_is_empty() {
        let store = TabularStore::load("v\n1\n").unwrap();
        let result = store.execute("SELECT v FROM data WHERE v > 10").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.row_count(), 0);
    }

    #[test]
    fn test_many_rows_batch_insert() {
        let mut csv_text = String::from("n\n");
        for i in 0..2500 {
            csv_text.push_str(&format!("{}\n", i));
        }
        let store = TabularStore::load(&csv_text).unwrap();
        let result = store.execute("SELECT COUNT(*) as n FROM data").unwrap();
        assert_eq!(result.rows[0][0], json!(2500));
    }
}
