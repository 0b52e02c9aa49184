use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::TabularStore;

/// Declared SQLite storage class for a column of the `data` relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
    Null,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
            ColumnType::Null => "NULL",
        }
    }

    pub fn from_declared(type_str: &str) -> Self {
        match type_str.to_uppercase().as_str() {
            "INTEGER" | "INT" => ColumnType::Integer,
            "REAL" | "FLOAT" | "DOUBLE" => ColumnType::Real,
            "TEXT" | "VARCHAR" | "STRING" => ColumnType::Text,
            "BLOB" => ColumnType::Blob,
            "" | "NULL" => ColumnType::Null,
            _ => ColumnType::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Real)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }
}

/// Returns the ordered column list of the `data` relation, names verbatim
/// and in table order. Pure read; used for prompt construction and for the
/// fallback tier's keyword matching.
pub fn describe(store: &TabularStore) -> Result<Vec<ColumnDef>> {
    store.table_info()
}

/// Textual rendering of a schema for embedding into prompts. Deterministic:
/// identical schemas always render identically.
pub fn render(schema: &[ColumnDef]) -> String {
    let mut out = String::from("cid  name  type\n");
    for (cid, col) in schema.iter().enumerate() {
        out.push_str(&format!("{}  {}  {}\n", cid, col.name, col.column_type.as_str()));
    }
    out
}

/// Column names only, in schema order.
pub fn column_names(schema: &[ColumnDef]) -> Vec<&str> {
    schema.iter().map(|c| c.name.as_str()).collect()
}
