pub mod analyst;
pub mod config;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod gateway;
pub mod metrics;
pub mod prompt;
pub mod schema;
pub mod store;

pub use analyst::{Analyst, AnalysisResponse};
pub use config::{Config, GatewayConfig, LogFormat};
pub use error::{Error, Result};
pub use gateway::{GeminiGateway, GenerationGateway};
pub use schema::{ColumnDef, ColumnType};
pub use store::{ColumnInfo, QueryResult, TabularStore};
