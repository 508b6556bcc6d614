use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IntelError;
use crate::metadata::{
    ColumnInfo, ConstraintInfo, FunctionInfo, IndexInfo, SchemaInfo, SequenceInfo, TableInfo,
    TriggerInfo, ViewInfo,
};

/// Columnar result of executing a statement through the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatementResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl StatementResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index of a column by name, case-insensitive.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Values of one column rendered as strings. Nulls become empty
    /// strings, non-string JSON values use their display form.
    pub fn string_values(&self, column: usize) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| match row.get(column) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            })
            .collect()
    }
}

/// Remote metadata source, implemented by the embedding application.
///
/// The tree engine never performs network I/O itself; it calls these
/// methods when a node is expanded and the child cache has no fresh
/// entry. Implementations are free to batch, debounce, or proxy over
/// IPC, as long as each call eventually resolves or fails.
///
/// `schema` parameters are `None` for engines without schema
/// namespaces (SQLite), in which case the backend scopes the call to
/// its single implicit namespace.
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    /// List database names visible on the connection.
    async fn list_databases(&self, connection_id: Uuid) -> Result<Vec<String>, IntelError>;

    /// List schemas of one database, including system schemas.
    /// The tree filters system schemas itself.
    async fn list_schemas(
        &self,
        connection_id: Uuid,
        database: &str,
    ) -> Result<Vec<SchemaInfo>, IntelError>;

    async fn list_tables(
        &self,
        connection_id: Uuid,
        schema: Option<&str>,
    ) -> Result<Vec<TableInfo>, IntelError>;

    async fn get_columns(
        &self,
        connection_id: Uuid,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ColumnInfo>, IntelError>;

    async fn list_indexes(
        &self,
        connection_id: Uuid,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<IndexInfo>, IntelError>;

    async fn list_constraints(
        &self,
        connection_id: Uuid,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ConstraintInfo>, IntelError>;

    async fn list_triggers(
        &self,
        connection_id: Uuid,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<TriggerInfo>, IntelError>;

    async fn list_views(
        &self,
        connection_id: Uuid,
        schema: Option<&str>,
    ) -> Result<Vec<ViewInfo>, IntelError>;

    async fn list_functions(
        &self,
        connection_id: Uuid,
        schema: Option<&str>,
    ) -> Result<Vec<FunctionInfo>, IntelError>;

    async fn list_sequences(
        &self,
        connection_id: Uuid,
        schema: Option<&str>,
    ) -> Result<Vec<SequenceInfo>, IntelError>;
}

/// Executes raw SQL on a connection, implemented by the embedding
/// application. The tree uses it for the per-engine admin queries
/// (listing users and roles); it is deliberately the same surface a
/// query editor would use.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    async fn execute(
        &self,
        connection_id: Uuid,
        sql: &str,
    ) -> Result<StatementResult, IntelError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ==================== StatementResult tests ====================

    #[test]
    fn column_index_is_case_insensitive() {
        let result = StatementResult {
            columns: vec!["Name".into(), "Host".into()],
            rows: vec![],
        };
        assert_eq!(result.column_index("name"), Some(0));
        assert_eq!(result.column_index("HOST"), Some(1));
        assert_eq!(result.column_index("missing"), None);
    }

    #[test]
    fn string_values_render_non_strings() {
        let result = StatementResult {
            columns: vec!["name".into()],
            rows: vec![
                vec![json!("alice")],
                vec![json!(42)],
                vec![json!(null)],
                vec![],
            ],
        };
        assert_eq!(result.string_values(0), vec!["alice", "42", "", ""]);
    }
}
