use sqlintel_core::{ColumnInfo, SchemaInfo, StatementResult, TableInfo, ViewInfo};

pub fn schema_info(name: impl Into<String>) -> SchemaInfo {
    SchemaInfo {
        name: name.into(),
        ..SchemaInfo::default()
    }
}

pub fn system_schema(name: impl Into<String>) -> SchemaInfo {
    SchemaInfo {
        name: name.into(),
        is_system: true,
        ..SchemaInfo::default()
    }
}

/// Table as a bare listing returns it, schema not yet filled in.
pub fn table_named(name: impl Into<String>) -> TableInfo {
    TableInfo {
        name: name.into(),
        ..TableInfo::default()
    }
}

pub fn table_in_schema(schema: impl Into<String>, name: impl Into<String>) -> TableInfo {
    TableInfo {
        name: name.into(),
        schema: Some(schema.into()),
        ..TableInfo::default()
    }
}

pub fn view_in_schema(schema: impl Into<String>, name: impl Into<String>) -> ViewInfo {
    ViewInfo {
        name: name.into(),
        schema: Some(schema.into()),
        ..ViewInfo::default()
    }
}

pub fn column(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> ColumnInfo {
    ColumnInfo {
        name: name.into(),
        data_type: data_type.into(),
        nullable,
        ..ColumnInfo::default()
    }
}

pub fn pk_column(name: impl Into<String>, data_type: impl Into<String>) -> ColumnInfo {
    ColumnInfo {
        name: name.into(),
        data_type: data_type.into(),
        is_primary_key: true,
        ..ColumnInfo::default()
    }
}

/// Result shaped like the admin queries: one `name` column, one row
/// per entry.
pub fn name_result(names: &[&str]) -> StatementResult {
    StatementResult {
        columns: vec!["name".to_string()],
        rows: names
            .iter()
            .map(|name| vec![serde_json::Value::String((*name).to_string())])
            .collect(),
    }
}

/// Three-column `users` table with an integer primary key.
pub fn users_columns() -> Vec<ColumnInfo> {
    vec![
        pk_column("id", "integer"),
        column("name", "varchar", false),
        column("email", "varchar", true),
    ]
}
