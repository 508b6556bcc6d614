use crate::catalog::CatalogTable;
use crate::engine::EngineKind;

/// Per-engine completion policy: identifier formatting, keyword
/// vocabulary, and schema support.
///
/// Formatting here is for display and insertion in suggestions, not for
/// the catalog's index keys; the catalog keeps the default schema in its
/// full names while dialects omit it.
pub trait SqlDialect: Send + Sync {
    fn engine(&self) -> EngineKind;

    /// Render a table reference the way a user would type it.
    ///
    /// - PostgreSQL: `schema.name`, omitting the `public` schema
    /// - MySQL: `database.name` when a database is tracked
    /// - SQLite: bare name
    /// - SQL Server: `schema.name`, omitting the `dbo` schema
    fn format_table_name(&self, table: &CatalogTable) -> String;

    fn format_schema_name(&self, name: &str) -> String {
        name.to_string()
    }

    /// Quote an identifier (table/column name).
    ///
    /// - PostgreSQL/SQLite/SQL Server: `"name"` (double quotes)
    /// - MySQL: `` `name` `` (backticks)
    fn quote_identifier(&self, name: &str) -> String {
        let escaped = name.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    }

    /// Whether the engine exposes schema namespaces to complete on.
    /// MySQL counts: it treats databases as schemas.
    fn supports_schemas(&self) -> bool;

    /// Schema that qualified references may omit, if the engine has one.
    fn default_schema(&self) -> Option<&'static str> {
        None
    }

    fn keywords(&self) -> &'static [&'static str];
}

const POSTGRES_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "JOIN", "LEFT JOIN", "RIGHT JOIN",
    "INNER JOIN", "OUTER JOIN", "CROSS JOIN", "ON", "AND", "OR",
    "ORDER BY", "GROUP BY", "HAVING", "LIMIT", "OFFSET", "AS",
    "INSERT INTO", "VALUES", "UPDATE", "SET", "DELETE FROM",
    "CREATE TABLE", "ALTER TABLE", "DROP TABLE", "TRUNCATE",
    "DISTINCT", "COUNT", "SUM", "AVG", "MIN", "MAX",
    "CASE", "WHEN", "THEN", "ELSE", "END", "NULL", "NOT NULL",
    "PRIMARY KEY", "FOREIGN KEY", "REFERENCES", "UNIQUE", "INDEX",
    "RETURNING", "WITH", "RECURSIVE", "UNION", "INTERSECT", "EXCEPT",
    "COALESCE", "NULLIF", "CAST", "EXTRACT", "DATE_TRUNC",
    "ARRAY", "JSONB", "JSON", "LATERAL", "FILTER", "OVER", "PARTITION BY",
];

const MYSQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "JOIN", "LEFT JOIN", "RIGHT JOIN",
    "INNER JOIN", "OUTER JOIN", "CROSS JOIN", "ON", "AND", "OR",
    "ORDER BY", "GROUP BY", "HAVING", "LIMIT", "OFFSET", "AS",
    "INSERT INTO", "VALUES", "UPDATE", "SET", "DELETE FROM",
    "CREATE TABLE", "ALTER TABLE", "DROP TABLE", "TRUNCATE",
    "DISTINCT", "COUNT", "SUM", "AVG", "MIN", "MAX",
    "CASE", "WHEN", "THEN", "ELSE", "END", "NULL", "NOT NULL",
    "PRIMARY KEY", "FOREIGN KEY", "REFERENCES", "UNIQUE", "INDEX",
    "AUTO_INCREMENT", "ENGINE", "CHARSET", "COLLATE",
    "IF EXISTS", "IF NOT EXISTS", "REPLACE INTO", "ON DUPLICATE KEY",
    "COALESCE", "IFNULL", "NULLIF", "CAST", "CONVERT",
    "DATE_FORMAT", "STR_TO_DATE", "NOW", "CURDATE", "CURTIME",
    "JSON", "JSON_EXTRACT", "JSON_OBJECT", "JSON_ARRAY",
];

const SQLITE_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "JOIN", "LEFT JOIN", "CROSS JOIN",
    "INNER JOIN", "NATURAL JOIN", "ON", "AND", "OR",
    "ORDER BY", "GROUP BY", "HAVING", "LIMIT", "OFFSET", "AS",
    "INSERT INTO", "VALUES", "UPDATE", "SET", "DELETE FROM",
    "CREATE TABLE", "ALTER TABLE", "DROP TABLE",
    "DISTINCT", "COUNT", "SUM", "AVG", "MIN", "MAX", "TOTAL",
    "CASE", "WHEN", "THEN", "ELSE", "END", "NULL", "NOT NULL",
    "PRIMARY KEY", "FOREIGN KEY", "REFERENCES", "UNIQUE",
    "AUTOINCREMENT", "WITHOUT ROWID", "STRICT",
    "IF EXISTS", "IF NOT EXISTS", "REPLACE INTO", "INSERT OR REPLACE",
    "COALESCE", "IFNULL", "NULLIF", "TYPEOF", "CAST",
    "DATE", "TIME", "DATETIME", "JULIANDAY", "STRFTIME",
    "JSON", "JSON_EXTRACT", "JSON_OBJECT", "JSON_ARRAY",
    "GLOB", "LIKE", "BETWEEN", "IN", "EXISTS",
];

pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::Postgres
    }

    fn format_table_name(&self, table: &CatalogTable) -> String {
        match &table.schema {
            Some(schema) if schema != "public" => format!("{}.{}", schema, table.name),
            _ => table.name.clone(),
        }
    }

    fn supports_schemas(&self) -> bool {
        true
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("public")
    }

    fn keywords(&self) -> &'static [&'static str] {
        POSTGRES_KEYWORDS
    }
}

pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::MySql
    }

    fn format_table_name(&self, table: &CatalogTable) -> String {
        match &table.database {
            Some(database) => format!("{}.{}", database, table.name),
            None => table.name.clone(),
        }
    }

    fn quote_identifier(&self, name: &str) -> String {
        let escaped = name.replace('`', "``");
        format!("`{}`", escaped)
    }

    fn supports_schemas(&self) -> bool {
        true
    }

    fn keywords(&self) -> &'static [&'static str] {
        MYSQL_KEYWORDS
    }
}

pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::Sqlite
    }

    fn format_table_name(&self, table: &CatalogTable) -> String {
        table.name.clone()
    }

    fn supports_schemas(&self) -> bool {
        false
    }

    fn keywords(&self) -> &'static [&'static str] {
        SQLITE_KEYWORDS
    }
}

pub struct SqlServerDialect;

impl SqlDialect for SqlServerDialect {
    fn engine(&self) -> EngineKind {
        EngineKind::SqlServer
    }

    fn format_table_name(&self, table: &CatalogTable) -> String {
        match &table.schema {
            Some(schema) if schema != "dbo" => format!("{}.{}", schema, table.name),
            _ => table.name.clone(),
        }
    }

    fn supports_schemas(&self) -> bool {
        true
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("dbo")
    }

    // Close enough in practice; SQL Server has no curated list here.
    fn keywords(&self) -> &'static [&'static str] {
        POSTGRES_KEYWORDS
    }
}

/// Strategy for an engine. Unknown future engines would get the
/// PostgreSQL strategy, the most conservative of the set.
pub fn dialect_for(engine: EngineKind) -> &'static dyn SqlDialect {
    static POSTGRES: PostgresDialect = PostgresDialect;
    static MYSQL: MySqlDialect = MySqlDialect;
    static SQLITE: SqliteDialect = SqliteDialect;
    static SQL_SERVER: SqlServerDialect = SqlServerDialect;

    match engine {
        EngineKind::Postgres => &POSTGRES,
        EngineKind::MySql => &MYSQL,
        EngineKind::Sqlite => &SQLITE,
        EngineKind::SqlServer => &SQL_SERVER,
    }
}
