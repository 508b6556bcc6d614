use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Database engines the intelligence layer understands.
///
/// Serialized names match the wire strings used by the embedding
/// application ("postgresql", "mysql", "sqlite", "sqlserver").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[serde(rename = "postgresql")]
    Postgres,
    MySql,
    Sqlite,
    SqlServer,
}

bitflags! {
    /// Administrative surface an engine exposes.
    ///
    /// Drives which folders the schema tree materializes under a database
    /// node (users, roles) and which admin actions a host UI may offer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AdminFeatures: u64 {
        /// Real schema namespaces below the database level.
        const SCHEMAS = 1 << 0;
        /// Login users can be enumerated.
        const USERS = 1 << 1;
        /// Non-login roles can be enumerated.
        const ROLES = 1 << 2;
        /// GRANT/REVOKE statements are supported.
        const GRANT_REVOKE = 1 << 3;
        /// ALTER TABLE is generally usable (SQLite's is too limited).
        const ALTER_TABLE = 1 << 4;
        /// View definitions can be read back.
        const VIEW_DEFINITION = 1 << 5;
    }
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::Postgres,
        EngineKind::MySql,
        EngineKind::Sqlite,
        EngineKind::SqlServer,
    ];

    /// Human-readable name for UI display.
    pub fn display_name(&self) -> &'static str {
        match self {
            EngineKind::Postgres => "PostgreSQL",
            EngineKind::MySql => "MySQL",
            EngineKind::Sqlite => "SQLite",
            EngineKind::SqlServer => "SQL Server",
        }
    }

    pub fn admin_features(&self) -> AdminFeatures {
        match self {
            EngineKind::Postgres | EngineKind::SqlServer => AdminFeatures::all(),
            EngineKind::MySql => {
                AdminFeatures::USERS
                    | AdminFeatures::GRANT_REVOKE
                    | AdminFeatures::ALTER_TABLE
                    | AdminFeatures::VIEW_DEFINITION
            }
            EngineKind::Sqlite => AdminFeatures::VIEW_DEFINITION,
        }
    }

    /// SQL listing login users, with the login name in a `name` column.
    ///
    /// Returns `None` for engines without a user concept (SQLite).
    pub fn users_query(&self) -> Option<&'static str> {
        match self {
            EngineKind::Postgres => Some("SELECT usename as name FROM pg_catalog.pg_user;"),
            EngineKind::MySql => Some("SELECT User as name, Host as host FROM mysql.user;"),
            EngineKind::Sqlite => None,
            EngineKind::SqlServer => {
                Some("SELECT name FROM sys.database_principals WHERE type IN ('S', 'U');")
            }
        }
    }

    /// SQL listing non-login roles, with the role name in a `name` column.
    pub fn roles_query(&self) -> Option<&'static str> {
        match self {
            EngineKind::Postgres => {
                Some("SELECT rolname as name FROM pg_roles WHERE rolcanlogin = false;")
            }
            EngineKind::MySql => Some("SELECT User as name FROM mysql.user;"),
            EngineKind::Sqlite => None,
            EngineKind::SqlServer => {
                Some("SELECT name FROM sys.database_principals WHERE type = 'R';")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== serde tests ====================

    #[test]
    fn serializes_to_wire_names() {
        assert_eq!(
            serde_json::to_string(&EngineKind::Postgres).unwrap(),
            "\"postgresql\""
        );
        assert_eq!(
            serde_json::to_string(&EngineKind::MySql).unwrap(),
            "\"mysql\""
        );
        assert_eq!(
            serde_json::to_string(&EngineKind::Sqlite).unwrap(),
            "\"sqlite\""
        );
        assert_eq!(
            serde_json::to_string(&EngineKind::SqlServer).unwrap(),
            "\"sqlserver\""
        );
    }

    #[test]
    fn deserializes_from_wire_names() {
        let kind: EngineKind = serde_json::from_str("\"postgresql\"").unwrap();
        assert_eq!(kind, EngineKind::Postgres);
        let kind: EngineKind = serde_json::from_str("\"sqlserver\"").unwrap();
        assert_eq!(kind, EngineKind::SqlServer);
    }

    // ==================== admin feature tests ====================

    #[test]
    fn postgres_has_full_admin_surface() {
        let features = EngineKind::Postgres.admin_features();
        assert!(features.contains(AdminFeatures::SCHEMAS));
        assert!(features.contains(AdminFeatures::USERS));
        assert!(features.contains(AdminFeatures::ROLES));
    }

    #[test]
    fn mysql_has_users_but_not_roles() {
        let features = EngineKind::MySql.admin_features();
        assert!(features.contains(AdminFeatures::USERS));
        assert!(!features.contains(AdminFeatures::ROLES));
        assert!(!features.contains(AdminFeatures::SCHEMAS));
    }

    #[test]
    fn sqlite_has_no_user_concept() {
        let features = EngineKind::Sqlite.admin_features();
        assert!(!features.contains(AdminFeatures::USERS));
        assert!(!features.contains(AdminFeatures::ROLES));
        assert!(EngineKind::Sqlite.users_query().is_none());
        assert!(EngineKind::Sqlite.roles_query().is_none());
    }

    #[test]
    fn admin_queries_exist_where_features_do() {
        for engine in EngineKind::ALL {
            let features = engine.admin_features();
            if features.contains(AdminFeatures::USERS) {
                assert!(engine.users_query().is_some(), "{engine:?}");
            }
        }
    }
}
