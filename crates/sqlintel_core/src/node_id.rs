use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Typed identity of a metadata tree node.
///
/// Every node encodes its type and the coordinates of its remote object
/// (connection, and where applicable database/schema/table/name), so an id
/// alone is enough to dispatch the right fetch when the node is expanded.
/// Ids round-trip through `Display`/`FromStr` for host applications that
/// persist expansion state as strings.
///
/// Encoding uses pipe (`|`) as the separator since it cannot appear in
/// database identifiers, unlike underscore which is common in table and
/// schema names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    Connection {
        connection_id: Uuid,
    },
    Database {
        connection_id: Uuid,
        name: String,
    },
    Schema {
        connection_id: Uuid,
        database: String,
        name: String,
    },

    // Admin folders and their leaves, scoped to a database
    UsersFolder {
        connection_id: Uuid,
        database: String,
    },
    RolesFolder {
        connection_id: Uuid,
        database: String,
    },
    User {
        connection_id: Uuid,
        database: String,
        name: String,
    },
    Role {
        connection_id: Uuid,
        database: String,
        name: String,
    },

    // Object folders below a schema
    TablesFolder {
        connection_id: Uuid,
        database: String,
        schema: String,
    },
    ViewsFolder {
        connection_id: Uuid,
        database: String,
        schema: String,
    },
    FunctionsFolder {
        connection_id: Uuid,
        database: String,
        schema: String,
    },
    SequencesFolder {
        connection_id: Uuid,
        database: String,
        schema: String,
    },

    // Schema-level objects
    Table {
        connection_id: Uuid,
        schema: String,
        name: String,
    },
    View {
        connection_id: Uuid,
        schema: String,
        name: String,
    },
    Function {
        connection_id: Uuid,
        schema: String,
        name: String,
    },
    Sequence {
        connection_id: Uuid,
        schema: String,
        name: String,
    },

    // Table detail folders
    ColumnsFolder {
        connection_id: Uuid,
        schema: String,
        table: String,
    },
    IndexesFolder {
        connection_id: Uuid,
        schema: String,
        table: String,
    },
    ConstraintsFolder {
        connection_id: Uuid,
        schema: String,
        table: String,
    },
    TriggersFolder {
        connection_id: Uuid,
        schema: String,
        table: String,
    },

    // Table detail leaves
    Column {
        connection_id: Uuid,
        schema: String,
        table: String,
        name: String,
    },
    Index {
        connection_id: Uuid,
        schema: String,
        table: String,
        name: String,
    },
    Constraint {
        connection_id: Uuid,
        schema: String,
        table: String,
        name: String,
    },
    Trigger {
        connection_id: Uuid,
        schema: String,
        table: String,
        name: String,
    },
}

/// Simple kind enum for cheap matching without data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Connection,
    Database,
    Schema,
    UsersFolder,
    RolesFolder,
    User,
    Role,
    TablesFolder,
    ViewsFolder,
    FunctionsFolder,
    SequencesFolder,
    Table,
    View,
    Function,
    Sequence,
    ColumnsFolder,
    IndexesFolder,
    ConstraintsFolder,
    TriggersFolder,
    Column,
    Index,
    Constraint,
    Trigger,
}

impl NodeKind {
    /// Whether nodes of this kind can have children at all.
    pub fn is_expandable(&self) -> bool {
        !matches!(
            self,
            NodeKind::User
                | NodeKind::Role
                | NodeKind::View
                | NodeKind::Function
                | NodeKind::Sequence
                | NodeKind::Column
                | NodeKind::Index
                | NodeKind::Constraint
                | NodeKind::Trigger
        )
    }

    /// Display label for folder kinds, `None` for object kinds.
    pub fn folder_label(&self) -> Option<&'static str> {
        match self {
            NodeKind::UsersFolder => Some("Users"),
            NodeKind::RolesFolder => Some("Roles"),
            NodeKind::TablesFolder => Some("Tables"),
            NodeKind::ViewsFolder => Some("Views"),
            NodeKind::FunctionsFolder => Some("Functions"),
            NodeKind::SequencesFolder => Some("Sequences"),
            NodeKind::ColumnsFolder => Some("Columns"),
            NodeKind::IndexesFolder => Some("Indexes"),
            NodeKind::ConstraintsFolder => Some("Constraints"),
            NodeKind::TriggersFolder => Some("Triggers"),
            _ => None,
        }
    }
}

impl NodeId {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Connection { .. } => NodeKind::Connection,
            Self::Database { .. } => NodeKind::Database,
            Self::Schema { .. } => NodeKind::Schema,
            Self::UsersFolder { .. } => NodeKind::UsersFolder,
            Self::RolesFolder { .. } => NodeKind::RolesFolder,
            Self::User { .. } => NodeKind::User,
            Self::Role { .. } => NodeKind::Role,
            Self::TablesFolder { .. } => NodeKind::TablesFolder,
            Self::ViewsFolder { .. } => NodeKind::ViewsFolder,
            Self::FunctionsFolder { .. } => NodeKind::FunctionsFolder,
            Self::SequencesFolder { .. } => NodeKind::SequencesFolder,
            Self::Table { .. } => NodeKind::Table,
            Self::View { .. } => NodeKind::View,
            Self::Function { .. } => NodeKind::Function,
            Self::Sequence { .. } => NodeKind::Sequence,
            Self::ColumnsFolder { .. } => NodeKind::ColumnsFolder,
            Self::IndexesFolder { .. } => NodeKind::IndexesFolder,
            Self::ConstraintsFolder { .. } => NodeKind::ConstraintsFolder,
            Self::TriggersFolder { .. } => NodeKind::TriggersFolder,
            Self::Column { .. } => NodeKind::Column,
            Self::Index { .. } => NodeKind::Index,
            Self::Constraint { .. } => NodeKind::Constraint,
            Self::Trigger { .. } => NodeKind::Trigger,
        }
    }

    /// The owning connection. Every node belongs to exactly one.
    pub fn connection_id(&self) -> Uuid {
        match self {
            Self::Connection { connection_id }
            | Self::Database { connection_id, .. }
            | Self::Schema { connection_id, .. }
            | Self::UsersFolder { connection_id, .. }
            | Self::RolesFolder { connection_id, .. }
            | Self::User { connection_id, .. }
            | Self::Role { connection_id, .. }
            | Self::TablesFolder { connection_id, .. }
            | Self::ViewsFolder { connection_id, .. }
            | Self::FunctionsFolder { connection_id, .. }
            | Self::SequencesFolder { connection_id, .. }
            | Self::Table { connection_id, .. }
            | Self::View { connection_id, .. }
            | Self::Function { connection_id, .. }
            | Self::Sequence { connection_id, .. }
            | Self::ColumnsFolder { connection_id, .. }
            | Self::IndexesFolder { connection_id, .. }
            | Self::ConstraintsFolder { connection_id, .. }
            | Self::TriggersFolder { connection_id, .. }
            | Self::Column { connection_id, .. }
            | Self::Index { connection_id, .. }
            | Self::Constraint { connection_id, .. }
            | Self::Trigger { connection_id, .. } => *connection_id,
        }
    }
}

// Prefix tags for the pipe-delimited encoding.
const P_CONNECTION: &str = "C";
const P_DATABASE: &str = "D";
const P_SCHEMA: &str = "S";
const P_USERS_FOLDER: &str = "UF";
const P_ROLES_FOLDER: &str = "RF";
const P_USER: &str = "U";
const P_ROLE: &str = "R";
const P_TABLES_FOLDER: &str = "TF";
const P_VIEWS_FOLDER: &str = "VF";
const P_FUNCTIONS_FOLDER: &str = "FF";
const P_SEQUENCES_FOLDER: &str = "QF";
const P_TABLE: &str = "T";
const P_VIEW: &str = "V";
const P_FUNCTION: &str = "F";
const P_SEQUENCE: &str = "Q";
const P_COLUMNS_FOLDER: &str = "CF";
const P_INDEXES_FOLDER: &str = "XF";
const P_CONSTRAINTS_FOLDER: &str = "KF";
const P_TRIGGERS_FOLDER: &str = "GF";
const P_COLUMN: &str = "CL";
const P_INDEX: &str = "X";
const P_CONSTRAINT: &str = "K";
const P_TRIGGER: &str = "G";

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conn = self.connection_id();
        match self {
            Self::Connection { .. } => write!(f, "{}|{}", P_CONNECTION, conn),
            Self::Database { name, .. } => write!(f, "{}|{}|{}", P_DATABASE, conn, name),
            Self::Schema { database, name, .. } => {
                write!(f, "{}|{}|{}|{}", P_SCHEMA, conn, database, name)
            }
            Self::UsersFolder { database, .. } => {
                write!(f, "{}|{}|{}", P_USERS_FOLDER, conn, database)
            }
            Self::RolesFolder { database, .. } => {
                write!(f, "{}|{}|{}", P_ROLES_FOLDER, conn, database)
            }
            Self::User { database, name, .. } => {
                write!(f, "{}|{}|{}|{}", P_USER, conn, database, name)
            }
            Self::Role { database, name, .. } => {
                write!(f, "{}|{}|{}|{}", P_ROLE, conn, database, name)
            }
            Self::TablesFolder {
                database, schema, ..
            } => write!(f, "{}|{}|{}|{}", P_TABLES_FOLDER, conn, database, schema),
            Self::ViewsFolder {
                database, schema, ..
            } => write!(f, "{}|{}|{}|{}", P_VIEWS_FOLDER, conn, database, schema),
            Self::FunctionsFolder {
                database, schema, ..
            } => write!(f, "{}|{}|{}|{}", P_FUNCTIONS_FOLDER, conn, database, schema),
            Self::SequencesFolder {
                database, schema, ..
            } => write!(f, "{}|{}|{}|{}", P_SEQUENCES_FOLDER, conn, database, schema),
            Self::Table { schema, name, .. } => {
                write!(f, "{}|{}|{}|{}", P_TABLE, conn, schema, name)
            }
            Self::View { schema, name, .. } => {
                write!(f, "{}|{}|{}|{}", P_VIEW, conn, schema, name)
            }
            Self::Function { schema, name, .. } => {
                write!(f, "{}|{}|{}|{}", P_FUNCTION, conn, schema, name)
            }
            Self::Sequence { schema, name, .. } => {
                write!(f, "{}|{}|{}|{}", P_SEQUENCE, conn, schema, name)
            }
            Self::ColumnsFolder { schema, table, .. } => {
                write!(f, "{}|{}|{}|{}", P_COLUMNS_FOLDER, conn, schema, table)
            }
            Self::IndexesFolder { schema, table, .. } => {
                write!(f, "{}|{}|{}|{}", P_INDEXES_FOLDER, conn, schema, table)
            }
            Self::ConstraintsFolder { schema, table, .. } => {
                write!(f, "{}|{}|{}|{}", P_CONSTRAINTS_FOLDER, conn, schema, table)
            }
            Self::TriggersFolder { schema, table, .. } => {
                write!(f, "{}|{}|{}|{}", P_TRIGGERS_FOLDER, conn, schema, table)
            }
            Self::Column {
                schema,
                table,
                name,
                ..
            } => write!(f, "{}|{}|{}|{}|{}", P_COLUMN, conn, schema, table, name),
            Self::Index {
                schema,
                table,
                name,
                ..
            } => write!(f, "{}|{}|{}|{}|{}", P_INDEX, conn, schema, table, name),
            Self::Constraint {
                schema,
                table,
                name,
                ..
            } => write!(f, "{}|{}|{}|{}|{}", P_CONSTRAINT, conn, schema, table, name),
            Self::Trigger {
                schema,
                table,
                name,
                ..
            } => write!(f, "{}|{}|{}|{}|{}", P_TRIGGER, conn, schema, table, name),
        }
    }
}

/// Error returned when parsing a `NodeId` from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNodeIdError {
    pub input: String,
}

impl fmt::Display for ParseNodeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid tree node id: {:?}", self.input)
    }
}

impl std::error::Error for ParseNodeIdError {}

impl FromStr for NodeId {
    type Err = ParseNodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseNodeIdError {
            input: s.to_string(),
        };

        let parts: Vec<&str> = s.splitn(5, '|').collect();
        if parts.len() < 2 {
            return Err(err());
        }

        let connection_id = Uuid::parse_str(parts[1]).map_err(|_| err())?;
        let part = |i: usize| parts.get(i).map(|p| p.to_string()).ok_or_else(err);

        match parts[0] {
            P_CONNECTION => Ok(Self::Connection { connection_id }),
            P_DATABASE => Ok(Self::Database {
                connection_id,
                name: part(2)?,
            }),
            P_SCHEMA => Ok(Self::Schema {
                connection_id,
                database: part(2)?,
                name: part(3)?,
            }),
            P_USERS_FOLDER => Ok(Self::UsersFolder {
                connection_id,
                database: part(2)?,
            }),
            P_ROLES_FOLDER => Ok(Self::RolesFolder {
                connection_id,
                database: part(2)?,
            }),
            P_USER => Ok(Self::User {
                connection_id,
                database: part(2)?,
                name: part(3)?,
            }),
            P_ROLE => Ok(Self::Role {
                connection_id,
                database: part(2)?,
                name: part(3)?,
            }),
            P_TABLES_FOLDER => Ok(Self::TablesFolder {
                connection_id,
                database: part(2)?,
                schema: part(3)?,
            }),
            P_VIEWS_FOLDER => Ok(Self::ViewsFolder {
                connection_id,
                database: part(2)?,
                schema: part(3)?,
            }),
            P_FUNCTIONS_FOLDER => Ok(Self::FunctionsFolder {
                connection_id,
                database: part(2)?,
                schema: part(3)?,
            }),
            P_SEQUENCES_FOLDER => Ok(Self::SequencesFolder {
                connection_id,
                database: part(2)?,
                schema: part(3)?,
            }),
            P_TABLE => Ok(Self::Table {
                connection_id,
                schema: part(2)?,
                name: part(3)?,
            }),
            P_VIEW => Ok(Self::View {
                connection_id,
                schema: part(2)?,
                name: part(3)?,
            }),
            P_FUNCTION => Ok(Self::Function {
                connection_id,
                schema: part(2)?,
                name: part(3)?,
            }),
            P_SEQUENCE => Ok(Self::Sequence {
                connection_id,
                schema: part(2)?,
                name: part(3)?,
            }),
            P_COLUMNS_FOLDER => Ok(Self::ColumnsFolder {
                connection_id,
                schema: part(2)?,
                table: part(3)?,
            }),
            P_INDEXES_FOLDER => Ok(Self::IndexesFolder {
                connection_id,
                schema: part(2)?,
                table: part(3)?,
            }),
            P_CONSTRAINTS_FOLDER => Ok(Self::ConstraintsFolder {
                connection_id,
                schema: part(2)?,
                table: part(3)?,
            }),
            P_TRIGGERS_FOLDER => Ok(Self::TriggersFolder {
                connection_id,
                schema: part(2)?,
                table: part(3)?,
            }),
            P_COLUMN => Ok(Self::Column {
                connection_id,
                schema: part(2)?,
                table: part(3)?,
                name: part(4)?,
            }),
            P_INDEX => Ok(Self::Index {
                connection_id,
                schema: part(2)?,
                table: part(3)?,
                name: part(4)?,
            }),
            P_CONSTRAINT => Ok(Self::Constraint {
                connection_id,
                schema: part(2)?,
                table: part(3)?,
                name: part(4)?,
            }),
            P_TRIGGER => Ok(Self::Trigger {
                connection_id,
                schema: part(2)?,
                table: part(3)?,
                name: part(4)?,
            }),
            _ => Err(err()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Uuid {
        Uuid::parse_str("6dfb17a9-71b8-4aa5-9d1e-1c2f5ee0b733").unwrap()
    }

    fn roundtrip(id: NodeId) {
        let s = id.to_string();
        let parsed: NodeId = s.parse().unwrap_or_else(|e| {
            panic!("Failed to parse {:?}: {}", s, e);
        });
        assert_eq!(id, parsed, "Roundtrip failed for: {}", s);
    }

    // ==================== roundtrip tests ====================

    #[test]
    fn test_roundtrip_all_variants() {
        let c = conn();
        roundtrip(NodeId::Connection { connection_id: c });
        roundtrip(NodeId::Database {
            connection_id: c,
            name: "app".into(),
        });
        roundtrip(NodeId::Schema {
            connection_id: c,
            database: "app".into(),
            name: "public".into(),
        });
        roundtrip(NodeId::UsersFolder {
            connection_id: c,
            database: "app".into(),
        });
        roundtrip(NodeId::RolesFolder {
            connection_id: c,
            database: "app".into(),
        });
        roundtrip(NodeId::User {
            connection_id: c,
            database: "app".into(),
            name: "alice".into(),
        });
        roundtrip(NodeId::Role {
            connection_id: c,
            database: "app".into(),
            name: "readonly".into(),
        });
        roundtrip(NodeId::TablesFolder {
            connection_id: c,
            database: "app".into(),
            schema: "public".into(),
        });
        roundtrip(NodeId::ViewsFolder {
            connection_id: c,
            database: "app".into(),
            schema: "public".into(),
        });
        roundtrip(NodeId::FunctionsFolder {
            connection_id: c,
            database: "app".into(),
            schema: "public".into(),
        });
        roundtrip(NodeId::SequencesFolder {
            connection_id: c,
            database: "app".into(),
            schema: "public".into(),
        });
        roundtrip(NodeId::Table {
            connection_id: c,
            schema: "public".into(),
            name: "users".into(),
        });
        roundtrip(NodeId::View {
            connection_id: c,
            schema: "public".into(),
            name: "active_users".into(),
        });
        roundtrip(NodeId::Function {
            connection_id: c,
            schema: "public".into(),
            name: "refresh_totals".into(),
        });
        roundtrip(NodeId::Sequence {
            connection_id: c,
            schema: "public".into(),
            name: "users_id_seq".into(),
        });
        roundtrip(NodeId::ColumnsFolder {
            connection_id: c,
            schema: "public".into(),
            table: "users".into(),
        });
        roundtrip(NodeId::IndexesFolder {
            connection_id: c,
            schema: "public".into(),
            table: "users".into(),
        });
        roundtrip(NodeId::ConstraintsFolder {
            connection_id: c,
            schema: "public".into(),
            table: "users".into(),
        });
        roundtrip(NodeId::TriggersFolder {
            connection_id: c,
            schema: "public".into(),
            table: "users".into(),
        });
        roundtrip(NodeId::Column {
            connection_id: c,
            schema: "public".into(),
            table: "users".into(),
            name: "id".into(),
        });
        roundtrip(NodeId::Index {
            connection_id: c,
            schema: "public".into(),
            table: "users".into(),
            name: "users_email_idx".into(),
        });
        roundtrip(NodeId::Constraint {
            connection_id: c,
            schema: "public".into(),
            table: "users".into(),
            name: "users_pkey".into(),
        });
        roundtrip(NodeId::Trigger {
            connection_id: c,
            schema: "public".into(),
            table: "users".into(),
            name: "audit_insert".into(),
        });
    }

    #[test]
    fn test_roundtrip_special_characters() {
        roundtrip(NodeId::Table {
            connection_id: conn(),
            schema: "weird schema".into(),
            name: "table.with.dots".into(),
        });
        roundtrip(NodeId::Database {
            connection_id: conn(),
            name: "For Example".into(),
        });
        roundtrip(NodeId::Column {
            connection_id: conn(),
            schema: "público".into(),
            table: "usuários".into(),
            name: "çol".into(),
        });
    }

    // ==================== accessor tests ====================

    #[test]
    fn test_kind() {
        let id = NodeId::Table {
            connection_id: conn(),
            schema: "public".into(),
            name: "users".into(),
        };
        assert_eq!(id.kind(), NodeKind::Table);
        assert!(id.kind().is_expandable());

        let id = NodeId::Column {
            connection_id: conn(),
            schema: "public".into(),
            table: "users".into(),
            name: "id".into(),
        };
        assert_eq!(id.kind(), NodeKind::Column);
        assert!(!id.kind().is_expandable());
    }

    #[test]
    fn test_connection_id() {
        let c = conn();
        let id = NodeId::TriggersFolder {
            connection_id: c,
            schema: "public".into(),
            table: "users".into(),
        };
        assert_eq!(id.connection_id(), c);
    }

    #[test]
    fn test_folder_labels() {
        assert_eq!(NodeKind::TablesFolder.folder_label(), Some("Tables"));
        assert_eq!(NodeKind::UsersFolder.folder_label(), Some("Users"));
        assert_eq!(NodeKind::Table.folder_label(), None);
    }

    // ==================== parse failure tests ====================

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<NodeId>().is_err());
        assert!("ZZ|foo".parse::<NodeId>().is_err());
        assert!("T|not-a-uuid|public|users".parse::<NodeId>().is_err());
        assert!("T|".parse::<NodeId>().is_err());
        let id = format!("T|{}", conn());
        assert!(id.parse::<NodeId>().is_err(), "missing schema and name");
    }

    #[test]
    fn test_display_format() {
        let id = NodeId::Column {
            connection_id: conn(),
            schema: "public".into(),
            table: "users".into(),
            name: "id".into(),
        };
        assert_eq!(
            id.to_string(),
            format!("CL|{}|public|users|id", conn()),
        );
    }
}
