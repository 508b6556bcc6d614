use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::EngineKind;
use crate::metadata::{
    ColumnInfo, ConstraintInfo, FunctionInfo, IndexInfo, SequenceInfo, TriggerInfo,
};
use crate::node_id::NodeId;

/// Connection state as reported by the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Connecting,
    Disconnected,
    Error,
}

/// Snapshot of one configured connection, handed to
/// [`SchemaTree::sync_connections`](crate::SchemaTree::sync_connections).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub id: Uuid,
    pub name: String,
    pub engine: EngineKind,
    /// Default database to auto-expand into after connecting.
    #[serde(default)]
    pub database: Option<String>,
    pub status: ConnectionStatus,
}

/// Connection-level state carried on a root node.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionMeta {
    pub engine: EngineKind,
    pub default_database: Option<String>,
    pub status: ConnectionStatus,
}

/// Per-kind node data. The node id already encodes the object's
/// coordinates, so variants only carry what the id cannot: fetched
/// detail records for leaves, session state for connections.
#[derive(Debug, Clone, PartialEq)]
pub enum NodePayload {
    Connection(ConnectionMeta),
    Database,
    Schema { is_system: bool },
    Folder,
    Table,
    View { is_materialized: bool },
    Function(FunctionInfo),
    Sequence(SequenceInfo),
    User,
    Role,
    Column(ColumnInfo),
    Index(IndexInfo),
    Constraint(ConstraintInfo),
    Trigger(TriggerInfo),
}

/// One entry in the lazily-loaded metadata tree.
///
/// The four booleans are independent: a node can be expandable but not
/// yet loaded, loaded but collapsed, and so on. The engine maintains the
/// invariant that an expanded node is always loaded or loading.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: String,
    pub parent_id: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub is_expandable: bool,
    pub is_expanded: bool,
    pub is_loading: bool,
    pub is_loaded: bool,
    pub payload: NodePayload,
}

impl TreeNode {
    /// An expandable node whose children have not been fetched yet.
    pub fn branch(
        id: NodeId,
        name: impl Into<String>,
        parent_id: Option<NodeId>,
        payload: NodePayload,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
            children: Vec::new(),
            is_expandable: true,
            is_expanded: false,
            is_loading: false,
            is_loaded: false,
            payload,
        }
    }

    /// A terminal node, created already loaded.
    pub fn leaf(
        id: NodeId,
        name: impl Into<String>,
        parent_id: Option<NodeId>,
        payload: NodePayload,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
            children: Vec::new(),
            is_expandable: false,
            is_expanded: false,
            is_loading: false,
            is_loaded: true,
            payload,
        }
    }

    pub fn kind(&self) -> crate::node_id::NodeKind {
        self.id.kind()
    }

    pub fn connection_id(&self) -> Uuid {
        self.id.connection_id()
    }

    pub fn status(&self) -> Option<ConnectionStatus> {
        match &self.payload {
            NodePayload::Connection(meta) => Some(meta.status),
            _ => None,
        }
    }
}
