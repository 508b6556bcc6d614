use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, warn};
use uuid::Uuid;

use crate::catalog::SchemaCatalog;
use crate::engine::{AdminFeatures, EngineKind};
use crate::error::IntelError;
use crate::fetch::{SchemaFetcher, StatementExecutor};
use crate::metadata::TableInfo;
use crate::node_id::{NodeId, NodeKind};
use crate::sql_dialect::dialect_for;
use crate::tree_node::{
    ConnectionDescriptor, ConnectionMeta, ConnectionStatus, NodePayload, TreeNode,
};

/// How long a cached child list stays usable. Expiry is lazy: entries
/// are checked when read, never purged by a timer.
const CHILD_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CachedChildren {
    children: Vec<NodeId>,
    fetched_at: Instant,
}

impl CachedChildren {
    fn is_stale(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() > ttl
    }
}

/// Lazily-loaded tree over every connection's databases, schemas,
/// tables, and their details.
///
/// The tree owns no I/O: expanding a node dispatches to the injected
/// [`SchemaFetcher`] (or [`StatementExecutor`] for the users/roles admin
/// queries) and materializes typed child nodes from the response. Table
/// and column lists stream into the shared [`SchemaCatalog`] as they
/// arrive, so completion improves as the user browses.
///
/// All methods take `&mut self`; the embedding application serializes
/// access. Child lists are cached per `(node, connection)` with a lazy
/// five-minute expiry, so collapsing and re-expanding does not refetch.
pub struct SchemaTree {
    fetcher: Arc<dyn SchemaFetcher>,
    executor: Arc<dyn StatementExecutor>,
    catalog: Arc<SchemaCatalog>,
    nodes: HashMap<NodeId, TreeNode>,
    root_nodes: Vec<NodeId>,
    show_system_schemas: bool,
    cache: HashMap<(NodeId, Uuid), CachedChildren>,
    cache_ttl: Duration,
}

impl SchemaTree {
    pub fn new(
        fetcher: Arc<dyn SchemaFetcher>,
        executor: Arc<dyn StatementExecutor>,
        catalog: Arc<SchemaCatalog>,
    ) -> Self {
        Self {
            fetcher,
            executor,
            catalog,
            nodes: HashMap::new(),
            root_nodes: Vec::new(),
            show_system_schemas: false,
            cache: HashMap::new(),
            cache_ttl: CHILD_CACHE_TTL,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// The catalog this tree feeds. Shared with the completion engine.
    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    /// Reconcile root nodes against the application's connection list.
    ///
    /// Roots are added, renamed, and re-tagged in place; connections
    /// missing from `descriptors` are dropped entirely. Any connection
    /// that is not currently connected has its subtree reset so the next
    /// expansion refetches against the live session.
    pub fn sync_connections(&mut self, descriptors: &[ConnectionDescriptor]) {
        let new_roots: Vec<NodeId> = descriptors
            .iter()
            .map(|descriptor| NodeId::Connection {
                connection_id: descriptor.id,
            })
            .collect();

        let stale: Vec<NodeId> = self
            .root_nodes
            .iter()
            .filter(|root| !new_roots.contains(root))
            .cloned()
            .collect();
        for root in &stale {
            self.remove_subtree(root);
        }

        for descriptor in descriptors {
            let root_id = NodeId::Connection {
                connection_id: descriptor.id,
            };
            let meta = ConnectionMeta {
                engine: descriptor.engine,
                default_database: descriptor.database.clone(),
                status: descriptor.status,
            };
            match self.nodes.get_mut(&root_id) {
                Some(node) => {
                    node.name = descriptor.name.clone();
                    node.payload = NodePayload::Connection(meta);
                }
                None => {
                    let node = TreeNode::branch(
                        root_id.clone(),
                        descriptor.name.clone(),
                        None,
                        NodePayload::Connection(meta),
                    );
                    self.nodes.insert(root_id.clone(), node);
                }
            }

            if descriptor.status != ConnectionStatus::Connected {
                self.reset_connection_subtree(&root_id, descriptor.id);
            }
        }

        self.root_nodes = new_roots;
    }

    /// Insert (or replace) a single connection root. Existing children
    /// and cache entries of a previous root with the same id are dropped.
    pub fn register_connection(&mut self, descriptor: &ConnectionDescriptor) {
        let root_id = NodeId::Connection {
            connection_id: descriptor.id,
        };

        let old_children: Vec<NodeId> = self
            .nodes
            .get(&root_id)
            .map(|node| node.children.clone())
            .unwrap_or_default();
        for child in &old_children {
            self.remove_subtree(child);
        }
        self.cache.remove(&(root_id.clone(), descriptor.id));

        let node = TreeNode::branch(
            root_id.clone(),
            descriptor.name.clone(),
            None,
            NodePayload::Connection(ConnectionMeta {
                engine: descriptor.engine,
                default_database: descriptor.database.clone(),
                status: descriptor.status,
            }),
        );
        self.nodes.insert(root_id.clone(), node);
        if !self.root_nodes.contains(&root_id) {
            self.root_nodes.push(root_id);
        }
    }

    /// Drop a connection's root, every node under it, and its cache
    /// entries.
    pub fn remove_connection(&mut self, connection_id: Uuid) {
        let root_id = NodeId::Connection { connection_id };
        self.remove_subtree(&root_id);
        self.root_nodes.retain(|root| *root != root_id);
        self.cache.retain(|(_, conn), _| *conn != connection_id);
    }

    /// Collapse an expanded node, or load (if needed) and expand a
    /// collapsed one. A node that is mid-load is left alone.
    ///
    /// After a successful expansion the tree keeps drilling down one
    /// obvious step at a time: connection to its default database,
    /// database to its default (or sole) schema, schema to its tables
    /// folder. Failures inside that cascade are logged and swallowed;
    /// only the user-initiated expansion itself can return an error.
    pub async fn toggle_node(&mut self, node_id: &NodeId) -> Result<(), IntelError> {
        let node = self
            .nodes
            .get(node_id)
            .ok_or_else(|| IntelError::NodeNotFound(node_id.to_string()))?;
        if node.is_loading {
            return Ok(());
        }
        if node.is_expanded {
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.is_expanded = false;
            }
            return Ok(());
        }

        self.expand_node(node_id).await?;

        let mut next = self.auto_expand_target(node_id);
        while let Some(target) = next {
            if let Err(err) = self.expand_node(&target).await {
                warn!("Auto-expand stopped at {}: {}", target, err);
                break;
            }
            next = self.auto_expand_target(&target);
        }

        Ok(())
    }

    async fn expand_node(&mut self, node_id: &NodeId) -> Result<(), IntelError> {
        let node = self
            .nodes
            .get(node_id)
            .ok_or_else(|| IntelError::NodeNotFound(node_id.to_string()))?;
        if !node.is_loaded && node.is_expandable {
            self.load_children(node_id).await?;
        }
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.is_expanded = true;
        }
        Ok(())
    }

    /// Materialize a node's children, consulting the child cache first.
    ///
    /// On failure the loading flag is cleared and the error propagates;
    /// children stay empty and the node stays collapsed.
    pub async fn load_children(&mut self, node_id: &NodeId) -> Result<(), IntelError> {
        let node = self
            .nodes
            .get(node_id)
            .ok_or_else(|| IntelError::NodeNotFound(node_id.to_string()))?;
        if node.is_loading {
            return Ok(());
        }

        let cache_key = (node_id.clone(), node_id.connection_id());
        let cached = self
            .cache
            .get(&cache_key)
            .filter(|entry| !entry.is_stale(self.cache_ttl))
            .map(|entry| entry.children.clone());
        if let Some(children) = cached {
            debug!("Child cache hit for {}", node_id);
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.children = children;
                node.is_loaded = true;
            }
            return Ok(());
        }

        if let Some(node) = self.nodes.get_mut(node_id) {
            node.is_loading = true;
        }

        match self.build_children(node_id).await {
            Ok(children) => {
                let old_children: Vec<NodeId> = self
                    .nodes
                    .get(node_id)
                    .map(|node| node.children.clone())
                    .unwrap_or_default();
                for child in &old_children {
                    self.remove_subtree(child);
                }

                let child_ids: Vec<NodeId> =
                    children.iter().map(|child| child.id.clone()).collect();
                for child in children {
                    self.nodes.insert(child.id.clone(), child);
                }
                if let Some(node) = self.nodes.get_mut(node_id) {
                    node.children = child_ids.clone();
                    node.is_loading = false;
                    node.is_loaded = true;
                }
                self.cache.insert(
                    cache_key,
                    CachedChildren {
                        children: child_ids,
                        fetched_at: Instant::now(),
                    },
                );
                Ok(())
            }
            Err(err) => {
                error!("Failed to load children of {}: {}", node_id, err);
                if let Some(node) = self.nodes.get_mut(node_id) {
                    node.is_loading = false;
                }
                Err(err)
            }
        }
    }

    /// Throw away a node's subtree and cached children, then reload.
    /// A failed reload additionally collapses the node.
    pub async fn refresh_node(&mut self, node_id: &NodeId) -> Result<(), IntelError> {
        if !self.nodes.contains_key(node_id) {
            return Err(IntelError::NodeNotFound(node_id.to_string()));
        }

        let children: Vec<NodeId> = self
            .nodes
            .get(node_id)
            .map(|node| node.children.clone())
            .unwrap_or_default();
        for child in &children {
            self.remove_subtree(child);
        }
        self.cache
            .remove(&(node_id.clone(), node_id.connection_id()));
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.children.clear();
            node.is_loaded = false;
        }

        if let Err(err) = self.load_children(node_id).await {
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.is_expanded = false;
            }
            return Err(err);
        }
        Ok(())
    }

    /// Toggle visibility of system schemas. Database child caches are
    /// purged so the next expansion refetches with the new filter.
    pub fn set_show_system_schemas(&mut self, show: bool) {
        self.show_system_schemas = show;
        self.cache.retain(|(id, _), _| id.kind() != NodeKind::Database);
    }

    pub fn show_system_schemas(&self) -> bool {
        self.show_system_schemas
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&TreeNode> {
        self.nodes.get(node_id)
    }

    pub fn children(&self, node_id: &NodeId) -> Vec<&TreeNode> {
        self.nodes
            .get(node_id)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|child| self.nodes.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn root_nodes(&self) -> &[NodeId] {
        &self.root_nodes
    }

    /// Nodes from the root down to `node_id`, inclusive.
    pub fn node_path(&self, node_id: &NodeId) -> Vec<&TreeNode> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(node_id);
        while let Some(node) = current {
            path.push(node);
            current = node
                .parent_id
                .as_ref()
                .and_then(|parent| self.nodes.get(parent));
        }
        path.reverse();
        path
    }

    /// Preorder walk of expanded nodes with their depth, in render
    /// order. Collapsed subtrees are skipped entirely.
    pub fn visible_nodes(&self) -> Vec<(usize, &TreeNode)> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, &NodeId)> =
            self.root_nodes.iter().rev().map(|id| (0, id)).collect();
        while let Some((depth, id)) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                out.push((depth, node));
                if node.is_expanded {
                    stack.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
                }
            }
        }
        out
    }

    /// Clear a connection's subtree back to an unloaded root. Used when
    /// the connection drops so nothing stale survives into the next
    /// session.
    fn reset_connection_subtree(&mut self, node_id: &NodeId, connection_id: Uuid) {
        let children: Vec<NodeId> = self
            .nodes
            .get(node_id)
            .map(|node| node.children.clone())
            .unwrap_or_default();
        for child in &children {
            self.remove_subtree(child);
        }
        self.cache.remove(&(node_id.clone(), connection_id));

        if let Some(node) = self.nodes.get_mut(node_id) {
            node.children.clear();
            node.is_expanded = false;
            node.is_loading = false;
            node.is_loaded = false;
        }
    }

    /// Remove a node and every descendant, dropping their cache entries
    /// along the way.
    fn remove_subtree(&mut self, node_id: &NodeId) {
        let mut stack = vec![node_id.clone()];
        while let Some(current) = stack.pop() {
            self.cache.remove(&(current.clone(), current.connection_id()));
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
        }
    }

    fn connection_engine(&self, connection_id: Uuid) -> Option<EngineKind> {
        let root = self.nodes.get(&NodeId::Connection { connection_id })?;
        match &root.payload {
            NodePayload::Connection(meta) => Some(meta.engine),
            _ => None,
        }
    }

    /// Next node the cascade should expand under a freshly expanded one,
    /// or `None` when there is no single obvious continuation.
    fn auto_expand_target(&self, node_id: &NodeId) -> Option<NodeId> {
        let node = self.nodes.get(node_id)?;
        let target = match &node.payload {
            NodePayload::Connection(meta) => {
                let default_database = meta.default_database.as_deref()?;
                node.children
                    .iter()
                    .find(|child| {
                        self.nodes
                            .get(*child)
                            .is_some_and(|n| n.name.eq_ignore_ascii_case(default_database))
                    })?
                    .clone()
            }
            NodePayload::Database => {
                let schemas: Vec<&NodeId> = node
                    .children
                    .iter()
                    .filter(|child| child.kind() == NodeKind::Schema)
                    .collect();
                let preferred = self
                    .connection_engine(node_id.connection_id())
                    .and_then(|engine| dialect_for(engine).default_schema())
                    .and_then(|default| {
                        schemas
                            .iter()
                            .find(|child| {
                                self.nodes.get(**child).is_some_and(|n| n.name == default)
                            })
                            .copied()
                    });
                match preferred {
                    Some(id) => id.clone(),
                    None if schemas.len() == 1 => schemas[0].clone(),
                    None => return None,
                }
            }
            NodePayload::Schema { .. } => node
                .children
                .iter()
                .find(|child| matches!(child, NodeId::TablesFolder { .. }))?
                .clone(),
            _ => return None,
        };

        let target_node = self.nodes.get(&target)?;
        (!target_node.is_expanded).then_some(target)
    }

    /// Fetch and build the typed children of one node. Pure with respect
    /// to the node store; the caller wires the results in.
    async fn build_children(&self, node_id: &NodeId) -> Result<Vec<TreeNode>, IntelError> {
        let parent = Some(node_id.clone());
        match node_id {
            NodeId::Connection { connection_id } => {
                let databases = self.fetcher.list_databases(*connection_id).await?;
                Ok(databases
                    .into_iter()
                    .map(|name| {
                        TreeNode::branch(
                            NodeId::Database {
                                connection_id: *connection_id,
                                name: name.clone(),
                            },
                            name,
                            parent.clone(),
                            NodePayload::Database,
                        )
                    })
                    .collect())
            }
            NodeId::Database {
                connection_id,
                name,
            } => {
                let schemas = self.fetcher.list_schemas(*connection_id, name).await?;
                let mut children: Vec<TreeNode> = schemas
                    .into_iter()
                    .filter(|schema| self.show_system_schemas || !schema.is_system)
                    .map(|schema| {
                        TreeNode::branch(
                            NodeId::Schema {
                                connection_id: *connection_id,
                                database: name.clone(),
                                name: schema.name.clone(),
                            },
                            schema.name.clone(),
                            parent.clone(),
                            NodePayload::Schema {
                                is_system: schema.is_system,
                            },
                        )
                    })
                    .collect();

                if let Some(engine) = self.connection_engine(*connection_id) {
                    let features = engine.admin_features();
                    if features.contains(AdminFeatures::USERS) {
                        children.push(folder_branch(
                            NodeId::UsersFolder {
                                connection_id: *connection_id,
                                database: name.clone(),
                            },
                            parent.clone(),
                        ));
                    }
                    if features.contains(AdminFeatures::ROLES) {
                        children.push(folder_branch(
                            NodeId::RolesFolder {
                                connection_id: *connection_id,
                                database: name.clone(),
                            },
                            parent.clone(),
                        ));
                    }
                }

                Ok(children)
            }
            NodeId::UsersFolder {
                connection_id,
                database,
            } => {
                let engine = self
                    .connection_engine(*connection_id)
                    .ok_or_else(|| IntelError::ConnectionNotFound(node_id.to_string()))?;
                let Some(query) = engine.users_query() else {
                    return Ok(Vec::new());
                };
                let result = self.executor.execute(*connection_id, query).await?;
                let index = result.column_index("name").unwrap_or(0);
                Ok(result
                    .string_values(index)
                    .into_iter()
                    .filter(|name| !name.is_empty())
                    .map(|name| {
                        TreeNode::leaf(
                            NodeId::User {
                                connection_id: *connection_id,
                                database: database.clone(),
                                name: name.clone(),
                            },
                            name,
                            parent.clone(),
                            NodePayload::User,
                        )
                    })
                    .collect())
            }
            NodeId::RolesFolder {
                connection_id,
                database,
            } => {
                let engine = self
                    .connection_engine(*connection_id)
                    .ok_or_else(|| IntelError::ConnectionNotFound(node_id.to_string()))?;
                let Some(query) = engine.roles_query() else {
                    return Ok(Vec::new());
                };
                let result = self.executor.execute(*connection_id, query).await?;
                let index = result.column_index("name").unwrap_or(0);
                Ok(result
                    .string_values(index)
                    .into_iter()
                    .filter(|name| !name.is_empty())
                    .map(|name| {
                        TreeNode::leaf(
                            NodeId::Role {
                                connection_id: *connection_id,
                                database: database.clone(),
                                name: name.clone(),
                            },
                            name,
                            parent.clone(),
                            NodePayload::Role,
                        )
                    })
                    .collect())
            }
            NodeId::Schema {
                connection_id,
                database,
                name,
            } => {
                let folders = [
                    NodeId::TablesFolder {
                        connection_id: *connection_id,
                        database: database.clone(),
                        schema: name.clone(),
                    },
                    NodeId::ViewsFolder {
                        connection_id: *connection_id,
                        database: database.clone(),
                        schema: name.clone(),
                    },
                    NodeId::FunctionsFolder {
                        connection_id: *connection_id,
                        database: database.clone(),
                        schema: name.clone(),
                    },
                    NodeId::SequencesFolder {
                        connection_id: *connection_id,
                        database: database.clone(),
                        schema: name.clone(),
                    },
                ];
                Ok(folders
                    .into_iter()
                    .map(|id| folder_branch(id, parent.clone()))
                    .collect())
            }
            NodeId::TablesFolder {
                connection_id,
                schema,
                ..
            } => {
                let tables = self
                    .fetcher
                    .list_tables(*connection_id, Some(schema.as_str()))
                    .await?;
                let mut children = Vec::with_capacity(tables.len());
                for mut table in tables {
                    if table.schema.is_none() {
                        table.schema = Some(schema.clone());
                    }
                    self.catalog.update_table(&table);
                    children.push(TreeNode::branch(
                        NodeId::Table {
                            connection_id: *connection_id,
                            schema: schema.clone(),
                            name: table.name.clone(),
                        },
                        table.name.clone(),
                        parent.clone(),
                        NodePayload::Table,
                    ));
                }
                Ok(children)
            }
            NodeId::Table {
                connection_id,
                schema,
                name,
            } => {
                let folders = [
                    NodeId::ColumnsFolder {
                        connection_id: *connection_id,
                        schema: schema.clone(),
                        table: name.clone(),
                    },
                    NodeId::IndexesFolder {
                        connection_id: *connection_id,
                        schema: schema.clone(),
                        table: name.clone(),
                    },
                    NodeId::ConstraintsFolder {
                        connection_id: *connection_id,
                        schema: schema.clone(),
                        table: name.clone(),
                    },
                    NodeId::TriggersFolder {
                        connection_id: *connection_id,
                        schema: schema.clone(),
                        table: name.clone(),
                    },
                ];
                Ok(folders
                    .into_iter()
                    .map(|id| folder_branch(id, parent.clone()))
                    .collect())
            }
            NodeId::ColumnsFolder {
                connection_id,
                schema,
                table,
            } => {
                let columns = self
                    .fetcher
                    .get_columns(*connection_id, table, Some(schema.as_str()))
                    .await?;
                self.catalog.update_table(&TableInfo {
                    name: table.clone(),
                    schema: Some(schema.clone()),
                    columns: columns.clone(),
                    comment: None,
                });
                Ok(columns
                    .into_iter()
                    .map(|column| {
                        TreeNode::leaf(
                            NodeId::Column {
                                connection_id: *connection_id,
                                schema: schema.clone(),
                                table: table.clone(),
                                name: column.name.clone(),
                            },
                            column.name.clone(),
                            parent.clone(),
                            NodePayload::Column(column),
                        )
                    })
                    .collect())
            }
            NodeId::IndexesFolder {
                connection_id,
                schema,
                table,
            } => {
                let indexes = self
                    .fetcher
                    .list_indexes(*connection_id, table, Some(schema.as_str()))
                    .await?;
                Ok(indexes
                    .into_iter()
                    .map(|index| {
                        TreeNode::leaf(
                            NodeId::Index {
                                connection_id: *connection_id,
                                schema: schema.clone(),
                                table: table.clone(),
                                name: index.name.clone(),
                            },
                            index.name.clone(),
                            parent.clone(),
                            NodePayload::Index(index),
                        )
                    })
                    .collect())
            }
            NodeId::ConstraintsFolder {
                connection_id,
                schema,
                table,
            } => {
                let constraints = self
                    .fetcher
                    .list_constraints(*connection_id, table, Some(schema.as_str()))
                    .await?;
                Ok(constraints
                    .into_iter()
                    .map(|constraint| {
                        TreeNode::leaf(
                            NodeId::Constraint {
                                connection_id: *connection_id,
                                schema: schema.clone(),
                                table: table.clone(),
                                name: constraint.name.clone(),
                            },
                            constraint.name.clone(),
                            parent.clone(),
                            NodePayload::Constraint(constraint),
                        )
                    })
                    .collect())
            }
            NodeId::TriggersFolder {
                connection_id,
                schema,
                table,
            } => {
                let triggers = self
                    .fetcher
                    .list_triggers(*connection_id, table, Some(schema.as_str()))
                    .await?;
                Ok(triggers
                    .into_iter()
                    .map(|trigger| {
                        TreeNode::leaf(
                            NodeId::Trigger {
                                connection_id: *connection_id,
                                schema: schema.clone(),
                                table: table.clone(),
                                name: trigger.name.clone(),
                            },
                            trigger.name.clone(),
                            parent.clone(),
                            NodePayload::Trigger(trigger),
                        )
                    })
                    .collect())
            }
            NodeId::ViewsFolder {
                connection_id,
                schema,
                ..
            } => {
                let views = self
                    .fetcher
                    .list_views(*connection_id, Some(schema.as_str()))
                    .await?;
                let mut children = Vec::with_capacity(views.len());
                for mut view in views {
                    if view.schema.is_none() {
                        view.schema = Some(schema.clone());
                    }
                    self.catalog.update_view(&view);
                    children.push(TreeNode::leaf(
                        NodeId::View {
                            connection_id: *connection_id,
                            schema: schema.clone(),
                            name: view.name.clone(),
                        },
                        view.name.clone(),
                        parent.clone(),
                        NodePayload::View {
                            is_materialized: view.is_materialized,
                        },
                    ));
                }
                Ok(children)
            }
            NodeId::FunctionsFolder {
                connection_id,
                schema,
                ..
            } => {
                let functions = self
                    .fetcher
                    .list_functions(*connection_id, Some(schema.as_str()))
                    .await?;
                Ok(functions
                    .into_iter()
                    .map(|function| {
                        TreeNode::leaf(
                            NodeId::Function {
                                connection_id: *connection_id,
                                schema: schema.clone(),
                                name: function.name.clone(),
                            },
                            function.name.clone(),
                            parent.clone(),
                            NodePayload::Function(function),
                        )
                    })
                    .collect())
            }
            NodeId::SequencesFolder {
                connection_id,
                schema,
                ..
            } => {
                let sequences = self
                    .fetcher
                    .list_sequences(*connection_id, Some(schema.as_str()))
                    .await?;
                Ok(sequences
                    .into_iter()
                    .map(|sequence| {
                        TreeNode::leaf(
                            NodeId::Sequence {
                                connection_id: *connection_id,
                                schema: schema.clone(),
                                name: sequence.name.clone(),
                            },
                            sequence.name.clone(),
                            parent.clone(),
                            NodePayload::Sequence(sequence),
                        )
                    })
                    .collect())
            }
            // Leaves never load.
            _ => Ok(Vec::new()),
        }
    }
}

fn folder_branch(id: NodeId, parent: Option<NodeId>) -> TreeNode {
    let label = id.kind().folder_label().unwrap_or_default();
    TreeNode::branch(id, label, parent, NodePayload::Folder)
}
