use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use uuid::Uuid;

use crate::engine::EngineKind;
use crate::metadata::{ColumnInfo, SchemaInfo, TableInfo, ViewInfo};

/// Whether a catalog record came from a table or a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableObjectKind {
    Table,
    View,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: String,
    pub native_type: Option<String>,
    pub nullable: bool,
    pub is_primary_key: bool,
    pub comment: Option<String>,
}

impl From<&ColumnInfo> for CatalogColumn {
    fn from(info: &ColumnInfo) -> Self {
        Self {
            name: info.name.clone(),
            data_type: info.data_type.clone(),
            native_type: info.native_type.clone(),
            nullable: info.nullable,
            is_primary_key: info.is_primary_key,
            comment: info.comment.clone(),
        }
    }
}

/// One table or view known to the completion layer.
///
/// Identity rule: two records denote the same entity iff their names
/// match case-insensitively and their schemas match, or either side has
/// no schema. The second half absorbs partial records: a table first
/// reported without a schema is upgraded in place once a
/// schema-qualified record for it arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTable {
    pub name: String,
    pub schema: Option<String>,
    pub database: Option<String>,
    pub kind: TableObjectKind,
    pub columns: Vec<CatalogColumn>,
}

/// Handle returned by [`SchemaCatalog::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn() + Send + Sync>;

struct CatalogState {
    connection_id: Option<Uuid>,
    engine: EngineKind,
    current_database: Option<String>,
    /// Schema name -> canonical keys of its members, insertion-ordered.
    schemas: IndexMap<String, Vec<String>>,
    /// Lowercased simple name -> canonical keys of all candidates.
    tables_by_name: HashMap<String, Vec<String>>,
    /// Lowercased full name -> record. Insertion order is the
    /// enumeration order suggestions are ranked in.
    tables_by_full_name: IndexMap<String, CatalogTable>,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            connection_id: None,
            engine: EngineKind::Postgres,
            current_database: None,
            schemas: IndexMap::new(),
            tables_by_name: HashMap::new(),
            tables_by_full_name: IndexMap::new(),
        }
    }
}

impl CatalogState {
    /// Canonical full name under the current engine. Unlike dialect
    /// display formatting this keeps the default schema, so
    /// `public.users` and a bare `users` index differently.
    fn full_name(&self, table: &CatalogTable) -> String {
        match self.engine {
            EngineKind::Postgres | EngineKind::SqlServer => match &table.schema {
                Some(schema) => format!("{}.{}", schema, table.name),
                None => table.name.clone(),
            },
            EngineKind::MySql => match &table.database {
                Some(database) => format!("{}.{}", database, table.name),
                None => table.name.clone(),
            },
            EngineKind::Sqlite => table.name.clone(),
        }
    }

    fn insert_indexed(&mut self, key: String, table: CatalogTable) {
        if let Some(schema) = &table.schema {
            if let Some(group) = self.schemas.get_mut(schema) {
                if !group.contains(&key) {
                    group.push(key.clone());
                }
            }
        }
        let names = self.tables_by_name.entry(table.name.to_lowercase()).or_default();
        if !names.contains(&key) {
            names.push(key.clone());
        }
        self.tables_by_full_name.insert(key, table);
    }

    fn remove_key(&mut self, key: &str) {
        self.tables_by_full_name.shift_remove(key);
        for names in self.tables_by_name.values_mut() {
            names.retain(|k| k != key);
        }
        self.tables_by_name.retain(|_, names| !names.is_empty());
        for group in self.schemas.values_mut() {
            group.retain(|k| k != key);
        }
    }

    /// Upsert under the identity rule, merging with last-write-wins but
    /// preferring richer data: an incoming record with no columns keeps
    /// the existing ones, a missing schema or database is backfilled.
    fn upsert(&mut self, mut incoming: CatalogTable) {
        let simple = incoming.name.to_lowercase();
        let existing_key = self.tables_by_name.get(&simple).and_then(|keys| {
            keys.iter()
                .find(|key| {
                    self.tables_by_full_name.get(*key).is_some_and(|existing| {
                        match (&existing.schema, &incoming.schema) {
                            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                            _ => true,
                        }
                    })
                })
                .cloned()
        });

        if let Some(key) = &existing_key {
            if let Some(existing) = self.tables_by_full_name.get(key) {
                if incoming.columns.is_empty() && !existing.columns.is_empty() {
                    incoming.columns = existing.columns.clone();
                }
                if incoming.schema.is_none() {
                    incoming.schema = existing.schema.clone();
                }
                if incoming.database.is_none() {
                    incoming.database = existing.database.clone();
                }
            }
        }

        let new_key = self.full_name(&incoming).to_lowercase();
        if let Some(old_key) = existing_key {
            if old_key != new_key {
                self.remove_key(&old_key);
            }
        }
        self.insert_indexed(new_key, incoming);
    }

    fn convert_table(&self, info: &TableInfo, fallback_schema: Option<&str>) -> CatalogTable {
        CatalogTable {
            name: info.name.clone(),
            schema: info
                .schema
                .clone()
                .or_else(|| fallback_schema.map(str::to_string)),
            database: self.current_database.clone(),
            kind: TableObjectKind::Table,
            columns: info.columns.iter().map(CatalogColumn::from).collect(),
        }
    }

    fn convert_view(&self, info: &ViewInfo, fallback_schema: Option<&str>) -> CatalogTable {
        CatalogTable {
            name: info.name.clone(),
            schema: info
                .schema
                .clone()
                .or_else(|| fallback_schema.map(str::to_string)),
            database: self.current_database.clone(),
            kind: TableObjectKind::View,
            columns: info.columns.iter().map(CatalogColumn::from).collect(),
        }
    }

    fn reset(&mut self) {
        self.schemas.clear();
        self.tables_by_name.clear();
        self.tables_by_full_name.clear();
        self.connection_id = None;
    }
}

/// In-memory, multiply-indexed store of tables/views for completion.
///
/// Built incrementally from whatever schema fragments have been fetched
/// so far, either by bulk [`replace`](Self::replace) from a snapshot or
/// by per-node upserts as the schema tree loads. Constructed explicitly
/// and shared by reference between the tree engine and the completion
/// engine; interior locking lets both hold it at once.
pub struct SchemaCatalog {
    state: RwLock<CatalogState>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CatalogState::default()),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        let snapshot: Vec<Listener> = self
            .lock_listeners()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener();
        }
    }

    /// Replace the whole catalog from a schema snapshot.
    ///
    /// Loose tables are only indexed when their schema is absent or not
    /// among the tracked schema groups, so a table never appears twice.
    pub fn replace(
        &self,
        connection_id: Uuid,
        engine: EngineKind,
        database: Option<&str>,
        schemas: &[SchemaInfo],
        tables: &[TableInfo],
    ) {
        {
            let mut state = self.write_state();
            state.reset();
            state.connection_id = Some(connection_id);
            state.engine = engine;
            state.current_database = database.map(str::to_string);

            for schema in schemas {
                state.schemas.insert(schema.name.clone(), Vec::new());
                for table in &schema.tables {
                    let record = state.convert_table(table, Some(&schema.name));
                    let key = state.full_name(&record).to_lowercase();
                    state.insert_indexed(key, record);
                }
                for view in &schema.views {
                    let record = state.convert_view(view, Some(&schema.name));
                    let key = state.full_name(&record).to_lowercase();
                    state.insert_indexed(key, record);
                }
            }

            for table in tables {
                let tracked = table
                    .schema
                    .as_ref()
                    .is_some_and(|s| state.schemas.contains_key(s));
                if !tracked {
                    let record = state.convert_table(table, None);
                    let key = state.full_name(&record).to_lowercase();
                    state.insert_indexed(key, record);
                }
            }
        }
        self.notify();
    }

    /// Upsert one table record (see [`CatalogTable`] for the identity
    /// rule). The schema tree calls this as table lists and column
    /// details stream in.
    pub fn update_table(&self, info: &TableInfo) {
        {
            let mut state = self.write_state();
            let record = state.convert_table(info, None);
            state.upsert(record);
        }
        self.notify();
    }

    pub fn update_view(&self, info: &ViewInfo) {
        {
            let mut state = self.write_state();
            let record = state.convert_view(info, None);
            state.upsert(record);
        }
        self.notify();
    }

    /// Full-name lookup first, then the first simple-name candidate.
    pub fn find_table(&self, name: &str) -> Option<CatalogTable> {
        let state = self.read_state();
        let lower = name.to_lowercase();
        if let Some(table) = state.tables_by_full_name.get(&lower) {
            return Some(table.clone());
        }
        state
            .tables_by_name
            .get(&lower)
            .and_then(|keys| keys.first())
            .and_then(|key| state.tables_by_full_name.get(key))
            .cloned()
    }

    pub fn get_columns(&self, table: &str) -> Vec<CatalogColumn> {
        self.find_table(table)
            .map(|t| t.columns)
            .unwrap_or_default()
    }

    /// Case-insensitive prefix search over simple and full names.
    pub fn search_tables(&self, prefix: &str) -> Vec<CatalogTable> {
        let state = self.read_state();
        let lower = prefix.to_lowercase();
        state
            .tables_by_full_name
            .iter()
            .filter(|(key, table)| {
                table.name.to_lowercase().starts_with(&lower) || key.starts_with(&lower)
            })
            .map(|(_, table)| table.clone())
            .collect()
    }

    pub fn search_columns(&self, table: &str, prefix: &str) -> Vec<CatalogColumn> {
        let lower = prefix.to_lowercase();
        self.get_columns(table)
            .into_iter()
            .filter(|c| c.name.to_lowercase().starts_with(&lower))
            .collect()
    }

    pub fn get_schemas(&self) -> Vec<String> {
        self.read_state().schemas.keys().cloned().collect()
    }

    pub fn get_tables(&self, schema: Option<&str>) -> Vec<CatalogTable> {
        let state = self.read_state();
        match schema {
            Some(name) => state
                .schemas
                .get(name)
                .map(|keys| {
                    keys.iter()
                        .filter_map(|key| state.tables_by_full_name.get(key))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            None => state.tables_by_full_name.values().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.read_state().tables_by_full_name.is_empty()
    }

    pub fn engine(&self) -> EngineKind {
        self.read_state().engine
    }

    pub fn connection_id(&self) -> Option<Uuid> {
        self.read_state().connection_id
    }

    pub fn current_database(&self) -> Option<String> {
        self.read_state().current_database.clone()
    }

    /// Drop all indexed records and the connection binding. Engine and
    /// database context survive so a reconnect can reuse them.
    pub fn clear(&self) {
        self.write_state().reset();
        self.notify();
    }

    /// End of life: clears the data and drops every subscription. The
    /// catalog stays usable afterwards but starts empty and silent.
    pub fn dispose(&self) {
        self.write_state().reset();
        self.lock_listeners().clear();
    }

    /// Register a change listener, called after every mutation.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock_listeners().retain(|(sub, _)| *sub != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn table(name: &str, schema: Option<&str>, columns: &[&str]) -> TableInfo {
        TableInfo {
            name: name.into(),
            schema: schema.map(str::to_string),
            columns: columns
                .iter()
                .map(|c| ColumnInfo {
                    name: (*c).into(),
                    data_type: "text".into(),
                    ..ColumnInfo::default()
                })
                .collect(),
            comment: None,
        }
    }

    // ==================== identity and merge tests ====================

    #[test]
    fn schemaless_record_upgraded_by_qualified_one() {
        let catalog = SchemaCatalog::new();
        catalog.update_table(&table("orders", None, &[]));
        catalog.update_table(&table("orders", Some("public"), &["id", "total"]));

        let found = catalog.find_table("orders").unwrap();
        assert_eq!(found.schema.as_deref(), Some("public"));
        assert_eq!(found.columns.len(), 2);
        assert_eq!(catalog.get_tables(None).len(), 1, "merged, not duplicated");
    }

    #[test]
    fn columnless_update_keeps_existing_columns() {
        let catalog = SchemaCatalog::new();
        catalog.update_table(&table("orders", Some("public"), &["id", "total"]));
        catalog.update_table(&table("orders", Some("public"), &[]));

        let found = catalog.find_table("orders").unwrap();
        assert_eq!(found.columns.len(), 2);
    }

    #[test]
    fn qualified_record_backfills_missing_schema() {
        let catalog = SchemaCatalog::new();
        catalog.update_table(&table("orders", Some("sales"), &["id"]));
        catalog.update_table(&table("orders", None, &["id", "total", "status"]));

        let found = catalog.find_table("orders").unwrap();
        assert_eq!(found.schema.as_deref(), Some("sales"));
        assert_eq!(found.columns.len(), 3, "last write wins on columns");
    }

    #[test]
    fn same_name_in_different_schemas_stays_distinct() {
        let catalog = SchemaCatalog::new();
        catalog.update_table(&table("users", Some("public"), &["id"]));
        catalog.update_table(&table("users", Some("audit"), &["id", "changed_at"]));

        assert_eq!(catalog.get_tables(None).len(), 2);
        assert_eq!(
            catalog.find_table("public.users").unwrap().columns.len(),
            1
        );
        assert_eq!(catalog.find_table("audit.users").unwrap().columns.len(), 2);
    }

    #[test]
    fn identity_is_case_insensitive() {
        let catalog = SchemaCatalog::new();
        catalog.update_table(&table("Orders", Some("Public"), &[]));
        catalog.update_table(&table("orders", Some("public"), &["id"]));

        assert_eq!(catalog.get_tables(None).len(), 1);
    }

    // ==================== lookup tests ====================

    #[test]
    fn find_table_prefers_full_name() {
        let catalog = SchemaCatalog::new();
        catalog.update_table(&table("users", Some("public"), &["id"]));
        catalog.update_table(&table("users", Some("audit"), &["id", "who"]));

        let by_full = catalog.find_table("audit.users").unwrap();
        assert_eq!(by_full.columns.len(), 2);
        let by_simple = catalog.find_table("users").unwrap();
        assert_eq!(by_simple.schema.as_deref(), Some("public"));
    }

    #[test]
    fn search_matches_simple_and_full_prefixes() {
        let catalog = SchemaCatalog::new();
        catalog.update_table(&table("users", Some("public"), &[]));
        catalog.update_table(&table("orders", Some("public"), &[]));

        let hits = catalog.search_tables("us");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "users");

        let hits = catalog.search_tables("public.");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn search_columns_filters_by_prefix() {
        let catalog = SchemaCatalog::new();
        catalog.update_table(&table("users", Some("public"), &["id", "email", "enabled"]));

        let hits = catalog.search_columns("users", "e");
        assert_eq!(hits.len(), 2);
    }

    // ==================== replace tests ====================

    #[test]
    fn replace_indexes_schemas_views_and_loose_tables() {
        let catalog = SchemaCatalog::new();
        let conn = Uuid::new_v4();
        let schema = SchemaInfo {
            name: "public".into(),
            tables: vec![table("users", None, &["id"])],
            views: vec![ViewInfo {
                name: "active_users".into(),
                ..ViewInfo::default()
            }],
            ..SchemaInfo::default()
        };
        let loose_tracked = table("ignored", Some("public"), &[]);
        let loose_untracked = table("scratch", None, &[]);

        catalog.replace(
            conn,
            EngineKind::Postgres,
            Some("app"),
            &[schema],
            &[loose_tracked, loose_untracked],
        );

        assert_eq!(catalog.get_schemas(), vec!["public".to_string()]);
        let names: Vec<String> = catalog
            .get_tables(None)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert!(names.contains(&"users".to_string()));
        assert!(names.contains(&"active_users".to_string()));
        assert!(names.contains(&"scratch".to_string()));
        assert!(
            !names.contains(&"ignored".to_string()),
            "loose table under a tracked schema is skipped"
        );

        let view = catalog.find_table("active_users").unwrap();
        assert_eq!(view.kind, TableObjectKind::View);
        assert_eq!(view.schema.as_deref(), Some("public"));
        assert_eq!(catalog.connection_id(), Some(conn));
        assert_eq!(catalog.current_database().as_deref(), Some("app"));
    }

    #[test]
    fn mysql_full_names_use_database() {
        let catalog = SchemaCatalog::new();
        catalog.replace(
            Uuid::new_v4(),
            EngineKind::MySql,
            Some("shop"),
            &[],
            &[table("orders", None, &["id"])],
        );
        assert!(catalog.find_table("shop.orders").is_some());
    }

    // ==================== lifecycle tests ====================

    #[test]
    fn clear_empties_but_keeps_engine_context() {
        let catalog = SchemaCatalog::new();
        catalog.replace(
            Uuid::new_v4(),
            EngineKind::MySql,
            Some("shop"),
            &[],
            &[table("orders", None, &[])],
        );
        catalog.clear();

        assert!(catalog.is_empty());
        assert_eq!(catalog.connection_id(), None);
        assert_eq!(catalog.engine(), EngineKind::MySql);
    }

    #[test]
    fn subscribers_fire_on_every_mutation() {
        let catalog = SchemaCatalog::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let observed = hits.clone();
        let id = catalog.subscribe(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });

        catalog.update_table(&table("users", None, &[]));
        catalog.clear();
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        catalog.unsubscribe(id);
        catalog.update_table(&table("users", None, &[]));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dispose_drops_subscriptions_and_data() {
        let catalog = SchemaCatalog::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let observed = hits.clone();
        catalog.subscribe(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });
        catalog.update_table(&table("users", None, &[]));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        catalog.dispose();
        assert!(catalog.is_empty());
        catalog.update_table(&table("users", None, &[]));
        assert_eq!(hits.load(Ordering::SeqCst), 1, "disposed listeners are gone");
    }
}
