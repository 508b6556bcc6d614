use async_trait::async_trait;
use sqlintel_core::{
    ColumnInfo, ConstraintInfo, FunctionInfo, IndexInfo, IntelError, SchemaFetcher, SchemaInfo,
    SequenceInfo, StatementExecutor, StatementResult, TableInfo, TriggerInfo, ViewInfo,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// One backend entry point, used for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchCall {
    ListDatabases,
    ListSchemas,
    ListTables,
    GetColumns,
    ListIndexes,
    ListConstraints,
    ListTriggers,
    ListViews,
    ListFunctions,
    ListSequences,
    Execute,
}

#[derive(Default)]
struct FakeBackendState {
    databases: RwLock<Vec<String>>,
    schemas: RwLock<HashMap<String, Vec<SchemaInfo>>>,
    tables: RwLock<HashMap<String, Vec<TableInfo>>>,
    columns: RwLock<HashMap<String, Vec<ColumnInfo>>>,
    indexes: RwLock<HashMap<String, Vec<IndexInfo>>>,
    constraints: RwLock<HashMap<String, Vec<ConstraintInfo>>>,
    triggers: RwLock<HashMap<String, Vec<TriggerInfo>>>,
    views: RwLock<HashMap<String, Vec<ViewInfo>>>,
    functions: RwLock<HashMap<String, Vec<FunctionInfo>>>,
    sequences: RwLock<HashMap<String, Vec<SequenceInfo>>>,
    results: RwLock<HashMap<String, StatementResult>>,
    failures: RwLock<HashSet<FetchCall>>,
    calls: RwLock<HashMap<FetchCall, usize>>,
}

/// Deterministic in-memory metadata backend for tests.
///
/// Schema-scoped maps are keyed by schema name (empty string when the
/// caller passes `None`), table-scoped maps by `schema.table`. Clones
/// share state, so a test can keep one handle for assertions while the
/// tree owns `Arc`s produced by [`FakeBackend::as_fetcher_arc`] and
/// [`FakeBackend::as_executor_arc`].
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<FakeBackendState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_databases(self, names: &[&str]) -> Self {
        self.set_databases(names);
        self
    }

    pub fn with_schemas(self, database: impl Into<String>, schemas: Vec<SchemaInfo>) -> Self {
        self.set_schemas(database, schemas);
        self
    }

    pub fn with_tables(self, schema: Option<&str>, tables: Vec<TableInfo>) -> Self {
        self.set_tables(schema, tables);
        self
    }

    pub fn with_columns(self, schema: Option<&str>, table: &str, columns: Vec<ColumnInfo>) -> Self {
        self.set_columns(schema, table, columns);
        self
    }

    pub fn with_indexes(self, schema: Option<&str>, table: &str, indexes: Vec<IndexInfo>) -> Self {
        rwlock_write(&self.state.indexes).insert(table_key(schema, table), indexes);
        self
    }

    pub fn with_constraints(
        self,
        schema: Option<&str>,
        table: &str,
        constraints: Vec<ConstraintInfo>,
    ) -> Self {
        rwlock_write(&self.state.constraints).insert(table_key(schema, table), constraints);
        self
    }

    pub fn with_triggers(
        self,
        schema: Option<&str>,
        table: &str,
        triggers: Vec<TriggerInfo>,
    ) -> Self {
        rwlock_write(&self.state.triggers).insert(table_key(schema, table), triggers);
        self
    }

    pub fn with_views(self, schema: Option<&str>, views: Vec<ViewInfo>) -> Self {
        self.set_views(schema, views);
        self
    }

    pub fn with_functions(self, schema: Option<&str>, functions: Vec<FunctionInfo>) -> Self {
        rwlock_write(&self.state.functions).insert(schema_key(schema), functions);
        self
    }

    pub fn with_sequences(self, schema: Option<&str>, sequences: Vec<SequenceInfo>) -> Self {
        rwlock_write(&self.state.sequences).insert(schema_key(schema), sequences);
        self
    }

    pub fn with_result(self, sql: impl Into<String>, result: StatementResult) -> Self {
        self.set_result(sql, result);
        self
    }

    pub fn set_databases(&self, names: &[&str]) {
        *rwlock_write(&self.state.databases) = names.iter().map(|n| (*n).to_string()).collect();
    }

    pub fn set_schemas(&self, database: impl Into<String>, schemas: Vec<SchemaInfo>) {
        rwlock_write(&self.state.schemas).insert(database.into(), schemas);
    }

    pub fn set_tables(&self, schema: Option<&str>, tables: Vec<TableInfo>) {
        rwlock_write(&self.state.tables).insert(schema_key(schema), tables);
    }

    pub fn set_columns(&self, schema: Option<&str>, table: &str, columns: Vec<ColumnInfo>) {
        rwlock_write(&self.state.columns).insert(table_key(schema, table), columns);
    }

    pub fn set_views(&self, schema: Option<&str>, views: Vec<ViewInfo>) {
        rwlock_write(&self.state.views).insert(schema_key(schema), views);
    }

    pub fn set_result(&self, sql: impl Into<String>, result: StatementResult) {
        rwlock_write(&self.state.results).insert(sql.into(), result);
    }

    pub fn fail_on(&self, call: FetchCall) {
        rwlock_write(&self.state.failures).insert(call);
    }

    pub fn clear_fail(&self, call: FetchCall) {
        rwlock_write(&self.state.failures).remove(&call);
    }

    pub fn call_count(&self, call: FetchCall) -> usize {
        rwlock_read(&self.state.calls)
            .get(&call)
            .copied()
            .unwrap_or(0)
    }

    pub fn as_fetcher_arc(self) -> Arc<dyn SchemaFetcher> {
        Arc::new(self)
    }

    pub fn as_executor_arc(self) -> Arc<dyn StatementExecutor> {
        Arc::new(self)
    }

    fn record(&self, call: FetchCall) {
        *rwlock_write(&self.state.calls).entry(call).or_insert(0) += 1;
    }

    fn should_fail(&self, call: FetchCall) -> bool {
        rwlock_read(&self.state.failures).contains(&call)
    }

    fn enter(&self, call: FetchCall) -> Result<(), IntelError> {
        self.record(call);
        if self.should_fail(call) {
            return Err(IntelError::FetchFailed("injected failure".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl SchemaFetcher for FakeBackend {
    async fn list_databases(&self, _connection_id: Uuid) -> Result<Vec<String>, IntelError> {
        self.enter(FetchCall::ListDatabases)?;
        Ok(rwlock_read(&self.state.databases).clone())
    }

    async fn list_schemas(
        &self,
        _connection_id: Uuid,
        database: &str,
    ) -> Result<Vec<SchemaInfo>, IntelError> {
        self.enter(FetchCall::ListSchemas)?;
        Ok(rwlock_read(&self.state.schemas)
            .get(database)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_tables(
        &self,
        _connection_id: Uuid,
        schema: Option<&str>,
    ) -> Result<Vec<TableInfo>, IntelError> {
        self.enter(FetchCall::ListTables)?;
        Ok(rwlock_read(&self.state.tables)
            .get(&schema_key(schema))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_columns(
        &self,
        _connection_id: Uuid,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ColumnInfo>, IntelError> {
        self.enter(FetchCall::GetColumns)?;
        Ok(rwlock_read(&self.state.columns)
            .get(&table_key(schema, table))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_indexes(
        &self,
        _connection_id: Uuid,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<IndexInfo>, IntelError> {
        self.enter(FetchCall::ListIndexes)?;
        Ok(rwlock_read(&self.state.indexes)
            .get(&table_key(schema, table))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_constraints(
        &self,
        _connection_id: Uuid,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<ConstraintInfo>, IntelError> {
        self.enter(FetchCall::ListConstraints)?;
        Ok(rwlock_read(&self.state.constraints)
            .get(&table_key(schema, table))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_triggers(
        &self,
        _connection_id: Uuid,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<TriggerInfo>, IntelError> {
        self.enter(FetchCall::ListTriggers)?;
        Ok(rwlock_read(&self.state.triggers)
            .get(&table_key(schema, table))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_views(
        &self,
        _connection_id: Uuid,
        schema: Option<&str>,
    ) -> Result<Vec<ViewInfo>, IntelError> {
        self.enter(FetchCall::ListViews)?;
        Ok(rwlock_read(&self.state.views)
            .get(&schema_key(schema))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_functions(
        &self,
        _connection_id: Uuid,
        schema: Option<&str>,
    ) -> Result<Vec<FunctionInfo>, IntelError> {
        self.enter(FetchCall::ListFunctions)?;
        Ok(rwlock_read(&self.state.functions)
            .get(&schema_key(schema))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_sequences(
        &self,
        _connection_id: Uuid,
        schema: Option<&str>,
    ) -> Result<Vec<SequenceInfo>, IntelError> {
        self.enter(FetchCall::ListSequences)?;
        Ok(rwlock_read(&self.state.sequences)
            .get(&schema_key(schema))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl StatementExecutor for FakeBackend {
    async fn execute(
        &self,
        _connection_id: Uuid,
        sql: &str,
    ) -> Result<StatementResult, IntelError> {
        self.record(FetchCall::Execute);
        if self.should_fail(FetchCall::Execute) {
            return Err(IntelError::ExecutionFailed("injected failure".to_string()));
        }

        Ok(rwlock_read(&self.state.results)
            .get(sql)
            .cloned()
            .unwrap_or_else(StatementResult::empty))
    }
}

fn schema_key(schema: Option<&str>) -> String {
    schema.unwrap_or_default().to_string()
}

fn table_key(schema: Option<&str>, table: &str) -> String {
    format!("{}.{}", schema.unwrap_or_default(), table)
}

fn rwlock_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn rwlock_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::{FakeBackend, FetchCall};
    use crate::fixtures;
    use sqlintel_core::{IntelError, SchemaFetcher, StatementExecutor};
    use uuid::Uuid;

    #[tokio::test]
    async fn unconfigured_keys_return_empty_results() {
        let backend = FakeBackend::new();
        let connection_id = Uuid::new_v4();

        let tables = backend
            .list_tables(connection_id, Some("public"))
            .await
            .expect("list should succeed");
        assert!(tables.is_empty());

        let result = backend
            .execute(connection_id, "SELECT 1")
            .await
            .expect("execute should succeed");
        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
    }

    #[tokio::test]
    async fn injected_failure_surfaces_and_clears() {
        let backend = FakeBackend::new().with_tables(
            Some("public"),
            vec![fixtures::table_in_schema("public", "users")],
        );
        let connection_id = Uuid::new_v4();

        backend.fail_on(FetchCall::ListTables);
        let failed = backend.list_tables(connection_id, Some("public")).await;
        assert!(matches!(failed, Err(IntelError::FetchFailed(_))));

        backend.clear_fail(FetchCall::ListTables);
        let tables = backend
            .list_tables(connection_id, Some("public"))
            .await
            .expect("list should succeed after clearing");
        assert_eq!(tables.len(), 1);

        assert_eq!(backend.call_count(FetchCall::ListTables), 2);
    }

    #[tokio::test]
    async fn clones_share_state_and_counters() {
        let backend = FakeBackend::new();
        let clone = backend.clone();
        let connection_id = Uuid::new_v4();

        backend.set_databases(&["app", "analytics"]);
        let databases = clone
            .list_databases(connection_id)
            .await
            .expect("list should succeed");
        assert_eq!(databases, vec!["app", "analytics"]);
        assert_eq!(backend.call_count(FetchCall::ListDatabases), 1);
    }

    #[tokio::test]
    async fn table_scoped_maps_distinguish_schemas() {
        let backend = FakeBackend::new()
            .with_columns(
                Some("public"),
                "users",
                vec![fixtures::pk_column("id", "integer")],
            )
            .with_columns(None, "users", vec![fixtures::column("rowid", "integer", false)]);
        let connection_id = Uuid::new_v4();

        let scoped = backend
            .get_columns(connection_id, "users", Some("public"))
            .await
            .expect("columns should load");
        assert_eq!(scoped[0].name, "id");

        let bare = backend
            .get_columns(connection_id, "users", None)
            .await
            .expect("columns should load");
        assert_eq!(bare[0].name, "rowid");
    }

    #[tokio::test]
    async fn execute_returns_configured_result_by_sql() {
        let backend = FakeBackend::new().with_result(
            "SELECT usename as name FROM pg_catalog.pg_user;",
            fixtures::name_result(&["alice", "bob"]),
        );
        let connection_id = Uuid::new_v4();

        let result = backend
            .execute(connection_id, "SELECT usename as name FROM pg_catalog.pg_user;")
            .await
            .expect("execute should succeed");
        assert_eq!(result.string_values(0), vec!["alice", "bob"]);
        assert_eq!(backend.call_count(FetchCall::Execute), 1);
    }
}
