mod catalog;
mod completion;
mod cursor_context;
mod engine;
mod error;
mod fetch;
mod metadata;
mod node_id;
mod schema_tree;
mod sql_dialect;
mod statement_splitter;
mod tree_node;

// The unit tests drive `SchemaTree` with the `FakeBackend` from
// `crates/sqlintel_test_support`. Depending on that crate here would link
// a second copy of `sqlintel_core` into the test build, and its trait and
// result types would not unify with this build's. Instead the test build
// compiles the fake's sources directly and aliases the `sqlintel_core`
// name they import from back to this crate.
#[cfg(test)]
extern crate self as sqlintel_core;
// Not every helper the fake exports is exercised from this crate's tests.
#[cfg(test)]
#[allow(dead_code)]
#[path = "../../sqlintel_test_support/src/fake_fetcher.rs"]
mod fake_fetcher;
#[cfg(test)]
#[allow(dead_code)]
#[path = "../../sqlintel_test_support/src/fixtures.rs"]
mod fixtures;

pub use catalog::{
    CatalogColumn, CatalogTable, SchemaCatalog, SubscriptionId, TableObjectKind,
};
pub use completion::{
    CompletionEngine, CompletionKind, CompletionList, CompletionSuggestion, TRIGGER_CHARACTERS,
};
pub use cursor_context::{AliasMap, CursorContext, CursorContextAnalyzer, SqlContext};
pub use engine::{AdminFeatures, EngineKind};
pub use error::IntelError;
pub use fetch::{SchemaFetcher, StatementExecutor, StatementResult};
pub use metadata::{
    ColumnInfo, ConstraintInfo, ConstraintKind, FunctionInfo, IndexInfo, SchemaInfo, SequenceInfo,
    TableInfo, TriggerEvent, TriggerInfo, TriggerTiming, ViewInfo,
};
pub use node_id::{NodeId, NodeKind, ParseNodeIdError};
pub use schema_tree::SchemaTree;
pub use sql_dialect::{
    MySqlDialect, PostgresDialect, SqlDialect, SqlServerDialect, SqliteDialect, dialect_for,
};
pub use statement_splitter::{
    ParsedStatement, StatementKind, StatementSplitter, detect_statement_kind,
    is_destructive_statement, split_statements,
};
pub use tree_node::{ConnectionDescriptor, ConnectionMeta, ConnectionStatus, NodePayload, TreeNode};
