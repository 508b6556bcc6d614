//! End-to-end tour: split a script, browse a fake backend through the
//! schema tree, then ask for completions backed by what the tree found.
//!
//! Run with `cargo run --example explore`.

use std::sync::Arc;

use sqlintel_core::{
    CompletionEngine, ConnectionDescriptor, ConnectionStatus, EngineKind, NodeId, SchemaCatalog,
    SchemaTree, detect_statement_kind, is_destructive_statement, split_statements,
};
use sqlintel_test_support::{FakeBackend, fixtures};
use uuid::Uuid;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let script = "\
SELECT id, email FROM users WHERE active; -- who is around
UPDATE users SET active = false WHERE last_seen < now() - interval '1 year';
DROP TABLE retired_accounts;";

    println!("Statements:");
    for statement in split_statements(script) {
        let destructive = if is_destructive_statement(&statement.sql) {
            " destructive"
        } else {
            ""
        };
        println!(
            "  line {:>2} {:?}{} | {}",
            statement.start_line,
            detect_statement_kind(&statement.sql),
            destructive,
            statement.sql.lines().next().unwrap_or_default(),
        );
    }

    let backend = FakeBackend::new()
        .with_databases(&["app"])
        .with_schemas("app", vec![fixtures::schema_info("public")])
        .with_tables(
            Some("public"),
            vec![
                fixtures::table_in_schema("public", "users"),
                fixtures::table_in_schema("public", "orders"),
            ],
        )
        .with_columns(Some("public"), "users", fixtures::users_columns());

    let connection = ConnectionDescriptor {
        id: Uuid::new_v4(),
        name: "Demo".to_string(),
        engine: EngineKind::Postgres,
        database: Some("app".to_string()),
        status: ConnectionStatus::Connected,
    };

    let mut tree = SchemaTree::new(
        backend.clone().as_fetcher_arc(),
        backend.clone().as_executor_arc(),
        Arc::new(SchemaCatalog::new()),
    );
    tree.sync_connections(std::slice::from_ref(&connection));

    // Expanding the root cascades down to the tables of the default
    // schema, feeding the catalog along the way.
    tree.toggle_node(&NodeId::Connection {
        connection_id: connection.id,
    })
    .await?;
    tree.toggle_node(&NodeId::Table {
        connection_id: connection.id,
        schema: "public".to_string(),
        name: "users".to_string(),
    })
    .await?;
    tree.toggle_node(&NodeId::ColumnsFolder {
        connection_id: connection.id,
        schema: "public".to_string(),
        table: "users".to_string(),
    })
    .await?;

    println!("\nSchema tree:");
    for (depth, node) in tree.visible_nodes() {
        println!("  {}{}", "  ".repeat(depth), node.name);
    }

    let completion = CompletionEngine::new(Arc::clone(tree.catalog()));
    let sql = "SELECT u. FROM users u";
    let list = completion.complete(sql, 9);
    println!("\nCompletions after `SELECT u.`:");
    for suggestion in &list.suggestions {
        println!(
            "  {:<8} {:?} {}",
            suggestion.label,
            suggestion.kind,
            suggestion.detail.as_deref().unwrap_or_default(),
        );
    }

    Ok(())
}
