use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogColumn, SchemaCatalog, TableObjectKind};
use crate::cursor_context::{floor_char_boundary, CursorContext, CursorContextAnalyzer, SqlContext};
use crate::sql_dialect::{dialect_for, SqlDialect};

/// Characters that should reopen the completion popup.
pub const TRIGGER_CHARACTERS: [char; 2] = ['.', ' '];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Schema,
    Table,
    View,
    Column,
    Keyword,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSuggestion {
    pub label: String,
    pub insert_text: String,
    pub kind: CompletionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub sort_order: i32,
}

/// Ordered suggestions plus the byte range the accepted one replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionList {
    pub suggestions: Vec<CompletionSuggestion>,
    pub replace_range: Range<usize>,
}

/// Context-aware completion over a shared [`SchemaCatalog`].
///
/// Stateless apart from the catalog reference: each call re-reads the
/// buffer, so suggestions always reflect whatever metadata has been
/// fetched by the time the user pauses. An empty catalog produces no
/// suggestions at all rather than keyword noise.
pub struct CompletionEngine {
    analyzer: CursorContextAnalyzer,
    catalog: Arc<SchemaCatalog>,
}

impl CompletionEngine {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self::with_analyzer(CursorContextAnalyzer::new(), catalog)
    }

    pub fn with_analyzer(analyzer: CursorContextAnalyzer, catalog: Arc<SchemaCatalog>) -> Self {
        Self { analyzer, catalog }
    }

    /// Suggestions for the cursor position, ranked. Stable sort keeps
    /// the emission order within a rank, so aliases stay ahead of the
    /// tables they point at.
    pub fn complete(&self, sql: &str, cursor_offset: usize) -> CompletionList {
        let position = floor_char_boundary(sql, cursor_offset);
        if self.catalog.is_empty() {
            return CompletionList {
                suggestions: Vec::new(),
                replace_range: position..position,
            };
        }

        let context = self.analyzer.parse(sql, position);
        let replace_range = replacement_range(position, &context);

        let mut suggestions = self.suggestions_for_context(&context);
        suggestions.sort_by_key(|s| s.sort_order);

        CompletionList {
            suggestions,
            replace_range,
        }
    }

    fn suggestions_for_context(&self, context: &SqlContext) -> Vec<CompletionSuggestion> {
        let dialect = dialect_for(self.catalog.engine());

        // A dotted qualifier always means columns, whatever the clause.
        if let Some(prefix) = &context.prefix {
            let table_name = self.analyzer.resolve_alias(&context.aliases, prefix);
            return self.column_suggestions(&table_name, &context.current_word);
        }

        let mut suggestions = Vec::new();
        match context.cursor_context {
            CursorContext::FromClause => {
                suggestions.extend(self.schema_suggestions(dialect));
                suggestions.extend(self.table_suggestions(dialect, &context.current_word));
            }
            CursorContext::SelectColumns
            | CursorContext::WhereClause
            | CursorContext::JoinCondition
            | CursorContext::OrderBy
            | CursorContext::GroupBy => {
                for (alias, table_name) in &context.aliases {
                    suggestions.push(CompletionSuggestion {
                        label: alias.clone(),
                        insert_text: alias.clone(),
                        kind: CompletionKind::Table,
                        detail: Some(format!("Alias for {table_name}")),
                        documentation: None,
                        sort_order: 0,
                    });
                }
                suggestions.extend(self.table_suggestions(dialect, &context.current_word));
            }
            CursorContext::General => {
                suggestions.extend(self.keyword_suggestions(dialect, &context.current_word));
                suggestions.extend(self.schema_suggestions(dialect));
                suggestions.extend(self.table_suggestions(dialect, &context.current_word));
            }
        }

        suggestions
    }

    fn table_suggestions(&self, dialect: &dyn SqlDialect, prefix: &str) -> Vec<CompletionSuggestion> {
        let tables = if prefix.is_empty() {
            self.catalog.get_tables(None)
        } else {
            self.catalog.search_tables(prefix)
        };

        tables
            .iter()
            .enumerate()
            .map(|(index, table)| {
                let name = dialect.format_table_name(table);
                let is_view = table.kind == TableObjectKind::View;
                CompletionSuggestion {
                    label: name.clone(),
                    insert_text: name,
                    kind: if is_view {
                        CompletionKind::View
                    } else {
                        CompletionKind::Table
                    },
                    detail: Some(if is_view { "View" } else { "Table" }.to_string()),
                    documentation: table.schema.as_ref().map(|s| format!("Schema: {s}")),
                    sort_order: index as i32,
                }
            })
            .collect()
    }

    fn schema_suggestions(&self, dialect: &dyn SqlDialect) -> Vec<CompletionSuggestion> {
        if !dialect.supports_schemas() {
            return Vec::new();
        }

        self.catalog
            .get_schemas()
            .into_iter()
            .enumerate()
            .map(|(index, schema)| {
                let name = dialect.format_schema_name(&schema);
                CompletionSuggestion {
                    label: name.clone(),
                    insert_text: name,
                    kind: CompletionKind::Schema,
                    detail: Some("Schema".to_string()),
                    documentation: None,
                    sort_order: index as i32,
                }
            })
            .collect()
    }

    fn column_suggestions(&self, table_name: &str, prefix: &str) -> Vec<CompletionSuggestion> {
        let columns = if prefix.is_empty() {
            self.catalog.get_columns(table_name)
        } else {
            self.catalog.search_columns(table_name, prefix)
        };

        columns
            .iter()
            .enumerate()
            .map(|(index, column)| CompletionSuggestion {
                label: column.name.clone(),
                insert_text: column.name.clone(),
                kind: CompletionKind::Column,
                detail: Some(column.data_type.clone()),
                documentation: column_documentation(column),
                // Primary keys rank ahead of everything else.
                sort_order: if column.is_primary_key { -1 } else { index as i32 },
            })
            .collect()
    }

    fn keyword_suggestions(&self, dialect: &dyn SqlDialect, prefix: &str) -> Vec<CompletionSuggestion> {
        let upper = prefix.to_uppercase();

        dialect
            .keywords()
            .iter()
            .filter(|kw| kw.starts_with(&upper))
            .enumerate()
            .map(|(index, kw)| CompletionSuggestion {
                label: (*kw).to_string(),
                insert_text: (*kw).to_string(),
                kind: CompletionKind::Keyword,
                detail: Some("Keyword".to_string()),
                documentation: None,
                // Keywords sort after every schema object.
                sort_order: 100 + index as i32,
            })
            .collect()
    }
}

fn replacement_range(position: usize, context: &SqlContext) -> Range<usize> {
    let qualifier = context.prefix.as_ref().map(|p| p.len() + 1).unwrap_or(0);
    let start = position.saturating_sub(context.current_word.len() + qualifier);
    start..position
}

fn column_documentation(column: &CatalogColumn) -> Option<String> {
    let mut parts = Vec::new();
    if column.is_primary_key {
        parts.push("Primary key".to_string());
    }
    parts.push(if column.nullable { "Nullable" } else { "NOT NULL" }.to_string());
    if let Some(comment) = &column.comment {
        if !comment.is_empty() {
            parts.push(comment.clone());
        }
    }
    Some(parts.join(" | "))
}
