use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Alias map extracted from a buffer. Keys are lowercased aliases,
/// values are the table names as written (possibly schema-qualified).
pub type AliasMap = IndexMap<String, String>;

/// What the completion engine needs to know about the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlContext {
    pub aliases: AliasMap,
    pub cursor_context: CursorContext,
    /// Word being typed, empty right after a separator.
    pub current_word: String,
    /// Qualifier before a dot, as in `u.na` -> `u`.
    pub prefix: Option<String>,
}

/// Clause the cursor sits in, by keyword proximity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorContext {
    SelectColumns,
    FromClause,
    WhereClause,
    JoinCondition,
    OrderBy,
    GroupBy,
    General,
}

// FROM table alias, FROM table AS alias, same for JOIN. Table may be
// schema-qualified.
static TABLE_ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:FROM|JOIN)\s+([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?)\s+(?:AS\s+)?([A-Za-z_][A-Za-z0-9_]*)",
    )
    .unwrap()
});

static SELECT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bSELECT\b").unwrap());
static FROM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bFROM\b").unwrap());
static WHERE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").unwrap());
static ORDER_OR_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:ORDER|GROUP)\b").unwrap());
static FROM_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:FROM|JOIN)\s+[^,]*$").unwrap());
static ON_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bON\s+[^,]*$").unwrap());
static ORDER_BY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").unwrap());
static GROUP_BY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bGROUP\s+BY\b").unwrap());
static CURRENT_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[A-Za-z_][A-Za-z0-9_]*)?\.?(?:[A-Za-z_][A-Za-z0-9_]*)?$").unwrap()
});

// Words that follow a table reference without being an alias.
const CONTEXT_KEYWORDS: [&str; 24] = [
    "SELECT", "FROM", "JOIN", "LEFT", "RIGHT", "INNER", "OUTER", "CROSS", "WHERE", "AND", "OR",
    "ON", "ORDER", "BY", "GROUP", "HAVING", "LIMIT", "OFFSET", "INSERT", "UPDATE", "DELETE",
    "SET", "VALUES", "INTO",
];

/// Regex-based analyzer for aliases, cursor clause, and the word under
/// the cursor. Not a parser; it reads keyword shapes and nothing else,
/// so broken mid-edit SQL still produces a usable answer.
///
/// Aliases come from the whole buffer, clause and word only from the
/// text before the cursor. A cursor offset inside a multi-byte
/// character is moved back to the nearest boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorContextAnalyzer;

impl CursorContextAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, sql: &str, cursor_offset: usize) -> SqlContext {
        let position = floor_char_boundary(sql, cursor_offset);
        let aliases = self.extract_aliases(sql);
        let cursor_context = self.detect_cursor_context(sql, position);
        let (current_word, prefix) = self.extract_current_word(sql, position);

        SqlContext {
            aliases,
            cursor_context,
            current_word,
            prefix,
        }
    }

    /// All `FROM x y` / `JOIN x AS y` pairs in the buffer. Candidate
    /// aliases that are themselves SQL keywords are discarded.
    pub fn extract_aliases(&self, sql: &str) -> AliasMap {
        let mut aliases = AliasMap::new();
        let normalized = sql.split_whitespace().collect::<Vec<_>>().join(" ");

        for caps in TABLE_ALIAS_RE.captures_iter(&normalized) {
            let table = &caps[1];
            let alias = &caps[2];
            if !is_keyword(alias) {
                aliases.insert(alias.to_lowercase(), table.to_string());
            }
        }

        aliases
    }

    /// Alias lookup that falls back to the input unchanged, so callers
    /// can pass a real table name through it.
    pub fn resolve_alias(&self, aliases: &AliasMap, alias_or_table: &str) -> String {
        aliases
            .get(&alias_or_table.to_lowercase())
            .cloned()
            .unwrap_or_else(|| alias_or_table.to_string())
    }

    // First clause shape that matches wins. FROM/JOIN stays active
    // until a comma ends its table list, which is why it outranks
    // WHERE here.
    fn detect_cursor_context(&self, sql: &str, position: usize) -> CursorContext {
        let text_before = &sql[..position];

        if let Some(last_select) = SELECT_RE.find_iter(text_before).last() {
            if !FROM_RE.is_match(&text_before[last_select.end()..]) {
                return CursorContext::SelectColumns;
            }
        }

        if FROM_TAIL_RE.is_match(text_before) {
            return CursorContext::FromClause;
        }

        if let Some(last_where) = WHERE_RE.find_iter(text_before).last() {
            if !ORDER_OR_GROUP_RE.is_match(&text_before[last_where.end()..]) {
                return CursorContext::WhereClause;
            }
        }

        if ON_TAIL_RE.is_match(text_before) {
            return CursorContext::JoinCondition;
        }

        if ORDER_BY_RE.is_match(text_before) {
            return CursorContext::OrderBy;
        }

        if GROUP_BY_RE.is_match(text_before) {
            return CursorContext::GroupBy;
        }

        CursorContext::General
    }

    fn extract_current_word(&self, sql: &str, position: usize) -> (String, Option<String>) {
        let text_before = &sql[..position];

        let Some(word) = CURRENT_WORD_RE.find(text_before) else {
            return (String::new(), None);
        };
        let word = word.as_str();

        if word.contains('.') {
            let mut parts = word.splitn(2, '.');
            let prefix = parts.next().unwrap_or("");
            let current = parts.next().unwrap_or("");
            let prefix = (!prefix.is_empty()).then(|| prefix.to_string());
            return (current.to_string(), prefix);
        }

        (word.to_string(), None)
    }
}

fn is_keyword(word: &str) -> bool {
    CONTEXT_KEYWORDS.contains(&word.to_uppercase().as_str())
}

pub(crate) fn floor_char_boundary(sql: &str, offset: usize) -> usize {
    let mut position = offset.min(sql.len());
    while position > 0 && !sql.is_char_boundary(position) {
        position -= 1;
    }
    position
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> CursorContextAnalyzer {
        CursorContextAnalyzer::new()
    }

    fn context_at(sql: &str) -> CursorContext {
        analyzer().parse(sql, sql.len()).cursor_context
    }

    // ==================== alias tests ====================

    #[test]
    fn extracts_from_and_join_aliases() {
        let sql = "SELECT * FROM users u JOIN orders AS o ON u.id = o.user_id";
        let aliases = analyzer().extract_aliases(sql);
        assert_eq!(aliases.get("u").map(String::as_str), Some("users"));
        assert_eq!(aliases.get("o").map(String::as_str), Some("orders"));
    }

    #[test]
    fn aliases_keep_schema_qualified_tables() {
        let aliases = analyzer().extract_aliases("SELECT * FROM public.users pu");
        assert_eq!(aliases.get("pu").map(String::as_str), Some("public.users"));
    }

    #[test]
    fn alias_keys_are_lowercased() {
        let aliases = analyzer().extract_aliases("SELECT * FROM Users U");
        assert_eq!(aliases.get("u").map(String::as_str), Some("Users"));
    }

    #[test]
    fn keywords_are_not_aliases() {
        let aliases = analyzer().extract_aliases("SELECT * FROM users WHERE id = 1");
        assert!(aliases.is_empty());
    }

    #[test]
    fn aliases_survive_newlines_and_extra_spaces() {
        let aliases = analyzer().extract_aliases("SELECT *\nFROM\n    users\n    u");
        assert_eq!(aliases.get("u").map(String::as_str), Some("users"));
    }

    #[test]
    fn aliases_come_from_the_whole_buffer() {
        // Cursor before the FROM clause; the alias is still visible.
        let ctx = analyzer().parse("SELECT u. FROM users u", 9);
        assert_eq!(ctx.aliases.get("u").map(String::as_str), Some("users"));
        assert_eq!(ctx.prefix.as_deref(), Some("u"));
    }

    #[test]
    fn resolve_alias_falls_back_to_input() {
        let aliases = analyzer().extract_aliases("SELECT * FROM users u");
        assert_eq!(analyzer().resolve_alias(&aliases, "U"), "users");
        assert_eq!(analyzer().resolve_alias(&aliases, "orders"), "orders");
    }

    // ==================== cursor context tests ====================

    #[test]
    fn select_without_from_is_select_columns() {
        assert_eq!(context_at("SELECT id, na"), CursorContext::SelectColumns);
        assert_eq!(context_at("select "), CursorContext::SelectColumns);
    }

    #[test]
    fn open_table_list_is_from_clause() {
        assert_eq!(context_at("SELECT * FROM "), CursorContext::FromClause);
        assert_eq!(context_at("SELECT * FROM users JOIN "), CursorContext::FromClause);
        // No comma after FROM keeps the clause open even past WHERE.
        assert_eq!(
            context_at("SELECT * FROM users WHERE id = "),
            CursorContext::FromClause
        );
    }

    #[test]
    fn where_clause_after_closed_table_list() {
        assert_eq!(
            context_at("SELECT * FROM orders o, users u WHERE "),
            CursorContext::WhereClause
        );
        assert_eq!(
            context_at("UPDATE users SET active = 1, age = 2 WHERE "),
            CursorContext::WhereClause
        );
    }

    #[test]
    fn on_without_table_list_is_join_condition() {
        assert_eq!(
            context_at("MERGE INTO accounts USING updates ON accounts.id = updates.id AND "),
            CursorContext::JoinCondition
        );
    }

    #[test]
    fn order_and_group_by_contexts() {
        assert_eq!(
            context_at("SELECT * FROM orders, users ORDER BY "),
            CursorContext::OrderBy
        );
        assert_eq!(
            context_at("SELECT count(*) FROM orders, users GROUP BY "),
            CursorContext::GroupBy
        );
    }

    #[test]
    fn where_closes_once_order_by_appears() {
        assert_eq!(
            context_at("SELECT * FROM a, b WHERE x = 1 ORDER BY "),
            CursorContext::OrderBy
        );
    }

    #[test]
    fn unrelated_statements_are_general() {
        assert_eq!(context_at("INSERT INTO users VALUES ("), CursorContext::General);
        assert_eq!(context_at(""), CursorContext::General);
    }

    // ==================== current word tests ====================

    #[test]
    fn extracts_plain_current_word() {
        let ctx = analyzer().parse("SELECT na", 9);
        assert_eq!(ctx.current_word, "na");
        assert_eq!(ctx.prefix, None);
    }

    #[test]
    fn dot_splits_prefix_and_word() {
        let ctx = analyzer().parse("SELECT u.na", 11);
        assert_eq!(ctx.current_word, "na");
        assert_eq!(ctx.prefix.as_deref(), Some("u"));

        let ctx = analyzer().parse("SELECT u.", 9);
        assert_eq!(ctx.current_word, "");
        assert_eq!(ctx.prefix.as_deref(), Some("u"));
    }

    #[test]
    fn word_is_empty_after_separator() {
        let ctx = analyzer().parse("SELECT id ", 10);
        assert_eq!(ctx.current_word, "");
        assert_eq!(ctx.prefix, None);
    }

    #[test]
    fn qualified_chain_keeps_last_two_segments() {
        let ctx = analyzer().parse("SELECT public.users.na", 22);
        assert_eq!(ctx.current_word, "na");
        assert_eq!(ctx.prefix.as_deref(), Some("users"));
    }

    // ==================== offset handling tests ====================

    #[test]
    fn offset_inside_multibyte_char_is_floored() {
        let sql = "SELECT 'héllo' FROM t";
        // Byte 10 falls inside the two-byte 'é'.
        assert!(!sql.is_char_boundary(10));
        let ctx = analyzer().parse(sql, 10);
        assert_eq!(ctx.cursor_context, CursorContext::SelectColumns);
    }

    #[test]
    fn offset_past_end_is_clamped() {
        let ctx = analyzer().parse("SELECT na", 500);
        assert_eq!(ctx.current_word, "na");
    }
}
