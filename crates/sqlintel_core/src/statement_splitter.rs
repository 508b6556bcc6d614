use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const MAX_CACHE_SIZE: usize = 50;

/// One executable statement cut out of an editor buffer.
///
/// `sql` is trimmed and keeps its trailing semicolon. Offsets are byte
/// offsets into the original buffer; `sql` equals the trimmed slice
/// `buffer[start_offset..end_offset]`. Lines are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedStatement {
    pub sql: String,
    pub start_line: usize,
    pub end_line: usize,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Split a buffer into statements on `;`, ignoring separators inside
/// strings and comments.
///
/// Single-pass scan, not a parser: backslash escapes count only inside
/// quotes, `--` comments end at the newline, `/* */` comments do not
/// nest. An unterminated quote or comment folds the rest of the buffer
/// into the current statement rather than failing.
pub fn split_statements(sql: &str) -> Vec<ParsedStatement> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut start_offset = 0usize;
    let mut start_line = 1usize;
    let mut current_line = 1usize;

    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;
    let mut escaped = false;

    let mut chars = sql.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        let next = chars.peek().map(|&(_, c)| c);

        if ch == '\n' {
            current_line += 1;
            if in_line_comment {
                in_line_comment = false;
            }
        }

        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }

        if ch == '\\' && (in_single_quote || in_double_quote) {
            escaped = true;
            current.push(ch);
            continue;
        }

        if !in_single_quote && !in_double_quote {
            if ch == '-' && next == Some('-') {
                in_line_comment = true;
                current.push(ch);
                continue;
            }

            if ch == '/' && next == Some('*') {
                in_block_comment = true;
                current.push(ch);
                continue;
            }

            if in_block_comment && ch == '*' && next == Some('/') {
                current.push(ch);
                current.push('/');
                chars.next();
                in_block_comment = false;
                continue;
            }
        }

        if in_line_comment || in_block_comment {
            current.push(ch);
            continue;
        }

        if ch == '\'' && !in_double_quote {
            in_single_quote = !in_single_quote;
            current.push(ch);
            continue;
        }

        if ch == '"' && !in_single_quote {
            in_double_quote = !in_double_quote;
            current.push(ch);
            continue;
        }

        if ch == ';' && !in_single_quote && !in_double_quote {
            current.push(ch);
            let trimmed = current.trim();
            if !trimmed.is_empty() && trimmed != ";" {
                statements.push(ParsedStatement {
                    sql: trimmed.to_string(),
                    start_line,
                    end_line: current_line,
                    start_offset,
                    end_offset: i + 1,
                });
            }
            current.clear();
            start_offset = i + 1;
            start_line = current_line;
            continue;
        }

        current.push(ch);
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(ParsedStatement {
            sql: trimmed.to_string(),
            start_line,
            end_line: current_line,
            start_offset,
            end_offset: sql.len(),
        });
    }

    statements
}

/// Memoizing wrapper around [`split_statements`].
///
/// Editors re-split the same buffer on every keystroke pause; results
/// are cached by exact buffer text, bounded with FIFO eviction.
pub struct StatementSplitter {
    cache: IndexMap<String, Vec<ParsedStatement>>,
    capacity: usize,
}

impl Default for StatementSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSplitter {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHE_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: IndexMap::new(),
            capacity,
        }
    }

    pub fn split(&mut self, sql: &str) -> &[ParsedStatement] {
        if !self.cache.contains_key(sql) {
            if self.cache.len() >= self.capacity {
                self.cache.shift_remove_index(0);
            }
            self.cache.insert(sql.to_string(), split_statements(sql));
        }
        self.cache.get(sql).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First statement whose `[start_offset, end_offset]` range contains
    /// the cursor, both ends inclusive, with its index.
    pub fn find_statement_at_cursor(
        &mut self,
        sql: &str,
        cursor_offset: usize,
    ) -> Option<(ParsedStatement, usize)> {
        self.split(sql)
            .iter()
            .enumerate()
            .find(|(_, stmt)| {
                cursor_offset >= stmt.start_offset && cursor_offset <= stmt.end_offset
            })
            .map(|(index, stmt)| (stmt.clone(), index))
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

/// Coarse statement class, from the first keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Ddl,
    Other,
}

/// Classify a statement by its leading keyword.
///
/// Only the first keyword of the trimmed text is inspected, so a
/// statement prefixed by a comment classifies as `Other`. Known
/// limitation, kept because callers treat `Other` conservatively.
pub fn detect_statement_kind(sql: &str) -> StatementKind {
    let normalized = sql.trim().to_uppercase();

    if normalized.starts_with("SELECT") || normalized.starts_with("WITH") {
        return StatementKind::Select;
    }
    if normalized.starts_with("INSERT") {
        return StatementKind::Insert;
    }
    if normalized.starts_with("UPDATE") {
        return StatementKind::Update;
    }
    if normalized.starts_with("DELETE") {
        return StatementKind::Delete;
    }
    if normalized.starts_with("CREATE")
        || normalized.starts_with("ALTER")
        || normalized.starts_with("DROP")
        || normalized.starts_with("TRUNCATE")
    {
        return StatementKind::Ddl;
    }

    StatementKind::Other
}

/// Whether a statement can modify or destroy data, by leading keyword.
pub fn is_destructive_statement(sql: &str) -> bool {
    let normalized = sql.trim().to_uppercase();
    normalized.starts_with("UPDATE")
        || normalized.starts_with("DELETE")
        || normalized.starts_with("DROP")
        || normalized.starts_with("TRUNCATE")
        || normalized.starts_with("ALTER")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== splitting tests ====================

    #[test]
    fn single_statement_without_semicolon() {
        let statements = split_statements("SELECT * FROM users");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].sql, "SELECT * FROM users");
        assert_eq!(statements[0].start_offset, 0);
        assert_eq!(statements[0].end_offset, 19);
    }

    #[test]
    fn multiple_statements_keep_offsets_and_lines() {
        let sql = "SELECT 1;\nSELECT 2;";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);

        assert_eq!(statements[0].sql, "SELECT 1;");
        assert_eq!(statements[0].start_offset, 0);
        assert_eq!(statements[0].end_offset, 9);
        assert_eq!(statements[0].start_line, 1);
        assert_eq!(statements[0].end_line, 1);

        assert_eq!(statements[1].sql, "SELECT 2;");
        assert_eq!(statements[1].start_offset, 9);
        assert_eq!(statements[1].end_offset, 19);
        assert_eq!(statements[1].end_line, 2);
    }

    #[test]
    fn statements_equal_trimmed_slices() {
        let sql = "  SELECT 1; \n UPDATE t SET x = 'a;b';\n-- done\nSELECT 2";
        for stmt in split_statements(sql) {
            assert_eq!(stmt.sql, sql[stmt.start_offset..stmt.end_offset].trim());
        }
    }

    #[test]
    fn semicolon_inside_single_quotes_does_not_split() {
        let statements = split_statements("SELECT 'a;b' FROM t; SELECT 2;");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].sql, "SELECT 'a;b' FROM t;");
    }

    #[test]
    fn semicolon_inside_double_quotes_does_not_split() {
        let statements = split_statements("SELECT \"col;umn\" FROM t; SELECT 2;");
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn semicolon_inside_line_comment_does_not_split() {
        let sql = "SELECT 1 -- trailing; note\n;";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].sql.contains("trailing; note"));
    }

    #[test]
    fn semicolon_inside_block_comment_does_not_split() {
        let statements = split_statements("SELECT /* a; b */ 1; SELECT 2;");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].sql, "SELECT /* a; b */ 1;");
    }

    #[test]
    fn escaped_quote_stays_inside_string() {
        let statements = split_statements("SELECT 'it\\'s; fine'; SELECT 2;");
        assert_eq!(statements.len(), 2);
        assert!(statements[0].sql.contains("it\\'s; fine"));
    }

    #[test]
    fn empty_segments_are_dropped() {
        assert!(split_statements(";;;").is_empty());
        assert!(split_statements("  ; \n ;  ").is_empty());
        assert!(split_statements("").is_empty());
    }

    #[test]
    fn unterminated_quote_folds_remainder() {
        let statements = split_statements("SELECT 'abc; def");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].sql, "SELECT 'abc; def");
    }

    #[test]
    fn unterminated_block_comment_folds_remainder() {
        let statements = split_statements("SELECT 1 /* open; forever");
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn multibyte_text_keeps_valid_offsets() {
        let sql = "SELECT 'héllo'; SELECT 'wörld';";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        for stmt in &statements {
            assert_eq!(stmt.sql, sql[stmt.start_offset..stmt.end_offset].trim());
        }
    }

    // ==================== cursor lookup tests ====================

    #[test]
    fn cursor_lookup_is_inclusive_first_match() {
        let mut splitter = StatementSplitter::new();
        let sql = "SELECT 1;  SELECT 2;";

        let (stmt, index) = splitter.find_statement_at_cursor(sql, 0).unwrap();
        assert_eq!(index, 0);
        assert_eq!(stmt.sql, "SELECT 1;");

        // Shared boundary: end of the first statement wins.
        let (_, index) = splitter.find_statement_at_cursor(sql, 9).unwrap();
        assert_eq!(index, 0);

        let (stmt, index) = splitter.find_statement_at_cursor(sql, 15).unwrap();
        assert_eq!(index, 1);
        assert_eq!(stmt.sql, "SELECT 2;");

        assert!(splitter.find_statement_at_cursor(sql, 99).is_none());
    }

    // ==================== cache tests ====================

    #[test]
    fn repeated_splits_are_deterministic() {
        let mut splitter = StatementSplitter::new();
        let sql = "SELECT 1; SELECT 2;";
        let first = splitter.split(sql).to_vec();
        let second = splitter.split(sql).to_vec();
        assert_eq!(first, second);
        assert_eq!(splitter.cache_size(), 1);
    }

    #[test]
    fn cache_never_exceeds_capacity() {
        let mut splitter = StatementSplitter::with_capacity(2);
        splitter.split("SELECT 1");
        splitter.split("SELECT 2");
        splitter.split("SELECT 3");
        assert_eq!(splitter.cache_size(), 2);

        // Evicted buffers still split correctly on re-entry.
        let statements = splitter.split("SELECT 1");
        assert_eq!(statements.len(), 1);
        assert_eq!(splitter.cache_size(), 2);
    }

    // ==================== classifier tests ====================

    #[test]
    fn detects_statement_kinds() {
        assert_eq!(detect_statement_kind("SELECT 1"), StatementKind::Select);
        assert_eq!(
            detect_statement_kind("WITH x AS (SELECT 1) SELECT * FROM x"),
            StatementKind::Select
        );
        assert_eq!(
            detect_statement_kind("insert into t values (1)"),
            StatementKind::Insert
        );
        assert_eq!(detect_statement_kind("UPDATE t SET x = 1"), StatementKind::Update);
        assert_eq!(detect_statement_kind("DELETE FROM t"), StatementKind::Delete);
        assert_eq!(detect_statement_kind("CREATE TABLE t (id int)"), StatementKind::Ddl);
        assert_eq!(detect_statement_kind("TRUNCATE t"), StatementKind::Ddl);
        assert_eq!(detect_statement_kind("EXPLAIN SELECT 1"), StatementKind::Other);
    }

    #[test]
    fn comment_prefixed_statement_classifies_as_other() {
        assert_eq!(
            detect_statement_kind("-- just a note\nSELECT 1"),
            StatementKind::Other
        );
        assert_eq!(
            detect_statement_kind("/* block */ DELETE FROM t"),
            StatementKind::Other
        );
    }

    #[test]
    fn destructive_statements_are_flagged() {
        assert!(is_destructive_statement("UPDATE t SET x = 1"));
        assert!(is_destructive_statement("  delete from t"));
        assert!(is_destructive_statement("DROP TABLE t"));
        assert!(is_destructive_statement("TRUNCATE t"));
        assert!(is_destructive_statement("ALTER TABLE t ADD c int"));
        assert!(!is_destructive_statement("SELECT * FROM t"));
        assert!(!is_destructive_statement("INSERT INTO t VALUES (1)"));
    }
}
