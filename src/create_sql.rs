//! Hand-rolled parser for the column list of a `CREATE TABLE` statement and
//! the single indexed column of a `CREATE INDEX` statement. Deliberately not
//! grammar-generator based: SQLite's `CREATE TABLE` grammar is large, and
//! this engine only needs ordered column names and the rowid-alias flag.

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub is_rowid_alias: bool,
}

/// Extracts the ordered column definitions from a `CREATE TABLE` statement's
/// parenthesized body.
///
/// Strategy: find the first `(` and its matching `)` at the outermost
/// nesting level, tracking quote state for `"`, `'`, and backtick so commas
/// or parens inside a quoted identifier or default-value literal are not
/// mistaken for structural ones. Split the interior on depth-0,
/// outside-quote commas. Each piece's first whitespace-delimited token,
/// stripped of surrounding `" ' [ ]`, is the column name. A piece whose text
/// contains both "integer" and "primary key" (case-insensitively) is an
/// `INTEGER PRIMARY KEY` rowid alias.
pub fn parse_columns(create_sql: &str) -> Vec<ColumnDef> {
    let body = match outer_parens_body(create_sql) {
        Some(b) => b,
        None => return Vec::new(),
    };

    split_top_level_commas(body)
        .into_iter()
        .map(|piece| {
            let piece = piece.trim();
            let name_token = piece.split_whitespace().next().unwrap_or("");
            let name = strip_quote_chars(name_token);
            let lower = piece.to_ascii_lowercase();
            let is_rowid_alias = lower.contains("integer") && lower.contains("primary key");
            ColumnDef { name, is_rowid_alias }
        })
        .collect()
}

/// For a `CREATE INDEX ... ON tbl(col)` statement, returns `col`. Only a
/// single indexed column is supported, matching the spec's multi-column
/// index non-goal.
pub fn index_column_name(create_sql: &str) -> Option<String> {
    let body = outer_parens_body(create_sql)?;
    let first_col = split_top_level_commas(body).into_iter().next()?;
    let token = first_col.trim().split_whitespace().next()?;
    Some(strip_quote_chars(token))
}

/// Returns the text strictly between the first top-level `(` and its
/// matching `)`, tracking quote state so quoted parens don't throw off
/// depth counting.
fn outer_parens_body(sql: &str) -> Option<&str> {
    let bytes = sql.as_bytes();
    let mut quote: Option<u8> = None;
    let mut depth: i32 = 0;
    let mut start: Option<usize> = None;

    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' | b'`' => quote = Some(b),
            b'(' => {
                if depth == 0 && start.is_none() {
                    start = Some(i + 1);
                }
                depth += 1;
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        return Some(&sql[s..i]);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits `s` on commas at paren-depth 0, outside quotes.
fn split_top_level_commas(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut quote: Option<u8> = None;
    let mut depth: i32 = 0;
    let mut pieces = Vec::new();
    let mut start = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' | b'`' => quote = Some(b),
            b'(' => depth += 1,
            b')' => depth -= 1,
            b',' if depth == 0 => {
                pieces.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&s[start..]);
    pieces
}

fn strip_quote_chars(s: &str) -> String {
    s.trim_matches(|c| c == '"' || c == '\'' || c == '[' || c == ']' || c == '`')
        .to_string()
}
