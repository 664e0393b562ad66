//! Filtered song list query construction.
//!
//! [`build_list_query`] turns a [`SongFilter`] and a [`Page`] into SQL text
//! plus positional parameters. Filter values never appear in the SQL text;
//! each present filter adds one `$n` placeholder.
//!
//! ```text
//! SELECT "group", song, releasedate, <verses> AS text, link FROM songs
//!  WHERE "group" = $1 AND strpos(array_to_string(text, ''), $2) > 0
//!  ORDER BY "group", song OFFSET $3 LIMIT $4
//! ```

use crate::models::{Page, SongFilter};
use std::fmt::Write as _;
use tokio_postgres::types::ToSql;

/// Column list shared by every song read.
///
/// The verse array is flattened and re-split so nested or NULL arrays come
/// back as a flat `TEXT[]`.
pub const SONG_COLUMNS: &str = concat!(
    r#""group", song, releasedate, "#,
    r"COALESCE(string_to_array(array_to_string(text, E'\n\n'), E'\n\n'), ",
    "ARRAY[]::TEXT[]) AS text, ",
    "link",
);

/// A positional query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// `TEXT` parameter.
    Text(String),
    /// `BIGINT` parameter.
    BigInt(i64),
}

impl SqlValue {
    /// Returns the value as a driver parameter.
    #[must_use]
    pub fn as_param(&self) -> &(dyn ToSql + Sync) {
        match self {
            Self::Text(v) => v,
            Self::BigInt(v) => v,
        }
    }
}

/// SQL text with its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongQuery {
    /// Statement text.
    pub sql: String,
    /// Values for `$1..$n`.
    pub params: Vec<SqlValue>,
}

impl SongQuery {
    /// Returns the parameters in the form `tokio_postgres` expects.
    #[must_use]
    pub fn param_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(SqlValue::as_param).collect()
    }

    fn bind(&mut self, value: SqlValue) -> usize {
        self.params.push(value);
        self.params.len()
    }

    fn push_predicate(&mut self, predicate: impl FnOnce(usize) -> String, value: String) {
        let keyword = if self.params.is_empty() { "WHERE" } else { "AND" };
        let index = self.bind(SqlValue::Text(value));
        let _ = write!(self.sql, " {keyword} {}", predicate(index));
    }
}

/// Builds the filtered, paginated list query over `table`.
///
/// `table` must already be a validated identifier
/// (see [`crate::config::is_valid_table_name`]).
#[must_use]
pub fn build_list_query(table: &str, filter: &SongFilter, page: Page) -> SongQuery {
    let mut query = SongQuery {
        sql: format!("SELECT {SONG_COLUMNS} FROM {table}"),
        params: Vec::with_capacity(7),
    };

    let equality = [
        (r#""group""#, &filter.group),
        ("song", &filter.song),
        ("releasedate", &filter.release_date),
    ];
    for (column, value) in equality {
        if let Some(value) = value {
            query.push_predicate(|n| format!("{column} = ${n}"), value.clone());
        }
    }
    if let Some(text) = &filter.text {
        // Verses are joined without a separator, so a needle may run from the
        // end of one verse into the next.
        query.push_predicate(
            |n| format!("strpos(array_to_string(text, ''), ${n}) > 0"),
            text.clone(),
        );
    }
    if let Some(link) = &filter.link {
        query.push_predicate(|n| format!("link = ${n}"), link.clone());
    }

    let offset = query.bind(SqlValue::BigInt(i64::from(page.offset)));
    let limit = query.bind(SqlValue::BigInt(i64::from(page.limit)));
    let _ = write!(
        query.sql,
        r#" ORDER BY "group", song OFFSET ${offset} LIMIT ${limit}"#
    );

    query
}
