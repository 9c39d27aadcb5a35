//! Executes a parsed command against an open database, composing the
//! schema resolver, the CREATE-SQL column parser, and the table/index/rowid
//! walkers.

use crate::btree::table::{self, TableWalker};
use crate::btree::{index, rowid};
use crate::create_sql;
use crate::pager::{self, Pager};
use crate::record;
use crate::schema::{self, Schema};
use crate::sql_value::SqlValue;
use crate::sqlparser::{self, Command};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] sqlparser::Error),
    #[error(transparent)]
    Pager(#[from] pager::Error),
    #[error(transparent)]
    Schema(#[from] schema::Error),
    #[error(transparent)]
    TableWalk(#[from] table::Error),
    #[error(transparent)]
    IndexWalk(#[from] index::Error),
    #[error(transparent)]
    RowidLookup(#[from] rowid::Error),
    #[error(transparent)]
    Record(#[from] record::Error),
    #[error("no table named {0:?}")]
    TableNotFound(String),
    #[error("table {table:?} has no column named {column:?}")]
    ColumnNotFound { table: String, column: String },
}

/// The result of running a single command, shaped for a CLI front end to
/// print. Each variant corresponds to one of the dot-commands or SELECT
/// forms; callers are responsible for formatting.
#[derive(Debug, PartialEq)]
pub enum QueryOutput {
    DbInfo { page_size: u32, table_count: usize },
    Tables(Vec<String>),
    Count(u64),
    Rows(Vec<Vec<SqlValue>>),
}

pub fn run(pager: &Pager, input: &str) -> Result<QueryOutput, Error> {
    let command = sqlparser::parse(input)?;
    match command {
        Command::DotDbInfo => {
            let schema = Schema::load(pager)?;
            Ok(QueryOutput::DbInfo {
                page_size: pager.page_size(),
                table_count: schema.table_count(),
            })
        }
        Command::DotTables => {
            let schema = Schema::load(pager)?;
            Ok(QueryOutput::Tables(
                schema.user_table_names().into_iter().map(String::from).collect(),
            ))
        }
        Command::CountStar { table } => {
            let schema = Schema::load(pager)?;
            let desc = schema.table(&table).ok_or_else(|| Error::TableNotFound(table.clone()))?;
            let mut count: u64 = 0;
            for row in TableWalker::new(pager, desc.root_page) {
                row?;
                count += 1;
            }
            Ok(QueryOutput::Count(count))
        }
        Command::Select { columns, table, filter } => {
            let schema = Schema::load(pager)?;
            let desc = schema.table(&table).ok_or_else(|| Error::TableNotFound(table.clone()))?;
            let column_defs = create_sql::parse_columns(&desc.sql);
            let col_indices: Vec<usize> = columns
                .iter()
                .map(|c| {
                    column_defs
                        .iter()
                        .position(|cd| cd.name.eq_ignore_ascii_case(c))
                        .ok_or_else(|| Error::ColumnNotFound {
                            table: table.clone(),
                            column: c.clone(),
                        })
                })
                .collect::<Result<_, _>>()?;

            let rows = match &filter {
                Some((col, val)) => {
                    let filter_idx = column_defs
                        .iter()
                        .position(|cd| cd.name.eq_ignore_ascii_case(col))
                        .ok_or_else(|| Error::ColumnNotFound {
                            table: table.clone(),
                            column: col.clone(),
                        })?;
                    select_with_filter(pager, &schema, &table, desc.root_page, filter_idx, val)?
                }
                None => {
                    let mut out = Vec::new();
                    for row in TableWalker::new(pager, desc.root_page) {
                        let (rowid, record) = row?;
                        out.push((rowid, record.values));
                    }
                    out
                }
            };

            // A rowid-alias column's record body stores a literal NULL; its
            // logical value is the row's rowid, carried alongside the record.
            let projected = rows
                .into_iter()
                .map(|(rowid, row)| {
                    col_indices
                        .iter()
                        .map(|&i| {
                            if column_defs[i].is_rowid_alias {
                                SqlValue::Int(rowid)
                            } else {
                                row[i].clone()
                            }
                        })
                        .collect()
                })
                .collect();
            Ok(QueryOutput::Rows(projected))
        }
    }
}

/// Resolves a `WHERE col = 'val'` select, preferring an index when the
/// schema has one on `col`; otherwise falls back to a full table scan.
fn select_with_filter(
    pager: &Pager,
    schema: &Schema,
    table: &str,
    table_root: u32,
    filter_idx: usize,
    val: &str,
) -> Result<Vec<(i64, Vec<SqlValue>)>, Error> {
    let column_name_for_index = {
        let desc = schema.table(table).expect("table resolved by caller");
        create_sql::parse_columns(&desc.sql)
            .get(filter_idx)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    };

    if let Some(idx_desc) = schema.index_on_column(table, &column_name_for_index) {
        debug!(table, column = %column_name_for_index, "using index for WHERE clause");
        let probe = SqlValue::Text(val.to_string());
        let rowids = index::equality_scan(pager, idx_desc.root_page, &probe)?;
        let mut out = Vec::with_capacity(rowids.len());
        for rid in rowids {
            match rowid::lookup(pager, table_root, rid) {
                Ok(record) => out.push((rid, record.values)),
                Err(rowid::Error::RowidMissing(missing)) => {
                    warn!(table, rowid = missing, "index points to rowid missing from table, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(out)
    } else {
        debug!(table, column = %column_name_for_index, "scanning table for WHERE clause");
        let mut out = Vec::new();
        for row in TableWalker::new(pager, table_root) {
            let (rowid, record) = row?;
            let candidate = &record.values[filter_idx];
            if candidate.matches_trimmed_ci(val) {
                out.push((rowid, record.values));
            }
        }
        Ok(out)
    }
}
