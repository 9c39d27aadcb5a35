//! Resolves `sqlite_schema` (rooted at page 1) into per-object descriptors:
//! table and index definitions, looked up by name.

use crate::btree::table::{self, TableWalker};
use crate::pager::Pager;
use crate::sql_value::SqlValue;
use thiserror::Error;

pub const SCHEMA_BTREE_ROOT_PAGENUM: u32 = 1;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Walk(#[from] table::Error),
    #[error("schema row for {0:?} did not have the expected 5 columns")]
    MalformedSchemaRow(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Table,
    Index,
    Other(String),
}

#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    pub kind: ObjectKind,
    pub name: String,
    pub tbl_name: String,
    pub root_page: u32,
    pub sql: String,
}

/// All objects declared in `sqlite_schema`, in the order page 1's table
/// B-tree yields them (rowid-ascending).
pub struct Schema {
    pub objects: Vec<SchemaDescriptor>,
}

impl Schema {
    pub fn load(pager: &Pager) -> Result<Schema, Error> {
        let mut objects = Vec::new();
        for row in TableWalker::new(pager, SCHEMA_BTREE_ROOT_PAGENUM) {
            let (_rowid, record) = row?;
            if record.values.len() < 5 {
                return Err(Error::MalformedSchemaRow(format!("{:?}", record.values)));
            }
            let kind = match &record.values[0] {
                SqlValue::Text(s) if s.eq_ignore_ascii_case("table") => ObjectKind::Table,
                SqlValue::Text(s) if s.eq_ignore_ascii_case("index") => ObjectKind::Index,
                SqlValue::Text(s) => ObjectKind::Other(s.clone()),
                other => ObjectKind::Other(format!("{}", other)),
            };
            let name = text_or_empty(&record.values[1]);
            let tbl_name = text_or_empty(&record.values[2]);
            let root_page = match &record.values[3] {
                SqlValue::Int(n) => *n as u32,
                _ => 0,
            };
            let sql = text_or_empty(&record.values[4]);
            objects.push(SchemaDescriptor {
                kind,
                name,
                tbl_name,
                root_page,
                sql,
            });
        }
        Ok(Schema { objects })
    }

    /// Finds a table descriptor by name, case-insensitively.
    pub fn table(&self, name: &str) -> Option<&SchemaDescriptor> {
        self.objects
            .iter()
            .find(|o| o.kind == ObjectKind::Table && o.name.eq_ignore_ascii_case(name))
    }

    /// Names of every user table (kind == table), excluding `sqlite_sequence`
    /// and any name beginning with `sqlite_`, in discovery order.
    pub fn user_table_names(&self) -> Vec<&str> {
        self.objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Table)
            .map(|o| o.name.as_str())
            .filter(|n| !n.eq_ignore_ascii_case("sqlite_sequence"))
            .filter(|n| !n.to_ascii_lowercase().starts_with("sqlite_"))
            .collect()
    }

    pub fn table_count(&self) -> usize {
        self.objects.iter().filter(|o| o.kind == ObjectKind::Table).count()
    }

    /// Finds any index associated with `table_name` whose CREATE SQL
    /// references `column_name` as its (single) indexed column.
    pub fn index_on_column(&self, table_name: &str, column_name: &str) -> Option<&SchemaDescriptor> {
        self.objects.iter().find(|o| {
            o.kind == ObjectKind::Index
                && o.tbl_name.eq_ignore_ascii_case(table_name)
                && crate::create_sql::index_column_name(&o.sql)
                    .map(|c| c.eq_ignore_ascii_case(column_name))
                    .unwrap_or(false)
        })
    }
}

fn text_or_empty(v: &SqlValue) -> String {
    match v {
        SqlValue::Text(s) => s.clone(),
        other => format!("{}", other),
    }
}
