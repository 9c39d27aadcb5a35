//! Equality-probe traversal of an index B-tree: recurses into every child
//! rather than descending on key order (see the design note in the
//! component spec for this walker).

use super::{Error as BtreeError, Page, PageType};
use crate::pager::Pager;
use crate::record::{self};
use crate::sql_value::SqlValue;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Btree(#[from] BtreeError),
    #[error(transparent)]
    Pager(#[from] crate::pager::Error),
    #[error(transparent)]
    Record(#[from] record::Error),
}

/// Compares a decoded index key against the probe value using the spec's
/// rule: trimmed case-insensitive compare when both are TEXT, else exact
/// bitwise equality.
fn keys_equal(key: &SqlValue, probe: &SqlValue) -> bool {
    match (key, probe) {
        (SqlValue::Text(_), SqlValue::Text(p)) => key.matches_trimmed_ci(p),
        _ => key == probe,
    }
}

/// Visits every leaf cell reachable from `root_page`, emitting the trailing
/// rowid of any whose first key equals `probe`.
pub fn equality_scan(pager: &Pager, root_page: u32, probe: &SqlValue) -> Result<Vec<i64>, Error> {
    let mut out = Vec::new();
    visit(pager, root_page, probe, &mut out)?;
    Ok(out)
}

fn visit(pager: &Pager, page_no: u32, probe: &SqlValue, out: &mut Vec<i64>) -> Result<(), Error> {
    let bytes = pager.get_page(page_no)?;
    let page = Page::parse(&bytes, page_no)?;
    match page.page_type {
        PageType::IndexLeaf => {
            for idx in 0..page.cell_pointers.len() {
                let record = record::decode_index_cell(page.cell_bytes(idx))?;
                visit_cell_record(&record, probe, out);
            }
            Ok(())
        }
        PageType::IndexInterior => {
            for idx in 0..page.cell_pointers.len() {
                let cell = page.cell_bytes(idx);
                let left_child = byteorder::BigEndian::read_u32(&cell[0..4]);
                visit(pager, left_child, probe, out)?;
                // The record embedded in an interior index cell is itself a
                // key+rowid and participates in the equality probe exactly
                // like a leaf cell's.
                let record = record::decode_index_cell(&cell[4..])?;
                visit_cell_record(&record, probe, out);
            }
            let rightmost = page.rightmost_child.expect("index interior has rightmost");
            visit(pager, rightmost, probe, out)
        }
        other => Err(BtreeError::UnexpectedPageType {
            page_no,
            byte: page_type_byte(other),
        }
        .into()),
    }
}

fn visit_cell_record(record: &crate::record::Record, probe: &SqlValue, out: &mut Vec<i64>) {
    if record.values.is_empty() {
        return;
    }
    let key = &record.values[0];
    if keys_equal(key, probe) {
        if let Some(SqlValue::Int(rowid)) = record.values.last() {
            out.push(*rowid);
        }
    }
}

fn page_type_byte(t: PageType) -> u8 {
    match t {
        PageType::IndexInterior => 2,
        PageType::TableInterior => 5,
        PageType::IndexLeaf => 10,
        PageType::TableLeaf => 13,
    }
}
