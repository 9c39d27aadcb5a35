//! Point lookup of a single row by rowid, descending a table B-tree using
//! interior cells' rowid keys in O(height) page loads.

use super::{Error as BtreeError, Page, PageType, RowId};
use crate::pager::Pager;
use crate::record::{self, Record};
use crate::varint;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Btree(#[from] BtreeError),
    #[error(transparent)]
    Pager(#[from] crate::pager::Error),
    #[error(transparent)]
    Record(#[from] record::Error),
    #[error(transparent)]
    Varint(#[from] varint::Error),
    #[error("rowid {0} not found in table")]
    RowidMissing(RowId),
}

/// Looks up the record for `target` rowid, starting from `root_page`.
pub fn lookup(pager: &Pager, root_page: u32, target: RowId) -> Result<Record, Error> {
    let bytes = pager.get_page(root_page)?;
    let page = Page::parse(&bytes, root_page)?;
    match page.page_type {
        PageType::TableLeaf => {
            for idx in 0..page.cell_pointers.len() {
                let (rowid, record) = record::decode_table_leaf_cell(page.cell_bytes(idx))?;
                if rowid == target {
                    return Ok(record);
                }
            }
            Err(Error::RowidMissing(target))
        }
        PageType::TableInterior => {
            for idx in 0..page.cell_pointers.len() {
                let cell = page.cell_bytes(idx);
                let left_child = byteorder::BigEndian::read_u32(&cell[0..4]);
                let (key_rowid, _) = varint::read_varint(cell, 4)?;
                if target <= key_rowid as i64 {
                    return lookup(pager, left_child, target);
                }
            }
            let rightmost = page.rightmost_child.expect("table interior has rightmost");
            lookup(pager, rightmost, target)
        }
        other => Err(BtreeError::UnexpectedPageType {
            page_no: root_page,
            byte: page_type_byte(other),
        }
        .into()),
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
