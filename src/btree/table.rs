//! Depth-first, rowid-ascending walk of a table B-tree, using an explicit
//! stack so traversal depth does not grow the native call stack.

use super::{btree_header_offset, Error as BtreeError, Page, PageType, RowId};
use crate::pager::Pager;
use crate::record::{self, Record};
use byteorder::{BigEndian, ByteOrder};
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

enum Frame {
    Leaf {
        page_no: u32,
        next_idx: usize,
        num_cells: usize,
    },
    Interior {
        page_no: u32,
        next_idx: usize,
        num_cells: usize,
        rightmost: u32,
        done_rightmost: bool,
    },
}

/// Iterates `(rowid, record)` pairs across an entire table B-tree in
/// ascending rowid order. Equivalent to a pre-order depth-first traversal:
/// each interior cell's left child is visited before the next cell, and the
/// right-most child is visited last.
pub struct TableWalker<'p> {
    pager: &'p Pager,
    stack: Vec<Frame>,
    started: bool,
    root_page: u32,
}

impl<'p> TableWalker<'p> {
    pub fn new(pager: &'p Pager, root_page: u32) -> TableWalker<'p> {
        TableWalker {
            pager,
            stack: Vec::new(),
            started: false,
            root_page,
        }
    }

    /// Descends from `page_no` through left children, pushing an
    /// `Interior` frame for each interior page visited, until a leaf frame
    /// is on top of the stack.
    fn descend_to_leaf(&mut self, mut page_no: u32) -> Result<(), Error> {
        loop {
            let bytes = self.pager.get_page(page_no)?;
            let page = Page::parse(&bytes, page_no)?;
            match page.page_type {
                PageType::TableLeaf => {
                    self.stack.push(Frame::Leaf {
                        page_no,
                        next_idx: 0,
                        num_cells: page.cell_pointers.len(),
                    });
                    return Ok(());
                }
                PageType::TableInterior => {
                    let rightmost = page.rightmost_child.expect("interior page has rightmost");
                    let num_cells = page.cell_pointers.len();
                    if num_cells == 0 {
                        self.stack.push(Frame::Interior {
                            page_no,
                            next_idx: 0,
                            num_cells: 0,
                            rightmost,
                            done_rightmost: true,
                        });
                        page_no = rightmost;
                        continue;
                    }
                    let first_child = left_child_of_cell(&page, 0);
                    self.stack.push(Frame::Interior {
                        page_no,
                        next_idx: 1,
                        num_cells,
                        rightmost,
                        done_rightmost: false,
                    });
                    page_no = first_child;
                }
                PageType::IndexLeaf | PageType::IndexInterior => {
                    return Err(BtreeError::UnexpectedPageType {
                        page_no,
                        byte: page_type_byte(page.page_type),
                    }
                    .into())
                }
            }
        }
    }

    fn next_inner(&mut self) -> Option<Result<(RowId, Record), Error>> {
        loop {
            let frame = self.stack.last_mut()?;
            match frame {
                Frame::Leaf {
                    page_no,
                    next_idx,
                    num_cells,
                } => {
                    if *next_idx >= *num_cells {
                        self.stack.pop();
                        continue;
                    }
                    let page_no = *page_no;
                    let idx = *next_idx;
                    *next_idx += 1;
                    let bytes = match self.pager.get_page(page_no) {
                        Ok(b) => b,
                        Err(e) => return Some(Err(e.into())),
                    };
                    let page = match Page::parse(&bytes, page_no) {
                        Ok(p) => p,
                        Err(e) => return Some(Err(e.into())),
                    };
                    let cell = page.cell_bytes(idx);
                    return Some(record::decode_table_leaf_cell(cell).map_err(Error::from));
                }
                Frame::Interior {
                    page_no,
                    next_idx,
                    num_cells,
                    rightmost,
                    done_rightmost,
                } => {
                    if *next_idx < *num_cells {
                        let page_no = *page_no;
                        let idx = *next_idx;
                        *next_idx += 1;
                        let bytes = match self.pager.get_page(page_no) {
                            Ok(b) => b,
                            Err(e) => return Some(Err(e.into())),
                        };
                        let page = match Page::parse(&bytes, page_no) {
                            Ok(p) => p,
                            Err(e) => return Some(Err(e.into())),
                        };
                        let child = left_child_of_cell(&page, idx);
                        if let Err(e) = self.descend_to_leaf(child) {
                            return Some(Err(e));
                        }
                        continue;
                    }
                    if !*done_rightmost {
                        *done_rightmost = true;
                        let rm = *rightmost;
                        if let Err(e) = self.descend_to_leaf(rm) {
                            return Some(Err(e));
                        }
                        continue;
                    }
                    self.stack.pop();
                }
            }
        }
    }
}

impl<'p> Iterator for TableWalker<'p> {
    type Item = Result<(RowId, Record), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            if let Err(e) = self.descend_to_leaf(self.root_page) {
                return Some(Err(e));
            }
        }
        self.next_inner()
    }
}

fn left_child_of_cell(page: &Page, idx: usize) -> u32 {
    let cell = page.cell_bytes(idx);
    BigEndian::read_u32(&cell[0..4])
}

fn page_type_byte(t: PageType) -> u8 {
    match t {
        PageType::IndexInterior => 2,
        PageType::TableInterior => 5,
        PageType::IndexLeaf => 10,
        PageType::TableLeaf => 13,
    }
}

/// Re-exposed for callers that need to locate a page's own B-tree header,
/// e.g. when constructing test fixtures for page 1.
pub fn btree_start_offset(page_no: u32) -> usize {
    btree_header_offset(page_no)
}
