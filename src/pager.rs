//! Opens a database file and serves pages by number, reading each page
//! lazily on first request and caching it for the lifetime of the handle.

use crate::dbheader;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::rc::Rc;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("page number {0} is out of range (file has {1} pages)")]
    PageNumberBeyondLimits(u32, u32),
    #[error("failed to open database file: {0}")]
    Open(#[source] std::io::Error),
    #[error("failed to read page {page}: {source}")]
    Read {
        page: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid database header: {0}")]
    Header(#[from] dbheader::Error),
}

/// Lazily-loaded, read-only access to a SQLite database file's pages.
pub struct Pager {
    f: RefCell<File>,
    page_size: u32,
    num_pages: u32,
    cache: RefCell<HashMap<u32, Rc<Vec<u8>>>>,
}

impl Pager {
    pub fn open(path: &str) -> Result<Self, Error> {
        let mut f = File::open(path).map_err(Error::Open)?;
        let hdr = dbheader::get_header_clone(&mut f)?;
        Ok(Pager {
            f: RefCell::new(f),
            page_size: hdr.pagesize,
            num_pages: hdr.numpages,
            cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Returns the raw bytes of page `page_no` (1-based), reading from disk
    /// on first access and serving the cache afterward.
    pub fn get_page(&self, page_no: u32) -> Result<Rc<Vec<u8>>, Error> {
        if page_no == 0 || page_no > self.num_pages {
            return Err(Error::PageNumberBeyondLimits(page_no, self.num_pages));
        }
        if let Some(p) = self.cache.borrow().get(&page_no) {
            return Ok(Rc::clone(p));
        }
        let bytes = self.read_page_from_file(page_no)?;
        let rc = Rc::new(bytes);
        self.cache.borrow_mut().insert(page_no, Rc::clone(&rc));
        Ok(rc)
    }

    fn read_page_from_file(&self, page_no: u32) -> Result<Vec<u8>, Error> {
        let offset = (page_no as u64 - 1) * self.page_size as u64;
        let mut buf = vec![0u8; self.page_size as usize];
        let mut f = self.f.borrow_mut();
        f.seek(SeekFrom::Start(offset))
            .map_err(|source| Error::Read { page: page_no, source })?;
        f.read_exact(&mut buf)
            .map_err(|source| Error::Read { page: page_no, source })?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_minimal_db(path: &std::path::Path, page_size: u16, num_pages: u32) {
        let mut header = vec![0u8; 100];
        header[0..16].copy_from_slice(b"SQLite format 3\0");
        header[16..18].copy_from_slice(&page_size.to_be_bytes());
        header[18] = 1;
        header[19] = 1;
        header[28..32].copy_from_slice(&num_pages.to_be_bytes());

        let mut data = header;
        data.resize(page_size as usize * num_pages as usize, 0);
        // Mark page 2's first byte so the test can tell pages apart.
        if num_pages >= 2 {
            data[page_size as usize] = 0xAB;
        }
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(&data).unwrap();
    }

    #[test]
    fn opens_and_reports_page_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        write_minimal_db(&path, 512, 2);
        let pager = Pager::open(path.to_str().unwrap()).unwrap();
        assert_eq!(pager.page_size(), 512);
        assert_eq!(pager.num_pages(), 2);
    }

    #[test]
    fn reads_distinct_pages_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        write_minimal_db(&path, 512, 2);
        let pager = Pager::open(path.to_str().unwrap()).unwrap();

        let page1 = pager.get_page(1).unwrap();
        assert_eq!(page1.len(), 512);
        assert_eq!(&page1[0..16], b"SQLite format 3\0");

        let page2 = pager.get_page(2).unwrap();
        assert_eq!(page2[0], 0xAB);

        // Same Rc-backed buffer on repeat access.
        let page2_again = pager.get_page(2).unwrap();
        assert!(Rc::ptr_eq(&page2, &page2_again));
    }

    #[test]
    fn out_of_range_page_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        write_minimal_db(&path, 512, 1);
        let pager = Pager::open(path.to_str().unwrap()).unwrap();
        assert!(pager.get_page(0).is_err());
        assert!(pager.get_page(99).is_err());
    }

    #[test]
    fn open_missing_file_errors() {
        assert!(Pager::open("/nonexistent/path/to/db").is_err());
    }
}
