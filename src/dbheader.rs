//! Reads and validates the 100-byte SQLite file header.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("file is too short to contain a SQLite header")]
    ReadFailed,
    #[error("magic string at offset 0 does not match \"SQLite format 3\\0\"")]
    WrongMagic,
    #[error("unsupported page size value {0}")]
    UnsupportedPagesize(u16),
    #[error("unsupported file format version (only legacy format 1 is supported)")]
    UnsupportedFormatVersion,
}

pub const SQLITE_DB_HEADER_BYTES: usize = 100;
const SQLITE3_MAGIC_STRING: &[u8; 16] = b"SQLite format 3\0";

/// The fields of the file header this engine actually consults. Other
/// header fields (schema cookie, text encoding, application id, ...) are
/// read by real SQLite but are not needed to serve `.dbinfo`, `.tables`, or
/// the restricted SELECT grammar, and are deliberately not validated here:
/// a strict byte-for-byte header validator would reject legitimate files
/// written by SQLite versions or tools this engine has never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbfileHeader {
    pub pagesize: u32,
    pub numpages: u32,
    pub changecnt: u32,
}

pub fn get_header_clone(f: &mut std::fs::File) -> Result<DbfileHeader, Error> {
    let mut v = vec![0u8; SQLITE_DB_HEADER_BYTES];
    f.seek(SeekFrom::Start(0)).map_err(|_| Error::ReadFailed)?;
    f.read_exact(&mut v).map_err(|_| Error::ReadFailed)?;
    let mut c = Cursor::new(v);
    get_header(&mut c)
}

pub fn get_header<R: Read + Seek>(f: &mut R) -> Result<DbfileHeader, Error> {
    f.seek(SeekFrom::Start(0)).map_err(|_| Error::ReadFailed)?;

    let mut magic = [0u8; 16];
    f.read_exact(&mut magic).map_err(|_| Error::ReadFailed)?;
    if &magic != SQLITE3_MAGIC_STRING {
        return Err(Error::WrongMagic);
    }

    let raw_pagesize = f.read_u16::<BigEndian>().map_err(|_| Error::ReadFailed)?;
    let pagesize: u32 = match raw_pagesize {
        1 => 65536,
        512 | 1024 | 2048 | 4096 | 8192 | 16384 | 32768 => raw_pagesize as u32,
        other => return Err(Error::UnsupportedPagesize(other)),
    };

    let write_version = f.read_u8().map_err(|_| Error::ReadFailed)?;
    let read_version = f.read_u8().map_err(|_| Error::ReadFailed)?;
    if write_version != 1 || read_version != 1 {
        return Err(Error::UnsupportedFormatVersion);
    }

    // Bytes 20-23: reserved-space-per-page and the three payload-fraction
    // bytes. Not validated: reserved space is honored implicitly (this
    // engine never reads past declared cell content), and the payload
    // fractions only matter to overflow handling, which is unsupported
    // regardless of their value.
    f.seek(SeekFrom::Start(24)).map_err(|_| Error::ReadFailed)?;

    let changecnt = f.read_u32::<BigEndian>().map_err(|_| Error::ReadFailed)?;
    let numpages = f.read_u32::<BigEndian>().map_err(|_| Error::ReadFailed)?;

    f.seek(SeekFrom::Start(0)).map_err(|_| Error::ReadFailed)?;
    Ok(DbfileHeader {
        pagesize,
        changecnt,
        numpages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn minimal_header(pagesize_bytes: [u8; 2]) -> Vec<u8> {
        let mut h = vec![0u8; 100];
        h[0..16].copy_from_slice(SQLITE3_MAGIC_STRING);
        h[16..18].copy_from_slice(&pagesize_bytes);
        h[18] = 1;
        h[19] = 1;
        h[28..32].copy_from_slice(&1u32.to_be_bytes()); // numpages
        h
    }

    #[test]
    fn reads_ordinary_page_size() {
        let h = minimal_header(4096u16.to_be_bytes());
        let hdr = get_header(&mut Cursor::new(h)).unwrap();
        assert_eq!(hdr.pagesize, 4096);
        assert_eq!(hdr.numpages, 1);
    }

    #[test]
    fn page_size_value_one_means_65536() {
        let h = minimal_header(1u16.to_be_bytes());
        let hdr = get_header(&mut Cursor::new(h)).unwrap();
        assert_eq!(hdr.pagesize, 65536);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut h = minimal_header(4096u16.to_be_bytes());
        h[0] = b'X';
        assert_eq!(
            get_header(&mut Cursor::new(h)).unwrap_err(),
            Error::WrongMagic
        );
    }

    #[test]
    fn rejects_unsupported_page_size() {
        let h = minimal_header(777u16.to_be_bytes());
        assert_eq!(
            get_header(&mut Cursor::new(h)).unwrap_err(),
            Error::UnsupportedPagesize(777)
        );
    }

    #[test]
    fn rejects_wal_format_version() {
        let mut h = minimal_header(4096u16.to_be_bytes());
        h[18] = 2;
        assert_eq!(
            get_header(&mut Cursor::new(h)).unwrap_err(),
            Error::UnsupportedFormatVersion
        );
    }

    #[test]
    fn short_buffer_fails_cleanly() {
        let h = vec![0u8; 10];
        assert_eq!(
            get_header(&mut Cursor::new(h)).unwrap_err(),
            Error::ReadFailed
        );
    }
}
