//! Decodes SQLite records: a header of serial-type varints followed by a
//! body of values in the same order.

use crate::serial_type;
use crate::sql_value::SqlValue;
use crate::varint;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed record header: {0}")]
    Varint(#[from] varint::Error),
    #[error("malformed record value: {0}")]
    SerialType(#[from] serial_type::Error),
    #[error("record header claims {claimed} bytes but {consumed} were consumed")]
    HeaderLengthMismatch { claimed: usize, consumed: usize },
    #[error("record body truncated: need {need} bytes at offset {off}, have {have}")]
    BodyTruncated { off: usize, need: usize, have: usize },
}

/// A fully decoded record: an ordered list of typed values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub values: Vec<SqlValue>,
}

/// Parses a record starting at `data[0]` (the header-size varint). Does not
/// assume anything about what precedes `data` in the enclosing cell; callers
/// slice the payload out first.
pub fn parse(data: &[u8]) -> Result<Record, Error> {
    let (hdr_len, hdr_len_size) = varint::read_varint(data, 0)?;
    let hdr_len = hdr_len as usize;

    let mut serial_types = Vec::new();
    let mut off = hdr_len_size;
    while off < hdr_len {
        let (serial_type, n) = varint::read_varint(data, off)?;
        serial_types.push(serial_type as i64);
        off += n;
    }
    if off != hdr_len {
        return Err(Error::HeaderLengthMismatch {
            claimed: hdr_len,
            consumed: off,
        });
    }

    let mut values = Vec::with_capacity(serial_types.len());
    let mut body_off = hdr_len;
    for st in serial_types {
        let need = serial_type::body_len(st);
        let body = data.get(body_off..body_off + need).ok_or(Error::BodyTruncated {
            off: body_off,
            need,
            have: data.len().saturating_sub(body_off),
        })?;
        values.push(serial_type::decode(st, body)?);
        body_off += need;
    }

    Ok(Record { values })
}

/// Decodes a table-leaf cell: payload-size varint, rowid varint, record.
/// Returns the rowid and the decoded record.
pub fn decode_table_leaf_cell(bytes: &[u8]) -> Result<(i64, Record), Error> {
    let (_payload_len, n1) = varint::read_varint(bytes, 0)?;
    let (rowid, n2) = varint::read_varint(bytes, n1)?;
    let record = parse(&bytes[n1 + n2..])?;
    Ok((rowid as i64, record))
}

/// Decodes an index cell (leaf or interior's own payload): payload-size
/// varint, record. The record's final value is semantically the rowid.
pub fn decode_index_cell(bytes: &[u8]) -> Result<Record, Error> {
    let (_payload_len, n1) = varint::read_varint(bytes, 0)?;
    parse(&bytes[n1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    // header-size=6, serial types [8,9,7,13(odd->text len0? actually 0x13=19 -> (19-13)/2=3 "Ten")]
    // matches the documented fixture: literal-0, literal-1, float 3.1415, TEXT "Ten"
    const FIXTURE: &[u8] = &[
        0x06, 0x08, 0x09, 0x07, 0x13, 0x40, 0x09, 0x21, 0xca, 0xc0, 0x83, 0x12, 0x6f, 0x54, 0x65,
        0x6e,
    ];

    #[test]
    fn parses_mixed_record_fixture() {
        let rec = parse(FIXTURE).unwrap();
        assert_eq!(rec.values.len(), 4);
        assert_eq!(rec.values[0], SqlValue::Int(0));
        assert_eq!(rec.values[1], SqlValue::Int(1));
        match &rec.values[2] {
            SqlValue::Real(r) => assert!((r - 3.1415).abs() < 1e-9),
            other => panic!("expected Real, got {:?}", other),
        }
        assert_eq!(rec.values[3], SqlValue::Text("Ten".to_string()));
    }

    #[test]
    fn header_size_itself_multi_byte() {
        // header-size varint of 0x81 0x02 = 130; 128 one-byte serial types of
        // value 0 (NULL) pad the header to exactly 130 bytes (2 + 128).
        let mut data = vec![0x81u8, 0x02];
        data.extend(std::iter::repeat(0u8).take(128));
        let rec = parse(&data).unwrap();
        assert_eq!(rec.values.len(), 128);
        assert!(rec.values.iter().all(|v| *v == SqlValue::Null()));
    }

    #[test]
    fn empty_record_has_header_size_one() {
        let rec = parse(&[0x01]).unwrap();
        assert!(rec.values.is_empty());
    }

    #[test]
    fn table_leaf_cell_round_trip() {
        // payload-size=16 (irrelevant to decoding), rowid=42, then FIXTURE.
        let mut cell = vec![16u8, 42u8];
        cell.extend_from_slice(FIXTURE);
        let (rowid, rec) = decode_table_leaf_cell(&cell).unwrap();
        assert_eq!(rowid, 42);
        assert_eq!(rec.values.len(), 4);
    }

    #[test]
    fn header_length_mismatch_errors() {
        // Declares header-size 3 but only fits a single one-byte varint.
        let data = [0x03u8, 0x00];
        assert!(parse(&data).is_err());
    }
}
