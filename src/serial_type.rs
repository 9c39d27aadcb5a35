//! Decodes a single record value given its serial-type code and a byte
//! cursor positioned at the start of its body bytes.

use crate::sql_value::SqlValue;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("reserved serial type code {0}")]
    ReservedSerialType(i64),
    #[error("negative serial type code {0}")]
    NegativeSerialType(i64),
    #[error("value body truncated: serial type {serial_type} needs {need} bytes, have {have}")]
    Truncated {
        serial_type: i64,
        need: usize,
        have: usize,
    },
    #[error("invalid utf-8 in TEXT value")]
    InvalidUtf8,
}

/// Number of body bytes a serial type occupies, per the table in the spec's
/// data model section. Does not itself validate 10/11 (reserved) or
/// negative codes; callers should check those first.
pub fn body_len(serial_type: i64) -> usize {
    match serial_type {
        0 | 8 | 9 => 0,
        1 => 1,
        2 => 2,
        3 => 3,
        4 => 4,
        5 => 6,
        6 => 8,
        7 => 8,
        n if n >= 12 => ((n - 12) / 2) as usize,
        _ => 0,
    }
}

/// Decodes one value from `data` given its serial type. `data` must be at
/// least `body_len(serial_type)` bytes long.
pub fn decode(serial_type: i64, data: &[u8]) -> Result<SqlValue, Error> {
    if serial_type < 0 {
        return Err(Error::NegativeSerialType(serial_type));
    }
    if serial_type == 10 || serial_type == 11 {
        return Err(Error::ReservedSerialType(serial_type));
    }

    let need = body_len(serial_type);
    if data.len() < need {
        return Err(Error::Truncated {
            serial_type,
            need,
            have: data.len(),
        });
    }

    Ok(match serial_type {
        0 => SqlValue::Null(),
        1 => SqlValue::Int(data[0] as i8 as i64),
        2 => SqlValue::Int(i16::from_be_bytes([data[0], data[1]]) as i64),
        3 => SqlValue::Int(sign_extend_be(&data[0..3])),
        4 => SqlValue::Int(i32::from_be_bytes([data[0], data[1], data[2], data[3]]) as i64),
        5 => SqlValue::Int(sign_extend_be(&data[0..6])),
        6 => SqlValue::Int(i64::from_be_bytes([
            data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
        ])),
        7 => SqlValue::Real(f64::from_bits(u64::from_be_bytes([
            data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
        ]))),
        8 => SqlValue::Int(0),
        9 => SqlValue::Int(1),
        n if n >= 12 && n % 2 == 0 => SqlValue::Blob(data[..need].to_vec()),
        n if n >= 13 => {
            let s = std::str::from_utf8(&data[..need]).map_err(|_| Error::InvalidUtf8)?;
            SqlValue::Text(s.to_string())
        }
        _ => unreachable!("all serial_type branches covered above"),
    })
}

/// Sign-extends a big-endian two's-complement integer of 1..8 bytes into i64.
fn sign_extend_be(bytes: &[u8]) -> i64 {
    let negative = bytes[0] & 0x80 != 0;
    let mut buf = if negative { [0xffu8; 8] } else { [0u8; 8] };
    buf[8 - bytes.len()..].copy_from_slice(bytes);
    i64::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_null_and_literals() {
        assert_eq!(decode(0, &[]).unwrap(), SqlValue::Null());
        assert_eq!(decode(8, &[]).unwrap(), SqlValue::Int(0));
        assert_eq!(decode(9, &[]).unwrap(), SqlValue::Int(1));
    }

    #[test]
    fn decodes_signed_integers_of_every_width() {
        assert_eq!(decode(1, &[0xff]).unwrap(), SqlValue::Int(-1));
        assert_eq!(decode(2, &[0xff, 0xfe]).unwrap(), SqlValue::Int(-2));
        assert_eq!(decode(3, &[0xff, 0xff, 0xfd]).unwrap(), SqlValue::Int(-3));
        assert_eq!(
            decode(4, &[0xff, 0xff, 0xff, 0xfc]).unwrap(),
            SqlValue::Int(-4)
        );
        assert_eq!(
            decode(5, &[0xff, 0xff, 0xff, 0xff, 0xff, 0xfb]).unwrap(),
            SqlValue::Int(-5)
        );
        assert_eq!(
            decode(6, &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfa]).unwrap(),
            SqlValue::Int(-6)
        );
    }

    #[test]
    fn decodes_six_byte_integer_positive_and_sign_extends() {
        assert_eq!(
            decode(5, &[0x00, 0x00, 0x00, 0x00, 0x01, 0x00]).unwrap(),
            SqlValue::Int(256)
        );
        // high bit of the first byte set => negative, sign-extended through
        // the top two bytes of the i64.
        assert_eq!(
            decode(5, &[0x80, 0x00, 0x00, 0x00, 0x00, 0x00]).unwrap(),
            SqlValue::Int(-140737488355328)
        );
    }

    #[test]
    fn decodes_float() {
        // 3.1415 encoded big-endian, matching the record-format fixture used
        // throughout the test suite.
        let bytes = [0x40, 0x09, 0x21, 0xca, 0xc0, 0x83, 0x12, 0x6f];
        match decode(7, &bytes).unwrap() {
            SqlValue::Real(r) => assert!((r - 3.1415).abs() < 1e-9),
            other => panic!("expected Real, got {:?}", other),
        }
    }

    #[test]
    fn decodes_text_and_blob() {
        assert_eq!(
            decode(13 + 3 * 2, b"Ten").unwrap(),
            SqlValue::Text("Ten".to_string())
        );
        assert_eq!(
            decode(12 + 2 * 2, &[0xde, 0xad, 0xbe, 0xef]).unwrap(),
            SqlValue::Blob(vec![0xde, 0xad, 0xbe, 0xef])
        );
    }

    #[test]
    fn rejects_reserved_types() {
        assert_eq!(decode(10, &[]).unwrap_err(), Error::ReservedSerialType(10));
        assert_eq!(decode(11, &[]).unwrap_err(), Error::ReservedSerialType(11));
    }

    #[test]
    fn rejects_negative_type() {
        assert_eq!(decode(-1, &[]).unwrap_err(), Error::NegativeSerialType(-1));
    }

    #[test]
    fn rejects_truncated_body() {
        let err = decode(4, &[0x00, 0x01]).unwrap_err();
        assert_eq!(
            err,
            Error::Truncated {
                serial_type: 4,
                need: 4,
                have: 2
            }
        );
    }
}
