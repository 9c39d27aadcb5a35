//! SQLite variable-length integer decoding.
//!
//! Varints are big-endian, 1 to 9 bytes. Each of the first 8 bytes
//! contributes its low 7 bits, with the high bit signalling whether another
//! byte follows; a 9th byte, if reached, contributes all 8 bits.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("varint truncated: need at least {need} bytes at offset {off}, slice has {have}")]
    Truncated {
        off: usize,
        need: usize,
        have: usize,
    },
}

/// Reads a varint starting at `off` in `bytes`. Returns the decoded value
/// and the number of bytes consumed (1..9).
pub fn read_varint(bytes: &[u8], off: usize) -> Result<(u64, usize), Error> {
    let slice = bytes.get(off..).ok_or(Error::Truncated {
        off,
        need: 1,
        have: 0,
    })?;

    // Probe how many bytes this varint actually needs before handing it to
    // the external decoder, which does not itself report truncation.
    let mut needed = 1;
    for (i, b) in slice.iter().enumerate().take(9) {
        needed = i + 1;
        if b & 0x80 == 0 || i == 8 {
            break;
        }
    }
    if slice.len() < needed {
        return Err(Error::Truncated {
            off,
            need: needed,
            have: slice.len(),
        });
    }

    let (value, consumed) = sqlite_varint::read_varint(&slice[..needed]);
    Ok((value, consumed))
}
