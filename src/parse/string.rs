//! Fixed-width narrow/wide string writers.
//!
//! `write_narrow` copies up to `elsize` code points, one byte per code point
//! (any code point above 255 is a conversion error); `write_wide` copies up
//! to `elsize / 4` code points as 32-bit units with optional byte-order
//! swap. A field longer than the cell is silently truncated on this direct
//! path — only a converter-produced overlong value is an error (see
//! `reader::coerce_generic_into_cell`'s `OverlongString`). Both write
//! directly into an existing destination slice rather than allocating a
//! fresh buffer.

use crate::error::{ElementDescr, ReaderError};
use crate::schema::ByteOrder;

/// Copy up to `elsize` code points into `dst[..elsize]` as single bytes,
/// truncating a longer field. Any code point > 255 is a conversion error.
/// Short fields are NUL-padded.
///
/// `dst` must be exactly `elsize` bytes; `(row, col)` are only used to shape
/// the error.
pub fn write_narrow(
    text: &[u32],
    dst: &mut [u8],
    elsize: usize,
    row: usize,
    col: usize,
) -> Result<(), ReaderError> {
    debug_assert_eq!(dst.len(), elsize);
    let n = text.len().min(elsize);
    for (i, &cp) in text[..n].iter().enumerate() {
        if cp > 255 {
            return Err(ReaderError::BadField {
                row,
                col,
                descr: ElementDescr::NarrowString { elsize },
                text: codepoints_to_string(text),
            });
        }
        dst[i] = cp as u8;
    }
    for b in &mut dst[n..] {
        *b = 0;
    }
    Ok(())
}

/// Copy up to `elsize / 4` code points into `dst` as 32-bit units (native
/// byte order unless `byte_order` requests a swap), truncating a longer
/// field. Short fields are zero-padded.
pub fn write_wide(
    text: &[u32],
    dst: &mut [u8],
    elsize: usize,
    byte_order: ByteOrder,
    _row: usize,
    _col: usize,
) -> Result<(), ReaderError> {
    debug_assert_eq!(dst.len(), elsize);
    let units = elsize / 4;
    let n = text.len().min(units);
    for (i, &cp) in text[..n].iter().enumerate() {
        let bytes = if byte_order.is_native() {
            cp.to_ne_bytes()
        } else {
            cp.to_be_bytes() // swap is simply "not native" on a little-endian host and vice versa
        };
        dst[i * 4..i * 4 + 4].copy_from_slice(&bytes);
    }
    for b in &mut dst[n * 4..] {
        *b = 0;
    }
    Ok(())
}

fn codepoints_to_string(text: &[u32]) -> String {
    text.iter().filter_map(|&c| char::from_u32(c)).collect()
}
