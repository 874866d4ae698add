use super::Encoding;
use crate::error::IoError;
use crate::math::{OFF, ON};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

/// Header width announcing that every row carries its own `u32` width prefix.
const RAGGED_WIDTH: u32 = 0;

/// Reads a binary array: `u32 LE` row count, `u32 LE` row width, then the rows.
///
/// Float rows are `width` little-endian `f64`; sign rows are `width` bits packed
/// most-significant-bit first and padded to a whole byte. A header width of zero means each
/// row is preceded by its own `u32 LE` width.
///
/// # Returns
///
/// - `Ok(None)` - The input is empty or declares zero rows
/// - `Ok(Some(rows))` - The decoded rows
/// - `Err(IoError::MalformedData)` - If the header or a row is truncated
pub fn read_binary<R: Read>(
    mut reader: R,
    encoding: Encoding,
) -> Result<Option<Vec<Vec<f64>>>, IoError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.is_empty() {
        return Ok(None);
    }

    let mut cursor = Cursor::new(bytes.as_slice());
    let rows = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| IoError::MalformedData("truncated header: missing row count".to_string()))?
        as usize;
    let width = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| IoError::MalformedData("truncated header: missing row width".to_string()))?;
    if rows == 0 {
        return Ok(None);
    }

    let mut data = Vec::with_capacity(rows.min(bytes.len()));
    for row in 0..rows {
        let row_width = if width == RAGGED_WIDTH {
            cursor.read_u32::<LittleEndian>().map_err(|_| {
                IoError::MalformedData(format!("row {} is truncated: missing its width", row))
            })? as usize
        } else {
            width as usize
        };

        let values = match encoding {
            Encoding::Float => read_float_row(&mut cursor, row, row_width)?,
            Encoding::Sign => read_sign_row(&mut cursor, row, row_width)?,
        };
        data.push(values);
    }
    Ok(Some(data))
}

/// Fails with a row-naming error unless `len` more bytes follow the cursor.
fn ensure_remaining(
    cursor: &Cursor<&[u8]>,
    row: usize,
    width: usize,
    len: Option<usize>,
) -> Result<(), IoError> {
    let remaining = (cursor.get_ref().len() as u64).saturating_sub(cursor.position());
    match len {
        Some(len) if len as u64 <= remaining => Ok(()),
        _ => Err(IoError::MalformedData(format!(
            "row {} is truncated: width {} needs more than the {} bytes left",
            row, width, remaining
        ))),
    }
}

fn read_float_row(
    cursor: &mut Cursor<&[u8]>,
    row: usize,
    width: usize,
) -> Result<Vec<f64>, IoError> {
    ensure_remaining(cursor, row, width, width.checked_mul(8))?;
    let mut values = vec![0.0; width];
    cursor.read_f64_into::<LittleEndian>(&mut values).map_err(|_| {
        IoError::MalformedData(format!(
            "row {} is truncated: expected {} float values",
            row, width
        ))
    })?;
    Ok(values)
}

fn read_sign_row(
    cursor: &mut Cursor<&[u8]>,
    row: usize,
    width: usize,
) -> Result<Vec<f64>, IoError> {
    ensure_remaining(cursor, row, width, Some(width.div_ceil(8)))?;
    let mut packed = vec![0u8; width.div_ceil(8)];
    cursor.read_exact(&mut packed).map_err(|_| {
        IoError::MalformedData(format!(
            "row {} is truncated: expected {} packed signs",
            row, width
        ))
    })?;

    Ok((0..width)
        .map(|i| {
            if packed[i / 8] & (0x80 >> (i % 8)) != 0 {
                ON
            } else {
                OFF
            }
        })
        .collect())
}

/// Writes rows in the binary layout read by [`read_binary`].
///
/// Rows of one common width use the plain header; otherwise the header width is zero and each
/// row is prefixed with its width. Signs are written as 1 for positive values, 0 otherwise.
pub fn write_binary<W: Write>(
    mut writer: W,
    data: &[Vec<f64>],
    encoding: Encoding,
) -> Result<(), IoError> {
    let rows = to_u32(data.len(), "row count")?;
    let uniform = match data.first() {
        Some(first) if !first.is_empty() && data.iter().all(|row| row.len() == first.len()) => {
            Some(to_u32(first.len(), "row width")?)
        }
        _ => None,
    };

    writer.write_u32::<LittleEndian>(rows)?;
    writer.write_u32::<LittleEndian>(uniform.unwrap_or(RAGGED_WIDTH))?;

    for row in data {
        if uniform.is_none() {
            writer.write_u32::<LittleEndian>(to_u32(row.len(), "row width")?)?;
        }
        match encoding {
            Encoding::Float => {
                for &value in row {
                    writer.write_f64::<LittleEndian>(value)?;
                }
            }
            Encoding::Sign => writer.write_all(&pack_signs(row))?,
        }
    }
    Ok(())
}

fn pack_signs(row: &[f64]) -> Vec<u8> {
    let mut packed = vec![0u8; row.len().div_ceil(8)];
    for (i, _) in row.iter().enumerate().filter(|(_, value)| **value > 0.0) {
        packed[i / 8] |= 0x80 >> (i % 8);
    }
    packed
}

fn to_u32(value: usize, what: &str) -> Result<u32, IoError> {
    u32::try_from(value)
        .map_err(|_| IoError::MalformedData(format!("{} {} does not fit in 32 bits", what, value)))
}
