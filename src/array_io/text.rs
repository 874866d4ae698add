use super::Encoding;
use crate::error::IoError;
use crate::math::{OFF, ON};
use std::io::{BufRead, Write};

/// Reads a text array, one row per line.
///
/// Float rows are tab separated decimal numbers; sign rows are strings of `'1'` (+1.0) and
/// `'0'` (-1.0). The width of the first row fixes the width of every other row. Blank lines
/// are skipped and a trailing `'\r'` is ignored.
///
/// # Returns
///
/// - `Ok(None)` - The input holds no rows
/// - `Ok(Some(rows))` - The decoded rows
/// - `Err(IoError::ParseError)` - If an element cannot be decoded
/// - `Err(IoError::MalformedData)` - If a row width differs from the first row
pub fn read_text<R: BufRead>(
    reader: R,
    encoding: Encoding,
) -> Result<Option<Vec<Vec<f64>>>, IoError> {
    let mut data: Vec<Vec<f64>> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.is_empty() {
            continue;
        }

        let row = data.len();
        let values = match encoding {
            Encoding::Float => parse_float_row(line, row)?,
            Encoding::Sign => parse_sign_row(line, row)?,
        };

        if let Some(first) = data.first() {
            if first.len() != values.len() {
                return Err(IoError::MalformedData(format!(
                    "row {} has {} elements but the first row has {}",
                    row,
                    values.len(),
                    first.len()
                )));
            }
        }
        data.push(values);
    }

    Ok(if data.is_empty() { None } else { Some(data) })
}

fn parse_float_row(line: &str, row: usize) -> Result<Vec<f64>, IoError> {
    line.split('\t')
        .enumerate()
        .map(|(column, token)| {
            token.trim().parse::<f64>().map_err(|_| {
                IoError::ParseError(format!(
                    "row {}, column {}: cannot parse \"{}\" as a float",
                    row, column, token
                ))
            })
        })
        .collect()
}

fn parse_sign_row(line: &str, row: usize) -> Result<Vec<f64>, IoError> {
    line.chars()
        .enumerate()
        .map(|(column, c)| match c {
            '1' => Ok(ON),
            '0' => Ok(OFF),
            other => Err(IoError::ParseError(format!(
                "row {}, column {}: '{}' is not a sign, expected '0' or '1'",
                row, column, other
            ))),
        })
        .collect()
}

/// Writes rows in the text layout read by [`read_text`].
///
/// Floats use the shortest decimal form that reads back to the same value.
pub fn write_text<W: Write>(
    mut writer: W,
    data: &[Vec<f64>],
    encoding: Encoding,
) -> Result<(), IoError> {
    for row in data {
        match encoding {
            Encoding::Float => {
                let line = row
                    .iter()
                    .map(|value| value.to_string())
                    .collect::<Vec<_>>()
                    .join("\t");
                writeln!(writer, "{}", line)?;
            }
            Encoding::Sign => {
                let line: String = row
                    .iter()
                    .map(|&value| if value > 0.0 { '1' } else { '0' })
                    .collect();
                writeln!(writer, "{}", line)?;
            }
        }
    }
    Ok(())
}
