use crate::error::IoError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

/// Binary array layouts: little-endian header followed by float or packed-sign rows
pub mod binary;
/// Text array layouts: tab separated floats or `0`/`1` sign strings
pub mod text;

/// Element encoding shared by the binary and text layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// 64-bit floating point values
    Float,
    /// Bipolar values, stored as a single bit or character each
    Sign,
}

/// The four on-disk array formats, selected by file extension.
///
/// # Variants
///
/// - `BinaryFloat` - `.flt`, little-endian `f64` rows
/// - `BinarySign` - `.sgn`, rows of packed sign bits
/// - `TextFloat` - `.tsv`, tab separated decimal rows
/// - `TextSign` - `.txt`, rows of `0`/`1` characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrayFormat {
    BinaryFloat,
    BinarySign,
    TextFloat,
    TextSign,
}

impl ArrayFormat {
    /// Maps an extension, with or without its leading dot, to a format.
    ///
    /// # Examples
    /// ```rust
    /// use rbmstack::array_io::ArrayFormat;
    ///
    /// assert_eq!(ArrayFormat::from_extension(".sgn").unwrap(), ArrayFormat::BinarySign);
    /// assert_eq!(ArrayFormat::from_extension("tsv").unwrap(), ArrayFormat::TextFloat);
    /// assert!(ArrayFormat::from_extension(".csv").is_err());
    /// ```
    pub fn from_extension(extension: &str) -> Result<Self, IoError> {
        match extension.trim_start_matches('.') {
            "flt" => Ok(ArrayFormat::BinaryFloat),
            "sgn" => Ok(ArrayFormat::BinarySign),
            "tsv" => Ok(ArrayFormat::TextFloat),
            "txt" => Ok(ArrayFormat::TextSign),
            other => Err(IoError::UnknownFormat(other.to_string())),
        }
    }

    /// Picks the format from the extension of `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| IoError::UnknownFormat(path.display().to_string()))?;
        Self::from_extension(extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArrayFormat::BinaryFloat => ".flt",
            ArrayFormat::BinarySign => ".sgn",
            ArrayFormat::TextFloat => ".tsv",
            ArrayFormat::TextSign => ".txt",
        }
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            ArrayFormat::BinaryFloat | ArrayFormat::TextFloat => Encoding::Float,
            ArrayFormat::BinarySign | ArrayFormat::TextSign => Encoding::Sign,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, ArrayFormat::BinaryFloat | ArrayFormat::BinarySign)
    }
}

/// Decodes an array from any reader.
///
/// # Returns
///
/// - `Ok(None)` - The payload is empty or declares zero rows
/// - `Ok(Some(rows))` - The decoded rows
/// - `Err(IoError)` - If the payload is truncated, ragged (text), or fails to parse
pub fn read_array<R: Read>(
    reader: R,
    format: ArrayFormat,
) -> Result<Option<Vec<Vec<f64>>>, IoError> {
    if format.is_binary() {
        binary::read_binary(reader, format.encoding())
    } else {
        text::read_text(BufReader::new(reader), format.encoding())
    }
}

/// Encodes an array into any writer.
pub fn write_array<W: Write>(
    writer: W,
    format: ArrayFormat,
    data: &[Vec<f64>],
) -> Result<(), IoError> {
    if format.is_binary() {
        binary::write_binary(writer, data, format.encoding())
    } else {
        text::write_text(writer, data, format.encoding())
    }
}

/// Reads an array file, choosing the format from its extension.
///
/// A file that does not exist is reported as absent data rather than an error.
///
/// # Parameters
///
/// - `path` - File to read; the extension must be `.flt`, `.sgn`, `.tsv` or `.txt`
///
/// # Returns
///
/// - `Ok(None)` - The file is missing, empty, or declares zero rows
/// - `Ok(Some(rows))` - The decoded rows
/// - `Err(IoError)` - On an unknown extension, other I/O failures, or malformed contents
pub fn read_array_file(path: &str) -> Result<Option<Vec<Vec<f64>>>, IoError> {
    let format = ArrayFormat::from_path(path)?;
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Cannot open \"{}\": file not found", path);
            return Ok(None);
        }
        Err(e) => return Err(IoError::StdIoError(e)),
    };

    let data = read_array(BufReader::new(file), format)?;
    if let Some(rows) = &data {
        debug!("Read {} rows from \"{}\"", rows.len(), path);
    }
    Ok(data)
}

/// Writes an array file, choosing the format from its extension.
///
/// The file is created or truncated.
pub fn write_array_file(path: &str, data: &[Vec<f64>]) -> Result<(), IoError> {
    let format = ArrayFormat::from_path(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_array(&mut writer, format, data)?;
    writer.flush()?;
    debug!("Wrote {} rows to \"{}\"", data.len(), path);
    Ok(())
}

/// Loads the vectors of a data file and checks that they share one width.
///
/// # Parameters
///
/// - `path` - File to read
/// - `expected_width` - Width the vectors must have, or `None` to accept the width of the first
///
/// # Returns
///
/// - `Ok((vectors, width))` - The vectors and their common width
/// - `Err(IoError::NoData)` - If the file holds no vectors
/// - `Err(IoError::MalformedData)` - If a vector has the wrong width
pub fn load_vectors(
    path: &str,
    expected_width: Option<usize>,
) -> Result<(Vec<Vec<f64>>, usize), IoError> {
    let vectors = read_array_file(path)?.ok_or_else(|| IoError::NoData(path.to_string()))?;
    let width = expected_width.unwrap_or_else(|| vectors[0].len());

    if let Some((index, vector)) = vectors.iter().enumerate().find(|(_, v)| v.len() != width) {
        return Err(IoError::MalformedData(format!(
            "vector {} in \"{}\" has width {}, expected {}",
            index,
            path,
            vector.len(),
            width
        )));
    }
    Ok((vectors, width))
}
