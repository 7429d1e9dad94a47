//! Reading and writing the Matrix Market exchange format.
//!
//! Only the two real general layouts used for training data are supported:
//! sparse coordinate triples and dense column-major arrays. Blank lines and
//! `%` comment lines after the banner are skipped wherever they appear.
//!
//! See <https://math.nist.gov/MatrixMarket/formats.html>.

use crate::error::{DataError, Result};
use nalgebra::{DMatrix, DVector};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;
use std::str::FromStr;

/// Banner of the sparse coordinate layout.
pub const COORDINATE_HEADER: &str = "%%MatrixMarket matrix coordinate real general";

/// Banner of the dense array layout.
pub const ARRAY_HEADER: &str = "%%MatrixMarket matrix array real general";

/// A matrix as stored in a Matrix Market file.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixMarket {
    /// Sparse storage. Entries are `(row, col, value)` with 0-based indices,
    /// in file order.
    Coordinate {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
        /// Stored entries
        entries: Vec<(usize, usize, f64)>,
    },
    /// Dense storage in column-major order.
    Array {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
        /// `rows * cols` values, column by column
        values: Vec<f64>,
    },
}

impl MatrixMarket {
    /// Number of rows.
    pub fn rows(&self) -> usize {
        match self {
            Self::Coordinate { rows, .. } | Self::Array { rows, .. } => *rows,
        }
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        match self {
            Self::Coordinate { cols, .. } | Self::Array { cols, .. } => *cols,
        }
    }

    /// Storage format keyword as it appears in the banner.
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::Coordinate { .. } => "coordinate",
            Self::Array { .. } => "array",
        }
    }

    /// Checks that the stored data fits the declared shape: an array holds
    /// exactly `rows * cols` values and every coordinate entry lies inside
    /// the matrix. Values built by [`read`] always pass.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Array { rows, cols, values } => {
                if rows.checked_mul(*cols) != Some(values.len()) {
                    return Err(DataError::shape_mismatch(
                        "array values",
                        format!("{rows}x{cols}"),
                        values.len(),
                    ));
                }
            }
            Self::Coordinate {
                rows,
                cols,
                entries,
            } => {
                if let Some(&(i, j, _)) = entries.iter().find(|&&(i, j, _)| i >= *rows || j >= *cols) {
                    return Err(DataError::shape_mismatch(
                        "coordinate entry",
                        format!("index inside {rows}x{cols}"),
                        format!("({i}, {j})"),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Converts to a dense matrix. Repeated coordinate entries are summed.
    pub fn to_dense(&self) -> Result<DMatrix<f64>> {
        self.validate()?;
        let dense = match self {
            Self::Array { rows, cols, values } => DMatrix::from_column_slice(*rows, *cols, values),
            Self::Coordinate {
                rows,
                cols,
                entries,
            } => {
                let mut dense = DMatrix::zeros(*rows, *cols);
                for &(i, j, value) in entries {
                    dense[(i, j)] += value;
                }
                dense
            }
        };
        Ok(dense)
    }
}

/// Reads a matrix from a stream.
///
/// Tokens are parsed as lines arrive, so only the current line is held in
/// memory.
pub fn read<R: BufRead>(reader: R) -> Result<MatrixMarket> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line?,
        None => String::new(),
    };
    let coordinate = match header.trim_end() {
        COORDINATE_HEADER => true,
        ARRAY_HEADER => false,
        other => {
            return Err(DataError::UnsupportedHeader {
                header: other.to_string(),
            })
        }
    };

    let mut tokens = Tokens::new(lines);
    if !tokens.advance()? {
        return Err(DataError::malformed(tokens.line_number, "missing size line"));
    }
    let size_line = tokens.line_number;
    let rows = tokens.value_on_line::<usize>("row count")?;
    let cols = tokens.value_on_line::<usize>("column count")?;

    let matrix = if coordinate {
        let nonzeros = tokens.value_on_line::<usize>("entry count")?;
        let mut entries = Vec::with_capacity(nonzeros.min(MAX_PREALLOCATED));
        for _ in 0..nonzeros {
            let row = tokens.value::<usize>("row index")?;
            let line = tokens.line_number;
            let col = tokens.value::<usize>("column index")?;
            let value = tokens.value::<f64>("value")?;
            if row == 0 || row > rows || col == 0 || col > cols {
                return Err(DataError::malformed(
                    line,
                    format!("entry ({row}, {col}) outside a {rows}x{cols} matrix"),
                ));
            }
            entries.push((row - 1, col - 1, value));
        }
        MatrixMarket::Coordinate {
            rows,
            cols,
            entries,
        }
    } else {
        let count = rows
            .checked_mul(cols)
            .ok_or_else(|| DataError::malformed(size_line, format!("{rows}x{cols} is too large")))?;
        let mut values = Vec::with_capacity(count.min(MAX_PREALLOCATED));
        for _ in 0..count {
            values.push(tokens.value::<f64>("value")?);
        }
        MatrixMarket::Array { rows, cols, values }
    };

    let mut trailing = 0usize;
    while tokens.next_span()?.is_some() {
        trailing += 1;
    }
    if trailing > 0 {
        log::warn!("ignoring {trailing} tokens after the last matrix entry");
    }

    Ok(matrix)
}

/// Reads a matrix from a file.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<MatrixMarket> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataError::File {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("reading matrix from {}", path.display());
    read(BufReader::new(file))
}

/// Writes a vector as a one-row dense matrix, one value per line.
pub fn write_vector<W: Write>(mut out: W, values: &DVector<f64>) -> Result<()> {
    writeln!(out, "{ARRAY_HEADER}")?;
    writeln!(out, "1 {}", values.len())?;
    for value in values.iter() {
        writeln!(out, "{value}")?;
    }
    out.flush()?;
    Ok(())
}

/// Writes a vector to a file, replacing any previous content.
pub fn write_vector_file<P: AsRef<Path>>(path: P, values: &DVector<f64>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| DataError::File {
        path: path.to_path_buf(),
        source,
    })?;
    write_vector(BufWriter::new(file), values)
}

/// Upper bound on capacity reserved from a size line before any data is read.
const MAX_PREALLOCATED: usize = 1 << 20;

/// Whitespace-separated tokens of the data lines, read one line at a time.
struct Tokens<R> {
    lines: Lines<R>,
    line: String,
    line_number: usize,
    pos: usize,
}

impl<R: BufRead> Tokens<R> {
    /// Starts after the banner, which is line 1.
    fn new(lines: Lines<R>) -> Self {
        Self {
            lines,
            line: String::new(),
            line_number: 1,
            pos: 0,
        }
    }

    /// Moves to the next line holding data. Returns false at end of input.
    fn advance(&mut self) -> Result<bool> {
        for line in self.lines.by_ref() {
            self.line = line?;
            self.line_number += 1;
            self.pos = 0;
            if !self.line.trim().is_empty() && !self.line.starts_with('%') {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Byte range of the next token on the current line.
    fn span_on_line(&self) -> Option<(usize, usize)> {
        let rest = &self.line[self.pos..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            return None;
        }
        let start = self.pos + (rest.len() - trimmed.len());
        let end = trimmed
            .find(char::is_whitespace)
            .map_or(self.line.len(), |len| start + len);
        Some((start, end))
    }

    /// Byte range of the next token, reading further lines as needed.
    fn next_span(&mut self) -> Result<Option<(usize, usize)>> {
        loop {
            if let Some((start, end)) = self.span_on_line() {
                self.pos = end;
                return Ok(Some((start, end)));
            }
            if !self.advance()? {
                return Ok(None);
            }
        }
    }

    fn value<V: FromStr>(&mut self, what: &str) -> Result<V> {
        let span = self.next_span()?;
        self.parse(span, what)
    }

    fn value_on_line<V: FromStr>(&mut self, what: &str) -> Result<V> {
        let span = self.span_on_line();
        if let Some((_, end)) = span {
            self.pos = end;
        }
        self.parse(span, what)
    }

    fn parse<V: FromStr>(&self, span: Option<(usize, usize)>, what: &str) -> Result<V> {
        let (start, end) = span.ok_or_else(|| {
            DataError::malformed(self.line_number, format!("unexpected end of data, expected {what}"))
        })?;
        let token = &self.line[start..end];
        token
            .parse()
            .map_err(|_| DataError::malformed(self.line_number, format!("cannot read {what} from {token:?}")))
    }
}
