//! Matrix Market reader
//!
//! Supports the `coordinate` format (the usual container for single-cell
//! count matrices) with `real`, `double`, `integer` or `pattern` fields and
//! `general` or `symmetric` symmetry, plus the dense `array` format with
//! `general` symmetry.
//!
//! # Example
//!
//! ```
//! use scranwasm::io::{read_matrix_market, DataSource, ReadOptions};
//!
//! let text = "%%MatrixMarket matrix coordinate integer general\n\
//!             3 2 3\n\
//!             1 1 5\n\
//!             3 1 2\n\
//!             2 2 7\n";
//! let source = DataSource::from_bytes(text.as_bytes().to_vec());
//! let m = read_matrix_market(&source, &ReadOptions::default())?;
//! assert_eq!(m.column_vec(0)?, vec![5.0, 0.0, 2.0]);
//! # Ok::<(), scranwasm::ScranError>(())
//! ```

use crate::error::{Result, ScranError};
use crate::io::source::DataSource;
use crate::matrix::{layered, CompressedSparseMatrix, Layout, NumericMatrix};
use std::io::BufRead;
use std::sync::Arc;

/// Storage format declared in the banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketFormat {
    /// Sparse triplets
    Coordinate,
    /// Dense, column-major values
    Array,
}

/// Value type declared in the banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketField {
    /// Floating point values
    Real,
    /// Integer values
    Integer,
    /// No values; every listed entry is 1
    Pattern,
}

/// Symmetry declared in the banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSymmetry {
    /// Every entry is listed
    General,
    /// Only the lower triangle is listed
    Symmetric,
}

/// Banner and size line of a Matrix Market file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixMarketHeader {
    /// Storage format
    pub format: MarketFormat,
    /// Value type
    pub field: MarketField,
    /// Symmetry
    pub symmetry: MarketSymmetry,
    /// Number of rows
    pub nrow: usize,
    /// Number of columns
    pub ncol: usize,
    /// Number of listed entries (`nrow * ncol` for arrays)
    pub entries: usize,
}

/// Options applied while loading
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Build the layered integer representation
    pub layered: bool,
    /// Truncate values toward zero and store them as 32-bit integers
    pub force_integer: bool,
    /// Keep only these rows, in this order
    pub row_subset: Option<Vec<usize>>,
    /// Keep only these columns, in this order
    pub column_subset: Option<Vec<usize>>,
}

impl ReadOptions {
    /// Default options: plain `f64` storage, no subsetting
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `layered` field
    pub fn layered(mut self, layered: bool) -> Self {
        self.layered = layered;
        self
    }

    /// Set the `force_integer` field
    pub fn force_integer(mut self, force_integer: bool) -> Self {
        self.force_integer = force_integer;
        self
    }

    /// Set the `row_subset` field
    pub fn row_subset(mut self, rows: Vec<usize>) -> Self {
        self.row_subset = Some(rows);
        self
    }

    /// Set the `column_subset` field
    pub fn column_subset(mut self, columns: Vec<usize>) -> Self {
        self.column_subset = Some(columns);
        self
    }
}

/// Line reader that tracks 1-based line numbers
struct Lines<R> {
    inner: R,
    buffer: String,
    line: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: String::new(),
            line: 0,
        }
    }

    /// Move to the next line with content, skipping blanks and (optionally)
    /// `%` comments. Returns `false` at end of input.
    fn advance(&mut self, skip_comments: bool) -> Result<bool> {
        loop {
            self.buffer.clear();
            if self.inner.read_line(&mut self.buffer)? == 0 {
                return Ok(false);
            }
            self.line += 1;
            let trimmed = self.buffer.trim();
            if trimmed.is_empty() || (skip_comments && trimmed.starts_with('%')) {
                continue;
            }
            return Ok(true);
        }
    }

    fn current(&self) -> &str {
        self.buffer.trim()
    }

    fn error(&self, msg: impl Into<String>) -> ScranError {
        ScranError::Parse {
            line: self.line,
            msg: msg.into(),
        }
    }
}

fn parse_banner(line: &str, line_no: usize) -> Result<(MarketFormat, MarketField, MarketSymmetry)> {
    let err = |msg: String| ScranError::Parse { line: line_no, msg };
    let tokens: Vec<String> = line.split_whitespace().map(|t| t.to_ascii_lowercase()).collect();

    if tokens.len() != 5 || tokens[0] != "%%matrixmarket" {
        return Err(err(format!("expected a %%MatrixMarket banner, got '{}'", line)));
    }
    if tokens[1] != "matrix" {
        return Err(err(format!("unsupported object '{}'", tokens[1])));
    }
    let format = match tokens[2].as_str() {
        "coordinate" => MarketFormat::Coordinate,
        "array" => MarketFormat::Array,
        other => return Err(err(format!("unsupported format '{}'", other))),
    };
    let field = match tokens[3].as_str() {
        "real" | "double" => MarketField::Real,
        "integer" => MarketField::Integer,
        "pattern" if format == MarketFormat::Coordinate => MarketField::Pattern,
        other => return Err(err(format!("unsupported field '{}'", other))),
    };
    let symmetry = match tokens[4].as_str() {
        "general" => MarketSymmetry::General,
        "symmetric" if format == MarketFormat::Coordinate => MarketSymmetry::Symmetric,
        other => return Err(err(format!("unsupported symmetry '{}'", other))),
    };
    Ok((format, field, symmetry))
}

fn parse_usize(token: Option<&str>, what: &str, lines: &Lines<impl BufRead>) -> Result<usize> {
    let token = token.ok_or_else(|| lines.error(format!("missing {}", what)))?;
    token
        .parse()
        .map_err(|_| lines.error(format!("invalid {} '{}'", what, token)))
}

fn parse_value(token: Option<&str>, lines: &Lines<impl BufRead>) -> Result<f64> {
    let token = token.ok_or_else(|| lines.error("missing value"))?;
    let value: f64 = token
        .parse()
        .map_err(|_| lines.error(format!("invalid value '{}'", token)))?;
    Ok(value)
}

fn read_header<R: BufRead>(lines: &mut Lines<R>) -> Result<MatrixMarketHeader> {
    if !lines.advance(false)? {
        return Err(lines.error("empty input"));
    }
    let (format, field, symmetry) = parse_banner(lines.current(), lines.line)?;

    if !lines.advance(true)? {
        return Err(lines.error("missing size line"));
    }
    let mut tokens = lines.current().split_whitespace();
    let nrow = parse_usize(tokens.next(), "row count", &*lines)?;
    let ncol = parse_usize(tokens.next(), "column count", &*lines)?;
    let entries = match format {
        MarketFormat::Coordinate => parse_usize(tokens.next(), "entry count", &*lines)?,
        MarketFormat::Array => nrow.checked_mul(ncol).ok_or_else(|| {
            lines.error(format!("{} x {} array is too large", nrow, ncol))
        })?,
    };
    if tokens.next().is_some() {
        return Err(lines.error("unexpected trailing fields on size line"));
    }
    if symmetry == MarketSymmetry::Symmetric && nrow != ncol {
        return Err(lines.error(format!(
            "symmetric matrix must be square, got {} x {}",
            nrow, ncol
        )));
    }

    Ok(MatrixMarketHeader {
        format,
        field,
        symmetry,
        nrow,
        ncol,
        entries,
    })
}

/// Read only the banner and size line
///
/// # Errors
///
/// Returns [`ScranError::Parse`] for a malformed banner or size line; I/O
/// errors for local files carry the path.
pub fn read_matrix_market_header(source: &DataSource) -> Result<MatrixMarketHeader> {
    let reader = source.open()?;
    let mut lines = Lines::new(reader);
    read_header(&mut lines).map_err(|e| source.annotate(e))
}

/// Old-to-new index mapping for a load-time subset
fn subset_map(subset: Option<&[usize]>, extent: usize, axis: &'static str) -> Result<Option<Vec<Option<usize>>>> {
    let Some(subset) = subset else {
        return Ok(None);
    };
    let mut map = vec![None; extent];
    for (new, &old) in subset.iter().enumerate() {
        if old >= extent {
            return Err(ScranError::IndexOutOfRange {
                index: old,
                extent,
                axis,
            });
        }
        if map[old].is_some() {
            return Err(ScranError::InvalidArgument(format!(
                "duplicate index {} in {} subset",
                old, axis
            )));
        }
        map[old] = Some(new);
    }
    Ok(Some(map))
}

fn remap(map: &Option<Vec<Option<usize>>>, index: usize) -> Option<usize> {
    match map {
        Some(m) => m[index],
        None => Some(index),
    }
}

/// Load a Matrix Market file into a [`NumericMatrix`]
///
/// Coordinate files produce sparse matrices (CSC, or layered when requested);
/// array files produce dense column-major matrices unless `layered` is set.
///
/// # Errors
///
/// - [`ScranError::Parse`] for malformed banners, size lines or entries,
///   entries outside the declared dimensions, or an entry count differing
///   from the header
/// - [`ScranError::IndexOutOfRange`] / [`ScranError::InvalidArgument`] for
///   bad subsets
/// - [`ScranError::InvalidArgument`] if `layered` is set and a value is not
///   a non-negative integer
///
/// Errors for local files carry the path.
pub fn read_matrix_market(source: &DataSource, options: &ReadOptions) -> Result<NumericMatrix> {
    let reader = source.open()?;
    load(reader, options).map_err(|e| source.annotate(e))
}

fn load<R: BufRead>(reader: R, options: &ReadOptions) -> Result<NumericMatrix> {
    let mut lines = Lines::new(reader);
    let header = read_header(&mut lines)?;

    let row_map = subset_map(options.row_subset.as_deref(), header.nrow, "rows")?;
    let col_map = subset_map(options.column_subset.as_deref(), header.ncol, "columns")?;
    let nrow = options.row_subset.as_ref().map_or(header.nrow, |s| s.len());
    let ncol = options.column_subset.as_ref().map_or(header.ncol, |s| s.len());

    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut values = Vec::new();
    let mut keep = |r: usize, c: usize, v: f64| {
        if let (Some(r), Some(c)) = (remap(&row_map, r), remap(&col_map, c)) {
            rows.push(r);
            cols.push(c);
            values.push(v);
        }
    };

    let mut seen = 0usize;
    while lines.advance(true)? {
        if seen == header.entries {
            return Err(lines.error(format!(
                "more entries than the {} declared in the header",
                header.entries
            )));
        }
        let mut tokens = lines.current().split_whitespace();
        match header.format {
            MarketFormat::Coordinate => {
                let r = parse_usize(tokens.next(), "row index", &lines)?;
                let c = parse_usize(tokens.next(), "column index", &lines)?;
                if r == 0 || r > header.nrow || c == 0 || c > header.ncol {
                    return Err(lines.error(format!(
                        "entry ({}, {}) outside {} x {} matrix",
                        r, c, header.nrow, header.ncol
                    )));
                }
                let v = match header.field {
                    MarketField::Pattern => 1.0,
                    _ => parse_value(tokens.next(), &lines)?,
                };
                keep(r - 1, c - 1, v);
                if header.symmetry == MarketSymmetry::Symmetric && r != c {
                    keep(c - 1, r - 1, v);
                }
            }
            MarketFormat::Array => {
                let v = parse_value(tokens.next(), &lines)?;
                // Column-major order
                keep(seen % header.nrow, seen / header.nrow, v);
            }
        }
        if tokens.next().is_some() {
            return Err(lines.error("unexpected trailing fields"));
        }
        seen += 1;
    }

    if seen != header.entries {
        return Err(lines.error(format!(
            "expected {} entries, found {}",
            header.entries, seen
        )));
    }

    log::debug!(
        "Parsed {:?} Matrix Market matrix: {} x {} ({} entries kept)",
        header.format,
        nrow,
        ncol,
        values.len()
    );

    build(header.format, nrow, ncol, rows, cols, values, options)
}

fn build(
    format: MarketFormat,
    nrow: usize,
    ncol: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    mut values: Vec<f64>,
    options: &ReadOptions,
) -> Result<NumericMatrix> {
    if options.layered {
        return layered::from_triplets(nrow, ncol, &rows, &cols, &values);
    }

    if options.force_integer {
        for v in values.iter_mut() {
            *v = f64::from(to_i32(*v)?);
        }
    }

    match format {
        MarketFormat::Array => {
            // Entries arrive column-major; subsets only reorder them
            let mut dense = vec![0.0; nrow * ncol];
            for ((r, c), v) in rows.into_iter().zip(cols).zip(values) {
                dense[c * nrow + r] = v;
            }
            NumericMatrix::from_dense(nrow, ncol, dense, Layout::ColumnMajor)
        }
        MarketFormat::Coordinate if options.force_integer => {
            // Duplicates are summed in f64 so the total can be range-checked
            let summed =
                CompressedSparseMatrix::from_triplets(nrow, ncol, &rows, &cols, &values, false)?;
            let ints = summed
                .values()
                .iter()
                .map(|&v| to_i32(v))
                .collect::<Result<Vec<i32>>>()?;
            let sparse = CompressedSparseMatrix::new(
                nrow,
                ncol,
                ints,
                summed.indices().to_vec(),
                summed.pointers().to_vec(),
                false,
            )?;
            Ok(NumericMatrix::new(Arc::new(sparse)))
        }
        MarketFormat::Coordinate => NumericMatrix::from_triplets(nrow, ncol, &rows, &cols, &values),
    }
}

/// Truncate toward zero, rejecting values outside the `i32` range
fn to_i32(value: f64) -> Result<i32> {
    let t = value.trunc();
    if t >= i32::MIN as f64 && t <= i32::MAX as f64 {
        Ok(t as i32)
    } else {
        Err(ScranError::InvalidArgument(format!(
            "value {} does not fit in a 32-bit integer",
            value
        )))
    }
}
