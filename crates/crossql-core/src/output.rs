//! Result shaping.

use serde::{Deserialize, Serialize};

use crate::decode::RawRows;
use crate::error::{Error, Result};
use crate::ordered::OrderedMap;
use crate::value::SqlValue;

/// A row keyed by column name, in result column order.
pub type Dict = OrderedMap<SqlValue>;

/// The shape a caller wants the rows in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Every row as a positional tuple.
    #[default]
    Tuples,
    /// Every row as a dict.
    Dicts,
    /// Exactly one row with exactly one column.
    Cell,
    /// Zero or one row with exactly one column.
    CellOrNone,
    /// Exactly one row, positional.
    SingleTuple,
    /// Exactly one row, as a dict.
    SingleDict,
    /// Zero or one row, positional.
    SingleTupleOrNone,
    /// Zero or one row, as a dict.
    SingleDictOrNone,
    /// Every row of a single column, flattened.
    CellList,
    /// Column-oriented.
    Columnar,
}

/// Rows shaped per [`OutputFormat`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Tuples(Vec<Vec<SqlValue>>),
    Dicts(Vec<Dict>),
    Cell(SqlValue),
    CellOrNone(Option<SqlValue>),
    Tuple(Vec<SqlValue>),
    Dict(Dict),
    TupleOrNone(Option<Vec<SqlValue>>),
    DictOrNone(Option<Dict>),
    CellList(Vec<SqlValue>),
    Columnar(ColumnTable),
}

/// What a column holds, judged from its non-null cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// No non-null cells.
    Null,
    Bool,
    Int,
    /// Floats, or a mix of floats and integers.
    Float,
    Text,
    Blob,
    Json,
    /// Dates, times and timestamps.
    Temporal,
    /// Anything else.
    Mixed,
}

impl ValueKind {
    fn of(value: &SqlValue) -> Self {
        match value {
            SqlValue::Null => Self::Null,
            SqlValue::Bool(_) => Self::Bool,
            SqlValue::Int(_) => Self::Int,
            SqlValue::Float(_) => Self::Float,
            SqlValue::Text(_) => Self::Text,
            SqlValue::Blob(_) => Self::Blob,
            SqlValue::Json(_) => Self::Json,
            SqlValue::Timestamp(_)
            | SqlValue::TimestampTz(_)
            | SqlValue::Date(_)
            | SqlValue::Time(_) => Self::Temporal,
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Null, kind) | (kind, Self::Null) => kind,
            (a, b) if a == b => a,
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => Self::Float,
            _ => Self::Mixed,
        }
    }

    /// Infers the kind of a column from its cells.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a SqlValue>) -> Self {
        values
            .into_iter()
            .map(Self::of)
            .fold(Self::Null, Self::merge)
    }
}

/// One column of a [`ColumnTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnData {
    pub name: String,
    pub kind: ValueKind,
    pub values: Vec<SqlValue>,
}

/// Rows transposed into columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnTable {
    pub columns: Vec<ColumnData>,
}

impl ColumnTable {
    /// Returns the column named `name`.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl From<RawRows> for ColumnTable {
    fn from(rows: RawRows) -> Self {
        let mut values: Vec<Vec<SqlValue>> = rows
            .columns
            .iter()
            .map(|_| Vec::with_capacity(rows.rows.len()))
            .collect();
        for row in rows.rows {
            for (column, cell) in values.iter_mut().zip(row) {
                column.push(cell);
            }
        }
        let columns = rows
            .columns
            .into_iter()
            .zip(values)
            .map(|(name, values)| ColumnData {
                kind: ValueKind::infer(&values),
                name,
                values,
            })
            .collect();
        Self { columns }
    }
}

const EXACTLY_ONE: &str = "exactly 1";
const AT_MOST_ONE: &str = "at most 1";

/// Shapes `rows` into `format`.
///
/// # Errors
///
/// Returns [`Error::UnexpectedColumnCount`] when a cell format gets other
/// than one column, and [`Error::UnexpectedRowCount`] when a single-row
/// format gets the wrong number of rows.
pub fn format_rows(rows: RawRows, format: OutputFormat) -> Result<Output> {
    if matches!(
        format,
        OutputFormat::Cell | OutputFormat::CellOrNone | OutputFormat::CellList
    ) && rows.columns.len() != 1
    {
        return Err(Error::UnexpectedColumnCount {
            expected: 1,
            actual: rows.columns.len(),
        });
    }

    Ok(match format {
        OutputFormat::Tuples => Output::Tuples(rows.rows),
        OutputFormat::Dicts => Output::Dicts(to_dicts(rows)),
        OutputFormat::Cell => Output::Cell(first_cell(single(rows.rows, EXACTLY_ONE)?)),
        OutputFormat::CellOrNone => {
            Output::CellOrNone(optional(rows.rows)?.map(first_cell))
        }
        OutputFormat::SingleTuple => Output::Tuple(single(rows.rows, EXACTLY_ONE)?),
        OutputFormat::SingleDict => {
            let columns = rows.columns;
            let row = single(rows.rows, EXACTLY_ONE)?;
            Output::Dict(to_dict(&columns, row))
        }
        OutputFormat::SingleTupleOrNone => Output::TupleOrNone(optional(rows.rows)?),
        OutputFormat::SingleDictOrNone => {
            let columns = rows.columns;
            Output::DictOrNone(optional(rows.rows)?.map(|row| to_dict(&columns, row)))
        }
        OutputFormat::CellList => {
            Output::CellList(rows.rows.into_iter().map(first_cell).collect())
        }
        OutputFormat::Columnar => Output::Columnar(ColumnTable::from(rows)),
    })
}

fn to_dict(columns: &[String], row: Vec<SqlValue>) -> Dict {
    columns.iter().cloned().zip(row).collect()
}

fn to_dicts(rows: RawRows) -> Vec<Dict> {
    let columns = rows.columns;
    rows.rows
        .into_iter()
        .map(|row| to_dict(&columns, row))
        .collect()
}

fn first_cell(row: Vec<SqlValue>) -> SqlValue {
    row.into_iter().next().unwrap_or(SqlValue::Null)
}

fn single(rows: Vec<Vec<SqlValue>>, expected: &'static str) -> Result<Vec<SqlValue>> {
    let actual = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(row), None) => Ok(row),
        _ => Err(Error::UnexpectedRowCount { expected, actual }),
    }
}

fn optional(rows: Vec<Vec<SqlValue>>) -> Result<Option<Vec<SqlValue>>> {
    if rows.len() > 1 {
        return Err(Error::UnexpectedRowCount {
            expected: AT_MOST_ONE,
            actual: rows.len(),
        });
    }
    Ok(rows.into_iter().next())
}
