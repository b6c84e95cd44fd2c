use crate::container::{check_column, check_row, DataContainer};
use crate::error::{TableError, TableResult};
use crate::value::{Value, NULL_VALUE};

/// Container backed by a vector of rows.
///
/// Rows are stored as `Option<Vec<Value>>`: some ingestion paths produce null placeholder rows,
/// which read as `Value::Null` instead of failing.
#[derive(Clone, Debug, PartialEq)]
pub struct RowDataContainer {
    rows: Vec<Option<Vec<Value>>>,
    num_columns: usize,
}

impl RowDataContainer {
    /// Build a container. The column count is `num_fields` when given and positive, otherwise the
    /// length of the first row; construction fails if neither yields a positive count.
    pub fn new(rows: Vec<Option<Vec<Value>>>, num_fields: Option<usize>) -> TableResult<Self> {
        let num_columns = num_fields
            .filter(|&n| n > 0)
            .or_else(|| rows.first().and_then(|r| r.as_ref()).map(Vec::len))
            .unwrap_or(0);
        if num_columns == 0 {
            return Err(TableError::NoColumns);
        }
        Ok(Self { rows, num_columns })
    }

    pub fn into_rows(self) -> Vec<Option<Vec<Value>>> {
        self.rows
    }
}

impl DataContainer for RowDataContainer {
    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn num_columns(&self) -> usize {
        self.num_columns
    }

    fn value_at(&self, row: usize, column: usize) -> TableResult<&Value> {
        check_row(row, self.rows.len())?;
        check_column(column, self.num_columns)?;
        Ok(match &self.rows[row] {
            Some(values) => values.get(column).unwrap_or(&NULL_VALUE),
            None => &NULL_VALUE,
        })
    }

    fn row_as_array(&self, row: usize) -> TableResult<Option<&[Value]>> {
        check_row(row, self.rows.len())?;
        Ok(self.rows[row].as_deref())
    }
}
