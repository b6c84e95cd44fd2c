use crate::error::{TableError, TableResult};
use crate::row::DataRow;
use crate::value::Value;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::Range;

/// Upcast helper so traversals can hand out [`DataRow`]s for both concrete containers and
/// `dyn DataContainer`.
pub trait AsDataContainer {
    fn as_data_container(&self) -> &dyn DataContainer;
}

impl<T: DataContainer> AsDataContainer for T {
    fn as_data_container(&self) -> &dyn DataContainer {
        self
    }
}

/// Storage abstraction for row-oriented datasets.
///
/// Implementations only provide positional reads; every traversal (rows, columns, map, find,
/// reduce, ...) is derived in [`DataContainerExt`] from these four methods, so a view that can
/// answer them supports the full contract.
pub trait DataContainer: AsDataContainer + fmt::Debug + Send + Sync {
    fn num_rows(&self) -> usize;

    fn num_columns(&self) -> usize;

    /// Read one cell.
    ///
    /// Fails when `row`/`column` is out of bounds. A stored null placeholder row reads as
    /// `Value::Null` for every column.
    fn value_at(&self, row: usize, column: usize) -> TableResult<&Value>;

    /// Borrow the stored row, or `None` for a null placeholder row.
    fn row_as_array(&self, row: usize) -> TableResult<Option<&[Value]>>;
}

pub(crate) fn check_row(row: usize, rows: usize) -> TableResult<()> {
    if row >= rows {
        return Err(TableError::RowOutOfBounds { row, rows });
    }
    Ok(())
}

pub(crate) fn check_column(column: usize, columns: usize) -> TableResult<()> {
    if column >= columns {
        return Err(TableError::ColumnOutOfBounds { column, columns });
    }
    Ok(())
}

/// Traversals shared by every [`DataContainer`].
///
/// Methods taking `FnMut(DataRow<'a>, usize)` hand out independent rows that may be retained.
/// The `*_shared` methods and [`DataContainerExt::find`] lend one re-pointed `&DataRow` per
/// step instead; the borrow checker keeps that row from escaping the callback.
pub trait DataContainerExt: DataContainer {
    fn row(&self, row: usize) -> TableResult<DataRow<'_>> {
        check_row(row, self.num_rows())?;
        Ok(DataRow::new(self.as_data_container(), row))
    }

    fn rows(&self) -> Rows<'_> {
        Rows {
            container: self.as_data_container(),
            next: 0,
            end: self.num_rows(),
        }
    }

    fn column(&self, column: usize) -> TableResult<ColumnValues<'_>> {
        check_column(column, self.num_columns())?;
        Ok(ColumnValues {
            container: self.as_data_container(),
            column,
            next: 0,
            end: self.num_rows(),
        })
    }

    fn map<'a, R, F>(&'a self, f: F) -> TableResult<Vec<R>>
    where
        F: FnMut(DataRow<'a>, usize) -> TableResult<R>,
    {
        self.map_range(0..self.num_rows(), f)
    }

    /// Map over `[start, end)`; `end` is clamped to the row count.
    fn map_range<'a, R, F>(&'a self, range: Range<usize>, mut f: F) -> TableResult<Vec<R>>
    where
        F: FnMut(DataRow<'a>, usize) -> TableResult<R>,
    {
        let container = self.as_data_container();
        let end = range.end.min(self.num_rows());
        let start = range.start.min(end);
        let mut out = Vec::with_capacity(end - start);
        for index in start..end {
            out.push(f(DataRow::new(container, index), index)?);
        }
        Ok(out)
    }

    fn map_shared<R, F>(&self, range: Range<usize>, mut f: F) -> TableResult<Vec<R>>
    where
        F: FnMut(&DataRow<'_>, usize) -> TableResult<R>,
    {
        let end = range.end.min(self.num_rows());
        let start = range.start.min(end);
        let mut out = Vec::with_capacity(end - start);
        self.for_each_shared(start..end, |row, index| {
            out.push(f(row, index)?);
            Ok(())
        })?;
        Ok(out)
    }

    fn for_each_shared<F>(&self, range: Range<usize>, mut f: F) -> TableResult<()>
    where
        F: FnMut(&DataRow<'_>, usize) -> TableResult<()>,
    {
        let container = self.as_data_container();
        let end = range.end.min(self.num_rows());
        let mut cursor = DataRow::new(container, range.start);
        for index in range.start..end {
            cursor.set_source(container, index);
            f(&cursor, index)?;
        }
        Ok(())
    }

    /// First row satisfying `predicate`. The scan uses a shared cursor; the returned row is an
    /// independent view.
    fn find<F>(&self, mut predicate: F) -> TableResult<Option<DataRow<'_>>>
    where
        F: FnMut(&DataRow<'_>, usize) -> TableResult<bool>,
    {
        let container = self.as_data_container();
        let mut cursor = DataRow::new(container, 0);
        for index in 0..self.num_rows() {
            cursor.set_source(container, index);
            if predicate(&cursor, index)? {
                return Ok(Some(DataRow::new(container, index)));
            }
        }
        Ok(None)
    }

    fn reduce<'a, A, F>(&'a self, init: A, mut f: F) -> TableResult<A>
    where
        F: FnMut(A, DataRow<'a>, usize) -> TableResult<A>,
    {
        let container = self.as_data_container();
        let mut acc = init;
        for index in 0..self.num_rows() {
            acc = f(acc, DataRow::new(container, index), index)?;
        }
        Ok(acc)
    }

    /// Row-major materialization; null placeholder rows stay `None`.
    fn flatten_data(&self) -> TableResult<Vec<Option<Vec<Value>>>> {
        (0..self.num_rows())
            .map(|row| Ok(self.row_as_array(row)?.map(<[Value]>::to_vec)))
            .collect()
    }

    fn plain_index(&self) -> Vec<usize> {
        (0..self.num_rows()).collect()
    }
}

impl<C: DataContainer + ?Sized> DataContainerExt for C {}

/// Iterator over the rows of a container. Each call to [`DataContainerExt::rows`] starts over.
#[derive(Clone)]
pub struct Rows<'a> {
    container: &'a dyn DataContainer,
    next: usize,
    end: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = DataRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let row = DataRow::new(self.container, self.next);
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.next;
        (len, Some(len))
    }
}

impl ExactSizeIterator for Rows<'_> {}
impl FusedIterator for Rows<'_> {}

/// Iterator over one column's values, top to bottom.
#[derive(Clone)]
pub struct ColumnValues<'a> {
    container: &'a dyn DataContainer,
    column: usize,
    next: usize,
    end: usize,
}

impl<'a> Iterator for ColumnValues<'a> {
    type Item = TableResult<&'a Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let value = self.container.value_at(self.next, self.column);
        self.next += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.next;
        (len, Some(len))
    }
}

impl ExactSizeIterator for ColumnValues<'_> {}
impl FusedIterator for ColumnValues<'_> {}
