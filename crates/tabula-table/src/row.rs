use crate::container::DataContainer;
use crate::error::TableResult;
use crate::value::{Value, NULL_VALUE};
use std::fmt;

/// A positional view over one row of a [`DataContainer`].
///
/// A `DataRow` never owns or copies cell data; it is a `(container, row index)` pair and two rows
/// compare equal only when they point at the same container and index. Rows handed out by value
/// (e.g. from [`crate::DataContainerExt::row`]) are independent and may be kept for as long as the
/// container is borrowed. Shared traversals lend a single `&DataRow` that is re-pointed with
/// [`DataRow::set_source`] between steps and cannot outlive the step it was lent for.
#[derive(Clone, Copy)]
pub struct DataRow<'a> {
    container: &'a dyn DataContainer,
    index: usize,
}

impl<'a> DataRow<'a> {
    pub fn new(container: &'a dyn DataContainer, index: usize) -> Self {
        Self { container, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn container(&self) -> &'a dyn DataContainer {
        self.container
    }

    /// Re-point this view at another row (and possibly another container).
    pub fn set_source(&mut self, container: &'a dyn DataContainer, index: usize) {
        self.container = container;
        self.index = index;
    }

    pub fn value_at(&self, column: usize) -> TableResult<&'a Value> {
        self.container.value_at(self.index, column)
    }

    /// Materialize the row, exactly one value per column. Short rows and null placeholder rows
    /// are padded with `Value::Null`; cells past the last column are dropped.
    pub fn values(&self) -> TableResult<Vec<Value>> {
        let columns = self.container.num_columns();
        match self.container.row_as_array(self.index)? {
            Some(values) => {
                let mut out = values[..values.len().min(columns)].to_vec();
                out.resize(columns, Value::Null);
                Ok(out)
            }
            None => Ok(vec![NULL_VALUE.clone(); self.container.num_columns()]),
        }
    }

    pub fn map<R, F>(&self, mut f: F) -> TableResult<Vec<R>>
    where
        F: FnMut(&'a Value, usize) -> R,
    {
        (0..self.container.num_columns())
            .map(|column| Ok(f(self.value_at(column)?, column)))
            .collect()
    }
}

impl PartialEq for DataRow<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(self.container, other.container) && self.index == other.index
    }
}

impl Eq for DataRow<'_> {}

impl fmt::Debug for DataRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataRow")
            .field("index", &self.index)
            .field("rows", &self.container.num_rows())
            .finish()
    }
}
