use crate::container::{check_row, DataContainer};
use crate::error::TableResult;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Read-only view over a parent container, restricted and reordered by an explicit row mask.
///
/// Row `i` of the view is row `mask[i]` of the parent. Mask entries are not checked up front; an
/// entry past the parent's end surfaces as the parent's out-of-bounds error on first access.
#[derive(Clone)]
pub struct MaskedDataContainer {
    parent: Arc<dyn DataContainer>,
    mask: Vec<usize>,
}

impl MaskedDataContainer {
    pub fn new(parent: Arc<dyn DataContainer>, mask: Vec<usize>) -> Self {
        Self { parent, mask }
    }

    pub fn parent(&self) -> &Arc<dyn DataContainer> {
        &self.parent
    }

    pub fn mask(&self) -> &[usize] {
        &self.mask
    }

    fn mapped_row(&self, row: usize) -> TableResult<usize> {
        check_row(row, self.mask.len())?;
        Ok(self.mask[row])
    }
}

impl DataContainer for MaskedDataContainer {
    fn num_rows(&self) -> usize {
        self.mask.len()
    }

    fn num_columns(&self) -> usize {
        self.parent.num_columns()
    }

    fn value_at(&self, row: usize, column: usize) -> TableResult<&Value> {
        self.parent.value_at(self.mapped_row(row)?, column)
    }

    fn row_as_array(&self, row: usize) -> TableResult<Option<&[Value]>> {
        self.parent.row_as_array(self.mapped_row(row)?)
    }
}

impl fmt::Debug for MaskedDataContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskedDataContainer")
            .field("rows", &self.mask.len())
            .field("parent_rows", &self.parent.num_rows())
            .finish()
    }
}
