//! Row-oriented data containers for Tabula datasets.
//!
//! This crate focuses on:
//! - A uniform positional accessor ([`DataContainer`]) over row data and over masked views.
//! - Lazy row views ([`DataRow`]) that never copy cell data.
//! - Traversals ([`DataContainerExt`]) that either hand out independent rows or lend a single
//!   re-pointed row per step to avoid per-row work on large scans.

#![forbid(unsafe_code)]

mod container;
mod error;
mod masked;
mod row;
mod row_container;
mod value;

pub use crate::container::{AsDataContainer, ColumnValues, DataContainer, DataContainerExt, Rows};
pub use crate::error::{TableError, TableResult};
pub use crate::masked::MaskedDataContainer;
pub use crate::row::DataRow;
pub use crate::row_container::RowDataContainer;
pub use crate::value::{serialize_number, Value};

use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerOptions {
    /// Number of dataset fields; when absent the first row's length is used.
    pub num_fields: Option<usize>,
}

/// Create a concrete container from raw rows. Fails when there are no rows or no columns.
///
/// Accepts plain rows (`Vec<Value>`) or nullable rows (`Option<Vec<Value>>`).
pub fn create_data_container<R>(
    rows: impl IntoIterator<Item = R>,
    options: ContainerOptions,
) -> TableResult<RowDataContainer>
where
    R: Into<Option<Vec<Value>>>,
{
    let rows: Vec<Option<Vec<Value>>> = rows.into_iter().map(Into::into).collect();
    if rows.is_empty() {
        return Err(TableError::EmptyData);
    }
    RowDataContainer::new(rows, options.num_fields)
}

pub fn create_masked_data_container(
    parent: Arc<dyn DataContainer>,
    mask: Vec<usize>,
) -> MaskedDataContainer {
    MaskedDataContainer::new(parent, mask)
}
