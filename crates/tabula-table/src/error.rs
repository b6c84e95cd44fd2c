pub type TableResult<T> = Result<T, TableError>;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("row {row} out of bounds for a container with {rows} rows")]
    RowOutOfBounds { row: usize, rows: usize },

    #[error("column {column} out of bounds for a container with {columns} columns")]
    ColumnOutOfBounds { column: usize, columns: usize },

    #[error("failed to create a data container: no rows")]
    EmptyData,

    #[error("failed to create a data container: no fields")]
    NoColumns,
}
