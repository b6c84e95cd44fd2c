use tabula_table::TableError;

pub type FilterResult<T> = Result<T, FilterError>;

/// Hard failures. A filter that merely fails validation is not an error; see
/// [`crate::ValidatedFilter`].
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("invalid filter json: {0}")]
    Json(#[from] serde_json::Error),
}
