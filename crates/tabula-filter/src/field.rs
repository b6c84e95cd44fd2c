use crate::domain::FilterProps;
use crate::error::FilterResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tabula_table::{create_data_container, ContainerOptions, DataContainer, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Real,
    Boolean,
    String,
    Date,
    Timestamp,
}

impl FieldType {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Real)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldType::Integer => "integer",
            FieldType::Real => "real",
            FieldType::Boolean => "boolean",
            FieldType::String => "string",
            FieldType::Date => "date",
            FieldType::Timestamp => "timestamp",
        })
    }
}

/// A dataset column.
///
/// `filter_props` caches the field's domain and default filter settings. It is only ever filled
/// in by replacing the field (see [`Field::with_filter_props`]) and is not persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// 1-based column position.
    #[serde(default)]
    pub table_field_index: usize,
    #[serde(skip)]
    pub filter_props: Option<Arc<FilterProps>>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType, table_field_index: usize) -> Self {
        Self {
            name: name.into(),
            field_type,
            format: None,
            table_field_index,
            filter_props: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// 0-based column index in the data container.
    pub fn column(&self) -> usize {
        self.table_field_index.saturating_sub(1)
    }

    pub fn with_filter_props(&self, props: Arc<FilterProps>) -> Self {
        Self {
            filter_props: Some(props),
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug)]
pub struct Dataset {
    pub id: String,
    pub fields: Vec<Field>,
    pub data_container: Arc<dyn DataContainer>,
}

impl Dataset {
    pub fn new(
        id: impl Into<String>,
        fields: Vec<Field>,
        data_container: Arc<dyn DataContainer>,
    ) -> Self {
        Self {
            id: id.into(),
            fields,
            data_container,
        }
    }

    /// Build a dataset over a fresh row container sized to `fields`.
    pub fn from_rows(
        id: impl Into<String>,
        fields: Vec<Field>,
        rows: Vec<Vec<Value>>,
    ) -> FilterResult<Self> {
        let container = create_data_container(
            rows,
            ContainerOptions {
                num_fields: Some(fields.len()),
            },
        )?;
        Ok(Self::new(id, fields, Arc::new(container)))
    }

    pub fn num_rows(&self) -> usize {
        self.data_container.num_rows()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field stored at 0-based container column `column`.
    pub fn field_for_column(&self, column: usize) -> Option<&Field> {
        self.fields.iter().find(|f| f.column() == column)
    }
}
