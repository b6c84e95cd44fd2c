use pretty_assertions::assert_eq;
use tabula_table::{
    create_data_container, ContainerOptions, DataContainer, DataContainerExt, DataRow,
    TableError, Value,
};

fn rows() -> Vec<Vec<Value>> {
    vec![
        vec![Value::from(1), Value::from("a"), Value::from(true)],
        vec![Value::from(2), Value::from("b"), Value::from(false)],
        vec![Value::from(3), Value::Null, Value::from(true)],
    ]
}

#[test]
fn reads_cells_by_position() {
    let dc = create_data_container(rows(), ContainerOptions::default()).unwrap();
    assert_eq!(dc.num_rows(), 3);
    assert_eq!(dc.num_columns(), 3);
    assert_eq!(dc.value_at(1, 1).unwrap(), &Value::from("b"));
    assert_eq!(dc.value_at(2, 1).unwrap(), &Value::Null);
}

#[test]
fn out_of_bounds_reads_fail() {
    let dc = create_data_container(rows(), ContainerOptions::default()).unwrap();
    assert_eq!(
        dc.value_at(3, 0),
        Err(TableError::RowOutOfBounds { row: 3, rows: 3 })
    );
    assert_eq!(
        dc.value_at(0, 3),
        Err(TableError::ColumnOutOfBounds {
            column: 3,
            columns: 3
        })
    );
    assert!(dc.row(5).is_err());
}

#[test]
fn empty_rows_cannot_create_a_container() {
    let rows: Vec<Vec<Value>> = Vec::new();
    assert_eq!(
        create_data_container(rows, ContainerOptions { num_fields: Some(2) }).unwrap_err(),
        TableError::EmptyData
    );
}

#[test]
fn null_rows_read_as_null() {
    let dc = create_data_container(
        vec![Some(vec![Value::from(1), Value::from(2)]), None],
        ContainerOptions::default(),
    )
    .unwrap();
    assert_eq!(dc.value_at(1, 0).unwrap(), &Value::Null);
    assert_eq!(dc.row_as_array(1).unwrap(), None);
    assert_eq!(
        dc.row(1).unwrap().values().unwrap(),
        vec![Value::Null, Value::Null]
    );
}

#[test]
fn ragged_rows_pad_with_null() {
    let dc = create_data_container(
        vec![vec![Value::from(1)]],
        ContainerOptions { num_fields: Some(2) },
    )
    .unwrap();
    assert_eq!(dc.value_at(0, 1).unwrap(), &Value::Null);
    assert_eq!(
        dc.row(0).unwrap().values().unwrap(),
        vec![Value::from(1), Value::Null]
    );
}

#[test]
fn cells_past_the_last_column_are_not_materialized() {
    let dc = create_data_container(
        vec![vec![Value::from(1), Value::from(2), Value::from(3)]],
        ContainerOptions { num_fields: Some(2) },
    )
    .unwrap();
    assert_eq!(
        dc.value_at(0, 2),
        Err(TableError::ColumnOutOfBounds {
            column: 2,
            columns: 2
        })
    );
    assert_eq!(
        dc.row(0).unwrap().values().unwrap(),
        vec![Value::from(1), Value::from(2)]
    );
}

#[test]
fn rows_and_columns_restart_on_each_call() {
    let dc = create_data_container(rows(), ContainerOptions::default()).unwrap();
    let first: Vec<usize> = dc.rows().map(|r| r.index()).collect();
    let second: Vec<usize> = dc.rows().map(|r| r.index()).collect();
    assert_eq!(first, vec![0, 1, 2]);
    assert_eq!(first, second);

    let column: Vec<Value> = dc
        .column(0)
        .unwrap()
        .map(|v| v.cloned())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(column, vec![Value::from(1), Value::from(2), Value::from(3)]);
    assert_eq!(dc.column(0).unwrap().len(), 3);
    assert!(dc.column(9).is_err());
}

#[test]
fn map_range_clamps_end() {
    let dc = create_data_container(rows(), ContainerOptions::default()).unwrap();
    let mapped = dc
        .map_range(1..10, |row, index| {
            Ok((index, row.value_at(0)?.as_f64().unwrap_or_default()))
        })
        .unwrap();
    assert_eq!(mapped, vec![(1, 2.0), (2, 3.0)]);

    let shared = dc
        .map_shared(0..2, |row, _| Ok(row.value_at(1)?.clone()))
        .unwrap();
    assert_eq!(shared, vec![Value::from("a"), Value::from("b")]);
}

#[test]
fn exclusive_rows_can_be_retained() {
    let dc = create_data_container(rows(), ContainerOptions::default()).unwrap();
    let retained: Vec<DataRow<'_>> = dc.map(|row, _| Ok(row)).unwrap();
    assert_eq!(retained[2].value_at(0).unwrap(), &Value::from(3));
    assert_eq!(retained[0], dc.row(0).unwrap());
    assert_ne!(retained[0], retained[1]);
}

#[test]
fn find_returns_an_independent_row() {
    let dc = create_data_container(rows(), ContainerOptions::default()).unwrap();
    let found = dc
        .find(|row, _| Ok(row.value_at(1)? == &Value::from("b")))
        .unwrap()
        .unwrap();
    assert_eq!(found.index(), 1);
    assert_eq!(found.value_at(0).unwrap(), &Value::from(2));

    let missing = dc.find(|row, _| Ok(row.value_at(0)?.as_f64() == Some(42.0)));
    assert_eq!(missing.unwrap(), None);
}

#[test]
fn reduce_flatten_and_plain_index() {
    let dc = create_data_container(rows(), ContainerOptions::default()).unwrap();
    let sum = dc
        .reduce(0.0, |acc, row, _| {
            Ok(acc + row.value_at(0)?.as_f64().unwrap_or_default())
        })
        .unwrap();
    assert_eq!(sum, 6.0);
    assert_eq!(
        dc.flatten_data().unwrap(),
        rows().into_iter().map(Some).collect::<Vec<_>>()
    );
    assert_eq!(dc.plain_index(), vec![0, 1, 2]);
}

#[test]
fn shared_row_can_be_repointed() {
    let a = create_data_container(rows(), ContainerOptions::default()).unwrap();
    let b = create_data_container(
        vec![vec![Value::from("x")]],
        ContainerOptions::default(),
    )
    .unwrap();
    let mut row = a.row(0).unwrap();
    assert_eq!(row.value_at(0).unwrap(), &Value::from(1));
    row.set_source(&b, 0);
    assert_eq!(row.value_at(0).unwrap(), &Value::from("x"));
    assert_eq!(
        row.map(|v, column| format!("{column}:{v}")).unwrap(),
        vec!["0:x".to_string()]
    );
}

#[test]
fn works_through_trait_objects() {
    let dc = create_data_container(rows(), ContainerOptions::default()).unwrap();
    let dynamic: &dyn DataContainer = &dc;
    assert_eq!(dynamic.rows().count(), 3);
    assert_eq!(dynamic.row(2).unwrap().value_at(2).unwrap(), &Value::from(true));
}
