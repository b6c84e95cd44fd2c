use pretty_assertions::assert_eq;
use tabula_filter::{
    field_domain, filter_props, format_number_by_step, histogram_construct, is_in_range,
    numeric_field_domain, ordinal_domain, time_widget_hint_formatter, time_widget_title_formatter,
    Bin, Bound, Dataset, Domain, DomainOptions, Field, FieldType, FilterType, FilterValue, Value,
};

fn single_column(field: Field, values: Vec<Value>) -> Dataset {
    let rows = values.into_iter().map(|v| vec![v]).collect();
    Dataset::from_rows("ds", vec![field], rows).unwrap()
}

fn integer_field() -> Field {
    Field::new("value", FieldType::Integer, 1)
}

fn numbers(values: &[f64]) -> Vec<Value> {
    values.iter().map(|&v| Value::from(v)).collect()
}

#[test]
fn wide_integer_field_keeps_default_step() {
    let ds = single_column(integer_field(), numbers(&[1.0, 5.0, 10.0, 50.0, 96.0]));
    let domain = field_domain(
        ds.data_container.as_ref(),
        &ds.fields[0],
        DomainOptions::default(),
    )
    .unwrap();

    assert_eq!(domain.domain, Domain::linear(1.0, 96.0));
    assert_eq!(domain.step, Some(0.1));
    assert_eq!(domain.histogram.len(), 30);
    assert_eq!(domain.enlarged_histogram.len(), 100);
    assert_eq!(domain.histogram.iter().map(|b| b.count).sum::<usize>(), 5);
    assert_eq!(
        domain.enlarged_histogram.iter().map(|b| b.count).sum::<usize>(),
        5
    );
    assert_eq!(domain.mapped_value, None);
}

#[test]
fn very_wide_domains_round_outward_to_whole_numbers() {
    let domain = numeric_field_domain(&[Some(0.5), Some(150.2)], DomainOptions::default());
    assert_eq!(domain.domain, Domain::linear(0.0, 151.0));
    assert_eq!(domain.step, Some(1.0));
}

#[test]
fn medium_domains_use_hundredths() {
    let domain = numeric_field_domain(&[Some(1.234), Some(10.5678)], DomainOptions::default());
    assert_eq!(domain.domain, Domain::linear(1.23, 10.57));
    assert_eq!(domain.step, Some(0.01));
}

#[test]
fn constant_field_widens_by_one() {
    let ds = single_column(integer_field(), numbers(&[5.0, 5.0, 5.0]));
    let domain = field_domain(
        ds.data_container.as_ref(),
        &ds.fields[0],
        DomainOptions::default(),
    )
    .unwrap();
    assert_eq!(domain.domain, Domain::linear(5.0, 6.0));
    assert_eq!(domain.step, Some(0.001));
}

#[test]
fn nulls_and_text_are_ignored_in_numeric_domains() {
    let ds = single_column(
        Field::new("value", FieldType::Real, 1),
        vec![Value::Null, Value::from(2.0), Value::from("x"), Value::from(4.0)],
    );
    let domain = field_domain(
        ds.data_container.as_ref(),
        &ds.fields[0],
        DomainOptions::default(),
    )
    .unwrap();
    assert_eq!(domain.domain, Domain::linear(2.0, 4.0));
    assert_eq!(domain.histogram.iter().map(|b| b.count).sum::<usize>(), 2);
}

#[test]
fn field_without_numbers_falls_back_to_unit_domain() {
    let domain = numeric_field_domain(&[None, None], DomainOptions::default());
    assert_eq!(domain.domain, Domain::linear(0.0, 1.0));
    assert_eq!(domain.step, Some(0.1));
    assert!(domain.histogram.iter().all(|b| b.count == 0));
}

#[test]
fn timestamp_domain_keeps_mapped_values() {
    let field = Field::new("time", FieldType::Timestamp, 1).with_format("YYYY-M-D H:m:s");
    let ds = single_column(
        field,
        vec![
            Value::from("2016-09-17 00:09:55"),
            Value::from("2016-09-17 00:30:08"),
            Value::Null,
            Value::from("2016-09-17 00:10:56"),
        ],
    );
    let domain = field_domain(
        ds.data_container.as_ref(),
        &ds.fields[0],
        DomainOptions::default(),
    )
    .unwrap();

    assert_eq!(
        domain.domain,
        Domain::linear(1_474_070_995_000.0, 1_474_072_208_000.0)
    );
    assert_eq!(domain.step, Some(1000.0));
    assert_eq!(
        domain.mapped_value.as_deref(),
        Some(&vec![
            Some(1_474_070_995_000.0),
            Some(1_474_072_208_000.0),
            None,
            Some(1_474_071_056_000.0),
        ])
    );
    assert_eq!(domain.histogram.iter().map(|b| b.count).sum::<usize>(), 3);
}

#[test]
fn short_timestamp_spans_use_fine_steps() {
    let ds = single_column(
        Field::new("time", FieldType::Timestamp, 1),
        numbers(&[1000.0, 1000.5]),
    );
    let domain = field_domain(
        ds.data_container.as_ref(),
        &ds.fields[0],
        DomainOptions::default(),
    )
    .unwrap();
    assert_eq!(domain.step, Some(0.05));
}

#[test]
fn string_domains_are_sorted_and_distinct() {
    let ds = single_column(
        Field::new("city", FieldType::String, 1),
        vec![
            Value::from("b"),
            Value::from("a"),
            Value::Null,
            Value::from("b"),
            Value::from("c"),
        ],
    );
    let domain = field_domain(
        ds.data_container.as_ref(),
        &ds.fields[0],
        DomainOptions::default(),
    )
    .unwrap();
    assert_eq!(
        domain.domain,
        Domain::Ordinal(vec![Value::from("a"), Value::from("b"), Value::from("c")])
    );
    assert_eq!(domain.step, None);
    assert!(domain.histogram.is_empty());
}

#[test]
fn boolean_domain_is_fixed() {
    let ds = single_column(
        Field::new("flag", FieldType::Boolean, 1),
        vec![Value::from(false), Value::from(false)],
    );
    let domain = field_domain(
        ds.data_container.as_ref(),
        &ds.fields[0],
        DomainOptions::default(),
    )
    .unwrap();
    assert_eq!(
        domain.domain,
        Domain::Ordinal(vec![Value::from(true), Value::from(false)])
    );
}

#[test]
fn histogram_buckets_values_into_equal_bins() {
    let bins = histogram_construct(
        [0.0, 10.0],
        [0.0, 1.0, 5.0, 9.99, 10.0, 11.0, -1.0],
        5,
    );
    assert_eq!(
        bins.iter().map(|b| b.count).collect::<Vec<_>>(),
        vec![2, 0, 1, 0, 2]
    );
    assert_eq!(
        bins[2],
        Bin {
            count: 1,
            range_start: 4.0,
            range_end: 6.0
        }
    );
    assert_eq!(bins[4].range_end, 10.0);
    assert!(histogram_construct([0.0, 1.0], [0.5], 0).is_empty());
}

#[test]
fn custom_bin_counts_are_honoured() {
    let options = DomainOptions {
        histogram_bins: 4,
        enlarged_histogram_bins: 8,
    };
    let domain = numeric_field_domain(&[Some(0.0), Some(2.0)], options);
    assert_eq!(domain.histogram.len(), 4);
    assert_eq!(domain.enlarged_histogram.len(), 8);
}

#[test]
fn filter_props_follow_field_type() {
    let ds = Dataset::from_rows(
        "ds",
        vec![
            Field::new("value", FieldType::Integer, 1),
            Field::new("flag", FieldType::Boolean, 2),
            Field::new("city", FieldType::String, 3),
            Field::new("time", FieldType::Timestamp, 4),
        ],
        vec![
            vec![
                Value::from(1),
                Value::from(true),
                Value::from("a"),
                Value::from(1000.0),
            ],
            vec![
                Value::from(3),
                Value::from(false),
                Value::from("b"),
                Value::from(2000.0),
            ],
        ],
    )
    .unwrap();
    let container = ds.data_container.as_ref();
    let options = DomainOptions::default();

    let range = filter_props(container, &ds.fields[0], options).unwrap();
    assert_eq!(range.filter_type, FilterType::Range);
    assert_eq!(range.value, FilterValue::range(1.0, 3.0));
    assert!(range.gpu);
    assert!(!range.fixed_domain);

    let select = filter_props(container, &ds.fields[1], options).unwrap();
    assert_eq!(select.filter_type, FilterType::Select);
    assert_eq!(select.value, FilterValue::Bool(true));
    assert!(!select.gpu);

    let multi = filter_props(container, &ds.fields[2], options).unwrap();
    assert_eq!(multi.filter_type, FilterType::MultiSelect);
    assert_eq!(multi.value, FilterValue::List(Vec::new()));
    assert!(!multi.gpu);

    let time = filter_props(container, &ds.fields[3], options).unwrap();
    assert_eq!(time.filter_type, FilterType::TimeRange);
    assert_eq!(time.value, FilterValue::range(1000.0, 2000.0));
    assert!(time.gpu);
    assert!(time.fixed_domain);
    assert!(time.enlarged);
}

#[test]
fn field_past_the_last_column_is_an_error() {
    let ds = single_column(integer_field(), numbers(&[1.0]));
    let field = Field::new("ghost", FieldType::Integer, 5);
    assert!(field_domain(ds.data_container.as_ref(), &field, DomainOptions::default()).is_err());
}

#[test]
fn rounding_by_step() {
    assert_eq!(format_number_by_step(1.234, 0.01, Bound::Floor), 1.23);
    assert_eq!(format_number_by_step(1.234, 0.01, Bound::Ceil), 1.24);
    assert_eq!(format_number_by_step(96.0, 1.0, Bound::Ceil), 96.0);
    assert_eq!(format_number_by_step(-0.5, 1.0, Bound::Floor), -1.0);
}

#[test]
fn range_checks_are_inclusive() {
    assert!(is_in_range(1.0, [1.0, 5.0]));
    assert!(is_in_range(5.0, [1.0, 5.0]));
    assert!(!is_in_range(5.1, [1.0, 5.0]));
}

#[test]
fn ordinal_domain_drops_nulls() {
    let values = [Value::from(2), Value::Null, Value::from(1), Value::from(2)];
    assert_eq!(ordinal_domain(&values), vec![Value::from(1), Value::from(2)]);
}

#[test]
fn time_widget_formats_depend_on_span() {
    const HOUR: f64 = 3_600_000.0;
    const DAY: f64 = HOUR * 24.0;

    assert_eq!(time_widget_title_formatter([0.0, 400.0 * DAY]), "MM/DD/YY");
    assert_eq!(time_widget_title_formatter([0.0, 2.0 * DAY]), "MM/DD/YY hh:mma");
    assert_eq!(time_widget_title_formatter([0.0, 2.0 * HOUR]), "MM/DD/YY hh:mm:ssa");

    assert_eq!(time_widget_hint_formatter([0.0, 400.0 * DAY]), "MM/DD/YY");
    assert_eq!(time_widget_hint_formatter([0.0, 10.0 * DAY]), "MM/DD");
    assert_eq!(time_widget_hint_formatter([0.0, 2.0 * DAY]), "MM/DD hha");
    assert_eq!(time_widget_hint_formatter([0.0, 2.0 * HOUR]), "hh:mma");
    assert_eq!(time_widget_hint_formatter([0.0, 60_000.0]), "hh:mm:ssa");
}
