use pretty_assertions::assert_eq;
use tabula_filter::{
    Bin, Domain, Field, FieldType, Filter, FilterError, FilterType, FilterValue, Geometry,
    PlotType, Value,
};

#[test]
fn saved_range_filter_round_trips_byte_for_byte() {
    let json = r#"{"dataId":["ds"],"freeze":true,"id":"a1b2","fixedDomain":false,"enlarged":false,"isAnimating":false,"speed":1,"name":["value"],"type":"range","fieldIdx":[0],"domain":[1,96],"value":[2,50.5],"step":0.1,"plotType":"histogram","yAxis":null,"interval":null,"gpu":true}"#;

    let filter = Filter::from_json(json).unwrap();
    assert_eq!(filter.data_id, vec!["ds".to_string()]);
    assert_eq!(filter.filter_type, Some(FilterType::Range));
    assert_eq!(filter.field_idx, vec![Some(0)]);
    assert_eq!(filter.domain, Some(Domain::linear(1.0, 96.0)));
    assert_eq!(filter.value, Some(FilterValue::range(2.0, 50.5)));
    assert_eq!(filter.step, Some(0.1));
    assert_eq!(filter.plot_type, PlotType::Histogram);

    assert_eq!(filter.to_json().unwrap(), json);
}

#[test]
fn saved_polygon_filter_round_trips_byte_for_byte() {
    let json = r#"{"dataId":["points"],"freeze":false,"id":"abcd","fixedDomain":true,"enlarged":false,"isAnimating":false,"speed":1,"name":["points"],"type":"polygon","fieldIdx":[],"domain":null,"value":{"type":"Feature","id":"poly","properties":{"filterId":"abcd","isVisible":true},"geometry":{"type":"Polygon","coordinates":[[[0,0],[4,0],[4,4],[0,4],[0,0]]]}},"plotType":"histogram","yAxis":null,"interval":null,"gpu":false,"layerId":["layer"]}"#;

    let filter = Filter::from_json(json).unwrap();
    let feature = filter
        .value
        .as_ref()
        .and_then(FilterValue::as_feature)
        .expect("polygon value");
    assert_eq!(feature.id, "poly");
    assert!(matches!(&feature.geometry, Geometry::Polygon(rings) if rings[0].len() == 5));
    assert_eq!(filter.layer_id, vec!["layer".to_string()]);

    assert_eq!(filter.to_json().unwrap(), json);
}

#[test]
fn single_ids_and_names_are_accepted() {
    let filter =
        Filter::from_json(r#"{"dataId":"ds","id":"x","name":"city","type":"multiSelect","value":["a","b"]}"#)
            .unwrap();
    assert_eq!(filter.data_id, vec!["ds".to_string()]);
    assert_eq!(filter.name, vec!["city".to_string()]);
    assert_eq!(filter.speed, 1.0);
    assert_eq!(
        filter.value,
        Some(FilterValue::List(vec![Value::from("a"), Value::from("b")]))
    );
}

#[test]
fn unknown_filter_types_are_rejected() {
    let err = Filter::from_json(r#"{"dataId":["ds"],"type":"input"}"#).unwrap_err();
    assert!(matches!(err, FilterError::Json(_)));
}

#[test]
fn missing_type_decodes_as_untyped() {
    let filter = Filter::from_json(r#"{"dataId":["ds"],"type":null,"value":null}"#).unwrap();
    assert_eq!(filter.filter_type, None);
    assert_eq!(filter.value, None);
}

#[test]
fn domains_decode_by_shape() {
    let ordinal: Domain = serde_json::from_str(r#"["a","b"]"#).unwrap();
    assert_eq!(
        ordinal,
        Domain::Ordinal(vec![Value::from("a"), Value::from("b")])
    );
    let booleans: Domain = serde_json::from_str("[true,false]").unwrap();
    assert_eq!(
        booleans,
        Domain::Ordinal(vec![Value::from(true), Value::from(false)])
    );
    let linear: Domain = serde_json::from_str("[0.5,3]").unwrap();
    assert_eq!(linear, Domain::linear(0.5, 3.0));
    assert_eq!(serde_json::to_string(&linear).unwrap(), "[0.5,3]");
}

#[test]
fn bins_and_fields_use_camel_case() {
    let bin = Bin {
        count: 2,
        range_start: 0.0,
        range_end: 2.5,
    };
    assert_eq!(
        serde_json::to_string(&bin).unwrap(),
        r#"{"count":2,"rangeStart":0,"rangeEnd":2.5}"#
    );

    let field = Field::new("time", FieldType::Timestamp, 3).with_format("x");
    assert_eq!(
        serde_json::to_string(&field).unwrap(),
        r#"{"name":"time","type":"timestamp","format":"x","tableFieldIndex":3}"#
    );
    let decoded: Field = serde_json::from_str(r#"{"name":"n","type":"real"}"#).unwrap();
    assert_eq!(decoded, Field::new("n", FieldType::Real, 0));
}

#[test]
fn two_number_ordinal_domains_survive_a_round_trip() {
    let filter = Filter {
        data_id: vec!["ds".to_string()],
        id: "codes".to_string(),
        name: vec!["code".to_string()],
        filter_type: Some(FilterType::MultiSelect),
        field_idx: vec![Some(0)],
        field_type: Some(FieldType::String),
        domain: Some(Domain::Ordinal(vec![Value::from(1), Value::from(2)])),
        value: Some(FilterValue::List(vec![Value::from(2)])),
        ..Filter::default()
    };

    let json = filter.to_json().unwrap();
    assert!(json.contains(r#""domain":[1,2]"#));
    assert_eq!(Filter::from_json(&json).unwrap(), filter);

    let untyped_field =
        Filter::from_json(r#"{"dataId":["ds"],"type":"multiSelect","domain":[3,4]}"#).unwrap();
    assert_eq!(
        untyped_field.domain,
        Some(Domain::Ordinal(vec![Value::from(3), Value::from(4)]))
    );

    let range = Filter::from_json(r#"{"dataId":["ds"],"type":"range","domain":[3,4]}"#).unwrap();
    assert_eq!(range.domain, Some(Domain::linear(3.0, 4.0)));
}
