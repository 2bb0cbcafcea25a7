use morphcore::{CompatibilityTable, DataContainer, GeoValue, TriMesh, TypeTag};
use std::sync::Arc;

#[test]
fn store_derives_tag_from_value() {
    let points = DataContainer::store(vec![[1.0, 2.0, 3.0]]);
    assert_eq!(points.tag(), TypeTag::coords());

    let mesh = DataContainer::store(TriMesh::default());
    assert_eq!(mesh.tag(), TypeTag::mesh());

    let text = DataContainer::store("hello");
    assert_eq!(text.tag(), TypeTag::text());
}

#[test]
fn single_points_store_distinctly_from_sequences() {
    let point = DataContainer::store([1.0, 2.0, 3.0]);
    assert_eq!(point.tag(), TypeTag::point());
    assert_eq!(point.as_point().expect("stored as point"), [1.0, 2.0, 3.0]);

    // A one-element sequence keeps the sequence tag.
    let single = DataContainer::store(vec![[1.0, 2.0, 3.0]]);
    assert_eq!(single.tag(), TypeTag::coords());
    assert!(single.as_point().is_err());
}

#[test]
fn retrieval_checks_tag_equality() {
    let container = DataContainer::store(vec![[1.0, 2.0, 3.0]]);

    let coords = container.as_coords().expect("stored as coords");
    assert_eq!(coords.len(), 1);

    let err = container.as_mesh().expect_err("wrong tag must fail");
    assert_eq!(err.expected, TypeTag::mesh());
    assert_eq!(err.actual, TypeTag::coords());
}

#[test]
fn clones_share_the_stored_payload() {
    let original = DataContainer::store(vec![[0.0, 0.0, 0.0]; 1000]);
    let clone = original.clone();
    assert!(std::ptr::eq(original.value(), clone.value()));
}

#[test]
fn exact_tag_equality_is_always_compatible() {
    let table = CompatibilityTable::new();
    assert!(table.is_compatible(TypeTag::mesh(), TypeTag::mesh()));
    assert!(table.is_compatible(TypeTag::coords(), TypeTag::coords()));
}

#[test]
fn undeclared_pair_is_rejected_not_panicked() {
    let table = CompatibilityTable::standard();
    assert!(!table.is_compatible(TypeTag::coords(), TypeTag::mesh()));
    assert!(!table.is_compatible(TypeTag::text(), TypeTag::real()));

    let container = DataContainer::store("not a mesh");
    assert!(table.convert(&container, TypeTag::mesh()).is_none());
}

#[test]
fn standard_table_converts_sequences_to_keyed_fields() {
    let table = CompatibilityTable::standard();
    let container = DataContainer::store(vec![[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);

    let converted = table
        .convert(&container, TypeTag::coord_field())
        .expect("declared conversion");
    let field = converted.as_coord_field().expect("keyed after conversion");
    assert_eq!(field.len(), 2);
    assert_eq!(field[&0], [1.0, 0.0, 0.0]);
    assert_eq!(field[&1], [2.0, 0.0, 0.0]);
}

#[test]
fn standard_table_widens_int_to_real() {
    let table = CompatibilityTable::standard();
    let container = DataContainer::store(7i64);

    let converted = table
        .convert(&container, TypeTag::real())
        .expect("declared conversion");
    assert_eq!(converted.as_real().expect("real after conversion"), 7.0);
}

#[test]
fn custom_rows_can_be_declared() {
    let mut table = CompatibilityTable::new();
    table.declare(
        TypeTag::real(),
        TypeTag::text(),
        Some(Arc::new(|v| match v {
            GeoValue::Real(n) => GeoValue::Text(n.to_string()),
            other => other.clone(),
        })),
    );

    assert!(table.is_compatible(TypeTag::real(), TypeTag::text()));
    let converted = table
        .convert(&DataContainer::store(1.5), TypeTag::text())
        .expect("custom conversion");
    assert_eq!(converted.as_text().expect("text"), "1.5");
}
