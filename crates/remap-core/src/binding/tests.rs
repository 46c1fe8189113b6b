use crate::{
    binding::{
        BindingContext, BindingKind, FieldGraphPath, PairKind, TypeBindingBuilder, match_paths,
        read_field_transform,
    },
    config::{MapperConfig, NameStyle},
    model::{TypeKey, TypeRegistry},
    runtime::{CursorState, DataModelReader, ObjectReader},
    value::Value,
};
use remap_derive::Model;
use std::sync::Arc;

// ---- models ------------------------------------------------------------

#[derive(Debug, Default, Model)]
struct Flat {
    sub_property: String,
}

#[derive(Debug, Default, Model)]
struct Sub {
    property: String,
    mismatched: String,
}

#[derive(Debug, Default, Model)]
struct Nested {
    sub: Sub,
}

#[derive(Debug, Default, Model)]
struct Source {
    sub: Sub,
    other: String,
    count: u32,
}

#[derive(Debug, Default, Model)]
struct Target {
    sub: Sub,
    #[model(read_only)]
    locked: String,
    count: String,
}

#[derive(Debug, Default, Model)]
#[allow(non_snake_case)]
struct PascalFlat {
    SubProperty: String,
}

#[derive(Debug, Default, Model)]
#[allow(non_snake_case)]
struct PascalSub {
    Property: String,
}

#[derive(Debug, Default, Model)]
#[allow(non_snake_case)]
struct PascalNested {
    Sub: PascalSub,
}

#[derive(Debug, Default, Model)]
struct Inner {
    b: String,
}

#[derive(Debug, Default, Model)]
struct UpperValue {
    #[model(rename = "Value")]
    value: String,
}

#[derive(Debug, Default, Model)]
struct LowerValue {
    #[model(rename = "value")]
    value: String,
}

#[derive(Debug, Default, Model)]
struct TieSource {
    a: Inner,
    a_b: String,
}

#[derive(Debug, Default, Model)]
struct TieTarget {
    a_b: String,
}

#[derive(Debug, Default, Model)]
struct Recurse {
    value: u32,
    recurse: Option<Box<Recurse>>,
}

#[derive(Debug, Default, Model)]
struct Address {
    city: String,
}

#[derive(Debug, Default, Model)]
struct AddressView {
    city: String,
}

#[derive(Debug, Default, Model)]
struct Person {
    friends: Vec<Address>,
}

#[derive(Debug, Default, Model)]
struct PersonView {
    friends: Vec<AddressView>,
}

#[derive(Debug, Default, Model)]
struct Node {
    label: String,
    children: Vec<Node>,
}

#[derive(Debug, Default, Model)]
struct Geo {
    lat: f64,
}

#[derive(Debug, Default, Model)]
#[model(computed(name = "geo", get = "Self::geo"), computed(name = "label", get = "Self::label"))]
struct Computed {
    raw: f64,
}

impl Computed {
    fn geo(&self) -> Geo {
        Geo { lat: self.raw }
    }

    fn label(&self) -> String {
        format!("{:.1}", self.raw)
    }
}

#[derive(Debug, Default, Model)]
struct Holder {
    geo: Geo,
    label: String,
}

fn targets(binding: &crate::binding::DataModelBinding) -> Vec<String> {
    binding
        .bindings()
        .iter()
        .map(|binding| binding.target().to_string())
        .collect()
}

fn source_of(binding: &crate::binding::DataModelBinding, target: &str) -> String {
    binding
        .binding_for(target)
        .map(|binding| binding.source().to_string())
        .unwrap_or_default()
}

// ---- paths -------------------------------------------------------------

#[test]
fn paths_parse_and_render_dotted() {
    let types = TypeRegistry::new();
    let path = FieldGraphPath::parse(&types, TypeKey::of::<Nested>(), "sub.property").unwrap();

    assert_eq!(path.to_string(), "sub.property");
    assert_eq!(path.len(), 2);
    assert_eq!(path.end_type(), TypeKey::of::<String>());
    assert_eq!(path.flatten_key(NameStyle::Exact), "sub_property");
    assert_eq!(path.flatten_key(NameStyle::Snake), "sub_property");

    let root = FieldGraphPath::root_of(TypeKey::of::<Nested>());
    assert_eq!(root.to_string(), "<root>");
    assert!(path.starts_with(&root));
    assert!(path.overlaps(&root));
}

#[test]
fn path_errors_separate_lookup_from_contract() {
    let types = TypeRegistry::new();
    let root = TypeKey::of::<Source>();

    let missing = FieldGraphPath::parse(&types, root, "sub.nope").unwrap_err();
    assert!(missing.is_not_found());

    let through_scalar = FieldGraphPath::parse(&types, root, "other.len").unwrap_err();
    assert!(through_scalar.is_contract_violation());
}

#[test]
fn paths_do_not_descend_through_computed_members() {
    let types = TypeRegistry::new();

    let err = FieldGraphPath::parse(&types, TypeKey::of::<Computed>(), "geo.lat").unwrap_err();
    assert!(err.is_contract_violation());

    let whole = FieldGraphPath::parse(&types, TypeKey::of::<Computed>(), "geo").unwrap();
    assert_eq!(whole.len(), 1);
}

#[test]
fn paths_join_only_where_they_meet() {
    let types = TypeRegistry::new();
    let prefix = FieldGraphPath::parse(&types, TypeKey::of::<Nested>(), "sub").unwrap();
    let suffix = FieldGraphPath::parse(&types, TypeKey::of::<Sub>(), "property").unwrap();

    let joined = prefix.join(&suffix).unwrap();
    assert_eq!(joined.to_string(), "sub.property");
    assert_eq!(joined.root(), TypeKey::of::<Nested>());

    assert!(suffix.join(&prefix).unwrap_err().is_contract_violation());
}

// ---- matching ----------------------------------------------------------

#[test]
fn flattened_source_matches_nested_target() {
    let types = TypeRegistry::new();
    let config = MapperConfig::default();

    let matches =
        match_paths(&types, TypeKey::of::<Flat>(), TypeKey::of::<Nested>(), &config).unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].source.to_string(), "sub_property");
    assert_eq!(matches[0].target.to_string(), "sub.property");
    assert_eq!(matches[0].kind, PairKind::Value);
}

#[test]
fn matching_is_symmetric() {
    let types = TypeRegistry::new();
    let config = MapperConfig::default();

    let matches =
        match_paths(&types, TypeKey::of::<Nested>(), TypeKey::of::<Flat>(), &config).unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].source.to_string(), "sub.property");
    assert_eq!(matches[0].target.to_string(), "sub_property");
}

#[test]
fn max_depth_stops_descent() {
    let types = TypeRegistry::new();
    let config = MapperConfig::default().with_max_depth(1);

    let matches =
        match_paths(&types, TypeKey::of::<Flat>(), TypeKey::of::<Nested>(), &config).unwrap();

    assert!(matches.is_empty());
}

#[test]
fn default_style_matches_names_exactly() {
    let types = TypeRegistry::new();
    let config = MapperConfig::default();

    let matches = match_paths(
        &types,
        TypeKey::of::<UpperValue>(),
        TypeKey::of::<LowerValue>(),
        &config,
    )
    .unwrap();
    assert!(matches.is_empty());

    let matches = match_paths(
        &types,
        TypeKey::of::<PascalFlat>(),
        TypeKey::of::<PascalNested>(),
        &config,
    )
    .unwrap();
    assert!(matches.is_empty());
}

#[test]
fn snake_style_folds_case_when_requested() {
    let types = TypeRegistry::new();
    let config = MapperConfig::default().with_name_style(NameStyle::Snake);

    let matches = match_paths(
        &types,
        TypeKey::of::<UpperValue>(),
        TypeKey::of::<LowerValue>(),
        &config,
    )
    .unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].source.to_string(), "Value");
    assert_eq!(matches[0].target.to_string(), "value");
}

#[test]
fn verbatim_style_concatenates_declared_names() {
    let types = TypeRegistry::new();
    let config = MapperConfig::default().with_name_style(NameStyle::Verbatim);

    let matches = match_paths(
        &types,
        TypeKey::of::<PascalFlat>(),
        TypeKey::of::<PascalNested>(),
        &config,
    )
    .unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].target.to_string(), "Sub.Property");
}

#[test]
fn computed_composites_are_not_walked_as_sources() {
    let types = TypeRegistry::new();
    let config = MapperConfig::default();

    let matches = match_paths(
        &types,
        TypeKey::of::<Computed>(),
        TypeKey::of::<Holder>(),
        &config,
    )
    .unwrap();

    let pairs: Vec<_> = matches
        .iter()
        .map(|m| (m.source.to_string(), m.target.to_string()))
        .collect();
    assert_eq!(pairs, [("label".to_string(), "label".to_string())]);
}

#[test]
fn computed_composites_cannot_be_bound_explicitly() {
    let types = TypeRegistry::new();
    let mut builder = TypeBindingBuilder::for_types::<Computed, Holder>(&types).unwrap();

    let err = builder.bind("geo", "geo").unwrap_err();
    assert!(err.is_contract_violation());

    builder.auto_bind(&[]).unwrap();
    assert_eq!(targets(&builder.build_binding()), ["label"]);
}

#[test]
fn shortest_source_path_wins_ties() {
    let types = TypeRegistry::new();
    let config = MapperConfig::default();

    let matches = match_paths(
        &types,
        TypeKey::of::<TieSource>(),
        TypeKey::of::<TieTarget>(),
        &config,
    )
    .unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].source.to_string(), "a_b");
}

#[test]
fn unassignable_kinds_are_not_matched() {
    let types = TypeRegistry::new();
    let config = MapperConfig::default();

    // count: u32 -> String has no lossless conversion
    let matches =
        match_paths(&types, TypeKey::of::<Source>(), TypeKey::of::<Target>(), &config).unwrap();
    let targets: Vec<_> = matches.iter().map(|m| m.target.to_string()).collect();

    assert_eq!(targets, ["sub.property", "sub.mismatched"]);
}

// ---- null-safe reads ---------------------------------------------------

#[test]
fn read_field_transform_fails_on_a_null_link() {
    let types = TypeRegistry::new();
    let path =
        FieldGraphPath::parse(&types, TypeKey::of::<Recurse>(), "recurse.recurse.value").unwrap();
    let transform = read_field_transform(path);

    let shallow = Recurse {
        value: 1,
        recurse: None,
    };
    let mut reader = ObjectReader::new(&types, &shallow).unwrap();
    assert_eq!(transform.read(&mut reader).unwrap(), None);
    assert_eq!(reader.state(), CursorState::AtRoot);

    let half = Recurse {
        value: 1,
        recurse: Some(Box::new(Recurse::default())),
    };
    let mut reader = ObjectReader::new(&types, &half).unwrap();
    assert_eq!(transform.read(&mut reader).unwrap(), None);
    assert_eq!(reader.state(), CursorState::AtRoot);
}

#[test]
fn read_field_transform_reads_a_populated_path() {
    let types = TypeRegistry::new();
    let path =
        FieldGraphPath::parse(&types, TypeKey::of::<Recurse>(), "recurse.recurse.value").unwrap();

    let deep = Recurse {
        value: 1,
        recurse: Some(Box::new(Recurse {
            value: 2,
            recurse: Some(Box::new(Recurse {
                value: 7,
                recurse: None,
            })),
        })),
    };
    let mut reader = ObjectReader::new(&types, &deep).unwrap();

    let value = read_field_transform(path).read(&mut reader).unwrap();
    assert_eq!(value, Some(Value::Uint(7)));
    assert_eq!(reader.state(), CursorState::AtRoot);
}

// ---- builder -----------------------------------------------------------

#[test]
fn auto_bind_pairs_flattened_names() {
    let types = TypeRegistry::new();

    let binding = TypeBindingBuilder::for_types::<Flat, Nested>(&types)
        .unwrap()
        .auto_bind(&[])
        .unwrap()
        .build_binding();

    assert_eq!(targets(&binding), ["sub.property"]);
    assert_eq!(source_of(&binding, "sub.property"), "sub_property");
}

#[test]
fn explicit_binding_evicts_a_spliced_nested_binding() {
    let types = TypeRegistry::new();
    let nested = TypeBindingBuilder::for_types::<Sub, Sub>(&types)
        .unwrap()
        .auto_bind(&[])
        .unwrap()
        .build_binding();

    let binding = TypeBindingBuilder::for_types::<Source, Target>(&types)
        .unwrap()
        .bind_nested("sub", "sub", &nested)
        .unwrap()
        .bind("sub.property", "other")
        .unwrap()
        .build_binding();

    let bound: Vec<_> = targets(&binding);
    assert_eq!(
        bound.iter().filter(|t| t.as_str() == "sub.property").count(),
        1
    );
    assert_eq!(source_of(&binding, "sub.property"), "other");
    assert_eq!(source_of(&binding, "sub.mismatched"), "sub.mismatched");
}

#[test]
fn later_composite_binding_replaces_earlier_leaves() {
    let types = TypeRegistry::new();
    let nested = TypeBindingBuilder::for_types::<Sub, Sub>(&types)
        .unwrap()
        .bind("property", "mismatched")
        .unwrap()
        .build_binding();

    let binding = TypeBindingBuilder::for_types::<Source, Target>(&types)
        .unwrap()
        .bind("sub.property", "other")
        .unwrap()
        .bind_nested("sub", "sub", &nested)
        .unwrap()
        .build_binding();

    assert_eq!(targets(&binding), ["sub.property"]);
    assert_eq!(source_of(&binding, "sub.property"), "sub.mismatched");
}

#[test]
fn auto_bind_fills_only_uncovered_targets() {
    let types = TypeRegistry::new();

    let binding = TypeBindingBuilder::for_types::<Source, Target>(&types)
        .unwrap()
        .bind("sub.property", "other")
        .unwrap()
        .auto_bind(&[])
        .unwrap()
        .build_binding();

    assert_eq!(targets(&binding), ["sub.property", "sub.mismatched"]);
    assert_eq!(source_of(&binding, "sub.property"), "other");
}

#[test]
fn auto_bind_splices_reused_bindings() {
    let types = TypeRegistry::new();
    let reuse = TypeBindingBuilder::for_types::<Sub, Sub>(&types)
        .unwrap()
        .bind("property", "mismatched")
        .unwrap()
        .build_binding();

    let binding = TypeBindingBuilder::for_types::<Source, Target>(&types)
        .unwrap()
        .auto_bind(&[reuse])
        .unwrap()
        .build_binding();

    // the reused plan owns `sub`; nothing else is matched below it
    assert_eq!(targets(&binding), ["sub.property"]);
    assert_eq!(source_of(&binding, "sub.property"), "sub.mismatched");
}

#[test]
fn converted_binding_accepts_unassignable_kinds() {
    let types = TypeRegistry::new();

    let binding = TypeBindingBuilder::for_types::<Source, Target>(&types)
        .unwrap()
        .bind_converted::<u32, String, _>("count", "count", |count| count.to_string())
        .unwrap()
        .build_binding();

    let Some(BindingKind::Value(transform)) = binding.binding_for("count").map(|b| b.kind())
    else {
        panic!("count is a value binding");
    };
    let mut ctx = BindingContext::new();
    assert_eq!(
        transform.transform(&mut ctx, Value::Uint(42)),
        Some(Value::Text("42".into()))
    );
}

#[test]
fn explicit_binding_errors() {
    let types = TypeRegistry::new();
    let mut builder = TypeBindingBuilder::for_types::<Source, Target>(&types).unwrap();

    assert!(builder.bind("sub.property", "missing").unwrap_err().is_not_found());
    assert!(builder.bind("count", "count").unwrap_err().is_contract_violation());
    assert!(builder.bind("locked", "other").unwrap_err().is_contract_violation());
    assert!(builder.bind("sub", "other").unwrap_err().is_contract_violation());
    assert!(builder.bind("", "other").unwrap_err().is_contract_violation());
    assert!(builder.bindings().is_empty());
}

#[test]
fn builders_need_composite_or_element_pairs() {
    let types = TypeRegistry::new();

    let err = TypeBindingBuilder::for_types::<u32, String>(&types)
        .err()
        .expect("scalars cannot be bound");
    assert!(err.is_contract_violation());

    let err = TypeBindingBuilder::for_types::<Vec<u32>, Vec<u32>>(&types)
        .err()
        .expect("scalar collections cannot be bound");
    assert!(err.is_contract_violation());
}

#[test]
fn enumerables_of_composites_get_element_bindings() {
    let types = TypeRegistry::new();

    let binding = TypeBindingBuilder::for_types::<Person, PersonView>(&types)
        .unwrap()
        .auto_bind(&[])
        .unwrap()
        .build_binding();

    let Some(BindingKind::Elements(element)) = binding.binding_for("friends").map(|b| b.kind())
    else {
        panic!("friends is an element binding");
    };
    assert_eq!(element.source(), TypeKey::of::<Address>());
    assert_eq!(element.target(), TypeKey::of::<AddressView>());
    assert_eq!(targets(element), ["city"]);
}

#[test]
fn root_enumerables_bind_their_elements() {
    let types = TypeRegistry::new();

    let binding = TypeBindingBuilder::for_types::<Vec<Address>, Vec<AddressView>>(&types)
        .unwrap()
        .auto_bind(&[])
        .unwrap()
        .build_binding();

    assert_eq!(binding.len(), 1);
    let root = binding.binding_for("").expect("root element binding");
    assert!(matches!(root.kind(), BindingKind::Elements(_)));
}

#[test]
fn recursive_element_pairs_are_skipped() {
    let types = TypeRegistry::new();

    let binding = TypeBindingBuilder::for_types::<Node, Node>(&types)
        .unwrap()
        .auto_bind(&[])
        .unwrap()
        .build_binding();

    assert_eq!(targets(&binding), ["label"]);
}

#[test]
fn reused_element_bindings_are_shared() {
    let types = TypeRegistry::new();
    let element = TypeBindingBuilder::for_types::<Address, AddressView>(&types)
        .unwrap()
        .auto_bind(&[])
        .unwrap()
        .build_binding();

    let binding = TypeBindingBuilder::for_types::<Person, PersonView>(&types)
        .unwrap()
        .auto_bind(&[Arc::clone(&element)])
        .unwrap()
        .build_binding();

    let Some(BindingKind::Elements(used)) = binding.binding_for("friends").map(|b| b.kind())
    else {
        panic!("friends is an element binding");
    };
    assert!(Arc::ptr_eq(used, &element));
}
