use crate::{
    model::{FieldSpec, Shape, TypeKey, TypeRegistry},
    traits::Reflect,
    value::{Value, ValueKind},
};
use remap_derive::Model;
use std::{
    collections::{BTreeMap, HashSet, VecDeque},
    sync::Arc,
};

#[derive(Clone, Debug, Default, Model)]
#[model(
    computed(name = "display", get = "Self::display"),
    setter(name = "reset_to", set = "Self::reset_to")
)]
struct Account {
    id: u64,
    #[model(read_only)]
    created: i64,
    #[model(write_only)]
    secret: String,
    #[model(skip)]
    cache: Vec<u8>,
    #[model(rename = "label")]
    name: Option<String>,
}

impl Account {
    fn display(&self) -> String {
        format!("#{}", self.id)
    }

    fn reset_to(&mut self, id: u64) {
        self.id = id;
        self.cache.clear();
    }
}

#[derive(Debug, Default, Model)]
struct Shadowed {
    value: u32,
    #[model(rename = "value")]
    newer: String,
}

#[derive(Debug, Default, Model)]
struct Tree {
    label: String,
    children: Vec<Tree>,
    parent: Option<Box<Tree>>,
}

#[test]
fn type_model_is_built_once_per_type() {
    let types = TypeRegistry::new();

    let first = types.type_model_of::<Account>().unwrap();
    let second = types.type_model_of::<Account>().unwrap();
    let through_option = types.type_model_of::<Option<Account>>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &through_option));
    assert!(Arc::ptr_eq(
        &types.data_type_of::<Account>().unwrap(),
        &types.data_type_of::<Account>().unwrap()
    ));
    assert_eq!(types.stats().models.builds, 1);
}

#[test]
fn registries_are_independent() {
    let a = TypeRegistry::new();
    let b = TypeRegistry::new();

    let from_a = a.type_model_of::<Account>().unwrap();
    let from_b = b.type_model_of::<Account>().unwrap();

    assert!(!Arc::ptr_eq(&from_a, &from_b));
}

#[test]
fn model_lists_accessors_with_their_access() {
    let types = TypeRegistry::new();
    let model = types.type_model_of::<Account>().unwrap();

    let names: Vec<_> = model.fields().iter().map(|field| field.name()).collect();
    assert_eq!(names, ["id", "created", "secret", "label", "display", "reset_to"]);

    let access = |name: &str| {
        let field = model.field(name).unwrap();
        (field.can_read(), field.can_write())
    };
    assert_eq!(access("id"), (true, true));
    assert_eq!(access("created"), (true, false));
    assert_eq!(access("secret"), (false, true));
    assert_eq!(access("display"), (true, false));
    assert_eq!(access("reset_to"), (false, true));
}

#[test]
fn skipped_members_are_not_fields() {
    let types = TypeRegistry::new();
    let model = types.type_model_of::<Account>().unwrap();

    let err = model.field("cache").unwrap_err();
    assert!(err.is_not_found());
    assert!(model.try_field("cache").is_none());
}

#[test]
fn duplicate_names_resolve_to_the_last_declaration() {
    let types = TypeRegistry::new();
    let model = types.type_model_of::<Shadowed>().unwrap();

    assert_eq!(model.len(), 2);
    let field = model.field("value").unwrap();
    assert_eq!(field.index(), 1);
    assert_eq!(field.value_type(), TypeKey::of::<String>());
}

#[test]
fn computed_and_setter_fields_go_through_their_functions() {
    let types = TypeRegistry::new();
    let model = types.type_model_of::<Account>().unwrap();
    let mut account = Account {
        id: 3,
        cache: vec![1],
        ..Account::default()
    };

    let display = types.accessor(model.field("display").unwrap()).unwrap();
    assert_eq!(display.read(&account), Some(Value::Text("#3".into())));

    let reset = types.accessor(model.field("reset_to").unwrap()).unwrap();
    assert!(reset.write(&mut account, Value::Int(9)));
    assert_eq!(account.id, 9);
    assert!(account.cache.is_empty());
    assert_eq!(reset.read(&account), None);
}

#[test]
fn accessor_writes_coerce_and_reject() {
    let types = TypeRegistry::new();
    let model = types.type_model_of::<Account>().unwrap();
    let mut account = Account::default();

    let id = types.accessor(model.field("id").unwrap()).unwrap();
    assert!(id.write(&mut account, Value::Int(12)));
    assert_eq!(account.id, 12);
    assert!(!id.write(&mut account, Value::Int(-1)));
    assert!(!id.write(&mut account, Value::Text("12".into())));
    assert_eq!(account.id, 12);

    let label = types.accessor(model.field("label").unwrap()).unwrap();
    assert!(label.write(&mut account, Value::Text("main".into())));
    assert_eq!(account.name.as_deref(), Some("main"));
    assert!(label.write(&mut account, Value::Null));
    assert_eq!(account.name, None);
}

#[test]
fn accessors_are_cached_per_field() {
    let types = TypeRegistry::new();
    let model = types.type_model_of::<Account>().unwrap();
    let field = model.field("id").unwrap();

    let first = types.accessor(field).unwrap();
    let second = types.accessor(field).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(types.stats().accessors.builds, 1);
}

#[test]
fn collections_are_pure_enumerables_but_text_is_not() {
    let types = TypeRegistry::new();

    for data_type in [
        types.data_type_of::<Vec<u32>>().unwrap(),
        types.data_type_of::<VecDeque<String>>().unwrap(),
        types.data_type_of::<[u8; 4]>().unwrap(),
        types.data_type_of::<HashSet<i64>>().unwrap(),
        types.data_type_of::<BTreeMap<String, u32>>().unwrap(),
    ] {
        assert!(data_type.is_enumerable(), "{data_type}");
        assert!(data_type.is_pure_enumerable(), "{data_type}");
    }

    let text = types.data_type_of::<String>().unwrap();
    assert!(text.is_enumerable());
    assert!(!text.is_pure_enumerable());
    assert_eq!(text.element_type(), Some(TypeKey::of::<char>()));

    let scalar = types.data_type_of::<u32>().unwrap();
    assert!(!scalar.is_enumerable());
    assert_eq!(scalar.element_type(), None);
}

#[test]
fn element_types_follow_the_collection() {
    let types = TypeRegistry::new();

    let untyped = types.data_type_of::<Vec<Value>>().unwrap();
    let element = types.data_type(untyped.element_type().unwrap()).unwrap();
    assert_eq!(element.shape(), Shape::Any);

    let map = types.data_type_of::<BTreeMap<String, u32>>().unwrap();
    let entry = types.data_type(map.element_type().unwrap()).unwrap();
    assert!(entry.is_anonymous_type());
    assert_eq!(entry.key(), TypeKey::of::<(String, u32)>());
    assert_eq!(map.value_kind(), Some(&ValueKind::Map));
}

#[test]
fn wrappers_classify_as_their_member() {
    let types = TypeRegistry::new();

    let nullable = types.data_type_of::<Option<Account>>().unwrap();
    assert!(nullable.is_nullable());
    assert!(nullable.is_composite());
    assert_eq!(nullable.member_type(), TypeKey::of::<Account>());

    let boxed = types.data_type_of::<Option<Box<Tree>>>().unwrap();
    assert!(boxed.is_nullable());
    assert_eq!(boxed.member_type(), TypeKey::of::<Tree>());

    let err = types.data_type_of::<Option<Option<u32>>>().unwrap_err();
    assert!(err.is_contract_violation());
}

#[test]
fn only_composites_have_models() {
    let types = TypeRegistry::new();

    assert!(types.type_model_of::<Tree>().is_ok());
    let err = types.type_model_of::<Vec<Tree>>().unwrap_err();
    assert!(err.is_contract_violation());
    let err = types.type_model_of::<u64>().unwrap_err();
    assert!(err.is_contract_violation());
}

#[test]
fn recursive_field_models_resolve_lazily() {
    let types = TypeRegistry::new();
    let tree = types.type_model_of::<Tree>().unwrap();

    let parent = tree.field("parent").unwrap();
    let parent_model = parent.field_model(&types).unwrap().expect("composite");
    assert!(Arc::ptr_eq(&tree, &parent_model));

    let children = tree.field("children").unwrap();
    assert!(children.field_model(&types).unwrap().is_none());
}

#[test]
fn tuples_are_anonymous_models() {
    let types = TypeRegistry::new();

    let pair = types.data_type_of::<(u8, String)>().unwrap();
    assert!(pair.is_anonymous_type());
    assert!(pair.is_composite());

    let model = types.type_model_of::<(u8, String)>().unwrap();
    let names: Vec<_> = model.fields().iter().map(|field| field.name()).collect();
    assert_eq!(names, ["0", "1"]);
    assert!(!types.data_type_of::<Account>().unwrap().is_anonymous_type());
}

#[test]
fn hand_written_specs_work_like_derived_ones() {
    #[derive(Debug, Default)]
    struct Manual {
        total: u32,
    }

    impl Reflect for Manual {
        type Member = Self;

        fn type_spec() -> crate::model::TypeSpec {
            crate::model::TypeSpec::composite::<Self>()
        }

        fn fields() -> Vec<FieldSpec> {
            vec![FieldSpec::new::<Self, u32>(
                "total",
                |owner| &owner.total,
                |owner| &mut owner.total,
            )]
        }

        fn construct() -> Option<Self> {
            Some(Self::default())
        }
    }

    let types = TypeRegistry::new();
    let model = types.type_model_of::<Manual>().unwrap();
    let field = model.field("total").unwrap();

    assert_eq!(format!("{field:?}"), format!("{}.total", TypeKey::of::<Manual>().name()));
    assert!(types.data_type_of::<Manual>().unwrap().can_construct());
}
