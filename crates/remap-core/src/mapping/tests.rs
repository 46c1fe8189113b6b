use crate::{
    binding::{BindingContext, TypeBindingBuilder},
    mapping::{Mapping, Op},
    model::TypeRegistry,
    runtime::{DefaultFactory, ObjectReader, ObjectWriter},
    traits::Reflect,
};
use remap_derive::Model;
use std::sync::Arc;

#[derive(Clone, Debug, Default, Model, PartialEq)]
struct Greeting {
    value: String,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
struct Geo {
    lat: f64,
    lon: f64,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
struct Place {
    name: String,
    geo: Option<Geo>,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
struct FlatPlace {
    name: String,
    geo_lat: f64,
    geo_lon: f64,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
struct Trip {
    title: String,
    stops: Vec<Place>,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
struct TripView {
    title: String,
    stops: Vec<FlatPlace>,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
struct Scored {
    score: i64,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
struct ScoredView {
    score: u8,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
struct Chain {
    value: u32,
    next: Option<Box<Chain>>,
}

#[derive(Clone, Debug, Default, Model, PartialEq)]
struct Depth {
    deep: u32,
}

fn compile<S: Reflect, T: Reflect>(types: &TypeRegistry) -> Mapping {
    let binding = TypeBindingBuilder::for_types::<S, T>(types)
        .unwrap()
        .auto_bind(&[])
        .unwrap()
        .build_binding();

    binding.build_mapping(types).unwrap()
}

fn run<S, T>(types: &TypeRegistry, mapping: &Mapping, source: &S, target: T) -> (T, BindingContext)
where
    S: Reflect,
    T: Reflect,
{
    let mut reader = ObjectReader::new(types, source).unwrap();
    let mut writer = ObjectWriter::new(types, &DefaultFactory, target).unwrap();
    let ctx = mapping.execute(&mut reader, &mut writer).unwrap();

    (writer.into_inner().unwrap(), ctx)
}

#[test]
fn single_value_is_copied() {
    let types = TypeRegistry::new();
    let mapping = compile::<Greeting, Greeting>(&types);

    let source = Greeting {
        value: "Hello World".into(),
    };
    let (out, ctx) = run(&types, &mapping, &source, Greeting::default());

    assert_eq!(out.value, "Hello World");
    assert!(!ctx.has_issues());
}

#[test]
fn shared_prefixes_enter_once() {
    let types = TypeRegistry::new();
    let mapping = compile::<FlatPlace, Place>(&types);

    let lines = mapping.explain();
    assert_eq!(
        lines,
        [
            "copy name -> name (copy as text)",
            "enter target geo",
            "  copy geo_lat -> lat (copy as float)",
            "  copy geo_lon -> lon (copy as float)",
            "leave target",
        ]
    );
}

#[test]
fn null_source_member_skips_its_scope() {
    let types = TypeRegistry::new();
    let mapping = compile::<Place, FlatPlace>(&types);

    let Some(Op::EnterSource { skip_to, .. }) = mapping.ops().get(1) else {
        panic!("second op enters geo");
    };
    assert_eq!(*skip_to, mapping.ops().len());

    let source = Place {
        name: "Nowhere".into(),
        geo: None,
    };
    let existing = FlatPlace {
        name: String::new(),
        geo_lat: 1.5,
        geo_lon: 2.5,
    };
    let (out, _) = run(&types, &mapping, &source, existing);

    assert_eq!(out.name, "Nowhere");
    assert_eq!((out.geo_lat, out.geo_lon), (1.5, 2.5));
}

#[test]
fn untouched_target_members_stay_null() {
    let types = TypeRegistry::new();
    let mapping = compile::<Place, Place>(&types);

    let source = Place {
        name: "Here".into(),
        geo: None,
    };
    let (out, _) = run(&types, &mapping, &source, Place::default());

    assert_eq!(out.geo, None);
}

#[test]
fn collections_are_mapped_element_by_element() {
    let types = TypeRegistry::new();
    let mapping = compile::<Trip, TripView>(&types);

    let source = Trip {
        title: "Coast".into(),
        stops: vec![
            Place {
                name: "A".into(),
                geo: Some(Geo { lat: 1.0, lon: 2.0 }),
            },
            Place {
                name: "B".into(),
                geo: None,
            },
        ],
    };
    let (out, _) = run(&types, &mapping, &source, TripView::default());

    assert_eq!(out.title, "Coast");
    assert_eq!(
        out.stops,
        [
            FlatPlace {
                name: "A".into(),
                geo_lat: 1.0,
                geo_lon: 2.0,
            },
            FlatPlace {
                name: "B".into(),
                ..FlatPlace::default()
            },
        ]
    );
}

#[test]
fn root_collections_compile_to_one_enumerate() {
    let types = TypeRegistry::new();
    let mapping = compile::<Vec<Greeting>, Vec<Greeting>>(&types);

    assert!(matches!(
        mapping.ops(),
        [Op::Enumerate {
            source: None,
            target: None,
            ..
        }]
    ));

    let source = vec![
        Greeting { value: "a".into() },
        Greeting { value: "b".into() },
    ];
    let (out, _) = run(&types, &mapping, &source, Vec::<Greeting>::new());

    assert_eq!(out, source);
}

#[test]
fn conversion_failures_become_issues() {
    let types = TypeRegistry::new();
    let mapping = compile::<Scored, ScoredView>(&types);

    let (out, ctx) = run(&types, &mapping, &Scored { score: 300 }, ScoredView { score: 9 });

    assert_eq!(out.score, 9);
    assert_eq!(ctx.issue_count(), 1);
    assert!(ctx.issues().contains_key("score"));
}

#[test]
fn element_issues_are_keyed_by_index() {
    #[derive(Clone, Debug, Default, Model, PartialEq)]
    struct Board {
        rows: Vec<Scored>,
    }

    #[derive(Clone, Debug, Default, Model, PartialEq)]
    struct BoardView {
        rows: Vec<ScoredView>,
    }

    let types = TypeRegistry::new();
    let mapping = compile::<Board, BoardView>(&types);

    let source = Board {
        rows: vec![Scored { score: 1 }, Scored { score: -4 }],
    };
    let (out, ctx) = run(&types, &mapping, &source, BoardView::default());

    assert_eq!(out.rows, [ScoredView { score: 1 }, ScoredView { score: 0 }]);
    assert_eq!(ctx.issues()["rows[1].score"].len(), 1);
}

#[test]
fn compiled_mappings_are_reusable() {
    let types = TypeRegistry::new();
    let mapping = Arc::new(compile::<Greeting, Greeting>(&types));

    for word in ["one", "two"] {
        let source = Greeting { value: word.into() };
        let (out, _) = run(&types, &mapping, &source, Greeting::default());
        assert_eq!(out.value, word);
    }
}

#[test]
fn caller_context_collects_across_runs() {
    let types = TypeRegistry::new();
    let mapping = compile::<Scored, ScoredView>(&types);
    let mut ctx = BindingContext::new();

    for score in [300, 400] {
        let source = Scored { score };
        let mut reader = ObjectReader::new(&types, &source).unwrap();
        let mut writer = ObjectWriter::create::<ScoredView>(&types, &DefaultFactory).unwrap();
        mapping
            .execute_with(&mut reader, &mut writer, &mut ctx)
            .unwrap();
    }

    assert_eq!(ctx.issues()["score"].len(), 2);
    assert_eq!(ctx.path(), "");
}

#[test]
fn null_values_never_overwrite() {
    #[derive(Clone, Debug, Default, Model, PartialEq)]
    struct Maybe {
        value: Option<String>,
    }

    let types = TypeRegistry::new();
    let mapping = compile::<Maybe, Greeting>(&types);

    let existing = Greeting {
        value: "kept".into(),
    };
    let (out, _) = run(&types, &mapping, &Maybe { value: None }, existing);

    assert_eq!(out.value, "kept");
    assert!(matches!(mapping.ops(), [Op::Copy { .. }]));
    assert_eq!(
        mapping.explain(),
        ["copy value -> value (copy as text)".to_string()]
    );
}

#[test]
fn lone_deep_reads_compile_to_one_path_read() {
    let types = TypeRegistry::new();
    let mut builder = TypeBindingBuilder::for_types::<Chain, Depth>(&types).unwrap();
    builder.bind("deep", "next.next.value").unwrap();
    let mapping = builder.build_binding().build_mapping(&types).unwrap();

    assert!(matches!(mapping.ops(), [Op::ReadPath { .. }]));
    assert_eq!(
        mapping.explain(),
        ["read next.next.value -> deep (copy as uint)".to_string()]
    );

    let shallow = Chain {
        value: 1,
        next: Some(Box::new(Chain::default())),
    };
    let (out, ctx) = run(&types, &mapping, &shallow, Depth { deep: 99 });
    assert_eq!(out.deep, 99);
    assert!(!ctx.has_issues());

    let deep = Chain {
        value: 1,
        next: Some(Box::new(Chain {
            value: 2,
            next: Some(Box::new(Chain {
                value: 3,
                next: None,
            })),
        })),
    };
    let (out, _) = run(&types, &mapping, &deep, Depth { deep: 99 });
    assert_eq!(out.deep, 3);
}

#[test]
fn deep_reads_sharing_a_member_still_enter_it() {
    let types = TypeRegistry::new();
    let mapping = compile::<Place, FlatPlace>(&types);

    assert!(
        !mapping
            .ops()
            .iter()
            .any(|op| matches!(op, Op::ReadPath { .. }))
    );
}
