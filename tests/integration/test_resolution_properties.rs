//! Properties every resolution run must hold regardless of input shape.

use crate::common::*;
use mapweave::{
    AttributeInfo, ConversionStrategy, DiagnosticKind, InterfaceRef, MemberDescriptor,
    TypeDescriptor, TypeRef,
};

fn user() -> TypeDescriptor {
    TypeDescriptor::class("App.Models.User")
        .with_member(int("Id"))
        .with_member(string("Name"))
        .with_member(string("Email"))
}

fn view(members: Vec<MemberDescriptor>) -> TypeDescriptor {
    members.into_iter().fold(
        TypeDescriptor::class("App.Views.UserView").with_attribute(map_from("User")),
        TypeDescriptor::with_member,
    )
}

#[test]
fn matching_does_not_depend_on_source_member_order() {
    let forward = run(vec![user(), view(vec![string("Email"), int("Id")])]);
    let reversed_source = TypeDescriptor::class("App.Models.User")
        .with_member(string("Email"))
        .with_member(string("Name"))
        .with_member(int("Id"));
    let reversed = run(vec![reversed_source, view(vec![string("Email"), int("Id")])]);

    assert_eq!(
        plan_for(&forward, "App.Views.UserView").pairs,
        plan_for(&reversed, "App.Views.UserView").pairs
    );
}

#[test]
fn matching_does_not_depend_on_target_member_order() {
    let by_target = |report: &mapweave::RunReport| {
        let mut pairs = plan_for(report, "App.Views.UserView").pairs.clone();
        pairs.sort_by(|a, b| a.target_member.cmp(&b.target_member));
        pairs
    };
    let renamed = string("Contact").with_attribute(source_property("Email"));

    let forward = run(vec![
        user(),
        view(vec![int("Id"), string("Name"), renamed.clone(), string("Missing")]),
    ]);
    let reversed = run(vec![
        user(),
        view(vec![string("Missing"), renamed, string("Name"), int("Id")]),
    ]);

    assert_eq!(by_target(&forward).len(), 3);
    assert_eq!(by_target(&forward), by_target(&reversed));
    assert_eq!(forward.warning_count(), reversed.warning_count());
}

#[test]
fn short_and_qualified_type_names_are_the_same_type() {
    let address = TypeDescriptor::class("App.Models.Address").with_member(string("City"));
    let user = user().with_member(member("Home", TypeRef::named("App.Models.Address")));
    let report = run(vec![
        address,
        user,
        view(vec![
            member("Home", TypeRef::named("Address")),
            member("Id", TypeRef::named("global::System.Int32")),
        ]),
    ]);

    let plan = plan_for(&report, "App.Views.UserView");
    assert_eq!(plan.pair("Home").unwrap().strategy, ConversionStrategy::Identity);
    assert_eq!(plan.pair("Id").unwrap().strategy, ConversionStrategy::Identity);
    assert_eq!(report.warning_count(), 0);
}

#[test]
fn record_target_maps_through_its_widest_constructor() {
    let record = TypeDescriptor::record("App.Views.UserRecord")
        .with_attribute(map_from("User"))
        .with_member(int("Id"))
        .with_member(string("Display"))
        .with_constructor(mapweave::ConstructorDescriptor::new(vec![int("Id")]))
        .with_constructor(mapweave::ConstructorDescriptor::new(vec![
            int("Id"),
            string("Name"),
            string("Token").with_attribute(AttributeInfo::new("IgnoreProperty")),
        ]));
    let report = run(vec![user(), record]);

    let plan = plan_for(&report, "App.Views.UserRecord");
    let targets: Vec<_> = plan.pairs.iter().map(|p| p.target_member.as_str()).collect();
    assert_eq!(targets, vec!["Id", "Name"]);
    // Display is a property outside the constructor and is never assigned
    assert_eq!(report.warning_count(), 0);
}

#[test]
fn scoped_override_beats_unscoped_regardless_of_order() {
    let scoped = AttributeInfo::new("MapProperty")
        .with_named_argument("SourcePropertyName", "\"Email\"")
        .with_named_argument("SourceTypeName", "typeof(User)");

    for attributes in [
        vec![source_property("Name"), scoped.clone()],
        vec![scoped.clone(), source_property("Name")],
    ] {
        let contact = attributes
            .into_iter()
            .fold(string("Contact"), MemberDescriptor::with_attribute);
        let report = run(vec![user(), view(vec![contact])]);
        let plan = plan_for(&report, "App.Views.UserView");
        assert_eq!(plan.pair("Contact").unwrap().source_member, "Email");
    }
}

#[test]
fn override_scoped_to_another_type_falls_back_to_unscoped() {
    let other_scope = AttributeInfo::new("MapProperty")
        .with_named_argument("SourcePropertyName", "\"Email\"")
        .with_named_argument("SourceTypeName", "typeof(Admin)");
    let contact = string("Contact")
        .with_attribute(other_scope)
        .with_attribute(source_property("Name"));

    let report = run(vec![
        user(),
        TypeDescriptor::class("App.Models.Admin").with_member(string("Email")),
        view(vec![contact]),
    ]);
    let plan = plan_for(&report, "App.Views.UserView");
    assert_eq!(plan.pair("Contact").unwrap().source_member, "Name");
}

#[test]
fn converter_must_match_exact_types() {
    let converter_type = |args: Vec<TypeRef>| {
        TypeDescriptor::class("App.Converters.IdConverter")
            .with_interface(InterfaceRef::new("MapTo.ITypeConverter", args))
    };
    let target = || {
        view(vec![
            string("Name"),
            string("Id").with_attribute(converter("IdConverter")),
        ])
    };

    // Converter declares long -> string but the source member is int
    let report = run(vec![
        user(),
        converter_type(vec![TypeRef::primitive("long"), TypeRef::primitive("string")]),
        target(),
    ]);
    let plan = plan_for(&report, "App.Views.UserView");
    assert!(plan.pair("Id").is_none());
    assert!(
        report
            .all_diagnostics()
            .any(|d| d.kind == DiagnosticKind::InvalidConverterGenericArguments)
    );

    // Reversed arguments are rejected too
    let report = run(vec![
        user(),
        converter_type(vec![TypeRef::primitive("string"), TypeRef::primitive("int")]),
        target(),
    ]);
    assert!(plan_for(&report, "App.Views.UserView").pair("Id").is_none());

    let report = run(vec![
        user(),
        converter_type(vec![TypeRef::primitive("int"), TypeRef::primitive("string")]),
        target(),
    ]);
    assert!(matches!(
        plan_for(&report, "App.Views.UserView").pair("Id").unwrap().strategy,
        ConversionStrategy::CustomConverter { .. }
    ));
}

#[test]
fn nested_mapping_requires_reciprocal_declaration() {
    let address = TypeDescriptor::class("App.Models.Address").with_member(string("City"));
    let person = TypeDescriptor::class("App.Models.Person")
        .with_member(string("Name"))
        .with_member(member("Home", TypeRef::named("App.Models.Address")));
    let person_view = TypeDescriptor::class("App.Views.PersonView")
        .with_attribute(map_from("Person"))
        .with_member(string("Name"))
        .with_member(member("Home", TypeRef::named("App.Views.AddressView")));

    // AddressView declares nothing: Home is dropped
    let report = run(vec![
        address.clone(),
        person.clone(),
        person_view.clone(),
        TypeDescriptor::class("App.Views.AddressView").with_member(string("City")),
    ]);
    let plan = plan_for(&report, "App.Views.PersonView");
    assert!(plan.pair("Home").is_none());
    assert!(
        report
            .all_diagnostics()
            .any(|d| d.kind == DiagnosticKind::NoMatchingPropertyType)
    );

    // Source side declaring TO is enough
    let report = run(vec![
        address.clone().with_attribute(map_to("AddressView")),
        person.clone(),
        person_view.clone(),
        TypeDescriptor::class("App.Views.AddressView").with_member(string("City")),
    ]);
    assert_eq!(
        plan_for(&report, "App.Views.PersonView")
            .pair("Home")
            .unwrap()
            .strategy,
        ConversionStrategy::NestedMapping {
            source: "App.Models.Address".to_string(),
            target: "App.Views.AddressView".to_string(),
        }
    );
}

#[test]
fn collection_mapping_needs_an_enumerable_side() {
    let report = run(vec![
        TypeDescriptor::class("App.Models.Post")
            .with_member(string("Tag"))
            .with_member(member("Scores", TypeRef::enumerable(TypeRef::primitive("int"))))
            .with_member(int("Rank")),
        TypeDescriptor::class("App.Views.PostView")
            .with_attribute(map_from("Post"))
            .with_member(member("Tag", TypeRef::enumerable(TypeRef::primitive("string"))))
            .with_member(member("Scores", TypeRef::enumerable(TypeRef::primitive("int"))))
            .with_member(string("Rank")),
    ]);

    let plan = plan_for(&report, "App.Views.PostView");
    assert!(plan.pair("Tag").unwrap().strategy.is_collection());
    assert_eq!(plan.pair("Scores").unwrap().strategy, ConversionStrategy::Identity);
    // int -> string has neither side enumerable
    assert!(plan.pair("Rank").is_none());
}

#[test]
fn resolving_twice_yields_identical_output() {
    let types = vec![
        user(),
        view(vec![int("Id"), string("Name"), string("Missing")]),
    ];
    let first = run(types.clone());
    let second = run(types);

    assert_eq!(
        first.plans().cloned().collect::<Vec<_>>(),
        second.plans().cloned().collect::<Vec<_>>()
    );
    assert_eq!(
        first.all_diagnostics().cloned().collect::<Vec<_>>(),
        second.all_diagnostics().cloned().collect::<Vec<_>>()
    );
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let mut types = vec![user()];
    for i in 0..16 {
        types.push(
            TypeDescriptor::class(format!("App.Views.View{i}"))
                .with_attribute(map_from("User"))
                .with_member(int("Id"))
                .with_member(string(if i % 2 == 0 { "Name" } else { "Nickname" })),
        );
    }

    let mut parallel = settings();
    parallel.resolution.parallel_threads = 4;
    let a = run(types.clone());
    let b = run_with(types, &parallel);

    let targets = |r: &mapweave::RunReport| {
        r.outcomes
            .iter()
            .map(|o| o.triple.target.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(targets(&a), targets(&b));
    assert_eq!(a.warning_count(), 8);
    assert_eq!(a.warning_count(), b.warning_count());
}

#[test]
fn duplicate_declaration_fails_only_its_triple() {
    let report = run(vec![
        user(),
        TypeDescriptor::class("App.Views.UserView")
            .with_attribute(map_from("User"))
            .with_attribute(map_from("App.Models.User"))
            .with_member(int("Id")),
        TypeDescriptor::class("App.Views.Other")
            .with_attribute(map_from("User"))
            .with_member(int("Id")),
    ]);

    assert_eq!(report.plans().count(), 1);
    assert!(
        report
            .all_diagnostics()
            .any(|d| d.kind == DiagnosticKind::DuplicateMappingDeclaration)
    );
    plan_for(&report, "App.Views.Other");
}

#[test]
fn auxiliary_constructor_detection() {
    let with_ctor = |params: Vec<TypeRef>| {
        view(vec![int("Id")]).with_constructor(mapweave::ConstructorDescriptor::from_types(params))
    };
    let context = TypeRef::named("MapTo.MappingContext");
    let source = TypeRef::named("App.Models.User");

    let report = run(vec![user(), with_ctor(vec![context.clone(), source.clone()])]);
    assert!(!plan_for(&report, "App.Views.UserView").needs_auxiliary_constructor);
    assert_eq!(report.warning_count(), 0);

    // Exporters may write either parameter without its namespace
    let report = run(vec![
        user(),
        with_ctor(vec![TypeRef::named("MappingContext"), TypeRef::named("User")]),
    ]);
    assert!(!plan_for(&report, "App.Views.UserView").needs_auxiliary_constructor);
    assert_eq!(report.warning_count(), 0);

    let report = run(vec![user(), with_ctor(vec![source, TypeRef::primitive("int")])]);
    let plan = plan_for(&report, "App.Views.UserView");
    assert!(!plan.needs_auxiliary_constructor);
    assert!(
        report
            .all_diagnostics()
            .any(|d| d.kind == DiagnosticKind::InvalidAuxiliaryConstructor)
    );
}
