//! End-to-end resolution of the canonical mapping scenarios.

use crate::common::*;
use mapweave::{
    ConversionStrategy, DiagnosticKind, InterfaceRef, TypeDescriptor, TypeRef,
};

#[test]
fn identical_members_map_by_identity() {
    let report = run(vec![
        TypeDescriptor::class("App.Models.User")
            .with_member(int("Id"))
            .with_member(string("Name")),
        TypeDescriptor::class("App.Views.UserViewModel")
            .with_attribute(map_from("User"))
            .with_member(int("Id"))
            .with_member(string("Name")),
    ]);

    let plan = plan_for(&report, "App.Views.UserViewModel");
    assert_eq!(plan.source, "App.Models.User");
    assert_eq!(plan.pairs.len(), 2);
    assert!(
        plan.pairs
            .iter()
            .all(|p| p.strategy == ConversionStrategy::Identity)
    );
    assert_eq!(report.all_diagnostics().count(), 0);
    assert_eq!(plan.imports, vec!["App.Models", "MapTo", "System"]);
    assert!(plan.needs_auxiliary_constructor);
}

#[test]
fn renamed_member_uses_custom_converter() {
    let report = run(vec![
        TypeDescriptor::class("App.Models.User").with_member(int("Id")),
        TypeDescriptor::class("App.Converters.IdToStringConverter").with_interface(
            InterfaceRef::new(
                "MapTo.ITypeConverter",
                vec![TypeRef::primitive("int"), TypeRef::primitive("string")],
            ),
        ),
        TypeDescriptor::class("App.Views.UserViewModel")
            .with_attribute(map_from("User"))
            .with_member(
                string("Key")
                    .with_attribute(source_property("Id"))
                    .with_attribute(converter("IdToStringConverter")),
            ),
    ]);

    let plan = plan_for(&report, "App.Views.UserViewModel");
    assert_eq!(plan.pairs.len(), 1);
    let pair = &plan.pairs[0];
    assert_eq!(pair.target_member, "Key");
    assert_eq!(pair.source_member, "Id");
    assert_eq!(
        pair.strategy,
        ConversionStrategy::CustomConverter {
            converter: "App.Converters.IdToStringConverter".to_string(),
            parameters: vec![],
        }
    );
    assert_eq!(report.all_diagnostics().count(), 0);
    assert!(plan.imports.contains(&"App.Converters".to_string()));
}

#[test]
fn enumerable_of_mapped_elements_uses_collection_mapping() {
    let report = run(vec![
        TypeDescriptor::class("Hr.Domain.Employee").with_member(string("Name")),
        TypeDescriptor::class("Hr.Domain.Department").with_member(member(
            "Employees",
            TypeRef::enumerable(TypeRef::named("Hr.Domain.Employee")),
        )),
        TypeDescriptor::class("Hr.Views.EmployeeView")
            .with_attribute(map_from("Employee"))
            .with_member(string("Name")),
        TypeDescriptor::class("Hr.Views.DepartmentView")
            .with_attribute(map_from("Department"))
            .with_member(member(
                "Employees",
                TypeRef::enumerable(TypeRef::named("Hr.Views.EmployeeView")),
            )),
    ]);

    let plan = plan_for(&report, "Hr.Views.DepartmentView");
    assert_eq!(plan.pairs.len(), 1);
    assert_eq!(
        plan.pairs[0].strategy,
        ConversionStrategy::CollectionMapping {
            source_element: TypeRef::named("Hr.Domain.Employee"),
            target_element: TypeRef::named("Hr.Views.EmployeeView"),
        }
    );
    assert!(plan.imports.contains(&"System.Linq".to_string()));
    assert!(!plan.imports.contains(&"Hr.Views".to_string()));
    assert!(!report.has_errors());
}

#[test]
fn no_matching_members_means_no_plan() {
    let report = run(vec![
        TypeDescriptor::class("App.Models.User").with_member(int("Id")),
        TypeDescriptor::class("App.Views.Unrelated")
            .with_file("Views/Unrelated.cs")
            .with_attribute(map_from("User"))
            .with_member(string("Title")),
    ]);

    assert_eq!(report.plans().count(), 0);
    assert!(report.has_errors());
    let outcome = &report.outcomes[0];
    assert!(outcome.plan.is_none());
    let error = outcome
        .diagnostics
        .iter()
        .find(|d| d.kind == DiagnosticKind::NoMatchingProperties)
        .expect("empty plan is reported");
    assert_eq!(
        error.location.file.as_deref(),
        Some(std::path::Path::new("Views/Unrelated.cs"))
    );
}

#[test]
fn source_declaring_to_maps_into_plain_target() {
    let report = run(vec![
        TypeDescriptor::class("App.Models.Order")
            .with_attribute(map_to("OrderDto"))
            .with_member(int("Number"))
            .with_member(member("Total", TypeRef::primitive("decimal"))),
        TypeDescriptor::record("App.Contracts.OrderDto")
            .with_member(member("Number", TypeRef::primitive("long")))
            .with_member(member("Total", TypeRef::primitive("decimal"))),
    ]);

    let plan = plan_for(&report, "App.Contracts.OrderDto");
    assert_eq!(plan.declaring_type, "App.Models.Order");
    assert_eq!(plan.direction, mapweave::Direction::To);
    assert_eq!(plan.target_kind, mapweave::TypeKind::Record);
    // int widens to long
    assert_eq!(plan.pair("Number").unwrap().strategy, ConversionStrategy::Identity);
}
