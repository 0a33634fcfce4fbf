//! Loading metadata documents and layered settings from disk.

use crate::common::*;
use mapweave::{
    ConversionStrategy, MapError, MappingEngine, RunReport, Settings, TypeCatalog, TypeProvider,
};

const DOCUMENT: &str = r#"{
  "version": 1,
  "types": [
    {
      "name": "Shop.Data.Product",
      "file": "Data/Product.cs",
      "members": [
        { "name": "Sku", "type": { "primitive": "string" } },
        { "name": "Price", "type": { "primitive": "decimal" } },
        { "name": "Tags", "type": { "enumerable": { "primitive": "string" } } }
      ]
    },
    {
      "name": "Shop.Api.ProductDto",
      "kind": "record",
      "file": "Api/ProductDto.cs",
      "attributes": [
        { "name": "MapFromAttribute", "arguments": ["typeof(Product)"] }
      ],
      "members": [
        { "name": "Sku", "type": { "primitive": "string" } },
        { "name": "Price", "type": { "primitive": "decimal" } },
        { "name": "Tags", "type": { "enumerable": { "primitive": "string" } } },
        {
          "name": "Internal",
          "type": { "primitive": "int" },
          "attributes": [{ "name": "MapTo.IgnoreProperty" }]
        }
      ]
    }
  ]
}"#;

#[test]
fn resolves_a_document_loaded_from_disk() {
    let project = TestProject::new();
    let path = project.add_file("meta/types.json", DOCUMENT);

    let catalog = TypeCatalog::load(&path).expect("document should load");
    assert_eq!(catalog.len(), 2);
    // Simple names resolve when unambiguous
    assert_eq!(catalog.resolve("Product").unwrap().name, "Shop.Data.Product");

    let report = MappingEngine::new(&catalog, &settings()).run().unwrap();
    let plan = plan_for(&report, "Shop.Api.ProductDto");
    assert_eq!(plan.target_kind, mapweave::TypeKind::Record);
    assert_eq!(plan.len(), 3);
    assert!(plan.pair("Internal").is_none());
    assert_eq!(plan.pair("Tags").unwrap().strategy, ConversionStrategy::Identity);
    assert_eq!(report.all_diagnostics().count(), 0);
}

#[test]
fn diagnostics_carry_the_declaring_file() {
    let project = TestProject::new();
    let path = project.add_file(
        "types.json",
        r#"{ "types": [
            { "name": "A.Model", "members": [{ "name": "X", "type": { "primitive": "int" } }] },
            {
              "name": "A.View",
              "file": "Views/View.cs",
              "attributes": [{ "name": "MapFrom", "arguments": ["typeof(Model)"] }],
              "members": [
                { "name": "X", "type": { "primitive": "int" } },
                { "name": "Y", "type": { "primitive": "int" } }
              ]
            }
        ] }"#,
    );

    let catalog = TypeCatalog::load(&path).unwrap();
    let report = MappingEngine::new(&catalog, &settings()).run().unwrap();
    let warning = report.all_diagnostics().next().expect("Y has no source member");
    assert_eq!(warning.code, "MW003");
    assert_eq!(
        warning.location.file.as_deref(),
        Some(std::path::Path::new("Views/View.cs"))
    );
}

#[test]
fn malformed_document_is_a_parse_error() {
    let project = TestProject::new();
    let path = project.add_file("broken.json", r#"{ "types": [ { "members": [] } ] }"#);

    match TypeCatalog::load(&path) {
        Err(MapError::MetadataParse { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected MetadataParse, got {other:?}"),
    }
}

#[test]
fn missing_document_is_a_read_error() {
    let project = TestProject::new();
    let error = TypeCatalog::load(project.path().join("absent.json")).unwrap_err();
    assert!(matches!(error, MapError::FileRead { .. }));
    assert_eq!(error.status_code(), "FILE_READ_ERROR");
}

#[test]
fn duplicate_type_names_are_rejected() {
    let error = TypeCatalog::from_json_str(
        r#"{ "types": [ { "name": "A.B" }, { "name": "A.B" } ] }"#,
    )
    .unwrap_err();
    assert!(matches!(error, MapError::DuplicateType { ref name } if name == "A.B"));
}

#[test]
fn settings_file_renames_the_annotation_vocabulary() {
    let project = TestProject::new();
    let config = project.add_file(
        ".mapweave/settings.toml",
        r#"
[directives]
root_namespace = "Mapping"
map_from_attribute = "ProjectFrom"
context_type = "Mapping.Ctx"

[resolution]
base_imports = ["System", "Mapping"]
"#,
    );

    let settings = Settings::load_from(&config).expect("settings should load");
    assert_eq!(settings.directives.map_from_attribute, "ProjectFrom");
    assert_eq!(settings.directives.context_type, "Mapping.Ctx");
    // Untouched sections keep their defaults
    assert_eq!(settings.directives.ignore_attribute, Settings::default().directives.ignore_attribute);
    assert!(settings.validate().is_ok());

    let types = vec![
        mapweave::TypeDescriptor::class("A.Model").with_member(int("X")),
        mapweave::TypeDescriptor::class("B.View")
            .with_attribute(mapweave::AttributeInfo::new("ProjectFrom").with_argument("typeof(Model)"))
            .with_member(int("X")),
    ];
    let report: RunReport = run_with(types, &settings);
    assert_eq!(
        plan_for(&report, "B.View").imports,
        vec!["A", "Mapping", "System"]
    );
}

#[test]
fn environment_overrides_settings_file() {
    let project = TestProject::new();
    let config = project.add_file(
        "settings.toml",
        r#"
[resolution]
parallel_threads = 8
collection_namespace = "System.Collections.Generic"
"#,
    );

    unsafe {
        std::env::set_var("MW_RESOLUTION__PARALLEL_THREADS", "3");
    }
    let settings = Settings::load_from(&config);
    unsafe {
        std::env::remove_var("MW_RESOLUTION__PARALLEL_THREADS");
    }

    let settings = settings.unwrap();
    assert_eq!(settings.resolution.parallel_threads, 3);
    assert_eq!(settings.resolution.collection_namespace, "System.Collections.Generic");
}

#[test]
fn zero_threads_fails_validation() {
    let mut settings = Settings::default();
    settings.resolution.parallel_threads = 0;
    assert!(settings.validate().is_err());
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let project = TestProject::new();
    let path = Settings::init_config_file(project.path(), false).unwrap();
    assert!(path.ends_with(".mapweave/settings.toml"));

    assert!(Settings::init_config_file(project.path(), false).is_err());
    assert!(Settings::init_config_file(project.path(), true).is_ok());

    let reloaded = Settings::load_from(&path).unwrap();
    assert_eq!(reloaded.directives, Settings::default().directives);
}

#[test]
fn saved_plans_reload_as_json() {
    let project = TestProject::new();
    let report = run(vec![
        mapweave::TypeDescriptor::class("A.Model").with_member(int("X")),
        mapweave::TypeDescriptor::class("B.View")
            .with_attribute(map_from("Model"))
            .with_member(int("X")),
    ]);

    let out = project.path().join("out/plans.json");
    report.save_plans(&out).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let plans = json.as_array().expect("plans are a JSON array");
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0]["target"], "B.View");
    assert_eq!(plans[0]["pairs"][0]["strategy"]["kind"], "identity");
}
