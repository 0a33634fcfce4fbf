#![allow(dead_code)]

use mapweave::{
    AttributeInfo, MappingEngine, MappingPlan, MemberDescriptor, RunReport, Settings, TypeCatalog,
    TypeDescriptor, TypeRef,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

pub fn member(name: &str, ty: TypeRef) -> MemberDescriptor {
    MemberDescriptor::new(name, ty)
}

pub fn int(name: &str) -> MemberDescriptor {
    member(name, TypeRef::primitive("int"))
}

pub fn string(name: &str) -> MemberDescriptor {
    member(name, TypeRef::primitive("string"))
}

pub fn map_from(ty: &str) -> AttributeInfo {
    AttributeInfo::new("MapFrom").with_argument(format!("typeof({ty})"))
}

pub fn map_to(ty: &str) -> AttributeInfo {
    AttributeInfo::new("MapTo").with_argument(format!("typeof({ty})"))
}

/// `[MapProperty(SourcePropertyName = "name")]`
pub fn source_property(name: &str) -> AttributeInfo {
    AttributeInfo::new("MapProperty").with_named_argument("SourcePropertyName", format!("\"{name}\""))
}

/// `[MapTypeConverter(typeof(converter))]`
pub fn converter(converter: &str) -> AttributeInfo {
    AttributeInfo::new("MapTypeConverter").with_argument(format!("typeof({converter})"))
}

/// Single-threaded settings so failures are easy to read
pub fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.resolution.parallel_threads = 1;
    settings
}

pub fn catalog(types: Vec<TypeDescriptor>) -> TypeCatalog {
    TypeCatalog::from_types(types).expect("fixture types must be unique")
}

pub fn run(types: Vec<TypeDescriptor>) -> RunReport {
    run_with(types, &settings())
}

pub fn run_with(types: Vec<TypeDescriptor>, settings: &Settings) -> RunReport {
    let catalog = catalog(types);
    MappingEngine::new(&catalog, settings)
        .run()
        .expect("resolution run failed")
}

/// The plan targeting `target`, panicking with the run's diagnostics if absent
pub fn plan_for<'a>(report: &'a RunReport, target: &str) -> &'a MappingPlan {
    report
        .plans()
        .find(|p| p.target == target)
        .unwrap_or_else(|| {
            let diagnostics: Vec<String> =
                report.all_diagnostics().map(ToString::to_string).collect();
            panic!("no plan for {target}; diagnostics: {diagnostics:#?}")
        })
}
