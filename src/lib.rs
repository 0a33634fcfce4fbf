/// The main library module for mapweave
pub mod config;
pub mod descriptor;
pub mod diagnostics;
pub mod directive;
pub mod display;
pub mod engine;
pub mod error;
pub mod io;
pub mod plan;
pub mod resolve;
pub mod types;

// Explicit exports for better API clarity
pub use config::Settings;
pub use descriptor::{
    AttributeInfo, ConstructorDescriptor, InterfaceRef, MemberDescriptor, MetadataDocument,
    TypeCatalog, TypeDescriptor, TypeProvider,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, Location, Severity};
pub use directive::{DirectiveIndex, DirectiveTable};
pub use engine::{MappingEngine, RunReport, TripleOutcome};
pub use error::{MapError, MapResult};
pub use plan::{ConversionStrategy, MappingPlan, MatchedPair, PlanBuilder};
pub use resolve::Triple;
pub use types::{Direction, Range, TypeKind, TypeRef};
