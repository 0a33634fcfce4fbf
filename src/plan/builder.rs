use super::{MappingPlan, MatchedPair};
use crate::config::{DirectiveConfig, ResolutionConfig};
use crate::descriptor::{TypeDescriptor, TypeProvider};
use crate::diagnostics::{DiagnosticKind, DiagnosticSink, Location};
use crate::resolve::assignability::qualified;
use crate::types::{Direction, TypeRef, simple_name};
use std::collections::BTreeSet;

/// Accumulates resolved pairs for one triple and freezes them into a plan.
///
/// Imports are collected here and nowhere else.
pub struct PlanBuilder<'a> {
    provider: &'a dyn TypeProvider,
    resolution: &'a ResolutionConfig,
    directives: &'a DirectiveConfig,
    source: &'a TypeDescriptor,
    target: &'a TypeDescriptor,
    direction: Direction,
    declaring_type: String,
    inherits_from_mapped_base: bool,
    pairs: Vec<MatchedPair>,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(
        provider: &'a dyn TypeProvider,
        resolution: &'a ResolutionConfig,
        directives: &'a DirectiveConfig,
        source: &'a TypeDescriptor,
        target: &'a TypeDescriptor,
        direction: Direction,
    ) -> Self {
        let declaring_type = match direction {
            Direction::From => target.name.clone(),
            Direction::To => source.name.clone(),
        };
        Self {
            provider,
            resolution,
            directives,
            source,
            target,
            direction,
            declaring_type,
            inherits_from_mapped_base: false,
            pairs: Vec::new(),
        }
    }

    pub fn inherits_from_mapped_base(mut self, value: bool) -> Self {
        self.inherits_from_mapped_base = value;
        self
    }

    pub fn push(&mut self, pair: MatchedPair) {
        self.pairs.push(pair);
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn build(self, sink: &mut DiagnosticSink) -> MappingPlan {
        let needs_auxiliary_constructor = self.needs_auxiliary_constructor(sink);
        let imports = self.imports();

        MappingPlan {
            source: self.source.name.clone(),
            target: self.target.name.clone(),
            direction: self.direction,
            declaring_type: self.declaring_type,
            target_kind: self.target.kind,
            pairs: self.pairs,
            imports,
            inherits_from_mapped_base: self.inherits_from_mapped_base,
            needs_auxiliary_constructor,
        }
    }

    /// TARGET needs a generated `(context, SOURCE)` constructor unless it already has one.
    ///
    /// A two-parameter constructor that takes SOURCE in some other shape is
    /// reported and trusted to follow the contract anyway.
    fn needs_auxiliary_constructor(&self, sink: &mut DiagnosticSink) -> bool {
        let source = self.source.as_type_ref();

        let mut mentions_source = None;
        for constructor in &self.target.constructors {
            let params: Vec<TypeRef> = constructor
                .parameter_types()
                .map(|ty| qualified(self.provider, ty))
                .collect();
            if params.len() != 2 {
                continue;
            }
            if self.is_context(&constructor.parameters[0].ty) && params[1] == source {
                return false;
            }
            if mentions_source.is_none() && params.contains(&source) {
                mentions_source = Some(constructor);
            }
        }

        match mentions_source {
            Some(constructor) => {
                sink.report(
                    DiagnosticKind::InvalidAuxiliaryConstructor,
                    Location::new(
                        self.target.file.clone(),
                        constructor.range.or(self.target.range),
                    ),
                    format!(
                        "constructor '{}({})' must take ({}, {}) in that order",
                        self.target.simple_name(),
                        constructor
                            .parameter_types()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", "),
                        self.directives.context_type,
                        self.source.name
                    ),
                );
                false
            }
            None => true,
        }
    }

    /// Does `ty` name the configured context type?
    ///
    /// The context type usually lives in a referenced library and is not
    /// described, so a written name also matches by its qualified or simple form.
    fn is_context(&self, ty: &TypeRef) -> bool {
        let configured = self.directives.context_type.as_str();
        let described = self.provider.resolve(configured);
        if described.is_some_and(|context| qualified(self.provider, ty) == context.as_type_ref()) {
            return true;
        }
        match ty {
            TypeRef::Named(name) => {
                let name = name.strip_prefix("global::").unwrap_or(name);
                name == configured || name == simple_name(configured)
            }
            _ => false,
        }
    }

    fn imports(&self) -> Vec<String> {
        let mut imports: BTreeSet<&str> = self
            .resolution
            .base_imports
            .iter()
            .map(String::as_str)
            .collect();

        // The emitted constructor takes SOURCE
        imports.extend(self.source.namespace());

        if self.pairs.iter().any(|p| p.strategy.is_collection()) {
            imports.insert(&self.resolution.collection_namespace);
        }

        for pair in &self.pairs {
            imports.extend(pair.target_type.namespace());
            imports.extend(pair.source_type.namespace());
            imports.extend(pair.strategy.namespaces());
        }

        if let Some(own) = self.target.namespace() {
            imports.remove(own);
        }
        imports.retain(|ns| !ns.is_empty());
        imports.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::descriptor::{ConstructorDescriptor, TypeCatalog};
    use crate::plan::ConversionStrategy;

    fn catalog() -> TypeCatalog {
        TypeCatalog::from_types(vec![
            TypeDescriptor::class("Hr.Data.Employee"),
            TypeDescriptor::class("Hr.Views.EmployeeView"),
            TypeDescriptor::class("Hr.Views.TeamView"),
        ])
        .unwrap()
    }

    fn pair(strategy: ConversionStrategy, target: TypeRef, source: TypeRef) -> MatchedPair {
        MatchedPair {
            target_member: "Member".to_string(),
            source_member: "Member".to_string(),
            target_type: target,
            source_type: source,
            strategy,
        }
    }

    #[test]
    fn test_imports_are_sorted_and_exclude_target_namespace() {
        let catalog = catalog();
        let settings = Settings::default();
        let source = catalog.get("Hr.Data.Employee").unwrap();
        let target = catalog.get("Hr.Views.TeamView").unwrap();

        let mut builder = PlanBuilder::new(
            &catalog,
            &settings.resolution,
            &settings.directives,
            source,
            target,
            Direction::From,
        );
        builder.push(pair(
            ConversionStrategy::CollectionMapping {
                source_element: TypeRef::named("Hr.Data.Employee"),
                target_element: TypeRef::named("Hr.Views.EmployeeView"),
            },
            TypeRef::enumerable(TypeRef::named("Hr.Views.EmployeeView")),
            TypeRef::enumerable(TypeRef::named("Hr.Data.Employee")),
        ));
        builder.push(pair(
            ConversionStrategy::Identity,
            TypeRef::named("Global"),
            TypeRef::named("Global"),
        ));

        let mut sink = DiagnosticSink::new();
        let plan = builder.build(&mut sink);
        assert_eq!(plan.imports, vec!["Hr.Data", "MapTo", "System", "System.Linq"]);
        assert_eq!(plan.declaring_type, "Hr.Views.TeamView");
        assert!(plan.needs_auxiliary_constructor);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_auxiliary_constructor_contract() {
        let settings = Settings::default();
        let context = TypeRef::named("MapTo.MappingContext");
        let source_ref = TypeRef::named("Hr.Data.Employee");

        let conforming = TypeDescriptor::class("Hr.Views.EmployeeView").with_constructor(
            ConstructorDescriptor::from_types(vec![context.clone(), source_ref.clone()]),
        );
        let swapped = TypeDescriptor::class("Hr.Views.EmployeeView")
            .with_constructor(ConstructorDescriptor::from_types(vec![source_ref.clone(), context]));
        let catalog = catalog();
        let source = catalog.get("Hr.Data.Employee").unwrap();

        let mut sink = DiagnosticSink::new();
        let plan = PlanBuilder::new(
            &catalog,
            &settings.resolution,
            &settings.directives,
            source,
            &conforming,
            Direction::From,
        )
        .build(&mut sink);
        assert!(!plan.needs_auxiliary_constructor);
        assert!(sink.is_empty());

        let plan = PlanBuilder::new(
            &catalog,
            &settings.resolution,
            &settings.directives,
            source,
            &swapped,
            Direction::To,
        )
        .build(&mut sink);
        assert!(!plan.needs_auxiliary_constructor);
        assert_eq!(plan.declaring_type, "Hr.Data.Employee");
        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink.iter().next().unwrap().kind,
            DiagnosticKind::InvalidAuxiliaryConstructor
        );
    }

    #[test]
    fn test_constructor_written_with_simple_names_conforms() {
        let settings = Settings::default();
        let catalog = catalog();
        let source = catalog.get("Hr.Data.Employee").unwrap();

        for (context, employee) in [
            ("MappingContext", "Employee"),
            ("global::MapTo.MappingContext", "global::Hr.Data.Employee"),
        ] {
            let target = TypeDescriptor::class("Hr.Views.EmployeeView").with_constructor(
                ConstructorDescriptor::from_types(vec![
                    TypeRef::named(context),
                    TypeRef::named(employee),
                ]),
            );
            let mut sink = DiagnosticSink::new();
            let plan = PlanBuilder::new(
                &catalog,
                &settings.resolution,
                &settings.directives,
                source,
                &target,
                Direction::From,
            )
            .build(&mut sink);
            assert!(!plan.needs_auxiliary_constructor, "({context}, {employee})");
            assert!(sink.is_empty());
        }
    }
}
