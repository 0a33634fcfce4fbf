//! Chooses how each matched pair is converted.
//!
//! Strategies are tried in a fixed order: identity, custom converter, nested
//! mapping, collection mapping. The first that applies wins.

use super::assignability::{equivalent, is_assignable, qualified};
use super::matcher::MemberMatch;
use crate::config::DirectiveConfig;
use crate::descriptor::{TypeDescriptor, TypeProvider, ancestors};
use crate::diagnostics::{DiagnosticKind, DiagnosticSink, Location};
use crate::directive::{ConverterBinding, DirectiveIndex, DirectiveTable};
use crate::plan::ConversionStrategy;
use crate::types::{Direction, TypeRef};

pub struct ConversionResolver<'a> {
    provider: &'a dyn TypeProvider,
    table: &'a DirectiveTable,
    config: &'a DirectiveConfig,
    source: &'a TypeDescriptor,
    source_index: &'a DirectiveIndex,
    target: &'a TypeDescriptor,
    target_index: &'a DirectiveIndex,
}

impl<'a> ConversionResolver<'a> {
    pub fn new(
        provider: &'a dyn TypeProvider,
        table: &'a DirectiveTable,
        config: &'a DirectiveConfig,
        source: (&'a TypeDescriptor, &'a DirectiveIndex),
        target: (&'a TypeDescriptor, &'a DirectiveIndex),
    ) -> Self {
        Self {
            provider,
            table,
            config,
            source: source.0,
            source_index: source.1,
            target: target.0,
            target_index: target.1,
        }
    }

    /// Strategy for one pair, or `None` after reporting why the member is dropped
    pub fn resolve(&self, pair: MemberMatch<'_>, sink: &mut DiagnosticSink) -> Option<ConversionStrategy> {
        let from = &pair.source.ty;
        let to = &pair.target.ty;

        if is_assignable(self.provider, from, to) {
            return Some(ConversionStrategy::Identity);
        }

        if let Some(binding) = self.converter_binding(pair) {
            return self.validate_converter(binding, pair, sink);
        }

        if let Some((source, target)) = self.nested(from, to) {
            return Some(ConversionStrategy::NestedMapping { source, target });
        }

        if from.is_enumerable() || to.is_enumerable() {
            let (from_element, to_element) = (from.element(), to.element());
            let reciprocal = self.nested(from_element, to_element).is_some();
            let single_to_many = from.is_enumerable() != to.is_enumerable()
                && is_assignable(self.provider, from_element, to_element);
            if reciprocal || single_to_many {
                return Some(ConversionStrategy::CollectionMapping {
                    source_element: qualified(self.provider, from_element),
                    target_element: qualified(self.provider, to_element),
                });
            }
        }

        sink.report(
            DiagnosticKind::NoMatchingPropertyType,
            self.location(pair),
            format!(
                "cannot convert '{}.{}' ({from}) to '{}.{}' ({to})",
                self.source.simple_name(),
                pair.source.name,
                self.target.simple_name(),
                pair.target.name
            ),
        );
        None
    }

    /// Target-member binding first, then a source-member binding for TARGET
    fn converter_binding(&self, pair: MemberMatch<'_>) -> Option<&'a ConverterBinding> {
        self.target_index
            .converter_for(&pair.target.name, &self.source.name)
            .or_else(|| {
                self.source_index
                    .converter_for(&pair.source.name, &self.target.name)
            })
    }

    fn validate_converter(
        &self,
        binding: &ConverterBinding,
        pair: MemberMatch<'_>,
        sink: &mut DiagnosticSink,
    ) -> Option<ConversionStrategy> {
        let from = &pair.source.ty;
        let to = &pair.target.ty;

        let Some(converter) = self.provider.resolve(&binding.converter) else {
            sink.report(
                DiagnosticKind::InvalidConverterGenericArguments,
                self.location(pair),
                format!(
                    "converter '{}' for '{}.{}' is not a described type",
                    binding.converter,
                    self.target.simple_name(),
                    pair.target.name
                ),
            );
            return None;
        };

        let implements = std::iter::once(converter)
            .chain(ancestors(self.provider, converter))
            .flat_map(|ty| ty.interfaces.iter())
            .filter(|i| i.is(&self.config.converter_interface))
            .any(|i| match i.type_arguments.as_slice() {
                [input, output] => {
                    equivalent(self.provider, input, from) && equivalent(self.provider, output, to)
                }
                _ => false,
            });

        if !implements {
            sink.report(
                DiagnosticKind::InvalidConverterGenericArguments,
                self.location(pair),
                format!(
                    "'{}' must implement {}<{from}, {to}> to convert '{}.{}'",
                    converter.name,
                    self.config.converter_interface,
                    self.target.simple_name(),
                    pair.target.name
                ),
            );
            return None;
        }

        Some(ConversionStrategy::CustomConverter {
            converter: converter.name.clone(),
            parameters: binding.parameters.clone(),
        })
    }

    /// Both single named types with a reciprocal declaration.
    ///
    /// Target declaring FROM the source is checked before source declaring TO.
    fn nested(&self, from: &TypeRef, to: &TypeRef) -> Option<(String, String)> {
        let source = self.provider.resolve(from.named_type()?)?;
        let target = self.provider.resolve(to.named_type()?)?;

        let reciprocal = self.table.declares(&target.name, &source.name, Direction::From)
            || self.table.declares(&source.name, &target.name, Direction::To);
        reciprocal.then(|| (source.name.clone(), target.name.clone()))
    }

    fn location(&self, pair: MemberMatch<'_>) -> Location {
        Location::new(self.target.file.clone(), pair.target.range.or(self.target.range))
    }
}
