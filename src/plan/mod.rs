//! Mapping plans: the only output that survives into code emission.

pub mod builder;

pub use builder::PlanBuilder;

use crate::types::{Direction, TypeKind, TypeRef, namespace_of};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How one matched pair is converted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionStrategy {
    /// Direct assignment
    Identity,
    /// `new Converter().Convert(value, parameters)`
    CustomConverter {
        converter: String,
        #[serde(default)]
        parameters: Vec<String>,
    },
    /// Recursive mapping through another plan
    NestedMapping { source: String, target: String },
    /// Element-wise projection through another plan
    CollectionMapping {
        source_element: TypeRef,
        target_element: TypeRef,
    },
}

impl ConversionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ConversionStrategy::Identity => "identity",
            ConversionStrategy::CustomConverter { .. } => "converter",
            ConversionStrategy::NestedMapping { .. } => "nested",
            ConversionStrategy::CollectionMapping { .. } => "collection",
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, ConversionStrategy::CollectionMapping { .. })
    }

    /// Namespaces the emitted conversion refers to
    pub fn namespaces(&self) -> Vec<&str> {
        match self {
            ConversionStrategy::Identity => Vec::new(),
            ConversionStrategy::CustomConverter { converter, .. } => {
                namespace_of(converter).into_iter().collect()
            }
            ConversionStrategy::NestedMapping { source, target } => namespace_of(source)
                .into_iter()
                .chain(namespace_of(target))
                .collect(),
            ConversionStrategy::CollectionMapping {
                source_element,
                target_element,
            } => source_element
                .namespace()
                .into_iter()
                .chain(target_element.namespace())
                .collect(),
        }
    }
}

impl fmt::Display for ConversionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionStrategy::Identity => f.write_str("identity"),
            ConversionStrategy::CustomConverter {
                converter,
                parameters,
            } if parameters.is_empty() => write!(f, "converter {converter}"),
            ConversionStrategy::CustomConverter {
                converter,
                parameters,
            } => write!(f, "converter {converter}({})", parameters.join(", ")),
            ConversionStrategy::NestedMapping { source, target } => {
                write!(f, "nested {source} -> {target}")
            }
            ConversionStrategy::CollectionMapping {
                source_element,
                target_element,
            } => write!(f, "collection {source_element} -> {target_element}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub target_member: String,
    pub source_member: String,
    pub target_type: TypeRef,
    pub source_type: TypeRef,
    pub strategy: ConversionStrategy,
}

/// Everything an emitter needs to write the conversion of SOURCE into TARGET
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingPlan {
    pub source: String,
    pub target: String,
    pub direction: Direction,
    /// Shape whose annotation produced this plan
    pub declaring_type: String,
    pub target_kind: TypeKind,
    /// In target member enumeration order
    pub pairs: Vec<MatchedPair>,
    /// Sorted, deduplicated
    pub imports: Vec<String>,
    pub inherits_from_mapped_base: bool,
    pub needs_auxiliary_constructor: bool,
}

impl MappingPlan {
    pub fn pair(&self, target_member: &str) -> Option<&MatchedPair> {
        self.pairs.iter().find(|p| p.target_member == target_member)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
