//! Normalized type descriptions consumed by the resolver.
//!
//! A [`TypeDescriptor`] lists only the members a type declares itself. The
//! inherited view is produced by [`flatten_members`], which walks the
//! ancestor chain explicitly through a [`TypeProvider`].

pub mod attributes;
pub mod catalog;

pub use attributes::AttributeInfo;
pub use catalog::{MetadataDocument, TypeCatalog, TypeProvider};

use crate::types::{Range, TypeKind, TypeRef, namespace_of, simple_name};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// A named, typed member of a shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: TypeRef,

    /// Type that declares this member; filled with the owner when omitted
    #[serde(default)]
    pub declaring_type: String,

    #[serde(default)]
    pub attributes: Vec<AttributeInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            declaring_type: String::new(),
            attributes: Vec::new(),
            range: None,
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeInfo) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// A constructor; parameters carry names and annotations like members do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorDescriptor {
    #[serde(default)]
    pub parameters: Vec<MemberDescriptor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

impl ConstructorDescriptor {
    pub fn new(parameters: Vec<MemberDescriptor>) -> Self {
        Self {
            parameters,
            range: None,
        }
    }

    /// Positional parameters named `arg0`, `arg1`, ...
    pub fn from_types(types: Vec<TypeRef>) -> Self {
        Self::new(
            types
                .into_iter()
                .enumerate()
                .map(|(i, ty)| MemberDescriptor::new(format!("arg{i}"), ty))
                .collect(),
        )
    }

    pub fn parameter_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.parameters.iter().map(|p| &p.ty)
    }
}

/// A generic interface implemented by a type, e.g. `ITypeConverter<int, string>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRef {
    pub name: String,

    #[serde(default)]
    pub type_arguments: Vec<TypeRef>,
}

impl InterfaceRef {
    pub fn new(name: impl Into<String>, type_arguments: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            type_arguments,
        }
    }

    /// Match by fully qualified name, or by simple name when either side is unqualified
    pub fn is(&self, interface: &str) -> bool {
        if self.name == interface {
            return true;
        }
        let unqualified = !self.name.contains('.') || !interface.contains('.');
        unqualified && simple_name(&self.name) == simple_name(interface)
    }
}

/// Normalized view of one declared type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Fully qualified name
    pub name: String,

    /// Explicit namespace, for nested types whose name does not split cleanly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default)]
    pub kind: TypeKind,

    /// Members declared by this type only
    #[serde(default)]
    pub members: Vec<MemberDescriptor>,

    /// Ancestor type names, nearest first
    #[serde(default)]
    pub ancestors: Vec<String>,

    /// Annotations on the type itself
    #[serde(default)]
    pub attributes: Vec<AttributeInfo>,

    #[serde(default)]
    pub constructors: Vec<ConstructorDescriptor>,

    #[serde(default)]
    pub interfaces: Vec<InterfaceRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            kind,
            members: Vec::new(),
            ancestors: Vec::new(),
            attributes: Vec::new(),
            constructors: Vec::new(),
            interfaces: Vec::new(),
            file: None,
            range: None,
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn record(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Record)
    }

    pub fn with_member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_ancestor(mut self, ancestor: impl Into<String>) -> Self {
        self.ancestors.push(ancestor.into());
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeInfo) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn with_interface(mut self, interface: InterfaceRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Namespace of this type, `None` for the global namespace
    pub fn namespace(&self) -> Option<&str> {
        match &self.namespace {
            Some(ns) if ns.is_empty() => None,
            Some(ns) => Some(ns),
            None => namespace_of(&self.name),
        }
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn as_type_ref(&self) -> TypeRef {
        TypeRef::Named(self.name.clone())
    }

    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }

    /// The constructor with the most parameters; the first one wins a tie
    pub fn primary_constructor(&self) -> Option<&ConstructorDescriptor> {
        self.constructors
            .iter()
            .rev()
            .max_by_key(|c| c.parameters.len())
    }

    /// Fill in declaring types left empty by the exporter
    pub fn normalize(&mut self) {
        let members = self
            .members
            .iter_mut()
            .chain(self.constructors.iter_mut().flat_map(|c| c.parameters.iter_mut()));
        for member in members {
            if member.declaring_type.is_empty() {
                member.declaring_type = self.name.clone();
            }
        }
    }
}

/// Ancestors of `ty`, nearest first, resolved through `provider`.
///
/// The declared chain is followed transitively, so an exporter may list only
/// the direct base. Unknown ancestors are skipped and cycles in malformed
/// metadata are cut.
pub fn ancestors<'a>(provider: &'a dyn TypeProvider, ty: &TypeDescriptor) -> Vec<&'a TypeDescriptor> {
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(ty.name.as_str());

    let mut result: Vec<&'a TypeDescriptor> = Vec::new();
    let mut pending: Vec<String> = ty.ancestors.clone();
    let mut cursor = 0;

    while cursor < pending.len() {
        let name = pending[cursor].clone();
        cursor += 1;

        let Some(ancestor) = provider.resolve(&name) else {
            tracing::debug!("ancestor '{name}' of '{}' is not described, skipping", ty.name);
            continue;
        };
        if !seen.insert(ancestor.name.as_str()) {
            continue;
        }
        result.push(ancestor);
        pending.extend(ancestor.ancestors.iter().cloned());
    }

    result
}

/// Member list of `ty` after inheritance flattening.
///
/// Own members come first, then each ancestor's members nearest-first. A name
/// declared closer to `ty` hides the same name further up the chain. With
/// `include_inherited == false` only the type's own members are returned.
pub fn flatten_members<'a>(
    provider: &'a dyn TypeProvider,
    ty: &'a TypeDescriptor,
    include_inherited: bool,
) -> Vec<&'a MemberDescriptor> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut members = Vec::new();

    for member in &ty.members {
        if seen.insert(member.name.as_str()) {
            members.push(member);
        }
    }

    if include_inherited {
        for ancestor in ancestors(provider, ty) {
            for member in &ancestor.members {
                if seen.insert(member.name.as_str()) {
                    members.push(member);
                }
            }
        }
    }

    members
}

/// Members a mapping assigns on `ty`.
///
/// Records are built through their primary constructor, so its parameters
/// are the members. Records without a described constructor, and classes,
/// fall back to [`flatten_members`].
pub fn mapped_members<'a>(
    provider: &'a dyn TypeProvider,
    ty: &'a TypeDescriptor,
    include_inherited: bool,
) -> Vec<&'a MemberDescriptor> {
    match ty.primary_constructor() {
        Some(constructor) if ty.kind == TypeKind::Record && !constructor.parameters.is_empty() => {
            constructor.parameters.iter().collect()
        }
        _ => flatten_members(provider, ty, include_inherited),
    }
}

/// Is `descendant` the same type as, or derived from, `ancestor`?
pub fn is_subtype(provider: &dyn TypeProvider, descendant: &str, ancestor: &str) -> bool {
    if descendant == ancestor {
        return true;
    }
    let Some(ty) = provider.resolve(descendant) else {
        return false;
    };
    ty.interfaces.iter().any(|i| i.is(ancestor))
        || ancestors(provider, ty).iter().any(|a| {
            a.name == ancestor || a.interfaces.iter().any(|i| i.is(ancestor))
        })
}
