//! Host assignability rules used for the identity strategy.

use crate::descriptor::{TypeDescriptor, TypeProvider, is_subtype};
use crate::types::TypeRef;

/// Keyword spelling of a primitive, accepting the `System.*` aliases.
pub fn keyword(name: &str) -> &str {
    let name = name.strip_prefix("global::").unwrap_or(name);
    match name {
        "System.Boolean" => "bool",
        "System.Byte" => "byte",
        "System.SByte" => "sbyte",
        "System.Char" => "char",
        "System.Int16" => "short",
        "System.UInt16" => "ushort",
        "System.Int32" => "int",
        "System.UInt32" => "uint",
        "System.Int64" => "long",
        "System.UInt64" => "ulong",
        "System.Single" => "float",
        "System.Double" => "double",
        "System.Decimal" => "decimal",
        "System.String" => "string",
        "System.Object" => "object",
        other => other,
    }
}

/// Implicit numeric conversions
fn widens_to(from: &str) -> &'static [&'static str] {
    match from {
        "sbyte" => &["short", "int", "long", "float", "double", "decimal"],
        "byte" => &[
            "short", "ushort", "int", "uint", "long", "ulong", "float", "double", "decimal",
        ],
        "short" => &["int", "long", "float", "double", "decimal"],
        "ushort" => &["int", "uint", "long", "ulong", "float", "double", "decimal"],
        "int" => &["long", "float", "double", "decimal"],
        "uint" => &["long", "ulong", "float", "double", "decimal"],
        "long" | "ulong" => &["float", "double", "decimal"],
        "char" => &[
            "ushort", "int", "uint", "long", "ulong", "float", "double", "decimal",
        ],
        "float" => &["double"],
        _ => &[],
    }
}

/// Canonical spelling: primitives by keyword, `System.*` aliases folded in
fn canonical(ty: &TypeRef) -> Option<&str> {
    match ty {
        TypeRef::Primitive(name) | TypeRef::Named(name) => Some(keyword(name)),
        TypeRef::Enumerable(_) => None,
    }
}

fn is_value_keyword(name: &str) -> bool {
    matches!(
        name,
        "bool"
            | "byte"
            | "sbyte"
            | "char"
            | "short"
            | "ushort"
            | "int"
            | "uint"
            | "long"
            | "ulong"
            | "float"
            | "double"
            | "decimal"
    )
}

/// Reference types take part in enumerable covariance
fn is_reference(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Primitive(_) | TypeRef::Named(_) => {
            canonical(ty).is_some_and(|name| !is_value_keyword(name))
        }
        TypeRef::Enumerable(_) => true,
    }
}

/// `ty` with every described named type spelled fully qualified.
///
/// Annotations and exporters may write `Address` or `global::App.Address`;
/// comparisons only ever see the provider's name.
pub fn qualified(provider: &dyn TypeProvider, ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::Named(name) => provider
            .resolve(name)
            .map_or_else(|| ty.clone(), TypeDescriptor::as_type_ref),
        TypeRef::Enumerable(element) => TypeRef::enumerable(qualified(provider, element)),
        TypeRef::Primitive(_) => ty.clone(),
    }
}

/// Can a value of type `from` be assigned to `to` without conversion code?
pub fn is_assignable(provider: &dyn TypeProvider, from: &TypeRef, to: &TypeRef) -> bool {
    assignable(provider, &qualified(provider, from), &qualified(provider, to))
}

fn assignable(provider: &dyn TypeProvider, from: &TypeRef, to: &TypeRef) -> bool {
    if from == to {
        return true;
    }

    match (from, to) {
        (TypeRef::Enumerable(from_element), TypeRef::Enumerable(to_element)) => {
            same_type(from_element, to_element)
                || (is_reference(from_element) && assignable(provider, from_element, to_element))
        }
        (_, TypeRef::Enumerable(_)) => false,
        _ => {
            let (Some(from_name), Some(to_name)) = (canonical(from), canonical(to)) else {
                // An enumerable only flows into `object`
                return canonical(to) == Some("object");
            };
            from_name == to_name
                || to_name == "object"
                || widens_to(from_name).iter().any(|w| *w == to_name)
                || (matches!(from, TypeRef::Named(_))
                    && matches!(to, TypeRef::Named(_))
                    && is_subtype(provider, from_name, to_name))
        }
    }
}

/// Same type once names are qualified and aliases are folded
pub fn equivalent(provider: &dyn TypeProvider, a: &TypeRef, b: &TypeRef) -> bool {
    same_type(&qualified(provider, a), &qualified(provider, b))
}

fn same_type(a: &TypeRef, b: &TypeRef) -> bool {
    match (a, b) {
        (TypeRef::Enumerable(a), TypeRef::Enumerable(b)) => same_type(a, b),
        (TypeRef::Enumerable(_), _) | (_, TypeRef::Enumerable(_)) => false,
        _ => canonical(a) == canonical(b),
    }
}
