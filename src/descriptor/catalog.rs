//! Type metadata provider seam and its in-memory implementation.
//!
//! The resolver never discovers types itself; it asks a [`TypeProvider`].
//! [`TypeCatalog`] is the provider used by the CLI and tests, loaded from a
//! JSON [`MetadataDocument`] written by whatever front end reflects the
//! user's compilation.

use super::TypeDescriptor;
use crate::error::{MapError, MapResult};
use crate::types::simple_name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Source of type descriptions for a resolution run
pub trait TypeProvider: Send + Sync {
    /// Look up a type by its exact fully qualified name
    fn get(&self, name: &str) -> Option<&TypeDescriptor>;

    /// Resolve a name as written in an annotation.
    ///
    /// The default accepts fully qualified names only, with an optional
    /// `global::` prefix.
    fn resolve(&self, name: &str) -> Option<&TypeDescriptor> {
        let name = name.trim();
        self.get(name.strip_prefix("global::").unwrap_or(name))
    }

    /// All described types in a stable order
    fn types(&self) -> Vec<&TypeDescriptor>;
}

/// Serialized form of a catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataDocument {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
}

fn default_version() -> u32 {
    1
}

/// In-memory [`TypeProvider`] keeping declaration order
#[derive(Debug, Default)]
pub struct TypeCatalog {
    types: Vec<TypeDescriptor>,
    by_name: HashMap<String, usize>,
    by_simple_name: HashMap<String, Vec<usize>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_types(types: Vec<TypeDescriptor>) -> MapResult<Self> {
        let mut catalog = Self::new();
        for ty in types {
            catalog.insert(ty)?;
        }
        Ok(catalog)
    }

    pub fn from_document(document: MetadataDocument) -> MapResult<Self> {
        Self::from_types(document.types)
    }

    pub fn from_json_str(json: &str) -> Result<Self, MapError> {
        let document: MetadataDocument =
            serde_json::from_str(json).map_err(|e| MapError::MetadataParse {
                path: "<inline>".into(),
                reason: e.to_string(),
            })?;
        Self::from_document(document)
    }

    /// Load a metadata document from disk
    pub fn load(path: impl AsRef<Path>) -> MapResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| MapError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let document: MetadataDocument =
            serde_json::from_str(&content).map_err(|e| MapError::MetadataParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            "loaded {} type descriptions from {}",
            document.types.len(),
            path.display()
        );
        Self::from_document(document)
    }

    pub fn insert(&mut self, mut ty: TypeDescriptor) -> MapResult<()> {
        if self.by_name.contains_key(&ty.name) {
            return Err(MapError::DuplicateType { name: ty.name });
        }
        ty.normalize();

        let index = self.types.len();
        self.by_name.insert(ty.name.clone(), index);
        self.by_simple_name
            .entry(simple_name(&ty.name).to_string())
            .or_default()
            .push(index);
        self.types.push(ty);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn to_document(&self) -> MetadataDocument {
        MetadataDocument {
            version: default_version(),
            types: self.types.clone(),
        }
    }
}

impl TypeProvider for TypeCatalog {
    fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    /// Fully qualified names win; otherwise an unambiguous simple name is accepted,
    /// since annotations usually reference types the way `typeof(User)` does.
    fn resolve(&self, name: &str) -> Option<&TypeDescriptor> {
        let name = name.trim();
        let name = name.strip_prefix("global::").unwrap_or(name);
        if let Some(ty) = self.get(name) {
            return Some(ty);
        }

        match self.by_simple_name.get(simple_name(name)) {
            Some(indices) if indices.len() == 1 => {
                let ty = &self.types[indices[0]];
                // A partially qualified name must still agree with the full one
                if name.contains('.') && !ty.name.ends_with(&format!(".{name}")) {
                    return None;
                }
                Some(ty)
            }
            _ => None,
        }
    }

    fn types(&self) -> Vec<&TypeDescriptor> {
        self.types.iter().collect()
    }
}
