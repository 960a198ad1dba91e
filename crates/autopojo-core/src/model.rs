//! Source declaration model.
//!
//! Declarations are produced by discovery before a generation round starts
//! and are never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::types::{TypeParseError, TypeReference, parse_type};

/// Shape of a source declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// An interface; the only shape a data class is generated for.
    Interface,
    /// An annotation type carrying the marker, used to group other declarations.
    MarkerGroup,
    /// Classes, enums, records, and anything else.
    Other,
}

/// Marker metadata attached to a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Explicit simple name for the generated class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Marker {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// The override name, if one was given and is not blank.
    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// A generic type parameter with its bounds as type text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParam {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bounds: Vec<String>,
}

/// A zero-argument accessor method declared on an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessor {
    pub name: String,
    /// Return type as Java type text, e.g. `java.util.List<pkg.UserPOJO>`.
    pub return_type: String,
}

/// A source-level type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Simple name, e.g. `UserPOJO`.
    pub name: String,
    /// Package the declaration lives in. Empty for the default package.
    #[serde(default)]
    pub package: String,
    /// Qualified name of the enclosing type declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosing: Option<String>,
    pub kind: DeclarationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    /// Qualified names of annotations applied to this declaration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_params: Vec<TypeParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<Accessor>,
}

impl Declaration {
    /// Create a top-level declaration with no marker, annotations, or members.
    pub fn new(package: impl Into<String>, name: impl Into<String>, kind: DeclarationKind) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            enclosing: None,
            kind,
            marker: None,
            annotations: Vec::new(),
            type_params: Vec::new(),
            accessors: Vec::new(),
        }
    }

    /// Shorthand for an interface declaration.
    pub fn interface(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(package, name, DeclarationKind::Interface)
    }

    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Place this declaration inside `parent`, inheriting its package.
    #[must_use]
    pub fn nested_in(mut self, parent: &Declaration) -> Self {
        self.package.clone_from(&parent.package);
        self.enclosing = Some(parent.qualified_name());
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    #[must_use]
    pub fn with_type_param(mut self, name: impl Into<String>, bounds: &[&str]) -> Self {
        self.type_params.push(TypeParam {
            name: name.into(),
            bounds: bounds.iter().map(|b| (*b).to_string()).collect(),
        });
        self
    }

    #[must_use]
    pub fn with_accessor(mut self, name: impl Into<String>, return_type: impl Into<String>) -> Self {
        self.accessors.push(Accessor {
            name: name.into(),
            return_type: return_type.into(),
        });
        self
    }

    /// Fully qualified source name, e.g. `pkg.UserPOJO.Address`.
    pub fn qualified_name(&self) -> String {
        match (&self.enclosing, self.package.is_empty()) {
            (Some(enclosing), _) => format!("{}.{}", enclosing, self.name),
            (None, true) => self.name.clone(),
            (None, false) => format!("{}.{}", self.package, self.name),
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.enclosing.is_none()
    }

    /// Names of the declared type parameters, for use as a parse scope.
    pub fn type_param_names(&self) -> Vec<&str> {
        self.type_params.iter().map(|p| p.name.as_str()).collect()
    }

    /// Parse every type parameter into a [`TypeReference::TypeVariable`] carrying
    /// its bounds. References to any in-scope parameter inside a bound are bare
    /// variable leaves, so `T extends Comparable<T>` stays finite.
    pub fn parsed_type_params(&self) -> Result<Vec<TypeReference>, TypeParseError> {
        let scope = self.type_param_names();
        self.type_params
            .iter()
            .map(|param| {
                let bounds = param
                    .bounds
                    .iter()
                    .map(|b| parse_type(b, &scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TypeReference::variable(param.name.clone(), bounds))
            })
            .collect()
    }
}
