//! Synthesis of the generated class tree for one declaration.

use std::collections::HashSet;

use autopojo_core::model::{Declaration, DeclarationKind};
use autopojo_core::types::{TypeReference, parse_type};

use crate::error::GenError;
use crate::names::{NameResolver, ResolvedName};
use crate::rewrite::TypeRewriter;

/// Java keywords that cannot be used as field names.
const RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface",
    "long", "native", "new", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "try", "void", "volatile", "while", "true", "false", "null",
];

/// One immutable field backing an accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedField {
    pub name: String,
    /// Accessor method name, as declared on the source interface.
    pub accessor: String,
    pub ty: TypeReference,
}

/// The shape of a generated class and every class nested in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedClass {
    pub name: ResolvedName,
    /// Qualified name of the source interface.
    pub source: String,
    /// Type parameters in declaration form, bounds already rewritten.
    pub type_params: Vec<TypeReference>,
    pub fields: Vec<GeneratedField>,
    pub nested: Vec<GeneratedClass>,
}

impl GeneratedClass {
    pub fn is_top_level(&self) -> bool {
        self.name.is_top_level()
    }
}

/// Builds [`GeneratedClass`] trees from interface declarations.
#[derive(Debug, Clone, Copy)]
pub struct ClassSynthesizer<'a, 'r> {
    names: &'a NameResolver<'r>,
    rewriter: TypeRewriter<'a, 'r>,
}

impl<'a, 'r> ClassSynthesizer<'a, 'r> {
    pub fn new(names: &'a NameResolver<'r>) -> Self {
        Self {
            names,
            rewriter: TypeRewriter::new(names),
        }
    }

    /// Synthesize `decl` and, recursively, every interface nested in it.
    pub fn synthesize(&self, decl: &Declaration) -> Result<GeneratedClass, GenError> {
        let name = self.names.resolve_strict(decl)?;
        let source = decl.qualified_name();

        let type_params = decl
            .parsed_type_params()
            .map_err(|source_err| GenError::InvalidType {
                member: source.clone(),
                source: source_err,
            })?;
        let type_params = self.rewriter.rewrite_all(&type_params);

        let scope = decl.type_param_names();
        let fields = decl
            .accessors
            .iter()
            .map(|accessor| -> Result<GeneratedField, GenError> {
                let ty = parse_type(&accessor.return_type, &scope).map_err(|source_err| {
                    GenError::InvalidType {
                        member: format!("{}#{}", source, accessor.name),
                        source: source_err,
                    }
                })?;
                Ok(GeneratedField {
                    name: field_name(&accessor.name),
                    accessor: accessor.name.clone(),
                    ty: self.rewriter.rewrite(&ty),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut taken = HashSet::new();
        if let Some(clash) = fields.iter().find(|f| !taken.insert(f.name.as_str())) {
            return Err(GenError::DuplicateField {
                member: format!("{}#{}", source, clash.accessor),
                field: clash.name.clone(),
            });
        }

        let nested = self
            .names
            .repository()
            .nested_in(decl)
            .filter(|d| d.kind == DeclarationKind::Interface)
            .map(|d| self.synthesize(d))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            source = %source,
            generated = %name,
            fields = fields.len(),
            nested = nested.len(),
            "synthesized class"
        );

        Ok(GeneratedClass {
            name,
            source,
            type_params,
            fields,
            nested,
        })
    }
}

/// Field name for an accessor: `getFoo`/`isFoo` become `foo`, anything else
/// is used as is. Follows bean decapitalization, so `getURL` becomes `URL`.
pub fn field_name(accessor: &str) -> String {
    for prefix in ["get", "is"] {
        if let Some(rest) = accessor.strip_prefix(prefix)
            && rest.chars().next().is_some_and(char::is_uppercase)
        {
            let candidate = decapitalize(rest);
            if !RESERVED.contains(&candidate.as_str()) {
                return candidate;
            }
        }
    }
    accessor.to_string()
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(_), Some(second)) if second.is_uppercase() => name.to_string(),
        (Some(first), _) => first.to_lowercase().chain(name.chars().skip(1)).collect(),
        (None, _) => String::new(),
    }
}
