//! Substitution of marked interfaces inside type expressions.

use autopojo_core::types::TypeReference;

use crate::names::NameResolver;

/// Rewrites type expressions so that every reference to a generated-for
/// declaration points at the generated class instead.
///
/// Rewriting is total: names that are not in the repository, or that resolve
/// to nothing, are returned unchanged.
#[derive(Debug, Clone, Copy)]
pub struct TypeRewriter<'a, 'r> {
    names: &'a NameResolver<'r>,
}

impl<'a, 'r> TypeRewriter<'a, 'r> {
    pub fn new(names: &'a NameResolver<'r>) -> Self {
        Self { names }
    }

    /// Rewrite `ty`, preserving its shape, argument order, and variance.
    pub fn rewrite(&self, ty: &TypeReference) -> TypeReference {
        match ty {
            TypeReference::Named { name } => self
                .substitute(name)
                .map_or_else(|| ty.clone(), TypeReference::named),
            TypeReference::Parameterized { raw, args } => {
                TypeReference::parameterized(self.rewrite(raw), self.rewrite_all(args))
            }
            TypeReference::Wildcard { bound: None, .. } => ty.clone(),
            TypeReference::Wildcard {
                bound: Some(bound),
                variance,
            } => TypeReference::Wildcard {
                bound: Some(Box::new(self.rewrite(bound))),
                variance: *variance,
            },
            TypeReference::Array { element } => TypeReference::array(self.rewrite(element)),
            // Bounds are a finite list; a variable mentioned inside its own bound
            // is a bare leaf, so this never revisits the same occurrence.
            TypeReference::TypeVariable { name, bounds } => {
                TypeReference::variable(name.clone(), self.rewrite_all(bounds))
            }
        }
    }

    pub fn rewrite_all(&self, types: &[TypeReference]) -> Vec<TypeReference> {
        types.iter().map(|t| self.rewrite(t)).collect()
    }

    fn substitute(&self, qualified_name: &str) -> Option<String> {
        let decl = self.names.repository().get(qualified_name)?;
        self.names.resolve_lenient(decl).map(|n| n.qualified())
    }
}
