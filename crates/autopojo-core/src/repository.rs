//! Read-only lookup of source declarations by qualified name.
//!
//! Built once before a round and shared by reference across every
//! generation task; nothing here takes `&mut self` after construction.

use std::collections::{HashMap, HashSet};

use crate::model::{Declaration, DeclarationKind, Marker};

/// Errors raised while building a repository.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("duplicate declaration `{0}`")]
    Duplicate(String),
}

/// Declarations indexed by qualified name, enclosing scope, and applied annotation.
#[derive(Debug, Default)]
pub struct DeclarationRepository {
    declarations: HashMap<String, Declaration>,
    /// Qualified names in discovery order.
    order: Vec<String>,
    /// Enclosing qualified name -> nested declarations, in discovery order.
    nested: HashMap<String, Vec<String>>,
    /// Annotation qualified name -> annotated declarations, in discovery order.
    annotated: HashMap<String, Vec<String>>,
}

impl DeclarationRepository {
    /// Index `declarations`, keeping their order. Qualified names must be unique.
    ///
    /// A declaration's qualified name is its enclosing name plus one segment, so
    /// enclosing chains are strictly shrinking and can never form a cycle.
    pub fn new(
        declarations: impl IntoIterator<Item = Declaration>,
    ) -> Result<Self, RepositoryError> {
        let mut repo = Self::default();

        for decl in declarations {
            let qualified = decl.qualified_name();
            if repo.declarations.contains_key(&qualified) {
                return Err(RepositoryError::Duplicate(qualified));
            }
            if let Some(enclosing) = &decl.enclosing {
                repo.nested
                    .entry(enclosing.clone())
                    .or_default()
                    .push(qualified.clone());
            }
            for annotation in &decl.annotations {
                repo.annotated
                    .entry(annotation.clone())
                    .or_default()
                    .push(qualified.clone());
            }
            repo.order.push(qualified.clone());
            repo.declarations.insert(qualified, decl);
        }

        Ok(repo)
    }

    pub fn get(&self, qualified_name: &str) -> Option<&Declaration> {
        self.declarations.get(qualified_name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All declarations in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.lookup_all(&self.order)
    }

    /// The enclosing declaration, if `decl` is nested in a known type.
    pub fn enclosing_of(&self, decl: &Declaration) -> Option<&Declaration> {
        decl.enclosing.as_deref().and_then(|e| self.get(e))
    }

    /// Declarations directly nested in `decl`.
    pub fn nested_in(&self, decl: &Declaration) -> impl Iterator<Item = &Declaration> {
        let names = self
            .nested
            .get(&decl.qualified_name())
            .map_or(&[][..], Vec::as_slice);
        self.lookup_all(names)
    }

    /// Declarations carrying the annotation `annotation`.
    pub fn annotated_with(&self, annotation: &str) -> impl Iterator<Item = &Declaration> {
        let names = self
            .annotated
            .get(annotation)
            .map_or(&[][..], Vec::as_slice);
        self.lookup_all(names)
    }

    /// Declarations carrying the marker directly, in discovery order.
    ///
    /// This is the input set of a round: marker groups among them are expanded
    /// by the orchestrator, not here.
    pub fn marked(&self) -> Vec<&Declaration> {
        self.iter().filter(|d| d.marker.is_some()).collect()
    }

    /// Effective marker of `decl`: its own marker, or an empty one when it is
    /// annotated with a marker group that carries the marker, directly or
    /// through further groups.
    pub fn marker_of(&self, decl: &Declaration) -> Option<Marker> {
        if let Some(marker) = &decl.marker {
            return Some(marker.clone());
        }
        let mut visited = HashSet::new();
        self.inherits_marker(decl, &mut visited).then(Marker::default)
    }

    fn inherits_marker(&self, decl: &Declaration, visited: &mut HashSet<String>) -> bool {
        for annotation in &decl.annotations {
            let Some(group) = self.get(annotation) else {
                continue;
            };
            if group.kind != DeclarationKind::MarkerGroup || !visited.insert(annotation.clone()) {
                continue;
            }
            if group.marker.is_some() || self.inherits_marker(group, visited) {
                return true;
            }
        }
        false
    }

    fn lookup_all<'a>(&'a self, names: &'a [String]) -> impl Iterator<Item = &'a Declaration> {
        names.iter().filter_map(|n| self.declarations.get(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DeclarationRepository {
        let user = Declaration::interface("pkg", "UserPOJO").with_marker(Marker::default());
        let address = Declaration::interface("pkg", "Address").nested_in(&user);
        let group = Declaration::new("pkg", "Model", DeclarationKind::MarkerGroup)
            .with_marker(Marker::default());
        let order = Declaration::interface("pkg", "Order").with_annotation("pkg.Model");
        DeclarationRepository::new([user, address, group, order]).unwrap()
    }

    #[test]
    fn test_lookup_by_qualified_name() {
        let repo = sample();
        assert_eq!(repo.len(), 4);
        assert!(repo.get("pkg.UserPOJO.Address").is_some());
        assert!(repo.get("pkg.Address").is_none());
        assert!(repo.get("java.lang.String").is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let a = Declaration::interface("pkg", "A");
        let result = DeclarationRepository::new([a.clone(), a]);
        assert!(matches!(result, Err(RepositoryError::Duplicate(name)) if name == "pkg.A"));
    }

    #[test]
    fn test_enclosing_and_nested() {
        let repo = sample();
        let address = repo.get("pkg.UserPOJO.Address").unwrap();
        let user = repo.enclosing_of(address).unwrap();
        assert_eq!(user.name, "UserPOJO");
        let nested: Vec<_> = repo.nested_in(user).map(|d| d.name.as_str()).collect();
        assert_eq!(nested, vec!["Address"]);
        assert!(repo.enclosing_of(user).is_none());
    }

    #[test]
    fn test_marked_keeps_discovery_order() {
        let repo = sample();
        let marked: Vec<_> = repo.marked().iter().map(|d| d.name.clone()).collect();
        assert_eq!(marked, vec!["UserPOJO", "Model"]);
    }

    #[test]
    fn test_marker_of_through_group() {
        let repo = sample();
        let order = repo.get("pkg.Order").unwrap();
        assert_eq!(repo.marker_of(order), Some(Marker::default()));
        let address = repo.get("pkg.UserPOJO.Address").unwrap();
        assert_eq!(repo.marker_of(address), None);
        let members: Vec<_> = repo.annotated_with("pkg.Model").map(|d| d.name.as_str()).collect();
        assert_eq!(members, vec!["Order"]);
    }

    #[test]
    fn test_marker_of_through_nested_groups() {
        let outer = Declaration::new("pkg", "Outer", DeclarationKind::MarkerGroup)
            .with_marker(Marker::default());
        let inner =
            Declaration::new("pkg", "Inner", DeclarationKind::MarkerGroup).with_annotation("pkg.Outer");
        let item = Declaration::interface("pkg", "Item").with_annotation("pkg.Inner");
        let repo = DeclarationRepository::new([outer, inner, item]).unwrap();

        assert_eq!(repo.marker_of(repo.get("pkg.Item").unwrap()), Some(Marker::default()));
        assert_eq!(repo.marker_of(repo.get("pkg.Inner").unwrap()), Some(Marker::default()));
    }

    #[test]
    fn test_marker_of_unmarked_group_cycle_terminates() {
        let a = Declaration::new("pkg", "A", DeclarationKind::MarkerGroup).with_annotation("pkg.B");
        let b = Declaration::new("pkg", "B", DeclarationKind::MarkerGroup).with_annotation("pkg.A");
        let item = Declaration::interface("pkg", "Item").with_annotation("pkg.A");
        let repo = DeclarationRepository::new([a, b, item]).unwrap();

        assert_eq!(repo.marker_of(repo.get("pkg.Item").unwrap()), None);
        assert_eq!(repo.marker_of(repo.get("pkg.A").unwrap()), None);
    }

    #[test]
    fn test_marker_of_ignores_non_group_annotations() {
        let marked = Declaration::interface("pkg", "Base").with_marker(Marker::default());
        let item = Declaration::interface("pkg", "Item").with_annotation("pkg.Base");
        let repo = DeclarationRepository::new([marked, item]).unwrap();

        assert_eq!(repo.marker_of(repo.get("pkg.Item").unwrap()), None);
    }
}
