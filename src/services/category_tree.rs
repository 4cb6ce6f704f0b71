//! In-memory view of the category forest.
//!
//! Loaded from the repository inside the caller's transaction, so every
//! decision made against it sees the same snapshot that the writes land on.
//! Nodes are keyed by id with an explicit parent -> children index; no node
//! holds a reference to another.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::category;
use crate::errors::ServiceError;
use crate::services::slug;

#[derive(Debug, Default, Clone)]
pub struct CategoryTree {
    nodes: HashMap<Uuid, category::Model>,
    children: HashMap<Option<Uuid>, Vec<Uuid>>,
}

/// Nested read model of a category and its subtree.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryTreeNode {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub slug_url: String,
    pub featured: bool,
    pub is_active: bool,
    pub sort_order: i32,
    #[schema(no_recursion)]
    pub children: Vec<CategoryTreeNode>,
}

impl CategoryTree {
    pub fn new(models: impl IntoIterator<Item = category::Model>) -> Self {
        let mut tree = Self::default();
        for model in models {
            tree.children.entry(model.parent_id).or_default().push(model.id);
            tree.nodes.insert(model.id, model);
        }

        let nodes = &tree.nodes;
        for ids in tree.children.values_mut() {
            ids.sort_by(|a, b| {
                let (a, b) = (&nodes[a], &nodes[b]);
                a.sort_order
                    .cmp(&b.sort_order)
                    .then_with(|| a.name.cmp(&b.name))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&category::Model> {
        self.nodes.get(&id)
    }

    /// Direct children of `parent` (`None` for roots), in display order.
    pub fn children_of(&self, parent: Option<Uuid>) -> impl Iterator<Item = &category::Model> {
        self.children
            .get(&parent)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.nodes.get(id))
    }

    /// True when making `proposed_parent_id` the parent of `category_id`
    /// would put `category_id` on its own ancestor chain.
    ///
    /// The walk is capped at the node count; a longer chain means the stored
    /// graph already contains a cycle and is reported as a structural error.
    pub fn would_create_cycle(
        &self,
        category_id: Uuid,
        proposed_parent_id: Uuid,
    ) -> Result<bool, ServiceError> {
        if category_id == proposed_parent_id {
            return Ok(true);
        }

        let cap = self.nodes.len();
        let mut steps = 0usize;
        let mut current = Some(proposed_parent_id);

        while let Some(id) = current {
            if id == category_id {
                return Ok(true);
            }
            steps += 1;
            if steps > cap {
                return Err(ServiceError::structural(format!(
                    "ancestor walk from category {} exceeded {} steps",
                    proposed_parent_id, cap
                )));
            }
            current = self.nodes.get(&id).and_then(|node| node.parent_id);
        }

        Ok(false)
    }

    /// New `slug_url` for every descendant of `root_id` once the root's own
    /// path becomes `new_root_path`.
    ///
    /// The root's old path prefix is swapped for the new one; each
    /// descendant keeps its own slug segment. Every descendant appears at most
    /// once in the result.
    pub fn cascade_paths(
        &self,
        root_id: Uuid,
        new_root_path: &str,
    ) -> Result<Vec<(Uuid, String)>, ServiceError> {
        let root = self.nodes.get(&root_id).ok_or_else(|| {
            ServiceError::structural(format!("category {} missing from tree", root_id))
        })?;
        let old_prefix = format!("{}/", root.slug_url);

        let mut updates = Vec::new();
        let mut visited: HashSet<Uuid> = HashSet::from([root_id]);
        let mut worklist: VecDeque<(Uuid, String)> = self
            .children_of(Some(root_id))
            .map(|child| (child.id, new_root_path.to_string()))
            .collect();

        while let Some((id, parent_path)) = worklist.pop_front() {
            if !visited.insert(id) {
                warn!(category_id = %id, "category reached twice during path cascade, skipping");
                continue;
            }
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };

            let new_path = match node.slug_url.strip_prefix(old_prefix.as_str()) {
                Some(rest) => format!("{}/{}", new_root_path, rest),
                None => slug::generate_path(&node.slug, Some(&parent_path)),
            };

            for child in self.children_of(Some(id)) {
                worklist.push_back((child.id, new_path.clone()));
            }
            updates.push((id, new_path));
        }

        Ok(updates)
    }

    /// Every category below `id`, excluding `id` itself.
    pub fn descendant_ids(&self, id: Uuid) -> Vec<Uuid> {
        let mut out = Vec::new();
        let mut visited: HashSet<Uuid> = HashSet::from([id]);
        let mut worklist: VecDeque<Uuid> = self.children_of(Some(id)).map(|c| c.id).collect();

        while let Some(next) = worklist.pop_front() {
            if !visited.insert(next) {
                continue;
            }
            out.push(next);
            worklist.extend(self.children_of(Some(next)).map(|c| c.id));
        }
        out
    }

    /// Nested view of the whole forest. With `active_only`, an inactive
    /// category hides its entire subtree.
    pub fn nested(&self, active_only: bool) -> Vec<CategoryTreeNode> {
        let mut visited = HashSet::new();
        self.nested_children(None, active_only, &mut visited)
    }

    fn nested_children(
        &self,
        parent: Option<Uuid>,
        active_only: bool,
        visited: &mut HashSet<Uuid>,
    ) -> Vec<CategoryTreeNode> {
        let ids: Vec<Uuid> = self.children_of(parent).map(|c| c.id).collect();
        let mut out = Vec::with_capacity(ids.len());

        for id in ids {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if active_only && !node.is_active {
                continue;
            }
            out.push(CategoryTreeNode {
                id: node.id,
                name: node.name.clone(),
                slug: node.slug.clone(),
                slug_url: node.slug_url.clone(),
                featured: node.featured,
                is_active: node.is_active,
                sort_order: node.sort_order,
                children: self.nested_children(Some(id), active_only, visited),
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use proptest::prelude::*;

    fn node(id: Uuid, parent: Option<Uuid>, slug: &str, slug_url: &str) -> category::Model {
        let now = Utc::now();
        category::Model {
            id,
            parent_id: parent,
            name: slug.to_string(),
            description: None,
            slug: slug.to_string(),
            slug_url: slug_url.to_string(),
            featured: false,
            is_active: true,
            sort_order: 0,
            featured_order: 0,
            meta_title: None,
            meta_description: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn chain() -> (CategoryTree, Uuid, Uuid, Uuid) {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let tree = CategoryTree::new(vec![
            node(a, None, "a", "a"),
            node(b, Some(a), "b", "a/b"),
            node(c, Some(b), "c", "a/b/c"),
        ]);
        (tree, a, b, c)
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let (tree, a, _, _) = chain();
        assert!(tree.would_create_cycle(a, a).unwrap());
    }

    #[test]
    fn descendant_as_parent_is_a_cycle() {
        let (tree, a, b, c) = chain();
        assert!(tree.would_create_cycle(a, c).unwrap());
        assert!(tree.would_create_cycle(a, b).unwrap());
        assert!(!tree.would_create_cycle(c, a).unwrap());
        assert!(!tree.would_create_cycle(b, a).unwrap());
    }

    #[test]
    fn malformed_graph_reports_structural_error() {
        let (x, y, z) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let tree = CategoryTree::new(vec![
            node(x, Some(y), "x", "y/x"),
            node(y, Some(x), "y", "x/y"),
            node(z, None, "z", "z"),
        ]);
        let err = tree.would_create_cycle(z, x).unwrap_err();
        assert_matches!(err, ServiceError::StructuralIntegrity(_));
    }

    #[test]
    fn rename_root_cascades_to_all_descendants() {
        let (tree, a, b, c) = chain();
        let mut updates = tree.cascade_paths(a, "a2").unwrap();
        updates.sort_by(|l, r| l.1.cmp(&r.1));
        assert_eq!(updates, vec![(b, "a2/b".to_string()), (c, "a2/b/c".to_string())]);
    }

    #[test]
    fn cascade_visits_each_descendant_once_in_a_corrupt_graph() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        // b and c point at each other below a.
        let tree = CategoryTree::new(vec![
            node(a, None, "a", "a"),
            node(b, Some(c), "b", "a/c/b"),
            node(c, Some(b), "c", "a/b/c"),
        ]);
        let updates = tree.cascade_paths(b, "x").unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, c);
    }

    #[test]
    fn descendant_ids_excludes_self() {
        let (tree, a, b, c) = chain();
        let mut ids = tree.descendant_ids(a);
        ids.sort();
        let mut expected = vec![b, c];
        expected.sort();
        assert_eq!(ids, expected);
        assert!(tree.descendant_ids(c).is_empty());
    }

    #[test]
    fn nested_hides_inactive_subtrees() {
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut hidden = node(b, Some(a), "b", "a/b");
        hidden.is_active = false;
        let mut second = node(d, Some(a), "d", "a/d");
        second.sort_order = -1;
        let tree = CategoryTree::new(vec![
            node(a, None, "a", "a"),
            hidden,
            node(c, Some(b), "c", "a/b/c"),
            second,
        ]);

        let all = tree.nested(false);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].children.len(), 2);
        assert_eq!(all[0].children[0].id, d);

        let active = tree.nested(true);
        assert_eq!(active[0].children.len(), 1);
        assert_eq!(active[0].children[0].id, d);
    }

    proptest! {
        // Random forest: node i picks a parent among 0..i, so it is acyclic by
        // construction. A node's descendants must be exactly the nodes that
        // would close a cycle.
        #[test]
        fn cycle_iff_descendant(parents in proptest::collection::vec(proptest::option::of(0usize..64), 1..24)) {
            let ids: Vec<Uuid> = (0..parents.len()).map(|_| Uuid::new_v4()).collect();
            let models = parents.iter().enumerate().map(|(i, p)| {
                let parent = p.filter(|p| *p < i).map(|p| ids[p]);
                node(ids[i], parent, "n", "n")
            });
            let tree = CategoryTree::new(models);

            for &c in &ids {
                let descendants: HashSet<Uuid> = tree.descendant_ids(c).into_iter().collect();
                for &p in &ids {
                    let expected = p == c || descendants.contains(&p);
                    prop_assert_eq!(tree.would_create_cycle(c, p).unwrap(), expected);
                }
            }
        }
    }
}
