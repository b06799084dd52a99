//! Category hierarchy.
//!
//! Categories are stored flat, each pointing at its parent. This module turns
//! the flat list into a forest of [`CategoryNode`]s and maps that forest into
//! the `{id, category_name, children}` shape served by the API.
//!
//! The builder makes one grouping pass (`parent_id -> [input positions]`) and
//! then assembles recursively from the requested parent, so sibling order is
//! the order the categories were given in unless [`SiblingOrder::Sequence`] is
//! asked for. A category whose parent does not exist is unreachable from any
//! root and is left out; [`unreachable_categories`] reports those. A parent
//! chain that loops back on itself is an integrity error.

use crate::model::Category;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use uuid::Uuid;

/// A category with its recursively assembled children.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryNode {
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(CategoryNode::node_count).sum::<usize>()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Presentation shape of a tree node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    pub id: String,
    pub category_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryView>,
}

/// How siblings are ordered in the assembled tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiblingOrder {
    /// Order of first appearance in the input.
    #[default]
    Insertion,
    /// Ascending `sequence`, categories without one last, ties broken by id.
    Sequence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The parent chain through `id` loops back on itself.
    Cycle { id: Uuid },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Cycle { id } => {
                write!(f, "category hierarchy contains a cycle through {id}")
            }
        }
    }
}

impl std::error::Error for TreeError {}

type Groups = HashMap<Option<Uuid>, Vec<usize>>;

fn group_by_parent(categories: &[Category]) -> Groups {
    let mut groups: Groups = HashMap::with_capacity(categories.len());
    for (idx, category) in categories.iter().enumerate() {
        groups.entry(category.parent_id).or_default().push(idx);
    }
    groups
}

fn by_sequence(a: &Category, b: &Category) -> Ordering {
    match (a.sequence, b.sequence) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

fn assemble(
    categories: &[Category],
    groups: &Groups,
    parent: Option<Uuid>,
    order: SiblingOrder,
    path: &mut HashSet<Uuid>,
) -> Result<Vec<CategoryNode>, TreeError> {
    let Some(indices) = groups.get(&parent) else {
        return Ok(Vec::new());
    };

    let mut siblings: Vec<&Category> = indices.iter().map(|&i| &categories[i]).collect();
    if order == SiblingOrder::Sequence {
        siblings.sort_by(|a, b| by_sequence(a, b));
    }

    let mut nodes = Vec::with_capacity(siblings.len());
    for category in siblings {
        if !path.insert(category.id) {
            return Err(TreeError::Cycle { id: category.id });
        }
        let children = assemble(categories, groups, Some(category.id), order, path)?;
        path.remove(&category.id);

        nodes.push(CategoryNode {
            category: category.clone(),
            children,
        });
    }
    Ok(nodes)
}

/// Build the forest hanging under `parent` (`None` selects the roots).
///
/// Every returned node's category has `parent_id == parent`, and each node's
/// children are the categories whose `parent_id` is that node's id.
///
/// # Errors
///
/// [`TreeError::Cycle`] when a parent chain loops, including a duplicated
/// id that would nest under itself.
pub fn build_subtree(
    categories: &[Category],
    parent: Option<Uuid>,
    order: SiblingOrder,
) -> Result<Vec<CategoryNode>, TreeError> {
    let groups = group_by_parent(categories);
    let mut path = HashSet::new();
    if let Some(start) = parent {
        path.insert(start);
    }
    assemble(categories, &groups, parent, order, &mut path)
}

/// Build the full forest from the roots in input order.
pub fn build_category_tree(categories: &[Category]) -> Result<Vec<CategoryNode>, TreeError> {
    build_subtree(categories, None, SiblingOrder::Insertion)
}

/// Categories that no root reaches: dangling parents and loop members.
pub fn unreachable_categories(categories: &[Category]) -> Vec<&Category> {
    let groups = group_by_parent(categories);
    let mut reached = vec![false; categories.len()];
    let mut queue: VecDeque<usize> = groups.get(&None).cloned().unwrap_or_default().into();

    while let Some(idx) = queue.pop_front() {
        if reached[idx] {
            continue;
        }
        reached[idx] = true;
        if let Some(children) = groups.get(&Some(categories[idx].id)) {
            queue.extend(children.iter().copied().filter(|&c| !reached[c]));
        }
    }

    categories
        .iter()
        .zip(reached)
        .filter_map(|(c, r)| (!r).then_some(c))
        .collect()
}

/// True when `candidate` sits strictly below `ancestor`.
///
/// Walks up from `candidate`; a looping chain stops after visiting every
/// category once.
pub fn is_descendant(categories: &[Category], ancestor: Uuid, candidate: Uuid) -> bool {
    let parents: HashMap<Uuid, Option<Uuid>> =
        categories.iter().map(|c| (c.id, c.parent_id)).collect();

    let mut current = parents.get(&candidate).copied().flatten();
    let mut steps = 0;
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        steps += 1;
        if steps > parents.len() {
            break;
        }
        current = parents.get(&id).copied().flatten();
    }
    false
}

/// Map assembled nodes to their presentation shape.
pub fn to_view(nodes: &[CategoryNode]) -> Vec<CategoryView> {
    nodes
        .iter()
        .map(|node| CategoryView {
            id: node.category.id.to_string(),
            category_name: node.category.name.clone(),
            children: to_view(&node.children),
        })
        .collect()
}
