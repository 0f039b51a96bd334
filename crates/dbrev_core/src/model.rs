use crate::DbError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The kind of node in the reverse-engineered tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Catalog,
    Schema,

    /// A table or view.
    Entity,

    Column,

    /// A stored routine. Always a leaf.
    Procedure,
}

impl ElementKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ElementKind::Catalog => "Catalog",
            ElementKind::Schema => "Schema",
            ElementKind::Entity => "Entity",
            ElementKind::Column => "Column",
            ElementKind::Procedure => "Procedure",
        }
    }

    /// Whether this kind may be attached under `parent` (`None` is the root).
    pub fn allowed_under(&self, parent: Option<ElementKind>) -> bool {
        use ElementKind::*;

        match parent {
            None => matches!(self, Catalog | Schema | Entity),
            Some(Catalog) => matches!(self, Schema | Entity | Procedure),
            Some(Schema) => matches!(self, Entity | Procedure),
            Some(Entity) => matches!(self, Column),
            Some(Column) | Some(Procedure) => false,
        }
    }

    /// Catalogs and schemas may be unnamed ("no catalog" / "no schema").
    pub fn is_namespace(&self) -> bool {
        matches!(self, ElementKind::Catalog | ElementKind::Schema)
    }
}

/// A node in the reverse-engineered tree.
///
/// Nodes are stored flat with parent references. The parent owns its
/// children exclusively; nodes are never moved or removed once added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbElement {
    pub id: Uuid,
    pub kind: ElementKind,

    /// `None` only for catalog/schema grouping nodes without a name.
    pub name: Option<String>,

    /// `None` means this node hangs directly off the root.
    pub parent_id: Option<Uuid>,

    /// Sort index for ordering siblings. Uses gaps (e.g., 1000, 2000).
    pub sort_index: i32,
}

impl DbElement {
    fn new(kind: ElementKind, name: Option<String>, parent_id: Option<Uuid>, sort_index: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name,
            parent_id,
            sort_index,
        }
    }

    /// Name for display, with a placeholder for unnamed namespaces.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<none>")
    }

    pub fn is(&self, kind: ElementKind) -> bool {
        self.kind == kind
    }
}

/// Gap between sort indices of consecutive siblings.
const SORT_INDEX_GAP: i32 = 1000;

type SiblingKey = (Option<Uuid>, ElementKind, Option<String>);

/// Persisted shape of [`DbModel`]; the lookup tables are rebuilt on load.
#[derive(Serialize, Deserialize)]
struct StoredModel {
    name: String,
    nodes: Vec<DbElement>,
    #[serde(default)]
    version: u32,
}

/// The hierarchical model produced by a reverse-engineering run.
///
/// The root is implicit and named after the data source. Every lookup is
/// by (parent, kind, name), so a parent never holds two children of the
/// same kind and name when insertions go through [`DbModel::find_or_create`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredModel", into = "StoredModel")]
pub struct DbModel {
    name: String,
    nodes: Vec<DbElement>,
    version: u32,
    positions: HashMap<Uuid, usize>,
    children: HashMap<Option<Uuid>, Vec<usize>>,
    siblings: HashMap<SiblingKey, Uuid>,
}

impl From<StoredModel> for DbModel {
    fn from(stored: StoredModel) -> Self {
        let mut model = DbModel {
            name: stored.name,
            nodes: Vec::with_capacity(stored.nodes.len()),
            version: stored.version,
            positions: HashMap::new(),
            children: HashMap::new(),
            siblings: HashMap::new(),
        };

        let mut nodes = stored.nodes;
        nodes.sort_by_key(|node| node.sort_index);
        for node in nodes {
            model.index_node(node);
        }
        model
    }
}

impl From<DbModel> for StoredModel {
    fn from(model: DbModel) -> Self {
        StoredModel {
            name: model.name,
            nodes: model.nodes,
            version: model.version,
        }
    }
}

impl DbModel {
    /// Creates an empty model whose root is labelled `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            version: 1,
            positions: HashMap::new(),
            children: HashMap::new(),
            siblings: HashMap::new(),
        }
    }

    /// Root label, usually the data source key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[DbElement] {
        &self.nodes
    }

    /// Root-level nodes, ordered by sort index.
    pub fn root_nodes(&self) -> Vec<&DbElement> {
        self.children(None)
    }

    /// Direct children of a node, ordered by sort index.
    pub fn children_of(&self, parent_id: Uuid) -> Vec<&DbElement> {
        self.children(Some(parent_id))
    }

    /// Direct children of `parent` (`None` is the root), ordered by sort index.
    pub fn children(&self, parent: Option<Uuid>) -> Vec<&DbElement> {
        self.children
            .get(&parent)
            .map(|positions| positions.iter().map(|&pos| &self.nodes[pos]).collect())
            .unwrap_or_default()
    }

    pub fn find_by_id(&self, id: Uuid) -> Option<&DbElement> {
        self.positions.get(&id).map(|&pos| &self.nodes[pos])
    }

    /// Looks up a direct child of `parent` by kind and name.
    pub fn find_child(
        &self,
        parent: Option<Uuid>,
        kind: ElementKind,
        name: Option<&str>,
    ) -> Option<&DbElement> {
        let key = (parent, kind, name.map(str::to_string));
        self.siblings.get(&key).and_then(|id| self.find_by_id(*id))
    }

    /// Appends a new child under `parent` (`None` is the root).
    ///
    /// Fails when the parent does not exist, when the hierarchy does not
    /// allow `kind` under the parent's kind, or when a non-namespace element
    /// has no name. Does not check for an existing sibling with the same
    /// name; use [`DbModel::find_or_create`] for that.
    pub fn add_element(
        &mut self,
        parent: Option<Uuid>,
        kind: ElementKind,
        name: Option<String>,
    ) -> Result<Uuid, DbError> {
        let parent_kind = match parent {
            Some(parent_id) => Some(
                self.find_by_id(parent_id)
                    .map(|node| node.kind)
                    .ok_or_else(|| {
                        DbError::InvalidElement(format!("unknown parent node {}", parent_id))
                    })?,
            ),
            None => None,
        };

        if !kind.allowed_under(parent_kind) {
            return Err(DbError::InvalidHierarchy {
                parent: parent_kind,
                child: kind,
            });
        }

        if name.is_none() && !kind.is_namespace() {
            return Err(DbError::InvalidElement(format!(
                "{} requires a name",
                kind.display_name()
            )));
        }

        let sort_index = self.next_sort_index(parent);
        let node = DbElement::new(kind, name, parent, sort_index);
        let id = node.id;
        self.index_node(node);

        Ok(id)
    }

    /// Returns the child of `parent` with this kind and name, creating it
    /// when absent. The flag is `true` when a node was created.
    pub fn find_or_create(
        &mut self,
        parent: Option<Uuid>,
        kind: ElementKind,
        name: Option<&str>,
    ) -> Result<(Uuid, bool), DbError> {
        if let Some(existing) = self.find_child(parent, kind, name) {
            return Ok((existing.id, false));
        }

        let id = self.add_element(parent, kind, name.map(str::to_string))?;
        Ok((id, true))
    }

    /// Sort index that places a new node after all existing siblings.
    pub fn next_sort_index(&self, parent: Option<Uuid>) -> i32 {
        let max_index = self
            .children
            .get(&parent)
            .and_then(|positions| positions.last())
            .map(|&pos| self.nodes[pos].sort_index)
            .unwrap_or(0);

        max_index + SORT_INDEX_GAP
    }

    /// Nodes from the root-level ancestor down to `id`, inclusive.
    pub fn path_of(&self, id: Uuid) -> Vec<&DbElement> {
        let mut path = Vec::new();
        let mut current = self.find_by_id(id);

        while let Some(node) = current {
            path.push(node);
            current = node.parent_id.and_then(|parent| self.find_by_id(parent));
        }

        path.reverse();
        path
    }

    /// Number of nodes between the root and `id` (root-level nodes have depth 1).
    pub fn depth_of(&self, id: Uuid) -> usize {
        self.path_of(id).len()
    }

    pub fn count(&self, kind: ElementKind) -> usize {
        self.nodes.iter().filter(|node| node.kind == kind).count()
    }

    /// All nodes of a kind, in insertion order.
    pub fn elements_of_kind(&self, kind: ElementKind) -> Vec<&DbElement> {
        self.nodes.iter().filter(|node| node.kind == kind).collect()
    }

    fn index_node(&mut self, node: DbElement) {
        let pos = self.nodes.len();

        self.positions.insert(node.id, pos);
        self.children.entry(node.parent_id).or_default().push(pos);
        self.siblings
            .entry((node.parent_id, node.kind, node.name.clone()))
            .or_insert(node.id);
        self.nodes.push(node);
    }
}
