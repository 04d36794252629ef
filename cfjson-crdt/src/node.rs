//! Document nodes.
//!
//! A node has up to three facets (register, list, map), each allocated on
//! first write and each carrying its own presence. What a node *is* follows
//! from presence alone: a map if the map facet is present, else a list if the
//! list facet is present, else a register. Every replica sees the same
//! presence sets and therefore resolves the same type, so concurrent writes of
//! different shapes need no extra merge rule.

use crate::cursor::PathSegment;
use crate::error::{CrdtError, CrdtResult};
use crate::list::List;
use crate::map::Map;
use crate::register::Register;
use crate::snapshot::Snapshot;
use crate::value::Value;
use crate::vector_clock::{ActionId, VectorClock};
use std::collections::BTreeSet;

/// Resolved type of an existing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Map,
    List,
    Register,
}

/// Borrowed view of the facet that determines a node's type.
#[derive(Debug, Clone, Copy)]
pub enum NodeView<'a> {
    Map(&'a Map),
    List(&'a List),
    Register(&'a Register),
}

/// A node of the document tree.
#[derive(Debug, Clone, Default)]
pub struct Node {
    register: Option<Register>,
    list: Option<List>,
    map: Option<Map>,
}

impl Node {
    /// The facet that currently defines this node, if it exists at all.
    #[must_use]
    pub fn view(&self) -> Option<NodeView<'_>> {
        if let Some(map) = self.map.as_ref().filter(|map| map.exists()) {
            return Some(NodeView::Map(map));
        }
        if let Some(list) = self.list.as_ref().filter(|list| list.exists()) {
            return Some(NodeView::List(list));
        }
        self.register
            .as_ref()
            .filter(|register| register.exists())
            .map(NodeView::Register)
    }

    /// Resolved type, or `None` for a tombstoned node.
    #[must_use]
    pub fn kind(&self) -> Option<NodeKind> {
        self.view().map(|view| match view {
            NodeView::Map(_) => NodeKind::Map,
            NodeView::List(_) => NodeKind::List,
            NodeView::Register(_) => NodeKind::Register,
        })
    }

    /// A node exists iff some facet has presence.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.view().is_some()
    }

    /// The register facet, if it was ever written.
    #[must_use]
    pub fn register(&self) -> Option<&Register> {
        self.register.as_ref()
    }

    /// The list facet, if it was ever written.
    #[must_use]
    pub fn list(&self) -> Option<&List> {
        self.list.as_ref()
    }

    /// The map facet, if it was ever written.
    #[must_use]
    pub fn map(&self) -> Option<&Map> {
        self.map.as_ref()
    }

    pub(crate) fn list_mut(&mut self) -> &mut List {
        self.list.get_or_insert_with(List::default)
    }

    fn map_mut(&mut self) -> &mut Map {
        self.map.get_or_insert_with(Map::default)
    }

    fn register_mut(&mut self) -> &mut Register {
        self.register.get_or_insert_with(Register::default)
    }

    /// Union of all facets' presence.
    pub fn actions(&self) -> impl Iterator<Item = ActionId> + '_ {
        let register = self.register.iter().flat_map(|register| register.actions());
        let list = self
            .list
            .iter()
            .flat_map(|list| list.presence.iter().copied());
        let map = self.map.iter().flat_map(|map| map.presence.iter().copied());
        register.chain(list).chain(map)
    }

    /// The node's presence set.
    #[must_use]
    pub fn presence(&self) -> BTreeSet<ActionId> {
        self.actions().collect()
    }

    /// Removes every action observed by `now` from this subtree.
    ///
    /// Containers keep the actions that survive in their descendants, so a
    /// concurrent write below a deleted node keeps the node alive.
    pub(crate) fn clear(&mut self, now: &VectorClock) {
        if let Some(register) = self.register.as_mut() {
            register.clear(now);
        }
        if let Some(list) = self.list.as_mut() {
            list.clear(now);
        }
        if let Some(map) = self.map.as_mut() {
            map.clear(now);
        }
    }

    /// Builds a fresh subtree shaped like `value`, seeded with `now`.
    pub(crate) fn build(&mut self, value: &Value, now: &VectorClock) {
        match value {
            Value::Register { value } => self.register_mut().assign(value.clone(), now),
            Value::List { items } => self.list_mut().build(items, now),
            Value::Map { entries } => self.map_mut().build(entries, now),
        }
    }

    /// Resolves `path` without mutating anything.
    ///
    /// Returns `Ok(None)` when a map key along the path was never
    /// materialized; the rest of the path must then be creatable.
    pub fn locate(&self, path: &[PathSegment]) -> CrdtResult<Option<&Node>> {
        let mut node = self;
        for (depth, segment) in path.iter().enumerate() {
            node = match segment {
                PathSegment::Key(key) => match node.map.as_ref().and_then(|map| map.child(key)) {
                    Some(child) => child,
                    None => {
                        check_creatable(&path[depth + 1..])?;
                        return Ok(None);
                    }
                },
                PathSegment::Item(id) => node
                    .list
                    .as_ref()
                    .and_then(|list| list.item(id))
                    .map(|item| item.node())
                    .ok_or(CrdtError::UnknownItem(*id))?,
                PathSegment::Head => return Err(head_in_path()),
            };
        }
        Ok(Some(node))
    }

    /// Resolves `path` for writing, materializing map children and recording
    /// `now` in every facet it passes through.
    pub(crate) fn descend_mut(
        &mut self,
        path: &[PathSegment],
        now: &VectorClock,
    ) -> CrdtResult<&mut Node> {
        let mut node = self;
        for segment in path {
            node = match segment {
                PathSegment::Key(key) => {
                    let map = node.map_mut();
                    map.presence.access(now);
                    map.child_or_create(key)
                }
                PathSegment::Item(id) => {
                    let list = node.list.as_mut().ok_or(CrdtError::UnknownItem(*id))?;
                    list.presence.access(now);
                    &mut list.item_mut(id).ok_or(CrdtError::UnknownItem(*id))?.node
                }
                PathSegment::Head => return Err(head_in_path()),
            };
        }
        Ok(node)
    }

    /// Resolves an existing node for writing without recording anything.
    pub(crate) fn locate_mut(&mut self, path: &[PathSegment]) -> Option<&mut Node> {
        let mut node = self;
        for segment in path {
            node = match segment {
                PathSegment::Key(key) => node.map.as_mut()?.child_mut(key)?,
                PathSegment::Item(id) => &mut node.list.as_mut()?.item_mut(id)?.node,
                PathSegment::Head => return None,
            };
        }
        Some(node)
    }

    /// The externally visible contents, or `None` for a tombstoned node.
    #[must_use]
    pub fn snapshot(&self) -> Option<Snapshot> {
        Some(match self.view()? {
            NodeView::Map(map) => Snapshot::Map(
                map.children()
                    .filter_map(|(key, child)| Some((key.clone(), child.snapshot()?)))
                    .collect(),
            ),
            NodeView::List(list) => Snapshot::List(
                list.items()
                    .filter_map(|item| Some((item.id(), item.node().snapshot()?)))
                    .collect(),
            ),
            NodeView::Register(register) => Snapshot::Register(
                register
                    .values()
                    .map(|(action, value)| (*action, value.clone()))
                    .collect(),
            ),
        })
    }
}

fn head_in_path() -> CrdtError {
    CrdtError::Structural("'head' is only valid as the anchor of an insert".into())
}

/// Checks that the remainder of a path can be materialized below a fresh node.
fn check_creatable(rest: &[PathSegment]) -> CrdtResult<()> {
    for segment in rest {
        match segment {
            PathSegment::Key(_) => {}
            PathSegment::Item(id) => return Err(CrdtError::UnknownItem(*id)),
            PathSegment::Head => return Err(head_in_path()),
        }
    }
    Ok(())
}
