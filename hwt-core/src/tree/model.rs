//! In-memory node hierarchy
//!
//! Nodes live in an arena owned by [`TreeModel`]; parents own their children
//! through ordered index lists and children point back with a plain
//! [`NodeId`]. Ids are generational, so an id kept across a removal never
//! resolves to an unrelated node that reused the slot.

use std::collections::HashMap;

use crate::data::{Color, HardwareCategory, SensorDescriptor, SensorType};
use crate::error::{HwTreeError, Result};
use crate::identifier::Identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HardwareNode {
    pub category: HardwareCategory,
    /// Container index when this unit is a virtual sensor container
    pub virtual_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorNode {
    pub sensor_type: SensorType,
    pub index: usize,
    pub plot: bool,
    pub overview: bool,
    /// Explicit plot color, overrides automatic assignment
    pub pen_color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Hardware(HardwareNode),
    Sensor(SensorNode),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub identifier: Identifier,
    /// Text shown for the node, a user rename if one is set
    pub text: String,
    /// Name reported by the provider
    pub default_text: String,
    pub visible: bool,
    pub collapsed: bool,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(identifier: Identifier, text: String, kind: NodeKind) -> Self {
        Self {
            identifier,
            default_text: text.clone(),
            text,
            visible: true,
            collapsed: false,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn root(identifier: Identifier, host: impl Into<String>) -> Self {
        Self::new(identifier, host.into(), NodeKind::Root)
    }

    pub fn hardware(
        identifier: Identifier,
        name: impl Into<String>,
        category: HardwareCategory,
        virtual_index: Option<usize>,
    ) -> Self {
        Self::new(
            identifier,
            name.into(),
            NodeKind::Hardware(HardwareNode { category, virtual_index }),
        )
    }

    pub fn sensor(descriptor: &SensorDescriptor) -> Self {
        Self::new(
            descriptor.identifier.clone(),
            descriptor.name.clone(),
            NodeKind::Sensor(SensorNode {
                sensor_type: descriptor.sensor_type,
                index: descriptor.index,
                plot: false,
                overview: false,
                pen_color: None,
            }),
        )
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn as_hardware(&self) -> Option<&HardwareNode> {
        match &self.kind {
            NodeKind::Hardware(hw) => Some(hw),
            _ => None,
        }
    }

    pub fn as_sensor(&self) -> Option<&SensorNode> {
        match &self.kind {
            NodeKind::Sensor(sensor) => Some(sensor),
            _ => None,
        }
    }

    pub fn as_sensor_mut(&mut self) -> Option<&mut SensorNode> {
        match &mut self.kind {
            NodeKind::Sensor(sensor) => Some(sensor),
            _ => None,
        }
    }

    pub fn category(&self) -> Option<HardwareCategory> {
        self.as_hardware().map(|hw| hw.category)
    }

    pub fn is_sensor(&self) -> bool {
        matches!(self.kind, NodeKind::Sensor(_))
    }

    pub fn virtual_index(&self) -> Option<usize> {
        self.as_hardware().and_then(|hw| hw.virtual_index)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Row of a rendered tree walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRow {
    pub id: NodeId,
    pub depth: usize,
}

/// Arena-backed tree; the only owner of every node
#[derive(Debug)]
pub struct TreeModel {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_identifier: HashMap<Identifier, NodeId>,
    root: NodeId,
}

impl TreeModel {
    pub fn new(root: Node) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            by_identifier: HashMap::new(),
            root: NodeId { index: 0, generation: 0 },
        };
        tree.root = tree.alloc(root);
        tree
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let identifier = node.identifier.clone();
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation += 1;
                slot.node = Some(node);
                NodeId { index, generation: slot.generation }
            }
            None => {
                self.slots.push(Slot { generation: 0, node: Some(node) });
                NodeId { index: (self.slots.len() - 1) as u32, generation: 0 }
            }
        };
        self.by_identifier.insert(identifier, id);
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Like [`get`](Self::get) but reports a missing node as an error
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or_else(|| HwTreeError::node_not_found(format!("{id:?}")))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.get_mut(id).ok_or_else(|| HwTreeError::node_not_found(format!("{id:?}")))
    }

    pub fn lookup(&self, identifier: &Identifier) -> Option<NodeId> {
        self.by_identifier.get(identifier).copied()
    }

    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.by_identifier.contains_key(identifier)
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.by_identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    /// Insert `node` as child of `parent` at `position` (clamped to the end)
    pub fn insert_child(&mut self, parent: NodeId, position: usize, mut node: Node) -> Result<NodeId> {
        if self.contains(&node.identifier) {
            return Err(HwTreeError::InvalidIdentifier {
                segment: node.identifier.to_string(),
                reason: "already present in the tree",
            });
        }
        self.node(parent)?;
        node.parent = Some(parent);
        let id = self.alloc(node);
        let children = &mut self.node_mut(parent)?.children;
        let position = position.min(children.len());
        children.insert(position, id);
        Ok(id)
    }

    pub fn append_child(&mut self, parent: NodeId, node: Node) -> Result<NodeId> {
        self.insert_child(parent, usize::MAX, node)
    }

    /// Detach `id` and drop its whole subtree, returning the number of nodes dropped
    pub fn remove(&mut self, id: NodeId) -> usize {
        if id == self.root || self.get(id).is_none() {
            return 0;
        }
        if let Some(parent) = self.parent(id) {
            if let Some(p) = self.get_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }

        let mut dropped = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if let Some(node) = slot.node.take() {
                self.by_identifier.remove(&node.identifier);
                stack.extend(node.children);
                self.free.push(current.index);
                dropped += 1;
            }
        }
        dropped
    }

    /// Pre-order walk of everything below `start` (excluded), in child order
    pub fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(start).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    /// Every sensor node in depth-first order
    pub fn sensors(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.get(*id).is_some_and(Node::is_sensor))
            .collect()
    }

    /// Rows a tree view displays: collapsed subtrees are skipped, hidden nodes
    /// too unless `show_hidden` is set
    pub fn visible_rows(&self, show_hidden: bool) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        let mut stack: Vec<TreeRow> = self
            .children(self.root)
            .iter()
            .rev()
            .map(|id| TreeRow { id: *id, depth: 0 })
            .collect();
        while let Some(row) = stack.pop() {
            let Some(node) = self.get(row.id) else { continue };
            if !node.visible && !show_hidden {
                continue;
            }
            rows.push(row);
            if !node.collapsed {
                stack.extend(
                    node.children
                        .iter()
                        .rev()
                        .map(|id| TreeRow { id: *id, depth: row.depth + 1 }),
                );
            }
        }
        rows
    }

    /// Insertion point for a hardware child of `category` under `parent`:
    /// before the first sibling of strictly higher rank or the first sensor.
    ///
    /// Units of equal rank keep attach order, so a new unit lands after its
    /// equal-rank siblings rather than in front of them.
    pub fn sorted_position(&self, parent: NodeId, category: HardwareCategory) -> usize {
        self.children(parent)
            .iter()
            .position(|id| match self.get(*id).and_then(Node::category) {
                Some(existing) => existing.rank() > category.rank(),
                None => true,
            })
            .unwrap_or_else(|| self.children(parent).len())
    }

    /// True when, under every node, hardware children come first and are
    /// ordered by category rank
    pub fn is_sorted(&self) -> bool {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .all(|id| {
                let mut last_rank = 0u8;
                let mut seen_sensor = false;
                for child in self.children(id) {
                    match self.get(*child).and_then(Node::category) {
                        Some(category) => {
                            if seen_sensor || category.rank() < last_rank {
                                return false;
                            }
                            last_rank = category.rank();
                        }
                        None => seen_sensor = true,
                    }
                }
                true
            })
    }

    /// Depth of `id` below the root (root children are depth 0)
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == self.root {
                break;
            }
            depth += 1;
            current = self.parent(p);
        }
        depth
    }

    /// Nearest ancestor (or self) that is a hardware node
    pub fn owning_hardware(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(c) = current {
            if self.get(c)?.as_hardware().is_some() {
                return Some(c);
            }
            current = self.parent(c);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(path: &str) -> Identifier {
        Identifier::parse(path).unwrap()
    }

    fn tree() -> TreeModel {
        TreeModel::new(Node::root(id("/host"), "host"))
    }

    fn sensor(path: &str) -> Node {
        Node::sensor(&SensorDescriptor {
            identifier: id(path),
            name: path.to_string(),
            sensor_type: SensorType::Temperature,
            index: 0,
        })
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut t = tree();
        let root = t.root();
        let cpu = t
            .append_child(root, Node::hardware(id("/cpu/0"), "CPU", HardwareCategory::Cpu, None))
            .unwrap();
        let temp = t.append_child(cpu, sensor("/cpu/0/temperature/0")).unwrap();

        assert_eq!(t.len(), 3);
        assert_eq!(t.lookup(&id("/cpu/0")), Some(cpu));
        assert_eq!(t.parent(temp), Some(cpu));
        assert_eq!(t.children(root), &[cpu]);
        assert_eq!(t.depth(temp), 1);
        assert_eq!(t.owning_hardware(temp), Some(cpu));
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let mut t = tree();
        let root = t.root();
        t.append_child(root, Node::hardware(id("/cpu/0"), "CPU", HardwareCategory::Cpu, None))
            .unwrap();
        let again = t.append_child(root, Node::hardware(id("/cpu/0"), "CPU", HardwareCategory::Cpu, None));
        assert!(again.is_err());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_remove_drops_subtree_and_invalidates_ids() {
        let mut t = tree();
        let root = t.root();
        let cpu = t
            .append_child(root, Node::hardware(id("/cpu/0"), "CPU", HardwareCategory::Cpu, None))
            .unwrap();
        let temp = t.append_child(cpu, sensor("/cpu/0/temperature/0")).unwrap();

        assert_eq!(t.remove(cpu), 2);
        assert!(t.get(cpu).is_none());
        assert!(t.get(temp).is_none());
        assert!(t.lookup(&id("/cpu/0/temperature/0")).is_none());
        assert!(t.children(root).is_empty());

        // slot reuse must not resurrect the stale id
        let gpu = t
            .append_child(root, Node::hardware(id("/gpu/0"), "GPU", HardwareCategory::GpuAmd, None))
            .unwrap();
        assert_ne!(gpu, cpu);
        assert!(t.get(cpu).is_none());
        assert_eq!(t.remove(root), 0);
    }

    #[test]
    fn test_sorted_position_appends_after_equal_rank() {
        let mut t = tree();
        let root = t.root();
        t.append_child(root, Node::hardware(id("/mb"), "MB", HardwareCategory::Mainboard, None))
            .unwrap();
        t.append_child(root, Node::hardware(id("/cpu/0"), "CPU0", HardwareCategory::Cpu, None))
            .unwrap();
        t.append_child(root, Node::hardware(id("/hdd/0"), "HDD", HardwareCategory::Storage, None))
            .unwrap();

        assert_eq!(t.sorted_position(root, HardwareCategory::Cpu), 2);
        assert_eq!(t.sorted_position(root, HardwareCategory::Mainboard), 1);
        assert_eq!(t.sorted_position(root, HardwareCategory::Virtual), 3);
    }

    #[test]
    fn test_visible_rows_respects_hidden_and_collapsed() {
        let mut t = tree();
        let root = t.root();
        let cpu = t
            .append_child(root, Node::hardware(id("/cpu/0"), "CPU", HardwareCategory::Cpu, None))
            .unwrap();
        let a = t.append_child(cpu, sensor("/cpu/0/a")).unwrap();
        let b = t.append_child(cpu, sensor("/cpu/0/b")).unwrap();

        t.get_mut(b).unwrap().visible = false;
        let rows: Vec<NodeId> = t.visible_rows(false).iter().map(|r| r.id).collect();
        assert_eq!(rows, vec![cpu, a]);

        let rows: Vec<NodeId> = t.visible_rows(true).iter().map(|r| r.id).collect();
        assert_eq!(rows, vec![cpu, a, b]);

        t.get_mut(cpu).unwrap().collapsed = true;
        let rows = t.visible_rows(true);
        assert_eq!(rows, vec![TreeRow { id: cpu, depth: 0 }]);
    }

    #[test]
    fn test_is_sorted_detects_violation() {
        let mut t = tree();
        let root = t.root();
        t.append_child(root, Node::hardware(id("/cpu/0"), "CPU", HardwareCategory::Cpu, None))
            .unwrap();
        assert!(t.is_sorted());
        t.append_child(root, Node::hardware(id("/mb"), "MB", HardwareCategory::Mainboard, None))
            .unwrap();
        assert!(!t.is_sorted());
    }
}
