//! Tree synchronization with the hardware topology
//!
//! Hardware units are inserted at their category-sorted position, recursively
//! for declared sub-hardware. Removal only looks at direct children of the
//! root: sub-hardware goes away with its parent.

use tracing::{debug, info};

use crate::data::HardwareDescriptor;
use crate::identifier::Identifier;
use crate::settings::SettingsStore;
use crate::tree::model::{Node, NodeId, TreeModel};
use crate::tree::prefs::apply_preferences;
use crate::virtual_sensors::container_index_of;

/// Insert `descriptor` under the root; returns how many hardware nodes were added
pub fn on_hardware_attached(
    tree: &mut TreeModel,
    settings: &dyn SettingsStore,
    descriptor: &HardwareDescriptor,
) -> usize {
    if tree.contains(&descriptor.identifier) {
        debug!(hardware = %descriptor.identifier, "Attach of known hardware ignored");
        return 0;
    }
    let root = tree.root();
    let added = attach_under(tree, settings, root, descriptor);
    info!(
        hardware = %descriptor.identifier,
        name = %descriptor.name,
        category = ?descriptor.category,
        nodes = added,
        "Hardware attached"
    );
    added
}

fn attach_under(
    tree: &mut TreeModel,
    settings: &dyn SettingsStore,
    parent: NodeId,
    descriptor: &HardwareDescriptor,
) -> usize {
    if tree.contains(&descriptor.identifier) {
        debug!(hardware = %descriptor.identifier, "Duplicate sub-hardware skipped");
        return 0;
    }

    let mut node = Node::hardware(
        descriptor.identifier.clone(),
        descriptor.name.clone(),
        descriptor.category,
        container_index_of(descriptor),
    );
    apply_preferences(&mut node, settings);

    let position = tree.sorted_position(parent, descriptor.category);
    let Ok(hardware) = tree.insert_child(parent, position, node) else {
        return 0;
    };

    for sensor in &descriptor.sensors {
        let mut node = Node::sensor(sensor);
        apply_preferences(&mut node, settings);
        if tree.append_child(hardware, node).is_err() {
            debug!(sensor = %sensor.identifier, "Duplicate sensor skipped");
        }
    }

    let mut added = 1;
    for sub in &descriptor.sub_hardware {
        added += attach_under(tree, settings, hardware, sub);
    }
    added
}

/// Detach every root child with this identifier; returns how many were detached
pub fn on_hardware_removed(tree: &mut TreeModel, identifier: &Identifier) -> usize {
    let root = tree.root();
    let matches: Vec<NodeId> = tree
        .children(root)
        .iter()
        .copied()
        .filter(|id| tree.get(*id).is_some_and(|n| &n.identifier == identifier))
        .collect();

    if matches.is_empty() {
        debug!(hardware = %identifier, "Remove of unknown hardware ignored");
        return 0;
    }

    for id in &matches {
        let dropped = tree.remove(*id);
        info!(hardware = %identifier, nodes = dropped, "Hardware removed");
    }
    matches.len()
}
