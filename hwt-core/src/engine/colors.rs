//! Plot color assignment
//!
//! Every sensor in the tree owns a palette slot by position (its index in a
//! depth-first walk), whether it is plotted or not. Plotted sensors start from
//! their slot color, so adding or removing an unrelated sensor does not move
//! colors around. Collisions (two plotted sensors whose slots wrap onto the
//! same color) are then resolved in selection order by picking the first
//! palette entry nobody holds. A sensor with an explicit pen color always
//! gets it and takes no part in the collision pass.
//!
//! Up to `palette.len()` automatically colored sensors get pairwise distinct
//! colors. Beyond that, colors repeat.

use std::collections::HashMap;

use crate::data::Color;
use crate::tree::{NodeId, TreeModel};

/// Colors of the currently plotted sensors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotColors {
    selected: Vec<NodeId>,
    colors: HashMap<NodeId, Color>,
}

impl PlotColors {
    /// Plotted sensors in tree order
    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    pub fn color(&self, id: NodeId) -> Option<Color> {
        self.colors.get(&id).copied()
    }

    /// `(sensor, color)` in tree order; sensors without a color are skipped
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Color)> + '_ {
        self.selected
            .iter()
            .filter_map(|id| self.colors.get(id).map(|c| (*id, *c)))
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Compute the color of every plotted sensor in `tree`
pub fn assign_plot_colors(tree: &TreeModel, palette: &[Color]) -> PlotColors {
    let mut selected = Vec::new();
    let mut colors: HashMap<NodeId, Color> = HashMap::new();

    for (slot, id) in tree.sensors().into_iter().enumerate() {
        let Some(sensor) = tree.get(id).and_then(|n| n.as_sensor()) else {
            continue;
        };
        if !sensor.plot {
            continue;
        }
        if sensor.pen_color.is_none() && !palette.is_empty() {
            colors.insert(id, palette[slot % palette.len()]);
        }
        selected.push(id);
    }

    let mut used: Vec<Color> = Vec::new();
    for id in &selected {
        let Some(current) = colors.get(id).copied() else {
            continue;
        };
        if !used.contains(&current) {
            used.push(current);
            continue;
        }
        let free = palette.iter().copied().find(|c| !colors.values().any(|v| v == c));
        if let Some(replacement) = free {
            colors.insert(*id, replacement);
            used.push(replacement);
        }
    }

    for id in &selected {
        if let Some(pen) = tree.get(*id).and_then(|n| n.as_sensor()).and_then(|s| s.pen_color) {
            colors.insert(*id, pen);
        }
    }

    PlotColors { selected, colors }
}
