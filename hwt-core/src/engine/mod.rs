//! Monitor engine and the views it derives from the tree

mod colors;
mod monitor;
mod overview;

pub use colors::{assign_plot_colors, PlotColors};
pub use monitor::{DerivedChanges, Monitor, TickReport};
pub use overview::{auto_overview_candidates, select_overview, AUTO_OVERVIEW_TYPES};
