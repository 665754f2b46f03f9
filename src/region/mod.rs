//! Region geometry derived from sets of cells: outlines and adjacency

mod adjacency;
mod outline;

pub use adjacency::{extract_adjacency, supply_lines};
pub use outline::{outline, snap_scale, Outline, SnapKey};
