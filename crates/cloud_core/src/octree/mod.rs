//! Octree over a point cloud, keyed by Morton cell codes.
//!
//! The tree is implicit: points are sorted once by their full-depth code and
//! every cell of every level is a contiguous run of that sorted array. Parent
//! and child relationships are computed from the codes, so no node is ever
//! allocated.
//!
//! # Level Convention
//!
//! Level 0 is the whole bounding cube, each level halves the cell size.
//!
//! ```text
//! cell_size(L) = cube_side / 2^L        L in 0..=MAX_OCTREE_LEVEL
//! ```
//!
//! # Module Structure
//!
//! - [`morton`]: bit interleaving of grid coordinates
//! - [`cell`]: `CellKey` (code + level) and borrowed `OctreeCell` views
//! - [`config`]: `OctreeConfig` build settings
//! - [`tree`]: `Octree` construction, level traversal, cell geometry
//! - [`neighbors`]: 26-connected neighbour queries
//! - [`fusion`]: region growing over the cells of one level

pub mod cell;
pub mod config;
pub mod fusion;
pub mod morton;
pub mod neighbors;
pub mod tree;

// Re-exports
pub use cell::{CellKey, OctreeCell};
pub use config::OctreeConfig;
pub use fusion::{fuse_cells, FusionParams, FusionResult};
pub use morton::CellCode;
pub use neighbors::{adjacent_keys, NEIGHBOR_OFFSETS};
pub use tree::{CellsAtLevel, Octree};
