//! cloud_core - Renderer independent point cloud indexing and tessellation
//!
//! This crate provides the algorithmic core of a point cloud viewer: a
//! Morton-coded octree over a point set, and procedural tessellators for the
//! primitives a viewer draws (cones, cylinders, spheres, boxes). Nothing here
//! depends on a graphics API; outputs are plain buffers.
//!
//! # Features
//!
//! - **Octree**: O(N log N) construction, O(N) per-level cell enumeration,
//!   cell geometry, 26-neighbour queries, rescale/translate without rebuild
//! - **Cell fusion**: region growing over the cells of one level, driven by
//!   plane-fit RMS, normal angle and overlap criteria, cancellable
//! - **Primitives**: cone/cylinder, sphere, plane and box meshes with exact
//!   buffer sizes, deduplicated compressed face normals
//! - **Mesh helpers**: append, rigid transforms, vertex normals, Laplacian
//!   smoothing and crack-free midpoint subdivision
//!
//! # Example
//!
//! ```ignore
//! use cloud_core::{fuse_cells, FusionParams, Octree, OctreeConfig};
//!
//! let octree = Octree::build(&points, &OctreeConfig::default(), None)?;
//! for cell in octree.cells_at_level(4)? {
//!     println!("{:?}: {} points", cell.key, cell.len());
//! }
//!
//! let groups = fuse_cells(&octree, &points, &FusionParams::default(), None)?;
//! println!("{} planar groups", groups.group_count);
//! ```

pub mod bounds;
pub mod cloud;
pub mod constants;
pub mod error;
pub mod fit;
pub mod normals;
pub mod progress;

// Re-export commonly used items
pub use bounds::BoundingBox;
pub use cloud::{PointCloud, PointSource, Rgb};
pub use constants::{
  DEFAULT_DRAWING_PRECISION, MAX_OCTREE_LEVEL, MIN_DRAWING_PRECISION, ZERO_TOLERANCE,
};
pub use error::{Error, Result};
pub use fit::{gravity_center, Moments, PlaneFit};
pub use normals::{NormalCode, NormalTable};
pub use progress::{CancelToken, NormalizedProgress, ProgressSink, StepLimit};

// Spatial index
pub mod octree;
pub use octree::{
  fuse_cells, CellCode, CellKey, FusionParams, FusionResult, Octree, OctreeCell, OctreeConfig,
};

// Indexed triangle meshes
pub mod mesh;
pub use mesh::{FaceNormals, MeshBuilder, NormalLayout, TriMesh};

// Procedural primitives
pub mod primitives;
pub use primitives::{
  Cone, Cuboid, GenericPrimitive, MeshCounts, Plane, PrimitiveCache, Shape, ShapeSignature,
  Sphere, Tessellate,
};

// Octree display geometry
pub mod display;
pub use display::{DisplayGeometry, OctreeDisplay, OctreeDisplayType};
