//! Point cloud probe.
//!
//! Scatters a synthetic point cloud, indexes it with a [`cloud_core::Octree`]
//! and reports what the library makes of it:
//! - non-empty cells and mean population per level (evaluated in parallel
//!   against the one built tree)
//! - planar groups found by cell fusion at the chosen level
//! - vertex and triangle counts of the tessellated primitives

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use cloud_core::{
	fuse_cells, Cone, Cuboid, FusionParams, GenericPrimitive, NormalTable, Octree, OctreeConfig,
	PointCloud, PointSource, PrimitiveCache, Shape, Sphere, Tessellate,
};
use env_logger::Env;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

use config::{CloudShape, Config};

/// Octree, fusion and tessellation probe over synthetic clouds.
#[derive(Parser, Debug)]
#[command(name = "cloud_probe")]
#[command(about = "Builds an octree over a synthetic cloud and reports cell, fusion and mesh statistics")]
struct Args {
	/// Path to an optional configuration TOML file.
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Number of synthetic points.
	#[arg(short, long)]
	points: Option<usize>,

	/// Surface the points are scattered on.
	#[arg(short, long, value_enum)]
	shape: Option<CloudShape>,

	/// Seed of the point generator.
	#[arg(long)]
	seed: Option<u64>,

	/// Octree level to fuse.
	#[arg(short, long)]
	level: Option<u8>,

	/// Largest plane-fit RMS of a fused group.
	#[arg(long)]
	max_rms: Option<f64>,

	/// Largest normal deviation (degrees) inside a fused group.
	#[arg(long)]
	max_angle: Option<f64>,

	/// Tolerated relative gap between fused cells.
	#[arg(long)]
	overlap: Option<f64>,

	/// Facets per ring of the tessellated primitives.
	#[arg(long)]
	precision: Option<u32>,
}

impl Args {
	/// File settings (or defaults) with command-line flags applied on top.
	fn resolve(&self) -> Result<Config> {
		let mut config = match &self.config {
			Some(path) => Config::load(path)?,
			None => Config::default(),
		};
		if let Some(points) = self.points {
			config.points = points;
		}
		if let Some(shape) = self.shape {
			config.shape = shape;
		}
		if let Some(seed) = self.seed {
			config.seed = seed;
		}
		if let Some(level) = self.level {
			config.level = Some(level);
		}
		if let Some(max_rms) = self.max_rms {
			config.max_rms = max_rms;
		}
		if let Some(max_angle) = self.max_angle {
			config.max_angle = max_angle;
		}
		if let Some(overlap) = self.overlap {
			config.overlap = overlap;
		}
		if let Some(precision) = self.precision {
			config.precision = precision;
		}
		config.check()?;
		Ok(config)
	}
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

	let args = Args::parse();
	let config = args.resolve()?;

	let cloud = synthetic_cloud(&config);
	log::info!(
		"Generated {} points on a {:?} (seed {})",
		cloud.len(),
		config.shape,
		config.seed
	);

	let start = Instant::now();
	let octree = Octree::build(&cloud, &OctreeConfig::default(), None)
		.context("Failed to build the octree")?;
	log::info!(
		"Octree built in {:.1?}, cube side {:.4}",
		start.elapsed(),
		octree.cube_box().size().x
	);

	report_levels(&octree)?;
	report_fusion(&octree, &cloud, &config)?;
	report_primitives(config.precision)?;

	Ok(())
}

/// Points on the configured surface, jittered by `config.noise`.
fn synthetic_cloud(config: &Config) -> PointCloud {
	let mut rng = StdRng::seed_from_u64(config.seed);
	let jitter = |rng: &mut StdRng| {
		if config.noise > 0.0 {
			Vec3::new(
				rng.random_range(-config.noise..config.noise),
				rng.random_range(-config.noise..config.noise),
				rng.random_range(-config.noise..config.noise),
			)
		} else {
			Vec3::ZERO
		}
	};

	let points = (0..config.points)
		.map(|i| {
			let surface = match config.shape {
				CloudShape::Sphere => loop {
					let v = Vec3::new(
						rng.random_range(-1.0..1.0),
						rng.random_range(-1.0..1.0),
						rng.random_range(-1.0..1.0),
					);
					if let Some(n) = v.try_normalize() {
						break n;
					}
				},
				CloudShape::Plane => Vec3::new(rng.random_range(0.0..1.0), rng.random_range(0.0..1.0), 0.0),
				CloudShape::Cube => {
					let (u, v) = (rng.random_range(0.0..1.0), rng.random_range(0.0..1.0));
					let side = if rng.random_bool(0.5) { 1.0 } else { 0.0 };
					match i % 3 {
						0 => Vec3::new(side, u, v),
						1 => Vec3::new(u, side, v),
						_ => Vec3::new(u, v, side),
					}
				}
			};
			surface + jitter(&mut rng)
		})
		.collect();
	PointCloud::from_points(points)
}

/// Non-empty cells and mean population of every level, in parallel.
fn report_levels(octree: &Octree) -> Result<()> {
	let stats = (1..=octree.max_level())
		.into_par_iter()
		.map(|level| -> cloud_core::Result<(u8, usize, usize)> {
			let cells = octree.cell_count(level)?;
			let largest = octree
				.cells_at_level(level)?
				.map(|cell| cell.len())
				.max()
				.unwrap_or(0);
			Ok((level, cells, largest))
		})
		.collect::<cloud_core::Result<Vec<_>>>()
		.context("Failed to enumerate octree levels")?;

	for (level, cells, largest) in stats {
		let mean = octree.len() as f64 / cells.max(1) as f64;
		log::info!("level {level:>2}: {cells:>9} cells, mean {mean:>10.2}, largest {largest:>9}");
		if cells == octree.len() {
			log::info!("every point is alone from level {level} on");
			break;
		}
	}
	Ok(())
}

/// Fuse the cells of the configured level and summarize the groups.
fn report_fusion(octree: &Octree, cloud: &PointCloud, config: &Config) -> Result<()> {
	let level = config
		.level
		.unwrap_or_else(|| octree.best_level_for_population(config.target_population));
	let params = FusionParams::default()
		.with_level(level)
		.with_max_rms(config.max_rms)
		.with_max_angle_deg(config.max_angle)
		.with_overlap_coef(config.overlap);

	let start = Instant::now();
	let result = fuse_cells(octree, cloud, &params, None)
		.with_context(|| format!("Failed to fuse the cells of level {level}"))?;

	let mut sizes = result.group_sizes();
	sizes.sort_unstable_by(|a, b| b.cmp(a));
	let grouped: usize = sizes.iter().sum();
	log::info!(
		"Fusion at level {level}: {} groups covering {grouped} points in {:.1?}",
		result.group_count,
		start.elapsed()
	);
	log::info!("largest groups: {:?}", &sizes[..sizes.len().min(8)]);
	if result.cancelled {
		log::warn!("fusion was cancelled, grouping is partial");
	}
	Ok(())
}

/// Tessellate the primitive set and check the meshes against their counts.
fn report_primitives(precision: u32) -> Result<()> {
	let table = NormalTable::default();
	let mut cache = PrimitiveCache::new();
	let shapes: [Shape; 5] = [
		Cone::cylinder(1.0, 2.0, precision).into(),
		Cone::new(1.0, 0.5, 2.0, precision).into(),
		Cone::new(1.0, 0.0, 2.0, precision).into(),
		Sphere::new(1.0, precision).into(),
		Cuboid::new(Vec3::new(1.0, 2.0, 3.0)).into(),
	];

	for shape in shapes {
		let expected = shape
			.counts()
			.with_context(|| format!("Invalid {} parameters", shape.kind_name()))?;
		let primitive = GenericPrimitive::new_cached(shape, &table, &mut cache)?;
		let mesh = primitive.mesh();
		log::info!(
			"{:<8} {:>7} vertices {:>7} triangles",
			primitive.name(),
			mesh.vertex_count(),
			mesh.triangle_count()
		);
		if mesh.vertex_count() != expected.vertices || mesh.triangle_count() != expected.triangles {
			anyhow::bail!(
				"{} mesh has {}/{} vertices/triangles, expected {}/{}",
				primitive.name(),
				mesh.vertex_count(),
				mesh.triangle_count(),
				expected.vertices,
				expected.triangles
			);
		}
	}
	Ok(())
}
