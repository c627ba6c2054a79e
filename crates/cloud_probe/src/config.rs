//! Probe settings: defaults, optional TOML file, command-line overrides.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::Path;

/// Surface the synthetic points are scattered on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CloudShape {
	/// Unit sphere shell.
	Sphere,
	/// Unit square in the XY plane.
	Plane,
	/// Surface of the unit cube.
	Cube,
}

/// Root probe configuration. Every field may be omitted from the file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Number of synthetic points.
	pub points: usize,
	/// Surface the points are drawn from.
	pub shape: CloudShape,
	/// Seed of the point generator.
	pub seed: u64,
	/// Amplitude of the noise added along each axis.
	pub noise: f32,
	/// Level to fuse; picked from `target_population` when absent.
	pub level: Option<u8>,
	/// Mean points per cell used to pick the fusion level.
	pub target_population: usize,
	/// Largest plane-fit RMS of a fused group.
	pub max_rms: f64,
	/// Largest normal deviation (degrees) inside a fused group.
	pub max_angle: f64,
	/// Tolerated relative gap between fused cells.
	pub overlap: f64,
	/// Facets per ring of the tessellated primitives.
	pub precision: u32,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			points: 100_000,
			shape: CloudShape::Sphere,
			seed: 0,
			noise: 0.001,
			level: None,
			target_population: 64,
			max_rms: 0.01,
			max_angle: 20.0,
			overlap: 1.0,
			precision: cloud_core::DEFAULT_DRAWING_PRECISION,
		}
	}
}

impl Config {
	/// Load configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		let config: Config =
			toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
		config.check()?;
		Ok(config)
	}

	/// Reject settings no run can use.
	pub fn check(&self) -> Result<()> {
		if self.points == 0 {
			anyhow::bail!("points must be at least 1");
		}
		if !(self.noise >= 0.0) {
			anyhow::bail!("noise must be non-negative, got {}", self.noise);
		}
		if self.target_population == 0 {
			anyhow::bail!("target_population must be at least 1");
		}
		Ok(())
	}
}
