mod color;
mod error;
mod galaxy_config;
mod generator;

pub use color::Rgb;
pub use galaxy_config::{EditDebounce, GalaxyConfigPlugin, GalaxyParameters, RegenerateGalaxy};
pub use generator::{generate, PointCloud};
