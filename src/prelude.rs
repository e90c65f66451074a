pub use crate::galaxy::{EditDebounce, GalaxyParameters, PointCloud, RegenerateGalaxy, Rgb};
