use bevy::prelude::*;

mod galaxy_points;
mod points_material;

pub use galaxy_points::LiveGalaxy;

pub struct GraphicsPlugin;

impl Plugin for GraphicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(galaxy_points::GalaxyPointsPlugin);
    }
}
