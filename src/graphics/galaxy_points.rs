use super::points_material::GalaxyPointsMaterial;
use crate::galaxy::generate;
use crate::prelude::*;
use bevy::{
    prelude::*,
    render::{
        mesh::{Indices, PrimitiveTopology},
        render_asset::RenderAssetUsages,
        view::NoFrustumCulling,
    },
};
use rayon::prelude::*;

pub struct GalaxyPointsPlugin;

impl Plugin for GalaxyPointsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MaterialPlugin::<GalaxyPointsMaterial> {
            prepass_enabled: false,
            shadows_enabled: false,
            ..default()
        })
        .init_resource::<LiveGalaxy>()
        .add_systems(Update, regenerate_galaxy);
    }
}

#[derive(Component)]
pub struct GalaxyPoints;

/// Handles to the GPU assets of one installed point cloud.
#[derive(Clone, Debug, PartialEq)]
pub struct GalaxyAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<GalaxyPointsMaterial>,
}

/// The single point cloud on screen, together with the assets built from it.
#[derive(Resource, Default)]
pub struct LiveGalaxy {
    generation: u32,
    cloud: Option<PointCloud>,
    assets: Option<GalaxyAssets>,
}

impl LiveGalaxy {
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn cloud(&self) -> Option<&PointCloud> {
        self.cloud.as_ref()
    }

    /// Builds assets for `cloud`, makes it the live galaxy and releases the assets it replaces.
    ///
    /// The caller rebinds the galaxy entity to the returned handles in the same system, so the
    /// render world never extracts the entity pointing at a released asset.
    pub fn install(
        &mut self,
        params: GalaxyParameters,
        cloud: PointCloud,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<GalaxyPointsMaterial>,
    ) -> GalaxyAssets {
        let installed = GalaxyAssets {
            mesh: meshes.add(point_cloud_mesh(&cloud)),
            material: materials.add(GalaxyPointsMaterial::new(params.size)),
        };

        let retired = self.assets.replace(installed.clone());
        self.cloud = Some(cloud);
        self.generation += 1;

        if let Some(retired) = retired {
            if meshes.remove(&retired.mesh).is_none() {
                warn!("Galaxy mesh {:?} was already released", retired.mesh.id());
            }
            if materials.remove(&retired.material).is_none() {
                warn!(
                    "Galaxy material {:?} was already released",
                    retired.material.id()
                );
            }
        }
        installed
    }
}

const QUAD_CORNERS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// One sprite quad per particle: the center repeated on four vertices, told apart by `UV_0`.
///
/// Colors are stored as normalized sRGB in the point cloud and converted to linear here.
pub fn point_cloud_mesh(cloud: &PointCloud) -> Mesh {
    let positions: Vec<[f32; 3]> = cloud
        .positions
        .par_iter()
        .flat_map_iter(|&position| [position; 4])
        .collect();
    let colors: Vec<[f32; 4]> = cloud
        .colors
        .par_iter()
        .flat_map_iter(|&[r, g, b]| {
            let linear = LinearRgba::from(Srgba::rgb(r, g, b));
            [[linear.red, linear.green, linear.blue, 1.0]; 4]
        })
        .collect();
    let indices: Vec<u32> = (0..cloud.len() as u32)
        .into_par_iter()
        .flat_map_iter(|i| QUAD_INDICES.map(|k| i * 4 + k))
        .collect();

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, QUAD_CORNERS.repeat(cloud.len()))
        .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors)
        .with_inserted_indices(Indices::U32(indices))
}

/// Replaces the live galaxy with one generated from the latest committed parameters.
/// Rejected parameters leave the current galaxy on screen.
fn regenerate_galaxy(
    mut commands: Commands,
    mut requests: EventReader<RegenerateGalaxy>,
    mut live: ResMut<LiveGalaxy>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<GalaxyPointsMaterial>>,
    mut galaxy_query: Query<
        (&mut Mesh3d, &mut MeshMaterial3d<GalaxyPointsMaterial>),
        With<GalaxyPoints>,
    >,
) {
    // only the most recent commit matters
    let Some(RegenerateGalaxy(params)) = requests.read().last().copied() else {
        return;
    };

    let cloud = match generate(&params) {
        Ok(cloud) => cloud,
        Err(err) => {
            warn!(
                "Keeping the current galaxy, rejected `{}`: {err}",
                err.field().unwrap_or("parameters")
            );
            return;
        }
    };
    let particles = cloud.len();
    let installed = live.install(params, cloud, &mut meshes, &mut materials);

    if let Ok((mut mesh, mut material)) = galaxy_query.single_mut() {
        mesh.0 = installed.mesh;
        material.0 = installed.material;
    } else {
        commands.spawn((
            GalaxyPoints,
            Mesh3d(installed.mesh),
            MeshMaterial3d(installed.material),
            Transform::IDENTITY,
            Visibility::Inherited,
            NoFrustumCulling,
        ));
    }
    info!(
        "Installed galaxy #{} with {} particles",
        live.generation(),
        particles
    );
}
