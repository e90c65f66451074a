use bevy::{
    pbr::{MaterialPipeline, MaterialPipelineKey},
    prelude::*,
    reflect::TypePath,
    render::{
        mesh::MeshVertexBufferLayoutRef,
        render_resource::{
            AsBindGroup, RenderPipelineDescriptor, ShaderRef, ShaderType,
            SpecializedMeshPipelineError,
        },
    },
};
use bytemuck::{Pod, Zeroable};

const SHADER_ASSET_PATH: &str = "shaders/galaxy_points.wgsl";

// Duplicated in galaxy_points.wgsl, so make sure to update both
#[derive(ShaderType, Pod, Zeroable, Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct PointsUniform {
    pub size: f32,
}

/// Additive, camera-facing square sprites colored per vertex.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct GalaxyPointsMaterial {
    #[uniform(0)]
    pub points: PointsUniform,
    pub alpha_mode: AlphaMode,
}

impl GalaxyPointsMaterial {
    pub fn new(size: f32) -> Self {
        Self {
            points: PointsUniform { size },
            alpha_mode: AlphaMode::Add,
        }
    }
}

impl Material for GalaxyPointsMaterial {
    fn vertex_shader() -> ShaderRef {
        SHADER_ASSET_PATH.into()
    }

    fn fragment_shader() -> ShaderRef {
        SHADER_ASSET_PATH.into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let vertex_layout = layout.0.get_layout(&[
            Mesh::ATTRIBUTE_POSITION.at_shader_location(0),
            Mesh::ATTRIBUTE_UV_0.at_shader_location(1),
            Mesh::ATTRIBUTE_COLOR.at_shader_location(2),
        ])?;
        descriptor.vertex.buffers = vec![vertex_layout];
        // sprites are built in view space, their winding is not meaningful
        descriptor.primitive.cull_mode = None;
        if let Some(depth_stencil) = descriptor.depth_stencil.as_mut() {
            depth_stencil.depth_write_enabled = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_blends_additively() {
        let material = GalaxyPointsMaterial::new(0.03);
        assert_eq!(material.points, PointsUniform { size: 0.03 });
        assert_eq!(material.alpha_mode(), AlphaMode::Add);
    }

    #[test]
    fn uniform_is_a_single_float() {
        let uniform = PointsUniform { size: 0.5 };
        assert_eq!(bytemuck::bytes_of(&uniform), 0.5f32.to_ne_bytes());
    }
}
