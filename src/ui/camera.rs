use bevy::{
    input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel},
    prelude::*,
    window::PrimaryWindow,
};
use bevy_egui::EguiContexts;
use std::f32::consts::{FRAC_PI_2, TAU};

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera)
            .add_systems(Update, camera_control_system);
    }
}

fn spawn_camera(mut commands: Commands, mut clearcolor: ResMut<ClearColor>) {
    *clearcolor = ClearColor(Color::BLACK);
    let orbit = OrbitCamera::looking_from(Vec3::splat(3.0), Vec3::ZERO);
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 75f32.to_radians(),
            near: 0.1,
            far: 100.0,
            ..default()
        }),
        Msaa::Sample4,
        orbit.transform(),
        orbit,
    ));
}

/// Orbits `target` on a sphere; rotation and zoom input is eased in over several frames.
#[derive(Component, Clone, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    /// Share of the pending rotation applied per frame.
    pub damping: f32,
    pub rotate_speed: f32,
    yaw: f32,
    pitch: f32,
    distance: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    smooth_zoom_buffer: f32,
}

impl OrbitCamera {
    const MIN_DISTANCE: f32 = 0.5;
    const MAX_DISTANCE: f32 = 60.0;
    const MAX_PITCH: f32 = FRAC_PI_2 - 0.01;

    pub fn looking_from(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);
        Self {
            target,
            damping: 0.1,
            rotate_speed: 0.4,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / offset.length().max(f32::EPSILON)).asin(),
            distance,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            smooth_zoom_buffer: 0.0,
        }
    }

    /// Queues a rotation for a pointer drag of `drag` pixels; a drag over the full viewport
    /// height is one turn at `rotate_speed` 1.
    pub fn rotate(&mut self, drag: Vec2, viewport_height: f32) {
        let radians_per_pixel = TAU / viewport_height.max(1.0) * self.rotate_speed;
        self.pending_yaw -= drag.x * radians_per_pixel;
        self.pending_pitch += drag.y * radians_per_pixel;
    }

    /// Positive scroll zooms in.
    pub fn zoom(&mut self, scroll: f32) {
        self.smooth_zoom_buffer += scroll * 0.05;
    }

    /// Advances one frame of damped motion.
    pub fn step(&mut self) {
        self.yaw += self.pending_yaw * self.damping;
        self.pitch = (self.pitch + self.pending_pitch * self.damping)
            .clamp(-Self::MAX_PITCH, Self::MAX_PITCH);
        self.pending_yaw *= 1.0 - self.damping;
        self.pending_pitch *= 1.0 - self.damping;

        // scroll delta is cached to a buffer
        // buffer is converted to actual zoom over time for a smooth zooming effect
        let smooth_zoom_min = 0.001f32;
        let smooth_zoom_factor = 0.2f32;
        let smooth_zoom_amount = if self.smooth_zoom_buffer < 0.0 {
            f32::min(
                self.smooth_zoom_buffer * smooth_zoom_factor,
                (-smooth_zoom_min).max(self.smooth_zoom_buffer),
            )
        } else {
            f32::max(
                self.smooth_zoom_buffer * smooth_zoom_factor,
                smooth_zoom_min.min(self.smooth_zoom_buffer),
            )
        };
        self.smooth_zoom_buffer -= smooth_zoom_amount;
        self.distance = (self.distance * (-smooth_zoom_amount).exp())
            .clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        self.target + self.distance * Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye()).looking_at(self.target, Vec3::Y)
    }
}

pub fn camera_control_system(
    mut contexts: EguiContexts,
    mut query: Query<(&mut Transform, &mut OrbitCamera)>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut motion_evr: EventReader<MouseMotion>,
    mut scroll_evr: EventReader<MouseWheel>,
) {
    let Ok((mut transform, mut orbit)) = query.single_mut() else {
        return;
    };

    let drag: Vec2 = motion_evr.read().map(|ev| ev.delta).sum();
    let scroll: f32 = scroll_evr
        .read()
        .map(|ev| match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.02,
        })
        .sum();

    // the settings panel keeps its own pointer input
    let panel_has_pointer = contexts
        .try_ctx_mut()
        .is_some_and(|ctx| ctx.wants_pointer_input() || ctx.is_pointer_over_area());

    if !panel_has_pointer {
        if mouse_buttons.pressed(MouseButton::Left) {
            if let Ok(window) = windows.single() {
                orbit.rotate(drag, window.height());
            }
        }
        orbit.zoom(scroll);
    }

    orbit.step();
    *transform = orbit.transform();
}
