use super::color::Rgb;
use super::error::{GalaxyError, GalaxyResult};
use bevy::prelude::*;

/// Everything a galaxy generation depends on.
///
/// As a resource this is the debug panel's working copy; generation only ever sees a committed
/// snapshot delivered through [`RegenerateGalaxy`].
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct GalaxyParameters {
    pub count: u32,
    /// Point sprite edge length in world units. Only the material reads it.
    pub size: f32,
    pub radius: f32,
    pub branches: u32,
    pub spin: f32,
    pub randomness: f32,
    pub randomness_power: f32,
    pub inside_color: Rgb,
    pub outside_color: Rgb,
}

impl Default for GalaxyParameters {
    fn default() -> Self {
        Self {
            count: 50_000,
            size: 0.03,
            radius: 6.0,
            branches: 4,
            spin: 1.0,
            randomness: 0.2,
            randomness_power: 4.0,
            inside_color: Rgb::from_rgb8(0xff, 0x60, 0x30),
            outside_color: Rgb::from_rgb8(0x1b, 0x39, 0x84),
        }
    }
}

impl GalaxyParameters {
    /// Lower end of the ranges exposed on the debug panel.
    pub const MIN: Self = Self {
        count: 100,
        size: 0.001,
        radius: 0.01,
        branches: 1,
        spin: -5.0,
        randomness: 0.0,
        randomness_power: 1.0,
        inside_color: Rgb::BLACK,
        outside_color: Rgb::BLACK,
    };
    /// Upper end of the ranges exposed on the debug panel.
    pub const MAX: Self = Self {
        count: 100_000,
        size: 0.1,
        radius: 20.0,
        branches: 20,
        spin: 5.0,
        randomness: 5.0,
        randomness_power: 10.0,
        inside_color: Rgb::WHITE,
        outside_color: Rgb::WHITE,
    };

    /// Slider step sizes, in field order.
    pub const COUNT_STEP: f64 = 100.0;
    pub const SIZE_STEP: f64 = 0.001;
    pub const RADIUS_STEP: f64 = 0.01;
    pub const BRANCHES_STEP: f64 = 1.0;
    pub const SPIN_STEP: f64 = 1.0;
    pub const RANDOMNESS_STEP: f64 = 0.01;
    pub const RANDOMNESS_POWER_STEP: f64 = 0.01;

    /// Checks every field against its domain, reporting the first offender in field order.
    pub fn validate(&self) -> GalaxyResult<()> {
        if self.count < 1 {
            return Err(GalaxyError::invalid("count", "must be at least 1"));
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(GalaxyError::invalid("size", "must be finite and positive"));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(GalaxyError::invalid("radius", "must be finite and positive"));
        }
        if self.branches < 1 {
            return Err(GalaxyError::invalid("branches", "must be at least 1"));
        }
        if !self.spin.is_finite() {
            return Err(GalaxyError::invalid("spin", "must be finite"));
        }
        if !(self.randomness.is_finite() && self.randomness >= 0.0) {
            return Err(GalaxyError::invalid(
                "randomness",
                "must be finite and non-negative",
            ));
        }
        if !(self.randomness_power.is_finite() && self.randomness_power >= 1.0) {
            return Err(GalaxyError::invalid(
                "randomness_power",
                "must be finite and at least 1",
            ));
        }
        if !self.inside_color.is_normalized() {
            return Err(GalaxyError::invalid(
                "inside_color",
                "channels must lie in [0, 1]",
            ));
        }
        if !self.outside_color.is_normalized() {
            return Err(GalaxyError::invalid(
                "outside_color",
                "channels must lie in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Clamps the panel-exposed fields into `MIN..=MAX`. Colors are left alone.
    pub fn clamped(self) -> Self {
        let (min, max) = (Self::MIN, Self::MAX);
        Self {
            count: self.count.clamp(min.count, max.count),
            size: self.size.clamp(min.size, max.size),
            radius: self.radius.clamp(min.radius, max.radius),
            branches: self.branches.clamp(min.branches, max.branches),
            spin: self.spin.clamp(min.spin, max.spin),
            randomness: self.randomness.clamp(min.randomness, max.randomness),
            randomness_power: self
                .randomness_power
                .clamp(min.randomness_power, max.randomness_power),
            ..self
        }
    }
}

/// A committed parameter set: the render host should replace the live point cloud.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct RegenerateGalaxy(pub GalaxyParameters);

/// Collapses a burst of panel edits into a single commit.
///
/// A commit happens either when the panel reports the edit finished (drag released, text field
/// left) or when nothing changed for `quiet_period` seconds while no control is held.
#[derive(Resource, Debug)]
pub struct EditDebounce {
    pub quiet_period: f32,
    pending_since: Option<f32>,
    finished: bool,
    held: bool,
}

impl Default for EditDebounce {
    fn default() -> Self {
        Self::new(0.35)
    }
}

impl EditDebounce {
    pub fn new(quiet_period: f32) -> Self {
        Self {
            quiet_period,
            pending_since: None,
            finished: false,
            held: false,
        }
    }

    pub fn note_change(&mut self, now: f32) {
        self.pending_since = Some(now);
    }

    pub fn note_finished(&mut self) {
        self.finished = true;
    }

    /// Whether a control is currently being dragged; holds back quiet-period commits.
    pub fn set_held(&mut self, held: bool) {
        self.held = held;
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Returns true exactly once per burst of edits, when the burst should be committed.
    pub fn poll(&mut self, now: f32) -> bool {
        let Some(since) = self.pending_since else {
            self.finished = false;
            return false;
        };
        if self.finished || (!self.held && now - since >= self.quiet_period) {
            self.pending_since = None;
            self.finished = false;
            return true;
        }
        false
    }
}

/// Last parameter set handed to the render host.
#[derive(Resource, Default)]
struct CommittedParameters(Option<GalaxyParameters>);

pub struct GalaxyConfigPlugin;

impl Plugin for GalaxyConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GalaxyParameters>()
            .init_resource::<EditDebounce>()
            .init_resource::<CommittedParameters>()
            .add_event::<RegenerateGalaxy>()
            .add_systems(Startup, request_initial_galaxy)
            .add_systems(Update, commit_parameter_edits);
    }
}

fn request_initial_galaxy(
    params: Res<GalaxyParameters>,
    mut committed: ResMut<CommittedParameters>,
    mut regenerate: EventWriter<RegenerateGalaxy>,
) {
    committed.0 = Some(*params);
    regenerate.write(RegenerateGalaxy(*params));
}

fn commit_parameter_edits(
    time: Res<Time>,
    params: Res<GalaxyParameters>,
    mut debounce: ResMut<EditDebounce>,
    mut committed: ResMut<CommittedParameters>,
    mut regenerate: EventWriter<RegenerateGalaxy>,
) {
    if !debounce.poll(time.elapsed_secs()) {
        return;
    }
    if committed.0.as_ref() == Some(&*params) {
        debug!("Galaxy edit settled on the committed parameters, skipping regeneration");
        return;
    }
    debug!("Committing galaxy parameters {:?}", *params);
    committed.0 = Some(*params);
    regenerate.write(RegenerateGalaxy(*params));
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::event::EventCursor;

    #[test]
    fn defaults_are_valid_and_within_panel_ranges() {
        let params = GalaxyParameters::default();
        assert_eq!(params.validate(), Ok(()));
        assert_eq!(params.clamped(), params);
        assert_eq!(params.inside_color.to_hex(), "#ff6030");
        assert_eq!(params.outside_color.to_hex(), "#1b3984");
    }

    #[test]
    fn panel_range_endpoints_are_valid() {
        assert_eq!(GalaxyParameters::MIN.validate(), Ok(()));
        assert_eq!(GalaxyParameters::MAX.validate(), Ok(()));
    }

    #[test]
    fn validation_names_the_offending_field() {
        let base = GalaxyParameters::default();
        let cases = [
            (GalaxyParameters { count: 0, ..base }, "count"),
            (GalaxyParameters { size: 0.0, ..base }, "size"),
            (GalaxyParameters { radius: 0.0, ..base }, "radius"),
            (GalaxyParameters { radius: -1.0, ..base }, "radius"),
            (GalaxyParameters { radius: f32::NAN, ..base }, "radius"),
            (GalaxyParameters { branches: 0, ..base }, "branches"),
            (GalaxyParameters { spin: f32::INFINITY, ..base }, "spin"),
            (GalaxyParameters { randomness: -0.1, ..base }, "randomness"),
            (
                GalaxyParameters {
                    randomness_power: 0.5,
                    ..base
                },
                "randomness_power",
            ),
            (
                GalaxyParameters {
                    inside_color: Rgb::new(1.5, 0.0, 0.0),
                    ..base
                },
                "inside_color",
            ),
            (
                GalaxyParameters {
                    outside_color: Rgb::new(0.0, f32::NAN, 0.0),
                    ..base
                },
                "outside_color",
            ),
        ];
        for (params, field) in cases {
            assert_eq!(params.validate().unwrap_err().field(), Some(field));
        }
    }

    #[test]
    fn first_failing_field_wins() {
        let params = GalaxyParameters {
            count: 0,
            branches: 0,
            radius: 0.0,
            ..default()
        };
        assert_eq!(
            params.validate(),
            Err(GalaxyError::InvalidParameter {
                field: "count",
                reason: "must be at least 1"
            })
        );
    }

    #[test]
    fn clamping_pulls_fields_into_panel_ranges() {
        let wild = GalaxyParameters {
            count: 0,
            size: 3.0,
            radius: 100.0,
            branches: 0,
            spin: -40.0,
            randomness: 9.0,
            randomness_power: 0.0,
            ..default()
        };
        let clamped = wild.clamped();
        assert_eq!(clamped.count, 100);
        assert_eq!(clamped.size, 0.1);
        assert_eq!(clamped.radius, 20.0);
        assert_eq!(clamped.branches, 1);
        assert_eq!(clamped.spin, -5.0);
        assert_eq!(clamped.randomness, 5.0);
        assert_eq!(clamped.randomness_power, 1.0);
        assert_eq!(clamped.validate(), Ok(()));
    }

    #[test]
    fn debounce_waits_for_quiet_period() {
        let mut debounce = EditDebounce::new(0.5);
        assert!(!debounce.poll(0.0));

        debounce.note_change(1.0);
        assert!(!debounce.poll(1.2));
        debounce.note_change(1.3);
        assert!(!debounce.poll(1.7));
        assert!(debounce.poll(1.8));
        assert!(!debounce.poll(5.0));
    }

    #[test]
    fn debounce_holds_while_dragging() {
        let mut debounce = EditDebounce::new(0.5);
        debounce.note_change(0.0);
        debounce.set_held(true);
        assert!(!debounce.poll(10.0));
        debounce.set_held(false);
        assert!(debounce.poll(10.0));
    }

    #[test]
    fn finished_edit_commits_immediately() {
        let mut debounce = EditDebounce::new(0.5);
        debounce.note_change(0.0);
        debounce.set_held(true);
        debounce.note_finished();
        assert!(debounce.poll(0.0));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn finish_without_change_is_ignored() {
        let mut debounce = EditDebounce::new(0.5);
        debounce.note_finished();
        assert!(!debounce.poll(0.0));
        // a stale finish must not short-circuit the next burst
        debounce.note_change(1.0);
        assert!(!debounce.poll(1.1));
    }

    fn read_commits(app: &App, cursor: &mut EventCursor<RegenerateGalaxy>) -> Vec<RegenerateGalaxy> {
        let events = app.world().resource::<Events<RegenerateGalaxy>>();
        cursor.read(events).copied().collect()
    }

    #[test]
    fn plugin_commits_initial_and_finished_edits() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, GalaxyConfigPlugin));
        let mut cursor = EventCursor::<RegenerateGalaxy>::default();

        app.update();
        assert_eq!(
            read_commits(&app, &mut cursor),
            vec![RegenerateGalaxy(GalaxyParameters::default())]
        );

        let edited = GalaxyParameters {
            branches: 7,
            ..default()
        };
        *app.world_mut().resource_mut::<GalaxyParameters>() = edited;
        {
            let mut debounce = app.world_mut().resource_mut::<EditDebounce>();
            debounce.note_change(0.0);
            debounce.note_finished();
        }
        app.update();
        assert_eq!(read_commits(&app, &mut cursor), vec![RegenerateGalaxy(edited)]);

        // settling back on the committed set is not a new commit
        {
            let mut debounce = app.world_mut().resource_mut::<EditDebounce>();
            debounce.note_change(0.0);
            debounce.note_finished();
        }
        app.update();
        assert!(read_commits(&app, &mut cursor).is_empty());
    }
}
