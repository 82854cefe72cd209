//! Camera choreography
//!
//! Picks new camera poses over the simulated plane. Most of the time a pose
//! is sampled at random under spatial constraints (see `randomize_cam`);
//! occasionally the next curated special view is shown instead.
//!
//! World space: the plane lies in z = 0, centred on the origin, with the
//! camera above it (z > 0). Tilt leans the view toward +y.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::sampling::{
    at_most, chance, exceed, per_call_probability, random_sign, sample_bounded, uniform,
    uniform_f64,
};
use crate::consts::PLANE_EXTENT;
use crate::rotate;
use crate::sim::{EmissionPoint, Rotation};

/// Mapping between normalized grid space and world space on the plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneMapping {
    /// World-space size of the plane
    pub extent: Vec2,
    /// Current scene rotation in radians
    pub rotation: f32,
}

impl Default for PlaneMapping {
    fn default() -> Self {
        Self {
            extent: Vec2::from(PLANE_EXTENT),
            rotation: 0.0,
        }
    }
}

impl PlaneMapping {
    pub fn half_extent(&self) -> Vec2 {
        self.extent * 0.5
    }

    /// Where a grid point currently appears on the plane
    pub fn uv_to_world(&self, uv: Vec2) -> Vec2 {
        rotate(uv - Vec2::splat(0.5), -self.rotation) * self.extent
    }

    /// Grid point currently shown at a world position
    pub fn world_to_uv(&self, p: Vec2) -> Vec2 {
        rotate(p / self.extent, self.rotation) + Vec2::splat(0.5)
    }
}

/// A live camera pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    /// Lean away from straight down, radians
    pub tilt: f32,
    pub target: Vec3,
}

impl CameraPose {
    /// Pose at `position` leaning by `tilt`, target derived on the plane
    pub fn looking(position: Vec3, tilt: f32, half_extent: Vec2) -> Self {
        Self {
            position,
            tilt,
            target: tilt_to_target(position, tilt, half_extent),
        }
    }

    /// Point on the plane at the centre of the view
    pub fn view_center(&self) -> Vec2 {
        self.target.truncate()
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::looking(Vec3::new(0.0, 0.0, 10.0), 0.0, Vec2::from(PLANE_EXTENT) * 0.5)
    }
}

/// Project the view ray onto the plane.
///
/// At tilt 0 the target is straight below. If the ray would hit the plane
/// outside its extent, the target is clamped to the plane edge, raised to the
/// height at which the ray crosses that edge.
pub fn tilt_to_target(position: Vec3, tilt: f32, half_extent: Vec2) -> Vec3 {
    let x = position.x.clamp(-half_extent.x, half_extent.x);
    let slope = tilt.tan();
    let reach = position.y + position.z * slope;
    if reach.abs() <= half_extent.y || slope == 0.0 {
        let y = reach.clamp(-half_extent.y, half_extent.y);
        return Vec3::new(x, y, 0.0);
    }
    let edge = reach.clamp(-half_extent.y, half_extent.y);
    let travel = ((edge - position.y) / slope).max(0.0);
    Vec3::new(x, edge, (position.z - travel).max(0.0))
}

/// A curated pose shown outside the random placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecialView {
    pub position: Vec3,
    pub target: Vec3,
}

impl SpecialView {
    pub const fn new(position: [f32; 3], target: [f32; 3]) -> Self {
        Self {
            position: Vec3::from_array(position),
            target: Vec3::from_array(target),
        }
    }

    pub fn pose(&self) -> CameraPose {
        let lean = self.target.y - self.position.y;
        let drop = (self.position.z - self.target.z).max(f32::EPSILON);
        CameraPose {
            position: self.position,
            tilt: lean.atan2(drop),
            target: self.target,
        }
    }
}

/// Curated views of the installation
pub const SPECIAL_VIEWS: [SpecialView; 6] = [
    SpecialView::new([0.0, -10.743654, 13.938095], [0.0, 0.0, 0.0]),
    SpecialView::new([0.0, 0.0, 1.75], [0.0, 0.0, 0.0]),
    SpecialView::new([0.0, 0.0, 4.0], [0.0, 0.0, 0.0]),
    SpecialView::new([0.0, 1.76096, 3.3434925], [0.25745443, 2.8698173, 0.0]),
    SpecialView::new([-5.109609, -6.0076704, 4.665403], [-5.109609, -6.0076704, 0.0]),
    SpecialView::new([-3.8494473, 2.4988613, 1.8389136], [-4.5875406, 2.509121, 0.0]),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view, degrees
    pub fov_deg: f32,
    pub aspect: f32,
    /// Mean seconds between `randomize_cam` calls
    pub call_period: f64,
    /// Mean seconds between special views (<= 0 disables)
    pub special_view_mean_interval: f64,
    /// Mean seconds between rotation enables (<= 0 disables)
    pub rotation_mean_interval: f64,
    pub height_range: [f32; 2],
    pub min_height_change: f32,
    pub xy_min: Vec2,
    pub xy_max: Vec2,
    pub min_position_change: f32,
    /// View centre may not be farther than this from the nearest emitter
    pub max_emitter_distance: f32,
    /// Tilt range, degrees
    pub tilt_range: [f32; 2],
    pub exclusion_factor: f32,
    pub exclusion_cap: f32,
    /// Rotation period range for random poses, seconds
    pub rotation_period: [f64; 2],
    /// Slower rotation used with special views, seconds
    pub special_rotation_period: [f64; 2],
    pub retry_budget: u32,
    pub special_views: Vec<SpecialView>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 75.0,
            aspect: 16.0 / 9.0,
            call_period: 22.5,
            special_view_mean_interval: 300.0,
            rotation_mean_interval: 90.0,
            height_range: [2.0, 12.0],
            min_height_change: 2.0,
            xy_min: Vec2::new(-12.0, -12.0),
            xy_max: Vec2::new(12.0, 12.0),
            min_position_change: 5.0,
            max_emitter_distance: 16.0,
            tilt_range: [0.0, 35.0],
            exclusion_factor: 0.35,
            exclusion_cap: 5.0,
            rotation_period: [600.0, 1200.0],
            special_rotation_period: [1200.0, 2400.0],
            retry_budget: 50,
            special_views: SPECIAL_VIEWS.to_vec(),
        }
    }
}

impl CameraConfig {
    /// Radius around the view centre an emitter must stay out of
    pub fn exclusion_radius(&self, height: f32) -> f32 {
        let half_fov = self.fov_deg.to_radians() * 0.5;
        (height * half_fov.tan() * self.aspect * self.exclusion_factor).min(self.exclusion_cap)
    }
}

/// What the camera is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    Idle,
    Sequencing,
    SpecialView,
}

/// Result of one `randomize_cam` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CamOutcome {
    /// Switched to a curated view
    Special { index: usize },
    /// Sampled a new pose; a false flag means the retry budget ran out
    Random {
        height_satisfied: bool,
        placement_satisfied: bool,
    },
}

impl CamOutcome {
    /// Whether a best-candidate fallback was used
    pub fn fallback(&self) -> bool {
        match *self {
            CamOutcome::Special { .. } => false,
            CamOutcome::Random {
                height_satisfied,
                placement_satisfied,
            } => !(height_satisfied && placement_satisfied),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    xy: Vec2,
    tilt: f32,
}

#[derive(Debug, Clone)]
pub struct CameraChoreographer {
    config: CameraConfig,
    pose: CameraPose,
    special_index: usize,
    on_special: bool,
    sequencing: bool,
}

impl CameraChoreographer {
    pub fn new(config: CameraConfig) -> Self {
        let pose = config
            .special_views
            .first()
            .map(SpecialView::pose)
            .unwrap_or_default();
        Self {
            on_special: !config.special_views.is_empty(),
            config,
            pose,
            special_index: 0,
            sequencing: false,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub fn set_pose(&mut self, pose: CameraPose) {
        self.pose = pose;
        self.on_special = false;
    }

    pub fn special_index(&self) -> usize {
        self.special_index
    }

    pub fn mode(&self) -> CameraMode {
        if self.on_special {
            CameraMode::SpecialView
        } else if self.sequencing {
            CameraMode::Sequencing
        } else {
            CameraMode::Idle
        }
    }

    /// Called by the session when autonomous control starts or stops
    pub fn set_sequencing(&mut self, sequencing: bool) {
        self.sequencing = sequencing;
    }

    /// Exclusion radius for the live pose
    pub fn exclusion_radius(&self) -> f32 {
        self.config.exclusion_radius(self.pose.position.z)
    }

    /// Step through the curated views, wrapping in both directions
    pub fn next_special_view(&mut self, offset: isize) -> Option<usize> {
        let count = self.config.special_views.len();
        if count == 0 {
            return None;
        }
        let index = (self.special_index as isize + offset).rem_euclid(count as isize) as usize;
        self.select_special_view(index).then_some(index)
    }

    pub fn select_special_view(&mut self, index: usize) -> bool {
        let Some(view) = self.config.special_views.get(index) else {
            return false;
        };
        self.pose = view.pose();
        self.special_index = index;
        self.on_special = true;
        log::info!("camera: special view {index}");
        true
    }

    /// Pick the next pose.
    ///
    /// 1. Occasionally show the next special view with slow rotation
    /// 2. Otherwise resample height until it changes by more than the minimum
    /// 3. Resample position and tilt until the position moved far enough and the
    ///    view centre keeps clear of, but not too far from, the nearest emitter
    /// 4. Derive the target from the tilt
    /// 5. Occasionally enable rotation, else stop it
    pub fn randomize_cam<R: Rng + ?Sized>(
        &mut self,
        emitters: &[EmissionPoint],
        mapping: &PlaneMapping,
        rotation: &mut Rotation,
        rng: &mut R,
    ) -> CamOutcome {
        let cfg = &self.config;

        let p_special = per_call_probability(cfg.call_period, cfg.special_view_mean_interval);
        if !cfg.special_views.is_empty() && chance(rng, p_special) {
            let [lo, hi] = cfg.special_rotation_period;
            let period = uniform_f64(rng, lo, hi) * random_sign(rng);
            rotation.set_period(period);
            let index = self.next_special_view(1).unwrap_or(0);
            return CamOutcome::Special { index };
        }

        let current = self.pose.position;
        let [h_lo, h_hi] = cfg.height_range;
        let height = sample_bounded(
            rng,
            cfg.retry_budget,
            "camera height",
            |r| uniform(r, h_lo, h_hi),
            |h| exceed((h - current.z).abs(), cfg.min_height_change),
        );

        let half = mapping.half_extent();
        let exclusion = cfg.exclusion_radius(height.value);
        let points: Vec<Vec2> = emitters.iter().map(|e| mapping.uv_to_world(e.uv)).collect();
        let [t_lo, t_hi] = cfg.tilt_range.map(f32::to_radians);
        let (min_xy, max_xy) = (cfg.xy_min, cfg.xy_max);

        let placement = sample_bounded(
            rng,
            cfg.retry_budget,
            "camera position",
            |r| Placement {
                xy: Vec2::new(
                    uniform(r, min_xy.x, max_xy.x),
                    uniform(r, min_xy.y, max_xy.y),
                ),
                tilt: uniform(r, t_lo, t_hi),
            },
            |c| {
                let mut penalty = exceed(
                    c.xy.distance(current.truncate()),
                    cfg.min_position_change,
                );
                if !points.is_empty() {
                    let centre =
                        tilt_to_target(c.xy.extend(height.value), c.tilt, half).truncate();
                    let nearest = points
                        .iter()
                        .map(|p| p.distance(centre))
                        .fold(f32::INFINITY, f32::min);
                    penalty += exceed(nearest, exclusion);
                    penalty += at_most(nearest, cfg.max_emitter_distance);
                }
                penalty
            },
        );

        let position = placement.value.xy.extend(height.value);
        let pose = CameraPose::looking(position, placement.value.tilt, half);

        let p_rotate = per_call_probability(cfg.call_period, cfg.rotation_mean_interval);
        if chance(rng, p_rotate) {
            let [lo, hi] = cfg.rotation_period;
            let period = uniform_f64(rng, lo, hi) * random_sign(rng);
            rotation.set_period(period);
            log::info!("camera: rotation on, period {period:.0}s");
        } else {
            rotation.disable();
        }

        log::info!(
            "camera: pose ({:.2}, {:.2}, {:.2}) tilt {:.1}°",
            position.x,
            position.y,
            position.z,
            pose.tilt.to_degrees()
        );
        self.pose = pose;
        self.on_special = false;
        CamOutcome::Random {
            height_satisfied: height.satisfied,
            placement_satisfied: placement.satisfied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn random_only() -> CameraConfig {
        CameraConfig {
            special_view_mean_interval: 0.0,
            ..Default::default()
        }
    }

    fn pair() -> Vec<EmissionPoint> {
        vec![
            EmissionPoint::new(0.3, 0.5, 1.0),
            EmissionPoint::new(0.7, 0.5, 1.0),
        ]
    }

    #[test]
    fn test_target_straight_below_at_zero_tilt() {
        let t = tilt_to_target(Vec3::new(3.0, -4.0, 8.0), 0.0, Vec2::splat(20.0));
        assert_eq!(t, Vec3::new(3.0, -4.0, 0.0));
    }

    #[test]
    fn test_target_leans_with_tilt() {
        let t = tilt_to_target(
            Vec3::new(0.0, 0.0, 10.0),
            std::f32::consts::FRAC_PI_4,
            Vec2::splat(20.0),
        );
        assert!((t.y - 10.0).abs() < 1e-4);
        assert_eq!(t.z, 0.0);
    }

    #[test]
    fn test_target_clamped_to_edge_at_height() {
        let t = tilt_to_target(
            Vec3::new(0.0, 15.0, 10.0),
            std::f32::consts::FRAC_PI_4,
            Vec2::splat(20.0),
        );
        assert_eq!(t.y, 20.0);
        // ray drops 5 units while travelling 5 units to the edge
        assert!((t.z - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_exclusion_radius_is_capped() {
        let cfg = CameraConfig {
            fov_deg: 90.0,
            aspect: 2.0,
            exclusion_factor: 0.5,
            exclusion_cap: 100.0,
            ..Default::default()
        };
        // tan(45°) = 1 -> height * 1 * 2 * 0.5
        assert!((cfg.exclusion_radius(3.0) - 3.0).abs() < 1e-5);
        let capped = CameraConfig {
            exclusion_cap: 2.0,
            ..cfg
        };
        assert_eq!(capped.exclusion_radius(3.0), 2.0);
    }

    #[test]
    fn test_plane_mapping_round_trip_under_rotation() {
        let mapping = PlaneMapping {
            extent: Vec2::splat(40.0),
            rotation: 0.7,
        };
        let uv = Vec2::new(0.2, 0.9);
        let back = mapping.world_to_uv(mapping.uv_to_world(uv));
        assert!(back.distance(uv) < 1e-5);
        assert_eq!(PlaneMapping::default().uv_to_world(Vec2::splat(0.5)), Vec2::ZERO);
    }

    #[test]
    fn test_special_view_pose_tilt() {
        let pose = SPECIAL_VIEWS[0].pose();
        assert!((pose.tilt - 0.6567).abs() < 1e-3);
        let straight = SPECIAL_VIEWS[1].pose();
        assert_eq!(straight.tilt, 0.0);
    }

    #[test]
    fn test_min_position_change_respected() {
        let mut cam = CameraChoreographer::new(random_only());
        let mut rot = Rotation::default();
        let mut rng = Pcg32::seed_from_u64(42);
        let emitters = pair();
        let mapping = PlaneMapping::default();
        let mut satisfied = 0;
        for _ in 0..300 {
            let before = cam.pose().position;
            let outcome = cam.randomize_cam(&emitters, &mapping, &mut rot, &mut rng);
            let after = cam.pose().position;
            match outcome {
                CamOutcome::Random {
                    placement_satisfied,
                    height_satisfied,
                } => {
                    if placement_satisfied {
                        satisfied += 1;
                        assert!(after.truncate().distance(before.truncate()) > 5.0);
                    }
                    if height_satisfied {
                        assert!((after.z - before.z).abs() > 2.0);
                    }
                }
                CamOutcome::Special { .. } => panic!("special views are disabled"),
            }
        }
        assert!(satisfied > 280);
    }

    #[test]
    fn test_view_centre_clear_of_emitters() {
        let mut cam = CameraChoreographer::new(random_only());
        let mut rot = Rotation::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let emitters = pair();
        let mapping = PlaneMapping::default();
        for _ in 0..200 {
            let outcome = cam.randomize_cam(&emitters, &mapping, &mut rot, &mut rng);
            if outcome.fallback() {
                continue;
            }
            let centre = cam.pose().view_center();
            let radius = cam.exclusion_radius();
            for e in &emitters {
                let d = mapping.uv_to_world(e.uv).distance(centre);
                assert!(d > radius);
            }
        }
    }

    #[test]
    fn test_always_special_cycles_and_rotates() {
        let cfg = CameraConfig {
            call_period: 10.0,
            special_view_mean_interval: 1.0,
            ..Default::default()
        };
        let count = cfg.special_views.len();
        let mut cam = CameraChoreographer::new(cfg);
        let mut rot = Rotation::default();
        let mut rng = Pcg32::seed_from_u64(3);
        for i in 1..=count {
            let outcome = cam.randomize_cam(&pair(), &PlaneMapping::default(), &mut rot, &mut rng);
            assert_eq!(outcome, CamOutcome::Special { index: i % count });
            assert_eq!(cam.mode(), CameraMode::SpecialView);
            assert!(rot.is_enabled());
            assert!(rot.period().abs() >= 1200.0);
        }
    }

    #[test]
    fn test_rotation_probability_extremes() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut rot = Rotation::default();

        let mut never = CameraChoreographer::new(CameraConfig {
            rotation_mean_interval: 0.0,
            ..random_only()
        });
        rot.set_period(100.0);
        never.randomize_cam(&pair(), &PlaneMapping::default(), &mut rot, &mut rng);
        assert!(!rot.is_enabled());

        let mut always = CameraChoreographer::new(CameraConfig {
            rotation_mean_interval: 1.0,
            ..random_only()
        });
        always.randomize_cam(&pair(), &PlaneMapping::default(), &mut rot, &mut rng);
        assert!(rot.is_enabled());
        assert!((600.0..1200.0).contains(&rot.period().abs()));
    }

    #[test]
    fn test_degenerate_rect_falls_back() {
        let cfg = CameraConfig {
            xy_min: Vec2::ZERO,
            xy_max: Vec2::ZERO,
            height_range: [5.0, 5.0],
            ..random_only()
        };
        let mut cam = CameraChoreographer::new(cfg);
        cam.set_pose(CameraPose::looking(Vec3::new(0.0, 0.0, 5.0), 0.0, Vec2::splat(20.0)));
        let mut rot = Rotation::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let outcome = cam.randomize_cam(&[], &PlaneMapping::default(), &mut rot, &mut rng);
        assert!(outcome.fallback());
        assert_eq!(cam.pose().position, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_manual_cycle_wraps_both_ways() {
        let mut cam = CameraChoreographer::new(CameraConfig::default());
        let n = cam.config().special_views.len();
        assert_eq!(cam.next_special_view(-1), Some(n - 1));
        assert_eq!(cam.next_special_view(1), Some(0));
        assert!(!cam.select_special_view(n));

        let mut empty = CameraChoreographer::new(CameraConfig {
            special_views: Vec::new(),
            ..Default::default()
        });
        assert_eq!(empty.next_special_view(1), None);
        assert_eq!(empty.mode(), CameraMode::Idle);
        empty.set_sequencing(true);
        assert_eq!(empty.mode(), CameraMode::Sequencing);
    }
}
