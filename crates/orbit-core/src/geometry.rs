//! Placement of swipe points on rings.
//!
//! Angles are degrees with 0 pointing up and growing clockwise. Radii, marker
//! size and cursor coordinates must share one unit.

use crate::nest::NestId;
use crate::point::{Circle, PointId, SwipePoint};
use rand::Rng;

pub const DEFAULT_MARKER_DIAMETER: f64 = 56.0;
pub const FREE_ANGLE_TRIALS: usize = 200;
pub const MAX_RESOLVE_PASSES: usize = 20;
const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

pub fn normalize_angle(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Shorter separation between two angles, in `[0, 180]`.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = normalize_angle(a - b);
    d.min(360.0 - d)
}

/// Shortest signed rotation taking `from` onto `to`, in `(-180, 180]`.
pub fn signed_angular_delta(from: f64, to: f64) -> f64 {
    let d = normalize_angle(to - from);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Screen position of `angle` on a ring of `radius` around `center`.
pub fn position_of(center: Point, radius: f64, angle: f64) -> Point {
    let theta = angle.to_radians();
    Point::new(
        center.x + radius * theta.sin(),
        center.y - radius * theta.cos(),
    )
}

pub fn points_on(
    points: &[SwipePoint],
    nest_id: NestId,
    circle_id: i32,
) -> impl Iterator<Item = &SwipePoint> {
    points.iter().filter(move |p| p.is_on(nest_id, circle_id))
}

/// Moves the dragged point under the cursor: the angle follows the cursor
/// and the point joins whichever ring radius is closest to the cursor
/// distance. Returns whether the point changed ring.
pub fn relocate_point(
    point: &mut SwipePoint,
    circles: &[Circle],
    center: Point,
    cursor: Point,
) -> bool {
    let (dx, dy) = (cursor.x - center.x, cursor.y - center.y);
    point.angle = normalize_angle(dx.atan2(-dy).to_degrees());

    let distance = dx.hypot(dy);
    let nearest = circles.iter().min_by(|a, b| {
        (a.radius - distance)
            .abs()
            .total_cmp(&(b.radius - distance).abs())
    });

    match nearest {
        Some(circle) if circle.id != point.circle_number => {
            log::debug!(
                "Point {} moves from circle {} to {}",
                point.id,
                point.circle_number,
                circle.id
            );
            point.circle_number = circle.id;
            true
        }
        _ => false,
    }
}

/// The point being dragged and its angle before the current motion step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag<'a> {
    pub point_id: &'a PointId,
    pub origin: f64,
}

impl<'a> Drag<'a> {
    pub fn new(point_id: &'a PointId, origin: f64) -> Self {
        Self { point_id, origin }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    pub passes: usize,
    pub changed: bool,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingGeometry {
    /// Arc length one point marker occupies on its ring.
    pub marker_diameter: f64,
}

impl Default for RingGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_DIAMETER)
    }
}

impl RingGeometry {
    pub fn new(marker_diameter: f64) -> Self {
        Self { marker_diameter }
    }

    /// Angle two markers need between them on a ring of `radius`.
    pub fn min_angular_gap(&self, radius: f64) -> f64 {
        (self.marker_diameter / radius).to_degrees()
    }

    pub fn find_free_angle(&self, circle: &Circle, existing: &[SwipePoint]) -> Option<f64> {
        self.find_free_angle_with(&mut rand::thread_rng(), circle, existing)
    }

    /// Picks an angle on `circle` away from the points already on it (pass
    /// the points of a single nest). Random candidates are tried first; when
    /// none fits, the middle of the widest opening is used.
    pub fn find_free_angle_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        circle: &Circle,
        existing: &[SwipePoint],
    ) -> Option<f64> {
        if !circle.is_valid() {
            return None;
        }

        let mut taken: Vec<f64> = existing
            .iter()
            .filter(|p| p.circle_number == circle.id)
            .map(|p| normalize_angle(p.angle))
            .collect();
        if taken.is_empty() {
            return Some(rng.gen_range(0.0..360.0));
        }

        let gap = self.min_angular_gap(circle.radius);
        for _ in 0..FREE_ANGLE_TRIALS {
            let candidate = rng.gen_range(0.0..360.0);
            if taken.iter().all(|&a| angular_distance(a, candidate) >= gap) {
                return Some(candidate);
            }
        }

        log::debug!("Ring {} is crowded, bisecting its widest gap", circle.id);
        taken.sort_by(f64::total_cmp);
        widest_gap_bisector(&taken)
    }

    /// Point pairs on one ring of one nest that sit closer than the gap.
    pub fn collisions<'a>(
        &self,
        points: &'a [SwipePoint],
        nest_id: NestId,
        circle: &Circle,
    ) -> Vec<(&'a PointId, &'a PointId)> {
        let gap = self.min_angular_gap(circle.radius);
        let members: Vec<&SwipePoint> = points_on(points, nest_id, circle.id).collect();

        let mut found = Vec::new();
        for (n, &a) in members.iter().enumerate() {
            for &b in &members[n + 1..] {
                if angular_distance(a.angle, b.angle) < gap - EPSILON {
                    found.push((&a.id, &b.id));
                }
            }
        }
        found
    }

    /// Spreads out points of `nest_id` on `circle` that overlap.
    ///
    /// Each pass walks the points in angle order and fixes every pair closer
    /// than the minimum gap, either by pushing both apart around their
    /// midpoint or, when the dragged point has travelled past the midpoint
    /// towards the other one, by swapping their angles so the drag carries
    /// through. A swapped pair still overlaps and is pushed apart on the next
    /// pass. Three-way overlaps settle over several passes.
    pub fn resolve_collisions(
        &self,
        points: &mut [SwipePoint],
        nest_id: NestId,
        circle: &Circle,
        drag: Option<Drag<'_>>,
    ) -> Resolution {
        let mut resolution = Resolution::default();
        if !circle.is_valid() {
            return resolution;
        }

        let gap = self.min_angular_gap(circle.radius);
        let dragged = drag.map(|d| d.point_id);
        let mut origin = drag.map(|d| d.origin);
        let mut members: Vec<usize> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_on(nest_id, circle.id))
            .map(|(i, _)| i)
            .collect();

        for pass in 0..MAX_RESOLVE_PASSES {
            resolution.passes = pass + 1;
            members.sort_by(|&a, &b| {
                normalize_angle(points[a].angle).total_cmp(&normalize_angle(points[b].angle))
            });

            let mut changed = false;
            for (n, &i) in members.iter().enumerate() {
                for &j in &members[n + 1..] {
                    if angular_distance(points[i].angle, points[j].angle) >= gap - EPSILON {
                        continue;
                    }
                    changed = true;

                    let pair = match dragged {
                        Some(id) if points[i].id == *id => Some((i, j)),
                        Some(id) if points[j].id == *id => Some((j, i)),
                        _ => None,
                    };
                    match (pair, origin) {
                        (Some((d, o)), Some(from))
                            if crossed_midpoint(from, points[d].angle, points[o].angle) =>
                        {
                            log::debug!("Point {} passes through {}", points[d].id, points[o].id);
                            let target = points[o].angle;
                            points[o].angle = points[d].angle;
                            points[d].angle = target;
                            origin = Some(target);
                        }
                        _ => push_apart(points, i, j, gap),
                    }
                }
            }

            if !changed {
                resolution.converged = true;
                break;
            }
            resolution.changed = true;
        }
        resolution
    }
}

/// Whether a point that started at `from` and now sits at `now` is past the
/// midpoint between `from` and `other`, on `other`'s side.
fn crossed_midpoint(from: f64, now: f64, other: f64) -> bool {
    let delta = signed_angular_delta(from, other);
    if delta.abs() < EPSILON {
        return false;
    }
    let progress = signed_angular_delta(from + delta / 2.0, now);
    progress.abs() > EPSILON && progress.signum() == delta.signum()
}

fn push_apart(points: &mut [SwipePoint], i: usize, j: usize, gap: f64) {
    let (a, b) = (points[i].angle, points[j].angle);
    let delta = signed_angular_delta(a, b);
    let direction = if delta < 0.0 { -1.0 } else { 1.0 };
    let midpoint = a + delta / 2.0;

    points[i].angle = normalize_angle(midpoint - direction * gap / 2.0);
    points[j].angle = normalize_angle(midpoint + direction * gap / 2.0);
}

/// `sorted` must be in ascending order within `[0, 360)`.
fn widest_gap_bisector(sorted: &[f64]) -> Option<f64> {
    let first = *sorted.first()?;
    sorted
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = sorted.get(i + 1).copied().unwrap_or(first + 360.0);
            (start, end - start)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(start, width)| normalize_angle(start + width / 2.0))
}
