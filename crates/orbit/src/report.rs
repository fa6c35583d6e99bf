use crate::config::Settings;
use crate::layout::Loaded;
use orbit_core::nest::{self, NestId};
use orbit_core::{Navigator, PointId};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Default)]
pub struct Report {
    pub points: usize,
    pub nests: usize,
    pub per_nest: BTreeMap<NestId, usize>,
    pub without_action: usize,
    pub rejected: Vec<String>,
    pub unknown_circles: Vec<(PointId, i32)>,
    pub collisions: Vec<(NestId, i32, PointId, PointId)>,
    pub dangling: Vec<(PointId, NestId)>,
    pub orphans: Vec<NestId>,
    pub loops: Vec<NestId>,
}

impl Report {
    pub fn build(loaded: &Loaded, settings: &Settings) -> Self {
        let layout = &loaded.layout;
        let geometry = settings.geometry();

        let mut report = Report {
            points: layout.points.len(),
            nests: layout.nests.len(),
            without_action: layout.points.iter().filter(|p| p.action.is_none()).count(),
            rejected: loaded
                .rejected
                .iter()
                .map(|(path, e)| format!("{}: {}", path.display(), e))
                .collect(),
            orphans: nest::orphaned_nests(&layout.nests),
            ..Report::default()
        };

        for point in &layout.points {
            *report.per_nest.entry(point.nest_id).or_default() += 1;
            if settings.circle(point.circle_number).is_none() {
                report
                    .unknown_circles
                    .push((point.id.clone(), point.circle_number));
            }
        }

        for nest_id in layout.nest_ids() {
            for circle in &settings.circles {
                report.collisions.extend(
                    geometry
                        .collisions(&layout.points, nest_id, circle)
                        .into_iter()
                        .map(|(a, b)| (nest_id, circle.id, a.clone(), b.clone())),
                );
            }
        }

        report.dangling = nest::dangling_nest_refs(&layout.points, &layout.nests)
            .into_iter()
            .map(|(id, target)| (id.clone(), target))
            .collect();

        // a chain that never reaches a root means the parent links loop
        report.loops = layout
            .nests
            .iter()
            .filter(|n| {
                let chain = Navigator::new(n.id).ancestors(&layout.nests);
                chain
                    .last()
                    .is_some_and(|&last| !nest::resolve(&layout.nests, last).is_root())
            })
            .map(|n| n.id)
            .collect();

        report
    }

    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
            && self.unknown_circles.is_empty()
            && self.collisions.is_empty()
            && self.dangling.is_empty()
            && self.orphans.is_empty()
            && self.loops.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} points in {} nests ({} declared), {} without action",
            self.points,
            self.per_nest.len(),
            self.nests,
            self.without_action
        )?;
        for (nest_id, count) in &self.per_nest {
            writeln!(f, "  nest {}: {} points", nest_id, count)?;
        }
        for line in &self.rejected {
            writeln!(f, "rejected {}", line)?;
        }
        for (id, circle) in &self.unknown_circles {
            writeln!(f, "point {} sits on unconfigured circle {}", id, circle)?;
        }
        for (nest_id, circle, a, b) in &self.collisions {
            writeln!(f, "nest {} circle {}: {} overlaps {}", nest_id, circle, a, b)?;
        }
        for (id, target) in &self.dangling {
            writeln!(f, "point {} opens missing nest {}", id, target)?;
        }
        for id in &self.orphans {
            writeln!(f, "nest {} has a missing parent", id)?;
        }
        for id in &self.loops {
            writeln!(f, "nest {} never reaches a root", id)?;
        }
        if self.is_clean() {
            writeln!(f, "ok")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use orbit_core::{Action, Circle, CircleNest, ProtocolError, SwipePoint};
    use std::path::PathBuf;

    fn settings() -> Settings {
        Settings {
            marker_diameter: 100.0 * 20f64.to_radians(),
            circles: vec![Circle::new(0, 100.0)],
            ..Settings::default()
        }
    }

    #[test]
    fn test_clean_layout() {
        let loaded = Loaded {
            layout: Layout {
                points: vec![
                    SwipePoint::new(0, 0.0, Some(Action::OpenCircleNest { nest_id: 1 }), 0),
                    SwipePoint::new(0, 90.0, None, 0),
                    SwipePoint::new(0, 0.0, Some(Action::GoParentNest), 1),
                ],
                nests: vec![CircleNest::root(), CircleNest::new(1, 0)],
            },
            rejected: Vec::new(),
        };
        let report = Report::build(&loaded, &settings());
        assert!(report.is_clean(), "{report}");
        assert_eq!(report.points, 3);
        assert_eq!(report.without_action, 1);
        assert_eq!(report.per_nest, BTreeMap::from([(0, 2), (1, 1)]));
        assert!(report.to_string().ends_with("ok\n"));
    }

    #[test]
    fn test_problems_are_listed() {
        let overlapping = SwipePoint::new(0, 5.0, None, 0);
        let loaded = Loaded {
            layout: Layout {
                points: vec![
                    SwipePoint::new(0, 0.0, Some(Action::OpenCircleNest { nest_id: 9 }), 0),
                    overlapping,
                    SwipePoint::new(4, 0.0, None, 0),
                ],
                nests: vec![
                    CircleNest::new(5, 6),
                    CircleNest::new(6, 5),
                    CircleNest::new(7, 3),
                ],
            },
            rejected: vec![(
                PathBuf::from("nests.json"),
                ProtocolError::MissingActionType,
            )],
        };

        let report = Report::build(&loaded, &settings());
        assert!(!report.is_clean());
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.unknown_circles.len(), 1);
        assert_eq!(report.collisions.len(), 1);
        assert_eq!(report.dangling.len(), 1);
        assert_eq!(report.dangling[0].1, 9);
        assert_eq!(report.orphans, vec![7]);
        assert_eq!(report.loops, vec![5, 6]);
        assert!(!report.to_string().contains("\nok"));
    }
}
