//! Layout files on disk: one JSON document of points and one of nests.

use orbit_core::geometry::Resolution;
use orbit_core::nest::{self, NestId, ROOT_NEST};
use orbit_core::protocol;
use orbit_core::{Action, CircleNest, ProtocolError, RingGeometry, SwipePoint};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Circle {0} is not configured")]
    UnknownCircle(i32),
    #[error("No free angle on circle {0}")]
    NoFreeAngle(i32),
    #[error("Nest {0} cannot be removed")]
    ProtectedNest(NestId),
    #[error("No nest ids left")]
    NestIdsExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPaths {
    pub points: PathBuf,
    pub nests: PathBuf,
}

impl LayoutPaths {
    pub fn all(&self) -> [&Path; 2] {
        [&self.points, &self.nests]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub points: Vec<SwipePoint>,
    pub nests: Vec<CircleNest>,
}

/// A layout together with the documents that had to be dropped while
/// reading it.
#[derive(Debug, Default)]
pub struct Loaded {
    pub layout: Layout,
    pub rejected: Vec<(PathBuf, ProtocolError)>,
}

fn read_document(path: &Path) -> std::io::Result<String> {
    match fs_err::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e),
    }
}

fn write_document(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs_err::create_dir_all(parent)?;
    }
    fs_err::write(path, text)
}

impl Layout {
    /// Reads both documents. Missing files are empty layouts; unreadable
    /// documents are reported in [`Loaded::rejected`] and treated as empty.
    pub fn load(paths: &LayoutPaths) -> Result<Loaded, LayoutError> {
        let mut loaded = Loaded::default();

        match protocol::try_decode_points(&read_document(&paths.points)?) {
            Ok(points) => loaded.layout.points = points,
            Err(e) => {
                log::warn!("Ignoring {}: {}", paths.points.display(), e);
                loaded.rejected.push((paths.points.clone(), e));
            }
        }
        match protocol::try_decode_nests(&read_document(&paths.nests)?) {
            Ok(nests) => loaded.layout.nests = nests,
            Err(e) => {
                log::warn!("Ignoring {}: {}", paths.nests.display(), e);
                loaded.rejected.push((paths.nests.clone(), e));
            }
        }
        Ok(loaded)
    }

    pub fn save(&self, paths: &LayoutPaths, pretty: bool) -> Result<(), LayoutError> {
        let (points, nests) = if pretty {
            (
                protocol::encode_points_pretty(&self.points),
                protocol::encode_nests_pretty(&self.nests),
            )
        } else {
            (
                protocol::encode_points(&self.points),
                protocol::encode_nests(&self.nests),
            )
        };
        write_document(&paths.points, &points)?;
        write_document(&paths.nests, &nests)?;
        log::info!(
            "Saved {} points and {} nests",
            self.points.len(),
            self.nests.len()
        );
        Ok(())
    }

    /// Every nest id that holds points or is declared, plus the default nest.
    pub fn nest_ids(&self) -> BTreeSet<NestId> {
        self.points
            .iter()
            .map(|p| p.nest_id)
            .chain(self.nests.iter().map(|n| n.id))
            .chain(std::iter::once(ROOT_NEST))
            .collect()
    }

    /// Places a new point on `circle_id` of `nest_id` at a free angle.
    pub fn add_point(
        &mut self,
        settings: &crate::config::Settings,
        circle_id: i32,
        nest_id: NestId,
        action: Option<Action>,
    ) -> Result<&SwipePoint, LayoutError> {
        let circle = settings
            .circle(circle_id)
            .ok_or(LayoutError::UnknownCircle(circle_id))?;
        let neighbours: Vec<SwipePoint> = self
            .points
            .iter()
            .filter(|p| p.nest_id == nest_id)
            .cloned()
            .collect();
        let angle = settings
            .geometry()
            .find_free_angle(circle, &neighbours)
            .ok_or(LayoutError::NoFreeAngle(circle_id))?;

        self.points
            .push(SwipePoint::new(circle_id, angle, action, nest_id));
        let point = &self.points[self.points.len() - 1];
        log::info!(
            "Added point {} on circle {} of nest {} at {:.1} degrees",
            point.id,
            circle_id,
            nest_id,
            angle
        );
        Ok(point)
    }

    /// Declares a new nest under `parent` and returns its id.
    pub fn add_nest(&mut self, parent: NestId) -> Result<NestId, LayoutError> {
        let id = nest::next_nest_id(&self.nests).ok_or(LayoutError::NestIdsExhausted)?;
        self.nests.push(CircleNest::new(id, parent));
        Ok(id)
    }

    pub fn remove_nest(&mut self, id: NestId) -> Result<Vec<NestId>, LayoutError> {
        nest::remove_nest(&mut self.points, &mut self.nests, id)
            .ok_or(LayoutError::ProtectedNest(id))
    }

    /// Runs collision resolution over every nest and ring; returns the rings
    /// that moved.
    pub fn tidy(
        &mut self,
        geometry: &RingGeometry,
        circles: &[orbit_core::Circle],
    ) -> Vec<(NestId, i32, Resolution)> {
        let mut moved = Vec::new();
        for nest_id in self.nest_ids() {
            for circle in circles {
                let resolution = geometry.resolve_collisions(&mut self.points, nest_id, circle, None);
                if resolution.changed {
                    if !resolution.converged {
                        log::warn!(
                            "Circle {} of nest {} is still crowded after {} passes",
                            circle.id,
                            nest_id,
                            resolution.passes
                        );
                    }
                    moved.push((nest_id, circle.id, resolution));
                }
            }
        }
        moved
    }
}
