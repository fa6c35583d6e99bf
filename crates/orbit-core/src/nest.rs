use crate::point::{PointId, SwipePoint};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

pub type NestId = i32;

pub const ROOT_NEST: NestId = 0;
/// `drag_distances` key of the zone that cancels the gesture.
pub const CANCEL_ZONE: i32 = -1;

/// One level of the menu hierarchy.
///
/// `drag_distances` maps a ring index (or [`CANCEL_ZONE`]) to the distance a
/// drag must stay within to target it. A nest that is its own parent is a
/// root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleNest {
    pub id: NestId,
    #[serde(default)]
    pub drag_distances: BTreeMap<i32, f64>,
    #[serde(default)]
    pub parent_id: NestId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Cancel,
    Ring(i32),
}

impl CircleNest {
    pub fn new(id: NestId, parent_id: NestId) -> Self {
        Self {
            id,
            drag_distances: BTreeMap::new(),
            parent_id,
        }
    }

    pub fn root() -> Self {
        Self::new(ROOT_NEST, ROOT_NEST)
    }

    /// Stand-in for a nest id that has no stored nest.
    pub fn synthesized(id: NestId) -> Self {
        Self::new(id, ROOT_NEST)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id == self.id
    }

    /// Which zone a drag `distance` away from the center falls into. The
    /// thresholds are upper bounds checked shortest first; past the longest
    /// one the longest still applies.
    pub fn target_at(&self, distance: f64) -> Option<DragTarget> {
        let mut zones: Vec<(i32, f64)> = self
            .drag_distances
            .iter()
            .map(|(&ring, &threshold)| (ring, threshold))
            .collect();
        zones.sort_by(|a, b| a.1.total_cmp(&b.1));

        zones
            .iter()
            .find(|(_, threshold)| distance <= *threshold)
            .or(zones.last())
            .map(|&(ring, _)| match ring {
                CANCEL_ZONE => DragTarget::Cancel,
                ring => DragTarget::Ring(ring),
            })
    }
}

pub fn resolve(nests: &[CircleNest], id: NestId) -> Cow<'_, CircleNest> {
    nests
        .iter()
        .find(|n| n.id == id)
        .map(Cow::Borrowed)
        .unwrap_or_else(|| Cow::Owned(CircleNest::synthesized(id)))
}

/// Tracks the nest the menu is showing. Every transition returns the new
/// id so the caller can push it into whatever state it renders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Navigator {
    current: NestId,
}

impl Navigator {
    pub fn new(current: NestId) -> Self {
        Self { current }
    }

    pub fn current_id(&self) -> NestId {
        self.current
    }

    pub fn current_nest<'a>(&self, nests: &'a [CircleNest]) -> Cow<'a, CircleNest> {
        resolve(nests, self.current)
    }

    pub fn go_back(&mut self, nests: &[CircleNest]) -> NestId {
        let nest = self.current_nest(nests);
        if !nest.is_root() {
            log::debug!("Leaving nest {} for {}", nest.id, nest.parent_id);
            self.current = nest.parent_id;
        }
        self.current
    }

    pub fn go_to_nest(&mut self, target: NestId) -> NestId {
        if target != self.current {
            log::debug!("Jumping from nest {} to {}", self.current, target);
            self.current = target;
        }
        self.current
    }

    /// The current nest followed by its parents up to the root. Stops early if
    /// the parent links loop.
    pub fn ancestors(&self, nests: &[CircleNest]) -> Vec<NestId> {
        let mut chain = vec![self.current];
        let mut nest = resolve(nests, self.current);
        while !nest.is_root() && !chain.contains(&nest.parent_id) {
            chain.push(nest.parent_id);
            nest = resolve(nests, nest.parent_id);
        }
        chain
    }
}

/// One past the highest stored id. When that would overflow, the lowest
/// unused positive id is handed out instead; `None` once none is left.
pub fn next_nest_id(nests: &[CircleNest]) -> Option<NestId> {
    let max = nests.iter().map(|n| n.id).max().unwrap_or(ROOT_NEST);
    if let Some(id) = max.max(ROOT_NEST).checked_add(1) {
        return Some(id);
    }

    let used: HashSet<NestId> = nests.iter().map(|n| n.id).collect();
    (ROOT_NEST + 1..=NestId::MAX).find(|id| !used.contains(id))
}

pub fn children_of(nests: &[CircleNest], id: NestId) -> impl Iterator<Item = &CircleNest> {
    nests.iter().filter(move |n| n.parent_id == id && !n.is_root())
}

/// `id` and every nest below it.
pub fn subtree(nests: &[CircleNest], id: NestId) -> Vec<NestId> {
    let mut found = vec![id];
    let mut next = 0;
    while next < found.len() {
        let parent = found[next];
        for child in children_of(nests, parent) {
            if !found.contains(&child.id) {
                found.push(child.id);
            }
        }
        next += 1;
    }
    found
}

/// Deletes a nest together with its sub-nests and every point inside them,
/// and clears actions elsewhere that opened one of the deleted nests.
/// Returns the removed ids, or `None` for the default nest which cannot go.
pub fn remove_nest(
    points: &mut Vec<SwipePoint>,
    nests: &mut Vec<CircleNest>,
    id: NestId,
) -> Option<Vec<NestId>> {
    if id == ROOT_NEST {
        log::warn!("Refusing to remove the default nest");
        return None;
    }

    let removed = subtree(nests, id);
    let removed_set: HashSet<NestId> = removed.iter().copied().collect();

    nests.retain(|n| !removed_set.contains(&n.id));
    points.retain(|p| !removed_set.contains(&p.nest_id));
    for point in points.iter_mut() {
        if point
            .action
            .as_ref()
            .and_then(|a| a.target_nest())
            .is_some_and(|target| removed_set.contains(&target))
        {
            log::debug!("Clearing nest link on point {}", point.id);
            point.action = None;
        }
    }
    Some(removed)
}

/// Points whose action opens a nest that does not exist.
pub fn dangling_nest_refs<'a>(
    points: &'a [SwipePoint],
    nests: &[CircleNest],
) -> Vec<(&'a PointId, NestId)> {
    let known: HashSet<NestId> = nests
        .iter()
        .map(|n| n.id)
        .chain(std::iter::once(ROOT_NEST))
        .collect();

    points
        .iter()
        .filter_map(|p| {
            let target = p.action.as_ref()?.target_nest()?;
            (!known.contains(&target)).then_some((&p.id, target))
        })
        .collect()
}

/// Nests whose parent is neither stored nor the default nest.
pub fn orphaned_nests(nests: &[CircleNest]) -> Vec<NestId> {
    nests
        .iter()
        .filter(|n| {
            !n.is_root()
                && n.parent_id != ROOT_NEST
                && !nests.iter().any(|p| p.id == n.parent_id)
        })
        .map(|n| n.id)
        .collect()
}
