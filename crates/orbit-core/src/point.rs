use crate::action::Action;
use crate::nest::NestId;
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct PointId(String);

crate::impl_string_newtype!(PointId);

impl PointId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Presentation overrides carried by a point. Nothing in this crate reads
/// them; they only have to survive a save/load cycle untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointStyle {
    #[serde(rename = "ic", default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(rename = "sw", default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
    #[serde(rename = "bw", default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f32>,
    #[serde(rename = "fg", default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(rename = "bg", default, skip_serializing_if = "Option::is_none")]
    pub background: Option<u32>,
    #[serde(rename = "op", default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(rename = "pd", default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<f32>,
    #[serde(rename = "cr", default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f32>,
    #[serde(rename = "hf", default, skip_serializing_if = "Option::is_none")]
    pub haptic: Option<bool>,
    #[serde(rename = "dn", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl PointStyle {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// One actionable node on a ring.
///
/// Field keys on the wire are single tokens and must never be reassigned:
/// older builds ignore keys they do not know, so new optional fields get new
/// keys. `i` and `n` are absent from legacy documents and are filled in on
/// decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipePoint {
    #[serde(rename = "i", default = "PointId::generate")]
    pub id: PointId,
    #[serde(rename = "c")]
    pub circle_number: i32,
    #[serde(rename = "a")]
    pub angle: f64,
    #[serde(
        rename = "p",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::protocol::lenient_action"
    )]
    pub action: Option<Action>,
    #[serde(rename = "n", default)]
    pub nest_id: NestId,
    #[serde(rename = "s", default, skip_serializing_if = "PointStyle::is_empty")]
    pub style: PointStyle,
}

impl SwipePoint {
    pub fn new(circle_number: i32, angle: f64, action: Option<Action>, nest_id: NestId) -> Self {
        Self {
            id: PointId::generate(),
            circle_number,
            angle,
            action,
            nest_id,
            style: PointStyle::default(),
        }
    }

    pub fn is_on(&self, nest_id: NestId, circle_id: i32) -> bool {
        self.nest_id == nest_id && self.circle_number == circle_id
    }
}

/// A ring. Points belong to it through `SwipePoint::circle_number`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub id: i32,
    pub radius: f64,
}

impl Circle {
    pub fn new(id: i32, radius: f64) -> Self {
        Self { id, radius }
    }

    pub fn is_valid(&self) -> bool {
        self.radius.is_finite() && self.radius > 0.0
    }
}
