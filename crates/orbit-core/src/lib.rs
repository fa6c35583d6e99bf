pub mod action;
pub mod error;
pub mod geometry;
pub mod macros;
pub mod nest;
pub mod point;
pub mod protocol;

pub use action::{Action, ActionKind, WidgetProvider};
pub use error::ProtocolError;
pub use geometry::{Drag, Point, Resolution, RingGeometry};
pub use nest::{CircleNest, DragTarget, Navigator, NestId};
pub use point::{Circle, PointId, PointStyle, SwipePoint};
