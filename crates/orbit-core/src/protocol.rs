//! JSON interchange for points, nests and single actions.
//!
//! The `decode_*` functions are total: a blank, corrupt or foreign document
//! gives an empty result and a warning in the log, so a broken save never
//! locks the user out of a freshly reset menu. Use the `try_decode_*`
//! variants to find out why a document was rejected.

use crate::action::{Action, ActionKind};
use crate::error::ProtocolError;
use crate::nest::CircleNest;
use crate::point::{PointId, SwipePoint};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;

pub const NO_ACTION: &str = "{}";
const EMPTY_LIST: &str = "[]";

fn encode<T: Serialize + ?Sized>(value: &T, pretty: bool, fallback: &str) -> String {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    encoded.unwrap_or_else(|e| {
        log::error!("Failed to encode document: {}", e);
        fallback.to_string()
    })
}

pub fn encode_points(points: &[SwipePoint]) -> String {
    encode(points, false, EMPTY_LIST)
}

pub fn encode_points_pretty(points: &[SwipePoint]) -> String {
    encode(points, true, EMPTY_LIST)
}

pub fn try_decode_points(text: &str) -> Result<Vec<SwipePoint>, ProtocolError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut points: Vec<SwipePoint> = serde_json::from_str(text)?;
    reissue_duplicate_ids(&mut points);
    Ok(points)
}

pub fn decode_points(text: &str) -> Vec<SwipePoint> {
    try_decode_points(text).unwrap_or_else(|e| {
        log::warn!("Discarding point list: {}", e);
        Vec::new()
    })
}

pub fn encode_nests(nests: &[CircleNest]) -> String {
    encode(nests, false, EMPTY_LIST)
}

pub fn encode_nests_pretty(nests: &[CircleNest]) -> String {
    encode(nests, true, EMPTY_LIST)
}

pub fn try_decode_nests(text: &str) -> Result<Vec<CircleNest>, ProtocolError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(text)?)
}

pub fn decode_nests(text: &str) -> Vec<CircleNest> {
    try_decode_nests(text).unwrap_or_else(|e| {
        log::warn!("Discarding nest list: {}", e);
        Vec::new()
    })
}

pub fn encode_action(action: Option<&Action>) -> String {
    match action {
        Some(action) => encode(action, false, NO_ACTION),
        None => NO_ACTION.to_string(),
    }
}

pub fn encode_action_pretty(action: Option<&Action>) -> String {
    match action {
        Some(action) => encode(action, true, NO_ACTION),
        None => NO_ACTION.to_string(),
    }
}

pub fn try_decode_action(text: &str) -> Result<Option<Action>, ProtocolError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    parse_action(serde_json::from_str(text)?)
}

pub fn decode_action(text: &str) -> Option<Action> {
    try_decode_action(text).unwrap_or_else(|e| {
        log::warn!("Discarding action: {}", e);
        None
    })
}

/// Resolves one action object. `null` and `{}` mean "no action"; the `type`
/// tag is checked against the known kinds before the payload is read, so an
/// unknown kind and a damaged payload are reported differently.
pub fn parse_action(value: Value) -> Result<Option<Action>, ProtocolError> {
    if value.is_null() || value.as_object().is_some_and(|o| o.is_empty()) {
        return Ok(None);
    }
    let tag = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingActionType)?;
    let kind =
        ActionKind::from_str(tag).map_err(|_| ProtocolError::UnknownAction(tag.to_string()))?;

    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| ProtocolError::ActionPayload { kind, source })
}

pub(crate) fn lenient_action<'de, D>(deserializer: D) -> Result<Option<Action>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_action(value).unwrap_or_else(|e| {
        log::warn!("Point action dropped: {}", e);
        None
    }))
}

fn reissue_duplicate_ids(points: &mut [SwipePoint]) {
    let mut seen = HashSet::with_capacity(points.len());
    for point in points.iter_mut() {
        if !seen.insert(point.id.clone()) {
            let fresh = PointId::generate();
            log::warn!("Duplicate point id '{}' reissued as '{}'", point.id, fresh);
            point.id = fresh;
            seen.insert(point.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{PackageName, every_variant};
    use std::collections::BTreeMap;

    fn sample_points() -> Vec<SwipePoint> {
        every_variant()
            .into_iter()
            .enumerate()
            .map(|(i, action)| {
                let mut point = SwipePoint::new(i as i32 % 3, i as f64 * 23.7, Some(action), 0);
                if i % 2 == 1 {
                    point.nest_id = 4;
                    point.style.icon = Some("mdi:mail".into());
                    point.style.color = Some(0xFF33AAEE);
                    point.style.corner_radius = Some(12.5);
                }
                point
            })
            .chain(std::iter::once(SwipePoint::new(2, 359.9, None, 1)))
            .collect()
    }

    #[test]
    fn test_points_round_trip() {
        let points = sample_points();
        assert_eq!(decode_points(&encode_points(&points)), points);
        assert_eq!(decode_points(&encode_points_pretty(&points)), points);
    }

    #[test]
    fn test_point_wire_format() {
        let point = SwipePoint {
            id: PointId::new("p1"),
            circle_number: 0,
            angle: 45.0,
            action: Some(Action::Lock),
            nest_id: 2,
            style: Default::default(),
        };
        assert_eq!(
            encode_points(&[point]),
            r#"[{"i":"p1","c":0,"a":45.0,"p":{"type":"Lock"},"n":2}]"#
        );
    }

    #[test]
    fn test_unknown_action_type_keeps_point() {
        let text = r#"[
            {"i": "a", "c": 0, "a": 10.0, "p": {"type": "Teleport", "where": "mars"}, "n": 0},
            {"i": "b", "c": 1, "a": 20.0, "p": {"type": "Lock"}, "n": 0}
        ]"#;
        let points = decode_points(text);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].action, None);
        assert_eq!(points[0].id, PointId::new("a"));
        assert_eq!(points[1].action, Some(Action::Lock));
    }

    #[test]
    fn test_broken_payload_keeps_point() {
        let text = r#"[{"i": "a", "c": 0, "a": 10.0, "p": {"type": "LaunchApp"}}]"#;
        let points = decode_points(text);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].action, None);
        assert!(matches!(
            try_decode_action(r#"{"type": "LaunchApp"}"#),
            Err(ProtocolError::ActionPayload {
                kind: ActionKind::LaunchApp,
                ..
            })
        ));
    }

    #[test]
    fn test_legacy_shape() {
        let text = r#"[
            {"c": 0, "a": 0.0, "p": {"type": "LaunchApp", "package": "org.example"}},
            {"c": 1, "a": 180.0},
            {"c": 1, "a": 270.0, "p": null}
        ]"#;
        let points = decode_points(text);
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.nest_id == 0));
        let ids: HashSet<_> = points.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        assert!(points.iter().all(|p| !p.id.is_empty()));
        assert_eq!(
            points[0].action,
            Some(Action::LaunchApp {
                package: PackageName::new("org.example")
            })
        );
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let text = r#"[{"i": "x", "c": 0, "a": 1.5, "zz": [1, 2], "s": {"op": 0.3, "new": 1}}]"#;
        let points = decode_points(text);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].style.opacity, Some(0.3));
    }

    #[test]
    fn test_duplicate_ids_reissued() {
        let text = r#"[{"i": "dup", "c": 0, "a": 1.0}, {"i": "dup", "c": 0, "a": 90.0}]"#;
        let points = decode_points(text);
        assert_eq!(points[0].id, PointId::new("dup"));
        assert_ne!(points[1].id, PointId::new("dup"));
    }

    #[test]
    fn test_malformed_documents_decode_empty() {
        for text in [
            "",
            "   ",
            "not json",
            "{\"i\": 1}",
            "[{\"c\": \"zero\", \"a\": 1.0}]",
            "[1, 2, 3]",
            "[{\"i\": \"only-id\"}]",
        ] {
            assert!(decode_points(text).is_empty(), "{text:?}");
            assert!(decode_nests(text).is_empty(), "{text:?}");
        }
        assert!(try_decode_points("{}").is_err());
        assert!(try_decode_points("").unwrap().is_empty());
    }

    #[test]
    fn test_nests_round_trip() {
        let nests = vec![
            CircleNest::root(),
            CircleNest {
                id: 1,
                drag_distances: BTreeMap::from([(-1, 40.0), (0, 150.0), (1, 320.5)]),
                parent_id: 0,
            },
        ];
        let text = encode_nests(&nests);
        assert!(text.contains(r#""dragDistances":{"-1":40.0,"0":150.0,"1":320.5}"#));
        assert!(text.contains(r#""parentId":0"#));
        assert_eq!(decode_nests(&text), nests);
        assert_eq!(decode_nests(&encode_nests_pretty(&nests)), nests);
    }

    #[test]
    fn test_single_action() {
        assert_eq!(decode_action(""), None);
        assert_eq!(decode_action("{}"), None);
        assert_eq!(decode_action(r#"{"type": "Unheard"}"#), None);
        assert_eq!(encode_action(None), NO_ACTION);

        for action in every_variant() {
            assert_eq!(decode_action(&encode_action(Some(&action))), Some(action.clone()));
            assert_eq!(decode_action(&encode_action_pretty(Some(&action))), Some(action));
        }
    }

    #[test]
    fn test_action_errors() {
        assert!(matches!(
            try_decode_action(r#"{"type": "Unheard"}"#),
            Err(ProtocolError::UnknownAction(tag)) if tag == "Unheard"
        ));
        assert!(matches!(
            try_decode_action(r#"{"package": "a"}"#),
            Err(ProtocolError::MissingActionType)
        ));
        assert!(matches!(
            try_decode_action("[1"),
            Err(ProtocolError::Json(_))
        ));
    }
}
