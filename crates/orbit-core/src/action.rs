use crate::nest::NestId;
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use strum::{Display as StrumDisplay, EnumDiscriminants, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    Deref,
    From,
    Into,
    AsRef,
)]
#[serde(transparent)]
pub struct PackageName(String);

crate::impl_string_newtype!(PackageName);

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct ShortcutId(String);

crate::impl_string_newtype!(ShortcutId);

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct Link(String);

crate::impl_string_newtype!(Link);

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct FileUri(String);

crate::impl_string_newtype!(FileUri);

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct MimeType(String);

crate::impl_string_newtype!(MimeType);

pub const PROVIDER_SEPARATOR: char = '/';

/// Widget provider reference, stored on the wire as `"<package>/<class>"`.
///
/// Parsing never fails: anything that is not two non-empty halves around the
/// separator becomes the placeholder provider (both halves empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, SerializeDisplay, DeserializeFromStr)]
pub struct WidgetProvider {
    pub package: PackageName,
    pub class: String,
}

impl WidgetProvider {
    pub fn new(package: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            package: PackageName::new(package),
            class: class.into(),
        }
    }

    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.package.is_empty() && self.class.is_empty()
    }
}

impl fmt::Display for WidgetProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.package, PROVIDER_SEPARATOR, self.class)
    }
}

impl FromStr for WidgetProvider {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split_once(PROVIDER_SEPARATOR)
            .filter(|(package, class)| !package.is_empty() && !class.is_empty())
            .map(|(package, class)| Self::new(package, class))
            .unwrap_or_else(|| {
                log::warn!("Malformed widget provider '{}', using placeholder", s);
                Self::placeholder()
            }))
    }
}

/// Everything a swipe point can do when released.
///
/// The serialized form is an object whose `type` field carries the variant
/// name, followed by the variant's own fields in camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
#[strum_discriminants(name(ActionKind), derive(Hash, EnumString, EnumIter, StrumDisplay))]
pub enum Action {
    LaunchApp {
        package: PackageName,
    },
    LaunchShortcut {
        package: PackageName,
        shortcut_id: ShortcutId,
    },
    OpenUrl {
        url: Link,
    },
    OpenFile {
        uri: FileUri,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<MimeType>,
    },
    NotificationShade,
    ControlPanel,
    OpenAppDrawer,
    OpenSettings,
    Lock,
    ReloadApps,
    OpenRecentApps,
    OpenCircleNest {
        nest_id: NestId,
    },
    GoParentNest,
    OpenWidget {
        widget_id: i32,
        provider_ref: WidgetProvider,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        ActionKind::from(self)
    }

    pub fn target_nest(&self) -> Option<NestId> {
        match self {
            Self::OpenCircleNest { nest_id } => Some(*nest_id),
            _ => None,
        }
    }
}

/// One instance of every variant, used by tests across the crate.
#[cfg(test)]
pub(crate) fn every_variant() -> Vec<Action> {
    vec![
        Action::LaunchApp {
            package: PackageName::new("org.mozilla.firefox"),
        },
        Action::LaunchShortcut {
            package: PackageName::new("com.whatsapp"),
            shortcut_id: ShortcutId::new("chat-42"),
        },
        Action::OpenUrl {
            url: Link::new("https://example.org/?q=orbit&x=1"),
        },
        Action::OpenFile {
            uri: FileUri::new("content://docs/notes.md"),
            mime_type: Some(MimeType::new("text/markdown")),
        },
        Action::OpenFile {
            uri: FileUri::new("file:///tmp/blob"),
            mime_type: None,
        },
        Action::NotificationShade,
        Action::ControlPanel,
        Action::OpenAppDrawer,
        Action::OpenSettings,
        Action::Lock,
        Action::ReloadApps,
        Action::OpenRecentApps,
        Action::OpenCircleNest { nest_id: 3 },
        Action::GoParentNest,
        Action::OpenWidget {
            widget_id: 17,
            provider_ref: WidgetProvider::new("com.clock", "com.clock.ClockWidget"),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_kind_has_a_fixture() {
        let covered: HashSet<ActionKind> = every_variant().iter().map(Action::kind).collect();
        for kind in ActionKind::iter() {
            assert!(covered.contains(&kind), "no fixture for {kind}");
        }
    }

    #[test]
    fn test_discriminator_is_variant_name() {
        for action in every_variant() {
            let value = serde_json::to_value(&action).unwrap();
            assert_eq!(value["type"], action.kind().to_string());
            assert_eq!(
                ActionKind::from_str(value["type"].as_str().unwrap()).unwrap(),
                action.kind()
            );
        }
    }

    #[test]
    fn test_variant_fields_are_camel_case() {
        let action = Action::LaunchShortcut {
            package: PackageName::new("a.b"),
            shortcut_id: ShortcutId::new("s1"),
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "LaunchShortcut", "package": "a.b", "shortcutId": "s1"})
        );

        let bare = serde_json::to_value(Action::OpenFile {
            uri: FileUri::new("file:///x"),
            mime_type: None,
        })
        .unwrap();
        assert!(bare.get("mimeType").is_none());
    }

    #[test]
    fn test_widget_provider_parsing() {
        let provider: WidgetProvider = "com.clock/com.clock.Widget".parse().unwrap();
        assert_eq!(provider, WidgetProvider::new("com.clock", "com.clock.Widget"));
        assert_eq!(provider.to_string(), "com.clock/com.clock.Widget");
        assert_eq!(WidgetProvider::placeholder().to_string(), PROVIDER_SEPARATOR.to_string());

        for malformed in ["", "/", "no-separator", "/only.class", "only.package/"] {
            let provider: WidgetProvider = malformed.parse().unwrap();
            assert!(provider.is_placeholder(), "{malformed:?}");
        }
    }

    #[test]
    fn test_malformed_provider_in_payload_is_placeholder() {
        let action: Action = serde_json::from_str(
            r#"{"type": "OpenWidget", "widgetId": 5, "providerRef": "garbage"}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            Action::OpenWidget {
                widget_id: 5,
                provider_ref: WidgetProvider::placeholder(),
            }
        );
    }

    #[test]
    fn test_target_nest() {
        assert_eq!(Action::OpenCircleNest { nest_id: 9 }.target_nest(), Some(9));
        assert_eq!(Action::GoParentNest.target_nest(), None);
    }
}
