use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown action type '{0}'")]
    UnknownAction(String),
    #[error("Action has no type field")]
    MissingActionType,
    #[error("Invalid {kind} payload: {source}")]
    ActionPayload {
        kind: crate::action::ActionKind,
        source: serde_json::Error,
    },
}
