use serde::Serialize;
use utoipa::ToSchema;

use crate::state::persister::SaveState;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name, if any.
    pub event: Option<String>,
    /// Serialized payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// `save_state` event: debounced persistence progress.
#[derive(Debug, Serialize, ToSchema)]
pub struct SaveStateEvent {
    /// A score write is scheduled or in flight.
    pub pending_save: bool,
    /// Last write failure, cleared by the next success.
    pub last_save_error: Option<String>,
}

impl From<SaveState> for SaveStateEvent {
    fn from(value: SaveState) -> Self {
        Self {
            pending_save: value.pending,
            last_save_error: value.last_error,
        }
    }
}

/// `undo` event: number of undo entries available.
#[derive(Debug, Serialize, ToSchema)]
pub struct UndoEvent {
    /// Entries on the undo stack.
    pub undo_count: usize,
}
