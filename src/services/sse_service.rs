use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::sse::{SaveStateEvent, ServerEvent, UndoEvent},
    error::ServiceError,
    state::{SharedState, persister::SaveState},
};

/// Receivers feeding the operator stream of one match.
pub struct SessionFeed {
    match_id: Uuid,
    save: watch::Receiver<SaveState>,
    undo: watch::Receiver<usize>,
}

/// Subscribe to the persistence and undo state of `match_id`.
pub async fn subscribe_session(state: &SharedState, match_id: Uuid) -> Result<SessionFeed, ServiceError> {
    let session = state.session(match_id).await?;
    Ok(SessionFeed {
        match_id,
        save: state.persister().subscribe(match_id),
        undo: session.subscribe_undo(),
    })
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

fn save_event(state: SaveState) -> Option<Event> {
    ServerEvent::json(Some("save_state".to_string()), &SaveStateEvent::from(state))
        .inspect_err(|err| warn!(error = %err, "failed to encode save_state event"))
        .ok()
        .map(to_event)
}

fn undo_event(undo_count: usize) -> Option<Event> {
    ServerEvent::json(Some("undo".to_string()), &UndoEvent { undo_count })
        .inspect_err(|err| warn!(error = %err, "failed to encode undo event"))
        .ok()
        .map(to_event)
}

/// Convert the session watchers into an SSE response. The current values are
/// sent first, then every change until the client disconnects or the session
/// is unloaded.
pub fn to_sse_stream(feed: SessionFeed) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let SessionFeed {
        match_id,
        mut save,
        mut undo,
    } = feed;
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        let initial = [
            save_event(save.borrow_and_update().clone()),
            undo_event(*undo.borrow_and_update()),
        ];
        for event in initial.into_iter().flatten() {
            if tx.send(Ok(event)).await.is_err() {
                return;
            }
        }

        loop {
            let next = tokio::select! {
                _ = tx.closed() => break,
                changed = save.changed() => match changed {
                    Ok(()) => save_event(save.borrow_and_update().clone()),
                    Err(_) => break,
                },
                changed = undo.changed() => match changed {
                    Ok(()) => undo_event(*undo.borrow_and_update()),
                    Err(_) => break,
                },
            };

            if let Some(event) = next {
                if tx.send(Ok(event)).await.is_err() {
                    break;
                }
            }
        }

        info!(match_id = %match_id, "session SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
