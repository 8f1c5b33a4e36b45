//! Background task plumbing shared by the event loop.

use crate::api::ReaderClient;
use crate::app::{AppEvent, Task};
use crate::content;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// A panicking load would otherwise vanish inside the runtime and leave the
/// UI waiting forever; this turns it into `Err(panic_message)`.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            }
        })
}

/// Run `task` off the UI loop, reporting its outcome on `tx`.
pub(super) fn spawn_task(task: Task, client: &Arc<ReaderClient>, tx: &mpsc::Sender<AppEvent>) {
    let client = Arc::clone(client);
    let tx = tx.clone();

    match task {
        Task::LoadDocuments { generation } => {
            tracing::debug!(generation, "Spawning document load");
            tokio::spawn(async move {
                let event = match catch_task_panic(client.fetch_all_documents()).await {
                    Ok(Ok(documents)) => AppEvent::DocumentsLoaded {
                        generation,
                        documents,
                    },
                    Ok(Err(e)) => AppEvent::DocumentsFailed {
                        generation,
                        error: e.to_string(),
                    },
                    Err(panic) => AppEvent::TaskPanicked {
                        task: "load_documents",
                        error: panic,
                    },
                };
                send(&tx, event).await;
            });
        }
        Task::LoadContent {
            generation,
            document,
        } => {
            tracing::debug!(generation, document_id = %document.id, "Spawning content load");
            tokio::spawn(async move {
                let composed = catch_task_panic(async { content::compose(&document) }).await;
                let event = match composed {
                    Ok(content) => AppEvent::ContentLoaded {
                        generation,
                        document_id: document.id.clone(),
                        content,
                    },
                    Err(panic) => AppEvent::TaskPanicked {
                        task: "load_content",
                        error: panic,
                    },
                };
                send(&tx, event).await;
            });
        }
    }
}

async fn send(tx: &mpsc::Sender<AppEvent>, event: AppEvent) {
    if let Err(e) = tx.send(event).await {
        tracing::warn!(error = %e, "Failed to send task result (receiver dropped)");
    }
}
