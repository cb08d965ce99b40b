//! Tokio plumbing for the hover controller.
//!
//! Single event loop, cooperative suspension only: the debounce timer and
//! the classifier's network call are the sole suspension points. Resolutions
//! run as spawned tasks against a shared engine and report back through a
//! channel tagged with their session id, so the controller can discard
//! results whose session is no longer current. In-flight work is never
//! aborted; only its result is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::engine::ResolutionEngine;
use crate::remote::Classifier;
use crate::verdict::Verdict;

use super::{AnchorId, Effect, HoverController, SessionId};

/// Pointer activity observed over hyperlink elements.
#[derive(Debug, Clone)]
pub enum PointerEvent {
    Enter { anchor: AnchorId, href: String },
    Leave,
}

/// External collaborator that renders the three tooltip surfaces. All
/// markup/styling decisions live behind this trait.
pub trait Presenter: Send {
    fn show_loading(&mut self, hostname: &str);
    fn present(&mut self, hostname: &str, verdict: &Verdict);
    fn hide(&mut self);
}

/// Runs the hover loop until the event channel closes.
pub async fn run_hover_loop<C, P>(
    mut events: mpsc::Receiver<PointerEvent>,
    engine: Arc<Mutex<ResolutionEngine<C>>>,
    mut presenter: P,
    debounce: Duration,
) where
    C: Classifier + 'static,
    P: Presenter,
{
    let mut controller = HoverController::new(debounce);
    let (verdict_tx, mut verdict_rx) = mpsc::channel::<(SessionId, Verdict)>(8);
    let mut deadline: Option<(SessionId, tokio::time::Instant)> = None;

    loop {
        let sleep_until = deadline
            .map(|(_, at)| at)
            .unwrap_or_else(tokio::time::Instant::now);

        let effects = tokio::select! {
            event = events.recv() => match event {
                Some(PointerEvent::Enter { anchor, href }) => {
                    controller.pointer_enter(anchor, &href)
                }
                Some(PointerEvent::Leave) => controller.pointer_leave(),
                None => return,
            },
            _ = tokio::time::sleep_until(sleep_until), if deadline.is_some() => {
                match deadline.take() {
                    Some((session, _)) => controller.timer_fired(session),
                    None => Vec::new(),
                }
            }
            result = verdict_rx.recv() => match result {
                Some((session, verdict)) => controller.verdict_arrived(session, verdict),
                None => Vec::new(),
            },
        };

        for effect in effects {
            match effect {
                Effect::ScheduleTimer { session, after } => {
                    deadline = Some((session, tokio::time::Instant::now() + after));
                }
                Effect::Resolve { session, href } => {
                    spawn_resolution(&engine, &verdict_tx, session, href);
                }
                Effect::ShowLoading { hostname } => presenter.show_loading(&hostname),
                Effect::Present { hostname, verdict } => presenter.present(&hostname, &verdict),
                Effect::HideTooltip => presenter.hide(),
            }
        }
    }
}

/// Issues one resolution in a spawned task. The engine lock covers only the
/// cache/whitelist phases, so concurrent resolutions run their network
/// phases in parallel and a stalled request cannot delay a fresh hover. The
/// task keeps running even if its session gets cancelled (advisory
/// cancellation).
fn spawn_resolution<C>(
    engine: &Arc<Mutex<ResolutionEngine<C>>>,
    verdict_tx: &mpsc::Sender<(SessionId, Verdict)>,
    session: SessionId,
    href: String,
) where
    C: Classifier + 'static,
{
    let engine = Arc::clone(engine);
    let tx = verdict_tx.clone();
    tokio::spawn(async move {
        let resolved = ResolutionEngine::resolve_shared(&engine, &href).await;
        match resolved {
            Ok(verdict) => {
                // Receiver gone means the loop shut down; nothing to do.
                let _ = tx.send((session, verdict)).await;
            }
            Err(err) => {
                // Hrefs are qualified before a session is created, so this
                // only fires if the link mutated under us. The hover is
                // dropped, same as an unparsable href at enter time.
                tracing::warn!(href = %href, "resolution failed: {err}");
            }
        }
    });
}
