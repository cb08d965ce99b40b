//! Hover session protocol: when to issue a resolution and when to discard
//! its result.
//!
//! `HoverController` is the pure state machine; it performs no IO and owns
//! no timers. Inputs (pointer events, timer fire, verdict arrival) return
//! [`Effect`] directives for the caller to execute, which keeps every
//! transition rule unit-testable in isolation. The tokio plumbing lives in
//! [`driver`].
//!
//! At most one session is current at any instant, and at most one
//! resolution request is tracked in flight. Cancellation is advisory: an
//! in-flight request is not aborted when its session is cancelled, but its
//! eventual result is discarded here. That bounds wasted UI work, not
//! wasted network work; accepted inefficiency.

pub mod driver;

use std::time::{Duration, Instant};

use crate::engine::canonical_hostname;
use crate::verdict::Verdict;

/// Debounce delay before a hover is considered intentional.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Opaque reference to a hyperlink element, assigned by the embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(pub u64);

/// Identifies one hover session; fresh for every qualifying pointer-enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created; debounce timer running.
    Idle,
    /// Resolution requested, result not yet applied.
    Pending,
    /// Verdict forwarded to the presentation layer.
    Resolved,
    /// Superseded or left; any eventual verdict must be discarded.
    Cancelled,
}

/// Lifecycle of pointer interaction with a single hyperlink.
#[derive(Debug, Clone)]
pub struct HoverSession {
    pub id: SessionId,
    pub anchor: AnchorId,
    pub href: String,
    pub hostname: String,
    pub started_at: Instant,
    pub state: SessionState,
}

/// Directive for the caller. The controller decides; the caller executes.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Arm the debounce timer; call `timer_fired(session)` when it elapses.
    ScheduleTimer { session: SessionId, after: Duration },
    /// Issue `resolve(href)` and call `verdict_arrived(session, verdict)`
    /// with the result, however late it arrives.
    Resolve { session: SessionId, href: String },
    /// Render the loading affordance.
    ShowLoading { hostname: String },
    /// Forward the verdict to the presentation layer.
    Present { hostname: String, verdict: Verdict },
    /// Hide any visible affordance.
    HideTooltip,
}

/// One tracked resolution request. `request` is the id the transport will
/// echo back; `owner` is the session waiting for it (they diverge when a
/// re-hover of the same link re-attaches to an outstanding request).
#[derive(Debug, Clone)]
struct InFlight {
    request: SessionId,
    owner: SessionId,
    href: String,
}

/// Per-surface hover state machine.
#[derive(Debug)]
pub struct HoverController {
    debounce: Duration,
    next_id: u64,
    current: Option<HoverSession>,
    in_flight: Option<InFlight>,
}

impl Default for HoverController {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl HoverController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            next_id: 0,
            current: None,
            in_flight: None,
        }
    }

    pub fn current_session(&self) -> Option<&HoverSession> {
        self.current.as_ref()
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Pointer entered an anchor. A qualifying href (parses, has a host, not
    /// fragment-only or a script scheme) cancels any previous session and
    /// starts a new one in Idle with the debounce timer armed. A
    /// non-qualifying href silently ends the hover: no tooltip is shown.
    pub fn pointer_enter(&mut self, anchor: AnchorId, href: &str) -> Vec<Effect> {
        self.cancel_current();

        let hostname = match canonical_hostname(href) {
            Ok(h) => h,
            Err(err) => {
                tracing::debug!(href, "ignoring hover: {err}");
                self.current = None;
                return vec![Effect::HideTooltip];
            }
        };

        self.next_id += 1;
        let id = SessionId(self.next_id);
        self.current = Some(HoverSession {
            id,
            anchor,
            href: href.to_string(),
            hostname,
            started_at: Instant::now(),
            state: SessionState::Idle,
        });

        vec![Effect::ScheduleTimer {
            session: id,
            after: self.debounce,
        }]
    }

    /// Debounce timer elapsed. Ignored unless `session` is still current and
    /// Idle. Otherwise the session turns Pending, the loading affordance is
    /// shown, and a resolution is issued unless a request for the same href
    /// is already outstanding, in which case that request is re-attached to
    /// this session instead of duplicated.
    pub fn timer_fired(&mut self, session: SessionId) -> Vec<Effect> {
        let cur = match &mut self.current {
            Some(cur) if cur.id == session && cur.state == SessionState::Idle => cur,
            _ => {
                tracing::debug!(?session, "stale debounce timer ignored");
                return Vec::new();
            }
        };

        cur.state = SessionState::Pending;
        let mut effects = vec![Effect::ShowLoading {
            hostname: cur.hostname.clone(),
        }];

        match &mut self.in_flight {
            Some(inflight) if inflight.href == cur.href => {
                tracing::debug!(href = %cur.href, "re-attaching outstanding request");
                inflight.owner = cur.id;
            }
            _ => {
                // Any previously tracked request is abandoned; its result no
                // longer matches and will be discarded on arrival.
                self.in_flight = Some(InFlight {
                    request: cur.id,
                    owner: cur.id,
                    href: cur.href.clone(),
                });
                effects.push(Effect::Resolve {
                    session: cur.id,
                    href: cur.href.clone(),
                });
            }
        }

        effects
    }

    /// A resolution result arrived, tagged with the session that issued it.
    /// Forwarded only if the owning session is still current and Pending;
    /// otherwise dropped silently.
    pub fn verdict_arrived(&mut self, session: SessionId, verdict: Verdict) -> Vec<Effect> {
        let owner = match self.in_flight.take() {
            Some(inflight) if inflight.request == session => inflight.owner,
            other => {
                // Result of an abandoned request; keep whatever is tracked.
                self.in_flight = other;
                tracing::debug!(?session, "discarding verdict for unknown request");
                return Vec::new();
            }
        };

        match &mut self.current {
            Some(cur) if cur.id == owner && cur.state == SessionState::Pending => {
                cur.state = SessionState::Resolved;
                vec![Effect::Present {
                    hostname: cur.hostname.clone(),
                    verdict,
                }]
            }
            _ => {
                tracing::debug!(?owner, "discarding verdict for superseded session");
                Vec::new()
            }
        }
    }

    /// Pointer left the anchor (to a target outside the presentation
    /// surface). Cancels the session at any point before Resolved and hides
    /// any shown affordance. The armed timer needs no explicit cancellation:
    /// a later `timer_fired` for the cancelled session is ignored.
    pub fn pointer_leave(&mut self) -> Vec<Effect> {
        self.cancel_current();
        vec![Effect::HideTooltip]
    }

    fn cancel_current(&mut self) {
        if let Some(cur) = &mut self.current {
            if matches!(cur.state, SessionState::Idle | SessionState::Pending) {
                cur.state = SessionState::Cancelled;
            }
        }
    }
}
