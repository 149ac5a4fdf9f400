use std::time::Duration;

use tracing::Instrument;
use trade_assistant_actor::{Actor, Message as ActorMessage, Query};

use super::{
    PendingTurn, SubmitOutcome, Visibility, WidgetSnapshot, WidgetState,
};
use crate::action::process_reply;
use crate::error::TurnError;
use crate::framing::build_request;
use crate::notify::{AnalyticsEvent, fire_and_forget};
use crate::page_context::normalize_snapshot;
use crate::transcript::Message;

impl WidgetState {
    fn submit(&mut self, text: String, handle: &Actor<Self>) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self.pending_turn.is_some() {
            debug!("rejecting a submit while a turn is loading");
            return SubmitOutcome::Busy;
        }

        self.append(Message::user(text));
        self.track(AnalyticsEvent::MessageSent);

        let turn = self.next_turn_id;
        self.next_turn_id += 1;

        let Some(model_client) = self.model_client.clone() else {
            // No credential, so there is nothing to wait for.
            self.resolve_turn(turn, Err(TurnError::MissingCredential));
            return SubmitOutcome::Accepted;
        };

        let page_snapshot = self
            .page_context
            .as_ref()
            .and_then(|page_context| page_context.capture())
            .and_then(|raw| normalize_snapshot(&raw, self.max_page_chars));
        let request = build_request(
            &self.persona,
            &self.transcript,
            page_snapshot.as_deref(),
            self.history_window,
        );

        // The task must not keep the widget alive once the host drops it.
        let weak_handle = handle.downgrade();
        let task = tokio::spawn(
            async move {
                let result = model_client.send_request(request).await;
                if let Some(handle) = weak_handle.upgrade() {
                    handle.send(TurnFinished { turn, result }).ok();
                }
            }
            .instrument(debug_span!("turn", id = turn)),
        );
        self.pending_turn = Some(PendingTurn { id: turn, task });
        self.notify_loading();
        SubmitOutcome::Accepted
    }

    fn finish_turn(&mut self, turn: u64, result: Result<String, TurnError>) {
        match &self.pending_turn {
            Some(pending) if pending.id == turn => {}
            _ => {
                debug!("discarding the result of abandoned turn {turn}");
                return;
            }
        }
        self.pending_turn = None;
        self.resolve_turn(turn, result);
        self.notify_loading();
    }

    fn resolve_turn(&mut self, turn: u64, result: Result<String, TurnError>) {
        let message = match result {
            Ok(raw_reply) => {
                let reply = process_reply(
                    &raw_reply,
                    self.persona.marker(),
                    &self.detector,
                );
                if reply.show_booking {
                    self.track(AnalyticsEvent::BookingOffered);
                }
                Message::assistant(reply.text, reply.show_booking)
            }
            Err(err) => {
                error!("turn {turn} failed: {err}");
                Message::assistant(self.persona.fallback(), false)
            }
        };
        self.append(message);
    }

    fn toggle_visibility(&mut self) -> Visibility {
        self.cancel_auto_open();
        let visibility = match self.visibility {
            Visibility::Closed => Visibility::Open,
            Visibility::Open => Visibility::Closed,
        };
        self.set_visibility(visibility);
        visibility
    }

    fn set_visibility(&mut self, visibility: Visibility) {
        if self.visibility == visibility {
            return;
        }
        self.visibility = visibility;
        if let Some(on_visibility) = &self.on_visibility {
            on_visibility(visibility);
        }

        match visibility {
            Visibility::Open => self.track(AnalyticsEvent::ChatOpened),
            Visibility::Closed if self.abort_on_close => {
                self.abandon_pending_turn()
            }
            Visibility::Closed => {}
        }
    }

    fn abandon_pending_turn(&mut self) {
        let Some(pending) = self.pending_turn.take() else {
            return;
        };
        debug!("abandoning turn {}", pending.id);
        pending.task.abort();
        self.notify_loading();
    }

    fn arm_auto_open(&mut self, delay: Duration, handle: &Actor<Self>) {
        self.cancel_auto_open();
        let weak_handle = handle.downgrade();
        self.auto_open_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(handle) = weak_handle.upgrade() {
                handle.send(AutoOpen).ok();
            }
        }));
    }

    fn auto_open(&mut self) {
        // A toggle clears the timer, and a late tick must not reopen.
        if self.auto_open_timer.take().is_none() {
            return;
        }
        trace!("auto-opening the widget");
        self.set_visibility(Visibility::Open);
    }

    #[inline]
    fn cancel_auto_open(&mut self) {
        if let Some(timer) = self.auto_open_timer.take() {
            timer.abort();
        }
    }

    fn append(&mut self, message: Message) {
        let message = self.transcript.push(message);
        if let Some(on_message) = &self.on_message {
            on_message(message);
        }
    }

    #[inline]
    fn notify_loading(&self) {
        if let Some(on_loading) = &self.on_loading {
            on_loading(self.pending_turn.is_some());
        }
    }

    fn track(&self, event: AnalyticsEvent) {
        let Some(analytics) = &self.analytics else {
            return;
        };
        let analytics = analytics.clone();
        fire_and_forget("analytics", async move {
            analytics.record(event).await
        });
    }

    fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot {
            transcript: self.transcript.clone(),
            loading: self.pending_turn.is_some(),
            visibility: self.visibility,
        }
    }
}

impl Drop for WidgetState {
    fn drop(&mut self) {
        if let Some(pending) = self.pending_turn.take() {
            pending.task.abort();
        }
        self.cancel_auto_open();
    }
}

#[derive(Debug)]
pub struct Submit(pub String);

impl Query<WidgetState> for Submit {
    type Output = SubmitOutcome;

    #[inline]
    fn answer(
        self,
        state: &mut WidgetState,
        handle: &Actor<WidgetState>,
    ) -> SubmitOutcome {
        state.submit(self.0, handle)
    }
}

#[derive(Debug)]
pub struct ToggleVisibility;

impl Query<WidgetState> for ToggleVisibility {
    type Output = Visibility;

    #[inline]
    fn answer(
        self,
        state: &mut WidgetState,
        _handle: &Actor<WidgetState>,
    ) -> Visibility {
        state.toggle_visibility()
    }
}

#[derive(Debug)]
pub struct Snapshot;

impl Query<WidgetState> for Snapshot {
    type Output = WidgetSnapshot;

    #[inline]
    fn answer(
        self,
        state: &mut WidgetState,
        _handle: &Actor<WidgetState>,
    ) -> WidgetSnapshot {
        state.snapshot()
    }
}

#[derive(Debug)]
pub struct ArmAutoOpen(pub Duration);

impl ActorMessage<WidgetState> for ArmAutoOpen {
    #[inline]
    fn handle(self, state: &mut WidgetState, handle: &Actor<WidgetState>) {
        state.arm_auto_open(self.0, handle);
    }
}

#[derive(Debug)]
struct AutoOpen;

impl ActorMessage<WidgetState> for AutoOpen {
    #[inline]
    fn handle(self, state: &mut WidgetState, _handle: &Actor<WidgetState>) {
        state.auto_open();
    }
}

#[derive(Debug)]
struct TurnFinished {
    turn: u64,
    result: Result<String, TurnError>,
}

impl ActorMessage<WidgetState> for TurnFinished {
    #[inline]
    fn handle(self, state: &mut WidgetState, _handle: &Actor<WidgetState>) {
        state.finish_turn(self.turn, self.result);
    }
}
