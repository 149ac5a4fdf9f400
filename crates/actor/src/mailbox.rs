use std::fmt::{self, Debug};
use std::marker::PhantomData;

use tokio::sync::{mpsc, oneshot, watch};

use crate::{Actor, ActorStoppedError};

/// Helper trait for handling boxed messages.
pub trait BoxMessage<S>: Send + Debug + 'static {
    fn handle_box(self: Box<Self>, state: &mut S, handle: &Actor<S>);
}

/// A fire-and-forget message that an actor can handle.
pub trait Message<S>: BoxMessage<S> {
    /// Handles the message with mutable access to the actor's state.
    fn handle(self, state: &mut S, handle: &Actor<S>);
}

impl<S, M: Message<S>> BoxMessage<S> for M {
    #[inline]
    fn handle_box(self: Box<Self>, state: &mut S, handle: &Actor<S>) {
        (*self).handle(state, handle)
    }
}

impl<S, M: Message<S> + ?Sized> Message<S> for Box<M> {
    #[inline]
    fn handle(self, state: &mut S, handle: &Actor<S>) {
        self.handle_box(state, handle)
    }
}

/// A message that produces a reply for the sender.
///
/// Use [`Actor::ask`] to send a query and await its output.
pub trait Query<S>: Send + Debug + 'static {
    /// The reply type.
    type Output: Send + 'static;

    /// Answers the query with mutable access to the actor's state.
    fn answer(self, state: &mut S, handle: &Actor<S>) -> Self::Output;
}

/// Carries a query and the channel its answer goes back through.
pub(crate) struct QueryEnvelope<S, Q: Query<S>> {
    pub query: Q,
    pub reply_tx: oneshot::Sender<Q::Output>,
    pub _state: PhantomData<fn(&mut S)>,
}

impl<S, Q: Query<S>> Debug for QueryEnvelope<S, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QueryEnvelope").field(&self.query).finish()
    }
}

impl<S: 'static, Q: Query<S>> Message<S> for QueryEnvelope<S, Q> {
    #[inline]
    fn handle(self, state: &mut S, handle: &Actor<S>) {
        let output = self.query.answer(state, handle);
        // The asker may have given up waiting.
        self.reply_tx.send(output).ok();
    }
}

pub struct MailboxParts<S> {
    pub mailbox: Mailbox<S>,
    pub msg_rx: mpsc::UnboundedReceiver<Box<dyn Message<S>>>,
    pub stop_rx: watch::Receiver<bool>,
}

pub struct Mailbox<S> {
    msg_tx: mpsc::UnboundedSender<Box<dyn Message<S>>>,
    stop_tx: watch::Sender<bool>,
}

impl<S: Send + Sync + 'static> Mailbox<S> {
    #[inline]
    pub fn new() -> MailboxParts<S> {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        MailboxParts {
            mailbox: Mailbox { msg_tx, stop_tx },
            msg_rx,
            stop_rx,
        }
    }

    #[inline]
    pub fn send(
        &self,
        msg: Box<dyn Message<S>>,
    ) -> Result<(), ActorStoppedError> {
        self.msg_tx.send(msg).map_err(|_| ActorStoppedError)
    }

    #[inline]
    pub fn request_stop(&self) {
        self.stop_tx.send(true).ok();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.msg_tx.is_closed()
    }
}
