use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use tokio::sync::oneshot;
use tracing::Instrument;

use crate::mailbox::{Mailbox, MailboxParts, QueryEnvelope};
use crate::scheduler::run_actor;
use crate::{ActorStoppedError, Message, Query};

/// Handle to an actor.
///
/// The actor keeps running as long as at least one handle is alive. Once
/// the last handle is dropped, the actor stops after the messages already
/// in its mailbox are discarded, and its state is dropped.
pub struct Actor<S> {
    mailbox: Arc<Mailbox<S>>,
}

impl<S: Send + Sync + 'static> Actor<S> {
    /// Spawns a new actor with the specified state and an optional label.
    ///
    /// This must be called within a tokio runtime.
    pub fn spawn(state: S, label: Option<&str>) -> Self {
        let MailboxParts {
            mailbox,
            msg_rx,
            stop_rx,
        } = Mailbox::new();
        let mailbox = Arc::new(mailbox);
        tokio::spawn(
            run_actor(Arc::downgrade(&mailbox), state, msg_rx, stop_rx)
                .instrument(trace_span!("actor", label = label)),
        );
        Self { mailbox }
    }

    #[inline]
    pub(crate) fn from_mailbox(mailbox: Arc<Mailbox<S>>) -> Self {
        Self { mailbox }
    }

    /// Sends a message to the actor.
    #[inline]
    pub fn send<M: Message<S> + 'static>(
        &self,
        msg: M,
    ) -> Result<(), ActorStoppedError> {
        self.mailbox.send(Box::new(msg))
    }

    /// Sends a query to the actor and waits for its answer.
    pub async fn ask<Q: Query<S>>(
        &self,
        query: Q,
    ) -> Result<Q::Output, ActorStoppedError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(QueryEnvelope {
            query,
            reply_tx,
            _state: PhantomData,
        })?;
        reply_rx.await.map_err(|_| ActorStoppedError)
    }

    /// Asks the actor to stop.
    ///
    /// The actor is not guaranteed to be stopped immediately, but it
    /// will stop handling further messages and quit soon.
    #[inline]
    pub fn request_stop(&self) {
        self.mailbox.request_stop();
    }

    /// Returns `true` if the actor has stopped.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.mailbox.is_closed()
    }

    /// Creates a handle that doesn't keep the actor alive.
    ///
    /// Long-lived background tasks (timers, for example) should hold a
    /// weak handle, so they don't prevent the actor from stopping.
    #[inline]
    pub fn downgrade(&self) -> WeakActor<S> {
        WeakActor {
            mailbox: Arc::downgrade(&self.mailbox),
        }
    }
}

impl<S> Clone for Actor<S> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            mailbox: Arc::clone(&self.mailbox),
        }
    }
}

/// A weak handle to an actor, see [`Actor::downgrade`].
pub struct WeakActor<S> {
    mailbox: Weak<Mailbox<S>>,
}

impl<S: Send + Sync + 'static> WeakActor<S> {
    /// Upgrades to a strong handle if the actor is still reachable.
    #[inline]
    pub fn upgrade(&self) -> Option<Actor<S>> {
        self.mailbox.upgrade().map(Actor::from_mailbox)
    }
}

impl<S> Clone for WeakActor<S> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            mailbox: Weak::clone(&self.mailbox),
        }
    }
}
