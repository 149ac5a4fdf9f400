//! A lightweight actor runtime.
//!
//! An actor owns a piece of state and is the only writer of it. Other
//! tasks talk to the actor through cheap [`Actor`] handles, either with
//! fire-and-forget [`Message`]s or with [`Query`]s that produce a reply.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod error;
mod handle;
mod mailbox;
mod scheduler;

pub use error::ActorStoppedError;
pub use handle::{Actor, WeakActor};
pub use mailbox::{Message, Query};

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    #[derive(Debug)]
    struct Add(u32);

    impl Message<Counter> for Add {
        fn handle(self, state: &mut Counter, _handle: &Actor<Counter>) {
            state.value += self.0;
        }
    }

    #[derive(Debug)]
    struct Get;

    impl Query<Counter> for Get {
        type Output = u32;

        fn answer(self, state: &mut Counter, _handle: &Actor<Counter>) -> u32 {
            state.value
        }
    }

    #[derive(Debug)]
    struct AddLater(u32);

    impl Message<Counter> for AddLater {
        fn handle(self, _state: &mut Counter, handle: &Actor<Counter>) {
            // Messages sent from a handler are queued behind the current one.
            handle.send(Add(self.0)).unwrap();
        }
    }

    #[tokio::test]
    async fn test_send_and_ask() {
        let actor = Actor::spawn(Counter::default(), None);
        actor.send(Add(40)).unwrap();
        actor.send(AddLater(2)).unwrap();
        actor.send(Add(0)).unwrap();
        assert_eq!(actor.ask(Get).await.unwrap(), 42);
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Debug)]
    struct Ping;

    impl Query<DropFlag> for Ping {
        type Output = ();

        fn answer(self, _state: &mut DropFlag, _handle: &Actor<DropFlag>) {}
    }

    #[tokio::test]
    async fn test_request_stop() {
        let dropped = Arc::new(AtomicBool::new(false));
        let actor = Actor::spawn(DropFlag(Arc::clone(&dropped)), Some("test"));
        actor.ask(Ping).await.unwrap();

        let weak = actor.downgrade();
        actor.request_stop();
        while !actor.is_stopped() {
            tokio::task::yield_now().await;
        }
        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(actor.ask(Ping).await, Err(ActorStoppedError));
        assert!(weak.upgrade().is_some());

        drop(actor);
        assert!(weak.upgrade().is_none());
    }
}
