use std::sync::Weak;

use tokio::select;
use tokio::sync::{mpsc, watch};

use crate::mailbox::Mailbox;
use crate::{Actor, Message};

#[inline]
pub async fn run_actor<S: Send + Sync + 'static>(
    mailbox: Weak<Mailbox<S>>,
    mut state: S,
    mut msg_rx: mpsc::UnboundedReceiver<Box<dyn Message<S>>>,
    mut stop_rx: watch::Receiver<bool>,
) {
    debug!("started");
    loop {
        let msg = select! {
            biased;

            _ = stop_rx.changed() => {
                break;
            }
            msg = msg_rx.recv() => {
                let Some(msg) = msg else {
                    break;
                };
                msg
            }
        };
        trace!("received message: {msg:?}");

        // Every strong handle may be gone while messages are still queued
        // (sent by a task right before it finished).
        let Some(mailbox) = mailbox.upgrade() else {
            debug!("no handles left, discarding queued messages");
            break;
        };

        let proc_span = trace_span!("proc msg");
        proc_span.in_scope(|| {
            msg.handle(&mut state, &Actor::from_mailbox(mailbox));
            trace!("finished");
        });
    }
    drop(state);
    // Closing the receiver lets senders observe the stop.
    msg_rx.close();
    debug!("stopped");
}
