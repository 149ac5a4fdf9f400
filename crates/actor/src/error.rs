use std::error::Error;
use std::fmt;

/// A type of error which can be returned whenever messages are sent to
/// an actor that has stopped.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ActorStoppedError;

impl fmt::Debug for ActorStoppedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActorStoppedError")
    }
}

impl fmt::Display for ActorStoppedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the actor has stopped")
    }
}

impl Error for ActorStoppedError {}
