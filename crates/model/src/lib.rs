//! A provider-neutral protocol for talking to generative-text services.
//!
//! The chat widget never talks to a concrete LLM API. It builds a
//! [`ModelRequest`] out of the persona framing and the visible transcript,
//! hands it to a [`ModelProvider`], and drains the streamed
//! [`ModelResponse`] until completion.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
