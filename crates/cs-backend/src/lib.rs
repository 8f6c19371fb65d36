//! cs-backend: Client core for streamed chat replies.
//!
//! A reply arrives as a chunked text body of `data:` frames. This crate
//! splits the bytes into lines, frames lines into events, accumulates the
//! reply text and reports progress through a [`StreamSink`].

pub mod abort;
pub mod accumulator;
pub mod auth;
pub mod client;
pub mod consume;
pub mod error;
pub mod frame;
pub mod lines;
pub mod mock;
pub mod sink;

pub use abort::AbortHandle;
pub use accumulator::{ReplyAccumulator, StreamSummary};
pub use auth::{CommandToken, EnvToken, FileToken, StaticToken, TokenChain, TokenProvider};
pub use client::{ChatClient, ClientOptions, StreamPhase, DEFAULT_BASE_URL};
pub use consume::consume_stream;
pub use error::ChatError;
pub use mock::{MockConfig, MockFrame, RecordingSink};
pub use sink::{CallbackSink, StreamSink};
