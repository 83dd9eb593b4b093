//! icapture Server - transparent ICAP REQMOD responder.
//!
//! A forward proxy hands every intercepted HTTP request to this server as an
//! ICAP `REQMOD` message. The server never modifies anything: it answers
//! `OPTIONS` requests with `200 OK`, every other message with `204 No Content`,
//! and on the side writes sensitive-looking POST bodies to a payload sink.
//!
//! ## Architecture
//!
//! ```text
//! TCP accept ──► one task per connection
//!                      │
//!                      ▼
//!            ConnectionBuffer (append-only)
//!                      │
//!                      ▼
//!            Framer::advance ── NeedMore ──► read again
//!                      │   └─ AwaitLastChunk ──► read again within the grace
//!                      │      period, then extract what arrived
//!                      │
//!          ┌───────────┼─────────────────────┐
//!          │ OPTIONS   │ null-body / not POST │ POST with req-body
//!          ▼           ▼                      ▼
//!       200 OK    204 No Content     PayloadExtractor ──► PayloadSink
//!                                    (blocking pool)
//!                                             │
//!                                             ▼
//!                                      204 No Content
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use icapture_server::{IcapServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = IcapServer::new(ServerConfig::default()).unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

mod buffer;
pub mod config;
mod connection;
pub mod error;
mod extraction;
#[cfg(test)]
mod fixtures;
pub mod framer;
pub mod response;
mod server;

pub use buffer::ConnectionBuffer;
pub use config::ServerConfig;
pub use connection::{handle_connection, ConnectionContext};
pub use error::{Result, ServerError};
pub use extraction::{ExtractOutcome, PayloadExtractor};
pub use framer::{BodyLocation, Framer, Step};
pub use response::{write_response, IcapResponse};
pub use server::{IcapServer, ServerHandle};

/// Default ICAP port.
pub const DEFAULT_PORT: u16 = 1344;

/// Default bind host (all IPv4 interfaces).
pub const DEFAULT_HOST: &str = "0.0.0.0";
