//! icapture - transparent ICAP responder that records credential-bearing
//! POST bodies.
//!
//! The binary lives in `main.rs`; this crate holds the pieces it is built
//! from:
//!
//! - [`cli`]: command-line arguments and how they fold into a
//!   [`ServerConfig`](icapture_server::ServerConfig)
//! - [`interfaces`]: network interface enumeration for `--interface`

pub mod cli;
pub mod interfaces;
