//! Client-server session protocol.
//!
//! This module defines the wire contract between the portal client and the
//! Academia Portal server: how domain operations are rendered into request
//! lines, how response lines are interpreted, and the transport abstraction
//! used to exchange them over the network.
//!
//! # Overview
//!
//! The protocol is a line-oriented text exchange over one long-lived TCP
//! connection. The client writes a single request frame and blocks for a
//! single response frame; there is no pipelining and no multiplexing. This
//! matches a single-user interactive client and is not meant for
//! high-throughput batching.
//!
//! # Wire Format
//!
//! Requests are ASCII text, whitespace-delimited tokens in fixed positional
//! order:
//!
//! - The first token is the command class: `LOGIN`, `ADMIN`, `STUDENT`,
//!   `FACULTY` or `EXIT`.
//! - Role-scoped requests carry the authenticated user id second and the
//!   operation verb third, followed by verb-specific arguments.
//! - There is no quoting or escaping. The single multi-word argument in the
//!   grammar is `ADD_COURSE`'s trailing course name, which the server reads
//!   as rest-of-line.
//!
//! Responses are a single frame of at most [`MAX_FRAME_SIZE`] bytes: either
//! a status line opening with a known outcome keyword (`LOGIN_SUCCESS`,
//! `ERROR`), or opaque display text returned verbatim. Which shape applies
//! is determined by the request that produced it, never inferred.
//!
//! # Key Components
//!
//! - [`Request`]: typed operations and their wire encoding.
//! - [`LoginReply`] / [`Reply`]: tolerant response decoding.
//! - [`LineTransport`]: one-request-in-flight exchange over a stream.
//!
//! # See Also
//!
//! - [`session`](crate::session): state machine gating which requests may
//!   be issued.
mod request;
mod response;
mod transport;

pub use request::{AdminOp, CommandClass, FacultyOp, Request, StudentOp, UserField};
pub use response::{LoginReply, Reply};
pub use transport::{LineTransport, MAX_FRAME_SIZE, TransportError};
