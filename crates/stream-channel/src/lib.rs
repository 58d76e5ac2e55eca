//! TCP stream transport for the rendezvous channel.
//!
//! Forwards raw bytes between the local rendezvous channel and a persistent
//! TCP connection as two independent pumps: no framing, no batching, bytes
//! delivered in arrival order. Either pump ending (end-of-stream or I/O
//! error) never terminates its sibling; process restart is the recovery
//! mechanism.

pub mod pumps;

pub use pumps::{inbound_pump, outbound_pump};

/// Read buffer size for both pumps (16 KiB).
pub const CHUNK_SIZE: usize = 16 * 1024;
