//! Shared-file transport for the rendezvous channel.
//!
//! Substitutes a shared append-only file for a network link when only a
//! common filesystem is available (e.g. NFS-mounted hosts). The hub appends
//! each received chunk as a newline-terminated record; every instance polls
//! the file on a fixed interval and delivers newly appended bytes through a
//! fresh local connection. Polling trades latency (at least one interval)
//! for simplicity, since change notification is unreliable over network
//! filesystems.

pub mod append;
pub mod cursor;
pub mod poll;

pub use append::append_pump;
pub use cursor::FileCursor;
pub use poll::poll_pump;

/// Read buffer size for the append pump (16 KiB).
pub const CHUNK_SIZE: usize = 16 * 1024;
