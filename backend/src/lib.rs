//! Parcel delivery tracking backend.
//!
//! The crate exposes the parcel lifecycle core as a library: inbound
//! transport adapters (HTTP, CLI, ...) call the driving ports in
//! [`domain::ports`] with already-authenticated actors, and outbound
//! adapters in [`outbound`] implement the driven persistence ports.

pub mod domain;
pub mod outbound;
