#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Slot-filling dialogue over transit queries.
//!
//! A session carries at most two slots (station and field) across turns.
//! The router runs one resolution step per query: domain gate, intent
//! lookup, then whichever slots are still open. Once both are filled the
//! fact is looked up, phrased, and the session is cleared so nothing leaks
//! into the next exchange.

mod error;
pub mod router;
pub mod session;
pub mod store;

pub use error::DialogueError;
pub use router::{IntentRouter, RouterConfig};
pub use session::{SessionSlots, SlotState};
pub use store::{InMemorySessionStore, SessionStore};
