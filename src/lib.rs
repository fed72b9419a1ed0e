//! matchsync - Soccer-match rendezvous simulator
//!
//! matchsync coordinates a fixed population of players and goalies plus one
//! referee through a synchronized match: arrival, team formation, a start
//! rendezvous, play, and an end rendezvous. The interesting part is the
//! synchronization core: a single lock-guarded piece of shared state and two
//! counting-semaphore gates the referee uses to release every teamed
//! participant at once.
//!
//! # Architecture
//!
//! - **Guarded shared state**: every counter and status write happens inside
//!   one critical section, paired with a state publication
//! - **Gates**: zero-initialized counting semaphores for the start/end
//!   rendezvous, released seat by seat by the referee
//! - **Entity lifecycles**: sequential state machines for player, goalie and
//!   referee, one thread per entity
//! - **Publication sinks**: append-only text or JSON-lines snapshot logs,
//!   replayable for invariant checking

pub mod config;
pub mod entity;
pub mod output;
pub mod sim;
pub mod state;
pub mod sync;
pub mod util;

// Re-export commonly used types
pub use config::Config;
pub use state::MatchState;

/// Result type used throughout matchsync
pub type Result<T> = anyhow::Result<T>;
