//! The rules of a Bingohall session.
//!
//! Everything in this crate is synchronous and free of I/O:
//!
//! - [`cards`]: card, pool, and draw-order generation.
//! - [`matcher`]: does a marked grid satisfy a pattern, and which cells won.
//! - [`reducer`]: one pure transition per game event.
//! - [`social`]: chat log and per-identity stats.
//!
//! Reducers take the session by value and hand back the next one. Anything
//! random takes an explicit `&mut impl Rng`, anything time-stamped takes
//! `now` in Unix milliseconds, so every transition is reproducible in tests.

pub mod cards;
mod error;
pub mod matcher;
pub mod reducer;
pub mod social;

pub use error::ClaimRejection;
