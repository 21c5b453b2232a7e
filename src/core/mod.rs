//! Core contract types.
//!
//! This module contains what every participant of a machine agrees on:
//! - The [`State`] trait implemented by leaves and machines alike
//! - The [`Lifecycle`] status owned by machines and composite entries
//! - [`Guard`] predicates for gating transitions

mod guard;
mod state;

pub use guard::{Guard, Guarded, StateExt};
pub use state::{Lifecycle, State, StateKey};
