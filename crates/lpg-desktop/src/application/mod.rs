//! Application layer use cases for the desktop backend.
//!
//! Code in this layer orchestrates the domain types from `lpg_core` and
//! depends only on *traits* (ports) for anything that touches the outside
//! world.  The concrete adapters live in `infrastructure` and are injected at
//! construction time, so every use case can be unit-tested against in-memory
//! doubles.
//!
//! # Sub-modules
//!
//! - **`settings_store`** – The [`SettingsStore`](settings_store::SettingsStore):
//!   canonical in-memory settings, load/save against a persistence port, and
//!   the `settings-updated` subscription lifecycle.

pub mod settings_store;
