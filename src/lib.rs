//! Super Bowl squares: the pool rules and the shared document they are stored in.
//!
//! The terminal front-end (`src/main.rs`) and the `store-relay` binary are thin
//! shells around these two modules.

pub mod squares;
pub mod store;
