//! Placement engine for packing rectangular boxes into an origin-centered
//! container.
//!
//! Boxes arrive one at a time. Each is placed at the first grid position that
//! keeps it inside the container, clear of every placed box and resting on the
//! floor or on another box.
//!
//! ```
//! use boxfit::engine::{PackingEngine, PlacementOutcome};
//!
//! let mut engine = PackingEngine::default();
//! engine.set_container(10.0, 10.0, 10.0).unwrap();
//!
//! let outcome = engine.try_place_box(2.0, 2.0, 2.0).unwrap();
//! let placed = outcome.placed().unwrap();
//! assert_eq!(placed.position.y, -4.0);
//!
//! let stats = engine.statistics().unwrap();
//! assert_eq!(stats.item_count, 1);
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod model;
pub mod optimizer;
pub mod state;
pub mod stats;
pub mod types;
