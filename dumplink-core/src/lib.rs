//! dump.link Core
//!
//! This crate provides the dependency-graph core of dump.link, a planning
//! board where tasks are grouped into buckets and buckets depend on each
//! other. It implements:
//!
//! - Graph primitives over a snapshot of buckets and dependencies
//! - Cycle detection for proposed dependencies
//! - Enumeration of maximal dependency chains
//! - Layer assignment honoring manual overrides
//! - Subgraph moves that shift a whole connected cluster
//! - Drop-target eligibility for drag-and-drop onto lanes
//!
//! The core is a set of pure functions. Persistence is left to a
//! [`BoardStore`](board::BoardStore) collaborator.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Bucket and dependency records plus every graph algorithm
//! - `board`: Snapshots, the store trait, policy and the command layer
//! - `error`: Error types for commands, stores and snapshot codecs
//!
//! # Example
//!
//! ```rust
//! use dumplink_core::board::{Board, BoardSnapshot, MemoryStore};
//! use dumplink_core::graph::{Bucket, Dependency};
//!
//! let snapshot = BoardSnapshot::new(
//!     vec![Bucket::dump("inbox"), Bucket::new("ui", "UI"), Bucket::new("api", "API")],
//!     Vec::new(),
//! );
//! let board = Board::new(MemoryStore::new(snapshot));
//!
//! // The UI cannot be finished before the API.
//! board.link(Dependency::new("ui", "api")).unwrap();
//!
//! let layering = board.layering();
//! assert_eq!(layering.layer_of(&"ui".into()), Some(0));
//! assert_eq!(layering.layer_of(&"api".into()), Some(1));
//!
//! // The reverse edge would close a cycle.
//! assert!(board.link(Dependency::new("api", "ui")).is_err());
//! ```

pub mod board;
pub mod error;
pub mod graph;

pub use board::{Board, BoardPolicy, BoardSnapshot, BoardStore, MemoryStore};
pub use error::{BoardError, BoardResult, LayerOutOfRange, SnapshotError, StoreError};
