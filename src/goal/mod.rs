//! # Goal processing
//!
//! End-to-end computation of a goal: parse the goal file, vet its parameters, aggregate the
//! data, build the road and derive every output field.
//!
//! ## Overview
//!
//! * [`params`]: goal file input, legacy aliases, defaults and the typed [`GoalParams`]
//! * [`validation`]: parameter checks with user-facing messages
//! * [`processor`]: the [`GoalProcessor`] pipeline and the resulting [`GoalState`]
//! * [`summary`]: human readable summary strings
//! * [`snapshot`]: the serialized [`GoalSnapshot`]
//! * [`config`]: tunables of a processor, see [`ProcessingConfig`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use beebrain::goal::{BrainInput, GoalProcessor};
//!
//! let input = BrainInput::from_path("mygoal.bb").unwrap();
//! let snapshot = GoalProcessor::default().process(&input, 1_706_659_200.0);
//! println!("{}", snapshot.statsum);
//! ```
pub mod config;
pub mod params;
pub mod processor;
pub mod snapshot;
pub mod summary;
pub mod validation;

pub use config::ProcessingConfig;
pub use params::{BrainInput, GoalParams};
pub use processor::{GoalProcessor, GoalState, ProcessingOutcome};
pub use snapshot::GoalSnapshot;
