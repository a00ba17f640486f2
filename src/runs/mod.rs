//! Run tracking and live state synchronization.
//!
//! Three concerns live here:
//!
//! - [`registry`]: the per-runtime record of executions ([`Run`],
//!   [`PathState`], [`RunRegistry`]). Every distinct execution of a
//!   workflow keeps its own status and per-path state map, retained until
//!   purged.
//! - [`reconcile`]: turning an authoritative state snapshot into the
//!   [`ViewState`] a renderer consumes, skipping stale or foreign entries
//!   and labeling edges only for the exactly-displayed path.
//! - [`poller`]: the cancellable scheduling loop that periodically fetches
//!   state for the viewed path/runtime, ticking fast while a run is live,
//!   slow while idle, and not at all while the user is inactive.

pub mod poller;
pub mod reconcile;
pub mod registry;

pub use poller::{ActivityTracker, Poller, PollerConfig, PollerHandle};
pub use reconcile::{ViewState, apply_path_states, format_edge_label};
pub use registry::{PathState, Run, RunRegistry};
