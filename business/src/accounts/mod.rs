//! The technical-accounts view's data layer.
//!
//! [`AccountsSync`] is the resource sync hook: it owns the cached list, the
//! statistics, and the request status, and publishes a fresh
//! [`AccountsState`] after every transition. [`SyncDriver`] runs it on a
//! single task behind a cloneable [`SyncHandle`].

pub mod api;
pub mod debounce;
pub mod driver;
pub mod model;
pub mod state;
mod stats;
pub mod sync;
