//! Shared state primitives for staffdesk.
//!
//! State owners publish whole values through [`StateUpdater`]; views read them
//! through [`StateReader`]. Background timers are spawned with
//! [`spawn_cancellable`] and stopped through their [`TaskHandle`].

mod error;
mod state;
mod task;

pub use error::Error;
pub use state::{State, StateReader, StateUpdater, state_channel};
pub use task::{TaskHandle, TaskId, TaskIds, spawn_cancellable};
