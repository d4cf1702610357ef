//! Whole-value state publication over a `flume` channel.
//!
//! The owner of a piece of state keeps a `StateUpdater` and pushes a complete
//! copy of the value after every transition. The view side keeps the matching
//! `StateReader`, which drains whatever is queued and remembers the newest
//! value. Updates are never merged, so a reader can only ever observe values
//! the owner actually published.

use std::fmt::Debug;

use flume::{Receiver, Sender};
use log::trace;

use crate::Error;

/// A value that can be published from its owner to a view.
pub trait State: Clone + Debug + Send + 'static {
    /// Name used in logs and errors.
    const TYPE: &'static str = "state";
}

/// Create a connected updater/reader pair.
pub fn state_channel<T: State>() -> (StateUpdater<T>, StateReader<T>) {
    let (send, recv) = flume::unbounded();
    (
        StateUpdater { send },
        StateReader { recv, latest: None },
    )
}

#[derive(Debug, Clone)]
pub struct StateUpdater<T: State> {
    send: Sender<T>,
}

impl<T: State> StateUpdater<T> {
    /// Publish a full copy of the state.
    ///
    /// Fails only once the reader has been dropped.
    pub fn set(&self, state: T) -> Result<(), Error> {
        trace!("publishing {}", T::TYPE);
        self.send
            .send(state)
            .map_err(|_| Error::disconnected(T::TYPE))
    }

    /// Whether a reader is still attached.
    pub fn is_connected(&self) -> bool {
        !self.send.is_disconnected()
    }
}

#[derive(Debug)]
pub struct StateReader<T: State> {
    recv: Receiver<T>,
    latest: Option<T>,
}

impl<T: State> StateReader<T> {
    /// Newest published value, draining anything still queued.
    pub fn read(&mut self) -> Option<&T> {
        if let Some(last) = self.recv.try_iter().last() {
            self.latest = Some(last);
        }
        self.latest.as_ref()
    }

    /// Every value queued since the last call, oldest first.
    ///
    /// Useful when the intermediate transitions matter, e.g. to observe a
    /// loading flag going up and back down.
    pub fn drain(&mut self) -> Vec<T> {
        let pending: Vec<T> = self.recv.try_iter().collect();
        if let Some(last) = pending.last() {
            self.latest = Some(last.clone());
        }
        pending
    }

    /// Wait for the next publication, then skip ahead to the newest one.
    pub async fn changed(&mut self) -> Result<&T, Error> {
        let next = self
            .recv
            .recv_async()
            .await
            .map_err(|_| Error::disconnected(T::TYPE))?;
        let newest = self.recv.try_iter().last().unwrap_or(next);
        Ok(self.latest.insert(newest))
    }
}
