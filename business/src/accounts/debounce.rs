//! Search-as-you-type debouncing.
//!
//! One `SearchDebouncer` belongs to one view. Each keystroke replaces the
//! pending timer; a term is emitted only after the input has been quiet for
//! the whole window. Dropping the debouncer cancels whatever is pending.

use std::time::Duration;

use flume::{Receiver, Sender};
use log::{debug, trace};
use staffdesk_states::{TaskHandle, TaskId, TaskIds, spawn_cancellable};

/// A term whose quiet period elapsed, tagged with the timer that emitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledSearch {
    pub id: TaskId,
    pub term: String,
}

#[derive(Debug)]
pub struct SearchDebouncer {
    window: Duration,
    ids: TaskIds,
    pending: Option<TaskHandle>,
    send: Sender<SettledSearch>,
    recv: Receiver<SettledSearch>,
}

impl SearchDebouncer {
    pub fn new(window: Duration) -> Self {
        let (send, recv) = flume::unbounded();
        Self {
            window,
            ids: TaskIds::new::<Self>(),
            pending: None,
            send,
            recv,
        }
    }

    /// Register a keystroke. Cancels the pending timer and starts a new one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn input(&mut self, term: impl Into<String>) {
        let term = term.into();
        let id = self.ids.next();
        let window = self.window;
        let send = self.send.clone();

        trace!("debouncing {term:?} as generation {}", id.generation());
        // Overwriting the handle drops, and so cancels, the previous timer.
        self.pending = Some(spawn_cancellable(id, async move {
            tokio::time::sleep(window).await;
            if send.send(SettledSearch { id, term }).is_err() {
                debug!("search debouncer dropped before term settled");
            }
        }));
    }

    /// Drop the pending term, if any.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Channel of settled terms, for callers that `select!` over it.
    /// Pass what arrives through [`accept`](Self::accept).
    pub fn settled_receiver(&self) -> Receiver<SettledSearch> {
        self.recv.clone()
    }

    /// The term to dispatch, or `None` if a newer keystroke superseded it.
    pub fn accept(&mut self, settled: SettledSearch) -> Option<String> {
        let current = self.pending.as_ref().map(TaskHandle::id);
        if current != Some(settled.id) {
            trace!("discarding superseded search {:?}", settled.term);
            return None;
        }
        self.pending = None;
        Some(settled.term)
    }

    /// Wait until a term settles.
    pub async fn settled(&mut self) -> String {
        loop {
            // `self.send` keeps the channel open, so this cannot disconnect.
            let Ok(settled) = self.recv.recv_async().await else {
                continue;
            };
            if let Some(term) = self.accept(settled) {
                return term;
            }
        }
    }
}
