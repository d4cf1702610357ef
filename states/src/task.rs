//! Cancellable background tasks.
//!
//! - `TaskId`: identifies one spawned task by owner type and generation
//! - `TaskIds`: hands out increasing generations for one owner
//! - `TaskHandle`: owns the `CancellationToken` of a spawned task and cancels
//!   it when dropped, so replacing a handle replaces the task
//!
//! ```ignore
//! let mut ids = TaskIds::new::<MyOwner>();
//! let handle = spawn_cancellable(ids.next(), async { /* ... */ });
//! // Dropping (or overwriting) `handle` cancels the task.
//! ```

use std::any::TypeId;
use std::future::Future;

use log::trace;
use tokio_util::sync::CancellationToken;

/// Unique identifier for a spawned task.
///
/// Two ids from the same owner compare by generation: a higher generation was
/// spawned later and supersedes the lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    type_id: TypeId,
    generation: u64,
}

impl TaskId {
    pub fn new(type_id: TypeId, generation: u64) -> Self {
        Self {
            type_id,
            generation,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Generation counter scoped to one owner instance.
#[derive(Debug)]
pub struct TaskIds {
    type_id: TypeId,
    next: u64,
}

impl TaskIds {
    pub fn new<Owner: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<Owner>(),
            next: 1,
        }
    }

    pub fn next(&mut self) -> TaskId {
        let id = TaskId::new(self.type_id, self.next);
        self.next += 1;
        id
    }
}

/// Handle to a task spawned with [`spawn_cancellable`].
///
/// Cancellation is cooperative: the spawned future is raced against the token
/// and dropped at its next await point once the token fires.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if !self.cancel_token.is_cancelled() {
            trace!("cancelling task generation {}", self.id.generation);
            self.cancel_token.cancel();
        }
    }
}

/// Spawn `future` on the current tokio runtime, stopping it when the returned
/// handle is cancelled or dropped.
///
/// Must be called from within a tokio runtime.
pub fn spawn_cancellable<F>(id: TaskId, future: F) -> TaskHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {
                trace!("task generation {} cancelled before completion", id.generation);
            }
            () = future => {}
        }
    });
    TaskHandle::new(id, cancel_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct Owner;

    #[test]
    fn task_ids_increase_per_owner() {
        let mut ids = TaskIds::new::<Owner>();
        let first = ids.next();
        let second = ids.next();

        assert_eq!(first.type_id(), TypeId::of::<Owner>());
        assert_eq!(first.type_id(), second.type_id());
        assert!(second.generation() > first.generation());
        assert_ne!(first, second);
    }

    #[test]
    fn task_ids_differ_across_owners() {
        let a = TaskIds::new::<Owner>().next();
        let b = TaskIds::new::<String>().next();

        assert_eq!(a.generation(), b.generation());
        assert_ne!(a, b);
    }

    #[test]
    fn dropping_handle_cancels_token() {
        let id = TaskIds::new::<Owner>().next();
        let token = CancellationToken::new();
        let handle = TaskHandle::new(id, token.clone());

        assert!(!handle.is_cancelled());
        drop(handle);
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_task_runs_to_completion() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let handle = spawn_cancellable(TaskIds::new::<Owner>().next(), async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(ran.load(Ordering::SeqCst));
        assert!(!handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_finishes() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let handle = spawn_cancellable(TaskIds::new::<Owner>().next(), async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            flag.store(true, Ordering::SeqCst);
        });

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!ran.load(Ordering::SeqCst));
    }
}
