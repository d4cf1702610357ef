//! Single-owner event loop around [`AccountsSync`].
//!
//! The driver owns the hook and the view's search debouncer and runs every
//! operation on one task, in the order commands arrive. Views talk to it
//! through a cloneable [`SyncHandle`] and read results from the hook's
//! published state. When configured, the driver also polls the collection on
//! a fixed interval.

use std::time::Duration;

use flume::{Receiver, Sender};
use log::{debug, info};
use staffdesk_states::StateReader;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::BusinessConfig;
use crate::accounts::api::AccountFilter;
use crate::accounts::debounce::SearchDebouncer;
use crate::accounts::model::{AccountDraft, AccountId};
use crate::accounts::state::AccountsState;
use crate::accounts::sync::{AccountsSync, SyncError};

type Reply = Sender<Result<(), SyncError>>;

#[derive(Debug)]
enum SyncCommand {
    Fetch { filter: AccountFilter, reply: Reply },
    Search { term: String, reply: Reply },
    /// A keystroke in the search box; goes through the debouncer.
    SearchInput(String),
    Refresh { reply: Reply },
    Create { draft: AccountDraft, reply: Reply },
    Update { id: AccountId, draft: AccountDraft, reply: Reply },
    Delete { id: AccountId, reply: Reply },
    Suspend { id: AccountId, reply: Reply },
    Activate { id: AccountId, reply: Reply },
}

/// Cloneable front end of a running [`SyncDriver`].
#[derive(Debug, Clone)]
pub struct SyncHandle {
    send: Sender<SyncCommand>,
    shutdown: CancellationToken,
}

impl SyncHandle {
    pub async fn fetch(&self, filter: AccountFilter) -> Result<(), SyncError> {
        self.request(|reply| SyncCommand::Fetch { filter, reply })
            .await
    }

    /// Immediate search, bypassing the debouncer.
    pub async fn search(&self, term: impl Into<String>) -> Result<(), SyncError> {
        let term = term.into();
        self.request(|reply| SyncCommand::Search { term, reply })
            .await
    }

    /// Feed one keystroke of the search box. The search runs once typing
    /// pauses for the configured window.
    pub fn search_input(&self, term: impl Into<String>) -> Result<(), SyncError> {
        self.send
            .send(SyncCommand::SearchInput(term.into()))
            .map_err(|_| SyncError::DriverStopped)
    }

    pub async fn refresh(&self) -> Result<(), SyncError> {
        self.request(|reply| SyncCommand::Refresh { reply }).await
    }

    pub async fn create(&self, draft: AccountDraft) -> Result<(), SyncError> {
        self.request(|reply| SyncCommand::Create { draft, reply })
            .await
    }

    pub async fn update(&self, id: AccountId, draft: AccountDraft) -> Result<(), SyncError> {
        self.request(|reply| SyncCommand::Update { id, draft, reply })
            .await
    }

    pub async fn delete(&self, id: AccountId) -> Result<(), SyncError> {
        self.request(|reply| SyncCommand::Delete { id, reply })
            .await
    }

    pub async fn suspend(&self, id: AccountId) -> Result<(), SyncError> {
        self.request(|reply| SyncCommand::Suspend { id, reply })
            .await
    }

    pub async fn activate(&self, id: AccountId) -> Result<(), SyncError> {
        self.request(|reply| SyncCommand::Activate { id, reply })
            .await
    }

    /// Stop the driver after the operation in flight, if any, settles.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn request(
        &self,
        command: impl FnOnce(Reply) -> SyncCommand,
    ) -> Result<(), SyncError> {
        let (reply, response) = flume::bounded(1);
        self.send
            .send_async(command(reply))
            .await
            .map_err(|_| SyncError::DriverStopped)?;
        response
            .recv_async()
            .await
            .map_err(|_| SyncError::DriverStopped)?
    }
}

#[derive(Debug)]
pub struct SyncDriver {
    sync: AccountsSync,
    debouncer: SearchDebouncer,
    refresh_interval: Option<Duration>,
    commands: Receiver<SyncCommand>,
    shutdown: CancellationToken,
}

impl SyncDriver {
    pub fn new(sync: AccountsSync, config: &BusinessConfig) -> (Self, SyncHandle) {
        let (send, commands) = flume::unbounded();
        let shutdown = CancellationToken::new();
        let driver = Self {
            sync,
            debouncer: SearchDebouncer::new(config.search_debounce()),
            refresh_interval: config.refresh_interval(),
            commands,
            shutdown: shutdown.clone(),
        };
        (driver, SyncHandle { send, shutdown })
    }

    /// Attach the view that renders this driver's state.
    pub fn subscribe(&mut self) -> StateReader<AccountsState> {
        self.sync.subscribe()
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Initial fetch, then serve commands until shutdown or until every
    /// handle is dropped.
    pub async fn run(mut self) {
        info!("Accounts sync driver started");
        if let Err(err) = self.sync.refresh().await {
            debug!("Initial fetch failed: {err}");
        }

        let commands = self.commands.clone();
        let settled = self.debouncer.settled_receiver();
        let shutdown = self.shutdown.clone();
        let mut poll = self.refresh_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                command = commands.recv_async() => {
                    let Ok(command) = command else { break };
                    self.handle(command).await;
                }
                Ok(settled) = settled.recv_async() => {
                    if let Some(term) = self.debouncer.accept(settled)
                        && let Err(err) = self.sync.search(&term).await
                    {
                        debug!("Debounced search failed: {err}");
                    }
                }
                () = next_tick(&mut poll) => {
                    debug!("Polling accounts");
                    if let Err(err) = self.sync.refresh().await {
                        debug!("Polled refresh failed: {err}");
                    }
                }
            }
        }

        self.debouncer.cancel();
        info!("Accounts sync driver stopped");
    }

    async fn handle(&mut self, command: SyncCommand) {
        let (result, reply) = match command {
            SyncCommand::SearchInput(term) => {
                self.debouncer.input(term);
                return;
            }
            SyncCommand::Fetch { filter, reply } => (self.sync.fetch(&filter).await, reply),
            SyncCommand::Search { term, reply } => (self.sync.search(&term).await, reply),
            SyncCommand::Refresh { reply } => (self.sync.refresh().await, reply),
            SyncCommand::Create { draft, reply } => (self.sync.create(&draft).await, reply),
            SyncCommand::Update { id, draft, reply } => {
                (self.sync.update(id, &draft).await, reply)
            }
            SyncCommand::Delete { id, reply } => (self.sync.delete(id).await, reply),
            SyncCommand::Suspend { id, reply } => (self.sync.suspend(id).await, reply),
            SyncCommand::Activate { id, reply } => (self.sync.activate(id).await, reply),
        };
        if reply.send(result).is_err() {
            debug!("Caller went away before the result arrived");
        }
    }
}

async fn next_tick(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestContext, account_json};
    use serde_json::json;

    /// Poll the mock server until the `GET /users` history satisfies `done`.
    async fn wait_for_lists(ctx: &TestContext, done: impl Fn(&[Option<String>]) -> bool) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !done(&ctx.list_search_terms().await) {
            assert!(std::time::Instant::now() < deadline, "condition not met in time");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn driver_fetches_on_start_and_serves_mutations() {
        let ctx = TestContext::new().await;
        ctx.mock_list(json!([account_json(1, "A", true)])).await;
        ctx.mock_technical_stats(1, 1).await;
        ctx.mock_mutation("POST", "/users/1/suspend", 200).await;

        let (mut driver, handle) = SyncDriver::new(ctx.sync(), &ctx.config);
        let mut reader = driver.subscribe();
        let task = driver.spawn();

        handle.suspend(AccountId(1)).await.unwrap();
        // Initial fetch plus the refresh after the suspend.
        assert_eq!(ctx.list_request_count().await, 2);
        assert_eq!(reader.read().unwrap().accounts().len(), 1);

        handle.shutdown();
        task.await.unwrap();
        assert!(matches!(handle.refresh().await, Err(SyncError::DriverStopped)));
    }

    #[tokio::test]
    async fn driver_reports_mutation_failures() {
        let ctx = TestContext::new().await;
        ctx.mock_list(json!([])).await;
        ctx.mock_technical_stats(0, 0).await;
        ctx.mock_mutation("DELETE", "/users/5", 500).await;

        let (driver, handle) = SyncDriver::new(ctx.sync(), &ctx.config);
        let task = driver.spawn();

        let err = handle.delete(AccountId(5)).await.unwrap_err();
        assert!(err.to_string().contains("Failed to delete"));
        // Only the initial fetch: a failed delete does not refresh.
        assert_eq!(ctx.list_request_count().await, 1);

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn typing_dispatches_only_the_final_term() {
        let ctx = TestContext::new().await;
        ctx.mock_list(json!([account_json(2, "Bob", true)])).await;
        ctx.mock_technical_stats(1, 1).await;

        let config = ctx.config.clone().with_search_debounce(Duration::from_millis(100));
        let (driver, handle) = SyncDriver::new(ctx.sync(), &config);
        let task = driver.spawn();
        handle.refresh().await.unwrap();

        for term in ["b", "bo", "bob"] {
            handle.search_input(term).unwrap();
        }
        wait_for_lists(&ctx, |terms| terms.iter().any(Option::is_some)).await;
        tokio::time::sleep(Duration::from_millis(250)).await;

        let searched: Vec<String> = ctx
            .list_search_terms()
            .await
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(searched, vec!["bob".to_owned()]);

        handle.shutdown();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn driver_polls_when_interval_configured() {
        let ctx = TestContext::new().await;
        ctx.mock_list(json!([])).await;
        ctx.mock_technical_stats(0, 0).await;

        let config = ctx.config.clone().with_refresh_interval(Duration::from_millis(50));
        let (driver, handle) = SyncDriver::new(ctx.sync(), &config);
        let task = driver.spawn();

        wait_for_lists(&ctx, |terms| terms.len() >= 3).await;

        handle.shutdown();
        task.await.unwrap();
    }
}
