//! The accounts synchronization hook.
//!
//! `AccountsSync` presents the remote, subtype-filtered users collection as
//! local state. Every mutation goes through the same protocol: fire the remote
//! call, then re-run the full collection fetch. Local state is never patched
//! incrementally, so the server stays the single source of truth.
//!
//! Operations take `&mut self`; a second operation cannot start until the
//! first has settled. Nothing is cancelled or retried. When several callers
//! share one hook through [`SyncDriver`](crate::SyncDriver), whichever fetch
//! resolves last decides the displayed snapshot.

use chrono::Utc;
use log::{debug, error, info, warn};
use staffdesk_states::{StateReader, StateUpdater, state_channel};
use thiserror::Error;

use crate::BusinessConfig;
use crate::accounts::api::{AccountFilter, AccountsApi, AccountsApiError};
use crate::accounts::model::{AccountDraft, AccountId};
use crate::accounts::state::AccountsState;
use crate::accounts::stats::derive_stats;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A remote call failed; `action` reads like "delete account".
    #[error("Failed to {action}: {source}")]
    Remote {
        action: &'static str,
        #[source]
        source: AccountsApiError,
    },

    #[error("accounts sync driver stopped")]
    DriverStopped,
}

impl SyncError {
    fn remote(action: &'static str, source: AccountsApiError) -> Self {
        Self::Remote { action, source }
    }
}

/// A remote write, sent before the mandatory refresh.
#[derive(Debug, Clone, Copy)]
enum Mutation<'a> {
    Create(&'a AccountDraft),
    Update(AccountId, &'a AccountDraft),
    Delete(AccountId),
    Suspend(AccountId),
    Activate(AccountId),
}

impl Mutation<'_> {
    fn action(self) -> &'static str {
        match self {
            Self::Create(_) => "create account",
            Self::Update(..) => "update account",
            Self::Delete(_) => "delete account",
            Self::Suspend(_) => "suspend account",
            Self::Activate(_) => "activate account",
        }
    }

    async fn send(self, api: &AccountsApi) -> Result<(), AccountsApiError> {
        match self {
            Self::Create(draft) => api.create(draft).await,
            Self::Update(id, draft) => api.update(id, draft).await,
            Self::Delete(id) => api.delete(id).await,
            Self::Suspend(id) => api.suspend(id).await,
            Self::Activate(id) => api.activate(id).await,
        }
    }
}

#[derive(Debug)]
pub struct AccountsSync {
    api: AccountsApi,
    state: AccountsState,
    updater: Option<StateUpdater<AccountsState>>,
}

impl AccountsSync {
    /// Empty, idle hook. Nothing is fetched until the first operation.
    pub fn new(api: AccountsApi) -> Self {
        Self {
            api,
            state: AccountsState::new(),
            updater: None,
        }
    }

    pub fn from_config(config: &BusinessConfig) -> Result<Self, AccountsApiError> {
        Ok(Self::new(AccountsApi::new(config)?))
    }

    /// Attach a view. The current state is published immediately; any
    /// previously attached reader stops receiving updates.
    pub fn subscribe(&mut self) -> StateReader<AccountsState> {
        let (updater, reader) = state_channel();
        self.updater = Some(updater);
        self.publish();
        reader
    }

    pub fn state(&self) -> &AccountsState {
        &self.state
    }

    pub fn api(&self) -> &AccountsApi {
        &self.api
    }

    /// Replace the snapshot with the server's view for `filter`, then refresh
    /// the statistics.
    ///
    /// On failure the snapshot is kept and the error is recorded in state.
    /// Statistics are attempted either way and never fail the fetch.
    pub async fn fetch(&mut self, filter: &AccountFilter) -> Result<(), SyncError> {
        self.begin();

        let result = match self.api.list(filter).await {
            Ok(accounts) => {
                info!("Synchronized {} accounts", accounts.len());
                self.state.replace_accounts(accounts, Utc::now());
                Ok(())
            }
            Err(source) => {
                let err = SyncError::remote("fetch accounts", source);
                warn!("{err}");
                self.state.set_error(err.to_string());
                Err(err)
            }
        };
        self.publish();

        let stats = derive_stats(&self.api).await;
        self.state.set_stats(stats);
        self.publish();

        result
    }

    /// [`fetch`](Self::fetch) with a text filter. A blank term lists everything.
    pub async fn search(&mut self, term: &str) -> Result<(), SyncError> {
        debug!("Searching accounts for {term:?}");
        self.fetch(&AccountFilter::search(term)).await
    }

    /// Re-synchronize with the default filter.
    pub async fn refresh(&mut self) -> Result<(), SyncError> {
        self.fetch(&AccountFilter::all()).await
    }

    pub async fn create(&mut self, draft: &AccountDraft) -> Result<(), SyncError> {
        self.mutate(Mutation::Create(draft)).await
    }

    /// Full replacement of the record.
    pub async fn update(&mut self, id: AccountId, draft: &AccountDraft) -> Result<(), SyncError> {
        self.mutate(Mutation::Update(id, draft)).await
    }

    pub async fn delete(&mut self, id: AccountId) -> Result<(), SyncError> {
        self.mutate(Mutation::Delete(id)).await
    }

    pub async fn suspend(&mut self, id: AccountId) -> Result<(), SyncError> {
        self.mutate(Mutation::Suspend(id)).await
    }

    pub async fn activate(&mut self, id: AccountId) -> Result<(), SyncError> {
        self.mutate(Mutation::Activate(id)).await
    }

    /// Send the write; on success re-fetch everything.
    ///
    /// `Ok` reports the write only. A failing refresh afterwards shows up in
    /// the published status, not here.
    async fn mutate(&mut self, mutation: Mutation<'_>) -> Result<(), SyncError> {
        self.begin();

        if let Err(source) = mutation.send(&self.api).await {
            let err = SyncError::remote(mutation.action(), source);
            error!("{err}");
            self.state.set_error(err.to_string());
            self.publish();
            return Err(err);
        }

        info!("{} succeeded, refreshing", mutation.action());
        if let Err(err) = self.refresh().await {
            debug!("Refresh after {} failed: {err}", mutation.action());
        }
        Ok(())
    }

    fn begin(&mut self) {
        self.state.set_loading();
        self.publish();
    }

    fn publish(&mut self) {
        let Some(updater) = &self.updater else {
            return;
        };
        if updater.set(self.state.clone()).is_err() {
            debug!("Accounts view detached, no longer publishing");
            self.updater = None;
        }
    }
}
