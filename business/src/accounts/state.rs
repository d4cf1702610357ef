//! Published state of the accounts view.
//!
//! `AccountsSync` owns the only mutable copy; views receive whole clones
//! through a `StateReader<AccountsState>`.

use chrono::{DateTime, Utc};
use staffdesk_states::State;

use crate::accounts::model::{Account, AccountId, AccountStats};

/// Lifecycle of the most recent operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestStatus {
    /// Nothing has run yet.
    #[default]
    Idle,

    Loading,

    Success,

    /// The last operation failed with this message.
    Error(String),
}

impl RequestStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountsState {
    /// Snapshot from the most recent successful fetch, in server order.
    accounts: Vec<Account>,

    stats: AccountStats,

    status: RequestStatus,

    /// When the snapshot was last replaced.
    last_sync: Option<DateTime<Utc>>,
}

impl State for AccountsState {
    const TYPE: &'static str = "accounts_state";
}

impl AccountsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn find(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn stats(&self) -> &AccountStats {
        &self.stats
    }

    pub fn status(&self) -> &RequestStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.status.error()
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    /// Start of an operation: loading, previous error cleared.
    pub(crate) fn set_loading(&mut self) {
        self.status = RequestStatus::Loading;
    }

    /// Replace the snapshot wholesale.
    ///
    /// Takes `now` as a parameter so tests can pin the sync time.
    pub(crate) fn replace_accounts(&mut self, accounts: Vec<Account>, now: DateTime<Utc>) {
        self.accounts = accounts;
        self.status = RequestStatus::Success;
        self.last_sync = Some(now);
    }

    /// Record a failure. The snapshot is left as it was.
    pub(crate) fn set_error(&mut self, message: String) {
        self.status = RequestStatus::Error(message);
    }

    pub(crate) fn set_stats(&mut self, stats: AccountStats) {
        self.stats = stats;
    }
}
