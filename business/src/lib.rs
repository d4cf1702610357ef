//! Business layer for the staffdesk accounts views.

pub mod accounts;
mod config;
pub mod diagnostics;
pub mod http;
mod test_utils;

pub use accounts::api::{AccountFilter, AccountsApi, AccountsApiError, ApiResult};
pub use accounts::debounce::{SearchDebouncer, SettledSearch};
pub use accounts::driver::{SyncDriver, SyncHandle};
pub use accounts::model::{Account, AccountDraft, AccountId, AccountStats, AccountStatus};
pub use accounts::state::{AccountsState, RequestStatus};
pub use accounts::sync::{AccountsSync, SyncError};
pub use config::BusinessConfig;
pub use diagnostics::{ApiAvailability, ConnectivityReport, EndpointProbe, ProbeOutcome};
