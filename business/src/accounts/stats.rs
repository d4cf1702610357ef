use log::{debug, warn};

use crate::accounts::api::{AccountFilter, AccountsApi};
use crate::accounts::model::AccountStats;

/// Statistics for the configured subtype.
///
/// Prefers the server's pre-aggregated breakdown. Without one, counts the
/// filtered list locally (total and active only). Never fails: any error on
/// the way yields [`AccountStats::zeroed`].
pub(crate) async fn derive_stats(api: &AccountsApi) -> AccountStats {
    match api.stats().await {
        Ok(Some(stats)) => return stats,
        Ok(None) => debug!(
            "No {} breakdown in statistics response, counting locally",
            api.user_type()
        ),
        Err(err) => warn!("Statistics endpoint unavailable ({err}), counting locally"),
    }

    match api.list(&AccountFilter::all()).await {
        Ok(accounts) => AccountStats::from_accounts(&accounts),
        Err(err) => {
            warn!("Could not derive statistics: {err}");
            AccountStats::zeroed()
        }
    }
}
