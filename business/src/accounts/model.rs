//! Account records and the wire shapes of the users API.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ustr::Ustr;

/// Server-assigned account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AccountId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The only two states an account can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccountStatus {
    Active,
    #[default]
    Suspended,
}

impl AccountStatus {
    pub fn from_active_flag(is_active: bool) -> Self {
        if is_active {
            Self::Active
        } else {
            Self::Suspended
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached copy of one remote account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub status: AccountStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub user_type: Ustr,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// One account as the server sends it.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AccountPayload {
    id: AccountId,
    #[serde(default, alias = "username")]
    name: String,
    #[serde(default)]
    email: String,
    /// `null` or absent reads as suspended.
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    user_type: Option<String>,
}

impl AccountPayload {
    pub(crate) fn into_account(self, default_user_type: Ustr) -> Account {
        Account {
            id: self.id,
            name: self.name,
            email: self.email,
            status: AccountStatus::from_active_flag(self.is_active.unwrap_or(false)),
            last_login: self.last_login,
            user_type: self
                .user_type
                .as_deref()
                .map(Ustr::from)
                .unwrap_or(default_user_type),
        }
    }
}

/// Accepts RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.f]` taken as UTC.
/// Anything else reads as "never logged in" instead of failing the list.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::String(text)) = raw else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&text) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    Ok(["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&text, format).ok())
        .map(|naive| naive.and_utc()))
}

/// `GET /users` body: a bare list or a `users` / `results` envelope.
///
/// Records stay raw until [`into_payloads`](Self::into_payloads), so one bad
/// record is reported by position instead of failing the envelope match.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListAccountsResponse {
    Bare(Vec<serde_json::Value>),
    Users { users: Vec<serde_json::Value> },
    Results { results: Vec<serde_json::Value> },
}

impl ListAccountsResponse {
    pub(crate) fn into_payloads(self) -> Result<Vec<AccountPayload>, String> {
        let items = match self {
            Self::Bare(items) | Self::Users { users: items } | Self::Results { results: items } => {
                items
            }
        };
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item).map_err(|e| format!("record {index}: {e}"))
            })
            .collect()
    }
}

/// Fields a client submits when creating or replacing an account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AccountDraft {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl AccountDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            is_active: None,
        }
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }
}

/// A draft plus the subtype tag every write carries.
#[derive(Debug, Serialize)]
pub(crate) struct TaggedDraft<'a> {
    #[serde(flatten)]
    pub(crate) draft: &'a AccountDraft,
    pub(crate) user_type: &'a str,
}

/// Aggregate numbers shown next to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountStats {
    pub total: u64,
    pub new_today: u64,
    pub active: u64,
    pub churn_rate: String,
}

impl Default for AccountStats {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl AccountStats {
    pub fn zeroed() -> Self {
        Self {
            total: 0,
            new_today: 0,
            active: 0,
            churn_rate: "0%".to_owned(),
        }
    }

    /// Partial statistics computed from a fetched list.
    ///
    /// `new_today` and `churn_rate` cannot be known from a list and are
    /// reported as zero.
    pub fn from_accounts(accounts: &[Account]) -> Self {
        Self {
            total: accounts.len() as u64,
            active: accounts.iter().filter(|a| a.is_active()).count() as u64,
            ..Self::zeroed()
        }
    }
}

/// `GET /users/stats?detailed=true` body.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatsResponse {
    #[serde(default)]
    by_user_type: HashMap<String, serde_json::Value>,
}

impl StatsResponse {
    /// Breakdown for one subtype, if the server sent a usable one.
    pub(crate) fn breakdown(&self, user_type: &str) -> Option<AccountStats> {
        let value = self.by_user_type.get(user_type)?;
        let breakdown: StatsBreakdown = serde_json::from_value(value.clone()).ok()?;
        Some(breakdown.into())
    }
}

/// Every field may be absent or `null`; either reads as zero.
#[derive(Debug, Deserialize)]
struct StatsBreakdown {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    new_today: Option<u64>,
    #[serde(default)]
    active: Option<u64>,
    #[serde(default)]
    churn_rate: Option<serde_json::Value>,
}

impl From<StatsBreakdown> for AccountStats {
    fn from(b: StatsBreakdown) -> Self {
        let churn_rate = match b.churn_rate {
            Some(serde_json::Value::String(rate)) if !rate.trim().is_empty() => rate,
            Some(serde_json::Value::Number(rate)) => format!("{rate}%"),
            _ => "0%".to_owned(),
        };
        Self {
            total: b.total.unwrap_or(0),
            new_today: b.new_today.unwrap_or(0),
            active: b.active.unwrap_or(0),
            churn_rate,
        }
    }
}
