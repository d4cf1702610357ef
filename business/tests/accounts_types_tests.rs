//! Unit tests for the public account types and their methods.

use staffdesk_business::{
    AccountDraft, AccountFilter, AccountId, AccountStats, AccountStatus, AccountsApiError,
    AccountsState, RequestStatus, SyncError,
};

/// Tests for AccountStatus enum
mod account_status_tests {
    use super::*;

    #[test]
    fn test_account_status_default_is_suspended() {
        assert_eq!(AccountStatus::default(), AccountStatus::Suspended);
    }

    #[test]
    fn test_account_status_from_active_flag() {
        assert_eq!(AccountStatus::from_active_flag(true), AccountStatus::Active);
        assert_eq!(
            AccountStatus::from_active_flag(false),
            AccountStatus::Suspended
        );
    }

    #[test]
    fn test_account_status_display() {
        assert_eq!(AccountStatus::Active.to_string(), "Active");
        assert_eq!(AccountStatus::Suspended.to_string(), "Suspended");
    }

    #[test]
    fn test_account_status_is_active() {
        assert!(AccountStatus::Active.is_active());
        assert!(!AccountStatus::Suspended.is_active());
    }
}

/// Tests for AccountFilter
mod account_filter_tests {
    use super::*;

    #[test]
    fn test_filter_all_has_no_search() {
        assert_eq!(AccountFilter::all().search_term(), None);
    }

    #[test]
    fn test_filter_search_keeps_term() {
        assert_eq!(AccountFilter::search("bob").search_term(), Some("bob"));
    }

    #[test]
    fn test_filter_blank_search_is_all() {
        assert_eq!(AccountFilter::search(""), AccountFilter::all());
        assert_eq!(AccountFilter::search("   "), AccountFilter::all());
    }
}

/// Tests for AccountDraft
mod account_draft_tests {
    use super::*;

    #[test]
    fn test_draft_new_leaves_active_unset() {
        let draft = AccountDraft::new("Ada", "ada@x.com");
        assert_eq!(draft.name, "Ada");
        assert_eq!(draft.email, "ada@x.com");
        assert_eq!(draft.is_active, None);
    }

    #[test]
    fn test_draft_with_active() {
        let draft = AccountDraft::new("Ada", "ada@x.com").with_active(false);
        assert_eq!(draft.is_active, Some(false));
    }
}

/// Tests for AccountStats
mod account_stats_tests {
    use super::*;

    #[test]
    fn test_stats_default_is_zeroed() {
        let stats = AccountStats::default();
        assert_eq!(stats, AccountStats::zeroed());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.new_today, 0);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.churn_rate, "0%");
    }

    #[test]
    fn test_stats_from_empty_list() {
        assert_eq!(AccountStats::from_accounts(&[]), AccountStats::zeroed());
    }
}

/// Tests for AccountsState and RequestStatus
mod accounts_state_tests {
    use super::*;

    #[test]
    fn test_state_starts_idle_and_empty() {
        let state = AccountsState::new();
        assert_eq!(state.status(), &RequestStatus::Idle);
        assert!(state.accounts().is_empty());
        assert!(!state.is_loading());
        assert!(state.error().is_none());
        assert!(state.last_sync().is_none());
        assert_eq!(state.stats(), &AccountStats::zeroed());
    }

    #[test]
    fn test_state_find_on_empty_state() {
        assert!(AccountsState::new().find(AccountId(1)).is_none());
    }

    #[test]
    fn test_request_status_error_message() {
        let status = RequestStatus::Error("boom".to_owned());
        assert_eq!(status.error(), Some("boom"));
        assert!(!status.is_loading());
    }

    #[test]
    fn test_request_status_loading() {
        assert!(RequestStatus::Loading.is_loading());
        assert!(RequestStatus::Loading.error().is_none());
    }
}

/// Tests for error types
mod error_tests {
    use super::*;

    #[test]
    fn test_api_error_status_code() {
        let err = AccountsApiError::Status {
            status: 503,
            body: "unavailable".to_owned(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(AccountsApiError::Transport("refused".to_owned()).status(), None);
    }

    #[test]
    fn test_driver_stopped_message() {
        assert!(!SyncError::DriverStopped.to_string().is_empty());
    }

    #[test]
    fn test_account_id_display() {
        assert_eq!(AccountId(42).to_string(), "42");
        assert_eq!(AccountId::from(7), AccountId(7));
    }
}
