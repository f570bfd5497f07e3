//! Centralized state-transition validator (C4).
//!
//! A pure lookup table over `(action, current)`. Every state-mutating
//! operation in `binding_service`/`transaction_service` calls one of these
//! before doing any side-effectful work.

use crate::models::enums::{BindingStep, TransactionStatus};
use crate::services::errors::AppError;

fn binding_allowed(action: &str) -> &'static [BindingStep] {
    use BindingStep::*;
    match action {
        "request_login" => &[Bound, OtpRequested],
        "verify_login" => &[OtpRequested],
        "refresh_token_location" => &[OtpVerified, TokenLoginFetched],
        "verify_reseller" => &[OtpVerified, TokenLoginFetched],
        "check_balance" => &[Bound, OtpRequested, OtpVerification, OtpVerified, TokenLoginFetched],
        "logout" => &[Bound, OtpRequested, OtpVerification, OtpVerified, TokenLoginFetched],
        "start_transaction" => &[TokenLoginFetched],
        _ => &[],
    }
}

/// Raises `ValidationError(error_code="binding_invalid_step_transition")` unless
/// `current` is in the action's allowed set.
pub fn ensure_binding_step(action: &str, current: BindingStep) -> Result<(), AppError> {
    let allowed = binding_allowed(action);
    if allowed.contains(&current) {
        Ok(())
    } else {
        Err(AppError::validation(
            "binding_invalid_step_transition",
            format!(
                "action '{action}' not allowed from step {:?}; allowed: {:?}",
                current, allowed
            ),
        ))
    }
}

fn transaction_allowed(action: &str) -> &'static [TransactionStatus] {
    use TransactionStatus::*;
    match action {
        "submit_otp" => &[Processing, Resumed],
        "continue_transaction" => &[Processing, Resumed],
        "pause_transaction" => &[Processing, Resumed],
        "resume_transaction" => &[Paused],
        "stop_transaction" => &[Processing, Resumed, Paused, Suspect],
        "check_balance_and_continue_or_stop" => &[Processing, Resumed, Paused],
        _ => &[],
    }
}

/// Raises `ValidationError(error_code="transaction_invalid_status_transition")`
/// unless `current` is in the action's allowed set.
pub fn ensure_transaction_status(action: &str, current: TransactionStatus) -> Result<(), AppError> {
    let allowed = transaction_allowed(action);
    if allowed.contains(&current) {
        Ok(())
    } else {
        Err(AppError::validation(
            "transaction_invalid_status_transition",
            format!(
                "action '{action}' not allowed from status {:?}; allowed: {:?}",
                current, allowed
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_login_allowed_from_bound_and_otp_requested() {
        assert!(ensure_binding_step("request_login", BindingStep::Bound).is_ok());
        assert!(ensure_binding_step("request_login", BindingStep::OtpRequested).is_ok());
        assert!(ensure_binding_step("request_login", BindingStep::TokenLoginFetched).is_err());
    }

    #[test]
    fn start_transaction_requires_token_login_fetched() {
        assert!(ensure_binding_step("start_transaction", BindingStep::TokenLoginFetched).is_ok());
        assert!(ensure_binding_step("start_transaction", BindingStep::OtpVerified).is_err());
    }

    #[test]
    fn resume_requires_paused() {
        assert!(ensure_transaction_status("resume_transaction", TransactionStatus::Paused).is_ok());
        assert!(ensure_transaction_status("resume_transaction", TransactionStatus::Processing).is_err());
    }

    #[test]
    fn invalid_transition_carries_stable_error_code() {
        let err = ensure_transaction_status("resume_transaction", TransactionStatus::Processing).unwrap_err();
        match err {
            AppError::Validation { error_code, .. } => {
                assert_eq!(error_code, "transaction_invalid_status_transition");
            }
            _ => panic!("expected Validation error"),
        }
    }
}
