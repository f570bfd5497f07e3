//! Shared domain enums for accounts, bindings, and transactions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
pub enum AccountStatus {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "exhausted")]
    Exhausted,
    #[sea_orm(string_value = "disabled")]
    Disabled,
}

impl AccountStatus {
    pub fn value(&self) -> &'static str {
        match self {
            AccountStatus::New => "new",
            AccountStatus::Active => "active",
            AccountStatus::Exhausted => "exhausted",
            AccountStatus::Disabled => "disabled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(AccountStatus::New),
            "active" => Some(AccountStatus::Active),
            "exhausted" => Some(AccountStatus::Exhausted),
            "disabled" => Some(AccountStatus::Disabled),
            _ => None,
        }
    }
}

/// Binding process steps, see spec.md section 4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(30))")]
pub enum BindingStep {
    #[sea_orm(string_value = "bound")]
    Bound,
    #[sea_orm(string_value = "otp_requested")]
    OtpRequested,
    #[sea_orm(string_value = "otp_verification")]
    OtpVerification,
    #[sea_orm(string_value = "otp_verified")]
    OtpVerified,
    #[sea_orm(string_value = "token_login_fetched")]
    TokenLoginFetched,
    #[sea_orm(string_value = "logged_out")]
    LoggedOut,
}

impl BindingStep {
    pub fn value(&self) -> &'static str {
        match self {
            BindingStep::Bound => "bound",
            BindingStep::OtpRequested => "otp_requested",
            BindingStep::OtpVerification => "otp_verification",
            BindingStep::OtpVerified => "otp_verified",
            BindingStep::TokenLoginFetched => "token_login_fetched",
            BindingStep::LoggedOut => "logged_out",
        }
    }
}

/// Transaction lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "PROCESSING")]
    Processing,
    #[sea_orm(string_value = "PAUSED")]
    Paused,
    #[sea_orm(string_value = "RESUMED")]
    Resumed,
    #[sea_orm(string_value = "SUKSES")]
    Sukses,
    #[sea_orm(string_value = "SUSPECT")]
    Suspect,
    #[sea_orm(string_value = "GAGAL")]
    Gagal,
}

impl TransactionStatus {
    pub fn value(&self) -> &'static str {
        match self {
            TransactionStatus::Processing => "PROCESSING",
            TransactionStatus::Paused => "PAUSED",
            TransactionStatus::Resumed => "RESUMED",
            TransactionStatus::Sukses => "SUKSES",
            TransactionStatus::Suspect => "SUSPECT",
            TransactionStatus::Gagal => "GAGAL",
        }
    }

    /// SUKSES and GAGAL are terminal; SUSPECT is non-terminal (spec.md section 3).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Sukses | TransactionStatus::Gagal)
    }
}

/// OTP status for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(10))")]
pub enum TransactionOtpStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "SUCCESS")]
    Success,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}
