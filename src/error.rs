use thiserror::Error;

/// Erreurs métier. L'affichage est le code stable attendu par l'interface
/// (toast localisé côté client).
#[derive(Error, Debug)]
pub enum CustodyError {
    #[error("missing-family-context")]
    MissingFamilyContext,
    #[error("family-not-found: {0}")]
    FamilyNotFound(String),
    #[error("not-a-family-member")]
    NotAFamilyMember,
    #[error("family-full")]
    FamilyFull,
    #[error("missing-other-parent")]
    MissingOtherParent,
    #[error("no-active-schedule")]
    NoActiveSchedule,
    #[error("invalid-weekday: {0}")]
    InvalidWeekday(u8),
    #[error("schedule-days-overlap: {0}")]
    ScheduleDaysOverlap(u8),
    #[error("invalid-date-range")]
    InvalidDateRange,
    #[error("invalid-event-range")]
    InvalidEventRange,
    #[error("event-not-found: {0}")]
    EventNotFound(String),
    #[error("no-pending-approval")]
    NoPendingApproval,
    #[error("requester-cannot-approve")]
    RequesterCannotApprove,
    #[error("only-requester-can-cancel")]
    OnlyRequesterCanCancel,
    #[error("swap-invalid-original-day")]
    SwapInvalidOriginalDay,
    #[error("swap-missing-proposed-day")]
    SwapMissingProposedDay,
    #[error("swap-proposed-same-parent")]
    SwapProposedSameParent,
    #[error("swap-request-not-found: {0}")]
    SwapRequestNotFound(String),
    #[error("swap-request-not-pending")]
    SwapRequestNotPending,
    #[error("only-target-can-respond")]
    OnlyTargetCanRespond,
    #[error("storage-failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl CustodyError {
    /// Code stable, sans détail.
    pub fn code(&self) -> &'static str {
        match self {
            CustodyError::MissingFamilyContext => "missing-family-context",
            CustodyError::FamilyNotFound(_) => "family-not-found",
            CustodyError::NotAFamilyMember => "not-a-family-member",
            CustodyError::FamilyFull => "family-full",
            CustodyError::MissingOtherParent => "missing-other-parent",
            CustodyError::NoActiveSchedule => "no-active-schedule",
            CustodyError::InvalidWeekday(_) => "invalid-weekday",
            CustodyError::ScheduleDaysOverlap(_) => "schedule-days-overlap",
            CustodyError::InvalidDateRange => "invalid-date-range",
            CustodyError::InvalidEventRange => "invalid-event-range",
            CustodyError::EventNotFound(_) => "event-not-found",
            CustodyError::NoPendingApproval => "no-pending-approval",
            CustodyError::RequesterCannotApprove => "requester-cannot-approve",
            CustodyError::OnlyRequesterCanCancel => "only-requester-can-cancel",
            CustodyError::SwapInvalidOriginalDay => "swap-invalid-original-day",
            CustodyError::SwapMissingProposedDay => "swap-missing-proposed-day",
            CustodyError::SwapProposedSameParent => "swap-proposed-same-parent",
            CustodyError::SwapRequestNotFound(_) => "swap-request-not-found",
            CustodyError::SwapRequestNotPending => "swap-request-not-pending",
            CustodyError::OnlyTargetCanRespond => "only-target-can-respond",
            CustodyError::Storage(_) => "storage-failure",
        }
    }
}
