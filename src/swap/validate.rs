use crate::custody::CustodyCalendar;
use crate::error::CustodyError;
use crate::model::{ParentRole, RequestType};
use chrono::NaiveDate;

/// Vérifie qu'une demande porte sur un jour du demandeur et, pour un échange,
/// qu'il reçoit en retour un jour de l'autre parent.
pub fn validate_swap(
    calendar: &CustodyCalendar<'_>,
    requester: ParentRole,
    request_type: RequestType,
    original_date: NaiveDate,
    proposed_date: Option<NaiveDate>,
) -> Result<(), CustodyError> {
    if calendar.parent_on(original_date) != Some(requester) {
        return Err(CustodyError::SwapInvalidOriginalDay);
    }

    if request_type == RequestType::OneWay {
        return Ok(());
    }

    let proposed = proposed_date.ok_or(CustodyError::SwapMissingProposedDay)?;
    if calendar.parent_on(proposed) == Some(requester) {
        return Err(CustodyError::SwapProposedSameParent);
    }
    Ok(())
}
