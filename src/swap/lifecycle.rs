use crate::error::CustodyError;
use crate::model::{
    CalendarEvent, EventParent, EventType, ParentRole, RequestType, SwapRequest, SwapStatus, UserId,
};

/// Réponse du parent sollicité.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDecision {
    Approve,
    Reject,
}

impl SwapDecision {
    pub fn status(self) -> SwapStatus {
        match self {
            SwapDecision::Approve => SwapStatus::Approved,
            SwapDecision::Reject => SwapStatus::Rejected,
        }
    }
}

/// Seul le parent sollicité répond, et seulement tant que la demande est en attente.
pub fn ensure_can_respond(request: &SwapRequest, user: &UserId) -> Result<(), CustodyError> {
    if &request.target_id != user {
        return Err(CustodyError::OnlyTargetCanRespond);
    }
    if request.status.is_terminal() {
        return Err(CustodyError::SwapRequestNotPending);
    }
    Ok(())
}

pub fn ensure_can_cancel(request: &SwapRequest, user: &UserId) -> Result<(), CustodyError> {
    if &request.requester_id != user {
        return Err(CustodyError::OnlyRequesterCanCancel);
    }
    if request.status.is_terminal() {
        return Err(CustodyError::SwapRequestNotPending);
    }
    Ok(())
}

/// Overrides créés à l'approbation : le jour d'origine passe à l'autre parent,
/// le jour proposé (échange) revient au demandeur.
pub fn override_events_for(request: &SwapRequest, requester: ParentRole) -> Vec<CalendarEvent> {
    let mut out = Vec::with_capacity(2);

    let mut given = CalendarEvent::all_day(
        format!("Garde : {}", request.target_name),
        request.original_date,
        EventType::Custody,
        EventParent::from(requester.other()),
    );
    given.swap_request_id = Some(request.id.clone());
    out.push(given);

    if request.request_type == RequestType::Swap {
        if let Some(proposed) = request.proposed_date {
            let mut taken = CalendarEvent::all_day(
                format!("Garde : {}", request.requester_name),
                proposed,
                EventType::Custody,
                EventParent::from(requester),
            );
            taken.swap_request_id = Some(request.id.clone());
            out.push(taken);
        }
    }

    out
}
