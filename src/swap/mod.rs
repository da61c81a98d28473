//! Demandes d'échange de jours : validation des dates, cycle de vie,
//! matérialisation des overrides.

mod lifecycle;
mod validate;

pub use lifecycle::{ensure_can_cancel, ensure_can_respond, override_events_for, SwapDecision};
pub use validate::validate_swap;
