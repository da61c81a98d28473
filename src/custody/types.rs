use crate::model::{EventId, ParentRole};
use chrono::NaiveDate;

/// Origine d'une résolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Schedule,
    Override(EventId),
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::Schedule => "schedule",
            Source::Override(_) => "override",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub date: NaiveDate,
    pub parent: Option<ParentRole>,
    pub source: Source,
}

/// Prochain changement de garde.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub date: NaiveDate,
    pub to_parent: ParentRole,
}
