use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of interaction recorded in a user's activity log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Viewed,
    Saved,
    Applied,
    Searched,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Viewed => "viewed",
            InteractionKind::Saved => "saved",
            InteractionKind::Applied => "applied",
            InteractionKind::Searched => "searched",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "viewed" => Some(InteractionKind::Viewed),
            "saved" => Some(InteractionKind::Saved),
            "applied" => Some(InteractionKind::Applied),
            "searched" => Some(InteractionKind::Searched),
            _ => None,
        }
    }
}

/// One entry of the append-only interaction log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub user_id: Uuid,
    pub kind: InteractionKind,
    #[serde(default)]
    pub program_id: Option<Uuid>,
    #[serde(default)]
    pub query: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// A user's observed behavior, folded from the interaction log
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserBehavior {
    pub viewed_programs: Vec<Uuid>,
    pub saved_programs: Vec<Uuid>,
    pub applied_programs: Vec<Uuid>,
    /// Not used for scoring
    pub search_history: Vec<String>,
}

impl UserBehavior {
    /// Folds a full interaction history into behavior lists
    ///
    /// Entries are taken in log order; repeated program ids keep their first
    /// position. Searches are kept verbatim.
    pub fn from_interactions(interactions: &[Interaction]) -> Self {
        let mut behavior = UserBehavior::default();

        for interaction in interactions {
            let list = match interaction.kind {
                InteractionKind::Viewed => &mut behavior.viewed_programs,
                InteractionKind::Saved => &mut behavior.saved_programs,
                InteractionKind::Applied => &mut behavior.applied_programs,
                InteractionKind::Searched => {
                    if let Some(query) = &interaction.query {
                        behavior.search_history.push(query.clone());
                    }
                    continue;
                }
            };

            if let Some(program_id) = interaction.program_id {
                if !list.contains(&program_id) {
                    list.push(program_id);
                }
            }
        }

        behavior
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.viewed_programs.is_empty()
            && self.saved_programs.is_empty()
            && self.applied_programs.is_empty()
            && self.search_history.is_empty()
    }
}
