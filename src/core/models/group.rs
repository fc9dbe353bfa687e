use super::expense::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupCategory {
    Trip,
    Household,
    Event,
    #[default]
    Other,
}

impl GroupCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupCategory::Trip => "trip",
            GroupCategory::Household => "household",
            GroupCategory::Event => "event",
            GroupCategory::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "trip" => Some(GroupCategory::Trip),
            "household" => Some(GroupCategory::Household),
            "event" => Some(GroupCategory::Event),
            "other" => Some(GroupCategory::Other),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GroupMember {
    pub participant_id: ParticipantId,
    pub name: String,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub joined_at: DateTime<Utc>,
    /// Former members stay on the roster so their expenses keep resolving.
    #[schema(value_type = Option<String>, example = "2024-06-01T12:34:56Z")]
    pub left_at: Option<DateTime<Utc>>,
}

impl GroupMember {
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: GroupCategory,
    pub members: Vec<GroupMember>,
    pub created_by: ParticipantId,
    pub is_active: bool,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn is_active_member(&self, participant_id: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.participant_id == participant_id && m.is_active())
    }

    /// True for current and former members alike.
    pub fn knows(&self, participant_id: &str) -> bool {
        self.members.iter().any(|m| m.participant_id == participant_id)
    }

    pub fn member_name(&self, participant_id: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.participant_id == participant_id)
            .map(|m| m.name.as_str())
    }

    pub fn active_members(&self) -> impl Iterator<Item = &GroupMember> {
        self.members.iter().filter(|m| m.is_active())
    }
}
