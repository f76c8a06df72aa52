//! Support tickets and the chat thread attached to each ticket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::user::User;
use crate::types::{ChatId, SupportTicketId, UserId};
use crate::validation::rules::validate_not_blank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SupportTicket {
    pub id: SupportTicketId,
    pub owner_id: UserId,
    /// Staff member handling the ticket.
    pub assigned_to: Option<UserId>,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SupportTicket {
    pub fn new(owner_id: UserId, title: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: SupportTicketId::new(0),
            owner_id,
            assigned_to: None,
            title,
            description,
            status: TicketStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    /// Owner, assignee, and staff may follow the ticket and its chat.
    pub fn is_visible_to(&self, user: &User) -> bool {
        user.is_staff() || self.owner_id == user.id || self.assigned_to == Some(user.id)
    }

    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTicketRequest {
    #[validate(custom(function = "validate_not_blank"), length(max = 200))]
    pub title: String,
    #[validate(custom(function = "validate_not_blank"), length(max = 4000))]
    pub description: String,
}

/// Partial update. Title and description belong to the owner; assignment and
/// status are staff fields.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTicketRequest {
    #[validate(custom(function = "validate_not_blank"), length(max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<UserId>,
}

impl UpdateTicketRequest {
    pub fn touches_staff_fields(&self) -> bool {
        self.status.is_some() || self.assigned_to.is_some()
    }

    pub fn touches_owner_fields(&self) -> bool {
        self.title.is_some() || self.description.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Chat {
    pub id: ChatId,
    pub ticket_id: SupportTicketId,
    pub sender_id: UserId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PostChatRequest {
    pub ticket_id: SupportTicketId,
    #[validate(custom(function = "validate_not_blank"), length(max = 2000))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChatQuery {
    pub ticket_id: SupportTicketId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn user(id: i64, role: UserRole) -> User {
        let mut user = User::new("someone".into(), "someone@example.com".into(), "hash".into());
        user.id = UserId::new(id);
        user.role = role;
        user
    }

    #[test]
    fn visibility_covers_owner_assignee_and_staff() {
        let mut ticket = SupportTicket::new(UserId::new(1), "Late parcel".into(), "Order 5".into());
        ticket.assigned_to = Some(UserId::new(2));

        assert!(ticket.is_visible_to(&user(1, UserRole::Client)));
        assert!(ticket.is_visible_to(&user(2, UserRole::Client)));
        assert!(ticket.is_visible_to(&user(9, UserRole::Staff)));
        assert!(!ticket.is_visible_to(&user(3, UserRole::Client)));
    }

    #[test]
    fn status_uses_snake_case_on_the_wire() {
        let value = serde_json::to_value(TicketStatus::InProgress).unwrap();
        assert_eq!(value, "in_progress");
    }

    #[test]
    fn update_request_classifies_fields() {
        let request = UpdateTicketRequest {
            status: Some(TicketStatus::Closed),
            ..Default::default()
        };
        assert!(request.touches_staff_fields());
        assert!(!request.touches_owner_fields());
    }
}
