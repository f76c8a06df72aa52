//! Support tickets and their chat messages.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::support_ticket::{Chat, SupportTicket};
use crate::repositories::common::like_pattern;
use crate::types::{SupportTicketId, UserId};

const TABLE_NAME: &str = "support_tickets";
const SELECT_COLUMNS: &str =
    "id, owner_id, assigned_to, title, description, status, created_at, updated_at";
const CHAT_COLUMNS: &str = "id, ticket_id, sender_id, message, created_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SupportTicketRepository: Send + Sync {
    /// Tickets visible to a participant (`Some(user)`: owned or assigned) or
    /// every ticket (`None`), optionally filtered by title/description.
    async fn list(
        &self,
        participant: Option<UserId>,
        search: Option<String>,
    ) -> AppResult<Vec<SupportTicket>>;

    async fn find_by_id(&self, id: SupportTicketId) -> AppResult<Option<SupportTicket>>;

    async fn create(&self, ticket: &SupportTicket) -> AppResult<SupportTicket>;

    async fn update(&self, ticket: &SupportTicket) -> AppResult<SupportTicket>;

    async fn delete(&self, id: SupportTicketId) -> AppResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Messages of a ticket, oldest first.
    async fn list_for_ticket(&self, ticket_id: SupportTicketId) -> AppResult<Vec<Chat>>;

    async fn create(
        &self,
        ticket_id: SupportTicketId,
        sender_id: UserId,
        message: String,
    ) -> AppResult<Chat>;
}

#[derive(Debug, Clone)]
pub struct PgSupportTicketRepository {
    pool: PgPool,
}

impl PgSupportTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SupportTicketRepository for PgSupportTicketRepository {
    async fn list(
        &self,
        participant: Option<UserId>,
        search: Option<String>,
    ) -> AppResult<Vec<SupportTicket>> {
        let query = format!(
            "SELECT {} FROM {} \
             WHERE ($1::BIGINT IS NULL OR owner_id = $1 OR assigned_to = $1) \
             AND ($2::TEXT IS NULL OR title ILIKE $2 OR description ILIKE $2) \
             ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS, TABLE_NAME
        );
        let tickets = sqlx::query_as::<_, SupportTicket>(&query)
            .bind(participant)
            .bind(search.as_deref().map(like_pattern))
            .fetch_all(&self.pool)
            .await?;
        Ok(tickets)
    }

    async fn find_by_id(&self, id: SupportTicketId) -> AppResult<Option<SupportTicket>> {
        let query = format!("SELECT {} FROM {} WHERE id = $1", SELECT_COLUMNS, TABLE_NAME);
        let ticket = sqlx::query_as::<_, SupportTicket>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ticket)
    }

    async fn create(&self, ticket: &SupportTicket) -> AppResult<SupportTicket> {
        let query = format!(
            "INSERT INTO {} (owner_id, assigned_to, title, description, status, created_at, \
             updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let created = sqlx::query_as::<_, SupportTicket>(&query)
            .bind(ticket.owner_id)
            .bind(ticket.assigned_to)
            .bind(&ticket.title)
            .bind(&ticket.description)
            .bind(ticket.status)
            .bind(ticket.created_at)
            .bind(ticket.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update(&self, ticket: &SupportTicket) -> AppResult<SupportTicket> {
        let query = format!(
            "UPDATE {} SET assigned_to = $2, title = $3, description = $4, status = $5, \
             updated_at = $6 WHERE id = $1 RETURNING {}",
            TABLE_NAME, SELECT_COLUMNS
        );
        let updated = sqlx::query_as::<_, SupportTicket>(&query)
            .bind(ticket.id)
            .bind(ticket.assigned_to)
            .bind(&ticket.title)
            .bind(&ticket.description)
            .bind(ticket.status)
            .bind(ticket.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete(&self, id: SupportTicketId) -> AppResult<bool> {
        let query = format!("DELETE FROM {} WHERE id = $1", TABLE_NAME);
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn list_for_ticket(&self, ticket_id: SupportTicketId) -> AppResult<Vec<Chat>> {
        let query = format!(
            "SELECT {} FROM chats WHERE ticket_id = $1 ORDER BY created_at, id",
            CHAT_COLUMNS
        );
        let messages = sqlx::query_as::<_, Chat>(&query)
            .bind(ticket_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(messages)
    }

    async fn create(
        &self,
        ticket_id: SupportTicketId,
        sender_id: UserId,
        message: String,
    ) -> AppResult<Chat> {
        let query = format!(
            "INSERT INTO chats (ticket_id, sender_id, message, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            CHAT_COLUMNS
        );
        let chat = sqlx::query_as::<_, Chat>(&query)
            .bind(ticket_id)
            .bind(sender_id)
            .bind(message)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Ok(chat)
    }
}
