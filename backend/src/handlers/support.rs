use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        support_ticket::{
            Chat, ChatQuery, CreateTicketRequest, PostChatRequest, SupportTicket, TicketStatus,
            UpdateTicketRequest,
        },
        user::{SearchQuery, User},
    },
    state::AppState,
    types::SupportTicketId,
    validation::ValidatedJson,
};

pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SupportTicket>>, AppError> {
    let participant = (!user.is_staff()).then_some(user.id);
    Ok(Json(state.repos.tickets.list(participant, query.term()).await?))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<SupportTicketId>,
) -> Result<Json<SupportTicket>, AppError> {
    Ok(Json(visible_ticket(&state, &user, id).await?))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(payload): ValidatedJson<CreateTicketRequest>,
) -> Result<(StatusCode, Json<SupportTicket>), AppError> {
    let ticket = SupportTicket::new(
        user.id,
        payload.title.trim().to_string(),
        payload.description.trim().to_string(),
    );
    let created = state.repos.tickets.create(&ticket).await?;
    tracing::info!(ticket_id = %created.id, user_id = %user.id, "support ticket opened");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<SupportTicketId>,
    ValidatedJson(payload): ValidatedJson<UpdateTicketRequest>,
) -> Result<Json<SupportTicket>, AppError> {
    let mut ticket = visible_ticket(&state, &user, id).await?;

    if payload.touches_owner_fields() && !user.can_act_for(ticket.owner_id) {
        return Err(AppError::Forbidden(
            "Only the ticket owner may edit title or description".into(),
        ));
    }
    if payload.touches_staff_fields() && !user.is_staff() {
        return Err(AppError::Forbidden(
            "Only staff may assign tickets or change their status".into(),
        ));
    }

    if let Some(assignee_id) = payload.assigned_to {
        let assignee = state
            .repos
            .users
            .find_by_id(assignee_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Assignee does not exist".into()))?;
        if !assignee.is_staff() {
            return Err(AppError::BadRequest("Tickets can only be assigned to staff".into()));
        }
        ticket.assigned_to = Some(assignee.id);
    }
    if let Some(title) = payload.title {
        ticket.title = title.trim().to_string();
    }
    if let Some(description) = payload.description {
        ticket.description = description.trim().to_string();
    }
    if let Some(status) = payload.status {
        ticket.status = status;
    }
    ticket.updated_at = Utc::now();

    Ok(Json(state.repos.tickets.update(&ticket).await?))
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<SupportTicketId>,
) -> Result<StatusCode, AppError> {
    let ticket = visible_ticket(&state, &user, id).await?;
    if !user.can_act_for(ticket.owner_id) {
        return Err(AppError::Forbidden("Forbidden".into()));
    }
    state.repos.tickets.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_chats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ChatQuery>,
) -> Result<Json<Vec<Chat>>, AppError> {
    visible_ticket(&state, &user, query.ticket_id).await?;
    Ok(Json(state.repos.chats.list_for_ticket(query.ticket_id).await?))
}

pub async fn post_chat(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(payload): ValidatedJson<PostChatRequest>,
) -> Result<(StatusCode, Json<Chat>), AppError> {
    let ticket = visible_ticket(&state, &user, payload.ticket_id).await?;
    if ticket.status == TicketStatus::Closed {
        return Err(AppError::BadRequest("Ticket is closed".into()));
    }
    let chat = state
        .repos
        .chats
        .create(ticket.id, user.id, payload.message.trim().to_string())
        .await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

async fn visible_ticket(
    state: &AppState,
    user: &User,
    id: SupportTicketId,
) -> Result<SupportTicket, AppError> {
    let ticket = state
        .repos
        .tickets
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Support ticket not found".into()))?;
    if !ticket.is_visible_to(user) {
        return Err(AppError::Forbidden("Forbidden".into()));
    }
    Ok(ticket)
}
