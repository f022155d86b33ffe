// src/handlers.rs
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, ser::PrettyFormatter, Serializer, Value};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{
    error::AppError,
    models::{Choice, Question, VoteForm, VoterEntry, VotersQuery},
    poll, templates,
};

/// Up to five published questions, newest first
pub async fn index(State(pool): State<SqlitePool>) -> Result<Html<String>, AppError> {
    let now = Utc::now();
    let questions = poll::latest_published(&pool, now, poll::INDEX_LIMIT).await?;

    Ok(Html(templates::index(&questions, now)))
}

/// Voting form for one published question
pub async fn detail(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let question = published_or_404(&pool, &id).await?;
    let choices = poll::choices_for(&pool, question.id).await?;

    Ok(Html(templates::detail(&question, &choices, None)))
}

/// Vote tallies for one published question
pub async fn results(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let question = published_or_404(&pool, &id).await?;
    let choices = poll::choices_for(&pool, question.id).await?;

    Ok(Html(templates::results(&question, &choices)))
}

/// Handle a vote submission
pub async fn vote(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
    Form(form): Form<VoteForm>,
) -> Result<Response, AppError> {
    let question = question_or_404(&pool, &id).await?;
    let choices = poll::choices_for(&pool, question.id).await?;

    let selected = form
        .choice_id()
        .and_then(|choice_id| choices.iter().find(|choice| choice.id == choice_id));

    let Some(selected) = selected else {
        debug!(question_id = question.id, choice = ?form.choice, "Vote without a valid choice");
        return Ok(rerender(&question, &choices, templates::NO_CHOICE_SELECTED));
    };

    let Some(voter_name) = form.voter_name() else {
        debug!(question_id = question.id, "Vote without a name");
        return Ok(rerender(&question, &choices, templates::NO_NAME_ENTERED));
    };

    if !poll::vote(&pool, question.id, selected.id, voter_name).await? {
        // The choice vanished between the lookup and the update.
        return Ok(rerender(&question, &choices, templates::NO_CHOICE_SELECTED));
    }

    info!(question_id = question.id, choice_id = selected.id, "Vote recorded");
    Ok(Redirect::to(&format!("/polls/{}/results/", question.id)).into_response())
}

/// Export the voters of a choice as JSON
pub async fn voters(
    State(pool): State<SqlitePool>,
    Query(query): Query<VotersQuery>,
) -> Result<Json<Value>, AppError> {
    let choice_id = query
        .choice_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::BadRequest("choice_id must be an integer".to_string()))?;

    if poll::choice(&pool, choice_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let voters: Vec<VoterEntry> = poll::voters_for(&pool, choice_id)
        .await?
        .into_iter()
        .map(VoterEntry::from)
        .collect();

    Ok(Json(json!({ "voters_list": voters_list(&voters)? })))
}

pub async fn health() -> &'static str {
    "ok"
}

async fn published_or_404(pool: &SqlitePool, raw_id: &str) -> Result<Question, AppError> {
    let id: i64 = raw_id.parse().map_err(|_| AppError::NotFound)?;

    poll::published_question(pool, id, Utc::now())
        .await?
        .ok_or(AppError::NotFound)
}

/// Voting only needs the question to exist; the publish filter belongs to
/// the read views.
async fn question_or_404(pool: &SqlitePool, raw_id: &str) -> Result<Question, AppError> {
    let id: i64 = raw_id.parse().map_err(|_| AppError::NotFound)?;

    poll::question(pool, id).await?.ok_or(AppError::NotFound)
}

fn rerender(question: &Question, choices: &[Choice], message: &str) -> Response {
    Html(templates::detail(question, choices, Some(message))).into_response()
}

/// The export nests the voters as a JSON string, indented by four spaces.
fn voters_list(voters: &[VoterEntry]) -> Result<String, AppError> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    voters.serialize(&mut serializer)?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
