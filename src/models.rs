// src/models.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A poll prompt. Only visible once `publish_date` has passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub publish_date: DateTime<Utc>,
}

impl Question {
    /// True when the question went live within the day before `now`.
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.publish_date && self.publish_date <= now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub choice_text: String,
    pub votes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Voter {
    pub id: i64,
    pub choice_id: i64,
    pub voter_name: String,
}

/// Row shape of the voter export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoterEntry {
    pub voter_name: String,
}

impl From<Voter> for VoterEntry {
    fn from(voter: Voter) -> Self {
        Self {
            voter_name: voter.voter_name,
        }
    }
}

/// Body of `POST /polls/{id}/vote/`. Both fields come from an untrusted form,
/// so either may be absent or garbage.
#[derive(Debug, Default, Deserialize)]
pub struct VoteForm {
    pub choice: Option<String>,
    pub name: Option<String>,
}

impl VoteForm {
    pub fn choice_id(&self) -> Option<i64> {
        self.choice.as_deref()?.trim().parse().ok()
    }

    /// The voter name exactly as submitted. Only an absent or empty field
    /// counts as missing; surrounding whitespace is kept.
    pub fn voter_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct VotersQuery {
    pub choice_id: Option<String>,
}
