// src/poll.rs
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::models::{Choice, Question, Voter};

/// How many questions the index shows.
pub const INDEX_LIMIT: i64 = 5;

/// Published questions, newest first.
pub async fn latest_published(
    pool: &SqlitePool,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question_text, publish_date
        FROM questions
        WHERE publish_date <= ?
        ORDER BY publish_date DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// A question by id, but only once it is published. Unpublished questions
/// come back as `None`, same as missing ones.
pub async fn published_question(
    pool: &SqlitePool,
    id: i64,
    now: DateTime<Utc>,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question_text, publish_date
        FROM questions
        WHERE id = ? AND publish_date <= ?
        "#,
    )
    .bind(id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// A question by id regardless of its publish date.
pub async fn question(pool: &SqlitePool, id: i64) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>("SELECT id, question_text, publish_date FROM questions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn choices_for(pool: &SqlitePool, question_id: i64) -> Result<Vec<Choice>, sqlx::Error> {
    sqlx::query_as::<_, Choice>(
        r#"
        SELECT id, question_id, choice_text, votes
        FROM choices
        WHERE question_id = ?
        ORDER BY id
        "#,
    )
    .bind(question_id)
    .fetch_all(pool)
    .await
}

pub async fn choice(pool: &SqlitePool, id: i64) -> Result<Option<Choice>, sqlx::Error> {
    sqlx::query_as::<_, Choice>("SELECT id, question_id, choice_text, votes FROM choices WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Records one vote: bumps the counter in SQL and stores the voter, both in
/// one transaction. Returns `false` when `choice_id` does not belong to
/// `question_id`, in which case nothing is written.
pub async fn vote(
    pool: &SqlitePool,
    question_id: i64,
    choice_id: i64,
    voter_name: &str,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    // Increment in the database; never load-add-store.
    let updated = sqlx::query(
        r#"
        UPDATE choices
        SET votes = votes + 1
        WHERE id = ? AND question_id = ?
        "#,
    )
    .bind(choice_id)
    .bind(question_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("INSERT INTO voters (choice_id, voter_name) VALUES (?, ?)")
        .bind(choice_id)
        .bind(voter_name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    debug!(question_id, choice_id, "Vote recorded");

    Ok(true)
}

/// Voters of a choice in the order they voted.
pub async fn voters_for(pool: &SqlitePool, choice_id: i64) -> Result<Vec<Voter>, sqlx::Error> {
    sqlx::query_as::<_, Voter>(
        r#"
        SELECT id, choice_id, voter_name
        FROM voters
        WHERE choice_id = ?
        ORDER BY id
        "#,
    )
    .bind(choice_id)
    .fetch_all(pool)
    .await
}

pub async fn create_question(
    pool: &SqlitePool,
    question_text: &str,
    publish_date: DateTime<Utc>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (question_text, publish_date)
        VALUES (?, ?)
        RETURNING id, question_text, publish_date
        "#,
    )
    .bind(question_text)
    .bind(publish_date)
    .fetch_one(pool)
    .await
}

pub async fn add_choice(
    pool: &SqlitePool,
    question_id: i64,
    choice_text: &str,
) -> Result<Choice, sqlx::Error> {
    sqlx::query_as::<_, Choice>(
        r#"
        INSERT INTO choices (question_id, choice_text)
        VALUES (?, ?)
        RETURNING id, question_id, choice_text, votes
        "#,
    )
    .bind(question_id)
    .bind(choice_text)
    .fetch_one(pool)
    .await
}

/// Deletes a question along with its choices and their voters.
pub async fn delete_question(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let deleted = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(deleted.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{config::Config, db::memory_pool};

    async fn question_in(pool: &SqlitePool, text: &str, days: i64) -> Question {
        create_question(pool, text, Utc::now() + Duration::days(days))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn latest_published_skips_future_and_orders_newest_first() {
        let pool = memory_pool().await.unwrap();
        question_in(&pool, "Past question 1.", -30).await;
        question_in(&pool, "Past question 2.", -25).await;
        question_in(&pool, "Future question.", 30).await;

        let questions = latest_published(&pool, Utc::now(), INDEX_LIMIT).await.unwrap();
        let texts: Vec<_> = questions.iter().map(|q| q.question_text.as_str()).collect();
        assert_eq!(texts, ["Past question 2.", "Past question 1."]);
    }

    #[tokio::test]
    async fn latest_published_is_capped() {
        let pool = memory_pool().await.unwrap();
        for day in 1..=7 {
            question_in(&pool, &format!("Question {day}"), -day).await;
        }

        let questions = latest_published(&pool, Utc::now(), INDEX_LIMIT).await.unwrap();
        assert_eq!(questions.len(), 5);
        assert_eq!(questions[0].question_text, "Question 1");
        assert_eq!(questions[4].question_text, "Question 5");
    }

    #[tokio::test]
    async fn future_question_is_hidden() {
        let pool = memory_pool().await.unwrap();
        let future = question_in(&pool, "Future question.", 30).await;
        let past = question_in(&pool, "Past question.", -30).await;

        let now = Utc::now();
        assert!(published_question(&pool, future.id, now).await.unwrap().is_none());
        let found = published_question(&pool, past.id, now).await.unwrap().unwrap();
        assert_eq!(found.id, past.id);
        assert_eq!(found.question_text, "Past question.");
        assert!(published_question(&pool, 999, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn vote_increments_only_the_selected_choice() {
        let pool = memory_pool().await.unwrap();
        let question = question_in(&pool, "Tea or coffee?", -1).await;
        let tea = add_choice(&pool, question.id, "Tea").await.unwrap();
        let coffee = add_choice(&pool, question.id, "Coffee").await.unwrap();

        assert!(vote(&pool, question.id, tea.id, "Ada").await.unwrap());

        let choices = choices_for(&pool, question.id).await.unwrap();
        assert_eq!(choices[0].votes, 1);
        assert_eq!(choices[1].votes, 0);
        assert_eq!(choices[1].id, coffee.id);
        let voters = voters_for(&pool, tea.id).await.unwrap();
        assert_eq!(voters.len(), 1);
        assert_eq!(voters[0].choice_id, tea.id);
        assert_eq!(voters[0].voter_name, "Ada");
    }

    #[tokio::test]
    async fn vote_for_foreign_choice_writes_nothing() {
        let pool = memory_pool().await.unwrap();
        let first = question_in(&pool, "First?", -1).await;
        let second = question_in(&pool, "Second?", -1).await;
        let other = add_choice(&pool, second.id, "Elsewhere").await.unwrap();

        assert!(!vote(&pool, first.id, other.id, "Ada").await.unwrap());
        assert_eq!(choice(&pool, other.id).await.unwrap().unwrap().votes, 0);
        assert!(voters_for(&pool, other.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn question_lookup_ignores_publish_date() {
        let pool = memory_pool().await.unwrap();
        let future = question_in(&pool, "Future question.", 30).await;

        assert_eq!(question(&pool, future.id).await.unwrap().unwrap().id, future.id);
        assert!(question(&pool, future.id + 1).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_votes_are_not_lost() {
        // A file database so several connections really write at once.
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database_url: format!("sqlite://{}?mode=rwc", dir.path().join("polls.db").display()),
            host: "127.0.0.1".to_string(),
            port: 0,
            max_connections: 8,
        };
        let pool = crate::db::create_pool(&config).await.unwrap();

        let question = question_in(&pool, "Busy poll?", -1).await;
        let yes = add_choice(&pool, question.id, "Yes").await.unwrap();
        let no = add_choice(&pool, question.id, "No").await.unwrap();

        let (question_id, choice_id) = (question.id, yes.id);
        let handles: Vec<_> = (0..50)
            .map(|n| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    for _ in 0..n % 4 {
                        tokio::task::yield_now().await;
                    }
                    vote(&pool, question_id, choice_id, &format!("voter {n}")).await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        assert_eq!(choice(&pool, yes.id).await.unwrap().unwrap().votes, 50);
        assert_eq!(choice(&pool, no.id).await.unwrap().unwrap().votes, 0);
        assert_eq!(voters_for(&pool, yes.id).await.unwrap().len(), 50);

        pool.close().await;
    }

    #[tokio::test]
    async fn voters_keep_insertion_order() {
        let pool = memory_pool().await.unwrap();
        let question = question_in(&pool, "Order?", -1).await;
        let pick = add_choice(&pool, question.id, "Pick").await.unwrap();
        for name in ["Zed", "Ada", "Mia"] {
            vote(&pool, question.id, pick.id, name).await.unwrap();
        }

        let names: Vec<_> = voters_for(&pool, pick.id)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.voter_name)
            .collect();
        assert_eq!(names, ["Zed", "Ada", "Mia"]);
    }

    #[tokio::test]
    async fn deleting_a_question_cascades() {
        let pool = memory_pool().await.unwrap();
        let question = question_in(&pool, "Doomed?", -1).await;
        let pick = add_choice(&pool, question.id, "Pick").await.unwrap();
        vote(&pool, question.id, pick.id, "Ada").await.unwrap();

        assert!(delete_question(&pool, question.id).await.unwrap());
        assert!(choice(&pool, pick.id).await.unwrap().is_none());
        assert!(voters_for(&pool, pick.id).await.unwrap().is_empty());
        assert!(!delete_question(&pool, question.id).await.unwrap());
    }
}
