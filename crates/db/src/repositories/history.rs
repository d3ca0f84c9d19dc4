use async_trait::async_trait;
use sqlx::Row;

use meesaya_core::conversation::ConversationHistory;
use meesaya_core::domain::conversation::{ConversationId, ConversationTurn, Role};
use meesaya_core::errors::ApplicationError;

use super::{decode, RepositoryError};
use crate::DbPool;

pub struct SqlConversationHistory {
    pool: DbPool,
}

impl SqlConversationHistory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationHistory for SqlConversationHistory {
    async fn recent_turns(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<ConversationTurn>, ApplicationError> {
        let rows = sqlx::query(
            "SELECT role, content FROM chat_history
             WHERE user_id = ?
             ORDER BY id DESC LIMIT ?",
        )
        .bind(&conversation_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        let mut turns = rows
            .iter()
            .map(|row| {
                let role: String = decode(row.try_get("role"))?;
                let content: String = decode(row.try_get("content"))?;
                Ok(ConversationTurn::new(Role::from_stored(&role), content))
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        turns.reverse();
        Ok(turns)
    }

    async fn append_turn(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<(), ApplicationError> {
        sqlx::query("INSERT INTO chat_history (user_id, role, content) VALUES (?, ?, ?)")
            .bind(&conversation_id.0)
            .bind(role.as_str())
            .bind(content)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use meesaya_core::conversation::ConversationHistory;
    use meesaya_core::domain::conversation::{ConversationId, ConversationTurn, Role};

    use super::SqlConversationHistory;
    use crate::{connect_with_settings, migrations};

    async fn history() -> SqlConversationHistory {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlConversationHistory::new(pool)
    }

    #[tokio::test]
    async fn recent_turns_returns_latest_window_oldest_first() {
        let history = history().await;
        let chat = ConversationId("42".to_string());

        for index in 0..8 {
            let role = if index % 2 == 0 { Role::User } else { Role::Assistant };
            history.append_turn(&chat, role, &format!("turn {index}")).await.expect("append");
        }

        let turns = history.recent_turns(&chat, 6).await.expect("recent");

        assert_eq!(turns.len(), 6);
        assert_eq!(turns.first(), Some(&ConversationTurn::user("turn 2")));
        assert_eq!(turns.last(), Some(&ConversationTurn::assistant("turn 7")));
    }

    #[tokio::test]
    async fn conversations_are_isolated_by_id() {
        let history = history().await;
        let alice = ConversationId("100".to_string());
        let bob = ConversationId("200".to_string());

        history.append_turn(&alice, Role::User, "hello").await.expect("append");

        assert!(history.recent_turns(&bob, 6).await.expect("recent").is_empty());
        assert_eq!(history.recent_turns(&alice, 6).await.expect("recent").len(), 1);
    }

    #[tokio::test]
    async fn system_rows_replay_as_assistant() {
        let history = history().await;
        let chat = ConversationId("7".to_string());

        history.append_turn(&chat, Role::System, "note").await.expect("append");

        let turns = history.recent_turns(&chat, 6).await.expect("recent");
        assert_eq!(turns, vec![ConversationTurn::assistant("note")]);
    }
}
