use async_trait::async_trait;
use sqlx::Row;
use tracing::debug;

use meesaya_core::conversation::KnowledgeBase;
use meesaya_core::errors::ApplicationError;

use super::{decode, like_pattern, RepositoryError};
use crate::DbPool;

const CONTEXT_LIMIT: i64 = 2;
const MIN_KEYWORD_CHARS: usize = 4;

pub struct SqlKnowledgeBase {
    pool: DbPool,
}

impl SqlKnowledgeBase {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn phrase_matches(&self, text: &str) -> Result<Vec<(String, String)>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT category, content FROM knowledge_base
             WHERE content LIKE ?1 ESCAPE '\\' OR category LIKE ?1 ESCAPE '\\'
             ORDER BY id ASC LIMIT ?2",
        )
        .bind(like_pattern(text))
        .bind(CONTEXT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn keyword_matches(
        &self,
        keywords: &[&str],
    ) -> Result<Vec<(String, String)>, RepositoryError> {
        let clause = vec!["content LIKE ? ESCAPE '\\'"; keywords.len()].join(" OR ");
        let sql = format!(
            "SELECT category, content FROM knowledge_base WHERE {clause} ORDER BY id ASC LIMIT ?"
        );

        let mut query = sqlx::query(&sql);
        for keyword in keywords {
            query = query.bind(like_pattern(keyword));
        }
        let rows = query.bind(CONTEXT_LIMIT).fetch_all(&self.pool).await?;

        rows.iter().map(entry_from_row).collect()
    }
}

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<(String, String), RepositoryError> {
    Ok((decode(row.try_get("category"))?, decode(row.try_get("content"))?))
}

/// Words long enough to be worth matching on their own.
pub fn keywords(text: &str) -> Vec<&str> {
    text.split_whitespace().filter(|word| word.chars().count() >= MIN_KEYWORD_CHARS).collect()
}

pub fn render_context(entries: &[(String, String)]) -> Option<String> {
    if entries.is_empty() {
        return None;
    }
    let lines: Vec<String> = entries
        .iter()
        .map(|(category, content)| format!("[Context: {category}] {content}"))
        .collect();
    Some(lines.join("\n"))
}

#[async_trait]
impl KnowledgeBase for SqlKnowledgeBase {
    async fn search_context(&self, text: &str) -> Result<Option<String>, ApplicationError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let mut entries = self.phrase_matches(text).await?;
        if entries.is_empty() && text.contains(char::is_whitespace) {
            let words = keywords(text);
            if !words.is_empty() {
                entries = self.keyword_matches(&words).await?;
            }
        }

        debug!(event_name = "knowledge.search", matches = entries.len(), "knowledge lookup finished");
        Ok(render_context(&entries))
    }
}
