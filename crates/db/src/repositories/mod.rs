use thiserror::Error;

use meesaya_core::errors::ApplicationError;

pub mod catalog;
pub mod history;
pub mod knowledge;
pub mod memory;

pub use catalog::SqlCatalogRepository;
pub use history::SqlConversationHistory;
pub use knowledge::SqlKnowledgeBase;
pub use memory::{InMemoryConversationHistory, InMemoryKnowledgeBase};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::Persistence(error.to_string())
    }
}

pub(crate) fn decode<T>(result: Result<T, sqlx::Error>) -> Result<T, RepositoryError> {
    result.map_err(|e| RepositoryError::Decode(e.to_string()))
}

/// Escapes `%`, `_` and the escape character itself for use in `LIKE ... ESCAPE '\'`.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
