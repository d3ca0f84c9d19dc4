use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Stored roles replay as either `user` or `assistant`.
    pub fn from_stored(raw: &str) -> Self {
        if raw == "user" {
            Self::User
        } else {
            Self::Assistant
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConversationTurn, Role};

    #[test]
    fn stored_roles_collapse_to_user_or_assistant() {
        assert_eq!(Role::from_stored("user"), Role::User);
        assert_eq!(Role::from_stored("assistant"), Role::Assistant);
        assert_eq!(Role::from_stored("system"), Role::Assistant);
    }

    #[test]
    fn turns_serialize_with_lowercase_roles() {
        let turn = ConversationTurn::system("persona");
        let json = serde_json::to_value(&turn).expect("serialize turn");

        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "persona");
    }
}
