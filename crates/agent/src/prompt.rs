use meesaya_core::domain::conversation::ConversationTurn;

pub const SYSTEM_PROMPT: &str = r#"You are MeeSaya (မီးဆရာ), a professional Solar Consultant.
Speak ONLY in Burmese.
Tone: Friendly, Expert (Male Engineer Persona).

**INSTRUCTIONS:**
- Use the provided CONTEXT to answer market/troubleshooting questions.
- If user gives watts/appliances, output JSON: `{"tool": "calculate", "watts": 2000, "hours": 4, "housing": "home"}`.
- If the user has no space or permission for solar panels, add `"no_solar": true` to the calculate JSON.
- If user asks for product price/stock, output JSON: `{"tool": "search", "query": "Growatt"}`.
- Otherwise, reply normally.
"#;

pub fn knowledge_turn(context: &str) -> ConversationTurn {
    ConversationTurn::system(format!(
        "CONTEXT (FROM KNOWLEDGE BASE):\n{context}\n\nUse this context to answer if relevant."
    ))
}

pub fn tool_result_turn(output: &str) -> ConversationTurn {
    ConversationTurn::system(format!(
        "TOOL RESULT: {output}. Now write the final helpful response in Burmese."
    ))
}

/// Persona, replayed history, optional knowledge context, then the new user turn.
pub fn assemble_prompt(
    history: Vec<ConversationTurn>,
    context: Option<&str>,
    user_text: &str,
) -> Vec<ConversationTurn> {
    let mut turns = Vec::with_capacity(history.len() + 3);
    turns.push(ConversationTurn::system(SYSTEM_PROMPT));
    turns.extend(history);
    if let Some(context) = context {
        turns.push(knowledge_turn(context));
    }
    turns.push(ConversationTurn::user(user_text));
    turns
}

#[cfg(test)]
mod tests {
    use meesaya_core::domain::conversation::{ConversationTurn, Role};

    use super::{assemble_prompt, tool_result_turn, SYSTEM_PROMPT};

    #[test]
    fn prompt_orders_persona_history_context_then_user() {
        let history = vec![ConversationTurn::user("hello"), ConversationTurn::assistant("hi")];

        let turns = assemble_prompt(history, Some("[Context: Grid] 4 on 4 off"), "price?");

        let roles: Vec<Role> = turns.iter().map(|turn| turn.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::System, Role::User]
        );
        assert_eq!(turns[0].content, SYSTEM_PROMPT);
        assert!(turns[3].content.starts_with("CONTEXT (FROM KNOWLEDGE BASE):\n[Context: Grid]"));
        assert_eq!(turns[4].content, "price?");
    }

    #[test]
    fn prompt_without_context_skips_context_turn() {
        let turns = assemble_prompt(Vec::new(), None, "hi");

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1], ConversationTurn::user("hi"));
    }

    #[test]
    fn tool_result_turn_asks_for_final_answer() {
        let turn = tool_result_turn("Error: too big");

        assert_eq!(turn.role, Role::System);
        assert_eq!(
            turn.content,
            "TOOL RESULT: Error: too big. Now write the final helpful response in Burmese."
        );
    }
}
