//! Two-pass conversation handling for one inbound chat message.
//!
//! The first model pass either answers directly or asks for a tool. Tool
//! output is fed back for a second pass that explains it. Every collaborator
//! failure degrades to a fixed reply; nothing here returns an error.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use meesaya_core::config::AppConfig;
use meesaya_core::conversation::{ConversationHistory, KnowledgeBase};
use meesaya_core::domain::conversation::{ConversationId, ConversationTurn, Role};

use crate::llm::LlmClient;
use crate::messenger::OutboundMessenger;
use crate::prompt::{assemble_prompt, tool_result_turn};
use crate::tools::{extract_invocation, ToolDispatcher, ToolInvocation};

pub const FIRST_PASS_FAILURE_REPLY: &str = "System Error (AI Model). Please try again later.";
pub const CALCULATING_NOTICE: &str = "🔍 တွက်ချက်နေပါသည်... (Calculating...)";
const SECOND_PASS_FALLBACK_PREFIX: &str = "Calculation done.\n";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    Start,
    FirstPass,
    ToolDetected,
    ToolExecuted,
    SecondPass,
    NoTool,
    Done,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConversationOutcome {
    pub correlation_id: String,
    pub reply: String,
    pub invocation: Option<ToolInvocation>,
    pub tool_output: Option<String>,
    pub trace: Vec<OrchestratorState>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrchestratorSettings {
    pub history_window: u32,
    pub first_pass_temperature: f32,
    pub second_pass_temperature: f32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self { history_window: 6, first_pass_temperature: 0.3, second_pass_temperature: 0.6 }
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            history_window: config.conversation.history_window,
            first_pass_temperature: config.llm.first_pass_temperature,
            second_pass_temperature: config.llm.second_pass_temperature,
        }
    }
}

pub struct ConversationOrchestrator {
    llm: Arc<dyn LlmClient>,
    dispatcher: ToolDispatcher,
    history: Arc<dyn ConversationHistory>,
    knowledge: Arc<dyn KnowledgeBase>,
    messenger: Arc<dyn OutboundMessenger>,
    settings: OrchestratorSettings,
}

impl ConversationOrchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        dispatcher: ToolDispatcher,
        history: Arc<dyn ConversationHistory>,
        knowledge: Arc<dyn KnowledgeBase>,
        messenger: Arc<dyn OutboundMessenger>,
    ) -> Self {
        Self {
            llm,
            dispatcher,
            history,
            knowledge,
            messenger,
            settings: OrchestratorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> OrchestratorSettings {
        self.settings
    }

    pub async fn handle_message(&self, chat: &ConversationId, text: &str) -> ConversationOutcome {
        let correlation_id = Uuid::new_v4().to_string();
        let mut trace = vec![OrchestratorState::Start];
        let mut invocation = None;
        let mut tool_output = None;

        self.typing(chat, &correlation_id).await;

        let (history, context) = tokio::join!(
            self.load_history(chat, &correlation_id),
            self.load_context(text, &correlation_id)
        );
        let mut turns = assemble_prompt(history, context.as_deref(), text);

        trace.push(OrchestratorState::FirstPass);
        let reply = match self.llm.generate(&turns, self.settings.first_pass_temperature).await {
            Err(error) => {
                warn!(
                    event_name = "conversation.first_pass_failed",
                    correlation_id = %correlation_id,
                    error = %error,
                    "first model pass failed"
                );
                FIRST_PASS_FAILURE_REPLY.to_string()
            }
            Ok(first_pass) => match extract_invocation(&first_pass) {
                None => {
                    trace.push(OrchestratorState::NoTool);
                    first_pass
                }
                Some(requested) => {
                    trace.push(OrchestratorState::ToolDetected);
                    match self.run_tool(chat, &requested, &correlation_id).await {
                        None => {
                            trace.push(OrchestratorState::NoTool);
                            first_pass
                        }
                        Some(output) => {
                            trace.push(OrchestratorState::ToolExecuted);
                            turns.push(ConversationTurn::assistant(requested.to_json()));
                            turns.push(tool_result_turn(&output));

                            trace.push(OrchestratorState::SecondPass);
                            let second_pass = self
                                .llm
                                .generate(&turns, self.settings.second_pass_temperature)
                                .await;
                            let reply = match second_pass {
                                Ok(explained) => explained,
                                Err(error) => {
                                    warn!(
                                        event_name = "conversation.second_pass_failed",
                                        correlation_id = %correlation_id,
                                        error = %error,
                                        "second model pass failed, replying with raw tool output"
                                    );
                                    format!("{SECOND_PASS_FALLBACK_PREFIX}{output}")
                                }
                            };
                            invocation = Some(requested);
                            tool_output = Some(output);
                            reply
                        }
                    }
                }
            },
        };

        trace.push(OrchestratorState::Done);
        self.persist(chat, text, &reply, &correlation_id).await;
        if let Err(error) = self.messenger.send_message(chat, &reply).await {
            warn!(
                event_name = "conversation.reply_undelivered",
                correlation_id = %correlation_id,
                error = %error,
                "failed to deliver reply"
            );
        }

        info!(
            event_name = "conversation.handled",
            correlation_id = %correlation_id,
            chat_id = %chat,
            tool = invocation.as_ref().map(ToolInvocation::name).unwrap_or("none"),
            "message handled"
        );
        ConversationOutcome { correlation_id, reply, invocation, tool_output, trace }
    }

    async fn typing(&self, chat: &ConversationId, correlation_id: &str) {
        if let Err(error) = self.messenger.send_typing(chat).await {
            warn!(
                event_name = "conversation.typing_failed",
                correlation_id = %correlation_id,
                error = %error,
                "failed to send typing indicator"
            );
        }
    }

    async fn load_history(
        &self,
        chat: &ConversationId,
        correlation_id: &str,
    ) -> Vec<ConversationTurn> {
        match self.history.recent_turns(chat, self.settings.history_window).await {
            Ok(turns) => turns,
            Err(error) => {
                warn!(
                    event_name = "conversation.history_unavailable",
                    correlation_id = %correlation_id,
                    error = %error,
                    "continuing without history"
                );
                Vec::new()
            }
        }
    }

    async fn load_context(&self, text: &str, correlation_id: &str) -> Option<String> {
        match self.knowledge.search_context(text).await {
            Ok(context) => context,
            Err(error) => {
                warn!(
                    event_name = "conversation.knowledge_unavailable",
                    correlation_id = %correlation_id,
                    error = %error,
                    "continuing without knowledge context"
                );
                None
            }
        }
    }

    /// `None` means the tool produced nothing usable.
    async fn run_tool(
        &self,
        chat: &ConversationId,
        invocation: &ToolInvocation,
        correlation_id: &str,
    ) -> Option<String> {
        if matches!(invocation, ToolInvocation::Calculate { .. }) {
            if let Err(error) = self.messenger.send_message(chat, CALCULATING_NOTICE).await {
                warn!(
                    event_name = "conversation.notice_failed",
                    correlation_id = %correlation_id,
                    error = %error,
                    "failed to send progress notice"
                );
            }
            self.typing(chat, correlation_id).await;
        }

        match self.dispatcher.dispatch(invocation).await {
            Ok(output) => Some(output),
            Err(error) => {
                warn!(
                    event_name = "conversation.tool_failed",
                    correlation_id = %correlation_id,
                    tool = invocation.name(),
                    error = %error,
                    "tool dispatch failed, using first-pass reply"
                );
                None
            }
        }
    }

    async fn persist(&self, chat: &ConversationId, text: &str, reply: &str, correlation_id: &str) {
        for (role, content) in [(Role::User, text), (Role::Assistant, reply)] {
            if let Err(error) = self.history.append_turn(chat, role, content).await {
                warn!(
                    event_name = "conversation.history_write_failed",
                    correlation_id = %correlation_id,
                    role = role.as_str(),
                    error = %error,
                    "failed to record turn"
                );
            }
        }
    }
}
