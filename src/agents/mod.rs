//! Agent wrappers (§4.7, §9): each of the nine roles is a value carrying a
//! system prompt, sampling parameters, and an output parser, dispatched
//! through the shared `AgentContext` rather than through an inheritance
//! hierarchy — the source's nine roles share this shape with no
//! inheritance of their own.
//!
//! Grounded on the teacher's `routes::chat::chat_handler` call shape (build
//! request, call provider, handle the one response) generalized into a
//! reusable completion-plus-structured-retry helper shared by every critic
//! and the cohesor.

pub mod cohesion;
pub mod enhance;
pub mod sanitizer;
pub mod scene;
pub mod story;

pub use cohesion::run_scene_cohesor;
pub use enhance::{run_scene_aligner, run_scene_enhancer};
pub use sanitizer::run_appearance_sanitizer;
pub use scene::{run_scene_count, run_scene_critic, run_scene_writer};
pub use story::{run_story_critic, run_story_director};

use crate::conversation::ConversationRecorder;
use crate::domain::{AgentInteraction, AgentRole, InteractionMetadata, InteractionType};
use crate::error::CoreError;
use crate::progress_bus::{BusEvent, ProgressBus};
use crate::providers::llm::{ChatMessage, ChatRequest, LlmClient, SamplingParams};
use crate::retry::RetryPolicy;
use std::sync::Arc;
use uuid::Uuid;

/// Everything an agent wrapper needs to call the LLM and publish its
/// interactions, bundled so each wrapper takes one parameter instead of
/// four (§9 "RunAgent(config, inputs) -> output").
#[derive(Clone)]
pub struct AgentContext {
    pub llm: Arc<dyn LlmClient>,
    pub progress_bus: ProgressBus,
    pub recorder: ConversationRecorder,
    pub generation_id: Uuid,
    pub model: String,
}

impl AgentContext {
    pub async fn record(
        &self,
        role: AgentRole,
        interaction_type: InteractionType,
        content: impl Into<String>,
        metadata: InteractionMetadata,
    ) {
        let interaction = AgentInteraction::new(role, interaction_type, content, metadata);
        self.recorder.append(self.generation_id, interaction.clone()).await;
        self.progress_bus.publish(self.generation_id, BusEvent::Interaction(interaction)).await;
    }
}

/// Structured critic/cohesor output (§3 Story/Scene, §4.7 point 4). One
/// parse point, one type — replacing the source's loosely structured JSON.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CriticOutput {
    pub score: u32,
    pub status: String,
    pub critique: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub priority_fixes: Vec<String>,
}

const SCHEMA_REMINDER: &str = "\n\nYour previous response could not be parsed. Respond with ONLY a single JSON object matching the required schema, no surrounding prose or markdown fences.";

pub(crate) fn critic_schema(status_values: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "score": { "type": "integer", "minimum": 0, "maximum": 100 },
            "status": { "type": "string", "enum": status_values },
            "critique": { "type": "string" },
            "strengths": { "type": "array", "items": { "type": "string" } },
            "improvements": { "type": "array", "items": { "type": "string" } },
            "priority_fixes": { "type": "array", "items": { "type": "string" } },
        },
        "required": ["score", "status", "critique"],
    })
}

/// Extract the first top-level `{...}` span from `raw`, tolerating markdown
/// fences and leading/trailing prose a creative-temperature model may add
/// around an otherwise valid JSON body.
pub(crate) fn extract_json_object(raw: &str) -> Result<&str, CoreError> {
    let start = raw.find('{').ok_or_else(|| CoreError::AgentMalformed("no JSON object found in response".into()))?;
    let end = raw.rfind('}').ok_or_else(|| CoreError::AgentMalformed("no JSON object found in response".into()))?;
    if end < start {
        return Err(CoreError::AgentMalformed("malformed JSON object bounds".into()));
    }
    Ok(&raw[start..=end])
}

pub(crate) fn parse_critic_output(raw: &str) -> Result<CriticOutput, CoreError> {
    let json_str = extract_json_object(raw)?;
    serde_json::from_str(json_str).map_err(|e| CoreError::AgentMalformed(format!("critic output parse error: {e}")))
}

/// Runs a structured (critic-shaped) completion, retrying up to
/// `RetryPolicy::parse_default().max_attempts` times with a schema-reminder
/// suffix on malformed output (§4.7, §9 "Retry policy"). Transient network
/// failures on each individual call are retried separately under
/// `RetryPolicy::network_default()`.
pub(crate) async fn complete_structured<T>(
    ctx: &AgentContext,
    system_prompt: &str,
    base_user: &str,
    schema: serde_json::Value,
    parse: impl Fn(&str) -> Result<T, CoreError>,
) -> Result<T, CoreError> {
    let network_policy = RetryPolicy::network_default();
    let parse_policy = RetryPolicy::parse_default();
    let mut last_err = None;

    for attempt in 0..parse_policy.max_attempts {
        let mut content = base_user.to_string();
        if attempt > 0 {
            content.push_str(SCHEMA_REMINDER);
        }
        let request = ChatRequest {
            model: ctx.model.clone(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(content)],
            sampling: SamplingParams::critic(schema.clone()),
        };

        let raw = network_policy
            .retry(|_| {
                let request = request.clone();
                let llm = ctx.llm.clone();
                async move { llm.complete(request).await }
            })
            .await?;

        match parse(&raw) {
            Ok(value) => return Ok(value),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| CoreError::AgentMalformed("parse retry budget exhausted".into())))
}

/// Runs a free-form (creative-temperature) completion with network-level
/// retry only; creatives have no parse step to retry.
pub(crate) async fn complete_creative(
    ctx: &AgentContext,
    system_prompt: &str,
    user_message: ChatMessage,
) -> Result<String, CoreError> {
    let request = ChatRequest {
        model: ctx.model.clone(),
        messages: vec![ChatMessage::system(system_prompt), user_message],
        sampling: SamplingParams::creative(),
    };
    RetryPolicy::network_default()
        .retry(|_| {
            let request = request.clone();
            let llm = ctx.llm.clone();
            async move { llm.complete(request).await }
        })
        .await
}
