//! Provider collaborators: the external LLM and video-model SDKs are out of
//! scope (§1); these modules expose trait boundaries plus default HTTP
//! implementations.

pub mod llm;
pub mod video;

pub use llm::{ChatMessage, ChatRequest, HttpLlmClient, LlmClient, SamplingParams};
pub use video::{HttpVideoModelClient, VideoModelClient, VideoSynthesisRequest, VideoSynthesisResult};
