//! Shared domain types that cross component boundaries.
//!
//! These are the wire/record shapes owned by a Generation (§3 of the spec):
//! reference images, story, scenes, cohesion report, agent interactions,
//! progress events and synthesized clips. Every component that needs to
//! pass structured data to another component does so with one of these
//! types rather than an ad hoc map.

mod cohesion;
mod generation;
mod interaction;
mod progress;
mod scene;
mod story;
mod video;

pub use cohesion::{CohesionReport, PairwiseTransition, TransitionKind};
pub use generation::{Generation, GenerationStatus, ReferenceImage, Submission};
pub use interaction::{AgentInteraction, AgentRole, InteractionMetadata, InteractionType};
pub use progress::{ProgressEvent, ProgressStep, ProgressStatus};
pub use scene::{Scene, SceneStatus, VideoPromptParameters};
pub use story::{Story, StoryStatus};
pub use video::SceneVideo;
