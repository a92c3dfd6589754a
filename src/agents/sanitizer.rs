//! Appearance Sanitizer (§4.2 Phase 3 item 3, §9 Open Question 3). Pure
//! local text transformation, no LLM call: strips physical-appearance
//! descriptors from an enhanced scene prompt so that reference images
//! remain the sole source of character identity for the video model.
//!
//! The curated token list is a fixed, centrally reviewed resource bundled
//! with the code (§9 Open Question 3), rather than the source's two
//! ad hoc, differently-cased lists.

use crate::domain::{AgentRole, InteractionMetadata, InteractionType};
use crate::progress_bus::{BusEvent, ProgressBus};
use crate::conversation::ConversationRecorder;
use uuid::Uuid;

/// Facial features, hair attributes, ethnicity markers, body descriptors,
/// age phrases, and explicit measurements of persons (§4.2 Phase 3 item 3).
/// Matched case-insensitively as whole words.
const APPEARANCE_TOKENS: &[&str] = &[
    // facial features
    "almond-shaped eyes", "blue eyes", "green eyes", "brown eyes", "hazel eyes", "piercing eyes",
    "chiseled jaw", "strong jawline", "high cheekbones", "button nose", "aquiline nose", "full lips",
    "thin lips", "freckles", "dimples", "arched eyebrows",
    // hair
    "blonde hair", "brunette hair", "red hair", "black hair", "gray hair", "grey hair", "curly hair",
    "wavy hair", "straight hair", "long hair", "short hair", "bald", "ponytail", "braided hair",
    // ethnicity markers
    "caucasian", "asian", "african american", "hispanic", "latino", "latina", "middle eastern",
    "south asian", "east asian",
    // body descriptors
    "athletic build", "slender frame", "muscular build", "petite frame", "curvy figure", "tall and slim",
    "broad shoulders", "hourglass figure",
    // age phrases
    "in her twenties", "in his twenties", "in her thirties", "in his thirties", "middle-aged",
    "elderly", "youthful appearance", "teenage", "young adult",
    // measurements
    "5 feet", "5'", "6 feet", "6'", "feet tall", "cm tall", "kg", "lbs", "pounds",
];

/// Byte ranges of "the exact same ... from Reference Image N" spans, which
/// must survive sanitization untouched even though such spans sometimes
/// mention a wardrobe or product noun that looks token-adjacent (§4.2 Phase
/// 3 item 3).
fn protected_spans(text: &str) -> Vec<(usize, usize)> {
    let lower = text.to_lowercase();
    let mut spans = Vec::new();
    let mut search_from = 0;
    while let Some(start_offset) = lower[search_from..].find("the exact same") {
        let start = search_from + start_offset;
        let lookahead_end = (start + 200).min(lower.len());
        if let Some(ref_offset) = lower[start..lookahead_end].find("reference image") {
            let ref_start = start + ref_offset + "reference image".len();
            let mut end = ref_start;
            let bytes = lower.as_bytes();
            while end < lower.len() && (bytes[end] == b' ' || bytes[end].is_ascii_digit()) {
                end += 1;
            }
            spans.push((start, end));
            search_from = end;
        } else {
            search_from = start + "the exact same".len();
        }
    }
    spans
}

fn in_any_span(pos: usize, spans: &[(usize, usize)]) -> bool {
    spans.iter().any(|(start, end)| pos >= *start && pos < *end)
}

/// Sanitizes one enhanced scene prompt, returning `(sanitized, chars_removed)`.
pub fn sanitize_prompt(enhanced_content: &str) -> (String, usize) {
    let before_len = enhanced_content.chars().count();
    let mut sanitized = enhanced_content.to_string();

    for token in APPEARANCE_TOKENS {
        sanitized = strip_token_outside_protected_spans(&sanitized, token);
    }
    sanitized = sanitized.split_whitespace().collect::<Vec<_>>().join(" ");

    let after_len = sanitized.chars().count();
    let removed = before_len.saturating_sub(after_len);
    (sanitized, removed)
}

/// ASCII-alphanumeric is "inside a word" for this token list; every token is
/// plain ASCII, so a match bordered by an alphanumeric byte on either side
/// (e.g. "kg" inside "background", "pounds" inside "compounds") is a
/// substring hit, not a whole-word appearance descriptor, and must be left
/// alone.
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

fn strip_token_outside_protected_spans(text: &str, token: &str) -> String {
    let lower = text.to_lowercase();
    let token_lower = token.to_lowercase();
    if !lower.contains(&token_lower) {
        return text.to_string();
    }

    let spans = protected_spans(text);
    let bytes = lower.as_bytes();
    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut search_from = 0;
    while let Some(offset) = lower[search_from..].find(&token_lower) {
        let pos = search_from + offset;
        let end = pos + token_lower.len();

        let boundary_before = pos == 0 || !is_word_byte(bytes[pos - 1]);
        let boundary_after = end >= bytes.len() || !is_word_byte(bytes[end]);

        if boundary_before && boundary_after {
            result.push_str(&text[cursor..pos]);
            if in_any_span(pos, &spans) {
                result.push_str(&text[pos..end]);
            }
            cursor = end;
        }
        search_from = pos + 1;
    }
    result.push_str(&text[cursor..]);
    result
}

/// Sanitizes every scene's enhanced content, publishing one interaction
/// per scene with the before/after character counts (§4.2 Phase 3 item 3).
pub async fn run_appearance_sanitizer(
    progress_bus: &ProgressBus,
    recorder: &ConversationRecorder,
    generation_id: Uuid,
    enhanced_scenes: &[(u32, String)],
) -> Vec<(u32, String, usize)> {
    let mut results = Vec::with_capacity(enhanced_scenes.len());
    for (scene_number, content) in enhanced_scenes {
        let (sanitized, removed) = sanitize_prompt(content);

        let interaction = crate::domain::AgentInteraction::new(
            AgentRole::AppearanceSanitizer,
            InteractionType::Response,
            format!("removed {removed} characters"),
            InteractionMetadata { scene_number: Some(*scene_number), ..Default::default() },
        );
        recorder.append(generation_id, interaction.clone()).await;
        progress_bus.publish(generation_id, BusEvent::Interaction(interaction)).await;

        results.push((*scene_number, sanitized, removed));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_appearance_tokens() {
        let input = "She has blonde hair and blue eyes, wearing a red silk dress in a sunlit studio.";
        let (sanitized, removed) = sanitize_prompt(input);
        assert!(!sanitized.to_lowercase().contains("blonde hair"));
        assert!(!sanitized.to_lowercase().contains("blue eyes"));
        assert!(sanitized.contains("red silk dress"));
        assert!(removed > 0);
    }

    #[test]
    fn preserves_reference_image_phrases() {
        let input = "The model wears the exact same outfit from Reference Image 1, with athletic build removed.";
        let (sanitized, _) = sanitize_prompt(input);
        assert!(sanitized.to_lowercase().contains("the exact same outfit from reference image 1"));
    }

    #[test]
    fn no_appearance_tokens_is_a_no_op() {
        let input = "Wide establishing shot of the product on a marble countertop, golden hour lighting.";
        let (sanitized, removed) = sanitize_prompt(input);
        assert_eq!(sanitized, input);
        assert_eq!(removed, 0);
    }

    #[test]
    fn does_not_corrupt_words_containing_tokens_as_substrings() {
        let input = "Wide shot against a softly lit background, with stacked product compounds on the shelf.";
        let (sanitized, removed) = sanitize_prompt(input);
        assert_eq!(sanitized, input);
        assert_eq!(removed, 0);
        assert!(sanitized.contains("background"));
        assert!(sanitized.contains("compounds"));
    }
}
