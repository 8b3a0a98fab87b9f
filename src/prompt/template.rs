// Classifier prompt construction
// Author: kelexine (https://github.com/kelexine)

/// Prompt used when the extension sends no subject of its own
pub const DEFAULT_PROMPT: &str = r#"Analyze this image and determine if MAJORITY of the people visible in the image appear to be above 30 years old.

Please respond with a JSON object in this exact format:
{
  "DETECTED": true/false,
  "confidence": 0-100,
  "reasoning": "brief explanation including approximate age ranges observed",
  "summary": "1-sentence summary of any audio context or visual context"
}

Look for characteristics like:
- Facial features indicating maturity (wrinkles, skin texture, facial structure)
- Overall appearance and physical characteristics
- If multiple people are present, majority must appear above 30 for true

Only respond with the JSON object, nothing else."#;

/// Build the full instruction sent alongside the frame.
///
/// `subject` comes from `cleaner::subject`; `captions` the accumulated caption
/// history. An empty subject selects [`DEFAULT_PROMPT`].
pub fn build_prompt(subject: &str, captions: &str) -> String {
    let subject = subject.trim();
    if subject.is_empty() {
        return DEFAULT_PROMPT.to_string();
    }

    format!(
        r#"Analyze this image and the provided audio context (subtitles).

Accumulated Audio/Subtitle History: "{captions}"

Determine if: {subject}.

Please respond with a JSON object in this exact format:
{{
  "DETECTED": true/false,
  "confidence": 0-100,
  "reasoning": "brief explanation",
  "summary": "Summary of the ENTIRE discussion history irrespective of detection"
}}

Look for characteristics like:
- Visual cues related to: {subject}
- Context clues from the subtitle history: "{captions}"
- Overall appearance and context

Only respond with the JSON object, nothing else. "summary" field is MANDATORY even if DETECTED is false."#
    )
}
