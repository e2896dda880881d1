//! Question generation: prompt construction, generator contract, payload parsing
//!
//! The generator returns free text that should contain one JSON object:
//! `{"question": "", "options": [], "answer": "", "difficulty": n}`.
//! It may arrive wrapped in prose or code fences.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::types::{CognitiveProfile, DifficultyLevel, QuizQuestion};

lazy_static! {
    /// ```json / ``` fence markers, any case
    static ref RE_CODE_FENCE: Regex = Regex::new(r"(?i)```(?:json)?").unwrap();
}

/// Request body for the content generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    /// Base64 image for vision prompts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl GenerateRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }
}

/// External text generator ("send a prompt, get back text")
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GenerationError>;
}

/// How each level is described to the generator
pub fn difficulty_descriptor(level: DifficultyLevel) -> &'static str {
    match level.value() {
        1 => "very easy with 2 simple options",
        2 => "easy with 3 clear options",
        4 => "challenging with 4 options",
        5 => "advanced and concept-heavy with 4 options",
        _ => "medium difficulty with 3 options",
    }
}

/// Learner-specific hints appended to the prompt
pub fn profile_context(profile: &CognitiveProfile) -> String {
    let scores = &profile.cognitive_scores;
    let below = |score: Option<f64>, limit: f64| score.is_some_and(|v| v < limit);
    let above = |score: Option<f64>, limit: f64| score.is_some_and(|v| v > limit);
    let mut hints = Vec::new();

    if below(scores.attention, 30.0) {
        hints.push("Has attention challenges: Keep questions focused and concise, break content into smaller chunks");
    }
    if below(scores.working_memory, 40.0) {
        hints.push("Has working memory constraints: Avoid multiple-step questions, keep options distinct");
    }
    if below(scores.visual_spatial, 40.0) {
        hints.push("Prefers verbal/text-based learning: Use words instead of diagrams");
    }
    if above(scores.auditory_processing, 70.0) {
        hints.push("Strong auditory learner: Use word-based descriptions and examples");
    }
    if above(scores.reasoning, 70.0) {
        hints.push("Strong reasoning skills: Can handle complex reasoning chains");
    }

    if hints.is_empty() {
        return String::new();
    }

    let mut context = String::from("\n\nStudent's Learning Profile:\n");
    for hint in hints {
        context.push_str("- ");
        context.push_str(hint);
        context.push('\n');
    }
    context
}

/// Everything besides the level that shapes a question prompt
#[derive(Debug, Clone, Default)]
pub struct QuestionContext {
    /// Theory text the question must stay within
    pub theory: Option<String>,
    pub profile: Option<CognitiveProfile>,
}

impl QuestionContext {
    /// Prompt for one multiple-choice question on `topic` at `level`
    pub fn build_prompt(&self, topic: &str, level: DifficultyLevel) -> String {
        let descriptor = difficulty_descriptor(level);

        let mut prompt = match self.theory.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(theory) => format!(
                "You have this theory content:\n{}\n\nGenerate 1 {} multiple choice question that tests understanding of ONLY what is taught in the above content. The question MUST be based strictly on the theory provided. Do NOT create questions about topics not covered in the theory.",
                theory, descriptor
            ),
            None => format!(
                "Generate 1 {} multiple choice question about \"{}\".",
                descriptor,
                topic.trim()
            ),
        };

        if let Some(profile) = &self.profile {
            prompt.push_str(&profile_context(profile));
        }

        prompt.push_str(&format!(
            "\nReturn ONLY valid JSON:\n{{\"question\":\"\",\"options\":[],\"answer\":\"\",\"difficulty\":{}}}",
            level.value()
        ));
        prompt
    }
}

/// Extract and validate a question from generator text
pub fn parse_question(ai_text: &str) -> Result<QuizQuestion, GenerationError> {
    let cleaned = RE_CODE_FENCE.replace_all(ai_text, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let start = cleaned.find('{').ok_or(GenerationError::NoJson)?;
    let end = cleaned.rfind('}').ok_or(GenerationError::NoJson)?;
    if end < start {
        return Err(GenerationError::NoJson);
    }

    let question: QuizQuestion = serde_json::from_str(&cleaned[start..=end])?;

    if question.options.is_empty() {
        return Err(GenerationError::NoOptions);
    }
    if !question.options.contains(&question.answer) {
        return Err(GenerationError::AnswerNotInOptions(question.answer));
    }
    Ok(question)
}

/// Prompt, call, parse
pub async fn generate_question(
    generator: &dyn ContentGenerator,
    context: &QuestionContext,
    topic: &str,
    level: DifficultyLevel,
) -> Result<QuizQuestion, GenerationError> {
    let prompt = context.build_prompt(topic, level);
    let text = generator.generate(GenerateRequest::text(prompt)).await?;
    parse_question(&text)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CognitiveScores;

    #[test]
    fn test_parse_plain_json() {
        let q = parse_question(
            r#"{"question":"Capital of France?","options":["Paris","Rome"],"answer":"Paris","difficulty":1}"#,
        )
        .unwrap();
        assert_eq!(q.answer, "Paris");
        assert_eq!(q.difficulty, Some(1.0));
    }

    #[test]
    fn test_parse_fenced_json_with_prose() {
        let text = "Sure! Here it is:\n```json\n{\"question\":\"2+2?\",\"options\":[\"3\",\"4\"],\"answer\":\"4\",\"difficulty\":2}\n```\nGood luck.";
        let q = parse_question(text).unwrap();
        assert_eq!(q.question, "2+2?");
    }

    #[test]
    fn test_parse_no_json() {
        assert!(matches!(
            parse_question("I cannot help with that."),
            Err(GenerationError::NoJson)
        ));
        assert!(matches!(parse_question("```json\n```"), Err(GenerationError::EmptyResponse)));
    }

    #[test]
    fn test_parse_answer_not_in_options() {
        let err = parse_question(r#"{"question":"q","options":["a","b"],"answer":"c","difficulty":3}"#)
            .unwrap_err();
        assert!(matches!(err, GenerationError::AnswerNotInOptions(ref a) if a == "c"));
    }

    #[test]
    fn test_parse_empty_options() {
        let err = parse_question(r#"{"question":"q","options":[],"answer":"","difficulty":3}"#)
            .unwrap_err();
        assert!(matches!(err, GenerationError::NoOptions));
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse_question(r#"{"question": "q", "options": [}"#).unwrap_err();
        assert!(matches!(err, GenerationError::Json(_)));
    }

    #[test]
    fn test_prompt_names_topic_and_level() {
        let prompt = QuestionContext::default()
            .build_prompt("volcanoes", DifficultyLevel::clamped(4));
        assert!(prompt.contains("challenging with 4 options"));
        assert!(prompt.contains("\"volcanoes\""));
        assert!(prompt.contains("\"difficulty\":4"));
    }

    #[test]
    fn test_prompt_prefers_theory() {
        let context = QuestionContext {
            theory: Some("Plants make food from sunlight.".into()),
            profile: None,
        };
        let prompt = context.build_prompt("plants", DifficultyLevel::MIN);
        assert!(prompt.contains("Plants make food from sunlight."));
        assert!(prompt.contains("very easy with 2 simple options"));
        assert!(!prompt.contains("\"plants\""));
    }

    #[test]
    fn test_profile_hints() {
        let profile = CognitiveProfile {
            cognitive_scores: CognitiveScores {
                attention: Some(10.0),
                working_memory: Some(80.0),
                visual_spatial: Some(80.0),
                auditory_processing: Some(90.0),
                reasoning: Some(50.0),
                reaction_time: Some(60.0),
            },
            ..CognitiveProfile::default()
        };
        let context = profile_context(&profile);
        assert!(context.contains("attention challenges"));
        assert!(context.contains("Strong auditory learner"));
        assert!(!context.contains("working memory"));
        assert!(!context.contains("reasoning skills"));
    }

    #[test]
    fn test_profile_without_hints_adds_nothing() {
        let mid = Some(50.0);
        let profile = CognitiveProfile {
            cognitive_scores: CognitiveScores {
                attention: mid,
                working_memory: mid,
                visual_spatial: mid,
                auditory_processing: mid,
                reasoning: mid,
                reaction_time: mid,
            },
            ..CognitiveProfile::default()
        };
        assert!(profile_context(&profile).is_empty());
        assert!(profile_context(&CognitiveProfile::default()).is_empty());
    }
}
