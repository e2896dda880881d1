//! Integration tests for Slice 4 - Questions and Reports
//!
//! Tests the generator-facing contract and report storage:
//! - Prompts carry level, topic or theory, and profile hints
//! - Generator text is accepted only with a valid question inside
//! - Reports capture the session and the latest one is found by mtime

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use adaptiq::config::AdaptiveConfig;
use adaptiq::core::{
    generate_question, latest_report, load_report, parse_question, profile_context, save_report, AdaptiveController,
    ContentGenerator, GenerateRequest, QuestionContext, SessionHandle,
};
use adaptiq::error::GenerationError;
use adaptiq::types::{CognitiveProfile, CognitiveScores, DifficultyLevel, ExpressionScores};

/// Records prompts and replies with a fixed text
struct RecordingGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ContentGenerator for RecordingGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(request.prompt);
        Ok(self.reply.clone())
    }
}

const VALID: &str = r#"{"question":"Which gas do plants absorb?","options":["Oxygen","Carbon dioxide"],"answer":"Carbon dioxide","difficulty":2}"#;

fn scores(label: &str) -> Option<ExpressionScores> {
    Some([(label.to_string(), 0.9)].into_iter().collect())
}

// =============================================================================
// PROMPTS
// =============================================================================

#[tokio::test]
async fn test_prompt_reaches_generator_with_profile_hints() {
    let generator = RecordingGenerator::new(VALID);
    let context = QuestionContext {
        theory: None,
        profile: Some(CognitiveProfile {
            name: Some("Sam".into()),
            age: Some(11),
            cognitive_scores: CognitiveScores {
                attention: Some(80.0),
                working_memory: Some(20.0),
                visual_spatial: Some(30.0),
                auditory_processing: Some(50.0),
                reasoning: Some(90.0),
                reaction_time: Some(50.0),
            },
        }),
    };

    let question = generate_question(generator.as_ref(), &context, "plants", DifficultyLevel::clamped(2))
        .await
        .unwrap();
    assert_eq!(question.answer, "Carbon dioxide");

    let prompts = generator.prompts.lock().unwrap();
    let prompt = &prompts[0];
    assert!(prompt.contains("easy with 3 clear options"));
    assert!(prompt.contains("\"plants\""));
    assert!(prompt.contains("working memory constraints"));
    assert!(prompt.contains("Prefers verbal/text-based learning"));
    assert!(prompt.contains("Strong reasoning skills"));
    assert!(!prompt.contains("attention challenges"));
    assert!(prompt.ends_with("\"difficulty\":2}"));
}

#[test]
fn test_profile_json_uses_camel_case() {
    let profile: CognitiveProfile = serde_json::from_str(
        r#"{"name":"Ana","cognitiveScores":{"attention":25,"workingMemory":60,"visualSpatial":70,"auditoryProcessing":40,"reasoning":55,"reactionTime":65}}"#,
    )
    .unwrap();
    assert_eq!(profile.cognitive_scores.attention, Some(25.0));
    assert_eq!(profile.cognitive_scores.working_memory, Some(60.0));
    assert!(profile.age.is_none());
}

#[test]
fn test_partial_profile_hints_only_scored_games() {
    let profile: CognitiveProfile = serde_json::from_str(r#"{"cognitiveScores":{"reasoning":85}}"#).unwrap();
    assert_eq!(profile.cognitive_scores.attention, None);

    let context = profile_context(&profile);
    assert!(context.contains("Strong reasoning skills"));
    assert!(!context.contains("attention challenges"));
    assert!(!context.contains("working memory constraints"));
    assert!(!context.contains("Prefers verbal/text-based learning"));
    assert!(!context.contains("Strong auditory learner"));

    let bare: CognitiveProfile = serde_json::from_str(r#"{"name":"Lee"}"#).unwrap();
    assert!(profile_context(&bare).is_empty());
}

// =============================================================================
// PARSING
// =============================================================================

#[test]
fn test_parse_accepts_wrapped_payloads() {
    for text in [
        VALID.to_string(),
        format!("```json\n{}\n```", VALID),
        format!("Here is your question:\n{}\nEnjoy!", VALID),
        format!("```JSON {} ```", VALID),
    ] {
        let question = parse_question(&text).unwrap();
        assert_eq!(question.options.len(), 2);
    }
}

#[test]
fn test_parse_rejections_are_generation_failures() {
    assert!(matches!(parse_question("no json here"), Err(GenerationError::NoJson)));
    assert!(matches!(
        parse_question(r#"{"question":"q","options":["a"],"answer":"b","difficulty":1}"#),
        Err(GenerationError::AnswerNotInOptions(_))
    ));
    assert!(matches!(parse_question("{ not json }"), Err(GenerationError::Json(_))));
}

// =============================================================================
// REPORTS
// =============================================================================

#[test]
fn test_report_captures_session() {
    let mut ctl = AdaptiveController::with_sampler(AdaptiveConfig::default());
    ctl.observe(scores("happy").as_ref());
    ctl.observe(scores("happy").as_ref());
    ctl.observe(scores("sad").as_ref());

    let effects = ctl.start("volcanoes").unwrap();
    let seq = match &effects[0] {
        adaptiq::core::Effect::RequestQuestion(r) => r.seq,
        other => panic!("unexpected effect {:?}", other),
    };
    ctl.on_question(seq, Ok(parse_question(VALID).unwrap()));
    ctl.observe(scores("fearful").as_ref());
    ctl.submit_answer("Carbon dioxide").unwrap();

    let report = ctl.report();
    assert_eq!(report.topic, "volcanoes");
    assert_eq!((report.score, report.total_answered), (1, 1));
    assert_eq!(report.accuracy, Some(1.0));
    assert_eq!(report.final_level.value(), 2);
    assert_eq!(report.level_changes.len(), 1);
    assert_eq!(report.emotion_counts.get("happy"), Some(&2));
    assert_eq!(report.emotion_counts.get("sad"), Some(&1));
    assert_eq!(report.emotion_counts.get("fearful"), Some(&1));
    assert!(report.id.starts_with("report_"));
}

#[test]
fn test_reports_round_trip_and_latest() {
    let dir = tempfile::tempdir().unwrap();

    let mut ctl = AdaptiveController::with_sampler(AdaptiveConfig::default());
    ctl.start("oceans").unwrap();
    let first = ctl.report();
    let first_path = save_report(&first, dir.path()).unwrap();

    let second = ctl.report();
    save_report(&second, dir.path()).unwrap();

    let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
    std::fs::File::options()
        .write(true)
        .open(&first_path)
        .unwrap()
        .set_modified(an_hour_ago)
        .unwrap();

    assert_eq!(load_report(&first_path).unwrap(), first);
    assert_eq!(latest_report(dir.path()).unwrap().unwrap().id, second.id);
}

#[tokio::test]
async fn test_session_saves_report() {
    let dir = tempfile::tempdir().unwrap();
    let generator = RecordingGenerator::new(VALID);
    let handle = SessionHandle::spawn("reporting", AdaptiveConfig::default(), generator, QuestionContext::default());

    handle.start("plants").await.unwrap();
    let path = handle.save_report(dir.path()).await.unwrap();

    let report = load_report(&path).unwrap();
    assert_eq!(report.topic, "plants");
    assert_eq!(report.final_level, DifficultyLevel::default());
}
