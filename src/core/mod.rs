//! Core modules for Adaptiq

pub mod sampler;
pub mod timer;
pub mod controller;
pub mod generator;
pub mod http_generator;
pub mod session;
pub mod report;
pub mod api;

pub use sampler::{EmotionSampler, EmotionSource};
pub use timer::{TimerKind, TimerSet, TimerToken};
pub use controller::{AdaptiveController, Effect, QuestionRequest};
pub use generator::{
    difficulty_descriptor, generate_question, parse_question, profile_context, ContentGenerator,
    GenerateRequest, QuestionContext,
};
pub use http_generator::HttpContentGenerator;
pub use session::{SessionHandle, SessionUpdate};
pub use report::{find_report, latest_report, list_reports, load_report, report_path, save_report, ReportSummary};
pub use api::{create_router, run_server, ApiError, AppState};
