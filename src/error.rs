//! Error types

use thiserror::Error;

/// Content generator failures; always recovered by keeping the prior question
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: reqwest::StatusCode, body: String },
    #[error("generator error: {0}")]
    Backend(String),
    #[error("no question returned from the generator")]
    EmptyResponse,
    #[error("no JSON object found in generator response")]
    NoJson,
    #[error("invalid question JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question has no options")]
    NoOptions,
    #[error("answer {0:?} is not one of the options")]
    AnswerNotInOptions(String),
}

/// Quiz operations rejected by the controller's guards
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("no question is awaiting an answer")]
    NoActiveQuestion,
    #[error("this question was already answered")]
    AlreadyAnswered,
    #[error("topic must not be empty")]
    EmptyTopic,
}

/// Session actor failures
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(String),
    #[error("session closed")]
    Closed,
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error("report storage failed: {0}")]
    Report(#[from] ReportError),
}

/// Report persistence failures
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("report {0} not found")]
    NotFound(String),
    #[error("invalid report name {0:?}")]
    InvalidName(String),
}
