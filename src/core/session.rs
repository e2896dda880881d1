//! Session actor: one tokio task per quiz session
//!
//! The task owns the sampler and controller, so every mutation is
//! serialized through its command channel. Controller effects are carried
//! out here: timers become sleeping tasks that post the token back, and
//! question requests become generator calls that post `(seq, result)` back.
//! Spawned tasks only hold a weak sender, so dropping every handle ends
//! the session even while timers are pending.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::AdaptiveConfig;
use crate::core::controller::{AdaptiveController, Effect, QuestionRequest};
use crate::core::generator::{generate_question, ContentGenerator, QuestionContext};
use crate::core::report::save_report;
use crate::core::timer::TimerToken;
use crate::error::{GenerationError, QuizError, ReportError, SessionError};
use crate::types::{ControllerSnapshot, ExpressionScores, QuizQuestion, SessionReport};

const COMMAND_BUFFER: usize = 64;
const UPDATE_BUFFER: usize = 100;

/// Live update pushed to subscribers after every state change
#[derive(Debug, Clone, Serialize)]
pub struct SessionUpdate {
    pub session_id: String,
    #[serde(flatten)]
    pub snapshot: ControllerSnapshot,
}

enum SessionCommand {
    /// One camera tick; `None` when no face was detected
    Observe(Option<ExpressionScores>),
    Start {
        topic: String,
        reply: oneshot::Sender<Result<(), QuizError>>,
    },
    Answer {
        option: String,
        reply: oneshot::Sender<Result<bool, QuizError>>,
    },
    Reset,
    Snapshot(oneshot::Sender<ControllerSnapshot>),
    Report(oneshot::Sender<SessionReport>),
    SaveReport {
        dir: PathBuf,
        reply: oneshot::Sender<Result<PathBuf, ReportError>>,
    },
    TimerFired(TimerToken),
    QuestionReady {
        seq: u64,
        result: Result<QuizQuestion, GenerationError>,
    },
}

/// Cloneable handle to a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: String,
    tx: mpsc::Sender<SessionCommand>,
    updates: broadcast::Sender<SessionUpdate>,
}

impl std::fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Observe(_) => "Observe",
            Self::Start { .. } => "Start",
            Self::Answer { .. } => "Answer",
            Self::Reset => "Reset",
            Self::Snapshot(_) => "Snapshot",
            Self::Report(_) => "Report",
            Self::SaveReport { .. } => "SaveReport",
            Self::TimerFired(_) => "TimerFired",
            Self::QuestionReady { .. } => "QuestionReady",
        };
        f.write_str(name)
    }
}

impl SessionHandle {
    /// Spawn the actor on the current runtime
    pub fn spawn(
        id: impl Into<String>,
        config: AdaptiveConfig,
        generator: Arc<dyn ContentGenerator>,
        context: QuestionContext,
    ) -> Self {
        let id = id.into();
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);

        let actor = SessionActor {
            id: id.clone(),
            controller: AdaptiveController::with_sampler(config),
            generator,
            context: Arc::new(context),
            rx,
            self_tx: tx.downgrade(),
            updates: updates.clone(),
        };
        tokio::spawn(actor.run());

        Self { id, tx, updates }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.updates.subscribe()
    }

    pub async fn observe(&self, scores: Option<ExpressionScores>) -> Result<(), SessionError> {
        self.send(SessionCommand::Observe(scores)).await
    }

    pub async fn start(&self, topic: impl Into<String>) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Start { topic: topic.into(), reply }).await?;
        Ok(recv(rx).await??)
    }

    /// Returns whether the option was correct
    pub async fn answer(&self, option: impl Into<String>) -> Result<bool, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Answer { option: option.into(), reply }).await?;
        Ok(recv(rx).await??)
    }

    pub async fn reset(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Reset).await
    }

    pub async fn snapshot(&self) -> Result<ControllerSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot(reply)).await?;
        recv(rx).await
    }

    pub async fn report(&self) -> Result<SessionReport, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Report(reply)).await?;
        recv(rx).await
    }

    /// Build the report and write it into `dir`
    pub async fn save_report(&self, dir: impl Into<PathBuf>) -> Result<PathBuf, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::SaveReport { dir: dir.into(), reply }).await?;
        Ok(recv(rx).await??)
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.tx.send(cmd).await.map_err(|_| SessionError::Closed)
    }
}

async fn recv<T>(rx: oneshot::Receiver<T>) -> Result<T, SessionError> {
    rx.await.map_err(|_| SessionError::Closed)
}

struct SessionActor {
    id: String,
    controller: AdaptiveController,
    generator: Arc<dyn ContentGenerator>,
    context: Arc<QuestionContext>,
    rx: mpsc::Receiver<SessionCommand>,
    self_tx: mpsc::WeakSender<SessionCommand>,
    updates: broadcast::Sender<SessionUpdate>,
}

impl SessionActor {
    async fn run(mut self) {
        info!(session = %self.id, "session started");

        while let Some(cmd) = self.rx.recv().await {
            debug!(session = %self.id, command = ?cmd, "session command");
            let changed = self.handle(cmd);
            if changed {
                self.broadcast();
            }
        }

        info!(session = %self.id, "session closed");
    }

    /// Apply one command; returns whether subscribers should be told
    fn handle(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Observe(scores) => {
                let effects = self.controller.observe(scores.as_ref());
                self.execute(effects);
                true
            }
            SessionCommand::Start { topic, reply } => {
                let result = self.controller.start(&topic).map(|effects| self.execute(effects));
                let ok = result.is_ok();
                let _ = reply.send(result);
                ok
            }
            SessionCommand::Answer { option, reply } => {
                let result = self.controller.submit_answer(&option).map(|(correct, effects)| {
                    self.execute(effects);
                    correct
                });
                let ok = result.is_ok();
                let _ = reply.send(result);
                ok
            }
            SessionCommand::Reset => {
                self.controller.reset();
                true
            }
            SessionCommand::Snapshot(reply) => {
                let _ = reply.send(self.controller.snapshot());
                false
            }
            SessionCommand::Report(reply) => {
                let _ = reply.send(self.controller.report());
                false
            }
            SessionCommand::SaveReport { dir, reply } => {
                let report = self.controller.report();
                let _ = reply.send(save_report(&report, dir));
                false
            }
            SessionCommand::TimerFired(token) => {
                let effects = self.controller.on_timer(token);
                self.execute(effects);
                true
            }
            SessionCommand::QuestionReady { seq, result } => {
                let effects = self.controller.on_question(seq, result);
                self.execute(effects);
                true
            }
        }
    }

    fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Schedule { token, delay } => {
                    let tx = self.self_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if let Some(tx) = tx.upgrade() {
                            let _ = tx.send(SessionCommand::TimerFired(token)).await;
                        }
                    });
                }
                Effect::RequestQuestion(request) => self.spawn_generation(request),
            }
        }
    }

    fn spawn_generation(&self, request: QuestionRequest) {
        let tx = self.self_tx.clone();
        let generator = Arc::clone(&self.generator);
        let context = Arc::clone(&self.context);
        let session = self.id.clone();

        tokio::spawn(async move {
            let QuestionRequest { seq, level, topic } = request;
            debug!(%session, seq, %level, "generating question");
            let result = generate_question(generator.as_ref(), &context, &topic, level).await;
            if let Err(err) = &result {
                warn!(%session, seq, error = %err, "generator call failed");
            }
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(SessionCommand::QuestionReady { seq, result }).await;
            }
        });
    }

    fn broadcast(&self) {
        // No subscribers is fine
        let _ = self.updates.send(SessionUpdate {
            session_id: self.id.clone(),
            snapshot: self.controller.snapshot(),
        });
    }
}
