use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::response::AppError;
use crate::selection::config::SelectionConfig;
use crate::selection::model::ModelHandle;
use crate::selection::policy::{AdaptiveSelector, DiagnosticSelector};
use crate::selection::session::SessionStore;
use crate::selection::stats::{compute_stats, join_attempts};
use crate::selection::types::{Difficulty, Phase, Session, SessionSummary, SkillSnapshot};
use crate::store::operations::questions::Question;
use crate::store::operations::users::User;
use crate::store::Store;
use crate::validation::validate_time_taken;

/// What a learner sees of a question; the correct option stays server-side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: u64,
    pub text: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
    pub domain: String,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            text: q.text.clone(),
            options: q.options.clone(),
            difficulty: q.difficulty,
            domain: q.domain.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestion {
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
}

impl NextQuestion {
    fn from_pick(picked: Option<&Question>) -> Self {
        match picked {
            Some(q) => Self {
                complete: false,
                question: Some(q.into()),
            },
            None => Self {
                complete: true,
                question: None,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    pub session_id: u64,
    pub learner_name: String,
    pub question_id: u64,
    pub selected_option: usize,
    pub time_taken: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub correct: bool,
    pub stats: SkillSnapshot,
}

/// Drives a test: owns the phase machine and wires the selectors to the
/// store, the session registry and the scoring model.
pub struct SelectionEngine {
    config: SelectionConfig,
    store: Arc<Store>,
    sessions: Arc<SessionStore>,
    model: Arc<ModelHandle>,
}

impl SelectionEngine {
    pub fn new(
        config: SelectionConfig,
        store: Arc<Store>,
        sessions: Arc<SessionStore>,
        model: Arc<ModelHandle>,
    ) -> Self {
        Self {
            config,
            store,
            sessions,
            model,
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn model(&self) -> &Arc<ModelHandle> {
        &self.model
    }

    pub async fn create_session(&self, learner_name: &str) -> u64 {
        let session_id = self.sessions.create_session(learner_name).await;
        tracing::info!(session_id, learner = learner_name, "Test session started");
        session_id
    }

    pub async fn end_session(&self, session_id: u64) -> Option<SessionSummary> {
        let summary = self.sessions.end_session(session_id).await?;
        tracing::info!(
            session_id,
            learner = %summary.learner_name,
            attempted = summary.attempted_count,
            "Test session ended"
        );
        Some(summary)
    }

    fn find_learner(&self, learner_name: &str) -> Result<User, AppError> {
        self.store
            .get_user_by_username(learner_name)?
            .ok_or_else(|| AppError::not_found("Learner not found"))
    }

    fn ensure_owner(session: &Session, learner_name: Option<&str>) -> Result<(), AppError> {
        match learner_name {
            Some(name) if name != session.learner_name => {
                Err(AppError::forbidden("Session belongs to another learner"))
            }
            _ => Ok(()),
        }
    }

    /// Fresh snapshot of the learner's whole attempt history.
    pub fn learner_snapshot(
        &self,
        user_id: &str,
        questions: &[Question],
    ) -> Result<SkillSnapshot, AppError> {
        let attempts = self.store.get_attempts_for_user(user_id)?;
        let by_id: HashMap<u64, Question> =
            questions.iter().map(|q| (q.id, q.clone())).collect();
        Ok(compute_stats(&join_attempts(&attempts, &by_id)))
    }

    fn adaptive_pick<'q, R: Rng + ?Sized>(
        &self,
        learner: &User,
        questions: &'q [Question],
        session: &Session,
        rng: &mut R,
    ) -> Result<Option<&'q Question>, AppError> {
        let snapshot = self.learner_snapshot(&learner.id, questions)?;
        let model = self.model.get()?;
        Ok(AdaptiveSelector::new(&self.config).next(
            questions,
            &session.attempted_set,
            &snapshot,
            model,
            rng,
        ))
    }

    /// Picks the next question for a session. The session stays locked for
    /// the whole call, so the diagnostic flag flips at most once even under
    /// concurrent requests.
    pub async fn next_question(
        &self,
        session_id: u64,
        learner_name: Option<&str>,
    ) -> Result<NextQuestion, AppError> {
        let mut session = self
            .sessions
            .lock(session_id)
            .await
            .ok_or_else(|| AppError::not_found("Session not found"))?;
        if let Some(name) = learner_name {
            // An unknown caller is NotFound, a known one on a foreign session is Forbidden.
            self.find_learner(name)?;
        }
        Self::ensure_owner(&session, learner_name)?;

        let learner = self.find_learner(&session.learner_name)?;
        let questions = self.store.list_questions()?;
        let mut rng = StdRng::from_entropy();

        let picked = match session.phase() {
            Phase::Diagnostic => {
                match DiagnosticSelector.next(&questions, &session.attempted_set, &mut rng) {
                    Some(q) => Some(q),
                    None => {
                        if session.mark_diagnostic_done() {
                            tracing::info!(session_id, "Diagnostic pool exhausted, switching to adaptive phase");
                        }
                        self.adaptive_pick(&learner, &questions, &session, &mut rng)?
                    }
                }
            }
            Phase::Adaptive => self.adaptive_pick(&learner, &questions, &session, &mut rng)?,
        };

        match picked {
            Some(q) => tracing::debug!(session_id, question_id = q.id, phase = ?session.phase(), "Next question"),
            None => tracing::info!(session_id, attempted = session.attempted.len(), "Question pool exhausted"),
        }

        Ok(NextQuestion::from_pick(picked))
    }

    pub async fn submit_answer(&self, submission: AnswerSubmission) -> Result<AnswerOutcome, AppError> {
        validate_time_taken(submission.time_taken)
            .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

        let learner = self.find_learner(&submission.learner_name)?;
        let question = self
            .store
            .get_question(submission.question_id)?
            .ok_or_else(|| AppError::not_found("Question not found"))?;

        // Held across insert + record so two submissions for the same session
        // cannot interleave.
        let session = self.sessions.lock(submission.session_id).await;

        // An option index outside the list is simply a wrong answer.
        let correct = question.is_correct(submission.selected_option);
        self.store.insert_attempt(
            &learner.id,
            question.id,
            correct,
            submission.time_taken,
        )?;

        match session {
            Some(mut s) => {
                s.record_attempt(question.id);
            }
            None => tracing::debug!(
                session_id = submission.session_id,
                "Answer recorded without an active session"
            ),
        }

        let questions = self.store.list_questions()?;
        let stats = self.learner_snapshot(&learner.id, &questions)?;

        tracing::info!(
            session_id = submission.session_id,
            question_id = question.id,
            correct,
            overall_accuracy = stats.overall_accuracy,
            "Answer submitted"
        );

        Ok(AnswerOutcome { correct, stats })
    }
}
