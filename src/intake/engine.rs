//! Intake engine — drives both intake flows over injected stores.
//!
//! The engine owns no transport: it consumes (user id, username, text) and
//! produces replies, so the same logic runs under the Telegram channel and
//! under tests. Session and lead storage are injected traits.

use std::sync::Arc;

use crate::channels::{IncomingMessage, OutgoingReply};
use crate::config::{IntakeMode, RestartPolicy};
use crate::error::{Result, StoreError, ValidationError};
use crate::intake::messages;
use crate::intake::model::{LeadProfile, LeadRecord};
use crate::intake::session::{SessionState, SessionStore};
use crate::intake::step::DialogueStep;
use crate::intake::validate::{self, FieldKind, FieldValue};
use crate::store::LeadStore;

/// Outcome of feeding one answer to the current dialogue step.
#[derive(Debug)]
enum StepOutcome {
    /// Validation failed. State unchanged; re-prompt.
    Retry(ValidationError),
    /// Answer stored; the dialogue moved to the next step.
    Advance(DialogueStep),
    /// Final answer stored; the accumulated profile is complete.
    Complete(LeadProfile),
    /// The accumulator is missing an earlier answer at the terminal step.
    /// The session is corrupt and must be discarded.
    Reset,
}

/// Why a quick-form message was rejected.
#[derive(Debug, PartialEq, Eq)]
enum QuickFormError {
    Format,
    Age,
}

/// Parse a single-message "City, Age" form.
fn parse_quick_form(text: &str) -> std::result::Result<LeadProfile, QuickFormError> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != 2 {
        return Err(QuickFormError::Format);
    }
    let city =
        validate::validate_text(FieldKind::City, parts[0]).map_err(|_| QuickFormError::Format)?;
    let age = validate::validate_age(parts[1]).map_err(|_| QuickFormError::Age)?;
    Ok(LeadProfile::Basic { city, age })
}

/// Validate the answer for the session's current step and, on success,
/// store it and advance. The session is mutated in place; the caller
/// persists it only on `Advance` (on `Complete` the session is discarded).
fn apply_answer(session: &mut SessionState, text: &str) -> StepOutcome {
    let Some(field) = session.step.field() else {
        return StepOutcome::Reset;
    };

    let value = match validate::validate(field, text) {
        Ok(v) => v,
        Err(err) => return StepOutcome::Retry(err),
    };

    match (session.step, value) {
        (DialogueStep::AwaitingName, FieldValue::Text(v)) => session.answers.name = Some(v),
        (DialogueStep::AwaitingAge, FieldValue::Age(v)) => session.answers.age = Some(v),
        (DialogueStep::AwaitingWorkplace, FieldValue::Text(v)) => {
            session.answers.workplace = Some(v)
        }
        (DialogueStep::AwaitingCitizenship, FieldValue::Text(v)) => {
            session.answers.citizenship = Some(v)
        }
        _ => return StepOutcome::Reset,
    }

    let next = match session.step.next() {
        Some(step) => step,
        None => return StepOutcome::Reset,
    };

    if next.is_terminal() {
        match session.answers.clone().into_profile() {
            Some(profile) => {
                session.step = next;
                StepOutcome::Complete(profile)
            }
            None => StepOutcome::Reset,
        }
    } else {
        session.step = next;
        StepOutcome::Advance(next)
    }
}

/// The lead-intake coordinator.
pub struct IntakeEngine {
    leads: Arc<dyn LeadStore>,
    sessions: Arc<dyn SessionStore>,
    mode: IntakeMode,
    restart_policy: RestartPolicy,
    manager_handle: String,
}

impl IntakeEngine {
    pub fn new(
        leads: Arc<dyn LeadStore>,
        sessions: Arc<dyn SessionStore>,
        mode: IntakeMode,
        restart_policy: RestartPolicy,
        manager_handle: String,
    ) -> Self {
        Self {
            leads,
            sessions,
            mode,
            restart_policy,
            manager_handle,
        }
    }

    /// Route one inbound message.
    ///
    /// `/start` opens (or resumes) intake, any other command is ignored and
    /// never treated as dialogue input, free text feeds the active flow.
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Result<Vec<OutgoingReply>> {
        match msg.command() {
            Some("start") => self.handle_start(msg.user_id, msg.username.as_deref()).await,
            Some(_) => Ok(vec![]),
            None => {
                self.handle_text(msg.user_id, msg.username.as_deref(), &msg.text)
                    .await
            }
        }
    }

    /// Handle the `/start` command.
    ///
    /// With an existing lead this short-circuits to the display path and
    /// creates no session. Otherwise the guided flow opens (or, per the
    /// restart policy, resumes) a session; the quick flow just sends the
    /// form example.
    pub async fn handle_start(
        &self,
        user_id: i64,
        username: Option<&str>,
    ) -> Result<Vec<OutgoingReply>> {
        if let Some(record) = self.leads.find(user_id).await? {
            return Ok(self.registered_replies(&record));
        }

        match self.mode {
            IntakeMode::Quick => Ok(vec![OutgoingReply::text(messages::welcome_quick())]),
            IntakeMode::Guided => {
                if self.restart_policy == RestartPolicy::Keep {
                    if let Some(session) = self.sessions.get(user_id).await {
                        tracing::debug!(user_id, step = %session.step, "Resuming in-flight dialogue");
                        return Ok(vec![OutgoingReply::text(messages::step_prompt(
                            session.step,
                        ))]);
                    }
                }

                let session = SessionState::new(user_id, username.map(String::from));
                let first_step = session.step;
                self.sessions.set(session).await;
                Ok(vec![
                    OutgoingReply::text(messages::welcome_guided()),
                    OutgoingReply::text(messages::step_prompt(first_step)),
                ])
            }
        }
    }

    /// Handle free-text (non-command) input.
    pub async fn handle_text(
        &self,
        user_id: i64,
        username: Option<&str>,
        text: &str,
    ) -> Result<Vec<OutgoingReply>> {
        match self.mode {
            IntakeMode::Quick => self.handle_quick(user_id, username, text).await,
            IntakeMode::Guided => self.handle_guided(user_id, username, text).await,
        }
    }

    async fn handle_quick(
        &self,
        user_id: i64,
        username: Option<&str>,
        text: &str,
    ) -> Result<Vec<OutgoingReply>> {
        // Registered users' free text is ignored in this flow.
        if self.leads.exists(user_id).await? {
            return Ok(vec![]);
        }

        let profile = match parse_quick_form(text) {
            Ok(profile) => profile,
            Err(QuickFormError::Format) => {
                return Ok(vec![OutgoingReply::text(messages::invalid_format())]);
            }
            Err(QuickFormError::Age) => {
                return Ok(vec![OutgoingReply::text(messages::invalid_age())]);
            }
        };

        self.register(user_id, username, profile).await
    }

    async fn handle_guided(
        &self,
        user_id: i64,
        username: Option<&str>,
        text: &str,
    ) -> Result<Vec<OutgoingReply>> {
        let Some(mut session) = self.sessions.get(user_id).await else {
            if self.leads.exists(user_id).await? {
                // Registered already; nothing to collect.
                return Ok(vec![]);
            }
            return Ok(vec![OutgoingReply::text(messages::use_start_hint())]);
        };

        match apply_answer(&mut session, text) {
            StepOutcome::Retry(err) => Ok(vec![OutgoingReply::text(messages::step_retry(
                session.step,
                &err,
            ))]),
            StepOutcome::Advance(next) => {
                self.sessions.set(session).await;
                Ok(vec![OutgoingReply::text(messages::step_prompt(next))])
            }
            StepOutcome::Complete(profile) => {
                let username = username.or(session.username.as_deref());
                // A store failure propagates here before the delete, so the
                // session survives and the user can retry the step.
                let replies = self.register(user_id, username, profile).await?;
                self.sessions.delete(user_id).await;
                Ok(replies)
            }
            StepOutcome::Reset => {
                tracing::warn!(user_id, step = %session.step, "Discarding corrupt session");
                self.sessions.delete(user_id).await;
                Ok(vec![OutgoingReply::text(messages::use_start_hint())])
            }
        }
    }

    /// Write the lead and build the completion replies. A duplicate-key
    /// rejection means another message won the race; render whoever won.
    async fn register(
        &self,
        user_id: i64,
        username: Option<&str>,
        profile: LeadProfile,
    ) -> Result<Vec<OutgoingReply>> {
        let record = LeadRecord::new(user_id, username.map(String::from), profile);

        match self.leads.create(&record).await {
            Ok(()) => {
                tracing::info!(
                    user_id,
                    profile = %record.profile.summary(),
                    "New lead registered"
                );
                Ok(vec![
                    OutgoingReply::text(messages::form_completed()),
                    self.handoff_reply(),
                ])
            }
            Err(StoreError::Duplicate { .. }) => match self.leads.find(user_id).await? {
                Some(existing) => Ok(self.registered_replies(&existing)),
                None => Err(StoreError::Query(format!(
                    "duplicate reported but no lead found for user {user_id}"
                ))
                .into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    fn registered_replies(&self, record: &LeadRecord) -> Vec<OutgoingReply> {
        vec![
            OutgoingReply::text(messages::already_registered(record)),
            self.handoff_reply(),
        ]
    }

    fn handoff_reply(&self) -> OutgoingReply {
        OutgoingReply::with_button(
            messages::contact_manager(),
            messages::manager_button_label(),
            messages::manager_url(&self.manager_handle),
        )
    }
}
