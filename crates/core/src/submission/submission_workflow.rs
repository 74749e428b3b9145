//! Form submission state machine: `Idle → Submitting → {Succeeded, Failed}`.
//!
//! A failed submission surfaces its message and drops back to `Idle` so the
//! form can be resubmitted. Validation runs before the service is touched.

use log::{debug, error, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::companions::{companion_detail_path, Companion, CompanionForm, CompanionServiceTrait};
use crate::errors::{Error, FieldError, ValidationError};

/// Message shown when the store hands back a record without an id.
pub const MISSING_ID_MESSAGE: &str = "Companion creation failed - no ID returned";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Submitting,
    Succeeded,
}

/// What the caller should do after a submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Created; navigate to the detail view at `location`.
    Navigate {
        companion: Companion,
        location: String,
    },
    /// Local validation failed; nothing was sent.
    Invalid(Vec<FieldError>),
    /// No caller identity; send the user to sign in.
    SignInRequired,
    /// The remote call failed. The form is idle again.
    Failed { message: String },
    /// Refused because the workflow is not idle.
    NotIdle(SubmissionPhase),
}

#[derive(Debug)]
struct WorkflowState {
    phase: SubmissionPhase,
    last_error: Option<String>,
}

/// Drives one companion form through validation and creation.
pub struct SubmissionWorkflow {
    service: Arc<dyn CompanionServiceTrait>,
    state: Mutex<WorkflowState>,
}

impl SubmissionWorkflow {
    pub fn new(service: Arc<dyn CompanionServiceTrait>) -> Self {
        Self {
            service,
            state: Mutex::new(WorkflowState {
                phase: SubmissionPhase::Idle,
                last_error: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.state().phase
    }

    /// Whether the submit control should be disabled.
    pub fn is_submitting(&self) -> bool {
        self.phase() == SubmissionPhase::Submitting
    }

    /// Message of the last failed attempt, cleared on the next submit.
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub async fn submit(&self, form: &CompanionForm) -> SubmissionOutcome {
        let new_companion = match form.validate() {
            Ok(fields) => fields,
            Err(Error::Validation(err)) => {
                return SubmissionOutcome::Invalid(invalid_fields(err));
            }
            Err(err) => {
                return SubmissionOutcome::Failed {
                    message: err.to_string(),
                }
            }
        };

        // Claim the workflow under one guard so only one caller can leave Idle.
        {
            let mut state = self.state();
            if state.phase != SubmissionPhase::Idle {
                debug!("Ignoring submission while {:?}", state.phase);
                return SubmissionOutcome::NotIdle(state.phase);
            }
            state.phase = SubmissionPhase::Submitting;
            state.last_error = None;
        }

        let result = self.service.create_companion(new_companion).await;

        match result {
            Ok(companion) if companion.id.is_empty() => self.fail(MISSING_ID_MESSAGE.to_string()),
            Ok(companion) => {
                info!("Companion {} created", companion.id);
                self.state().phase = SubmissionPhase::Succeeded;
                let location = companion_detail_path(&companion.id);
                SubmissionOutcome::Navigate {
                    companion,
                    location,
                }
            }
            Err(Error::AuthRequired) => {
                self.state().phase = SubmissionPhase::Idle;
                SubmissionOutcome::SignInRequired
            }
            Err(err) => {
                error!("Error creating companion: {}", err);
                self.fail(err.to_string())
            }
        }
    }

    fn fail(&self, message: String) -> SubmissionOutcome {
        let mut state = self.state();
        state.phase = SubmissionPhase::Idle;
        state.last_error = Some(message.clone());
        SubmissionOutcome::Failed { message }
    }
}

fn invalid_fields(err: ValidationError) -> Vec<FieldError> {
    match err {
        ValidationError::InvalidFields(errors) => errors,
        ValidationError::MissingField(field) => {
            let message = format!("Required field '{}' is missing", field);
            vec![FieldError::new(field, message)]
        }
        ValidationError::InvalidInput(message) => vec![FieldError::new("form", message)],
    }
}
