//! Submission module - the client-facing companion form workflow.

mod submission_workflow;


pub use submission_workflow::{
    SubmissionOutcome, SubmissionPhase, SubmissionWorkflow, MISSING_ID_MESSAGE,
};
