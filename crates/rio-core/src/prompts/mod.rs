//! Prompt templates for the mentor: essay grading and study content generation.

pub mod content;
pub mod grading;

pub use content::{
    dossier_user_prompt, explain_user_prompt, question_user_prompt, schedule_user_prompt,
    DOSSIER_SYSTEM, EXPLAIN_SYSTEM, QUESTION_SYSTEM, SCHEDULE_SYSTEM,
};
pub use grading::{grading_user_prompt, GRADING_SYSTEM, GRADING_USER_TEMPLATE};
