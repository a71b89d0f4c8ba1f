//! Core types for Lampstand.
//!
//! DTOs mirrored from the backend's JSON, plus the admin views layered on top
//! of them.

pub mod activity;
pub mod id;
pub mod message;
pub mod question;
pub mod status;
pub mod topic;
pub mod user;

pub use activity::{Activity, DashboardStats};
pub use id::{ActivityId, AnswerId, MessageId, QuestionId, ThreadId, TopicId, UserId};
pub use message::{Message, MessageContent, NewMessage};
pub use question::{
    AdminAnswerView, AdminQuestionView, Answer, AnswerInput, NewQuestion, Question,
    derive_priority, derive_status,
};
pub use status::*;
pub use topic::{Topic, TopicInput};
pub use user::User;
