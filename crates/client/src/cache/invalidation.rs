//! Which cached reads each mutation makes stale.
//!
//! The whole write-side contract lives in [`MutationKind::invalidates`]: every
//! mutation is looked up here and the resulting targets are dropped from the
//! cache by one routine, [`super::QueryCache::invalidate`].

use super::QueryFamily as F;

/// A group of cached reads to drop after a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Every entry of a family, whatever its parameters.
    Family(F),
    /// The thread cache for the thread the mutated message belongs to.
    AffectedThread,
}

use Invalidation::{AffectedThread, Family};

const TOPIC_WRITE: &[Invalidation] = &[
    Family(F::Topics),
    Family(F::AdminTopics),
    Family(F::Topic),
    Family(F::DashboardStats),
    Family(F::RecentActivity),
];

const QUESTION_WRITE: &[Invalidation] = &[
    Family(F::Questions),
    Family(F::AdminQuestions),
    Family(F::Question),
    Family(F::DashboardStats),
    Family(F::RecentActivity),
];

const ANSWER_WRITE: &[Invalidation] = &[
    Family(F::Questions),
    Family(F::AdminQuestions),
    Family(F::Question),
    Family(F::AdminAnswers),
    Family(F::DashboardStats),
    Family(F::RecentActivity),
];

const MESSAGE_WRITE: &[Invalidation] = &[
    Family(F::Messages),
    Family(F::Conversations),
    AffectedThread,
];

/// Every write operation the client performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    CreateTopic,
    UpdateTopic,
    DeleteTopic,
    ToggleTopicStatus,
    CreateQuestion,
    DeleteQuestion,
    UpdateQuestionStatus,
    UpdateQuestionPriority,
    AddAnswer,
    UpdateAnswer,
    DeleteAnswer,
    CreateMessage,
    ReplyToMessage,
    UpdateMessage,
    DeleteMessage,
    HideMessage,
    UnhideMessage,
}

impl MutationKind {
    /// All mutation kinds.
    pub const ALL: [Self; 17] = [
        Self::CreateTopic,
        Self::UpdateTopic,
        Self::DeleteTopic,
        Self::ToggleTopicStatus,
        Self::CreateQuestion,
        Self::DeleteQuestion,
        Self::UpdateQuestionStatus,
        Self::UpdateQuestionPriority,
        Self::AddAnswer,
        Self::UpdateAnswer,
        Self::DeleteAnswer,
        Self::CreateMessage,
        Self::ReplyToMessage,
        Self::UpdateMessage,
        Self::DeleteMessage,
        Self::HideMessage,
        Self::UnhideMessage,
    ];

    /// Cached reads this mutation makes stale.
    #[must_use]
    pub const fn invalidates(self) -> &'static [Invalidation] {
        match self {
            Self::CreateTopic | Self::UpdateTopic | Self::DeleteTopic | Self::ToggleTopicStatus => {
                TOPIC_WRITE
            }
            Self::CreateQuestion
            | Self::DeleteQuestion
            | Self::UpdateQuestionStatus
            | Self::UpdateQuestionPriority => QUESTION_WRITE,
            Self::AddAnswer | Self::UpdateAnswer | Self::DeleteAnswer => ANSWER_WRITE,
            Self::CreateMessage
            | Self::ReplyToMessage
            | Self::UpdateMessage
            | Self::DeleteMessage
            | Self::HideMessage
            | Self::UnhideMessage => MESSAGE_WRITE,
        }
    }

    /// Creates mint a new entity on every call; everything else converges.
    #[must_use]
    pub const fn is_idempotent(self) -> bool {
        !matches!(
            self,
            Self::CreateTopic
                | Self::CreateQuestion
                | Self::AddAnswer
                | Self::CreateMessage
                | Self::ReplyToMessage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn families(kind: MutationKind) -> Vec<F> {
        kind.invalidates()
            .iter()
            .filter_map(|target| match target {
                Family(family) => Some(*family),
                AffectedThread => None,
            })
            .collect()
    }

    #[test]
    fn test_every_mutation_invalidates_something() {
        for kind in MutationKind::ALL {
            assert!(!kind.invalidates().is_empty(), "{kind:?} invalidates nothing");
        }
    }

    #[test]
    fn test_topic_writes_hit_public_and_admin_lists() {
        for kind in [
            MutationKind::CreateTopic,
            MutationKind::UpdateTopic,
            MutationKind::DeleteTopic,
            MutationKind::ToggleTopicStatus,
        ] {
            let hit = families(kind);
            assert!(hit.contains(&F::Topics));
            assert!(hit.contains(&F::AdminTopics));
            assert!(hit.contains(&F::DashboardStats));
            assert!(!hit.contains(&F::Questions));
        }
    }

    #[test]
    fn test_answer_writes_hit_admin_answers_and_stats() {
        for kind in [
            MutationKind::AddAnswer,
            MutationKind::UpdateAnswer,
            MutationKind::DeleteAnswer,
        ] {
            let hit = families(kind);
            assert!(hit.contains(&F::Questions));
            assert!(hit.contains(&F::AdminQuestions));
            assert!(hit.contains(&F::AdminAnswers));
            assert!(hit.contains(&F::DashboardStats));
        }
    }

    #[test]
    fn test_question_status_leaves_admin_answers_alone() {
        let hit = families(MutationKind::UpdateQuestionStatus);
        assert!(hit.contains(&F::AdminQuestions));
        assert!(!hit.contains(&F::AdminAnswers));
    }

    #[test]
    fn test_message_writes_target_their_thread() {
        for kind in [
            MutationKind::CreateMessage,
            MutationKind::ReplyToMessage,
            MutationKind::UpdateMessage,
            MutationKind::DeleteMessage,
            MutationKind::HideMessage,
            MutationKind::UnhideMessage,
        ] {
            assert!(kind.invalidates().contains(&AffectedThread));
            let hit = families(kind);
            assert_eq!(hit, vec![F::Messages, F::Conversations]);
        }
    }

    #[test]
    fn test_idempotence_classification() {
        assert!(!MutationKind::CreateTopic.is_idempotent());
        assert!(!MutationKind::ReplyToMessage.is_idempotent());
        assert!(MutationKind::HideMessage.is_idempotent());
        assert!(MutationKind::DeleteAnswer.is_idempotent());
    }
}
