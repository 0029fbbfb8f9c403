//! Memory compaction: fold old turns into a rolling summary and truncate
//! raw history.
//!
//! Compaction keeps the prompt context bounded for unbounded conversations.
//! Every `window` user messages, the pipeline summarizes the prior summary
//! plus the most recent turns into a single replacement summary, then
//! deletes every raw turn older than the retained window. Raw text outside
//! the window is recoverable only through the summary; this is a lossy,
//! intentional trade.

use std::sync::Arc;

use tracing::{debug, info, warn};

use valet_types::error::CompactionError;
use valet_types::llm::{CompletionRequest, Message};

use crate::chat::ConversationRepository;
use crate::llm::BoxLlmProvider;

/// Owns the rolling-summary and history-truncation policy for sessions.
pub struct Compactor<R> {
    repository: Arc<R>,
    llm: Arc<BoxLlmProvider>,
    model: String,
    window: u64,
}

impl<R: ConversationRepository> Compactor<R> {
    pub fn new(repository: Arc<R>, llm: Arc<BoxLlmProvider>, model: String, window: u64) -> Self {
        Self {
            repository,
            llm,
            model,
            window,
        }
    }

    /// Run compaction for a session if its message count sits on a window
    /// boundary. All other invocations are no-ops.
    ///
    /// The authoritative turn count is re-read from the store rather than
    /// trusted from the caller, so concurrent writers to the same session
    /// are observed. Running twice for the same count is safe: the summary
    /// is overwritten with equivalent content and deleting already-deleted
    /// rows is a no-op.
    pub async fn maybe_compact(
        &self,
        session_id: &str,
        user_message_count: u64,
    ) -> Result<(), CompactionError> {
        if user_message_count == 0 || user_message_count % self.window != 0 {
            return Ok(());
        }

        let count = self.repository.turn_count(session_id).await?;
        if count < self.window {
            debug!(session_id, count, "turn count below window, skipping compaction");
            return Ok(());
        }

        let recent = self
            .repository
            .recent_turns(session_id, self.window as usize)
            .await?;
        let prior = self.repository.current_summary(session_id).await?;

        let prompt = summarization_prompt(prior.as_ref().map(|s| s.text.as_str()), &recent);
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(
                    "You condense conversation history. Reply with only the summary text.",
                ),
                Message::user(&prompt),
            ],
            max_tokens: 512,
            temperature: Some(0.3),
        };
        let response = self.llm.complete(&request).await?;

        // Round down to the window boundary; keeps the recorded count a
        // multiple of the window even if a concurrent writer slipped in.
        let at_count = (count / self.window) * self.window;
        self.repository
            .replace_summary(session_id, response.content.trim(), at_count)
            .await?;

        let excess = count.saturating_sub(self.window);
        if excess > 0 {
            let deleted = self
                .repository
                .delete_oldest_turns(session_id, excess)
                .await?;
            debug!(session_id, deleted, "truncated raw turns");
        }

        info!(session_id, at_count, "compacted session history");
        Ok(())
    }

    /// Fire-and-forget compaction from the reply pipeline.
    ///
    /// Spawns a detached task with its own error boundary: failures are
    /// logged and swallowed, never surfaced to the awaiting caller. The
    /// next window boundary is the natural retry point.
    pub fn spawn(self: &Arc<Self>, session_id: String, user_message_count: u64)
    where
        R: 'static,
    {
        let compactor = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = compactor
                .maybe_compact(&session_id, user_message_count)
                .await
            {
                warn!(session_id, error = %err, "background compaction failed");
            }
        });
    }
}

fn summarization_prompt(prior: Option<&str>, recent: &[valet_types::chat::Turn]) -> String {
    let mut prompt = String::new();
    if let Some(prior) = prior {
        prompt.push_str("Previous summary:\n");
        prompt.push_str(prior);
        prompt.push_str("\n\n");
    }
    prompt.push_str("Recent conversation:\n");
    for turn in recent {
        prompt.push_str("User: ");
        prompt.push_str(&turn.user_input);
        prompt.push_str("\nAssistant: ");
        prompt.push_str(&turn.response);
        prompt.push('\n');
    }
    prompt.push_str(
        "\nFold everything above into one concise summary that preserves names, \
         facts, and open tasks.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_stubs::{FailingLlm, MemoryRepository, StubLlm};

    fn compactor(repo: Arc<MemoryRepository>) -> Arc<Compactor<MemoryRepository>> {
        Arc::new(Compactor::new(
            repo,
            Arc::new(BoxLlmProvider::new(StubLlm::with_reply("condensed"))),
            "test-model".to_string(),
            5,
        ))
    }

    #[tokio::test]
    async fn first_window_boundary_writes_summary_and_keeps_window_turns() {
        let repo = Arc::new(MemoryRepository::default());
        repo.seed_turns("s1", 5).await;

        compactor(Arc::clone(&repo))
            .maybe_compact("s1", 5)
            .await
            .unwrap();

        let summary = repo.current_summary("s1").await.unwrap().unwrap();
        assert_eq!(summary.text, "condensed");
        assert_eq!(summary.last_compacted_turn_count, 5);
        assert_eq!(repo.turn_count("s1").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn second_window_boundary_replaces_summary_and_truncates() {
        let repo = Arc::new(MemoryRepository::default());
        repo.seed_turns("s1", 10).await;
        repo.replace_summary("s1", "old summary", 5).await.unwrap();

        compactor(Arc::clone(&repo))
            .maybe_compact("s1", 10)
            .await
            .unwrap();

        let summary = repo.current_summary("s1").await.unwrap().unwrap();
        assert_eq!(summary.text, "condensed");
        assert_eq!(summary.last_compacted_turn_count, 10);
        // Only the most recent window of raw turns survives.
        assert_eq!(repo.turn_count("s1").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn off_boundary_counts_are_no_ops() {
        let repo = Arc::new(MemoryRepository::default());
        repo.seed_turns("s1", 3).await;

        compactor(Arc::clone(&repo))
            .maybe_compact("s1", 3)
            .await
            .unwrap();

        assert!(repo.current_summary("s1").await.unwrap().is_none());
        assert_eq!(repo.turn_count("s1").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn zero_count_is_a_no_op() {
        let repo = Arc::new(MemoryRepository::default());
        compactor(Arc::clone(&repo))
            .maybe_compact("s1", 0)
            .await
            .unwrap();
        assert!(repo.current_summary("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn running_twice_for_same_count_is_safe() {
        let repo = Arc::new(MemoryRepository::default());
        repo.seed_turns("s1", 5).await;
        let c = compactor(Arc::clone(&repo));

        c.maybe_compact("s1", 5).await.unwrap();
        c.maybe_compact("s1", 5).await.unwrap();

        let summary = repo.current_summary("s1").await.unwrap().unwrap();
        assert_eq!(summary.last_compacted_turn_count, 5);
        assert_eq!(repo.turn_count("s1").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn summarizer_failure_leaves_history_untouched() {
        let repo = Arc::new(MemoryRepository::default());
        repo.seed_turns("s1", 10).await;
        let c = Arc::new(Compactor::new(
            Arc::clone(&repo),
            Arc::new(BoxLlmProvider::new(FailingLlm)),
            "test-model".to_string(),
            5,
        ));

        assert!(c.maybe_compact("s1", 10).await.is_err());
        assert!(repo.current_summary("s1").await.unwrap().is_none());
        assert_eq!(repo.turn_count("s1").await.unwrap(), 10);
    }

    #[test]
    fn prompt_includes_prior_summary_when_present() {
        let prompt = summarization_prompt(Some("they are Alex"), &[]);
        assert!(prompt.contains("Previous summary:"));
        assert!(prompt.contains("they are Alex"));
    }
}
