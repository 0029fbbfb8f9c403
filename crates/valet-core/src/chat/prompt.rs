//! Prompt assembly for the reply pipeline.
//!
//! Builds the bounded message list sent to the inference collaborator:
//! a system message carrying the rolling summary, durable memories, and
//! any retrieved knowledge, followed by the recent raw turns and the
//! current user message.

use valet_types::chat::Turn;
use valet_types::llm::Message;
use valet_types::memory::{Memory, RetrievedChunk};

const PERSONA: &str = "You are Valet, a helpful personal assistant. Be concise and direct. \
     Use the context below when it is relevant; never invent facts about the user.";

/// Everything the prompt builder folds into the system message.
#[derive(Debug, Default)]
pub struct PromptContext<'a> {
    pub summary: Option<&'a str>,
    pub memories: &'a [Memory],
    pub chunks: &'a [RetrievedChunk],
}

/// Assemble the full message list for one reply.
///
/// `recent` is oldest-first; each turn contributes a user/assistant pair.
pub fn build_messages(context: &PromptContext<'_>, recent: &[Turn], user_message: &str) -> Vec<Message> {
    let mut system = String::from(PERSONA);

    if let Some(summary) = context.summary {
        system.push_str("\n\nConversation so far (condensed):\n");
        system.push_str(summary);
    }

    if !context.memories.is_empty() {
        system.push_str("\n\nThings you know about the user:\n");
        for memory in context.memories {
            system.push_str("- [");
            system.push_str(&memory.category.to_string());
            system.push_str("] ");
            system.push_str(&memory.content);
            system.push('\n');
        }
    }

    if !context.chunks.is_empty() {
        system.push_str("\n\nRelevant knowledge:\n");
        for chunk in context.chunks {
            if let Some(title) = &chunk.title {
                system.push_str("## ");
                system.push_str(title);
                system.push('\n');
            }
            system.push_str(&chunk.content);
            system.push('\n');
        }
    }

    let mut messages = Vec::with_capacity(2 + recent.len() * 2);
    messages.push(Message::system(system));
    for turn in recent {
        messages.push(Message::user(&turn.user_input));
        messages.push(Message::assistant(&turn.response));
    }
    messages.push(Message::user(user_message));
    messages
}
