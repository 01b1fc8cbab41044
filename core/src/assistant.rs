use crate::answer::{general_prompt, local_reply, rag_prompt, try_direct_answer, QuickIntent};
use crate::index::KnowledgeBase;
use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

const EDUCATION_FOCUS: &str = "(Focus on Pakistani educational system if relevant)";

/// Messages remembered per conversation.
pub const CONVERSATION_CAPACITY: usize = 10;
/// Queries remembered overall.
pub const QUERY_LOG_CAPACITY: usize = 50;
/// Conversations remembered at once; the oldest one is forgotten first.
pub const MAX_CONVERSATIONS: usize = 1000;

/// A text generator behind the assistant, e.g. a hosted LLM.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Generator used when none is configured: always fails, so the chain ends locally.
pub struct NoGenerator;

impl Generator for NoGenerator {
    fn generate(&self, _prompt: &str) -> Result<String> {
        Err(anyhow!("no generator configured"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Identity,
    KnowledgeBase,
    Generated,
    LocalFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub answer: String,
    pub source: ReplySource,
    pub confidence: Confidence,
    pub web_search_used: bool,
}

impl ChatReply {
    fn new(answer: impl Into<String>, source: ReplySource, confidence: Confidence) -> Self {
        Self { answer: answer.into(), source, confidence, web_search_used: false }
    }
}

/// Chatbot front: canned intents, then local retrieval, then the generator,
/// then a keyword reply. Never fails.
pub struct Assistant {
    kb: Arc<KnowledgeBase>,
    generator: Arc<dyn Generator>,
}

impl Assistant {
    pub fn new(kb: Arc<KnowledgeBase>, generator: Arc<dyn Generator>) -> Self {
        Self { kb, generator }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase { &self.kb }

    pub fn reply(&self, text: &str, web_search: bool) -> ChatReply {
        if let Some(intent) = QuickIntent::detect(text) {
            return ChatReply::new(intent.answer(), ReplySource::Identity, Confidence::High);
        }

        let attempt = if web_search {
            self.generator
                .generate(&general_prompt(text))
                .map(|answer| ChatReply { web_search_used: true, ..ChatReply::new(answer, ReplySource::Generated, Confidence::High) })
        } else {
            self.retrieval_reply(text).or_else(|err| {
                tracing::warn!(error = %err, "retrieval answer failed, asking generator directly");
                self.generator
                    .generate(&format!("{text} {EDUCATION_FOCUS}"))
                    .map(|answer| ChatReply::new(answer, ReplySource::Generated, Confidence::High))
            })
        };

        attempt.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "generator failed, using local reply");
            ChatReply::new(local_reply(text), ReplySource::LocalFallback, Confidence::Medium)
        })
    }

    fn retrieval_reply(&self, text: &str) -> Result<ChatReply> {
        let relevant = self.kb.search(text);
        if relevant.is_empty() {
            return Err(anyhow!("no relevant information found in knowledge base"));
        }
        if let Some(answer) = try_direct_answer(text, &relevant) {
            return Ok(ChatReply::new(answer, ReplySource::KnowledgeBase, Confidence::High));
        }
        let answer = self.generator.generate(&rag_prompt(text, &relevant))?;
        Ok(ChatReply::new(answer, ReplySource::KnowledgeBase, Confidence::High))
    }
}

/// Bounded per-conversation history plus a global query log.
pub struct ConversationLog {
    inner: Mutex<LogInner>,
    max_conversations: usize,
}

#[derive(Default)]
struct LogInner {
    conversations: HashMap<String, VecDeque<String>>,
    /// Conversation ids, oldest first.
    order: VecDeque<String>,
    queries: VecDeque<String>,
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::with_max_conversations(MAX_CONVERSATIONS)
    }
}

impl ConversationLog {
    pub fn new() -> Self { Self::default() }

    pub fn with_max_conversations(max_conversations: usize) -> Self {
        Self { inner: Mutex::new(LogInner::default()), max_conversations: max_conversations.max(1) }
    }

    pub fn record(&self, conversation_id: Option<&str>, message: &str) {
        let mut inner = self.inner.lock();
        push_bounded(&mut inner.queries, message, QUERY_LOG_CAPACITY);
        let Some(id) = conversation_id else {
            return;
        };
        if !inner.conversations.contains_key(id) {
            while inner.order.len() >= self.max_conversations {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.conversations.remove(&oldest);
                }
            }
            inner.order.push_back(id.to_string());
        }
        let history = inner.conversations.entry(id.to_string()).or_default();
        push_bounded(history, message, CONVERSATION_CAPACITY);
    }

    pub fn num_conversations(&self) -> usize {
        self.inner.lock().conversations.len()
    }

    pub fn history(&self, conversation_id: &str) -> Vec<String> {
        self.inner
            .lock()
            .conversations
            .get(conversation_id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn recent_queries(&self) -> Vec<String> {
        self.inner.lock().queries.iter().cloned().collect()
    }
}

fn push_bounded(queue: &mut VecDeque<String>, message: &str, capacity: usize) {
    queue.push_back(message.to_string());
    while queue.len() > capacity {
        queue.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{IDENTITY_ANSWER, KNOWLEDGE_BASE_NOTE};
    use crate::index::builtin_corpus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo {
        calls: AtomicUsize,
    }

    impl Generator for Echo {
        fn generate(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("generated: {}", prompt.len()))
        }
    }

    fn assistant(generator: Arc<dyn Generator>) -> Assistant {
        Assistant::new(Arc::new(KnowledgeBase::new(builtin_corpus())), generator)
    }

    #[test]
    fn identity_short_circuits() {
        let echo = Arc::new(Echo { calls: AtomicUsize::new(0) });
        let reply = assistant(echo.clone()).reply("who are you", true);
        assert_eq!(reply.answer, IDENTITY_ANSWER);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn direct_answer_needs_no_generator() {
        let reply = assistant(Arc::new(NoGenerator)).reply("Tell me about IBA", false);
        assert_eq!(reply.source, ReplySource::KnowledgeBase);
        assert!(reply.answer.starts_with("## IBA"));
        assert!(reply.answer.ends_with(KNOWLEDGE_BASE_NOTE));
    }

    #[test]
    fn retrieval_without_direct_answer_uses_generator() {
        let echo = Arc::new(Echo { calls: AtomicUsize::new(0) });
        let reply = assistant(echo.clone()).reply("NUST hostels for female students", false);
        assert_eq!(reply.source, ReplySource::KnowledgeBase);
        assert!(reply.answer.starts_with("generated: "));
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_match_escalates_then_falls_back_locally() {
        let echo = Arc::new(Echo { calls: AtomicUsize::new(0) });
        let reply = assistant(echo.clone()).reply("zzzz qqqq", false);
        assert_eq!(reply.source, ReplySource::Generated);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);

        let reply = assistant(Arc::new(NoGenerator)).reply("GIKI fee", false);
        assert_eq!(reply.source, ReplySource::LocalFallback);
        assert!(reply.answer.contains("PKR 300,000"));
    }

    #[test]
    fn web_search_goes_straight_to_generator() {
        let echo = Arc::new(Echo { calls: AtomicUsize::new(0) });
        let reply = assistant(echo).reply("Tell me about NUST", true);
        assert_eq!(reply.source, ReplySource::Generated);
        assert!(reply.web_search_used);
    }

    #[test]
    fn conversation_log_is_bounded() {
        let log = ConversationLog::new();
        for i in 0..12 {
            log.record(Some("c1"), &format!("m{i}"));
        }
        log.record(None, "anonymous");
        let history = log.history("c1");
        assert_eq!(history.len(), CONVERSATION_CAPACITY);
        assert_eq!(history[0], "m2");
        assert_eq!(log.recent_queries().len(), 13);
        assert!(log.history("missing").is_empty());
    }

    #[test]
    fn oldest_conversation_is_forgotten() {
        let log = ConversationLog::with_max_conversations(3);
        for i in 0..5 {
            log.record(Some(&format!("conv-{i}")), "hi");
        }
        log.record(Some("conv-4"), "again");
        assert_eq!(log.num_conversations(), 3);
        assert!(log.history("conv-0").is_empty());
        assert!(log.history("conv-1").is_empty());
        assert_eq!(log.history("conv-2"), vec!["hi"]);
        assert_eq!(log.history("conv-4"), vec!["hi", "again"]);

        let default_log = ConversationLog::new();
        for i in 0..MAX_CONVERSATIONS + 10 {
            default_log.record(Some(&format!("conv-{i}")), "hi");
        }
        assert_eq!(default_log.num_conversations(), MAX_CONVERSATIONS);
        assert!(default_log.history("conv-0").is_empty());
    }
}
