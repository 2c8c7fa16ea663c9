//! C7's central coordinator: walks the state-machine graph, reading and
//! writing the shared session caches and calling out to C6/C_llm through
//! the `WebSearchAdapter` / `AnswerGenerator` ports.

use std::sync::Arc;

use qa_core::error::QaError;
use qa_core::ports::{AnswerGenerator, WebSearchAdapter};
use qa_core::types::{ChatTurn, DocumentChunk, Evidence, PolicyRecord, QueryType, WebResult};

use crate::answer::{build_internal_evidence, build_prompt, build_web_evidence, FALLBACK_APOLOGY};
use crate::cache::{ChatCache, PolicyContextCache};
use crate::classify::{classify_query_type, is_homepage_or_url_query};
use crate::error::ChatError;
use crate::state_machine::{next_node, Edge, NodeId};

/// Message length ceiling (characters).
const MAX_MESSAGE_LENGTH: usize = 2000;
/// Below this chunk count, `check_sufficiency` treats the cached docs as
/// insufficient even if present.
const MIN_SUFFICIENT_DOC_COUNT: usize = 3;
/// `web_search_only` / `web_search_supplement` cap (§4.7).
const MAX_WEB_RESULTS: usize = 5;

/// Request-local accumulator threaded through the graph walk. Mirrors
/// `QAState` one field at a time as each node runs.
#[derive(Debug, Default)]
struct QaState {
    query_type: Option<QueryType>,
    policy_info: Option<PolicyRecord>,
    retrieved_docs: Vec<DocumentChunk>,
    web_sources: Vec<WebResult>,
    answer: String,
    evidence: Vec<Evidence>,
    need_web_search: bool,
    precondition_failed: bool,
}

/// C7: the finite-state QA orchestrator.
pub struct QaWorkflow {
    chat_cache: Arc<ChatCache>,
    policy_cache: Arc<PolicyContextCache>,
    web_search: Arc<dyn WebSearchAdapter>,
    generator: Arc<dyn AnswerGenerator>,
}

impl QaWorkflow {
    pub fn new(
        chat_cache: Arc<ChatCache>,
        policy_cache: Arc<PolicyContextCache>,
        web_search: Arc<dyn WebSearchAdapter>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            chat_cache,
            policy_cache,
            web_search,
            generator,
        }
    }

    /// Run one chat turn to completion: classify, load cached docs,
    /// decide sufficiency, optionally enrich from the web, generate an
    /// answer, and append both the user and assistant turns to the
    /// session's `ChatCache`.
    pub async fn run(&self, session_id: &str, query: &str) -> Result<ChatTurn, ChatError> {
        if query.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if query.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ChatError::MessageTooLong(MAX_MESSAGE_LENGTH));
        }

        let history = self.chat_cache.history(session_id);
        let mut state = QaState::default();

        let mut node = NodeId::ClassifyQueryType;
        loop {
            node = match node {
                NodeId::ClassifyQueryType => {
                    let query_type = classify_query_type(query);
                    state.query_type = Some(query_type);
                    let edge = match query_type {
                        QueryType::WebOnly => Edge::WebOnly,
                        QueryType::PolicyQa => Edge::PolicyQa,
                    };
                    next_node(node, edge)?
                }
                NodeId::LoadCachedDocs => match self.policy_cache.get(session_id) {
                    Some(ctx) => {
                        state.policy_info = Some(ctx.policy);
                        state.retrieved_docs = ctx.chunks;
                        next_node(node, Edge::Unconditional)?
                    }
                    None => {
                        state.precondition_failed = true;
                        next_node(node, Edge::PreconditionFailed)?
                    }
                },
                NodeId::CheckSufficiency => {
                    let insufficient = state.retrieved_docs.is_empty()
                        || state.policy_info.is_none()
                        || is_homepage_or_url_query(query)
                        || state.retrieved_docs.len() < MIN_SUFFICIENT_DOC_COUNT;
                    state.need_web_search = insufficient;
                    if insufficient {
                        next_node(node, Edge::Insufficient)?
                    } else {
                        next_node(node, Edge::Sufficient)?
                    }
                }
                NodeId::WebSearchOnly | NodeId::WebSearchSupplement => {
                    let search_query = match &state.policy_info {
                        Some(policy) => format!("{} {}", policy.name, query),
                        None => query.to_string(),
                    };
                    state.web_sources = match self
                        .web_search
                        .search(&search_query, MAX_WEB_RESULTS, None)
                        .await
                    {
                        Ok(results) => results,
                        Err(err) => {
                            tracing::warn!(error = %err, "web search failed, proceeding without web sources");
                            Vec::new()
                        }
                    };
                    next_node(node, Edge::Unconditional)?
                }
                NodeId::AnswerDocsOnly | NodeId::AnswerWebOnly | NodeId::AnswerHybrid => {
                    let prompt = build_prompt(
                        state.policy_info.as_ref(),
                        &state.retrieved_docs,
                        &state.web_sources,
                        &history,
                        query,
                    );
                    match self.generator.generate(&prompt).await {
                        Ok(answer) => {
                            let mut evidence = build_internal_evidence(&state.retrieved_docs);
                            evidence.extend(build_web_evidence(&state.web_sources));
                            state.answer = answer;
                            state.evidence = evidence;
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "answer generator failed, returning fallback apology");
                            state.answer = FALLBACK_APOLOGY.to_string();
                            state.evidence = Vec::new();
                        }
                    }
                    next_node(node, Edge::Unconditional)?
                }
                NodeId::End => break,
            };
        }

        if state.precondition_failed {
            return Err(ChatError::Core(QaError::PreconditionPolicyNotInitialized));
        }

        let turn = ChatTurn::assistant(state.answer.clone(), state.evidence.clone());
        self.chat_cache.append(session_id, ChatTurn::user(query));
        self.chat_cache.append(session_id, turn.clone());
        Ok(turn)
    }
}
