//! Templated prompt construction and the deterministic stand-in
//! `AnswerGenerator` (C7's answer nodes). A real LLM backend implements
//! the same `qa_core::ports::AnswerGenerator` trait and drops in without
//! touching the orchestrator.

use std::sync::LazyLock;

use async_trait::async_trait;
use qa_core::error::QaError;
use qa_core::ports::AnswerGenerator;
use qa_core::types::{ChatRole, ChatTurn, DocumentChunk, Evidence, PolicyRecord, WebResult};
use regex::Regex;

const EXCERPT_LEN: usize = 160;
const HISTORY_TURNS_IN_PROMPT: usize = 4;

/// Apology returned when neither policy documents nor web results are
/// available to ground an answer.
pub const FALLBACK_APOLOGY: &str =
    "죄송합니다. 관련 정보를 찾을 수 없어 답변을 생성하지 못했습니다.";

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}

/// Build the templated prompt handed to the `AnswerGenerator`. Every
/// document and web result is presented as a numbered `[정책문서 i]` /
/// `[웹 j]` block so the generator — real or templated — can cite it
/// verbatim (§4.7's citation contract).
pub fn build_prompt(
    policy: Option<&PolicyRecord>,
    docs: &[DocumentChunk],
    web: &[WebResult],
    history: &[ChatTurn],
    query: &str,
) -> String {
    let mut sections = Vec::new();

    if let Some(policy) = policy {
        sections.push(format!("정책명: {}\n개요: {}", policy.name, policy.overview));
    }

    if !docs.is_empty() {
        let mut block = String::from("정책 문서 발췌:\n");
        for (i, doc) in docs.iter().enumerate() {
            block.push_str(&format!(
                "[정책문서 {}] {}\n",
                i + 1,
                truncate(&doc.content, EXCERPT_LEN)
            ));
        }
        sections.push(block);
    }

    if !web.is_empty() {
        let mut block = String::from("웹 검색 결과:\n");
        for (j, result) in web.iter().enumerate() {
            block.push_str(&format!(
                "[웹 {}] {}: {}\n",
                j + 1,
                result.title,
                truncate(&result.snippet, EXCERPT_LEN)
            ));
        }
        sections.push(block);
    }

    if !history.is_empty() {
        let mut block = String::from("이전 대화:\n");
        let recent = history
            .iter()
            .rev()
            .take(HISTORY_TURNS_IN_PROMPT)
            .collect::<Vec<_>>();
        for turn in recent.into_iter().rev() {
            let speaker = match turn.role {
                ChatRole::User => "사용자",
                ChatRole::Assistant => "상담원",
            };
            block.push_str(&format!("{speaker}: {}\n", turn.content));
        }
        sections.push(block);
    }

    sections.push(format!("질문: {query}"));
    sections.push(
        "위 자료를 바탕으로 답변하고, 사실 주장마다 [정책문서 i] 또는 [웹 j] 형식으로 출처를 표시하세요."
            .to_string(),
    );

    sections.join("\n\n")
}

/// `evidence[0..docs.len()]` in presentation order, matching the indices
/// the prompt assigned as `[정책문서 i]`.
pub fn build_internal_evidence(docs: &[DocumentChunk]) -> Vec<Evidence> {
    docs.iter()
        .map(|d| Evidence::Internal {
            policy_id: d.policy_id,
            chunk_index: d.chunk_index,
            doc_type: d.doc_type.clone(),
            content_excerpt: truncate(&d.content, EXCERPT_LEN),
            score: 1.0,
            link: "policy_detail".to_string(),
        })
        .collect()
}

/// Web evidence in the same order as `web`, matching `[웹 j]` indices.
pub fn build_web_evidence(web: &[WebResult]) -> Vec<Evidence> {
    web.iter()
        .map(|w| Evidence::Web {
            title: w.title.clone(),
            url: w.url.clone(),
            snippet: truncate(&w.snippet, EXCERPT_LEN),
            fetched_date: w.fetched_date.clone(),
            score: w.score,
            link: "external".to_string(),
        })
        .collect()
}

static CITATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(정책문서|웹) (\d+)\] (.*)$").expect("invalid citation line regex")
});

/// Deterministic extractive stand-in for a real LLM backend: walks the
/// numbered blocks `build_prompt` emitted and restates each excerpt with
/// its citation token attached. Never fails.
#[derive(Debug, Default)]
pub struct TemplateAnswerGenerator;

impl TemplateAnswerGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnswerGenerator for TemplateAnswerGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, QaError> {
        let mut sentences = Vec::new();
        for line in prompt.lines() {
            if let Some(caps) = CITATION_LINE.captures(line) {
                let label = &caps[1];
                let index = &caps[2];
                let body = caps[3].trim();
                if !body.is_empty() {
                    sentences.push(format!("{body} [{label} {index}]"));
                }
            }
        }

        if sentences.is_empty() {
            return Ok(FALLBACK_APOLOGY.to_string());
        }

        Ok(sentences.join(" "))
    }
}
