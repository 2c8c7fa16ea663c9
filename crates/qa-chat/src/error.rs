//! Error types for the QA conversational engine.

use qa_core::error::QaError;

use crate::state_machine::{Edge, NodeId};

/// Errors from the chat engine (C7).
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("no transition defined from {from:?} on edge {edge:?}")]
    InvalidTransition { from: NodeId, edge: Edge },
    #[error("web search failed: {0}")]
    WebSearchFailed(String),
    #[error("answer generation failed: {0}")]
    GenerationFailed(String),
    #[error(transparent)]
    Core(#[from] QaError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::EmptyMessage;
        assert_eq!(err.to_string(), "message cannot be empty");

        let err = ChatError::MessageTooLong(5000);
        assert_eq!(
            err.to_string(),
            "message exceeds maximum length of 5000 characters"
        );

        let err = ChatError::SessionNotFound("s1".to_string());
        assert_eq!(err.to_string(), "session not found: s1");

        let err = ChatError::WebSearchFailed("timeout".to_string());
        assert_eq!(err.to_string(), "web search failed: timeout");

        let err = ChatError::GenerationFailed("template missing".to_string());
        assert_eq!(err.to_string(), "answer generation failed: template missing");
    }

    #[test]
    fn test_chat_error_invalid_transition_mentions_nodes() {
        let err = ChatError::InvalidTransition {
            from: NodeId::End,
            edge: Edge::Unconditional,
        };
        let msg = err.to_string();
        assert!(msg.contains("End"));
        assert!(msg.contains("Unconditional"));
    }

    #[test]
    fn test_chat_error_from_qa_error() {
        let core_err = QaError::PreconditionPolicyNotInitialized;
        let chat_err: ChatError = core_err.into();
        assert!(matches!(chat_err, ChatError::Core(_)));
    }

    #[test]
    fn test_chat_error_message_too_long_boundary_zero() {
        let err = ChatError::MessageTooLong(0);
        assert_eq!(
            err.to_string(),
            "message exceeds maximum length of 0 characters"
        );
    }

    #[test]
    fn test_errors_implement_debug() {
        let err = ChatError::EmptyMessage;
        let dbg = format!("{:?}", err);
        assert!(dbg.contains("EmptyMessage"));

        let err = ChatError::MessageTooLong(100);
        let dbg = format!("{:?}", err);
        assert!(dbg.contains("MessageTooLong"));
    }
}
