//! C7's explicit transition table: `(NodeId, Edge) -> NodeId`, validated
//! the same way the teacher validates task-status transitions, rather than
//! hand-wired branches in the orchestrator.

use crate::error::ChatError;

/// A node of the QA workflow graph (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    ClassifyQueryType,
    LoadCachedDocs,
    CheckSufficiency,
    WebSearchOnly,
    WebSearchSupplement,
    AnswerDocsOnly,
    AnswerWebOnly,
    AnswerHybrid,
    End,
}

/// The outcome a node produced, driving which edge out of it is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    WebOnly,
    PolicyQa,
    Sufficient,
    Insufficient,
    PreconditionFailed,
    Unconditional,
}

/// Validate and resolve a transition. Returns the next node, or
/// `ChatError::InvalidTransition` if `(from, edge)` is not one of the
/// graph's defined edges.
///
/// Valid transitions:
/// - ClassifyQueryType --WebOnly--> WebSearchOnly
/// - ClassifyQueryType --PolicyQa--> LoadCachedDocs
/// - LoadCachedDocs --Unconditional--> CheckSufficiency
/// - LoadCachedDocs --PreconditionFailed--> End
/// - CheckSufficiency --Sufficient--> AnswerDocsOnly
/// - CheckSufficiency --Insufficient--> WebSearchSupplement
/// - WebSearchSupplement --Unconditional--> AnswerHybrid
/// - WebSearchOnly --Unconditional--> AnswerWebOnly
/// - AnswerDocsOnly / AnswerWebOnly / AnswerHybrid --Unconditional--> End
pub fn next_node(from: NodeId, edge: Edge) -> Result<NodeId, ChatError> {
    use Edge::*;
    use NodeId::*;

    let next = match (from, edge) {
        (ClassifyQueryType, WebOnly) => WebSearchOnly,
        (ClassifyQueryType, PolicyQa) => LoadCachedDocs,
        (LoadCachedDocs, Unconditional) => CheckSufficiency,
        (LoadCachedDocs, PreconditionFailed) => End,
        (CheckSufficiency, Sufficient) => AnswerDocsOnly,
        (CheckSufficiency, Insufficient) => WebSearchSupplement,
        (WebSearchSupplement, Unconditional) => AnswerHybrid,
        (WebSearchOnly, Unconditional) => AnswerWebOnly,
        (AnswerDocsOnly, Unconditional) => End,
        (AnswerWebOnly, Unconditional) => End,
        (AnswerHybrid, Unconditional) => End,
        _ => return Err(ChatError::InvalidTransition { from, edge }),
    };

    Ok(next)
}
