use crate::NodeId;

/// Failures reported by an [`crate::Applier`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("node {id} missing")]
    Missing { id: NodeId },
    #[error("node {child} is not a child of node {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
}

/// Reasons a render pass was aborted.
///
/// Whenever one of these is returned the in-flight tree has been discarded
/// and the previously committed tree stays current.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("component `{name}` failed to render")]
    Component {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Host(#[from] NodeError),
    #[error("deleted fiber has no host node beneath it")]
    MissingHostNode,
    #[error("no ancestor of the fiber owns a host node")]
    MissingHostParent,
}
