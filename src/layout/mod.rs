mod dagre;
mod error;
pub mod layered;
mod ranking;
mod routing;
pub(crate) mod types;
pub use dagre::DagreEngine;
pub use error::LayoutError;
pub use layered::{LayeredEngine, LayeredResult, LayeredSpec, layout_layered};
pub use ranking::{Forest, RankLayout, RankSpan, layout_ranks, subtree_weights};
pub use routing::{
    NodeBox, compress_path, is_orthogonal, orthogonal_route, path_bend_count, straight_route,
};
pub use types::*;

use crate::assemble::assemble;
use crate::config::LayoutConfig;

/// Rank layout end to end: positions, straight routes, validation.
pub fn layout_with_ranks(graph: CanonicalGraph, config: &LayoutConfig) -> GraphPayload {
    let CanonicalGraph {
        nodes,
        edges,
        diagnostics,
    } = graph;
    let ranked = layout_ranks(nodes, edges, config);
    assemble(ranked.nodes, ranked.edges, diagnostics)
}

/// Layered layout end to end. Engine failures are returned, not masked; the
/// caller decides whether to fall back to [`layout_with_ranks`].
pub async fn layout_with_engine(
    graph: CanonicalGraph,
    engine: &dyn LayeredEngine,
    config: &LayoutConfig,
) -> Result<GraphPayload, LayoutError> {
    let laid = layout_layered(graph, engine, config).await?;
    Ok(assemble(laid.nodes, laid.edges, laid.diagnostics))
}

/// Dispatches on `strategy`. [`Strategy::Ranks`] never touches the engine.
pub async fn compute_layout(
    graph: CanonicalGraph,
    strategy: Strategy,
    engine: &dyn LayeredEngine,
    config: &LayoutConfig,
) -> Result<GraphPayload, LayoutError> {
    match strategy {
        Strategy::Ranks => Ok(layout_with_ranks(graph, config)),
        Strategy::Layered => layout_with_engine(graph, engine, config).await,
    }
}
