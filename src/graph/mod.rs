//! Knowledge-graph storage module.

mod episodes;
mod store;

pub use episodes::{EpisodeSource, EpisodicNode};
pub use store::{
    index_catalog, EpisodeStore, GraphError, IndexKind, IndexSpec, IndexTarget, MemoryGraph,
    EMBEDDING_DIMENSIONS, EPISODE_WINDOW_LEN,
};
