mod file;
mod model;
mod service;

pub use file::FileGraphService;
pub use model::{GraphEdge, GraphNode, GraphSnapshot, NodeDetails, Taxonomy, TaxonomyStyle};
pub use service::GraphService;
