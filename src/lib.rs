pub mod algorithm;
pub mod arena;
pub mod common;
pub mod config;
pub mod error;
pub mod frontier;
pub mod map;
pub mod scenario;
pub mod sequence;
pub mod set;
pub mod stat;

pub use algorithm::{a_star_search, find_path, mdd_search, MddOptions, PathRequest, PathResponse, SearchLimits};
pub use common::{EdgeConstraint, Mdd, Path, Point, VertexConstraint};
pub use error::SearchError;
pub use map::Map;
