//! Constrained point sampling for discrete object placement.
//!
//! [`ScatterRule`]s describe what may go where; [`PlacementValidator`] checks
//! single candidates against terrain and spacing; [`PositionGenerator`] drives
//! uniform, clustered, and hierarchical rejection sampling on top of it.

mod feature;
mod generator;
mod rule;
mod validator;

pub use feature::{SlopeFeatureMap, TerrainFeatureMap};
pub use generator::{MAX_CHILD_DEPTH, Placement, PositionGenerator, ScatterStats};
pub use rule::{
    ChildRule, ClusterSettings, PlacementCategory, ScatterRule, TerrainFeature, TerrainFilter,
};
pub use validator::{PlacementValidator, Rejection};
