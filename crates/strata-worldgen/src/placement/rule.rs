//! Declarative scatter rules: density, spacing, and terrain filters for
//! discrete object placement.

use serde::{Deserialize, Serialize};

/// Terrain category a rule targets. Anything but [`PlacementCategory::Any`]
/// overrides the rule's own slope range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementCategory {
    /// Use the rule's `slope_range` as configured.
    #[default]
    Any,
    /// 0–15 degrees.
    Flat,
    /// 15–45 degrees.
    Slope,
    /// 45–90 degrees.
    Cliff,
}

impl PlacementCategory {
    /// Slope range in degrees this category forces, if any.
    pub fn slope_range(self) -> Option<(f64, f64)> {
        match self {
            Self::Any => None,
            Self::Flat => Some((0.0, 15.0)),
            Self::Slope => Some((15.0, 45.0)),
            Self::Cliff => Some((45.0, 90.0)),
        }
    }
}

/// Landform a candidate must sit on, answered by a terrain feature map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainFeature {
    /// Top lip of a cliff.
    CliffEdge,
    /// Foot of a cliff.
    CliffBase,
    /// Local depression.
    Valley,
}

/// Clustered placement: each accepted center spawns a tight group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    /// Inclusive range of members per cluster, center included.
    pub cluster_size: (usize, usize),
    /// Radius around the center members are placed within.
    pub spread: f64,
    /// Spacing enforced between members of the same cluster.
    pub local_spacing: f64,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            cluster_size: (3, 6),
            spread: 6.0,
            local_spacing: 1.5,
        }
    }
}

/// A rule placed in an annulus around every accepted parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildRule {
    /// Constraints and outputs of the child placements.
    pub rule: ScatterRule,
    /// Inner annulus radius.
    pub radius_min: f64,
    /// Outer annulus radius.
    pub radius_max: f64,
    /// Inclusive range of children per parent.
    pub count: (usize, usize),
    /// Use the parent's terrain filter instead of the child rule's own.
    pub inherit_terrain_filter: bool,
}

impl Default for ChildRule {
    fn default() -> Self {
        Self {
            rule: ScatterRule::default(),
            radius_min: 1.0,
            radius_max: 4.0,
            count: (1, 3),
            inherit_terrain_filter: true,
        }
    }
}

/// Terrain constraints a candidate must satisfy.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainFilter {
    /// Allowed normalized height range, inclusive.
    pub height_range: (f64, f64),
    /// Allowed slope range in degrees, inclusive.
    pub slope_range: (f64, f64),
    /// Whitelist of dominant splat layers; `None` allows all.
    pub allowed_layers: Option<Vec<usize>>,
    /// Required landform; `None` allows all.
    pub feature: Option<TerrainFeature>,
}

/// Density, spacing, and terrain constraints for one kind of object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterRule {
    /// Rule name, used in logs.
    pub name: String,
    /// Object keys handed to the spawner; one is picked per placement.
    pub object_keys: Vec<String>,
    /// Placements per 100 square world units when `fixed_count` is unset.
    pub density: f64,
    /// Exact target count, overriding `density`.
    pub fixed_count: Option<usize>,
    /// Minimum distance to every previously accepted placement.
    pub min_spacing: f64,
    /// Allowed normalized height range.
    pub height_range: (f64, f64),
    /// Allowed slope range in degrees.
    pub slope_range: (f64, f64),
    /// Category overriding `slope_range`.
    pub category: PlacementCategory,
    /// Dominant splat layer whitelist.
    pub allowed_layers: Option<Vec<usize>>,
    /// Required landform.
    pub feature: Option<TerrainFeature>,
    /// Candidate draws allowed per target placement.
    pub max_attempts: usize,
    /// Clustered placement; `None` places uniformly.
    pub cluster: Option<ClusterSettings>,
    /// Rules placed around each accepted placement.
    pub children: Vec<ChildRule>,
    /// Inclusive uniform scale range.
    pub scale_range: (f64, f64),
    /// Randomize yaw; otherwise rotation is 0.
    pub random_rotation: bool,
}

impl Default for ScatterRule {
    fn default() -> Self {
        Self {
            name: "scatter".into(),
            object_keys: Vec::new(),
            density: 0.5,
            fixed_count: None,
            min_spacing: 4.0,
            height_range: (0.0, 1.0),
            slope_range: (0.0, 90.0),
            category: PlacementCategory::Any,
            allowed_layers: None,
            feature: None,
            max_attempts: 30,
            cluster: None,
            children: Vec::new(),
            scale_range: (1.0, 1.0),
            random_rotation: true,
        }
    }
}

impl ScatterRule {
    /// Number of placements to aim for over `area` square world units:
    /// `fixed_count` if set, otherwise `round(area / 100 * density)`.
    pub fn target_count(&self, area: f64) -> usize {
        match self.fixed_count {
            Some(count) => count,
            None => (area / 100.0 * self.density).round().max(0.0) as usize,
        }
    }

    /// Slope range after applying the category override.
    pub fn effective_slope_range(&self) -> (f64, f64) {
        self.category.slope_range().unwrap_or(self.slope_range)
    }

    /// The rule's terrain constraints.
    pub fn terrain_filter(&self) -> TerrainFilter {
        TerrainFilter {
            height_range: self.height_range,
            slope_range: self.effective_slope_range(),
            allowed_layers: self.allowed_layers.clone(),
            feature: self.feature,
        }
    }
}
