//! Scatter output handed to the host: placement records and the spawner seam.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::biome::BiomeId;

/// One object to instantiate. Generation never touches it again once emitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnRecord {
    /// Key the spawner resolves to a prefab or asset.
    pub object_key: String,
    /// World position; `y` is the terrain height at the placement.
    pub position: DVec3,
    /// Yaw in degrees.
    pub rotation: f64,
    /// Uniform scale.
    pub scale: f64,
    /// Key of the [`SpawnGroup`] this record belongs to.
    pub group_id: String,
}

/// All records produced by one root scatter rule of one biome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnGroup {
    /// `"Biome_<biome name>_<rule index>"`.
    pub key: String,
    /// Biome the rule belongs to.
    pub biome: BiomeId,
    /// Root rule name.
    pub rule: String,
    /// Records in placement order, children after their parents.
    pub records: Vec<SpawnRecord>,
}

impl SpawnGroup {
    /// Group key for rule `rule_index` of the biome named `biome_name`.
    pub fn key_for(biome_name: &str, rule_index: usize) -> String {
        format!("Biome_{biome_name}_{rule_index}")
    }
}

/// Consumer of scatter output: resolves keys, snaps to ground, instantiates.
pub trait ObjectSpawner {
    /// Receive every group from a completed scatter pass, in order.
    fn spawn(&mut self, groups: &[SpawnGroup]);
}

/// Spawner that keeps every group it receives, for hosts that persist the
/// list instead of instantiating it.
#[derive(Clone, Debug, Default)]
pub struct CollectingSpawner {
    /// Groups from every scatter pass, oldest first.
    pub groups: Vec<SpawnGroup>,
}

impl ObjectSpawner for CollectingSpawner {
    fn spawn(&mut self, groups: &[SpawnGroup]) {
        self.groups.extend_from_slice(groups);
    }
}
