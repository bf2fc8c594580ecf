//! Position generation: uniform, clustered, and hierarchical rejection sampling.

use std::f64::consts::TAU;

use glam::DVec2;
use rand::Rng;

use super::{ClusterSettings, PlacementValidator, Rejection, ScatterRule, TerrainFilter};
use crate::seed::{det_cos, det_sin, det_sqrt};

/// Deepest level of child rules placed below a root rule.
///
/// Rule trees come from configuration and may be cyclic through cloning, so
/// recursion stops here regardless of the tree's shape.
pub const MAX_CHILD_DEPTH: usize = 3;

/// An accepted position and the rule that produced it.
#[derive(Clone, Copy, Debug)]
pub struct Placement<'r> {
    /// World XZ position.
    pub position: DVec2,
    /// Rule the placement satisfies.
    pub rule: &'r ScatterRule,
    /// 0 for root placements, 1..=[`MAX_CHILD_DEPTH`] for children.
    pub depth: usize,
    /// Index of the parent placement in the same result list.
    pub parent: Option<usize>,
}

/// Counters from one [`PositionGenerator::generate`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScatterStats {
    /// Root placements requested.
    pub target: usize,
    /// Root placements accepted.
    pub accepted: usize,
    /// Child placements accepted, all depths.
    pub children: usize,
    /// Root candidates drawn.
    pub attempts: usize,
}

/// Mutable state threaded through one generate call.
struct Pass<'r, 'x, R: ?Sized> {
    rng: &'x mut R,
    accept: &'x dyn Fn(DVec2) -> bool,
    out: Vec<Placement<'r>>,
    stats: ScatterStats,
}

/// Draws candidate positions and keeps those the validator accepts.
///
/// Every call shares the validator's accepted set, so spacing holds across
/// all rules run through the same generator.
pub struct PositionGenerator<'a> {
    validator: PlacementValidator<'a>,
}

impl<'a> PositionGenerator<'a> {
    /// Generator over an existing validator.
    pub fn new(validator: PlacementValidator<'a>) -> Self {
        Self { validator }
    }

    /// The underlying validator.
    pub fn validator(&self) -> &PlacementValidator<'a> {
        &self.validator
    }

    /// Place positions for `rule` over `area` square world units.
    ///
    /// `accept` is an extra caller filter (e.g. biome membership) applied to
    /// every candidate, children included. Root sampling stops after
    /// `target * rule.max_attempts` draws; under-filling is not an error.
    pub fn generate<'r, R: Rng + ?Sized>(
        &mut self,
        rule: &'r ScatterRule,
        area: f64,
        rng: &mut R,
        accept: &dyn Fn(DVec2) -> bool,
    ) -> (Vec<Placement<'r>>, ScatterStats) {
        let target = rule.target_count(area);
        let mut pass = Pass {
            rng,
            accept,
            out: Vec::new(),
            stats: ScatterStats {
                target,
                ..Default::default()
            },
        };
        if target > 0 {
            let filter = rule.terrain_filter();
            match &rule.cluster {
                None => self.place_uniform(rule, &filter, &mut pass),
                Some(cluster) => self.place_clustered(rule, cluster, &filter, &mut pass),
            }
        }
        (pass.out, pass.stats)
    }

    fn place_uniform<'r, R: Rng + ?Sized>(
        &mut self,
        rule: &'r ScatterRule,
        filter: &TerrainFilter,
        pass: &mut Pass<'r, '_, R>,
    ) {
        let target = pass.stats.target;
        let budget = target.saturating_mul(rule.max_attempts.max(1));
        while pass.stats.accepted < target && pass.stats.attempts < budget {
            pass.stats.attempts += 1;
            let candidate = self.validator.bounds().random_point(pass.rng);
            if self.check(candidate, filter, rule.min_spacing, pass.accept).is_err() {
                continue;
            }
            let index = self.push(pass, candidate, rule, 0, None);
            pass.stats.accepted += 1;
            self.place_children(index, rule, filter, 1, pass);
        }
    }

    fn place_clustered<'r, R: Rng + ?Sized>(
        &mut self,
        rule: &'r ScatterRule,
        cluster: &ClusterSettings,
        filter: &TerrainFilter,
        pass: &mut Pass<'r, '_, R>,
    ) {
        let target = pass.stats.target;
        let budget = target.saturating_mul(rule.max_attempts.max(1));
        let (min_size, max_size) = ordered(cluster.cluster_size);
        let min_size = min_size.max(1);
        let max_size = max_size.max(min_size);

        while pass.stats.accepted < target && pass.stats.attempts < budget {
            pass.stats.attempts += 1;
            let center = self.validator.bounds().random_point(pass.rng);
            if self.check(center, filter, rule.min_spacing, pass.accept).is_err() {
                continue;
            }

            let cluster_start = self.validator.accepted().len();
            let first_member = self.push(pass, center, rule, 0, None);
            pass.stats.accepted += 1;

            let size = pass.rng.random_range(min_size..=max_size);
            let member_budget = size * rule.max_attempts.max(1);
            let mut members = 1;
            let mut member_attempts = 0;
            while members < size && pass.stats.accepted < target && member_attempts < member_budget {
                member_attempts += 1;
                let angle = pass.rng.random_range(0.0..TAU);
                let radius = cluster.spread.max(0.0) * det_sqrt(pass.rng.random::<f64>());
                let candidate = center + DVec2::new(det_cos(angle), det_sin(angle)) * radius;

                // Members keep global spacing to everything outside their own
                // cluster but only the tighter local spacing to each other.
                let own = cluster_start..self.validator.accepted().len();
                if self.validator.check_terrain(candidate, filter).is_err()
                    || self
                        .validator
                        .check_spacing_excluding(candidate, rule.min_spacing, own.clone())
                        .is_err()
                    || self
                        .validator
                        .check_spacing_within(candidate, cluster.local_spacing, own)
                        .is_err()
                    || !(pass.accept)(candidate)
                {
                    continue;
                }
                self.push(pass, candidate, rule, 0, None);
                pass.stats.accepted += 1;
                members += 1;
            }

            let last_member = pass.out.len();
            for index in first_member..last_member {
                self.place_children(index, rule, filter, 1, pass);
            }
        }
    }

    fn place_children<'r, R: Rng + ?Sized>(
        &mut self,
        parent: usize,
        rule: &'r ScatterRule,
        parent_filter: &TerrainFilter,
        depth: usize,
        pass: &mut Pass<'r, '_, R>,
    ) {
        if depth > MAX_CHILD_DEPTH {
            return;
        }
        let origin = pass.out[parent].position;
        for child in &rule.children {
            let filter = if child.inherit_terrain_filter {
                parent_filter.clone()
            } else {
                child.rule.terrain_filter()
            };
            let (min_count, max_count) = ordered(child.count);
            let count = if max_count == 0 {
                0
            } else {
                pass.rng.random_range(min_count..=max_count)
            };
            let (r_min, r_max) = ordered((child.radius_min.max(0.0), child.radius_max.max(0.0)));
            let budget = count * child.rule.max_attempts.max(1);

            let mut placed = 0;
            let mut attempts = 0;
            while placed < count && attempts < budget {
                attempts += 1;
                let angle = pass.rng.random_range(0.0..TAU);
                let radius = if r_max > r_min {
                    pass.rng.random_range(r_min..=r_max)
                } else {
                    r_min
                };
                let candidate = origin + DVec2::new(det_cos(angle), det_sin(angle)) * radius;
                if self
                    .check(candidate, &filter, child.rule.min_spacing, pass.accept)
                    .is_err()
                {
                    continue;
                }
                let index = self.push(pass, candidate, &child.rule, depth, Some(parent));
                pass.stats.children += 1;
                placed += 1;
                self.place_children(index, &child.rule, &filter, depth + 1, pass);
            }
        }
    }

    fn check(
        &self,
        point: DVec2,
        filter: &TerrainFilter,
        min_spacing: f64,
        accept: &dyn Fn(DVec2) -> bool,
    ) -> Result<(), Rejection> {
        self.validator.validate(point, filter, min_spacing)?;
        if !accept(point) {
            return Err(Rejection::Filtered);
        }
        Ok(())
    }

    fn push<'r, R: ?Sized>(
        &mut self,
        pass: &mut Pass<'r, '_, R>,
        position: DVec2,
        rule: &'r ScatterRule,
        depth: usize,
        parent: Option<usize>,
    ) -> usize {
        self.validator.accept(position);
        pass.out.push(Placement {
            position,
            rule,
            depth,
            parent,
        });
        pass.out.len() - 1
    }
}

fn ordered<T: PartialOrd>(range: (T, T)) -> (T, T) {
    if range.0 <= range.1 { range } else { (range.1, range.0) }
}
