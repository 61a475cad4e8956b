//! Seniority rubric — maps a continuous pay multiplier onto a discrete
//! difficulty tier with a fixed weight distribution across five cognitive
//! layers (K1 recall … K5 strategic).
//!
//! Tiers are modelled as data, not as cascading conditionals, so tests can be
//! table-driven. Weights of every tier sum to exactly 100.

use serde::Serialize;

/// Percentage weights across the five cognitive layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayerWeights {
    /// K1 — recall, definitions, concept explanation.
    pub recall: u8,
    /// K2 — applied knowledge, configuration, usage.
    pub applied: u8,
    /// K3 — troubleshooting, log analysis, fault isolation.
    pub troubleshooting: u8,
    /// K4 — design, architecture, technology trade-offs.
    pub design: u8,
    /// K5 — strategic and leadership decisions.
    pub strategic: u8,
}

impl LayerWeights {
    pub fn total(&self) -> u32 {
        self.recall as u32
            + self.applied as u32
            + self.troubleshooting as u32
            + self.design as u32
            + self.strategic as u32
    }
}

/// One difficulty tier of the rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierDescriptor {
    /// Short label matching the pay band, e.g. "3x".
    pub label: &'static str,
    pub name: &'static str,
    pub experience_years: &'static str,
    pub weights: LayerWeights,
}

/// Upper pay-multiplier bound of a band (inclusive), `None` for the open top band.
type Band = (Option<f64>, TierDescriptor);

/// The canonical rubric. Bands are `(-inf, 2], (2, 3], (3, 4], (4, +inf)`.
/// Lower tiers concentrate on K1–K2 and carry no K5 weight; the top tier
/// concentrates on K4–K5 and carries no K1 weight.
const TIERS: [Band; 4] = [
    (
        Some(2.0),
        TierDescriptor {
            label: "2x",
            name: "Mid-level practitioner",
            experience_years: "2-4 years",
            weights: LayerWeights {
                recall: 30,
                applied: 40,
                troubleshooting: 25,
                design: 5,
                strategic: 0,
            },
        },
    ),
    (
        Some(3.0),
        TierDescriptor {
            label: "3x",
            name: "Senior specialist",
            experience_years: "5-8 years",
            weights: LayerWeights {
                recall: 15,
                applied: 25,
                troubleshooting: 35,
                design: 20,
                strategic: 5,
            },
        },
    ),
    (
        Some(4.0),
        TierDescriptor {
            label: "4x",
            name: "Architect / technical lead",
            experience_years: "10+ years",
            weights: LayerWeights {
                recall: 5,
                applied: 15,
                troubleshooting: 25,
                design: 35,
                strategic: 20,
            },
        },
    ),
    (
        None,
        TierDescriptor {
            label: "5x",
            name: "Enterprise expert",
            experience_years: "15+ years",
            weights: LayerWeights {
                recall: 0,
                applied: 10,
                troubleshooting: 20,
                design: 40,
                strategic: 30,
            },
        },
    ),
];

/// Resolves the difficulty tier for a pay multiplier.
///
/// Deterministic, no side effects. A multiplier exactly on a band boundary
/// belongs to the lower band (bounds are inclusive).
pub fn resolve_tier(pay_multiplier: f64) -> &'static TierDescriptor {
    for (upper, tier) in &TIERS {
        match upper {
            Some(bound) if pay_multiplier <= *bound => return tier,
            Some(_) => continue,
            None => return tier,
        }
    }
    // Unreachable: the last band is open-ended.
    &TIERS[TIERS.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hard invariant: every tier's weights sum to exactly 100.
    #[test]
    fn test_all_tier_weights_sum_to_100() {
        for (_, tier) in &TIERS {
            assert_eq!(
                tier.weights.total(),
                100,
                "tier {} weights must sum to 100",
                tier.label
            );
        }
    }

    #[test]
    fn test_band_boundaries_are_inclusive_lower() {
        assert_eq!(resolve_tier(2.0).label, "2x");
        assert_eq!(resolve_tier(3.0).label, "3x");
        assert_eq!(resolve_tier(4.0).label, "4x");
    }

    #[test]
    fn test_values_just_above_boundary_fall_in_next_band() {
        assert_eq!(resolve_tier(2.0001).label, "3x");
        assert_eq!(resolve_tier(3.5).label, "4x");
        assert_eq!(resolve_tier(4.0001).label, "5x");
    }

    #[test]
    fn test_extremes() {
        assert_eq!(resolve_tier(0.0).label, "2x");
        assert_eq!(resolve_tier(-1.0).label, "2x");
        assert_eq!(resolve_tier(100.0).label, "5x");
    }

    #[test]
    fn test_adjacent_bands_resolve_to_distinct_tiers() {
        // For all m1 <= 2 < m2 <= 3: tier(m1) != tier(m2)
        for m1 in [0.5, 1.0, 2.0] {
            for m2 in [2.1, 2.5, 3.0] {
                assert_ne!(resolve_tier(m1).label, resolve_tier(m2).label);
            }
        }
    }

    #[test]
    fn test_lowest_tier_has_no_strategic_weight() {
        assert_eq!(resolve_tier(1.5).weights.strategic, 0);
    }

    #[test]
    fn test_top_tier_has_no_recall_weight() {
        let tier = resolve_tier(5.0);
        assert_eq!(tier.weights.recall, 0);
        assert!(tier.weights.design + tier.weights.strategic >= 70);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        for m in [0.0, 1.9, 2.0, 2.5, 3.0, 3.9, 4.0, 7.7] {
            assert_eq!(resolve_tier(m), resolve_tier(m));
        }
    }
}
