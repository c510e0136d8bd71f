//! Placeholder fish classifier.
//!
//! There is no trained model behind this: labels, confidence and score are
//! drawn at random from ranges chosen by coverage/complexity thresholds, and
//! one call in five is overridden with a "special" species.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::features::FeatureSet;

pub const WELL_FORMED_FISH: [&str; 4] = ["Goldfish", "Carp", "Tropical Fish", "Angelfish"];
pub const SIMPLE_OUTLINES: [&str; 3] = ["Small Fish", "Simple Fish", "Fish Outline"];
pub const SKETCH_LABEL: &str = "Fish Sketch";
pub const NEEDS_DETAIL_LABEL: &str = "Needs More Detail";
pub const SPECIAL_SPECIES: [&str; 4] = ["Shark", "Clownfish", "Butterflyfish", "Betta"];

/// Fish types the analyzer advertises in its model status.
pub const SUPPORTED_FISH_TYPES: [&str; 10] = [
    "Goldfish",
    "Carp",
    "Tropical Fish",
    "Shark",
    "Clownfish",
    "Butterflyfish",
    "Angelfish",
    "Betta",
    "Guppy",
    "Generic Fish",
];

const SPECIAL_OVERRIDE_THRESHOLD: f64 = 0.8;
const SPECIAL_CONFIDENCE_BONUS: f64 = 0.1;
const SPECIAL_SCORE_BONUS: f64 = 10.0;
const CONFIDENCE_CEILING: f64 = 0.9;
const SCORE_CEILING: f64 = 95.0;

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;

    fn pick<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        let idx = (self.next_unit() * choices.len() as f64) as usize;
        choices[idx.min(choices.len() - 1)]
    }
}

/// Entropy-seeded generator used outside tests.
pub struct SystemRandom {
    rng: StdRng,
}

impl SystemRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f64,
    pub score: u32,
}

/// Confidence and score ranges `[base, base + span)` for one branch.
struct Band {
    confidence_base: f64,
    confidence_span: f64,
    score_base: f64,
    score_span: f64,
}

const WELL_FORMED_BAND: Band = Band {
    confidence_base: 0.7,
    confidence_span: 0.2,
    score_base: 70.0,
    score_span: 25.0,
};
const OUTLINE_BAND: Band = Band {
    confidence_base: 0.6,
    confidence_span: 0.2,
    score_base: 60.0,
    score_span: 20.0,
};
const SKETCH_BAND: Band = Band {
    confidence_base: 0.4,
    confidence_span: 0.3,
    score_base: 40.0,
    score_span: 30.0,
};
const NEEDS_DETAIL_BAND: Band = Band {
    confidence_base: 0.2,
    confidence_span: 0.3,
    score_base: 20.0,
    score_span: 30.0,
};

pub fn classify(features: &FeatureSet, rng: &mut dyn RandomSource) -> Classification {
    let (label, band) = if features.coverage > 15 && features.complexity > 10 {
        (rng.pick(&WELL_FORMED_FISH), WELL_FORMED_BAND)
    } else if features.coverage > 8 {
        (rng.pick(&SIMPLE_OUTLINES), OUTLINE_BAND)
    } else if features.coverage > 3 {
        (SKETCH_LABEL, SKETCH_BAND)
    } else {
        (NEEDS_DETAIL_LABEL, NEEDS_DETAIL_BAND)
    };

    let mut label = label;
    let mut confidence = band.confidence_base + rng.next_unit() * band.confidence_span;
    let mut score = band.score_base + rng.next_unit() * band.score_span;

    if rng.next_unit() > SPECIAL_OVERRIDE_THRESHOLD {
        label = rng.pick(&SPECIAL_SPECIES);
        confidence = (confidence + SPECIAL_CONFIDENCE_BONUS).min(CONFIDENCE_CEILING);
        score = (score + SPECIAL_SCORE_BONUS).min(SCORE_CEILING);
    }

    Classification {
        label: label.to_string(),
        confidence: (confidence * 100.0).round() / 100.0,
        score: score.round() as u32,
    }
}

/// Three tips chosen by score bracket: `< 40`, `40..70`, `>= 70`.
pub fn suggest(score: u32) -> Vec<String> {
    let tips: [&str; 3] = match score {
        0..=39 => [
            "Try drawing the basic outline of the fish",
            "Add fins and a tail",
            "Draw the fish's eye",
        ],
        40..=69 => [
            "Add more detail, like scale texture",
            "Refine the shape of the fins",
            "Add a few decorative touches",
        ],
        _ => [
            "Great drawing!",
            "Try adding some background scenery",
            "Try drawing a different kind of fish",
        ],
    };
    tips.iter().map(|tip| tip.to_string()).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    /// Replays a fixed list of draws, then repeats the last one.
    pub(crate) struct ScriptedRandom {
        draws: VecDeque<f64>,
        last: f64,
    }

    impl ScriptedRandom {
        pub(crate) fn new(draws: &[f64]) -> Self {
            Self {
                draws: draws.iter().copied().collect(),
                last: 0.0,
            }
        }
    }

    impl RandomSource for ScriptedRandom {
        fn next_unit(&mut self) -> f64 {
            if let Some(next) = self.draws.pop_front() {
                self.last = next;
            }
            self.last
        }
    }

    fn features(coverage: u32, complexity: u32) -> FeatureSet {
        FeatureSet {
            coverage,
            complexity,
            ..FeatureSet::default()
        }
    }

    #[test]
    fn well_formed_branch_picks_from_fish_vocabulary() {
        // pick, confidence, score, no override
        let mut rng = ScriptedRandom::new(&[0.3, 0.5, 0.5, 0.1]);
        let result = classify(&features(20, 15), &mut rng);
        assert_eq!(result.label, "Carp");
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.score, 83);
    }

    #[test]
    fn high_coverage_low_complexity_falls_to_outline_branch() {
        let mut rng = ScriptedRandom::new(&[0.99, 0.0, 0.0, 0.5]);
        let result = classify(&features(40, 10), &mut rng);
        assert_eq!(result.label, "Fish Outline");
        assert_eq!(result.confidence, 0.6);
        assert_eq!(result.score, 60);
    }

    #[test]
    fn sketch_branch_has_fixed_label() {
        let mut rng = ScriptedRandom::new(&[0.5, 0.5, 0.0]);
        let result = classify(&features(5, 90), &mut rng);
        assert_eq!(result.label, SKETCH_LABEL);
        assert_eq!(result.confidence, 0.55);
        assert_eq!(result.score, 55);
    }

    #[test]
    fn empty_drawing_needs_more_detail() {
        let mut rng = ScriptedRandom::new(&[0.0, 0.0, 0.8]);
        let result = classify(&features(0, 0), &mut rng);
        assert_eq!(result.label, NEEDS_DETAIL_LABEL);
        assert_eq!(result.confidence, 0.2);
        assert_eq!(result.score, 20);
    }

    #[test]
    fn special_override_bumps_and_clamps() {
        // well-formed at the top of its range, then override to "Betta"
        let mut rng = ScriptedRandom::new(&[0.0, 0.999, 0.999, 0.95, 0.9]);
        let result = classify(&features(50, 50), &mut rng);
        assert_eq!(result.label, "Betta");
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.score, 95);
    }

    #[test]
    fn special_override_applies_to_low_branches_too() {
        let mut rng = ScriptedRandom::new(&[0.0, 0.0, 0.81, 0.0]);
        let result = classify(&features(1, 0), &mut rng);
        assert_eq!(result.label, "Shark");
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.score, 30);
    }

    #[test]
    fn override_rate_is_roughly_one_in_five() {
        let mut rng = SystemRandom::seeded(7);
        let trials = 5000;
        let special = (0..trials)
            .filter(|_| {
                let label = classify(&features(0, 0), &mut rng).label;
                SPECIAL_SPECIES.contains(&label.as_str())
            })
            .count();
        let rate = special as f64 / trials as f64;
        assert!((0.17..0.23).contains(&rate), "override rate was {rate}");
    }

    #[test]
    fn suggestion_brackets_switch_at_40_and_70() {
        assert_eq!(suggest(39)[0], "Try drawing the basic outline of the fish");
        assert_eq!(suggest(40)[0], "Add more detail, like scale texture");
        assert_eq!(suggest(69)[0], "Add more detail, like scale texture");
        assert_eq!(suggest(70)[0], "Great drawing!");
    }

    proptest! {
        #[test]
        fn outputs_stay_within_bounds(coverage in 0u32..=100, complexity in 0u32..=100, seed in any::<u64>()) {
            let mut rng = SystemRandom::seeded(seed);
            let result = classify(&features(coverage, complexity), &mut rng);
            prop_assert!((0.0..=1.0).contains(&result.confidence));
            prop_assert!(result.score <= 95);
            prop_assert!(result.score >= 20);
        }

        #[test]
        fn needs_detail_branch_scores_below_fifty_without_override(coverage in 0u32..=3, draws in proptest::collection::vec(0.0f64..1.0, 2)) {
            let mut rng = ScriptedRandom::new(&[draws[0], draws[1], 0.0]);
            let result = classify(&features(coverage, 100), &mut rng);
            prop_assert_eq!(result.label.as_str(), NEEDS_DETAIL_LABEL);
            prop_assert!((20..=50).contains(&result.score));
        }

        #[test]
        fn always_three_suggestions(score in 0u32..=95) {
            prop_assert_eq!(suggest(score).len(), 3);
        }
    }
}
