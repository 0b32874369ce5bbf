//! Property-based tests for the roll engine.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use card_arena::config::GameData;
use card_arena::core::{GameRng, ScriptedDraws};
use card_arena::roll::{PityState, RollEngine};

fn engine() -> RollEngine {
    RollEngine::new(Arc::new(GameData::builtin().unwrap())).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Once the hard-pity roll is reached, every draw gives rare-or-better.
    #[test]
    fn prop_hard_pity_guarantee(counter in 89u32..10_000, tier in 0.0f64..1.0, pick in 0.0f64..1.0) {
        let engine = engine();
        let pity = PityState { counter, ..PityState::default() };
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let (outcome, next) = engine.roll(&pity, &mut ScriptedDraws::new([tier, pick]), at).unwrap();

        prop_assert!(outcome.rarity.is_rare_or_better(), "counter={counter} tier={tier}");
        prop_assert_eq!(next.counter, 0);
    }

    /// A batch equals the same number of single rolls with state threaded.
    #[test]
    fn prop_batch_equals_singles(seed in any::<u64>(), count in 0usize..60, counter in 0u32..89) {
        let engine = engine();
        let start = PityState { counter, ..PityState::default() };
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let (batch, batch_state) = engine.roll_many(&start, count, &mut GameRng::new(seed), at).unwrap();

        let mut rng = GameRng::new(seed);
        let mut state = start;
        let mut singles = Vec::with_capacity(count);
        for _ in 0..count {
            let (outcome, next) = engine.roll(&state, &mut rng, at).unwrap();
            singles.push(outcome);
            state = next;
        }

        prop_assert_eq!(batch, singles);
        prop_assert_eq!(batch_state, state);
    }

    /// The counter never reaches the hard-pity value from a valid start.
    #[test]
    fn prop_counter_stays_below_hard_pity(seed in any::<u64>(), counter in 0u32..90, count in 1usize..200) {
        let engine = engine();
        let hard = engine.data().rarity.pity().hard_pity;
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut rng = GameRng::new(seed);
        let mut state = PityState { counter, ..PityState::default() };

        for _ in 0..count {
            let (outcome, next) = engine.roll(&state, &mut rng, at).unwrap();
            if outcome.rarity.is_rare_or_better() {
                prop_assert_eq!(next.counter, 0);
            } else {
                prop_assert_eq!(next.counter, state.counter + 1);
            }
            prop_assert!(next.counter < hard);
            prop_assert_eq!(next.lifetime_rolls, state.lifetime_rolls + 1);
            state = next;
        }
    }
}
