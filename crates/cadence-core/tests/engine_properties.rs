//! Property tests for the streak, ledger and progression laws.

use std::collections::BTreeSet;

use cadence_core::{compute_streak, FrequencyPolicy, Habit, HabitLedger, ProgressionRules, XpRules};
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
}

fn policy_strategy() -> impl Strategy<Value = FrequencyPolicy> {
    prop_oneof![
        Just(FrequencyPolicy::Daily),
        Just(FrequencyPolicy::Weekly),
        proptest::collection::btree_set(0u8..7, 1..7)
            .prop_map(|days_of_week| FrequencyPolicy::SpecificDays { days_of_week }),
        (1u32..8).prop_map(|n| FrequencyPolicy::EveryNDays { n }),
    ]
}

proptest! {
    #[test]
    fn gap_past_tolerance_resets_current_and_keeps_best(
        policy in policy_strategy(),
        run_len in 1i64..12,
    ) {
        let gap = policy.max_gap();
        // A run of `run_len` days spaced exactly `gap` apart, ending at d1.
        let run: Vec<NaiveDate> = (0..run_len).map(|i| day(i * gap)).collect();
        let d1 = *run.last().unwrap();
        let d2 = d1 + Duration::days(gap + 1);

        let mut days = run.clone();
        days.push(d2);
        let summary = compute_streak(days, &policy, d2, 0, &XpRules::default()).unwrap();

        prop_assert_eq!(summary.current, 1);
        prop_assert_eq!(summary.best, run_len.max(1) as u32);
    }

    #[test]
    fn best_is_never_below_current_or_previous(
        policy in policy_strategy(),
        offsets in proptest::collection::vec(0i64..90, 0..40),
        reference in 0i64..100,
        previous_best in 0u32..20,
    ) {
        let summary = compute_streak(
            offsets.iter().map(|o| day(*o)),
            &policy,
            day(reference),
            previous_best,
            &XpRules::default(),
        )
        .unwrap();
        prop_assert!(summary.best >= summary.current);
        prop_assert!(summary.best >= previous_best);
    }

    #[test]
    fn toggle_is_its_own_inverse(
        policy in policy_strategy(),
        offsets in proptest::collection::btree_set(0i64..60, 0..30),
        target in 0i64..60,
    ) {
        let ledger = HabitLedger::default();
        let mut habit = Habit::new("owner", "prop", policy, day(0)).unwrap();
        for o in &offsets {
            habit = ledger.toggle_completion(&habit, day(*o), day(60)).unwrap();
        }

        let once = ledger.toggle_completion(&habit, day(target), day(60)).unwrap();
        prop_assert_ne!(once.is_completed_on(day(target)), habit.is_completed_on(day(target)));

        let twice = ledger.toggle_completion(&once, day(target), day(60)).unwrap();
        prop_assert_eq!(twice.completion_days(), habit.completion_days());
        prop_assert_eq!(twice.current_streak(), habit.current_streak());
        prop_assert_eq!(twice.xp(), habit.xp());

        let expected: BTreeSet<NaiveDate> = offsets.iter().map(|o| day(*o)).collect();
        let actual: BTreeSet<NaiveDate> = twice.completion_days().into_iter().collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn bonus_xp_never_decreases_as_history_grows(
        policy in policy_strategy(),
        offsets in proptest::collection::btree_set(0i64..90, 1..40),
    ) {
        let days: Vec<NaiveDate> = offsets.iter().map(|o| day(*o)).collect();
        let mut previous = 0;
        for i in 1..=days.len() {
            let summary = compute_streak(
                days[..i].iter().copied(),
                &policy,
                days[i - 1],
                0,
                &XpRules::default(),
            )
            .unwrap();
            prop_assert!(summary.bonus_xp >= previous);
            previous = summary.bonus_xp;
        }
    }

    #[test]
    fn level_is_monotonic_in_xp(total in 0i64..2_000_000, extra in 0i64..50_000) {
        let rules = ProgressionRules::default();
        let a = rules.level_info(total).unwrap();
        let b = rules.level_info(total + extra).unwrap();
        prop_assert!(b.level >= a.level);
        prop_assert!(a.current_level_xp < a.next_level_xp);
        prop_assert!(a.progress >= 0.0 && a.progress < 100.0);
    }

    #[test]
    fn required_xp_is_constant_past_cap(level in 20u32..10_000) {
        let rules = ProgressionRules::default();
        prop_assert_eq!(rules.required_xp(level), rules.required_xp(rules.cap_level));
    }
}
