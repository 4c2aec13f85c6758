use chrono::TimeDelta;
use gridtrack::{BackfillConfig, SeriesConfig};
use proptest::prelude::*;

use crate::helpers::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn windows_respect_budget_and_horizon(
        target_days in 1u32..30,
        hours_per_call in 1u32..96,
        max_calls in 0u32..6,
        stored_hours_ago in proptest::option::of(0i64..24 * 40),
    ) {
        let cfg = config(vec![SeriesConfig {
            backfill: BackfillConfig {
                target_oldest_days: target_days,
                hours_per_call,
                max_calls_per_cycle: max_calls,
            },
            ..quiet(CI)
        }]);
        let (c, store, ctrl) = dynamic_collector(cfg);
        let out = tokio_test::block_on(async {
            if let Some(h) = stored_hours_ago {
                seed_store(&store, [ci_actual(now() - TimeDelta::hours(h), 1.0)]).await;
            }
            c.backfill(CI, now()).await.unwrap()
        });
        let calls = tokio_test::block_on(ctrl.calls(CI));

        let anchor = stored_hours_ago.map_or(now(), |h| now() - TimeDelta::hours(h));
        let horizon = now() - TimeDelta::days(i64::from(target_days));
        let missing = (anchor - horizon).num_hours().max(0);
        let needed = (missing + i64::from(hours_per_call) - 1) / i64::from(hours_per_call);
        let expected = usize::try_from(needed.min(i64::from(max_calls))).unwrap();

        prop_assert_eq!(calls.len(), expected);
        prop_assert_eq!(&calls, &out.windows);
        let mut to = anchor;
        for w in &calls {
            prop_assert_eq!(w.to, to);
            prop_assert!(w.from < w.to);
            prop_assert!(w.from >= horizon);
            prop_assert!(w.span() <= TimeDelta::hours(i64::from(hours_per_call)));
            to = w.from;
        }
    }
}
