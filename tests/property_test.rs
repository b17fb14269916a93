//! Property tests for the order- and shape-preserving transforms.

use chrono::{Days, NaiveDate};
use dailyscreen::domain::aligner::align_fields;
use dailyscreen::domain::bar::Bar;
use dailyscreen::domain::schema::normalize_code;
use dailyscreen::domain::strategy::limit_up::limit_up_threshold;
use dailyscreen::domain::table::Table;
use dailyscreen::domain::window::dedup_by_date;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn bar_strategy() -> impl Strategy<Value = Bar> {
    (0u64..15, proptest::option::of(0.0f64..1e6), 0.0f64..100.0).prop_map(|(offset, volume, close)| {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(offset))
            .unwrap();
        let mut b = Bar::new("600000.SH", date);
        b.volume = volume;
        b.close = Some(close);
        b
    })
}

fn table_with(columns: &BTreeSet<String>, rows: usize) -> Table {
    let mut t = Table::new(columns.iter().cloned().collect());
    for r in 0..rows {
        t.push_row(columns.iter().map(|c| Some(format!("{c}{r}"))).collect());
    }
    t
}

proptest! {
    #[test]
    fn dedup_is_idempotent(bars in prop::collection::vec(bar_strategy(), 0..40)) {
        let once = dedup_by_date(bars);
        let twice = dedup_by_date(once.clone());
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn dedup_output_is_date_unique_and_ascending(bars in prop::collection::vec(bar_strategy(), 0..40)) {
        let distinct: BTreeSet<_> = bars.iter().map(|b| b.date).collect();
        let out = dedup_by_date(bars);
        prop_assert_eq!(out.len(), distinct.len());
        prop_assert!(out.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn dedup_never_drops_known_volume(bars in prop::collection::vec(bar_strategy(), 1..40)) {
        let with_volume: BTreeSet<_> = bars.iter().filter(|b| b.volume.is_some()).map(|b| b.date).collect();
        let out = dedup_by_date(bars);
        for bar in out {
            if with_volume.contains(&bar.date) {
                prop_assert!(bar.volume.is_some());
            }
        }
    }

    #[test]
    fn aligned_tables_share_columns(
        left in prop::collection::btree_set("[a-f]{1,3}", 0..6),
        right in prop::collection::btree_set("[a-f]{1,3}", 0..6),
        left_rows in 0usize..4,
        right_rows in 0usize..4,
    ) {
        let (h, s) = align_fields(&table_with(&left, left_rows), &table_with(&right, right_rows));
        prop_assert_eq!(h.columns(), s.columns());
        let union: Vec<String> = left.union(&right).cloned().collect();
        prop_assert_eq!(h.columns(), union.as_slice());
        prop_assert_eq!(h.len(), left_rows);
        prop_assert_eq!(s.len(), right_rows);
    }

    #[test]
    fn code_normalization_is_idempotent(raw in "[0-9]{1,6}") {
        let once = normalize_code(&raw);
        prop_assert_eq!(normalize_code(&once), once);
    }

    #[test]
    fn growth_boards_use_wider_limit(suffix in "[0-9]{4}") {
        for prefix in ["30", "68"] {
            prop_assert_eq!(limit_up_threshold(&format!("{prefix}{suffix}.SZ")), 19.8);
        }
        for prefix in ["60", "00", "90"] {
            prop_assert_eq!(limit_up_threshold(&format!("{prefix}{suffix}.SH")), 9.9);
        }
    }
}
