//! Property tests for bucket alignment and symbol parsing

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use oi_snapshot::bucket::{self, Bucket, BUCKET_WIDTH_SECS};
use oi_snapshot::delta::Classification;
use oi_snapshot::symbol::{self, OptionType};
use proptest::prelude::*;

fn instant() -> impl Strategy<Value = NaiveDateTime> {
    (0u32..86_400, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
        NaiveDate::from_ymd_opt(2025, 8, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::seconds(i64::from(secs))
            + Duration::nanoseconds(i64::from(nanos))
    })
}

proptest! {
    #[test]
    fn bucket_covers_instant(t in instant()) {
        let start = bucket::bucket_start(t);
        let end = bucket::bucket_end(t);

        prop_assert!(start <= t);
        prop_assert!(t <= end);
        prop_assert!(end < bucket::next_grid_boundary(t));
        prop_assert_eq!(end - start, bucket::width() - Duration::nanoseconds(1));
        prop_assert_eq!(start.num_seconds_from_midnight() as i64 % BUCKET_WIDTH_SECS, 0);
        prop_assert_eq!(start.nanosecond(), 0);
        prop_assert!(Bucket::containing(t).contains(t));
    }

    #[test]
    fn next_boundary_is_strictly_later(t in instant()) {
        let next = bucket::next_grid_boundary(t);

        prop_assert!(next > t);
        prop_assert!(next - t <= bucket::width());
        prop_assert_eq!(bucket::bucket_start(next), next);
    }

    #[test]
    fn classification_is_total(t1 in any::<i64>(), t2 in any::<i64>()) {
        let expected = if t2 > t1 { Classification::Increase } else { Classification::Decrease };
        prop_assert_eq!(Classification::classify(t1, t2), expected);
    }

    #[test]
    fn abbreviated_strike_symbols_parse(
        root in "[A-Z]{3,10}",
        day in 1u8..=28,
        month in 0usize..12,
        strike in 1u64..1_000_000,
        put in any::<bool>(),
    ) {
        // option markers inside the root are stripped by the parser
        prop_assume!(!root.contains("CE") && !root.contains("PE") && !root.contains("FUT"));

        let mon = symbol::MONTH_ABBREVIATIONS[month].to_uppercase();
        let suffix = if put { "PE" } else { "CE" };
        let text = format!("{root}{day:02}{mon}{strike}{suffix}");

        let parsed = symbol::parse(&text);
        prop_assert_eq!(parsed.option_type, if put { OptionType::Pe } else { OptionType::Ce });
        prop_assert_eq!(parsed.root(), Some(root.as_str()));
        prop_assert_eq!(parsed.strike(), Some(strike));
        let expiry = parsed.expiry().unwrap();
        prop_assert_eq!(expiry.sort_key(), (month as u8 + 1, day));
    }
}
