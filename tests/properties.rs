//! Property tests over randomly generated tables.

use proptest::prelude::*;
use rusty_sieve::data::arrange::sort_rows;
use rusty_sieve::data::export::export;
use rusty_sieve::data::filter::filtered_indices;
use rusty_sieve::data::infer::infer_column_type;
use rusty_sieve::data::loader::load_bytes;
use rusty_sieve::{
    Condition, Dataset, FilterInput, FilterSet, Format, Record, SortDirection, SortOrder, Value,
};

fn cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-1000i64..1000).prop_map(Value::Integer),
        (-1000.0f64..1000.0).prop_map(Value::Float),
        "[a-c0-9]{0,3}".prop_map(Value::String),
    ]
}

/// Rows with a row id, an int column `n` and a short text column `s`.
fn table() -> impl Strategy<Value = Dataset> {
    prop::collection::vec((0i64..10, "[a-c]{0,3}"), 0..30).prop_map(|rows| {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, (n, s))| {
                [
                    ("idx", Value::Integer(i as i64)),
                    ("n", Value::Integer(n)),
                    ("s", Value::String(s)),
                ]
                .into_iter()
                .collect::<Record>()
            })
            .collect();
        Dataset::new(records, vec!["idx".into(), "n".into(), "s".into()])
    })
}

fn text_condition() -> impl Strategy<Value = Condition> {
    prop::sample::select(vec![
        Condition::Any,
        Condition::Equals,
        Condition::NotEqualTo,
        Condition::Contains,
        Condition::StartsWith,
        Condition::EndsWith,
    ])
}

fn numeric_condition() -> impl Strategy<Value = Condition> {
    prop::sample::select(vec![
        Condition::Any,
        Condition::Equals,
        Condition::LessThan,
        Condition::MoreThan,
    ])
}

fn is_subsequence(small: &[usize], big: &[usize]) -> bool {
    let mut it = big.iter();
    small.iter().all(|x| it.any(|y| y == x))
}

proptest! {
    #[test]
    fn inference_ignores_row_order(
        (original, shuffled) in prop::collection::vec(cell(), 0..20)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        prop_assert_eq!(infer_column_type(&original), infer_column_type(&shuffled));
    }

    #[test]
    fn no_active_filter_keeps_every_row(ds in table()) {
        let filters = FilterSet::for_dataset(&ds);
        let all: Vec<usize> = (0..ds.len()).collect();
        prop_assert_eq!(filtered_indices(&ds, &filters).unwrap(), all);
    }

    #[test]
    fn extra_filters_only_shrink_the_result(
        ds in table(),
        s_cond in text_condition(),
        s_val in "[a-c]{0,2}",
        n_cond in numeric_condition(),
        n_val in 0i64..10,
    ) {
        let mut filters = FilterSet::for_dataset(&ds);
        filters.update("s", s_cond, FilterInput::Text(s_val)).unwrap();
        let one = filtered_indices(&ds, &filters).unwrap();

        filters.update("n", n_cond, FilterInput::Text(n_val.to_string())).unwrap();
        let both = filtered_indices(&ds, &filters).unwrap();

        prop_assert!(one.len() <= ds.len());
        prop_assert!(both.len() <= one.len());
        prop_assert!(is_subsequence(&both, &one));
    }

    #[test]
    fn sort_is_stable_and_idempotent(ds in table(), descending in any::<bool>()) {
        let direction = if descending { SortDirection::Descending } else { SortDirection::Ascending };
        let order = SortOrder::new("n", direction);

        let mut once: Vec<&Record> = ds.records.iter().collect();
        sort_rows(&ds, &mut once, Some(&order)).unwrap();
        let mut twice = once.clone();
        sort_rows(&ds, &mut twice, Some(&order)).unwrap();
        prop_assert_eq!(&once, &twice);

        for pair in once.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (na, nb) = (a.get("n").as_f64().unwrap(), b.get("n").as_f64().unwrap());
            if descending { prop_assert!(na >= nb) } else { prop_assert!(na <= nb) }
            if na == nb {
                prop_assert!(a.get("idx").as_f64().unwrap() < b.get("idx").as_f64().unwrap());
            }
        }
    }

    #[test]
    fn json_export_round_trips(ds in table()) {
        let bytes = export(&ds.records, Format::Json).unwrap();
        let reloaded = load_bytes(&bytes, Format::Json).unwrap();
        prop_assert_eq!(reloaded.records, ds.records);
    }
}
