//! Property tests: engine results match direct evaluation.

use flowray::walkthrough::{aggregate, Aggregation};
use flowray::{args, Value};
use proptest::prelude::*;

use crate::common::{add, engine};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn submitted_add_matches_direct_add(a in any::<i64>(), b in any::<i64>()) {
        let engine = engine(2);
        let future = engine.submit(&add(), args![a, b]);
        prop_assert_eq!(engine.get(&future), Ok(Value::Int(a.wrapping_add(b))));
    }

    #[test]
    fn every_aggregation_shape_agrees(values in prop::collection::vec(-1000i64..1000, 1..24)) {
        let engine = engine(4);
        let expected = Value::Int(values.iter().sum());
        for strategy in [Aggregation::Linear, Aggregation::Tree, Aggregation::Loop] {
            let report = aggregate(&engine, strategy, &values, std::time::Duration::ZERO).unwrap();
            prop_assert_eq!(&report.result, &expected);
        }
    }
}
