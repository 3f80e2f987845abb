//! Tests for whole-unit amount coercion

use core_kernel::{AmountError, WholeAmount};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

mod coercion {
    use super::*;

    #[test]
    fn test_floors_fractional_values() {
        assert_eq!(WholeAmount::floor_of(dec!(80000.99)).unwrap(), WholeAmount::new(80000));
        assert_eq!(WholeAmount::floor_of(dec!(0.01)).unwrap(), WholeAmount::zero());
    }

    #[test]
    fn test_parse_floor_accepts_scientific_notation() {
        assert_eq!(WholeAmount::parse_floor("1.5e3").unwrap().value(), 1500);
    }

    #[test]
    fn test_parse_floor_rejects_text() {
        assert_eq!(
            WholeAmount::parse_floor("N/A"),
            Err(AmountError::NotNumeric("N/A".to_string()))
        );
    }

    #[test]
    fn test_json_float_is_floored() {
        assert_eq!(WholeAmount::from_json(&json!(80000.99)).unwrap().value(), 80000);
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&WholeAmount::new(125000)).unwrap();
        assert_eq!(json, "125000");
    }
}

proptest! {
    #[test]
    fn prop_floor_never_exceeds_input(units in 0i64..1_000_000_000, cents in 0u32..100) {
        let amount = Decimal::new(units * 100 + i64::from(cents), 2);
        let floored = WholeAmount::floor_of(amount).unwrap();
        prop_assert_eq!(floored.value(), units);
        prop_assert!(Decimal::from(floored.value()) <= amount);
    }
}
