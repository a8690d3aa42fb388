//! Property-based tests for exchange-rate construction and derivation.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use ratebridge_rates::{
    CurrencyUnit, ExchangeRate, ImfRateProvider, RateError, RateProvider, RateType,
};
use rust_decimal::Decimal;

// =============================================================================
// Generators
// =============================================================================

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

/// Positive factor between 1e-8 and 1e9.
fn arb_factor() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000, 0u32..=8).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

/// Optional instant within roughly two years of the epoch.
fn arb_bound() -> impl Strategy<Value = Option<DateTime<Utc>>> {
    proptest::option::of((0i64..60_000_000).prop_map(|secs| epoch() + Duration::seconds(secs)))
}

fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (-1_000_000i64..61_000_000).prop_map(|secs| epoch() + Duration::seconds(secs))
}

fn arb_currency() -> impl Strategy<Value = CurrencyUnit> {
    prop_oneof![
        Just(CurrencyUnit::USD),
        Just(CurrencyUnit::EUR),
        Just(CurrencyUnit::CHF),
        Just(CurrencyUnit::GBP),
        Just(CurrencyUnit::JPY),
    ]
}

fn direct(base: CurrencyUnit, term: CurrencyUnit, factor: Decimal) -> ExchangeRate {
    ExchangeRate::builder()
        .rate_type(RateType::HISTORIC)
        .base(base)
        .term(term)
        .factor(factor)
        .provider("PROP")
        .build()
        .unwrap()
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Builds succeed exactly for positive factors and ordered windows, and
    /// `is_valid` matches the inclusive window with open ends.
    #[test]
    fn prop_builder_enforces_factor_and_window(
        mantissa in -1_000_000i64..1_000_000,
        from in arb_bound(),
        to in arb_bound(),
        at in arb_instant(),
    ) {
        let factor = Decimal::new(mantissa, 4);
        let result = ExchangeRate::builder()
            .rate_type(RateType::REALTIME)
            .base(CurrencyUnit::USD)
            .term(CurrencyUnit::EUR)
            .factor(factor)
            .provider("PROP")
            .valid_window(from, to)
            .build();

        let window_ordered = match (from, to) {
            (Some(from), Some(to)) => from <= to,
            _ => true,
        };

        if factor <= Decimal::ZERO || !window_ordered {
            prop_assert!(matches!(result, Err(RateError::InvalidRate(_))));
        } else {
            let rate = result.unwrap();
            prop_assert!(rate.factor() > Decimal::ZERO);

            let expected = from.map_or(true, |f| f <= at) && to.map_or(true, |t| t >= at);
            prop_assert_eq!(rate.is_valid(at), expected);
        }
    }

    /// Inverting twice restores base, term and window, and the factor up to
    /// rounding.
    #[test]
    fn prop_reciprocal_round_trip(
        base in arb_currency(),
        term in arb_currency(),
        factor in arb_factor(),
    ) {
        let rate = direct(base, term, factor);
        let back = rate.reciprocal().unwrap().reciprocal().unwrap();

        prop_assert_eq!(back.base(), rate.base());
        prop_assert_eq!(back.term(), rate.term());
        prop_assert_eq!(back.valid_from(), rate.valid_from());
        prop_assert_eq!(back.valid_to(), rate.valid_to());

        let tolerance = factor * Decimal::new(1, 12);
        prop_assert!(
            (back.factor() - factor).abs() <= tolerance,
            "{} round-tripped to {}",
            factor,
            back.factor()
        );
    }

    /// A derived cross rate multiplies its links and keeps them in order.
    #[test]
    fn prop_derived_factor_is_product_of_links(
        f1 in arb_factor(),
        f2 in arb_factor(),
    ) {
        let to_reference = direct(CurrencyUnit::EUR, CurrencyUnit::XDR, f1);
        let from_reference = direct(CurrencyUnit::XDR, CurrencyUnit::USD, f2);

        let derived = ExchangeRate::derive(
            RateType::HISTORIC,
            "PROP",
            vec![to_reference.clone(), from_reference.clone()],
        )
        .unwrap();

        prop_assert_eq!(derived.factor(), f1 * f2);
        prop_assert_eq!(derived.base(), &CurrencyUnit::EUR);
        prop_assert_eq!(derived.term(), &CurrencyUnit::USD);
        prop_assert_eq!(derived.chain(), vec![&to_reference, &from_reference]);
    }

    /// The IMF provider derives the same product from a loaded feed.
    #[test]
    fn prop_imf_cross_rate_matches_feed_values(
        eur_to_sdr in arb_factor(),
        sdr_to_usd in arb_factor(),
    ) {
        let feed = format!(
            "SDRs per Currency unit\nCurrency\t2013-01-31\nEuro\t{}\n\n\
             Currency units per SDR\nCurrency\t2013-01-31\nU.S. dollar\t{}\n",
            eur_to_sdr, sdr_to_usd
        );
        let provider = ImfRateProvider::new();
        provider.load_feed(&feed).unwrap();

        let at = Utc.with_ymd_and_hms(2013, 1, 31, 12, 0, 0).unwrap();
        let rate = provider
            .get_exchange_rate_at(&CurrencyUnit::EUR, &CurrencyUnit::USD, at)
            .unwrap();

        prop_assert_eq!(rate.factor(), eur_to_sdr * sdr_to_usd);
        prop_assert_eq!(rate.chain().len(), 2);
        prop_assert!(rate.is_valid(at));
    }
}
