//! Promotion window validation and price resolution.
//!
//! Everything in this module is a pure function over data the caller already
//! loaded: "today" is always passed in explicitly so tests can pin the clock,
//! and no function touches the database.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use thiserror::Error;

use crate::entities::promotion;

/// Exclusive upper bound for a promotion percentage.
pub const MAX_DISCOUNT_PERCENT: Decimal = dec!(50);

/// Why a candidate promotion window was rejected.
///
/// Variants are ordered the way the checks run; the first failing check wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowRejection {
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("percent must be strictly between 0 and 50, got {0}")]
    PercentOutOfRange(Decimal),

    #[error("window overlaps an existing promotion running {start} to {end}")]
    OverlappingWindow { start: NaiveDate, end: NaiveDate },
}

/// A proposed promotion window, before it becomes a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub percent: Decimal,
}

/// Decides whether `candidate` may become a stored promotion, given the
/// promotions already stored for the same product.
///
/// Expired promotions (`end_date < today`) are excluded from the overlap
/// comparison: a window that only collides with history is acceptable.
/// The overlap test itself is inclusive on both ends.
pub fn validate_window(
    candidate: &CandidateWindow,
    existing: &[promotion::Model],
    today: NaiveDate,
) -> Result<(), WindowRejection> {
    if candidate.start_date > candidate.end_date {
        return Err(WindowRejection::InvertedRange {
            start: candidate.start_date,
            end: candidate.end_date,
        });
    }

    if candidate.percent <= Decimal::ZERO || candidate.percent >= MAX_DISCOUNT_PERCENT {
        return Err(WindowRejection::PercentOutOfRange(candidate.percent));
    }

    for promo in existing {
        if promo.end_date < today {
            continue;
        }
        if candidate.start_date <= promo.end_date && candidate.end_date >= promo.start_date {
            return Err(WindowRejection::OverlappingWindow {
                start: promo.start_date,
                end: promo.end_date,
            });
        }
    }

    Ok(())
}

/// Returns the percent of the promotion whose window contains `today`,
/// or zero when none does.
///
/// The slice may be unsorted and may be empty; at most one window can
/// contain `today` because overlapping windows never pass validation.
pub fn active_discount_percent(promotions: &[promotion::Model], today: NaiveDate) -> Decimal {
    promotions
        .iter()
        .find(|p| p.start_date <= today && today <= p.end_date)
        .map(|p| p.percent)
        .unwrap_or(Decimal::ZERO)
}

/// The customer-facing price for one product on one day.
///
/// When no promotion is active the resolver deliberately returns a marker
/// instead of the base price; callers must branch on it rather than treat
/// the result as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceQuote {
    /// Discounted price, rounded half-up to 2 fractional digits.
    Discounted(Decimal),
    /// No promotion covers the requested day.
    NotDiscounted,
}

impl PriceQuote {
    pub fn is_discounted(&self) -> bool {
        matches!(self, PriceQuote::Discounted(_))
    }
}

impl serde::Serialize for PriceQuote {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            // Fully qualified: Decimal has an inherent `serialize` that
            // shadows the trait method
            PriceQuote::Discounted(price) => serde::Serialize::serialize(price, serializer),
            PriceQuote::NotDiscounted => serializer.serialize_str("no active promotion"),
        }
    }
}

impl<'de> serde::Deserialize<'de> for PriceQuote {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw == "no active promotion" {
            return Ok(PriceQuote::NotDiscounted);
        }
        raw.parse::<Decimal>()
            .map(PriceQuote::Discounted)
            .map_err(serde::de::Error::custom)
    }
}

/// Computes the effective price of a product on `today`.
///
/// With an active promotion of `p` percent the result is
/// `price - price * p / 100`, rounded half-up (not banker's rounding) to
/// 2 fractional digits. Without one, the distinguished marker is returned.
pub fn effective_price(
    price: Decimal,
    promotions: &[promotion::Model],
    today: NaiveDate,
) -> PriceQuote {
    let percent = active_discount_percent(promotions, today);
    if percent > Decimal::ZERO {
        let discounted = price - price * percent / dec!(100);
        PriceQuote::Discounted(
            discounted.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    } else {
        PriceQuote::NotDiscounted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn promo(start: NaiveDate, end: NaiveDate, percent: Decimal) -> promotion::Model {
        promotion::Model {
            id: Uuid::new_v4(),
            start_date: start,
            end_date: end,
            percent,
            product_id: Uuid::new_v4(),
        }
    }

    fn candidate(start: NaiveDate, end: NaiveDate, percent: Decimal) -> CandidateWindow {
        CandidateWindow {
            start_date: start,
            end_date: end,
            percent,
        }
    }

    #[test]
    fn valid_window_with_no_existing_promotions_passes() {
        let c = candidate(date(2024, 2, 1), date(2024, 3, 1), dec!(40));
        assert_eq!(validate_window(&c, &[], date(2023, 10, 3)), Ok(()));
    }

    #[test]
    fn inverted_range_is_rejected_first() {
        // Percent is also invalid; the date check must short-circuit first
        let c = candidate(date(2024, 3, 1), date(2024, 2, 1), dec!(90));
        assert_eq!(
            validate_window(&c, &[], date(2023, 10, 3)),
            Err(WindowRejection::InvertedRange {
                start: date(2024, 3, 1),
                end: date(2024, 2, 1),
            })
        );
    }

    #[test]
    fn single_day_window_is_valid() {
        let c = candidate(date(2024, 2, 1), date(2024, 2, 1), dec!(10));
        assert_eq!(validate_window(&c, &[], date(2024, 1, 1)), Ok(()));
    }

    #[test]
    fn percent_bounds_are_exclusive() {
        let today = date(2023, 10, 3);
        for bad in [dec!(0), dec!(50), dec!(-5), dec!(80)] {
            let c = candidate(date(2024, 2, 1), date(2024, 3, 1), bad);
            assert_eq!(
                validate_window(&c, &[], today),
                Err(WindowRejection::PercentOutOfRange(bad)),
                "percent {bad} should be rejected"
            );
        }
        for ok in [dec!(0.01), dec!(40), dec!(49.99)] {
            let c = candidate(date(2024, 2, 1), date(2024, 3, 1), ok);
            assert_eq!(validate_window(&c, &[], today), Ok(()), "percent {ok} should pass");
        }
    }

    #[test]
    fn overlapping_window_is_rejected() {
        let existing = vec![promo(date(2023, 9, 1), date(2023, 12, 31), dec!(40))];
        let today = date(2023, 10, 3);

        // Fully inside
        let c = candidate(date(2023, 10, 1), date(2023, 10, 1), dec!(20));
        assert!(validate_window(&c, &existing, today).is_err());

        // Touching the end date (inclusive overlap)
        let c = candidate(date(2023, 12, 31), date(2024, 1, 15), dec!(20));
        assert!(validate_window(&c, &existing, today).is_err());

        // Touching the start date
        let c = candidate(date(2023, 8, 1), date(2023, 9, 1), dec!(20));
        assert!(validate_window(&c, &existing, today).is_err());

        // Straddling the whole window
        let c = candidate(date(2023, 8, 1), date(2024, 2, 1), dec!(20));
        assert!(validate_window(&c, &existing, today).is_err());
    }

    #[test]
    fn adjacent_windows_do_not_overlap() {
        let existing = vec![promo(date(2023, 9, 1), date(2023, 12, 31), dec!(40))];
        let c = candidate(date(2024, 1, 1), date(2024, 2, 1), dec!(20));
        assert_eq!(validate_window(&c, &existing, date(2023, 10, 3)), Ok(()));
    }

    #[test]
    fn expired_promotions_are_ignored_by_the_overlap_check() {
        let existing = vec![promo(date(2022, 10, 1), date(2022, 12, 31), dec!(40))];
        // Same dates as the expired window; acceptable because it is history
        let c = candidate(date(2022, 10, 1), date(2022, 12, 31), dec!(20));
        assert_eq!(validate_window(&c, &existing, date(2023, 10, 3)), Ok(()));
    }

    #[test]
    fn active_percent_picks_the_covering_window() {
        let today = date(2023, 10, 3);
        // Unsorted on purpose
        let promotions = vec![
            promo(date(2024, 1, 1), date(2024, 2, 1), dec!(25)),
            promo(date(2023, 9, 1), date(2023, 12, 31), dec!(40)),
            promo(date(2022, 1, 1), date(2022, 2, 1), dec!(10)),
        ];
        assert_eq!(active_discount_percent(&promotions, today), dec!(40));
    }

    #[test]
    fn active_percent_is_zero_without_a_covering_window() {
        let today = date(2023, 10, 3);
        assert_eq!(active_discount_percent(&[], today), Decimal::ZERO);

        let promotions = vec![promo(date(2024, 1, 1), date(2024, 2, 1), dec!(25))];
        assert_eq!(active_discount_percent(&promotions, today), Decimal::ZERO);
    }

    #[test]
    fn window_bounds_are_inclusive_for_activation() {
        let promotions = vec![promo(date(2023, 9, 1), date(2023, 12, 31), dec!(40))];
        assert_eq!(active_discount_percent(&promotions, date(2023, 9, 1)), dec!(40));
        assert_eq!(active_discount_percent(&promotions, date(2023, 12, 31)), dec!(40));
        assert_eq!(
            active_discount_percent(&promotions, date(2023, 8, 31)),
            Decimal::ZERO
        );
        assert_eq!(
            active_discount_percent(&promotions, date(2024, 1, 1)),
            Decimal::ZERO
        );
    }

    #[test]
    fn effective_price_rounds_half_up() {
        let today = date(2023, 10, 3);
        let promotions = vec![promo(date(2023, 9, 1), date(2023, 12, 31), dec!(40))];

        // 2600.79 * 0.6 = 1560.474 -> 1560.47
        assert_eq!(
            effective_price(dec!(2600.79), &promotions, today),
            PriceQuote::Discounted(dec!(1560.47))
        );

        // 2600.59 * 0.6 = 1560.354 -> 1560.35
        assert_eq!(
            effective_price(dec!(2600.59), &promotions, today),
            PriceQuote::Discounted(dec!(1560.35))
        );
    }

    #[test]
    fn effective_price_half_up_not_bankers() {
        let today = date(2023, 10, 3);
        // 1.25 at 10% off = 1.125: half-up gives 1.13, banker's would give 1.12
        let promotions = vec![promo(date(2023, 9, 1), date(2023, 12, 31), dec!(10))];
        assert_eq!(
            effective_price(dec!(1.25), &promotions, today),
            PriceQuote::Discounted(dec!(1.13))
        );
    }

    #[test]
    fn effective_price_returns_marker_without_active_promotion() {
        let today = date(2023, 10, 3);
        assert_eq!(
            effective_price(dec!(458.54), &[], today),
            PriceQuote::NotDiscounted
        );

        let expired = vec![promo(date(2022, 10, 1), date(2022, 12, 31), dec!(40))];
        assert_eq!(
            effective_price(dec!(458.54), &expired, today),
            PriceQuote::NotDiscounted
        );
    }

    #[test]
    fn price_quote_serializes_to_decimal_or_marker() {
        let quote = PriceQuote::Discounted(dec!(1560.47));
        assert_eq!(serde_json::to_string(&quote).unwrap(), "\"1560.47\"");

        let quote = PriceQuote::NotDiscounted;
        assert_eq!(
            serde_json::to_string(&quote).unwrap(),
            "\"no active promotion\""
        );
    }
}
