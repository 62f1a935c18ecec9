use crate::errors::{PricingError, PricingResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day count used to turn calendar days into a year fraction.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Treasury-style yield points, stored as annual fractions (0.05 = 5%).
///
/// The curve is supplied by a market-data collaborator. This type only knows how
/// to pick the point that matches a horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateCurve {
    pub three_month: f64,
    pub six_month: f64,
    pub one_year: f64,
    pub five_year: f64,
    pub ten_year: f64,
}

impl RateCurve {
    /// Builds a curve from published percentages (5.25 -> 0.0525).
    pub fn from_percentages(
        three_month: f64,
        six_month: f64,
        one_year: f64,
        five_year: f64,
        ten_year: f64,
    ) -> PricingResult<Self> {
        let points = [three_month, six_month, one_year, five_year, ten_year];
        if let Some(bad) = points.iter().find(|r| !r.is_finite()) {
            return Err(PricingError::Domain(format!("rate must be finite, got {bad}")));
        }
        Ok(Self {
            three_month: three_month / 100.0,
            six_month: six_month / 100.0,
            one_year: one_year / 100.0,
            five_year: five_year / 100.0,
            ten_year: ten_year / 100.0,
        })
    }

    /// Rate for a horizon of `days`. No horizon means the shortest tenor.
    ///
    /// Buckets on T = days/365: <= 0.25 -> 3M, <= 0.5 -> 6M, <= 1 -> 1Y,
    /// <= 5 -> 5Y, otherwise 10Y.
    pub fn rate_for_days(&self, days: Option<u32>) -> f64 {
        match days {
            None => self.three_month,
            Some(d) => self.rate_for_years(year_fraction(i64::from(d))),
        }
    }

    pub fn rate_for_years(&self, t: f64) -> f64 {
        if t <= 0.25 {
            self.three_month
        } else if t <= 0.5 {
            self.six_month
        } else if t <= 1.0 {
            self.one_year
        } else if t <= 5.0 {
            self.five_year
        } else {
            self.ten_year
        }
    }
}

/// Calendar days to a year fraction (days / 365).
#[inline]
pub fn year_fraction(days: i64) -> f64 {
    days as f64 / DAYS_PER_YEAR
}

/// Whole calendar days from `today` until `expiry`. Negative once expired.
#[inline]
pub fn days_to_expiry(today: NaiveDate, expiry: NaiveDate) -> i64 {
    (expiry - today).num_days()
}

/// De-annualises a compound rate: (1 + annual)^(1/periods) - 1.
/// `periodic_rate(0.0546, 12)` is the monthly rate behind a 5.46% APR.
pub fn periodic_rate(annual: f64, periods_per_year: u32) -> PricingResult<f64> {
    if periods_per_year == 0 {
        return Err(PricingError::Domain("periods per year must be at least 1".into()));
    }
    if !annual.is_finite() || annual <= -1.0 {
        return Err(PricingError::Domain(format!(
            "annual rate must be finite and above -100%, got {annual}"
        )));
    }
    Ok((1.0 + annual).powf(1.0 / f64::from(periods_per_year)) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> RateCurve {
        RateCurve::from_percentages(5.25, 5.10, 4.90, 4.30, 4.25).unwrap()
    }

    #[test]
    fn test_from_percentages() {
        let c = curve();
        assert!((c.three_month - 0.0525).abs() < 1e-12);
        assert!((c.ten_year - 0.0425).abs() < 1e-12);
        assert!(RateCurve::from_percentages(f64::NAN, 1.0, 1.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_bucket_boundaries() {
        let c = curve();
        assert_eq!(c.rate_for_days(None), c.three_month);
        assert_eq!(c.rate_for_days(Some(30)), c.three_month);
        assert_eq!(c.rate_for_years(0.25), c.three_month);
        assert_eq!(c.rate_for_days(Some(92)), c.six_month);
        assert_eq!(c.rate_for_years(0.5), c.six_month);
        assert_eq!(c.rate_for_days(Some(365)), c.one_year);
        assert_eq!(c.rate_for_days(Some(366)), c.five_year);
        assert_eq!(c.rate_for_years(5.0), c.five_year);
        assert_eq!(c.rate_for_days(Some(3650)), c.ten_year);
    }

    #[test]
    fn test_days_to_expiry() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 18).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2024, 7, 19).unwrap();
        assert_eq!(days_to_expiry(today, expiry), 31);
        assert_eq!(days_to_expiry(expiry, today), -31);
        assert!((year_fraction(73) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_periodic_rate() {
        let monthly = periodic_rate(0.0546, 12).unwrap();
        assert!((monthly - 0.004_442).abs() < 1e-5, "monthly={monthly}");
        // compounding back recovers the annual rate
        assert!(((1.0 + monthly).powi(12) - 1.0 - 0.0546).abs() < 1e-12);
        assert!(periodic_rate(0.05, 0).is_err());
        assert!(periodic_rate(-1.5, 12).is_err());
    }
}
