//! Rebate calculator: certificate-based federal incentive plus regional rebate.

use serde::Serialize;

use crate::config::RebateConfig;
use crate::tariff::RegionalRebate;

/// Inclusive postcode ranges and their zone ratings. Earlier rows win, so
/// sub-ranges precede the state-wide range that contains them.
const ZONE_TABLE: &[(u32, u32, f64)] = &[
    (800, 999, 1.622),   // NT
    (4700, 4899, 1.536), // north QLD
    (6700, 6799, 1.622), // north WA
    (2000, 2999, 1.382), // NSW, ACT
    (4000, 4999, 1.382), // QLD
    (5000, 5999, 1.382), // SA
    (6000, 6999, 1.382), // WA
    (3000, 3999, 1.185), // VIC
    (7000, 7999, 1.185), // TAS
];

/// Zone rating for a postcode, or `default` when it is absent or unmapped.
pub fn zone_rating(postcode: Option<u32>, default: f64) -> f64 {
    postcode
        .and_then(|pc| {
            ZONE_TABLE
                .iter()
                .find(|(lo, hi, _)| (*lo..=*hi).contains(&pc))
                .map(|(_, _, rating)| *rating)
        })
        .unwrap_or(default)
}

/// Certificates created for a system: `floor(size × zone × years)`, never negative.
pub fn certificate_count(size: f64, zone_rating: f64, deeming_years: u32) -> u32 {
    let raw = (size * zone_rating * f64::from(deeming_years)).floor();
    if raw.is_finite() && raw > 0.0 {
        // Saturating float-to-int cast.
        raw as u32
    } else {
        0
    }
}

/// Whether a regional program applies to this postcode and system.
pub fn regional_eligible(program: Option<&RegionalRebate>, postcode: Option<u32>, has_battery: bool) -> bool {
    match (program, postcode) {
        (Some(program), Some(pc)) => program.covers(pc) && (has_battery || !program.requires_battery),
        _ => false,
    }
}

/// Inputs for one candidate's rebate calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebateInput {
    pub pv_kw: f64,
    pub battery_kwh: Option<f64>,
    pub zone_rating: f64,
    pub regional_eligible: bool,
    /// Amount granted by the regional program when eligible.
    pub regional_amount: f64,
}

/// Computed incentive values for one candidate. All components are ≥ 0 and
/// `total` is their sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RebateResult {
    pub zone_rating: f64,
    pub pv_certificates: u32,
    pub pv_rebate: f64,
    pub battery_certificates: u32,
    pub battery_rebate: f64,
    pub regional_rebate: f64,
    pub total: f64,
}

/// Computes certificate and regional rebates.
pub fn calculate(input: &RebateInput, cfg: &RebateConfig) -> RebateResult {
    let price = cfg.certificate_price.max(0.0);

    let pv_certificates = certificate_count(input.pv_kw, input.zone_rating, cfg.deeming_years);
    let pv_rebate = f64::from(pv_certificates) * price;

    let battery_certificates = input
        .battery_kwh
        .map(|kwh| certificate_count(kwh, input.zone_rating, cfg.deeming_years))
        .unwrap_or(0);
    let battery_rebate = f64::from(battery_certificates) * price;

    let regional_rebate = if input.regional_eligible {
        input.regional_amount.max(0.0)
    } else {
        0.0
    };

    RebateResult {
        zone_rating: input.zone_rating,
        pv_certificates,
        pv_rebate,
        battery_certificates,
        battery_rebate,
        regional_rebate,
        total: pv_rebate + battery_rebate + regional_rebate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::RegionTariffProfile;

    fn input(pv_kw: f64, battery_kwh: Option<f64>) -> RebateInput {
        RebateInput {
            pv_kw,
            battery_kwh,
            zone_rating: 1.382,
            regional_eligible: false,
            regional_amount: 0.0,
        }
    }

    #[test]
    fn zone_lookup_prefers_sub_ranges() {
        assert_eq!(zone_rating(Some(4870), 1.0), 1.536);
        assert_eq!(zone_rating(Some(4000), 1.0), 1.382);
        assert_eq!(zone_rating(Some(810), 1.0), 1.622);
        assert_eq!(zone_rating(Some(3000), 1.0), 1.185);
    }

    #[test]
    fn unmapped_postcode_uses_default() {
        assert_eq!(zone_rating(Some(9999), 1.3), 1.3);
        assert_eq!(zone_rating(None, 1.3), 1.3);
    }

    #[test]
    fn certificates_round_down() {
        // 6.6 × 1.382 × 5 = 45.606
        assert_eq!(certificate_count(6.6, 1.382, 5), 45);
        assert_eq!(certificate_count(0.0, 1.382, 5), 0);
        assert_eq!(certificate_count(-3.0, 1.382, 5), 0);
    }

    #[test]
    fn pv_only_rebate() {
        let r = calculate(&input(6.6, None), &RebateConfig::default());
        assert_eq!(r.pv_certificates, 45);
        assert_eq!(r.pv_rebate, 45.0 * 38.0);
        assert_eq!(r.battery_rebate, 0.0);
        assert_eq!(r.total, r.pv_rebate);
    }

    #[test]
    fn battery_uses_same_zone() {
        let r = calculate(&input(6.6, Some(10.0)), &RebateConfig::default());
        assert_eq!(r.battery_certificates, 69);
        assert_eq!(r.total, r.pv_rebate + r.battery_rebate + r.regional_rebate);
    }

    #[test]
    fn regional_rebate_only_when_eligible() {
        let mut i = input(6.6, Some(10.0));
        i.regional_amount = 1600.0;
        let cfg = RebateConfig::default();
        assert_eq!(calculate(&i, &cfg).regional_rebate, 0.0);
        i.regional_eligible = true;
        assert_eq!(calculate(&i, &cfg).regional_rebate, 1600.0);
    }

    #[test]
    fn negative_amounts_clamp_to_zero() {
        let mut i = input(6.6, None);
        i.regional_eligible = true;
        i.regional_amount = -500.0;
        let cfg = RebateConfig {
            certificate_price: -10.0,
            ..RebateConfig::default()
        };
        let r = calculate(&i, &cfg);
        assert_eq!(r.total, 0.0);
    }

    #[test]
    fn eligibility_requires_coverage_and_battery() {
        let nsw = RegionTariffProfile::nsw();
        let program = nsw.regional_rebate.as_ref();
        assert!(regional_eligible(program, Some(2000), true));
        assert!(!regional_eligible(program, Some(2000), false));
        assert!(!regional_eligible(program, Some(4000), true));
        assert!(!regional_eligible(program, None, true));
        let vic = RegionTariffProfile::vic();
        assert!(regional_eligible(vic.regional_rebate.as_ref(), Some(3150), false));
    }
}
