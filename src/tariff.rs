//! Regional tariff profiles: energy rates, feed-in, export caps and usage bands.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::Phase;
use crate::config::ConfigError;
use crate::error::EngineError;

/// Dwelling type used to look up the expected daily usage band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum PropertyType {
    Apartment,
    Townhouse,
    #[default]
    House,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Apartment => "apartment",
            Self::Townhouse => "townhouse",
            Self::House => "house",
        };
        write!(f, "{name}")
    }
}

impl TryFrom<String> for PropertyType {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for PropertyType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apartment" | "unit" => Ok(Self::Apartment),
            "townhouse" => Ok(Self::Townhouse),
            "house" => Ok(Self::House),
            other => Err(EngineError::invalid_intake(
                "property_type",
                format!("unknown property type \"{other}\""),
            )),
        }
    }
}

/// Typical daily consumption range for one property type (kWh/day).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DailyUsageBand {
    pub low_kwh: f64,
    pub high_kwh: f64,
}

impl DailyUsageBand {
    pub fn contains(&self, daily_kwh: f64) -> bool {
        (self.low_kwh..=self.high_kwh).contains(&daily_kwh)
    }
}

/// Default daily usage bands by property type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsageBands {
    pub apartment: DailyUsageBand,
    pub townhouse: DailyUsageBand,
    pub house: DailyUsageBand,
}

impl UsageBands {
    pub fn for_property(&self, property: PropertyType) -> DailyUsageBand {
        match property {
            PropertyType::Apartment => self.apartment,
            PropertyType::Townhouse => self.townhouse,
            PropertyType::House => self.house,
        }
    }
}

/// Feed-in tariff in $/kWh, optionally varying by retailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedInTariff {
    pub default_per_kwh: f64,
    pub min_per_kwh: f64,
    pub max_per_kwh: f64,
    /// Retailer name (lowercase) to rate.
    #[serde(default)]
    pub by_retailer: BTreeMap<String, f64>,
}

impl FeedInTariff {
    /// Rate for the given retailer, falling back to the default, clamped to
    /// the configured range.
    pub fn rate_for(&self, retailer: Option<&str>) -> f64 {
        let rate = retailer
            .and_then(|r| self.by_retailer.get(&r.trim().to_ascii_lowercase()))
            .copied()
            .unwrap_or(self.default_per_kwh);
        rate.clamp(self.min_per_kwh, self.max_per_kwh)
    }
}

/// Export-capacity ceilings in kW keyed by phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportCaps {
    pub single_phase_kw: f64,
    pub three_phase_kw: f64,
}

impl ExportCaps {
    pub fn ceiling_for(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Single => self.single_phase_kw,
            Phase::Three => self.three_phase_kw,
        }
    }
}

/// Battery round-trip-efficiency assumptions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatteryEfficiency {
    pub default_rte: f64,
    pub min_rte: f64,
    pub max_rte: f64,
}

impl BatteryEfficiency {
    /// Clamps a catalog efficiency into the region's accepted range.
    pub fn clamp(&self, rte: Option<f64>) -> f64 {
        rte.unwrap_or(self.default_rte).clamp(self.min_rte, self.max_rte)
    }
}

/// State or utility capital rebate program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionalRebate {
    pub name: String,
    pub amount: f64,
    /// Only systems including a battery qualify.
    #[serde(default)]
    pub requires_battery: bool,
    /// Inclusive postcode ranges covered by the program.
    #[serde(default)]
    pub postcode_ranges: Vec<[u32; 2]>,
}

impl RegionalRebate {
    pub fn covers(&self, postcode: u32) -> bool {
        self.postcode_ranges
            .iter()
            .any(|[lo, hi]| (*lo..=*hi).contains(&postcode))
    }
}

/// Static assumptions for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionTariffProfile {
    pub name: String,
    /// Volumetric import rate ($/kWh).
    pub flat_rate_per_kwh: f64,
    /// Fixed supply charge ($/day).
    pub daily_charge: f64,
    pub feed_in: FeedInTariff,
    pub export_caps: ExportCaps,
    pub usage_bands: UsageBands,
    pub battery_efficiency: BatteryEfficiency,
    /// Average PV yield (kWh per installed kW per day).
    pub pv_yield_kwh_per_kw_day: f64,
    /// Zone rating used when a postcode cannot be mapped.
    pub default_zone_rating: f64,
    #[serde(default)]
    pub regional_rebate: Option<RegionalRebate>,
}

fn export_caps() -> ExportCaps {
    ExportCaps {
        single_phase_kw: 5.0,
        three_phase_kw: 15.0,
    }
}

fn battery_efficiency() -> BatteryEfficiency {
    BatteryEfficiency {
        default_rte: 0.90,
        min_rte: 0.80,
        max_rte: 0.95,
    }
}

fn band(low_kwh: f64, high_kwh: f64) -> DailyUsageBand {
    DailyUsageBand { low_kwh, high_kwh }
}

impl RegionTariffProfile {
    /// New South Wales.
    pub fn nsw() -> Self {
        Self {
            name: "nsw".to_string(),
            flat_rate_per_kwh: 0.33,
            daily_charge: 1.10,
            feed_in: FeedInTariff {
                default_per_kwh: 0.07,
                min_per_kwh: 0.0,
                max_per_kwh: 0.15,
                by_retailer: BTreeMap::from([
                    ("agl".to_string(), 0.06),
                    ("origin".to_string(), 0.05),
                    ("red energy".to_string(), 0.08),
                ]),
            },
            export_caps: export_caps(),
            usage_bands: UsageBands {
                apartment: band(6.0, 12.0),
                townhouse: band(10.0, 18.0),
                house: band(14.0, 30.0),
            },
            battery_efficiency: battery_efficiency(),
            pv_yield_kwh_per_kw_day: 4.0,
            default_zone_rating: 1.382,
            regional_rebate: Some(RegionalRebate {
                name: "Peak Demand Reduction Scheme".to_string(),
                amount: 1600.0,
                requires_battery: true,
                postcode_ranges: vec![[2000, 2599], [2619, 2899], [2921, 2999]],
            }),
        }
    }

    /// Queensland.
    pub fn qld() -> Self {
        Self {
            name: "qld".to_string(),
            flat_rate_per_kwh: 0.31,
            daily_charge: 1.15,
            feed_in: FeedInTariff {
                default_per_kwh: 0.06,
                min_per_kwh: 0.0,
                max_per_kwh: 0.12,
                by_retailer: BTreeMap::from([("origin".to_string(), 0.05)]),
            },
            export_caps: export_caps(),
            usage_bands: UsageBands {
                apartment: band(7.0, 13.0),
                townhouse: band(11.0, 20.0),
                house: band(16.0, 32.0),
            },
            battery_efficiency: battery_efficiency(),
            pv_yield_kwh_per_kw_day: 4.4,
            default_zone_rating: 1.382,
            regional_rebate: None,
        }
    }

    /// Victoria.
    pub fn vic() -> Self {
        Self {
            name: "vic".to_string(),
            flat_rate_per_kwh: 0.28,
            daily_charge: 1.05,
            feed_in: FeedInTariff {
                default_per_kwh: 0.049,
                min_per_kwh: 0.0,
                max_per_kwh: 0.10,
                by_retailer: BTreeMap::new(),
            },
            export_caps: export_caps(),
            usage_bands: UsageBands {
                apartment: band(6.0, 11.0),
                townhouse: band(9.0, 16.0),
                house: band(13.0, 26.0),
            },
            battery_efficiency: battery_efficiency(),
            pv_yield_kwh_per_kw_day: 3.6,
            default_zone_rating: 1.185,
            regional_rebate: Some(RegionalRebate {
                name: "Solar Homes".to_string(),
                amount: 1400.0,
                requires_battery: false,
                postcode_ranges: vec![[3000, 3999], [8000, 8999]],
            }),
        }
    }

    /// Available region profile names.
    pub const PROFILES: &[&str] = &["nsw", "qld", "vic"];

    /// Looks up a built-in region profile by name.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the profile name is unknown.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nsw" => Ok(Self::nsw()),
            "qld" => Ok(Self::qld()),
            "vic" => Ok(Self::vic()),
            _ => Err(ConfigError {
                field: "region.profile".to_string(),
                message: format!(
                    "unknown region \"{name}\", available: {}",
                    Self::PROFILES.join(", ")
                ),
            }),
        }
    }

    /// Validates rates, caps and bands, returning every problem found.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError {
                    field: format!("region.{field}"),
                    message: message.to_string(),
                });
            }
        };

        check(self.flat_rate_per_kwh > 0.0, "flat_rate_per_kwh", "must be > 0");
        check(self.daily_charge >= 0.0, "daily_charge", "must be >= 0");
        check(
            self.feed_in.min_per_kwh >= 0.0 && self.feed_in.min_per_kwh <= self.feed_in.max_per_kwh,
            "feed_in.min_per_kwh",
            "must be >= 0 and <= feed_in.max_per_kwh",
        );
        check(
            self.export_caps.single_phase_kw > 0.0,
            "export_caps.single_phase_kw",
            "must be > 0",
        );
        check(
            self.export_caps.three_phase_kw >= self.export_caps.single_phase_kw,
            "export_caps.three_phase_kw",
            "must be >= export_caps.single_phase_kw",
        );
        for (name, b) in [
            ("apartment", self.usage_bands.apartment),
            ("townhouse", self.usage_bands.townhouse),
            ("house", self.usage_bands.house),
        ] {
            check(
                b.low_kwh > 0.0 && b.low_kwh <= b.high_kwh,
                &format!("usage_bands.{name}"),
                "must satisfy 0 < low_kwh <= high_kwh",
            );
        }
        let eff = &self.battery_efficiency;
        check(
            eff.min_rte > 0.0 && eff.min_rte <= eff.max_rte && eff.max_rte <= 1.0,
            "battery_efficiency",
            "must satisfy 0 < min_rte <= max_rte <= 1",
        );
        check(
            (eff.min_rte..=eff.max_rte).contains(&eff.default_rte),
            "battery_efficiency.default_rte",
            "must lie within [min_rte, max_rte]",
        );
        check(
            self.pv_yield_kwh_per_kw_day > 0.0,
            "pv_yield_kwh_per_kw_day",
            "must be > 0",
        );
        check(self.default_zone_rating > 0.0, "default_zone_rating", "must be > 0");
        if let Some(rebate) = &self.regional_rebate {
            check(rebate.amount >= 0.0, "regional_rebate.amount", "must be >= 0");
        }

        errors
    }
}

/// Admin overrides applied on top of a built-in region profile at load time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegionOverrides {
    pub flat_rate_per_kwh: Option<f64>,
    pub daily_charge: Option<f64>,
    pub feed_in_default_per_kwh: Option<f64>,
    pub feed_in_min_per_kwh: Option<f64>,
    pub feed_in_max_per_kwh: Option<f64>,
    pub export_cap_single_kw: Option<f64>,
    pub export_cap_three_kw: Option<f64>,
    pub usage_bands: Option<UsageBands>,
    pub pv_yield_kwh_per_kw_day: Option<f64>,
}

impl RegionOverrides {
    /// Returns a copy of `profile` with every set override applied.
    pub fn apply(&self, profile: &RegionTariffProfile) -> RegionTariffProfile {
        let mut out = profile.clone();
        if let Some(v) = self.flat_rate_per_kwh {
            out.flat_rate_per_kwh = v;
        }
        if let Some(v) = self.daily_charge {
            out.daily_charge = v;
        }
        if let Some(v) = self.feed_in_default_per_kwh {
            out.feed_in.default_per_kwh = v;
        }
        if let Some(v) = self.feed_in_min_per_kwh {
            out.feed_in.min_per_kwh = v;
        }
        if let Some(v) = self.feed_in_max_per_kwh {
            out.feed_in.max_per_kwh = v;
        }
        if let Some(v) = self.export_cap_single_kw {
            out.export_caps.single_phase_kw = v;
        }
        if let Some(v) = self.export_cap_three_kw {
            out.export_caps.three_phase_kw = v;
        }
        if let Some(bands) = &self.usage_bands {
            out.usage_bands = bands.clone();
        }
        if let Some(v) = self.pv_yield_kwh_per_kw_day {
            out.pv_yield_kwh_per_kw_day = v;
        }
        out
    }
}
