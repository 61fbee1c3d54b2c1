//! Customer intake profile and its validation.
//!
//! An [`IntakeProfile`] is built once per request, either programmatically
//! with the `with_*` helpers or parsed from TOML/JSON supplied by a form
//! front-end. Parsing failures and constraint violations are reported as
//! [`EngineError::InvalidIntake`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::Phase;
use crate::error::EngineError;
use crate::tariff::PropertyType;

macro_rules! intake_enum {
    ($name:ident, $field:literal, { $($variant:ident => $slug:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_slug(self) -> &'static str {
                match self {
                    $(Self::$variant => $slug,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_slug())
            }
        }

        impl TryFrom<String> for $name {
            type Error = EngineError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl FromStr for $name {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_ascii_lowercase();
                $(
                    if needle == $slug {
                        return Ok(Self::$variant);
                    }
                )+
                Err(EngineError::invalid_intake(
                    $field,
                    format!("unknown value \"{}\"", s.trim()),
                ))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum BillingPeriod {
    Monthly,
    Quarterly,
}

impl BillingPeriod {
    /// Number of billing periods in a year.
    pub fn periods_per_year(self) -> f64 {
        match self {
            Self::Monthly => 12.0,
            Self::Quarterly => 4.0,
        }
    }
}

intake_enum!(BillingPeriod, "billing_period", {
    Monthly => "monthly",
    Quarterly => "quarterly",
});

/// Customer's own description of how heavily they use energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum UsageLevel {
    Basic,
    #[default]
    Moderate,
    Heavy,
}

intake_enum!(UsageLevel, "usage_level", {
    Basic => "basic",
    Moderate => "moderate",
    Heavy => "heavy",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum RoofType {
    Tile,
    Metal,
    Concrete,
    Flat,
    Slate,
}

intake_enum!(RoofType, "roof_type", {
    Tile => "tile",
    Metal => "metal",
    Concrete => "concrete",
    Flat => "flat",
    Slate => "slate",
});

/// Supply phase as declared by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum SupplyPhase {
    Single,
    Three,
    #[default]
    Unknown,
}

impl SupplyPhase {
    /// Phase used for equipment selection. Unknown supplies are sized as
    /// single phase, the more restrictive connection.
    pub fn resolved(self) -> Phase {
        match self {
            Self::Three => Phase::Three,
            Self::Single | Self::Unknown => Phase::Single,
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

intake_enum!(SupplyPhase, "phase", {
    Single => "single",
    Three => "three",
    Unknown => "unknown",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum OutageSensitivity {
    #[default]
    Low,
    Medium,
    High,
}

intake_enum!(OutageSensitivity, "outage_sensitivity", {
    Low => "low",
    Medium => "medium",
    High => "high",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum BudgetBand {
    Tight,
    #[default]
    Moderate,
    Flexible,
}

intake_enum!(BudgetBand, "budget", {
    Tight => "tight",
    Moderate => "moderate",
    Flexible => "flexible",
});

/// Electric vehicle owned (or planned) by the household.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvOwnership {
    /// Vehicle brand, used to match a dedicated charger.
    pub brand: Option<String>,
}

/// One customer's declared inputs.
///
/// Enum values are matched case-insensitively in every input format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntakeProfile {
    /// Bill amount for one billing period (must be > 0).
    pub bill_amount: f64,
    pub billing_period: BillingPeriod,
    /// Tariff the customer pays, in cents per kWh. Falls back to the region's
    /// flat rate when omitted.
    #[serde(default)]
    pub tariff_cents_per_kwh: Option<f64>,
    #[serde(default)]
    pub usage_level: Option<UsageLevel>,
    pub roof_type: RoofType,
    /// Building storeys (1–3).
    pub storeys: u8,
    #[serde(default)]
    pub phase: SupplyPhase,
    /// Directly stated daily consumption, overriding the bill estimate.
    #[serde(default)]
    pub daily_kwh: Option<f64>,
    #[serde(default)]
    pub ev: Option<EvOwnership>,
    #[serde(default)]
    pub outage_sensitivity: Option<OutageSensitivity>,
    #[serde(default)]
    pub budget: Option<BudgetBand>,
    /// Four-digit postcode.
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    /// Preferred inverter brand.
    #[serde(default)]
    pub brand_preference: Option<String>,
    #[serde(default)]
    pub property_type: Option<PropertyType>,
    /// Current energy retailer, used to look up the feed-in rate.
    #[serde(default)]
    pub retailer: Option<String>,
}

impl IntakeProfile {
    /// Creates a profile with the required fields and every optional field unset.
    pub fn new(bill_amount: f64, billing_period: BillingPeriod, roof_type: RoofType, storeys: u8) -> Self {
        Self {
            bill_amount,
            billing_period,
            tariff_cents_per_kwh: None,
            usage_level: None,
            roof_type,
            storeys,
            phase: SupplyPhase::Unknown,
            daily_kwh: None,
            ev: None,
            outage_sensitivity: None,
            budget: None,
            postcode: None,
            suburb: None,
            brand_preference: None,
            property_type: None,
            retailer: None,
        }
    }

    pub fn with_tariff(mut self, cents_per_kwh: f64) -> Self {
        self.tariff_cents_per_kwh = Some(cents_per_kwh);
        self
    }

    pub fn with_usage_level(mut self, level: UsageLevel) -> Self {
        self.usage_level = Some(level);
        self
    }

    pub fn with_phase(mut self, phase: SupplyPhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_daily_kwh(mut self, daily_kwh: f64) -> Self {
        self.daily_kwh = Some(daily_kwh);
        self
    }

    pub fn with_ev(mut self, brand: Option<&str>) -> Self {
        self.ev = Some(EvOwnership {
            brand: brand.map(str::to_string),
        });
        self
    }

    pub fn with_outage_sensitivity(mut self, sensitivity: OutageSensitivity) -> Self {
        self.outage_sensitivity = Some(sensitivity);
        self
    }

    pub fn with_budget(mut self, budget: BudgetBand) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_postcode(mut self, postcode: impl Into<String>) -> Self {
        self.postcode = Some(postcode.into());
        self
    }

    pub fn with_brand_preference(mut self, brand: impl Into<String>) -> Self {
        self.brand_preference = Some(brand.into());
        self
    }

    pub fn with_property_type(mut self, property: PropertyType) -> Self {
        self.property_type = Some(property);
        self
    }

    pub fn with_retailer(mut self, retailer: impl Into<String>) -> Self {
        self.retailer = Some(retailer.into());
        self
    }

    /// Usage level, defaulting to moderate when absent.
    pub fn usage_level_or_default(&self) -> UsageLevel {
        self.usage_level.unwrap_or_default()
    }

    pub fn property_type_or_default(&self) -> PropertyType {
        self.property_type.unwrap_or_default()
    }

    /// Numeric postcode, if one was supplied and is well formed.
    pub fn postcode_number(&self) -> Option<u32> {
        self.postcode.as_deref().and_then(|p| p.trim().parse().ok())
    }

    /// Non-empty brand preference.
    pub fn preferred_brand(&self) -> Option<&str> {
        self.brand_preference
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    pub fn has_ev(&self) -> bool {
        self.ev.is_some()
    }

    pub fn ev_brand(&self) -> Option<&str> {
        self.ev
            .as_ref()
            .and_then(|ev| ev.brand.as_deref())
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    pub fn has_stated_retailer(&self) -> bool {
        self.retailer.as_deref().is_some_and(|r| !r.trim().is_empty())
    }

    /// Checks the constraints the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidIntake`] naming the first offending field.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.bill_amount.is_finite() || self.bill_amount <= 0.0 {
            return Err(EngineError::invalid_intake("bill_amount", "must be > 0"));
        }
        if !(1..=3).contains(&self.storeys) {
            return Err(EngineError::invalid_intake("storeys", "must be between 1 and 3"));
        }
        if let Some(tariff) = self.tariff_cents_per_kwh {
            if !tariff.is_finite() || tariff <= 0.0 {
                return Err(EngineError::invalid_intake(
                    "tariff_cents_per_kwh",
                    "must be > 0",
                ));
            }
        }
        if let Some(daily) = self.daily_kwh {
            if !daily.is_finite() || daily <= 0.0 {
                return Err(EngineError::invalid_intake("daily_kwh", "must be > 0"));
            }
        }
        if let Some(postcode) = &self.postcode {
            let trimmed = postcode.trim();
            if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
                return Err(EngineError::invalid_intake(
                    "postcode",
                    format!("\"{trimmed}\" is not a four-digit postcode"),
                ));
            }
        }
        Ok(())
    }

    /// Parses and validates a profile from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidIntake`] for malformed input, unknown
    /// fields or enum values, or constraint violations.
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        let profile: Self = toml::from_str(s)
            .map_err(|e| EngineError::invalid_intake("intake", e.message().to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Parses and validates a profile from a JSON string.
    ///
    /// # Errors
    ///
    /// See [`IntakeProfile::from_toml_str`].
    pub fn from_json_str(s: &str) -> Result<Self, EngineError> {
        let profile: Self = serde_json::from_str(s)
            .map_err(|e| EngineError::invalid_intake("intake", e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Parses and validates a profile from an already-decoded JSON value.
    ///
    /// # Errors
    ///
    /// See [`IntakeProfile::from_toml_str`].
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, EngineError> {
        let profile: Self = serde_json::from_value(value)
            .map_err(|e| EngineError::invalid_intake("intake", e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }
}
