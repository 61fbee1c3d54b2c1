//! Catalog item types: categories, tiers and category-specific specs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Component category of a purchasable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Panel,
    Inverter,
    Battery,
    EvCharger,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Panel => "panel",
            Self::Inverter => "inverter",
            Self::Battery => "battery",
            Self::EvCharger => "ev_charger",
        };
        write!(f, "{name}")
    }
}

/// Quality tier of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Entry,
    Mid,
    Premium,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Entry => "entry",
            Self::Mid => "mid",
            Self::Premium => "premium",
        };
        write!(f, "{name}")
    }
}

/// Recommendation package tier. Each package draws items from one quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageTier {
    Value,
    Balanced,
    Premium,
}

impl PackageTier {
    /// All package tiers in evaluation order.
    pub const ALL: [PackageTier; 3] = [Self::Value, Self::Balanced, Self::Premium];

    /// Catalog quality tier the package draws its items from.
    pub fn quality_tier(self) -> Tier {
        match self {
            Self::Value => Tier::Entry,
            Self::Balanced => Tier::Mid,
            Self::Premium => Tier::Premium,
        }
    }

    pub fn as_slug(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Balanced => "balanced",
            Self::Premium => "premium",
        }
    }
}

impl fmt::Display for PackageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_slug())
    }
}

/// Electrical supply phase of an inverter or connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Single,
    Three,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Three => write!(f, "three"),
        }
    }
}

impl FromStr for Phase {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "1" => Ok(Self::Single),
            "three" | "3" => Ok(Self::Three),
            other => Err(EngineError::invalid_intake(
                "phase",
                format!("unknown phase \"{other}\""),
            )),
        }
    }
}

/// How well an inverter copes with partially shaded strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadeGrade {
    Basic,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chemistry {
    Lfp,
    Nmc,
}

/// Whether a battery couples on the AC bus or the inverter's DC bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coupling {
    Ac,
    Dc,
}

/// Category-specific specifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemSpecs {
    Panel {
        watts: u32,
        efficiency_pct: f64,
    },
    Inverter {
        ac_kw: f64,
        phase: Phase,
        shade_handling: ShadeGrade,
    },
    Battery {
        usable_kwh: f64,
        depth_of_discharge: f64,
        chemistry: Chemistry,
        round_trip_efficiency: f64,
        coupling: Coupling,
    },
    EvCharger {
        power_kw: f64,
        /// Vehicle brands this charger is sold for. Empty for universal units.
        #[serde(default)]
        compatible_brands: Vec<String>,
    },
}

impl ItemSpecs {
    pub fn category(&self) -> Category {
        match self {
            Self::Panel { .. } => Category::Panel,
            Self::Inverter { .. } => Category::Inverter,
            Self::Battery { .. } => Category::Battery,
            Self::EvCharger { .. } => Category::EvCharger,
        }
    }
}

/// A purchasable component. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogItem {
    /// Unique identifier within the catalog.
    pub id: String,
    pub brand: String,
    pub model: String,
    pub tier: Tier,
    pub specs: ItemSpecs,
    pub warranty_years: u32,
    /// Price per unit before installation.
    pub unit_price: f64,
    /// Item is listed but must never be recommended.
    #[serde(default)]
    pub do_not_sell: bool,
    /// Item carries a good field-reliability record.
    #[serde(default)]
    pub reliable: bool,
    /// Inverter brands a DC-coupled battery pairs natively with.
    #[serde(default)]
    pub hybrid_pair_brands: Vec<String>,
}

impl CatalogItem {
    pub fn category(&self) -> Category {
        self.specs.category()
    }

    pub fn is_sellable(&self) -> bool {
        !self.do_not_sell
    }

    /// Case-insensitive brand comparison.
    pub fn brand_is(&self, brand: &str) -> bool {
        self.brand.eq_ignore_ascii_case(brand.trim())
    }

    pub fn panel_watts(&self) -> Option<u32> {
        match self.specs {
            ItemSpecs::Panel { watts, .. } => Some(watts),
            _ => None,
        }
    }

    pub fn inverter_ac_kw(&self) -> Option<f64> {
        match self.specs {
            ItemSpecs::Inverter { ac_kw, .. } => Some(ac_kw),
            _ => None,
        }
    }

    pub fn inverter_phase(&self) -> Option<Phase> {
        match self.specs {
            ItemSpecs::Inverter { phase, .. } => Some(phase),
            _ => None,
        }
    }

    pub fn battery_usable_kwh(&self) -> Option<f64> {
        match self.specs {
            ItemSpecs::Battery { usable_kwh, .. } => Some(usable_kwh),
            _ => None,
        }
    }

    pub fn battery_round_trip_efficiency(&self) -> Option<f64> {
        match self.specs {
            ItemSpecs::Battery {
                round_trip_efficiency,
                ..
            } => Some(round_trip_efficiency),
            _ => None,
        }
    }

    pub fn battery_coupling(&self) -> Option<Coupling> {
        match self.specs {
            ItemSpecs::Battery { coupling, .. } => Some(coupling),
            _ => None,
        }
    }

    /// Returns `true` if this EV charger is sold for the given vehicle brand.
    pub fn charges_vehicle(&self, vehicle_brand: &str) -> bool {
        match &self.specs {
            ItemSpecs::EvCharger {
                compatible_brands, ..
            } => compatible_brands
                .iter()
                .any(|b| b.eq_ignore_ascii_case(vehicle_brand.trim())),
            _ => false,
        }
    }

    /// Returns `true` if this battery lists the brand as a native hybrid pairing.
    pub fn pairs_with(&self, inverter_brand: &str) -> bool {
        self.hybrid_pair_brands
            .iter()
            .any(|b| b.eq_ignore_ascii_case(inverter_brand))
    }
}
