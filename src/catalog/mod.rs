//! Product catalog: purchasable panels, inverters, batteries and EV chargers.
//!
//! The catalog is immutable reference data. Load it once with
//! [`Catalog::builtin`] or [`Catalog::from_toml_file`] and pass it by
//! reference into the engine.

mod builtin;
mod types;

pub use types::{
    CatalogItem, Category, Chemistry, Coupling, ItemSpecs, PackageTier, Phase, ShadeGrade, Tier,
};

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Versioned set of catalog items in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    /// Version label carried into every recommendation.
    pub version: String,
    items: Vec<CatalogItem>,
}

/// On-disk catalog layout.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    version: String,
    #[serde(default)]
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(version: impl Into<String>, items: Vec<CatalogItem>) -> Self {
        Self {
            version: version.into(),
            items,
        }
    }

    /// Returns the built-in seed catalog.
    pub fn builtin() -> Self {
        Self::new(builtin::VERSION, builtin::items())
    }

    /// Parses a catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "catalog".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a catalog from a TOML string (`version` plus `[[items]]`).
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = toml::from_str(s).map_err(|e| ConfigError {
            field: "catalog".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(file.version, file.items))
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up an item by id.
    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Sellable items of one category and tier, in insertion order.
    pub fn sellable(&self, category: Category, tier: Tier) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter().filter(move |item| {
            item.category() == category && item.tier == tier && item.is_sellable()
        })
    }

    /// Sellable items of one category across all tiers.
    pub fn sellable_in(&self, category: Category) -> impl Iterator<Item = &CatalogItem> {
        self.items
            .iter()
            .filter(move |item| item.category() == category && item.is_sellable())
    }

    /// Distinct sellable inverter brands for a tier and phase, skipping
    /// disabled brands. Brands differing only in case collapse to the first
    /// spelling listed. Sorted by lowercase name for deterministic iteration.
    pub fn inverter_brands(&self, tier: Tier, phase: Phase, disabled: &[String]) -> Vec<String> {
        let mut brands: BTreeMap<String, String> = BTreeMap::new();
        for item in self
            .sellable(Category::Inverter, tier)
            .filter(|item| item.inverter_phase() == Some(phase))
            .filter(|item| !disabled.iter().any(|d| item.brand_is(d)))
        {
            brands
                .entry(item.brand.trim().to_ascii_lowercase())
                .or_insert_with(|| item.brand.clone());
        }
        brands.into_values().collect()
    }

    /// Validates ids, prices and specs, returning every problem found.
    ///
    /// Numeric checks accept only finite values in range, so NaN never
    /// passes. Returns an empty vector if the catalog is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |ok: bool, field: String, message: &str| {
            if !ok {
                errors.push(ConfigError {
                    field,
                    message: message.to_string(),
                });
            }
        };
        let mut seen = BTreeSet::new();

        check(
            !self.version.trim().is_empty(),
            "catalog.version".into(),
            "must not be empty",
        );

        for item in &self.items {
            let path = format!("catalog.items.{}", item.id);
            check(
                !item.id.trim().is_empty(),
                "catalog.items.id".into(),
                "must not be empty",
            );
            check(seen.insert(item.id.as_str()), path.clone(), "duplicate id");
            check(
                item.unit_price.is_finite() && item.unit_price >= 0.0,
                format!("{path}.unit_price"),
                "must be >= 0",
            );
            match &item.specs {
                ItemSpecs::Panel {
                    watts,
                    efficiency_pct,
                } => {
                    check(*watts > 0, format!("{path}.watts"), "must be > 0");
                    check(
                        (0.0..=100.0).contains(efficiency_pct),
                        format!("{path}.efficiency_pct"),
                        "must be in [0, 100]",
                    );
                }
                ItemSpecs::Inverter { ac_kw, .. } => {
                    check(
                        ac_kw.is_finite() && *ac_kw > 0.0,
                        format!("{path}.ac_kw"),
                        "must be > 0",
                    );
                }
                ItemSpecs::Battery {
                    usable_kwh,
                    depth_of_discharge,
                    round_trip_efficiency,
                    ..
                } => {
                    check(
                        usable_kwh.is_finite() && *usable_kwh > 0.0,
                        format!("{path}.usable_kwh"),
                        "must be > 0",
                    );
                    check(
                        (0.0..=1.0).contains(depth_of_discharge),
                        format!("{path}.depth_of_discharge"),
                        "must be in [0.0, 1.0]",
                    );
                    check(
                        *round_trip_efficiency > 0.0 && *round_trip_efficiency <= 1.0,
                        format!("{path}.round_trip_efficiency"),
                        "must be in (0.0, 1.0]",
                    );
                }
                ItemSpecs::EvCharger { power_kw, .. } => {
                    check(
                        power_kw.is_finite() && *power_kw > 0.0,
                        format!("{path}.power_kw"),
                        "must be > 0",
                    );
                }
            }
        }

        errors
    }
}
