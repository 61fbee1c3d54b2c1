//! TOML-based engine configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::PackageTier;
use crate::intake::{RoofType, UsageLevel};
use crate::tariff::{RegionOverrides, RegionTariffProfile};

/// Top-level engine configuration parsed from TOML.
///
/// All fields have defaults matching the baseline preset. Load from TOML
/// with [`EngineConfig::from_toml_file`] or use [`EngineConfig::baseline`]
/// for the built-in default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Region profile selection and admin overrides.
    #[serde(default)]
    pub region: RegionConfig,
    /// Usage-to-size conversion parameters.
    #[serde(default)]
    pub sizing: SizingConfig,
    /// Installation cost parameters.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Certificate rebate parameters.
    #[serde(default)]
    pub rebates: RebateConfig,
    /// Financial projection parameters.
    #[serde(default)]
    pub roi: RoiConfig,
    /// Per-tier weight vectors and justification thresholds.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Business rules applied during SKU selection.
    #[serde(default)]
    pub policy: SelectionPolicy,
}

/// Region profile selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegionConfig {
    /// Built-in profile name: `"nsw"`, `"qld"` or `"vic"`.
    pub profile: String,
    /// Tariff anchors overriding the profile at load time.
    pub overrides: RegionOverrides,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            profile: "nsw".to_string(),
            overrides: RegionOverrides::default(),
        }
    }
}

/// Size window and usage-derived scaling for one package tier.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierWindow {
    /// Smallest PV system offered (kW).
    pub min_kw: f64,
    /// Largest PV system offered (kW).
    pub max_kw: f64,
    /// Multiplier on the usage-matching PV size.
    pub pv_factor: f64,
    /// Smallest battery offered (kWh).
    pub min_battery_kwh: f64,
    /// Largest battery offered (kWh).
    pub max_battery_kwh: f64,
    /// Share of daily usage the battery should cover.
    pub battery_factor: f64,
}

/// Roof-complexity multipliers by roof type.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoofMultipliers {
    pub tile: f64,
    pub metal: f64,
    pub concrete: f64,
    pub flat: f64,
    pub slate: f64,
}

impl Default for RoofMultipliers {
    fn default() -> Self {
        Self {
            tile: 1.0,
            metal: 0.95,
            concrete: 1.05,
            flat: 1.1,
            slate: 1.3,
        }
    }
}

impl RoofMultipliers {
    pub fn for_roof(&self, roof: RoofType) -> f64 {
        match roof {
            RoofType::Tile => self.tile,
            RoofType::Metal => self.metal,
            RoofType::Concrete => self.concrete,
            RoofType::Flat => self.flat,
            RoofType::Slate => self.slate,
        }
    }
}

/// Usage-level multipliers on the PV size band.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UsageMultipliers {
    pub basic: f64,
    pub moderate: f64,
    pub heavy: f64,
}

impl Default for UsageMultipliers {
    fn default() -> Self {
        Self {
            basic: 0.85,
            moderate: 1.0,
            heavy: 1.25,
        }
    }
}

impl UsageMultipliers {
    pub fn for_level(&self, level: UsageLevel) -> f64 {
        match level {
            UsageLevel::Basic => self.basic,
            UsageLevel::Moderate => self.moderate,
            UsageLevel::Heavy => self.heavy,
        }
    }
}

/// Usage-to-size conversion parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizingConfig {
    pub value: TierWindow,
    pub balanced: TierWindow,
    pub premium: TierWindow,
    pub roof: RoofMultipliers,
    /// Roof-complexity multipliers for 1, 2 and 3 storeys.
    pub storey_multipliers: [f64; 3],
    /// Flat cost added per storey above the first.
    pub storey_adder: f64,
    pub usage: UsageMultipliers,
    /// Daily charging load added for EV households (kWh/day).
    pub ev_daily_kwh: f64,
    /// Battery target multiplier for highly outage-sensitive households.
    pub outage_battery_boost: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            value: TierWindow {
                min_kw: 6.6,
                max_kw: 8.0,
                pv_factor: 1.0,
                min_battery_kwh: 5.0,
                max_battery_kwh: 10.0,
                battery_factor: 0.5,
            },
            balanced: TierWindow {
                min_kw: 6.6,
                max_kw: 10.0,
                pv_factor: 1.3,
                min_battery_kwh: 10.0,
                max_battery_kwh: 16.0,
                battery_factor: 0.8,
            },
            premium: TierWindow {
                min_kw: 8.0,
                max_kw: 13.2,
                pv_factor: 1.6,
                min_battery_kwh: 13.0,
                max_battery_kwh: 25.0,
                battery_factor: 1.0,
            },
            roof: RoofMultipliers::default(),
            storey_multipliers: [1.0, 1.1, 1.25],
            storey_adder: 500.0,
            usage: UsageMultipliers::default(),
            ev_daily_kwh: 7.0,
            outage_battery_boost: 1.2,
        }
    }
}

impl SizingConfig {
    pub fn window(&self, tier: PackageTier) -> &TierWindow {
        match tier {
            PackageTier::Value => &self.value,
            PackageTier::Balanced => &self.balanced,
            PackageTier::Premium => &self.premium,
        }
    }

    /// Storey multiplier for a validated storey count.
    pub fn storey_multiplier(&self, storeys: u8) -> f64 {
        let idx = usize::from(storeys.clamp(1, 3)) - 1;
        self.storey_multipliers[idx]
    }
}

/// Installation cost parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingConfig {
    /// Labour per installed PV kW, before roof complexity.
    pub install_per_kw: f64,
    /// Flat battery installation charge.
    pub battery_install: f64,
    /// Flat EV charger installation charge.
    pub ev_install: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            install_per_kw: 450.0,
            battery_install: 800.0,
            ev_install: 600.0,
        }
    }
}

/// Certificate rebate parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RebateConfig {
    /// Market price per certificate.
    pub certificate_price: f64,
    /// Deeming period in years.
    pub deeming_years: u32,
}

impl Default for RebateConfig {
    fn default() -> Self {
        Self {
            certificate_price: 38.0,
            deeming_years: 5,
        }
    }
}

/// Financial projection parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoiConfig {
    /// Evaluation horizon (years, must be > 0).
    pub horizon_years: u32,
    /// Annual discount rate for NPV.
    pub discount_rate: f64,
    /// Annual PV output degradation (0.0–1.0).
    pub pv_degradation: f64,
    /// Annual battery performance degradation (0.0–1.0).
    pub battery_degradation: f64,
    /// Payback at or beyond this many years scores zero.
    pub payback_ceiling_years: f64,
    /// NPV at or beyond this amount scores one.
    pub npv_ceiling: f64,
    /// Share of the daily supply charge a full-coverage battery avoids.
    pub fixed_charge_offset: f64,
    pub payback_weight: f64,
    pub npv_weight: f64,
    /// Confidence before any explicit-field bonus.
    pub confidence_base: f64,
    /// Confidence gained per explicitly provided intake field.
    pub confidence_step: f64,
    /// Confidence lost per component omitted from a candidate.
    pub omitted_penalty: f64,
    pub confidence_min: f64,
    pub confidence_max: f64,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            horizon_years: 15,
            discount_rate: 0.05,
            pv_degradation: 0.005,
            battery_degradation: 0.02,
            payback_ceiling_years: 20.0,
            npv_ceiling: 20_000.0,
            fixed_charge_offset: 0.25,
            payback_weight: 0.7,
            npv_weight: 0.3,
            confidence_base: 0.5,
            confidence_step: 0.1,
            omitted_penalty: 0.1,
            confidence_min: 0.35,
            confidence_max: 1.0,
        }
    }
}

/// Weight vector over the five sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreWeights {
    pub roi: f64,
    pub performance: f64,
    pub warranty: f64,
    pub brand: f64,
    pub reliability: f64,
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.roi + self.performance + self.warranty + self.brand + self.reliability
    }
}

/// Per-tier weight vectors and justification thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub value: ScoreWeights,
    pub balanced: ScoreWeights,
    pub premium: ScoreWeights,
    /// Warranty length that earns a full warranty sub-score.
    pub warranty_ceiling_years: f64,
    pub brand_match_score: f64,
    pub brand_other_score: f64,
    pub reliable_score: f64,
    pub unreliable_score: f64,
    /// Payback below this earns a "fast payback" bullet.
    pub fast_payback_years: f64,
    /// Inverter warranty at or above this earns a warranty bullet.
    pub warranty_bullet_years: u32,
    /// Rebates covering at least this share of cost earn a rebate bullet.
    pub rebate_share_bullet: f64,
    pub max_bullets: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            value: ScoreWeights {
                roi: 0.45,
                performance: 0.15,
                warranty: 0.15,
                brand: 0.10,
                reliability: 0.15,
            },
            balanced: ScoreWeights {
                roi: 0.30,
                performance: 0.25,
                warranty: 0.20,
                brand: 0.10,
                reliability: 0.15,
            },
            premium: ScoreWeights {
                roi: 0.20,
                performance: 0.35,
                warranty: 0.20,
                brand: 0.10,
                reliability: 0.15,
            },
            warranty_ceiling_years: 25.0,
            brand_match_score: 1.0,
            brand_other_score: 0.5,
            reliable_score: 1.0,
            unreliable_score: 0.7,
            fast_payback_years: 8.0,
            warranty_bullet_years: 10,
            rebate_share_bullet: 0.2,
            max_bullets: 3,
        }
    }
}

impl ScoringConfig {
    pub fn weights(&self, tier: PackageTier) -> &ScoreWeights {
        match tier {
            PackageTier::Value => &self.value,
            PackageTier::Balanced => &self.balanced,
            PackageTier::Premium => &self.premium,
        }
    }
}

/// Business rules applied during SKU selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionPolicy {
    /// Brands never recommended (case-insensitive).
    pub disabled_brands: Vec<String>,
    /// Inverter brand preferred for premium systems whose battery is
    /// AC-coupled. `None` or an empty string disables the rule.
    pub ac_coupled_inverter_brand: Option<String>,
    /// Battery id preferred for the premium tier when sellable. `None` or an
    /// empty string disables the preference.
    pub premium_battery_id: Option<String>,
    /// Charger used when no brand-specific charger matches the vehicle.
    pub universal_charger_id: String,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            disabled_brands: Vec::new(),
            ac_coupled_inverter_brand: Some("Enphase".to_string()),
            premium_battery_id: Some("tesla-powerwall-3".to_string()),
            universal_charger_id: "myenergi-zappi-v2".to_string(),
        }
    }
}

impl SelectionPolicy {
    pub fn is_disabled(&self, brand: &str) -> bool {
        self.disabled_brands
            .iter()
            .any(|d| d.trim().eq_ignore_ascii_case(brand))
    }

    /// Active AC-coupled inverter brand rule, if any.
    pub fn ac_coupled_brand(&self) -> Option<&str> {
        non_empty(self.ac_coupled_inverter_brand.as_deref())
    }

    /// Active premium battery preference, if any.
    pub fn premium_battery(&self) -> Option<&str> {
        non_empty(self.premium_battery_id.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"roi.horizon_years"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

impl EngineConfig {
    /// Returns the baseline configuration.
    pub fn baseline() -> Self {
        Self {
            region: RegionConfig::default(),
            sizing: SizingConfig::default(),
            pricing: PricingConfig::default(),
            rebates: RebateConfig::default(),
            roi: RoiConfig::default(),
            scoring: ScoringConfig::default(),
            policy: SelectionPolicy::default(),
        }
    }

    /// Returns the value-focus preset: ROI-heavy weights, smaller batteries.
    pub fn value_focus() -> Self {
        let base = SizingConfig::default();
        Self {
            sizing: SizingConfig {
                balanced: TierWindow {
                    battery_factor: 0.6,
                    ..base.balanced
                },
                premium: TierWindow {
                    battery_factor: 0.8,
                    ..base.premium
                },
                ..base
            },
            scoring: ScoringConfig {
                value: ScoreWeights {
                    roi: 0.60,
                    performance: 0.10,
                    warranty: 0.10,
                    brand: 0.05,
                    reliability: 0.15,
                },
                balanced: ScoreWeights {
                    roi: 0.45,
                    performance: 0.20,
                    warranty: 0.15,
                    brand: 0.05,
                    reliability: 0.15,
                },
                premium: ScoreWeights {
                    roi: 0.35,
                    performance: 0.30,
                    warranty: 0.15,
                    brand: 0.05,
                    reliability: 0.15,
                },
                ..ScoringConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the backup-focus preset: larger batteries, performance-heavy weights.
    pub fn backup_focus() -> Self {
        let base = SizingConfig::default();
        Self {
            sizing: SizingConfig {
                value: TierWindow {
                    battery_factor: 0.7,
                    ..base.value
                },
                balanced: TierWindow {
                    battery_factor: 1.0,
                    ..base.balanced
                },
                premium: TierWindow {
                    battery_factor: 1.3,
                    ..base.premium
                },
                outage_battery_boost: 1.4,
                ..base
            },
            scoring: ScoringConfig {
                balanced: ScoreWeights {
                    roi: 0.20,
                    performance: 0.35,
                    warranty: 0.20,
                    brand: 0.10,
                    reliability: 0.15,
                },
                premium: ScoreWeights {
                    roi: 0.10,
                    performance: 0.45,
                    warranty: 0.20,
                    brand: 0.10,
                    reliability: 0.15,
                },
                ..ScoringConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "value_focus", "backup_focus"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "value_focus" => Ok(Self::value_focus()),
            "backup_focus" => Ok(Self::backup_focus()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Resolves the configured region profile with overrides applied.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the profile name is unknown.
    pub fn resolve_region(&self) -> Result<RegionTariffProfile, ConfigError> {
        let base = RegionTariffProfile::from_name(&self.region.profile)?;
        Ok(self.region.overrides.apply(&base))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Every check is phrased as the condition that must hold, so a NaN
    /// anywhere fails it. Returns an empty vector if configuration is valid.
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

        match self.resolve_region() {
            Ok(profile) => {
                for e in profile.validate() {
                    check(false, e.field, &e.message);
                }
            }
            Err(e) => check(false, e.field, &e.message),
        }

        for (field, value) in self.numeric_fields() {
            check(value.is_finite(), field, "must be a finite number");
        }

        let s = &self.sizing;
        for tier in PackageTier::ALL {
            let w = s.window(tier);
            check(
                w.min_kw > 0.0 && w.min_kw <= w.max_kw,
                format!("sizing.{tier}.min_kw"),
                "must satisfy 0 < min_kw <= max_kw",
            );
            check(
                w.min_battery_kwh > 0.0 && w.min_battery_kwh <= w.max_battery_kwh,
                format!("sizing.{tier}.min_battery_kwh"),
                "must satisfy 0 < min_battery_kwh <= max_battery_kwh",
            );
            check(
                w.pv_factor > 0.0 && w.battery_factor >= 0.0,
                format!("sizing.{tier}.pv_factor"),
                "pv_factor must be > 0 and battery_factor >= 0",
            );
        }
        let roof = &s.roof;
        check(
            [roof.tile, roof.metal, roof.concrete, roof.flat, roof.slate]
                .iter()
                .all(|m| *m > 0.0),
            "sizing.roof".into(),
            "multipliers must all be > 0",
        );
        check(
            [s.usage.basic, s.usage.moderate, s.usage.heavy]
                .iter()
                .all(|m| *m > 0.0),
            "sizing.usage".into(),
            "multipliers must all be > 0",
        );
        check(
            s.storey_multipliers.iter().all(|m| *m > 0.0),
            "sizing.storey_multipliers".into(),
            "must all be > 0",
        );
        check(s.storey_adder >= 0.0, "sizing.storey_adder".into(), "must be >= 0");
        check(s.ev_daily_kwh >= 0.0, "sizing.ev_daily_kwh".into(), "must be >= 0");
        check(
            s.outage_battery_boost >= 1.0,
            "sizing.outage_battery_boost".into(),
            "must be >= 1.0",
        );

        let p = &self.pricing;
        check(
            p.install_per_kw >= 0.0 && p.battery_install >= 0.0 && p.ev_install >= 0.0,
            "pricing".into(),
            "all charges must be >= 0",
        );

        check(
            self.rebates.certificate_price >= 0.0,
            "rebates.certificate_price".into(),
            "must be >= 0",
        );

        let r = &self.roi;
        check(r.horizon_years > 0, "roi.horizon_years".into(), "must be > 0");
        check(r.discount_rate > -1.0, "roi.discount_rate".into(), "must be > -1.0");
        check(
            (0.0..1.0).contains(&r.pv_degradation),
            "roi.pv_degradation".into(),
            "must be in [0.0, 1.0)",
        );
        check(
            (0.0..1.0).contains(&r.battery_degradation),
            "roi.battery_degradation".into(),
            "must be in [0.0, 1.0)",
        );
        check(
            r.payback_ceiling_years > 0.0,
            "roi.payback_ceiling_years".into(),
            "must be > 0",
        );
        check(r.npv_ceiling > 0.0, "roi.npv_ceiling".into(), "must be > 0");
        check(
            (0.0..=1.0).contains(&r.fixed_charge_offset),
            "roi.fixed_charge_offset".into(),
            "must be in [0.0, 1.0]",
        );
        check(
            r.payback_weight >= 0.0 && r.npv_weight >= 0.0,
            "roi.payback_weight".into(),
            "payback_weight and npv_weight must be >= 0",
        );
        check(
            r.confidence_min <= r.confidence_max,
            "roi.confidence_min".into(),
            "must be <= roi.confidence_max",
        );

        let sc = &self.scoring;
        for tier in PackageTier::ALL {
            let w = sc.weights(tier);
            let parts = [w.roi, w.performance, w.warranty, w.brand, w.reliability];
            check(
                parts.iter().all(|v| *v >= 0.0) && w.sum() > 0.0,
                format!("scoring.{tier}"),
                "weights must be >= 0 with a positive sum",
            );
        }
        check(
            sc.warranty_ceiling_years > 0.0,
            "scoring.warranty_ceiling_years".into(),
            "must be > 0",
        );

        check(
            !self.policy.universal_charger_id.trim().is_empty(),
            "policy.universal_charger_id".into(),
            "must not be empty",
        );

        errors
    }

    /// Every floating-point tunable with its dotted field path.
    fn numeric_fields(&self) -> Vec<(String, f64)> {
        let s = &self.sizing;
        let mut fields = Vec::new();
        for tier in PackageTier::ALL {
            let w = s.window(tier);
            fields.extend([
                (format!("sizing.{tier}.min_kw"), w.min_kw),
                (format!("sizing.{tier}.max_kw"), w.max_kw),
                (format!("sizing.{tier}.pv_factor"), w.pv_factor),
                (format!("sizing.{tier}.min_battery_kwh"), w.min_battery_kwh),
                (format!("sizing.{tier}.max_battery_kwh"), w.max_battery_kwh),
                (format!("sizing.{tier}.battery_factor"), w.battery_factor),
            ]);
        }
        for (i, m) in s.storey_multipliers.iter().enumerate() {
            fields.push((format!("sizing.storey_multipliers.{i}"), *m));
        }

        let r = &self.roi;
        let sc = &self.scoring;
        fields.extend(
            [
                ("sizing.roof.tile", s.roof.tile),
                ("sizing.roof.metal", s.roof.metal),
                ("sizing.roof.concrete", s.roof.concrete),
                ("sizing.roof.flat", s.roof.flat),
                ("sizing.roof.slate", s.roof.slate),
                ("sizing.usage.basic", s.usage.basic),
                ("sizing.usage.moderate", s.usage.moderate),
                ("sizing.usage.heavy", s.usage.heavy),
                ("sizing.storey_adder", s.storey_adder),
                ("sizing.ev_daily_kwh", s.ev_daily_kwh),
                ("sizing.outage_battery_boost", s.outage_battery_boost),
                ("pricing.install_per_kw", self.pricing.install_per_kw),
                ("pricing.battery_install", self.pricing.battery_install),
                ("pricing.ev_install", self.pricing.ev_install),
                ("rebates.certificate_price", self.rebates.certificate_price),
                ("roi.discount_rate", r.discount_rate),
                ("roi.pv_degradation", r.pv_degradation),
                ("roi.battery_degradation", r.battery_degradation),
                ("roi.payback_ceiling_years", r.payback_ceiling_years),
                ("roi.npv_ceiling", r.npv_ceiling),
                ("roi.fixed_charge_offset", r.fixed_charge_offset),
                ("roi.payback_weight", r.payback_weight),
                ("roi.npv_weight", r.npv_weight),
                ("roi.confidence_base", r.confidence_base),
                ("roi.confidence_step", r.confidence_step),
                ("roi.omitted_penalty", r.omitted_penalty),
                ("roi.confidence_min", r.confidence_min),
                ("roi.confidence_max", r.confidence_max),
                ("scoring.warranty_ceiling_years", sc.warranty_ceiling_years),
                ("scoring.brand_match_score", sc.brand_match_score),
                ("scoring.brand_other_score", sc.brand_other_score),
                ("scoring.reliable_score", sc.reliable_score),
                ("scoring.unreliable_score", sc.unreliable_score),
                ("scoring.fast_payback_years", sc.fast_payback_years),
                ("scoring.rebate_share_bullet", sc.rebate_share_bullet),
            ]
            .map(|(field, value)| (field.to_string(), value)),
        );
        for tier in PackageTier::ALL {
            let w = sc.weights(tier);
            fields.extend([
                (format!("scoring.{tier}.roi"), w.roi),
                (format!("scoring.{tier}.performance"), w.performance),
                (format!("scoring.{tier}.warranty"), w.warranty),
                (format!("scoring.{tier}.brand"), w.brand),
                (format!("scoring.{tier}.reliability"), w.reliability),
            ]);
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = EngineConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = EngineConfig::from_preset("nonexistent").err();
        assert!(err.is_some_and(|e| e.message.contains("unknown preset")));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in EngineConfig::PRESETS {
            let cfg = EngineConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn value_focus_weights_roi_more() {
        let base = EngineConfig::baseline();
        let value = EngineConfig::value_focus();
        for tier in PackageTier::ALL {
            assert!(value.scoring.weights(tier).roi > base.scoring.weights(tier).roi);
        }
    }

    #[test]
    fn backup_focus_has_larger_batteries() {
        let base = EngineConfig::baseline();
        let backup = EngineConfig::backup_focus();
        assert!(backup.sizing.premium.battery_factor > base.sizing.premium.battery_factor);
        assert!(backup.sizing.outage_battery_boost > base.sizing.outage_battery_boost);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[region]
profile = "vic"

[region.overrides]
flat_rate_per_kwh = 0.35

[roi]
horizon_years = 20
"#;
        let cfg = EngineConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "partial TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.roi.horizon_years), Some(20));
        assert_eq!(cfg.as_ref().map(|c| c.roi.discount_rate), Some(0.05));
        let region = cfg.as_ref().and_then(|c| c.resolve_region().ok());
        assert_eq!(region.as_ref().map(|r| r.name.as_str()), Some("vic"));
        assert_eq!(region.as_ref().map(|r| r.flat_rate_per_kwh), Some(0.35));
    }

    #[test]
    fn tier_windows_parse_from_toml() {
        let toml = r#"
[sizing.value]
min_kw = 5.0
max_kw = 7.0
pv_factor = 1.0
min_battery_kwh = 5.0
max_battery_kwh = 8.0
battery_factor = 0.4
"#;
        let cfg = EngineConfig::from_toml_str(toml);
        assert_eq!(cfg.ok().map(|c| c.sizing.value.max_kw), Some(7.0));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[pricing]
install_per_kw = 400.0
scaffolding = 900.0
"#;
        assert!(EngineConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_inverted_window() {
        let mut cfg = EngineConfig::baseline();
        cfg.sizing.balanced.min_kw = 12.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "sizing.balanced.min_kw"));
    }

    #[test]
    fn validation_catches_zero_horizon() {
        let mut cfg = EngineConfig::baseline();
        cfg.roi.horizon_years = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "roi.horizon_years"));
    }

    #[test]
    fn validation_catches_unknown_region() {
        let mut cfg = EngineConfig::baseline();
        cfg.region.profile = "atlantis".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "region.profile"));
    }

    #[test]
    fn validation_catches_zero_weights() {
        let mut cfg = EngineConfig::baseline();
        cfg.scoring.premium = ScoreWeights {
            roi: 0.0,
            performance: 0.0,
            warranty: 0.0,
            brand: 0.0,
            reliability: 0.0,
        };
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "scoring.premium"));
    }

    #[test]
    fn validation_catches_nan_overrides() {
        let cases = [
            ("[roi]\nconfidence_min = nan\n", "roi.confidence_min"),
            ("[roi]\ndiscount_rate = nan\n", "roi.discount_rate"),
            (
                "[sizing.balanced]\nmin_kw = nan\nmax_kw = 10.0\npv_factor = 1.0\n\
                 min_battery_kwh = 5.0\nmax_battery_kwh = 13.5\nbattery_factor = 0.5\n",
                "sizing.balanced.min_kw",
            ),
            ("[sizing]\nstorey_multipliers = [1.0, nan, 1.2]\n", "sizing.storey_multipliers"),
            (
                "[scoring.value]\nroi = nan\nperformance = 0.2\nwarranty = 0.1\n\
                 brand = 0.1\nreliability = 0.1\n",
                "scoring.value",
            ),
        ];
        for (toml, field) in cases {
            let cfg = EngineConfig::from_toml_str(toml);
            let Ok(cfg) = cfg else {
                panic!("{toml:?} should parse");
            };
            let errors = cfg.validate();
            assert!(
                errors.iter().any(|e| e.field.starts_with(field)),
                "{toml:?} should be rejected at {field}: {errors:?}"
            );
        }
    }

    #[test]
    fn validation_catches_infinite_values() {
        let mut cfg = EngineConfig::baseline();
        cfg.pricing.install_per_kw = f64::INFINITY;
        cfg.roi.confidence_max = f64::INFINITY;
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.iter().any(|f| f == "pricing.install_per_kw"));
        assert!(fields.iter().any(|f| f == "roi.confidence_max"));
    }

    #[test]
    fn policy_disables_brands_case_insensitively() {
        let policy = SelectionPolicy {
            disabled_brands: vec!["goodwe".to_string()],
            ..SelectionPolicy::default()
        };
        assert!(policy.is_disabled("GoodWe"));
        assert!(!policy.is_disabled("Sungrow"));
    }

    #[test]
    fn empty_policy_strings_disable_rules() {
        let cfg = EngineConfig::from_toml_str(
            "[policy]\nac_coupled_inverter_brand = \"\"\npremium_battery_id = \" \"\n",
        );
        let Ok(cfg) = cfg else {
            panic!("policy TOML should parse");
        };
        assert_eq!(cfg.policy.ac_coupled_brand(), None);
        assert_eq!(cfg.policy.premium_battery(), None);
        assert_eq!(SelectionPolicy::default().ac_coupled_brand(), Some("Enphase"));
    }
}
