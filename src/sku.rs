//! SKU selector: picks concrete catalog items for a tier, phase and size.
//!
//! Selection is a pure function of the catalog, the policy and the request.
//! Every choice ends in an explicit tie-break (price, then catalog insertion
//! order), so the same inputs always yield the same item.

use std::cmp::Ordering;

use tracing::debug;

use crate::catalog::{Catalog, CatalogItem, Category, Coupling, Phase, Tier};
use crate::config::SelectionPolicy;
use crate::error::EngineError;

/// Constraints for one inverter selection.
#[derive(Debug, Clone, Copy)]
pub struct InverterRequest<'a> {
    pub tier: Tier,
    pub phase: Phase,
    /// PV size the inverter should cover (kW).
    pub target_kw: f64,
    /// Customer's preferred brand, if any.
    pub preferred_brand: Option<&'a str>,
    /// Battery already chosen for the system.
    pub battery: Option<&'a CatalogItem>,
    /// Restricts the pool to one brand (used to build brand alternates).
    pub only_brand: Option<&'a str>,
}

/// Chooses catalog items under a selection policy.
#[derive(Debug, Clone, Copy)]
pub struct SkuSelector<'a> {
    catalog: &'a Catalog,
    policy: &'a SelectionPolicy,
}

type Indexed<'a> = (usize, &'a CatalogItem);

fn by_price_then_index(a: &Indexed<'_>, b: &Indexed<'_>) -> Ordering {
    a.1.unit_price
        .total_cmp(&b.1.unit_price)
        .then(a.0.cmp(&b.0))
}

/// Keeps the subset matching `pred` unless that would empty the pool.
fn prefer<'a>(pool: Vec<Indexed<'a>>, pred: impl Fn(&CatalogItem) -> bool) -> Vec<Indexed<'a>> {
    let narrowed: Vec<_> = pool.iter().copied().filter(|(_, item)| pred(item)).collect();
    if narrowed.is_empty() { pool } else { narrowed }
}

impl<'a> SkuSelector<'a> {
    pub fn new(catalog: &'a Catalog, policy: &'a SelectionPolicy) -> Self {
        Self { catalog, policy }
    }

    fn pool(&self, category: Category, tier: Tier) -> Vec<Indexed<'a>> {
        self.catalog
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                item.category() == category
                    && item.tier == tier
                    && item.is_sellable()
                    && !self.policy.is_disabled(&item.brand)
            })
            .collect()
    }

    /// First sellable panel of the tier in catalog order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyCatalogTier`] if the tier has no panel.
    pub fn select_panel(&self, tier: Tier) -> Result<&'a CatalogItem, EngineError> {
        self.pool(Category::Panel, tier)
            .first()
            .map(|(_, item)| *item)
            .ok_or(EngineError::EmptyCatalogTier {
                category: Category::Panel,
                tier,
            })
    }

    /// Battery closest in capacity to `target_kwh`.
    ///
    /// For the premium tier the policy's preferred battery wins when it is
    /// sellable. Ties on capacity distance go to the cheaper item, then the
    /// earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyCatalogTier`] if the tier has no battery.
    pub fn select_battery(&self, tier: Tier, target_kwh: f64) -> Result<&'a CatalogItem, EngineError> {
        let pool = self.pool(Category::Battery, tier);

        if tier == Tier::Premium {
            if let Some(id) = self.policy.premium_battery() {
                if let Some((_, item)) = pool.iter().find(|(_, item)| item.id == id) {
                    debug!("premium battery preference applied: {id}");
                    return Ok(*item);
                }
            }
        }

        pool.into_iter()
            .min_by(|a, b| {
                let da = (a.1.battery_usable_kwh().unwrap_or(0.0) - target_kwh).abs();
                let db = (b.1.battery_usable_kwh().unwrap_or(0.0) - target_kwh).abs();
                da.total_cmp(&db).then_with(|| by_price_then_index(a, b))
            })
            .map(|(_, item)| item)
            .ok_or(EngineError::EmptyCatalogTier {
                category: Category::Battery,
                tier,
            })
    }

    /// Smallest inverter whose AC rating covers the target.
    ///
    /// Among qualifying inverters the pool is narrowed, in order, by the
    /// AC-coupled brand policy (premium tier with an AC-coupled battery), the
    /// customer's brand preference and the battery's hybrid pairing hints;
    /// each step is skipped if it would leave nothing. If no inverter covers
    /// the target the largest one of the tier and phase is returned.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyCatalogTier`] if no sellable inverter
    /// exists for the tier, phase and brand restriction.
    pub fn select_inverter(&self, req: &InverterRequest<'_>) -> Result<&'a CatalogItem, EngineError> {
        let pool: Vec<Indexed<'a>> = self
            .pool(Category::Inverter, req.tier)
            .into_iter()
            .filter(|(_, item)| item.inverter_phase() == Some(req.phase))
            .filter(|(_, item)| req.only_brand.is_none_or(|b| item.brand_is(b)))
            .collect();

        let ac = |entry: &Indexed<'_>| entry.1.inverter_ac_kw().unwrap_or(0.0);
        let qualifying: Vec<Indexed<'a>> = pool
            .iter()
            .copied()
            .filter(|entry| ac(entry) >= req.target_kw)
            .collect();

        if qualifying.is_empty() {
            return pool
                .into_iter()
                .max_by(|a, b| {
                    ac(a)
                        .total_cmp(&ac(b))
                        .then_with(|| by_price_then_index(b, a))
                })
                .map(|(_, item)| {
                    debug!(
                        "no {} inverter covers {:.1} kW, using largest: {}",
                        req.tier, req.target_kw, item.id
                    );
                    item
                })
                .ok_or(EngineError::EmptyCatalogTier {
                    category: Category::Inverter,
                    tier: req.tier,
                });
        }

        let mut preferred = qualifying;
        let ac_coupled = req.battery.and_then(CatalogItem::battery_coupling) == Some(Coupling::Ac);
        if req.tier == Tier::Premium && ac_coupled {
            if let Some(brand) = self.policy.ac_coupled_brand() {
                preferred = prefer(preferred, |item| item.brand_is(brand));
            }
        }
        if let Some(brand) = req.preferred_brand {
            preferred = prefer(preferred, |item| item.brand_is(brand));
        }
        if let Some(battery) = req.battery.filter(|_| !ac_coupled) {
            preferred = prefer(preferred, |item| battery.pairs_with(&item.brand));
        }

        preferred
            .into_iter()
            .min_by(|a, b| ac(a).total_cmp(&ac(b)).then_with(|| by_price_then_index(a, b)))
            .map(|(_, item)| item)
            .ok_or(EngineError::EmptyCatalogTier {
                category: Category::Inverter,
                tier: req.tier,
            })
    }

    /// Charger sold for the customer's vehicle brand, else the policy's
    /// universal charger.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyCatalogTier`] if neither is available.
    pub fn select_ev_charger(&self, vehicle_brand: Option<&str>, tier: Tier) -> Result<&'a CatalogItem, EngineError> {
        let usable = |item: &&CatalogItem| item.is_sellable() && !self.policy.is_disabled(&item.brand);

        let matched = vehicle_brand.and_then(|brand| {
            self.catalog
                .sellable_in(Category::EvCharger)
                .filter(usable)
                .find(|item| item.charges_vehicle(brand))
        });

        matched
            .or_else(|| {
                self.catalog
                    .get(&self.policy.universal_charger_id)
                    .filter(|item| item.category() == Category::EvCharger)
                    .filter(usable)
            })
            .ok_or(EngineError::EmptyCatalogTier {
                category: Category::EvCharger,
                tier,
            })
    }
}
