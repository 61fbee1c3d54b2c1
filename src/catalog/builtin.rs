//! Seed catalog shipped with the binary.

use super::types::{CatalogItem, Chemistry, Coupling, ItemSpecs, Phase, ShadeGrade, Tier};

pub(super) const VERSION: &str = "2025.1";

fn item(
    id: &str,
    brand: &str,
    model: &str,
    tier: Tier,
    specs: ItemSpecs,
    warranty_years: u32,
    unit_price: f64,
) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        brand: brand.to_string(),
        model: model.to_string(),
        tier,
        specs,
        warranty_years,
        unit_price,
        do_not_sell: false,
        reliable: true,
        hybrid_pair_brands: Vec::new(),
    }
}

fn panel(watts: u32, efficiency_pct: f64) -> ItemSpecs {
    ItemSpecs::Panel {
        watts,
        efficiency_pct,
    }
}

fn inverter(ac_kw: f64, phase: Phase, shade_handling: ShadeGrade) -> ItemSpecs {
    ItemSpecs::Inverter {
        ac_kw,
        phase,
        shade_handling,
    }
}

fn battery(usable_kwh: f64, round_trip_efficiency: f64, coupling: Coupling) -> ItemSpecs {
    ItemSpecs::Battery {
        usable_kwh,
        depth_of_discharge: 0.95,
        chemistry: Chemistry::Lfp,
        round_trip_efficiency,
        coupling,
    }
}

fn charger(power_kw: f64, brands: &[&str]) -> ItemSpecs {
    ItemSpecs::EvCharger {
        power_kw,
        compatible_brands: brands.iter().map(|b| b.to_string()).collect(),
    }
}

fn pairs(mut item: CatalogItem, brands: &[&str]) -> CatalogItem {
    item.hybrid_pair_brands = brands.iter().map(|b| b.to_string()).collect();
    item
}

fn unreliable(mut item: CatalogItem) -> CatalogItem {
    item.reliable = false;
    item
}

fn withdrawn(mut item: CatalogItem) -> CatalogItem {
    item.do_not_sell = true;
    item
}

pub(super) fn items() -> Vec<CatalogItem> {
    use Phase::{Single, Three};
    use ShadeGrade::{Basic, Excellent, Good};
    use Tier::{Entry, Mid, Premium};

    vec![
        // Panels
        item("jinko-tiger-neo-440", "Jinko", "Tiger Neo 440", Entry, panel(440, 22.0), 15, 165.0),
        item("trina-vertex-s-445", "Trina", "Vertex S+ 445", Mid, panel(445, 22.3), 25, 190.0),
        item("rec-alpha-pure-430", "REC", "Alpha Pure-R 430", Premium, panel(430, 22.3), 25, 320.0),
        // Inverters
        unreliable(item("goodwe-gw5000-ds", "GoodWe", "GW5000-DS", Entry, inverter(5.0, Single, Basic), 10, 1100.0)),
        item("sungrow-sg5-0rs", "Sungrow", "SG5.0RS", Entry, inverter(5.0, Single, Basic), 10, 1250.0),
        withdrawn(item("growatt-min-5000tl", "Growatt", "MIN 5000TL-X", Entry, inverter(5.0, Single, Basic), 10, 900.0)),
        item("goodwe-gw8k-dt", "GoodWe", "GW8K-DT", Entry, inverter(8.0, Three, Basic), 10, 1700.0),
        item("sungrow-sh5-0rs", "Sungrow", "SH5.0RS Hybrid", Mid, inverter(5.0, Single, Good), 10, 2300.0),
        item("fronius-gen24-6-0", "Fronius", "Primo GEN24 6.0", Mid, inverter(6.0, Single, Good), 10, 2900.0),
        item("sungrow-sh10rt", "Sungrow", "SH10RT", Mid, inverter(10.0, Three, Good), 10, 3600.0),
        item("fronius-gen24-plus-6-0", "Fronius", "Primo GEN24 Plus 6.0", Premium, inverter(6.0, Single, Good), 10, 3400.0),
        item("enphase-iq8-8-0", "Enphase", "IQ8 Microinverter System 8.0", Premium, inverter(8.0, Single, Excellent), 25, 5200.0),
        item("solaredge-se10k", "SolarEdge", "SE10K", Premium, inverter(10.0, Three, Excellent), 12, 4600.0),
        // Batteries
        pairs(item("goodwe-lynx-9-6", "GoodWe", "Lynx Home F 9.6", Entry, battery(9.6, 0.90, Coupling::Dc), 10, 6200.0), &["GoodWe"]),
        pairs(item("sungrow-sbr096", "Sungrow", "SBR096", Entry, battery(9.6, 0.92, Coupling::Dc), 10, 6600.0), &["Sungrow"]),
        pairs(item("sungrow-sbr128", "Sungrow", "SBR128", Mid, battery(12.8, 0.92, Coupling::Dc), 10, 8400.0), &["Sungrow"]),
        pairs(item("byd-hvm-13-8", "BYD", "Battery-Box Premium HVM 13.8", Mid, battery(13.8, 0.95, Coupling::Dc), 10, 9100.0), &["Fronius", "Sungrow"]),
        item("tesla-powerwall-3", "Tesla", "Powerwall 3", Premium, battery(13.5, 0.90, Coupling::Ac), 10, 13500.0),
        item("enphase-iq-10t", "Enphase", "IQ Battery 10T", Premium, battery(10.5, 0.89, Coupling::Ac), 15, 11800.0),
        pairs(item("byd-hvm-22-1", "BYD", "Battery-Box Premium HVM 22.1", Premium, battery(22.1, 0.95, Coupling::Dc), 10, 15900.0), &["Fronius"]),
        // EV chargers
        item("tesla-wall-connector", "Tesla", "Wall Connector Gen 3", Mid, charger(7.4, &["Tesla"]), 4, 850.0),
        item("byd-eva-7kw", "BYD", "EVA 7kW", Mid, charger(7.0, &["BYD"]), 3, 990.0),
        item("myenergi-zappi-v2", "myenergi", "zappi v2.1", Premium, charger(7.0, &[]), 3, 1650.0),
    ]
}
