//! Human-readable recommendation report.

use std::fmt;

use crate::engine::Recommendation;
use crate::scoring::ShortlistEntry;

fn component(item: Option<&crate::catalog::CatalogItem>) -> String {
    item.map(|i| format!("{} {}", i.brand, i.model))
        .unwrap_or_else(|| "none".to_string())
}

impl fmt::Display for ShortlistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scored = &self.candidate;
        let c = &scored.candidate;
        let roi = &scored.roi;

        writeln!(f, "#{} {} ({}, {} tier)", self.rank, c.id, self.motivation, c.tier)?;
        let panel = match &c.panel {
            Some(p) => format!("{} x {} {}", c.panel_count, p.brand, p.model),
            None => "none".to_string(),
        };
        writeln!(f, "  System:       {:.2} kW, panels {panel}", c.system_kw)?;
        writeln!(f, "  Inverter:     {}", component(c.inverter.as_ref()))?;
        match c.battery_kwh {
            Some(kwh) => writeln!(f, "  Battery:      {} ({kwh:.1} kWh)", component(c.battery.as_ref()))?,
            None => writeln!(f, "  Battery:      none")?,
        }
        if c.ev_charger.is_some() {
            writeln!(f, "  EV charger:   {}", component(c.ev_charger.as_ref()))?;
        }
        if !c.omitted.is_empty() {
            let names: Vec<String> = c.omitted.iter().map(ToString::to_string).collect();
            writeln!(f, "  Unavailable:  {}", names.join(", "))?;
        }
        writeln!(
            f,
            "  Cost:         ${:.0} before rebates, ${:.0} after (${:.0} rebates)",
            c.cost.total, roi.upfront_cost, scored.rebate.total
        )?;
        writeln!(
            f,
            "  Savings:      ${:.0}/yr, payback {:.1} y, NPV ${:.0}",
            roi.annual_savings, roi.payback_years, roi.npv
        )?;
        writeln!(
            f,
            "  Energy:       {:.1} kWh/day generated, {:.1} exported ({:.0}% self-consumed)",
            scored.flow.generation_kwh,
            scored.flow.export_kwh,
            scored.flow.self_consumption_share * 100.0
        )?;
        write!(
            f,
            "  Score:        {:.3} (confidence {:.2})",
            scored.total_score, scored.confidence
        )?;
        for bullet in &scored.justifications {
            write!(f, "\n    - {bullet}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.sizing;
        writeln!(f, "--- Recommendation ---")?;
        writeln!(f, "Region:        {} (catalog {})", self.region, self.catalog_version)?;
        writeln!(
            f,
            "Usage:         {:.0} kWh/yr, {:.1} kWh/day at {:.1} c/kWh",
            s.annual_usage_kwh,
            s.daily_usage_kwh(),
            s.tariff_cents_per_kwh
        )?;
        if !s.usage_within_band {
            writeln!(
                f,
                "               outside the typical {:.0}-{:.0} kWh/day range for this property",
                s.usage_band.low_kwh, s.usage_band.high_kwh
            )?;
        }
        write!(f, "Candidates:    {} evaluated", self.candidates.len())?;
        if self.shortlist.is_empty() {
            return write!(f, "\nNo candidates could be shortlisted.");
        }
        for entry in &self.shortlist {
            write!(f, "\n\n{entry}")?;
        }
        Ok(())
    }
}
