//! Expansion planning: ties the resolver, allocator and housing planner together

use std::collections::BTreeMap;
use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::allocation::{AllocationEngine, scale_chain};
use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::housing::{HousingPlanner, OptimizationGoal};
use crate::models::{
    AcquisitionSource, Recommendation, RecommendedBuilding, RecommendedPlanet, SimulationState,
};
use crate::production::current_production;
use crate::resolver::{CostResolver, Resolution};
use crate::trace::SimulationLog;

pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plan the expansion needed to produce `target_rate` units/day of `ticker`.
    ///
    /// Only invalid input is an error; missing data shows up in the log and
    /// as unplaced units or housing gaps in the returned plan.
    pub fn run<R: Rng + ?Sized>(
        &self,
        state: &SimulationState,
        ticker: &str,
        target_rate: f64,
        goal: Option<OptimizationGoal>,
        rng: &mut R,
    ) -> Result<Recommendation> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(PlannerError::InvalidTarget("material ticker is empty".to_string()));
        }
        if !target_rate.is_finite() || target_rate < 0.0 {
            return Err(PlannerError::InvalidTarget(format!(
                "target rate must be a non-negative number, got {target_rate}"
            )));
        }
        let goal = goal.unwrap_or_default();

        let mut log = SimulationLog::new();
        log.info(
            0,
            format!("Planning {ticker} at {target_rate:.2} units/day (goal: {goal})."),
        );

        let current_rate = current_production(state, ticker, None, &mut log);
        let gap = target_rate - current_rate;
        log.info(0, format!("Current production: {current_rate:.2} units/day."));
        log.info(0, format!("Production gap: {gap:.2} units/day."));

        let mut rec = Recommendation {
            material_ticker: ticker.to_string(),
            target_rate,
            current_rate,
            production_gap: gap,
            source: None,
            cost_per_unit: None,
            chain_sets: 0,
            recommended_planets: Vec::new(),
            workforce_demand: BTreeMap::new(),
            unplaced: Vec::new(),
            housing_gaps: Vec::new(),
            total_estimated_cost: 0.0,
            log: Vec::new(),
        };

        if gap <= 0.0 {
            log.info(0, "Current production meets the target. No expansion recommended.");
            rec.log = log.into_lines();
            return Ok(rec);
        }

        let preferred = hq_planet(state, &mut log);
        let mut resolver = CostResolver::new(state, &self.config, &mut *rng, &mut log);
        let resolution = resolver.resolve(ticker, 0, preferred, true);
        debug!(material = ticker, depth = resolver.deepest_expansion(), "resolution complete");
        rec.source = Some(resolution.source);
        rec.cost_per_unit = resolution.is_acquirable().then_some(resolution.cost_per_unit);

        match resolution.source {
            AcquisitionSource::Produce => self.plan_production(state, &resolution, goal, rng, &mut log, &mut rec),
            AcquisitionSource::Buy => {
                rec.total_estimated_cost = resolution.cost_per_unit * gap;
                log.info(
                    0,
                    format!(
                        "Strategy: BUY at {:.2}/unit; {gap:.2} units/day cost {:.2}.",
                        resolution.cost_per_unit, rec.total_estimated_cost
                    ),
                );
            }
            AcquisitionSource::Unknown => {
                log.warn(0, format!("Cannot determine how to acquire {ticker}."));
            }
        }

        info!(
            material = ticker,
            source = ?rec.source,
            planets = rec.recommended_planets.len(),
            total_cost = rec.total_estimated_cost,
            "plan complete"
        );
        rec.log = log.into_lines();
        Ok(rec)
    }

    /// [`Planner::run`] with a ChaCha RNG seeded from `seed`.
    pub fn run_seeded(
        &self,
        state: &SimulationState,
        ticker: &str,
        target_rate: f64,
        goal: Option<OptimizationGoal>,
        seed: u64,
    ) -> Result<Recommendation> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.run(state, ticker, target_rate, goal, &mut rng)
    }

    /// Resolve one material as an intermediate, returning the resolution and its log.
    pub fn resolve_cost<R: Rng + ?Sized>(
        &self,
        state: &SimulationState,
        ticker: &str,
        rng: &mut R,
    ) -> (Resolution, Vec<String>) {
        let mut log = SimulationLog::new();
        let resolution = CostResolver::new(state, &self.config, rng, &mut log).resolve(ticker, 0, None, false);
        (resolution, log.into_lines())
    }

    fn plan_production<R: Rng + ?Sized>(
        &self,
        state: &SimulationState,
        resolution: &Resolution,
        goal: OptimizationGoal,
        rng: &mut R,
        log: &mut SimulationLog,
        rec: &mut Recommendation,
    ) {
        let ticker = rec.material_ticker.clone();
        log.info(
            0,
            format!("Strategy: PRODUCE at {:.2}/unit.", resolution.cost_per_unit),
        );

        let throughput = resolution
            .recipe
            .as_deref()
            .and_then(|name| state.recipe(name))
            .map_or(0.0, |r| r.daily_output(&ticker));
        if throughput <= 0.0 {
            log.warn(
                0,
                format!("Per-building throughput for {ticker} is unknown; cannot scale the chain."),
            );
            return;
        }

        let chain_sets = ((rec.production_gap / throughput).ceil() as u32).max(1);
        rec.chain_sets = chain_sets;
        log.info(
            0,
            format!(
                "One building yields {throughput:.2} {ticker}/day; {chain_sets} chain set(s) needed."
            ),
        );

        log.info(0, "--- Placing buildings ---");
        let demands = scale_chain(&resolution.buildings, chain_sets);
        let allocation = AllocationEngine::new(state, &self.config, rng, log).allocate(&demands);

        let mut planets = allocation.planets;
        let housing = HousingPlanner::new(state, &self.config, log).plan(&mut planets, goal);

        log.info(0, "--- Area and permits ---");
        let permit_cost = apply_permits(&self.config, &mut planets, log);

        rec.total_estimated_cost = allocation.total_cost + housing.total_cost + permit_cost;
        rec.workforce_demand = allocation.workforce_demand;
        rec.unplaced = allocation.unplaced;
        rec.housing_gaps = housing.gaps;
        rec.recommended_planets = planets;
        log.info(
            0,
            format!("Total estimated cost: {:.2}.", rec.total_estimated_cost),
        );
    }
}

/// The company HQ planet, when it is part of the catalog.
fn hq_planet<'s>(state: &'s SimulationState, log: &mut SimulationLog) -> Option<&'s str> {
    let id = state.company.hq_planet_id.as_deref()?;
    match state.planet(id) {
        Some(planet) => {
            log.info(0, format!("Company HQ on {} ({id}) is the preferred planet.", planet.name));
            Some(planet.id.as_str())
        }
        None => {
            log.warn(0, format!("HQ planet {id} is not in the planet catalog; ignored."));
            None
        }
    }
}

/// Compute area used and permits for each planet; returns the total permit cost.
pub fn apply_permits(config: &PlannerConfig, planets: &mut [RecommendedPlanet], log: &mut SimulationLog) -> f64 {
    let mut total = 0.0;
    for planet in planets.iter_mut() {
        let area = config.site_base_area_cost + planet.building_area();
        planet.area_used = area;

        if area > config.max_site_area() {
            log.warn(
                1,
                format!(
                    "{} ({}): area {area:.2} exceeds the {:.2} reachable with every permit.",
                    planet.planet_name,
                    planet.planet_id,
                    config.max_site_area()
                ),
            );
        }

        let permits = if area > config.base_max_area_first_permit {
            let needed = ((area - config.base_max_area_first_permit) / config.additional_area_per_permit).ceil();
            (needed as u32).min(config.max_additional_permits)
        } else {
            0
        };
        planet.permits = permits;
        planet.permit_cost = f64::from(permits) * config.permit_cost;
        planet.estimated_cost += planet.permit_cost;
        total += planet.permit_cost;

        log.info(
            1,
            format!(
                "{} ({}): area {area:.2}, {permits} additional permit(s) costing {:.2}.",
                planet.planet_name, planet.planet_id, planet.permit_cost
            ),
        );
    }
    total
}

/// Render a resolved building chain, one line per building.
pub fn format_chain(buildings: &[RecommendedBuilding]) -> String {
    let mut output = String::new();
    for b in buildings {
        output.push_str(&format!(
            "  {}x {} ({}) on {} at {:.2}\n",
            b.amount,
            b.building_name,
            b.building_ticker,
            b.planet_id.as_deref().unwrap_or("-"),
            b.unit_cost
        ));
    }
    output
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Expansion Plan: {} ===", self.material_ticker)?;
        writeln!(f, "Target:  {:.2} units/day", self.target_rate)?;
        writeln!(f, "Current: {:.2} units/day", self.current_rate)?;
        writeln!(f, "Gap:     {:.2} units/day", self.production_gap)?;
        if let Some(source) = self.source {
            match self.cost_per_unit {
                Some(cost) => writeln!(f, "Source:  {source} at {cost:.2}/unit")?,
                None => writeln!(f, "Source:  {source}")?,
            }
        }
        if self.chain_sets > 0 {
            writeln!(f, "Chain sets: {}", self.chain_sets)?;
        }

        for planet in &self.recommended_planets {
            writeln!(f)?;
            writeln!(
                f,
                "{} ({}) - new site {}",
                planet.planet_name, planet.planet_id, planet.site_id
            )?;
            for b in &planet.buildings {
                writeln!(
                    f,
                    "  {}x {} ({}) @ {:.2} = {:.2}",
                    b.amount, b.building_name, b.building_ticker, b.unit_cost, b.estimated_cost
                )?;
            }
            for (workforce, demand) in &planet.workforce_demand {
                writeln!(f, "  workforce {workforce}: {demand:.2}")?;
            }
            writeln!(
                f,
                "  area {:.2}, permits {} ({:.2}), planet total {:.2}",
                planet.area_used, planet.permits, planet.permit_cost, planet.estimated_cost
            )?;
        }

        if !self.unplaced.is_empty() {
            writeln!(f)?;
            writeln!(f, "Not placed:")?;
            for u in &self.unplaced {
                writeln!(f, "  {}x {}", u.units, u.building_ticker)?;
            }
        }
        if !self.housing_gaps.is_empty() {
            writeln!(f)?;
            writeln!(f, "Unhoused workforce:")?;
            for g in &self.housing_gaps {
                writeln!(f, "  {} {:.2} on {}", g.workforce_type, g.demand, g.planet_id)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Total estimated cost: {:.2}", self.total_estimated_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{active_order, ask, building, rat_state};

    fn planner() -> Planner {
        Planner::new(PlannerConfig::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_targets() {
        let state = rat_state();
        let p = planner();
        assert!(matches!(
            p.run_seeded(&state, "  ", 10.0, None, 1),
            Err(PlannerError::InvalidTarget(_))
        ));
        assert!(matches!(
            p.run_seeded(&state, "RAT", -1.0, None, 1),
            Err(PlannerError::InvalidTarget(_))
        ));
        assert!(matches!(
            p.run_seeded(&state, "RAT", f64::NAN, None, 1),
            Err(PlannerError::InvalidTarget(_))
        ));
    }

    #[test]
    fn met_target_gives_empty_plan() {
        let mut state = rat_state();
        // One running food processor makes 96 RAT/day.
        state.company.sites[0].buildings[0].orders = vec![active_order("o-1", 3_600_000)];
        let rec = planner().run_seeded(&state, "RAT", 90.0, None, 1).unwrap();

        assert!((rec.current_rate - 96.0).abs() < 1e-9);
        assert!(rec.production_gap <= 0.0);
        assert!(rec.recommended_planets.is_empty());
        assert_eq!(rec.total_estimated_cost, 0.0);
        assert_eq!(rec.source, None);
        assert!(!rec.log.is_empty());
    }

    #[test]
    fn rat_scenario() {
        let state = rat_state();
        let rec = planner().run_seeded(&state, "RAT", 100.0, None, 42).unwrap();

        assert!((rec.production_gap - 100.0).abs() < 1e-9);
        assert_eq!(rec.source, Some(AcquisitionSource::Produce));
        assert_eq!(rec.chain_sets, 2);
        assert_eq!(rec.recommended_planets.len(), 1);

        let planet = &rec.recommended_planets[0];
        assert!(planet.planet_id == "p-montem" || planet.planet_id == "p-promitor");
        let fp = planet.buildings.iter().find(|b| b.building_ticker == "FP").unwrap();
        assert_eq!(fp.amount, 2);
        let hb1 = planet.buildings.iter().find(|b| b.building_ticker == "HB1").unwrap();
        assert_eq!(hb1.amount, 1);
        assert!((rec.workforce_demand["PIONEER"] - 80.0).abs() < 1e-9);
        assert!((planet.area_used - 135.0).abs() < 1e-9);
        assert_eq!(planet.permits, 0);
        assert!((rec.total_estimated_cost - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn bought_target_costs_price_times_gap() {
        let mut state = rat_state();
        state.market.insert("GRN".into(), ask("GRN", 12.5));
        let rec = planner().run_seeded(&state, "GRN", 10.0, None, 1).unwrap();
        assert_eq!(rec.source, Some(AcquisitionSource::Buy));
        assert!((rec.total_estimated_cost - 125.0).abs() < 1e-9);
        assert!(rec.recommended_planets.is_empty());
    }

    #[test]
    fn unknown_target_costs_nothing() {
        let state = rat_state();
        let rec = planner().run_seeded(&state, "GHOST", 10.0, None, 1).unwrap();
        assert_eq!(rec.source, Some(AcquisitionSource::Unknown));
        assert_eq!(rec.cost_per_unit, None);
        assert_eq!(rec.total_estimated_cost, 0.0);
    }

    #[test]
    fn permits_cover_area_beyond_base() {
        let config = PlannerConfig::default();
        let mut log = SimulationLog::new();
        let fp = |amount| RecommendedBuilding {
            building_ticker: "FP".into(),
            building_name: "FP".into(),
            amount,
            unit_cost: 0.0,
            estimated_cost: 0.0,
            unit_area: 50.0,
            planet_id: None,
            site_id: None,
        };
        let planet = |amount| RecommendedPlanet {
            planet_id: "p".into(),
            planet_name: "P".into(),
            site_id: "NEW_SITE_X".into(),
            fertility: 0.0,
            buildings: vec![fp(amount)],
            workforce_demand: BTreeMap::new(),
            area_used: 0.0,
            permits: 0,
            permit_cost: 0.0,
            estimated_cost: 0.0,
        };
        // 25 + 450 = 475, 25 + 500 = 525, 25 + 750 = 775, 25 + 1000 = 1025.
        let mut planets = vec![planet(9), planet(10), planet(15), planet(20)];
        let total = apply_permits(&config, &mut planets, &mut log);

        let permits: Vec<u32> = planets.iter().map(|p| p.permits).collect();
        assert_eq!(permits, [0, 1, 2, 2]);
        assert!((total - 250_000.0).abs() < 1e-9);
        assert!((planets[3].area_used - 1025.0).abs() < 1e-9);
        assert!(log.lines().iter().any(|l| l.contains("WARNING")));
    }

    #[test]
    fn hq_planet_is_preferred() {
        let mut state = rat_state();
        state.company.hq_planet_id = Some("p-vallis".into());
        let rec = planner().run_seeded(&state, "RAT", 50.0, None, 3).unwrap();
        // Placement still follows suitability, so Vallis gets no site.
        assert_eq!(rec.source, Some(AcquisitionSource::Produce));
        assert!(rec.log.iter().any(|l| l.contains("Company HQ on Vallis")));
        assert!(rec.recommended_planets.iter().all(|p| p.planet_id != "p-vallis"));
    }

    #[test]
    fn oversized_building_is_unplaced_but_plan_succeeds() {
        let mut state = rat_state();
        state.buildings.insert(
            "FP".into(),
            building("FP", 990.0, Some("FOOD_PROCESSING"), &[("BSE", 4.0)], &[("PIONEER", 40.0)]),
        );
        let rec = planner().run_seeded(&state, "RAT", 100.0, None, 5).unwrap();
        assert!(rec.recommended_planets.is_empty());
        assert_eq!(rec.unplaced.len(), 1);
        assert_eq!(rec.unplaced[0].units, 2);
    }

    #[test]
    fn report_mentions_planets_and_total() {
        let state = rat_state();
        let rec = planner().run_seeded(&state, "RAT", 100.0, None, 42).unwrap();
        let text = rec.to_string();
        assert!(text.contains("=== Expansion Plan: RAT ==="));
        assert!(text.contains("NEW_SITE_"));
        assert!(text.contains("Total estimated cost: 1000.00"));
    }
}
