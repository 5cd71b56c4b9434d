//! Placement of chain buildings onto recommended planets under the site area budget

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Builder;

use crate::category::{Category, category_of_building};
use crate::config::PlannerConfig;
use crate::models::{
    Building, Planet, RecommendedBuilding, RecommendedPlanet, SimulationState, UnplacedBuilding,
};
use crate::planet::is_suitable;
use crate::trace::SimulationLog;

/// One building type and the number of units a run needs of it.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingDemand {
    pub building_ticker: String,
    pub units: u32,
    /// Construction cost of one unit.
    pub unit_cost: f64,
}

/// Result of placing every demanded unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocation {
    /// In order of first use.
    pub planets: Vec<RecommendedPlanet>,
    pub workforce_demand: BTreeMap<String, f64>,
    pub unplaced: Vec<UnplacedBuilding>,
    pub total_cost: f64,
}

/// Merge repeated tickers of a resolved chain and scale by `chain_sets`.
///
/// Keeps the order in which each ticker first appears.
pub fn scale_chain(chain: &[RecommendedBuilding], chain_sets: u32) -> Vec<BuildingDemand> {
    let mut demands: Vec<BuildingDemand> = Vec::new();
    for b in chain {
        let units = b.amount.saturating_mul(chain_sets);
        match demands.iter_mut().find(|d| d.building_ticker == b.building_ticker) {
            Some(d) => d.units = d.units.saturating_add(units),
            None => demands.push(BuildingDemand {
                building_ticker: b.building_ticker.clone(),
                units,
                unit_cost: b.unit_cost,
            }),
        }
    }
    demands
}

/// Synthetic id for a site that does not exist yet, e.g. `NEW_SITE_1A2B3C4D`.
pub fn new_site_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    let uuid = Builder::from_random_bytes(bytes).into_uuid();
    let hex = uuid.simple().to_string().to_uppercase();
    format!("NEW_SITE_{}", &hex[..8])
}

pub struct AllocationEngine<'a, R: Rng + ?Sized> {
    state: &'a SimulationState,
    config: &'a PlannerConfig,
    rng: &'a mut R,
    log: &'a mut SimulationLog,
    result: Allocation,
}

impl<'a, R: Rng + ?Sized> AllocationEngine<'a, R> {
    pub fn new(
        state: &'a SimulationState,
        config: &'a PlannerConfig,
        rng: &'a mut R,
        log: &'a mut SimulationLog,
    ) -> Self {
        Self {
            state,
            config,
            rng,
            log,
            result: Allocation::default(),
        }
    }

    /// Place every demand, one batch at a time, and return the planets used.
    pub fn allocate(mut self, demands: &[BuildingDemand]) -> Allocation {
        for demand in demands {
            self.place(demand);
        }
        self.result
    }

    fn place(&mut self, demand: &BuildingDemand) {
        let state = self.state;
        let Some(building) = state.buildings.get(&demand.building_ticker) else {
            self.log.warn(
                1,
                format!(
                    "Building definition for {} not found; {} units not placed.",
                    demand.building_ticker, demand.units
                ),
            );
            self.record_unplaced(&demand.building_ticker, demand.units);
            return;
        };
        let category = category_of_building(state, &building.ticker);

        let mut remaining = demand.units;
        while remaining > 0 {
            let slot = self
                .existing_planet_with_category(building, category.as_ref())
                .or_else(|| self.new_planet(building, category.as_ref()));
            let Some(index) = slot else {
                self.log.warn(
                    1,
                    format!(
                        "No suitable planet has space for the remaining {remaining} units of {}; skipped.",
                        building.name
                    ),
                );
                self.record_unplaced(&building.ticker, remaining);
                return;
            };

            let fits = self.units_that_fit(&self.result.planets[index], building);
            let units = remaining.min(fits);
            self.add_units(index, building, demand.unit_cost, units);
            remaining -= units;
            self.log.info(
                1,
                format!(
                    "Placed {units} units of {} on {}. Remaining to place: {remaining}.",
                    building.name, self.result.planets[index].planet_name
                ),
            );
        }
    }

    /// Units of `building` that still fit in the buildable area of `planet`.
    fn units_that_fit(&self, planet: &RecommendedPlanet, building: &Building) -> u32 {
        if building.area <= 0.0 {
            return u32::MAX;
        }
        let spare = self.config.buildable_area() - planet.building_area();
        if spare < building.area {
            return 0;
        }
        (spare / building.area).floor().min(f64::from(u32::MAX)) as u32
    }

    fn existing_planet_with_category(
        &mut self,
        building: &Building,
        category: Option<&Category>,
    ) -> Option<usize> {
        let category = category?;
        let state = self.state;
        let index = self.result.planets.iter().position(|p| {
            p.buildings
                .iter()
                .any(|b| category_of_building(state, &b.building_ticker).as_ref() == Some(category))
                && self.units_that_fit(p, building) > 0
        })?;
        let planet = &self.result.planets[index];
        self.log.info(
            1,
            format!(
                "Reusing recommended planet {} ({}) for {}: shares {category} expertise and has space.",
                planet.planet_name, planet.planet_id, building.name
            ),
        );
        Some(index)
    }

    fn new_planet(&mut self, building: &Building, category: Option<&Category>) -> Option<usize> {
        let state = self.state;
        let mut candidates: Vec<&Planet> = state.planets.iter().collect();
        candidates.shuffle(&mut *self.rng);

        for planet in candidates {
            if !is_suitable(state, planet, category, Some(building.ticker.as_str())) {
                continue;
            }
            match self.result.planets.iter().position(|p| p.planet_id == planet.id) {
                Some(index) => {
                    if self.units_that_fit(&self.result.planets[index], building) > 0 {
                        return Some(index);
                    }
                }
                None => {
                    let site_id = new_site_id(&mut *self.rng);
                    self.log.info(
                        1,
                        format!(
                            "New site {site_id} on {} ({}) for {}.",
                            planet.name, planet.id, building.name
                        ),
                    );
                    self.result.planets.push(RecommendedPlanet {
                        planet_id: planet.id.clone(),
                        planet_name: planet.name.clone(),
                        site_id,
                        fertility: planet.fertility,
                        buildings: Vec::new(),
                        workforce_demand: BTreeMap::new(),
                        area_used: 0.0,
                        permits: 0,
                        permit_cost: 0.0,
                        estimated_cost: 0.0,
                    });
                    let index = self.result.planets.len() - 1;
                    if self.units_that_fit(&self.result.planets[index], building) > 0 {
                        return Some(index);
                    }
                    // An empty site that cannot take one unit is of no use.
                    self.result.planets.pop();
                }
            }
        }
        None
    }

    fn add_units(&mut self, index: usize, building: &Building, unit_cost: f64, units: u32) {
        let planet = &mut self.result.planets[index];
        let cost = unit_cost * f64::from(units);

        match planet
            .buildings
            .iter_mut()
            .find(|b| b.building_ticker == building.ticker)
        {
            Some(existing) => {
                existing.amount += units;
                existing.estimated_cost += cost;
            }
            None => planet.buildings.push(RecommendedBuilding {
                building_ticker: building.ticker.clone(),
                building_name: building.name.clone(),
                amount: units,
                unit_cost,
                estimated_cost: cost,
                unit_area: building.area,
                planet_id: Some(planet.planet_id.clone()),
                site_id: Some(planet.site_id.clone()),
            }),
        }
        planet.estimated_cost += cost;
        self.result.total_cost += cost;

        for req in &building.workforce {
            let needed = req.capacity * f64::from(units);
            *planet
                .workforce_demand
                .entry(req.workforce_type.clone())
                .or_insert(0.0) += needed;
            *self
                .result
                .workforce_demand
                .entry(req.workforce_type.clone())
                .or_insert(0.0) += needed;
            self.log.info(
                2,
                format!(
                    "{} x{units} on {} demands {needed:.2} {} workforce.",
                    building.ticker, planet.planet_name, req.workforce_type
                ),
            );
        }
    }

    fn record_unplaced(&mut self, ticker: &str, units: u32) {
        match self.result.unplaced.iter_mut().find(|u| u.building_ticker == ticker) {
            Some(u) => u.units += units,
            None => self.result.unplaced.push(UnplacedBuilding {
                building_ticker: ticker.to_string(),
                units,
            }),
        }
    }
}
