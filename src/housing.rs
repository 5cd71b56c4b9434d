//! Housing for the workforce demanded by recommended buildings

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{HousingSpec, PlannerConfig};
use crate::error::PlannerError;
use crate::market;
use crate::models::{Building, HousingGap, RecommendedBuilding, RecommendedPlanet, SimulationState};
use crate::trace::SimulationLog;

/// What housing selection minimizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizationGoal {
    /// Cheapest construction cost per unit of capacity.
    #[default]
    LowerCost,
    /// Smallest footprint per unit of capacity.
    LessArea,
}

impl FromStr for OptimizationGoal {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "lower cost" | "lower-cost" => Ok(OptimizationGoal::LowerCost),
            "less area" | "less-area" => Ok(OptimizationGoal::LessArea),
            other => Err(PlannerError::InvalidTarget(format!(
                "unknown optimization goal '{other}' (expected 'lower cost' or 'less area')"
            ))),
        }
    }
}

impl fmt::Display for OptimizationGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptimizationGoal::LowerCost => "lower cost",
            OptimizationGoal::LessArea => "less area",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HousingOutcome {
    pub gaps: Vec<HousingGap>,
    pub total_cost: f64,
}

struct Candidate<'s> {
    building: &'s Building,
    capacity: f64,
    unit_cost: f64,
    cost_per_capacity: f64,
    area_per_capacity: f64,
}

pub struct HousingPlanner<'a> {
    state: &'a SimulationState,
    config: &'a PlannerConfig,
    log: &'a mut SimulationLog,
}

impl<'a> HousingPlanner<'a> {
    pub fn new(state: &'a SimulationState, config: &'a PlannerConfig, log: &'a mut SimulationLog) -> Self {
        Self { state, config, log }
    }

    /// Add housing to every planet with workforce demand.
    pub fn plan(&mut self, planets: &mut [RecommendedPlanet], goal: OptimizationGoal) -> HousingOutcome {
        self.log.info(0, "--- Planning housing for workforce demand ---");
        let mut outcome = HousingOutcome::default();
        for planet in planets.iter_mut() {
            self.plan_planet(planet, goal, &mut outcome);
        }
        outcome
    }

    fn plan_planet(&mut self, planet: &mut RecommendedPlanet, goal: OptimizationGoal, outcome: &mut HousingOutcome) {
        let demands: Vec<(String, f64)> = planet
            .workforce_demand
            .iter()
            .filter(|(_, demand)| **demand > 0.0)
            .map(|(wf, demand)| (wf.clone(), *demand))
            .collect();
        if demands.is_empty() {
            return;
        }
        self.log
            .info(1, format!("Housing for {} ({}):", planet.planet_name, planet.planet_id));

        for (workforce_type, demand) in demands {
            let Some(best) = self.best_candidate(&workforce_type, goal) else {
                self.log.warn(
                    2,
                    format!(
                        "No housing building provides {workforce_type}; {demand:.2} workers stay unhoused on {}.",
                        planet.planet_name
                    ),
                );
                outcome.gaps.push(HousingGap {
                    planet_id: planet.planet_id.clone(),
                    workforce_type,
                    demand,
                });
                continue;
            };

            let units = (demand / best.capacity).ceil() as u32;
            let cost = best.unit_cost * f64::from(units);
            self.log.info(
                2,
                format!(
                    "{workforce_type} {demand:.2}: {units} x {} ({:.2}/capacity, {:.3} area/capacity), cost {cost:.2}, area {:.2}.",
                    best.building.ticker,
                    best.cost_per_capacity,
                    best.area_per_capacity,
                    best.building.area * f64::from(units)
                ),
            );
            add_housing(planet, best.building, best.unit_cost, units);
            outcome.total_cost += cost;
        }
    }

    /// Best housing for `workforce_type`; earlier catalog entries win ties.
    fn best_candidate(&mut self, workforce_type: &str, goal: OptimizationGoal) -> Option<Candidate<'a>> {
        let config = self.config;
        let mut best: Option<Candidate<'a>> = None;
        for spec in &config.housing {
            let Some(candidate) = self.candidate(spec, workforce_type) else {
                continue;
            };
            let better = best.as_ref().is_none_or(|b| match goal {
                OptimizationGoal::LowerCost => candidate.cost_per_capacity < b.cost_per_capacity,
                OptimizationGoal::LessArea => candidate.area_per_capacity < b.area_per_capacity,
            });
            if better {
                best = Some(candidate);
            }
        }
        best
    }

    fn candidate(&mut self, spec: &HousingSpec, workforce_type: &str) -> Option<Candidate<'a>> {
        let capacity = spec.capacity_for(workforce_type);
        if capacity <= 0.0 {
            return None;
        }
        let state = self.state;
        let Some(building) = state.buildings.get(&spec.building_ticker) else {
            self.log.info(
                2,
                format!("Housing building {} is not in the catalog; skipped.", spec.building_ticker),
            );
            return None;
        };
        let unit_cost = market::construction_cost(state, building, self.log, 2);
        Some(Candidate {
            building,
            capacity,
            unit_cost,
            cost_per_capacity: unit_cost / capacity,
            area_per_capacity: building.area.max(0.0) / capacity,
        })
    }
}

fn add_housing(planet: &mut RecommendedPlanet, building: &Building, unit_cost: f64, units: u32) {
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
}
