//! Recursive make-vs-buy cost resolution over the recipe graph

use rand::Rng;

use crate::category::{Category, category_of_material};
use crate::config::PlannerConfig;
use crate::market;
use crate::models::{
    AcquisitionSource, Building, MS_PER_DAY, Recipe, RecommendedBuilding, SimulationState,
};
use crate::planet::{has_matching_cogc, select_expansion_planet};
use crate::trace::SimulationLog;

/// How a material is best acquired, per unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub cost_per_unit: f64,
    pub source: AcquisitionSource,
    /// Buildings of the production chain, one unit each, upstream first.
    pub buildings: Vec<RecommendedBuilding>,
    pub planet_id: Option<String>,
    /// Standard name of the chosen recipe when producing.
    pub recipe: Option<String>,
}

impl Resolution {
    pub fn unknown() -> Self {
        Self {
            cost_per_unit: f64::INFINITY,
            source: AcquisitionSource::Unknown,
            buildings: Vec::new(),
            planet_id: None,
            recipe: None,
        }
    }

    fn buy(price: f64) -> Self {
        Self {
            cost_per_unit: price,
            source: AcquisitionSource::Buy,
            ..Self::unknown()
        }
    }

    pub fn is_acquirable(&self) -> bool {
        self.cost_per_unit.is_finite()
    }
}

/// Cheapest production route found so far for one material.
struct ProduceOption<'s> {
    cost_per_unit: f64,
    recipe: &'s Recipe,
    building: &'s Building,
    construction_cost: f64,
    planet_id: String,
    buildings: Vec<RecommendedBuilding>,
}

pub struct CostResolver<'a, R: Rng + ?Sized> {
    state: &'a SimulationState,
    config: &'a PlannerConfig,
    rng: &'a mut R,
    log: &'a mut SimulationLog,
    deepest_expansion: usize,
}

impl<'a, R: Rng + ?Sized> CostResolver<'a, R> {
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
            deepest_expansion: 0,
        }
    }

    /// Deepest recursion level at which a material was actually expanded.
    pub(crate) fn deepest_expansion(&self) -> usize {
        self.deepest_expansion
    }

    /// Resolve the cheapest way to acquire one unit of `ticker`.
    ///
    /// With `is_final` set, a viable recipe is always chosen over buying.
    /// Intermediate materials take the cheaper of BUY and PRODUCE, ties to BUY.
    pub fn resolve(
        &mut self,
        ticker: &str,
        depth: usize,
        preferred_planet: Option<&str>,
        is_final: bool,
    ) -> Resolution {
        let state = self.state;

        if depth > self.config.max_recursion_depth {
            return match market::buy_price(state, ticker) {
                Some(price) => {
                    self.log.info(
                        depth,
                        format!("Depth limit reached for {ticker}; using market price {price:.2}."),
                    );
                    Resolution::buy(price)
                }
                None => {
                    self.log.warn(
                        depth,
                        format!("Depth limit reached for {ticker} and no market price."),
                    );
                    Resolution::unknown()
                }
            };
        }
        self.deepest_expansion = self.deepest_expansion.max(depth);
        self.log
            .info(depth, format!("--- Analyzing cost for {ticker} (depth {depth}) ---"));

        let buy_cost = match market::buy_price(state, ticker) {
            Some(price) => {
                self.log
                    .info(depth, format!("Market price for {ticker}: {price:.2}/unit."));
                price
            }
            None => {
                self.log
                    .info(depth, format!("No market price for {ticker}; cannot buy."));
                f64::INFINITY
            }
        };

        let best = self.best_production(ticker, depth, preferred_planet);

        if is_final {
            if let Some(option) = best {
                self.log.info(
                    depth,
                    format!(
                        "Decision for {ticker}: PRODUCE (requested material) via {} at {:.2}/unit.",
                        option.recipe.standard_name, option.cost_per_unit
                    ),
                );
                return produce(option);
            }
            self.log.warn(
                depth,
                format!("No viable recipe for requested material {ticker}; comparing market options."),
            );
        }

        let produce_cost = best.as_ref().map_or(f64::INFINITY, |o| o.cost_per_unit);
        if buy_cost.is_infinite() && produce_cost.is_infinite() {
            self.log
                .warn(depth, format!("Decision for {ticker}: UNKNOWN (cannot acquire)."));
            return Resolution::unknown();
        }
        match best {
            Some(option) if produce_cost < buy_cost => {
                self.log.info(
                    depth,
                    format!(
                        "Decision for {ticker}: PRODUCE via {} at {produce_cost:.2}/unit.",
                        option.recipe.standard_name
                    ),
                );
                produce(option)
            }
            _ => {
                self.log
                    .info(depth, format!("Decision for {ticker}: BUY at {buy_cost:.2}/unit."));
                Resolution::buy(buy_cost)
            }
        }
    }

    fn best_production(
        &mut self,
        ticker: &str,
        depth: usize,
        preferred_planet: Option<&str>,
    ) -> Option<ProduceOption<'a>> {
        let state = self.state;
        let recipes: Vec<&'a Recipe> = state.recipes_producing(ticker).collect();
        if recipes.is_empty() {
            self.log.info(depth, format!("No recipe produces {ticker}."));
            return None;
        }
        let category = category_of_material(state, ticker, self.log, depth);

        let mut best: Option<ProduceOption<'a>> = None;
        for recipe in recipes {
            self.log.info(
                depth,
                format!("Evaluating recipe {} (building {})", recipe.standard_name, recipe.building_ticker),
            );
            let Some(option) = self.evaluate_recipe(ticker, recipe, category.as_ref(), depth, preferred_planet)
            else {
                continue;
            };
            if best.as_ref().is_none_or(|b| option.cost_per_unit < b.cost_per_unit) {
                best = Some(option);
            }
        }
        best
    }

    fn evaluate_recipe(
        &mut self,
        ticker: &str,
        recipe: &'a Recipe,
        category: Option<&Category>,
        depth: usize,
        preferred_planet: Option<&str>,
    ) -> Option<ProduceOption<'a>> {
        let state = self.state;

        let output_amount = recipe.output_amount(ticker);
        if output_amount <= 0.0 || recipe.duration_ms == 0 {
            self.log.warn(
                depth,
                format!("Recipe {} has zero output or duration; skipped.", recipe.standard_name),
            );
            return None;
        }
        let Some(building) = state.buildings.get(&recipe.building_ticker) else {
            self.log.warn(
                depth,
                format!("Building definition for {} not found; recipe skipped.", recipe.building_ticker),
            );
            return None;
        };

        let planet_id = match preferred_planet {
            Some(id) => id.to_string(),
            None => {
                if state.planets.is_empty() {
                    self.log.warn(depth, "No planet data; cannot place production.");
                    return None;
                }
                let chosen = select_expansion_planet(
                    state,
                    category,
                    Some(recipe.building_ticker.as_str()),
                    &mut *self.rng,
                    self.log,
                    depth,
                );
                match chosen {
                    Some(planet) => planet.id.clone(),
                    None => {
                        self.log.info(
                            depth,
                            format!("No planet for {ticker}; recipe {} skipped.", recipe.standard_name),
                        );
                        return None;
                    }
                }
            }
        };

        let mut input_cost = 0.0;
        let mut chain = Vec::new();
        for input in &recipe.inputs {
            let sub = self.resolve(&input.material_ticker, depth + 1, Some(planet_id.as_str()), false);
            if !sub.is_acquirable() {
                self.log.warn(
                    depth + 1,
                    format!(
                        "Cannot acquire input {}; recipe {} skipped.",
                        input.material_ticker, recipe.standard_name
                    ),
                );
                return None;
            }
            input_cost += input.amount * sub.cost_per_unit;
            let sub_planet = sub.planet_id.clone().unwrap_or_else(|| planet_id.clone());
            for mut b in sub.buildings {
                if b.planet_id.is_none() {
                    b.planet_id = Some(sub_planet.clone());
                }
                chain.push(b);
            }
        }

        let construction_cost = market::construction_cost(state, building, self.log, depth);

        let mut duration_ms = recipe.duration_ms as f64;
        if let (Some(category), Some(planet)) = (category, state.planet(&planet_id)) {
            if has_matching_cogc(state, planet, Some(category)) {
                duration_ms *= self.config.cogc_duration_factor;
                self.log.info(
                    depth,
                    format!(
                        "COGC bonus for {category} on {}: effective duration {duration_ms:.0}ms.",
                        planet.name
                    ),
                );
            }
        }

        let yearly_output = output_amount * (MS_PER_DAY / duration_ms) * self.config.amortization_days;
        let cost_per_unit = input_cost / output_amount + construction_cost / yearly_output;
        self.log.info(
            depth,
            format!(
                "Production cost for {ticker} via {}: {cost_per_unit:.2}/unit (incl. building).",
                recipe.standard_name
            ),
        );

        Some(ProduceOption {
            cost_per_unit,
            recipe,
            building,
            construction_cost,
            planet_id,
            buildings: chain,
        })
    }
}

fn produce(option: ProduceOption<'_>) -> Resolution {
    let mut buildings = option.buildings;
    buildings.push(RecommendedBuilding {
        building_ticker: option.building.ticker.clone(),
        building_name: option.building.name.clone(),
        amount: 1,
        unit_cost: option.construction_cost,
        estimated_cost: option.construction_cost,
        unit_area: option.building.area,
        planet_id: Some(option.planet_id.clone()),
        site_id: None,
    });
    Resolution {
        cost_per_unit: option.cost_per_unit,
        source: AcquisitionSource::Produce,
        buildings,
        planet_id: Some(option.planet_id),
        recipe: Some(option.recipe.standard_name.clone()),
    }
}
