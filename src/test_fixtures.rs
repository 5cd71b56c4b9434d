//! Shared fixtures for unit tests.
//!
//! `rat_state()` is a small catalog around the RAT recipe at a food processor:
//! three planets (one with a local market, one with an active food-processing
//! COGC program, one bare), market quotes for the inputs and construction
//! materials, and one existing site with an idle food processor.

use std::collections::BTreeMap;

use crate::models::{
    Building, BuildingCostItem, BuildingInstance, CogcProgram, Company, MarketQuote, Material,
    Planet, PlanetResource, ProductionOrder, Recipe, RecipeInput, RecipeOutput, ResourceType,
    SimulationState, Site, WorkforceRequirement,
};

pub const NOW_MS: i64 = 1_700_000_000_000;
pub const RAT_RECIPE: &str = "FP:2xH2O-1xNUT=>4xRAT";

pub fn material(id: &str, ticker: &str) -> Material {
    Material {
        id: id.to_string(),
        name: ticker.to_lowercase(),
        ticker: ticker.to_string(),
        category: "consumables".to_string(),
        weight: 0.1,
        volume: 0.1,
    }
}

pub fn building(
    ticker: &str,
    area: f64,
    expertise: Option<&str>,
    costs: &[(&str, f64)],
    workforce: &[(&str, f64)],
) -> Building {
    Building {
        ticker: ticker.to_string(),
        name: format!("{ticker} building"),
        area,
        expertise: expertise.map(str::to_string),
        costs: costs
            .iter()
            .map(|(t, a)| BuildingCostItem {
                material_ticker: (*t).to_string(),
                amount: *a,
            })
            .collect(),
        workforce: workforce
            .iter()
            .map(|(t, c)| WorkforceRequirement {
                workforce_type: (*t).to_string(),
                capacity: *c,
            })
            .collect(),
    }
}

pub fn recipe(
    standard_name: &str,
    building_ticker: &str,
    duration_ms: u64,
    inputs: &[(&str, f64)],
    outputs: &[(&str, f64)],
) -> Recipe {
    Recipe {
        standard_name: standard_name.to_string(),
        name: standard_name.to_string(),
        building_ticker: building_ticker.to_string(),
        duration_ms,
        inputs: inputs
            .iter()
            .map(|(t, a)| RecipeInput {
                material_ticker: (*t).to_string(),
                amount: *a,
            })
            .collect(),
        outputs: outputs
            .iter()
            .map(|(t, a)| RecipeOutput {
                material_ticker: (*t).to_string(),
                amount: *a,
            })
            .collect(),
    }
}

pub fn ask(ticker: &str, price: f64) -> MarketQuote {
    MarketQuote {
        ticker: ticker.to_string(),
        ask: Some(price),
        bid: None,
        average: None,
    }
}

pub fn planet(id: &str, name: &str) -> Planet {
    Planet {
        id: id.to_string(),
        natural_id: id.to_uppercase(),
        name: name.to_string(),
        fertility: 0.0,
        resources: vec![],
        cogc_programs: vec![],
        cogc_status: None,
        has_local_market: false,
        has_chamber_of_commerce: false,
    }
}

pub fn active_cogc(program: &str) -> CogcProgram {
    CogcProgram {
        program_type: Some(program.to_string()),
        start_ms: NOW_MS - 1_000,
        end_ms: NOW_MS + 1_000,
    }
}

pub fn active_order(id: &str, duration_ms: u64) -> ProductionOrder {
    ProductionOrder {
        id: id.to_string(),
        recipe_name: RAT_RECIPE.to_string(),
        created_ms: 0,
        started_ms: Some(0),
        completion_ms: Some(duration_ms as i64),
        duration_ms,
        halted: false,
        recurring: true,
    }
}

pub fn rat_state() -> SimulationState {
    let materials: BTreeMap<String, Material> = [
        material("mat-rat", "RAT"),
        material("mat-h2o", "H2O"),
        material("mat-nut", "NUT"),
        material("mat-bse", "BSE"),
        material("mat-feo", "FEO"),
    ]
    .into_iter()
    .map(|m| (m.ticker.clone(), m))
    .collect();

    let buildings: BTreeMap<String, Building> = [
        building("FP", 50.0, Some("FOOD_PROCESSING"), &[("BSE", 4.0)], &[("PIONEER", 40.0)]),
        building("EXT", 25.0, Some("RESOURCE_EXTRACTION"), &[("BSE", 6.0)], &[("PIONEER", 60.0)]),
        building("HB1", 10.0, None, &[("BSE", 2.0)], &[]),
        building("HBB", 5.0, None, &[("BSE", 3.0)], &[]),
    ]
    .into_iter()
    .map(|b| (b.ticker.clone(), b))
    .collect();

    let recipes = vec![
        recipe(RAT_RECIPE, "FP", 3_600_000, &[("H2O", 2.0), ("NUT", 1.0)], &[("RAT", 4.0)]),
        recipe("EXT:=>1xFEO", "EXT", 7_200_000, &[], &[("FEO", 1.0)]),
    ];

    let mut montem = planet("p-montem", "Montem");
    montem.fertility = 0.2;
    montem.has_local_market = true;
    montem.resources = vec![PlanetResource {
        material_id: "mat-feo".to_string(),
        resource_type: ResourceType::Mineral,
        factor: 0.3,
    }];

    let mut promitor = planet("p-promitor", "Promitor");
    promitor.fertility = -1.0;
    promitor.cogc_status = Some("ACTIVE".to_string());
    promitor.cogc_programs = vec![active_cogc("ADVERTISING_FOOD_PROCESSING")];

    let mut vallis = planet("p-vallis", "Vallis");
    vallis.resources = vec![PlanetResource {
        material_id: "mat-feo".to_string(),
        resource_type: ResourceType::Gaseous,
        factor: 0.5,
    }];

    let market: BTreeMap<String, MarketQuote> =
        [ask("H2O", 30.0), ask("NUT", 60.0), ask("BSE", 100.0), ask("RAT", 50.0)]
            .into_iter()
            .map(|q| (q.ticker.clone(), q))
            .collect();

    SimulationState {
        current_day: 0,
        now_ms: NOW_MS,
        materials,
        buildings,
        recipes,
        planets: vec![montem, promitor, vallis],
        company: Company {
            id: "company-1".to_string(),
            name: "Test Co".to_string(),
            hq_planet_id: None,
            sites: vec![Site {
                id: "site-1".to_string(),
                planet_id: "p-montem".to_string(),
                planet_name: "Montem".to_string(),
                invested_permits: 1,
                buildings: vec![BuildingInstance {
                    id: "bi-1".to_string(),
                    building_ticker: "FP".to_string(),
                    orders: vec![],
                }],
            }],
        },
        market,
    }
}
