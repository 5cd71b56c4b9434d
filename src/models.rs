//! Data models for the game catalog, company state and planner output

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Milliseconds in one game day; production rates are expressed per day.
pub const MS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

// --- Static catalog ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub ticker: String,
    pub category: String,
    pub weight: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeInput {
    pub material_ticker: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeOutput {
    pub material_ticker: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Standard recipe name, e.g. `FP:2xH2O-1xNUT=>4xRAT`. Orders refer to recipes by it.
    pub standard_name: String,
    pub name: String,
    pub building_ticker: String,
    pub duration_ms: u64,
    #[serde(default)]
    pub inputs: Vec<RecipeInput>,
    #[serde(default)]
    pub outputs: Vec<RecipeOutput>,
}

impl Recipe {
    pub fn produces(&self, ticker: &str) -> bool {
        self.outputs.iter().any(|o| o.material_ticker == ticker)
    }

    /// Amount of `ticker` produced per cycle, 0 if the recipe does not produce it.
    pub fn output_amount(&self, ticker: &str) -> f64 {
        self.outputs
            .iter()
            .find(|o| o.material_ticker == ticker)
            .map_or(0.0, |o| o.amount)
    }

    /// Units of `ticker` one building running this recipe produces per day.
    pub fn daily_output(&self, ticker: &str) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.output_amount(ticker) * (MS_PER_DAY / self.duration_ms as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingCostItem {
    pub material_ticker: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkforceRequirement {
    pub workforce_type: String,
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub ticker: String,
    pub name: String,
    /// Footprint in area units.
    pub area: f64,
    #[serde(default)]
    pub expertise: Option<String>,
    #[serde(default)]
    pub costs: Vec<BuildingCostItem>,
    #[serde(default)]
    pub workforce: Vec<WorkforceRequirement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Liquid,
    Mineral,
    Gaseous,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Liquid => "LIQUID",
            ResourceType::Mineral => "MINERAL",
            ResourceType::Gaseous => "GASEOUS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LIQUID" => Some(ResourceType::Liquid),
            "MINERAL" => Some(ResourceType::Mineral),
            "GASEOUS" => Some(ResourceType::Gaseous),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetResource {
    pub material_id: String,
    pub resource_type: ResourceType,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CogcProgram {
    #[serde(default)]
    pub program_type: Option<String>,
    pub start_ms: i64,
    pub end_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub id: String,
    #[serde(default)]
    pub natural_id: String,
    pub name: String,
    #[serde(default)]
    pub fertility: f64,
    #[serde(default)]
    pub resources: Vec<PlanetResource>,
    #[serde(default)]
    pub cogc_programs: Vec<CogcProgram>,
    #[serde(default)]
    pub cogc_status: Option<String>,
    #[serde(default)]
    pub has_local_market: bool,
    #[serde(default)]
    pub has_chamber_of_commerce: bool,
}

impl Planet {
    /// Program types running at `now_ms`; empty unless the COGC status is ACTIVE.
    pub fn active_programs(&self, now_ms: i64) -> impl Iterator<Item = &str> {
        let active = self.cogc_status.as_deref() == Some("ACTIVE");
        self.cogc_programs
            .iter()
            .filter(move |p| active && p.start_ms <= now_ms && now_ms <= p.end_ms)
            .filter_map(|p| p.program_type.as_deref())
    }
}

// --- Dynamic company state ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub id: String,
    /// Standard name of the recipe being run.
    pub recipe_name: String,
    pub created_ms: i64,
    #[serde(default)]
    pub started_ms: Option<i64>,
    #[serde(default)]
    pub completion_ms: Option<i64>,
    pub duration_ms: u64,
    #[serde(default)]
    pub halted: bool,
    #[serde(default)]
    pub recurring: bool,
}

impl ProductionOrder {
    /// Only running orders with a scheduled completion count towards current output.
    pub fn is_active(&self) -> bool {
        !self.halted && self.completion_ms.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingInstance {
    pub id: String,
    pub building_ticker: String,
    #[serde(default)]
    pub orders: Vec<ProductionOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub planet_id: String,
    pub planet_name: String,
    #[serde(default)]
    pub invested_permits: u32,
    #[serde(default)]
    pub buildings: Vec<BuildingInstance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hq_planet_id: Option<String>,
    #[serde(default)]
    pub sites: Vec<Site>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub ticker: String,
    #[serde(default)]
    pub ask: Option<f64>,
    #[serde(default)]
    pub bid: Option<f64>,
    #[serde(default)]
    pub average: Option<f64>,
}

impl MarketQuote {
    /// Ask, else bid, else average.
    pub fn price(&self) -> Option<f64> {
        self.ask.or(self.bid).or(self.average)
    }
}

/// Everything one planning run reads. Never mutated by the planner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    #[serde(default)]
    pub current_day: u32,
    /// Reference time for COGC program windows.
    #[serde(default)]
    pub now_ms: i64,
    /// Keyed by ticker.
    #[serde(default)]
    pub materials: BTreeMap<String, Material>,
    /// Keyed by ticker.
    #[serde(default)]
    pub buildings: BTreeMap<String, Building>,
    /// Iteration order is the resolver's tie-break order.
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub planets: Vec<Planet>,
    #[serde(default)]
    pub company: Company,
    /// Keyed by material ticker.
    #[serde(default)]
    pub market: BTreeMap<String, MarketQuote>,
}

impl SimulationState {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn recipe(&self, standard_name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.standard_name == standard_name)
    }

    pub fn recipes_producing<'s>(&'s self, ticker: &str) -> impl Iterator<Item = &'s Recipe> {
        self.recipes.iter().filter(move |r| r.produces(ticker))
    }

    pub fn planet(&self, id: &str) -> Option<&Planet> {
        self.planets.iter().find(|p| p.id == id)
    }

    pub fn quote(&self, ticker: &str) -> Option<&MarketQuote> {
        self.market.get(ticker)
    }

    pub fn material_by_ticker(&self, ticker: &str) -> Option<&Material> {
        self.materials.get(ticker)
    }
}

// --- Planner output ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcquisitionSource {
    Buy,
    Produce,
    Unknown,
}

impl std::fmt::Display for AcquisitionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AcquisitionSource::Buy => "BUY",
            AcquisitionSource::Produce => "PRODUCE",
            AcquisitionSource::Unknown => "UNKNOWN",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedBuilding {
    pub building_ticker: String,
    pub building_name: String,
    pub amount: u32,
    /// Construction cost of one unit at current market prices.
    pub unit_cost: f64,
    pub estimated_cost: f64,
    pub unit_area: f64,
    pub planet_id: Option<String>,
    pub site_id: Option<String>,
}

impl RecommendedBuilding {
    pub fn total_area(&self) -> f64 {
        self.unit_area * f64::from(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedPlanet {
    pub planet_id: String,
    pub planet_name: String,
    /// Synthetic id of the site that would be founded.
    pub site_id: String,
    pub fertility: f64,
    pub buildings: Vec<RecommendedBuilding>,
    pub workforce_demand: BTreeMap<String, f64>,
    /// Includes the site's base area once permits are computed.
    pub area_used: f64,
    pub permits: u32,
    pub permit_cost: f64,
    pub estimated_cost: f64,
}

impl RecommendedPlanet {
    pub fn building_area(&self) -> f64 {
        self.buildings.iter().map(RecommendedBuilding::total_area).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnplacedBuilding {
    pub building_ticker: String,
    pub units: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HousingGap {
    pub planet_id: String,
    pub workforce_type: String,
    pub demand: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub material_ticker: String,
    pub target_rate: f64,
    pub current_rate: f64,
    pub production_gap: f64,
    /// None when current production already meets the target.
    pub source: Option<AcquisitionSource>,
    /// Finite cost of one unit under `source`.
    pub cost_per_unit: Option<f64>,
    pub chain_sets: u32,
    pub recommended_planets: Vec<RecommendedPlanet>,
    pub workforce_demand: BTreeMap<String, f64>,
    pub unplaced: Vec<UnplacedBuilding>,
    pub housing_gaps: Vec<HousingGap>,
    pub total_estimated_cost: f64,
    pub log: Vec<String>,
}
