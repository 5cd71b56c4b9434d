//! Import of raw game-data JSON exports
//!
//! Walks an export directory and rebuilds a [`SimulationState`] from the
//! PascalCase JSON files it finds there. Files are matched by name anywhere
//! under the directory; planets may also be split over `planets/*.json`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::models::{
    Building, BuildingCostItem, BuildingInstance, CogcProgram, Company, MarketQuote, Material,
    Planet, PlanetResource, ProductionOrder, Recipe, ResourceType, SimulationState, Site,
    WorkforceRequirement,
};
use crate::recipe_name::parse_standard_recipe_name;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMaterial {
    material_id: String,
    name: String,
    ticker: String,
    #[serde(default)]
    category_name: String,
    #[serde(default)]
    weight: f64,
    #[serde(default)]
    volume: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawBuilding {
    ticker: String,
    name: String,
    #[serde(default)]
    area: f64,
    #[serde(default)]
    expertise: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawBuildingCost {
    building: String,
    material: String,
    amount: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawBuildingWorkforce {
    building: String,
    level: String,
    capacity: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawRecipe {
    #[serde(default)]
    recipe_name: Option<String>,
    standard_recipe_name: String,
    #[serde(default)]
    time_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawResource {
    material_id: String,
    resource_type: String,
    factor: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawCogcProgram {
    #[serde(default)]
    program_type: Option<String>,
    start_epoch_ms: i64,
    end_epoch_ms: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawPlanet {
    planet_id: String,
    #[serde(default)]
    planet_natural_id: String,
    planet_name: String,
    #[serde(default)]
    fertility: f64,
    #[serde(default)]
    resources: Vec<RawResource>,
    #[serde(default, rename = "COGCPrograms")]
    cogc_programs: Vec<RawCogcProgram>,
    #[serde(default, rename = "COGCProgramStatus")]
    cogc_program_status: Option<String>,
    #[serde(default)]
    has_local_market: bool,
    #[serde(default)]
    has_chamber_of_commerce: bool,
}

/// A planet file holds either one planet or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawQuote {
    material_ticker: String,
    #[serde(default)]
    ask: Option<f64>,
    #[serde(default)]
    bid: Option<f64>,
    #[serde(default)]
    price_average: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawHeadquarter {
    #[serde(default)]
    planet_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawCompany {
    #[serde(default)]
    company_id: String,
    #[serde(default)]
    company_name: String,
    #[serde(default)]
    headquarter: Option<RawHeadquarter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSiteBuilding {
    site_building_id: String,
    building_ticker: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSite {
    site_id: String,
    planet_id: String,
    #[serde(default)]
    planet_name: String,
    #[serde(default)]
    invested_permits: u32,
    #[serde(default)]
    buildings: Vec<RawSiteBuilding>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawOrder {
    production_line_order_id: String,
    #[serde(default)]
    building_id: Option<String>,
    standard_recipe_name: String,
    #[serde(default)]
    created_epoch_ms: i64,
    #[serde(default)]
    started_epoch_ms: Option<i64>,
    #[serde(default)]
    completion_epoch_ms: Option<i64>,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    is_halted: bool,
    #[serde(default)]
    recurring: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawProductionLine {
    #[serde(default)]
    orders: Vec<RawOrder>,
}

/// Export files found under the import directory.
#[derive(Debug, Default)]
struct ExportFiles {
    by_name: BTreeMap<String, PathBuf>,
    planet_files: Vec<PathBuf>,
}

impl ExportFiles {
    fn get(&self, name: &str) -> Option<&Path> {
        self.by_name.get(name).map(PathBuf::as_path)
    }
}

/// Locate the known export files under `dir`; the first file of each name wins.
fn find_export_files(dir: &Path) -> ExportFiles {
    let mut files = ExportFiles::default();
    let mut entries: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    for path in entries {
        let in_planets_dir = path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|d| d == "planets");
        if in_planets_dir {
            files.planet_files.push(path);
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        files.by_name.entry(name).or_insert(path);
    }
    files
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Read a list file; a missing file is an empty list, a broken one is counted.
fn read_list<T: DeserializeOwned>(files: &ExportFiles, name: &str, stats: &mut ImportStats) -> Vec<T> {
    let Some(path) = files.get(name) else {
        debug!("{name} not found; skipped");
        return Vec::new();
    };
    match read_json::<Vec<T>>(path) {
        Ok(list) => list,
        Err(e) => {
            warn!("Error reading {}: {}", path.display(), e);
            stats.errors += 1;
            Vec::new()
        }
    }
}

/// Build a snapshot from the exports in `dir`, stamped with `now_ms`.
pub fn import_dir(dir: &Path, now_ms: i64) -> Result<(SimulationState, ImportStats)> {
    if !dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        )
        .into());
    }
    info!("Scanning {} for exports...", dir.display());
    let files = find_export_files(dir);
    let mut stats = ImportStats::default();
    let mut state = SimulationState {
        now_ms,
        ..SimulationState::default()
    };

    for raw in read_list::<RawMaterial>(&files, "materials.json", &mut stats) {
        state.materials.insert(
            raw.ticker.clone(),
            Material {
                id: raw.material_id,
                name: raw.name,
                ticker: raw.ticker,
                category: raw.category_name,
                weight: raw.weight,
                volume: raw.volume,
            },
        );
    }
    stats.materials = state.materials.len();

    import_buildings(&files, &mut state, &mut stats);
    import_recipes(&files, &mut state, &mut stats);
    import_planets(&files, &mut state, &mut stats);

    for raw in read_list::<RawQuote>(&files, "market.json", &mut stats) {
        // Several exchanges may quote the same ticker; keep the first.
        state
            .market
            .entry(raw.material_ticker.clone())
            .or_insert(MarketQuote {
                ticker: raw.material_ticker,
                ask: raw.ask,
                bid: raw.bid,
                average: raw.price_average,
            });
    }
    stats.quotes = state.market.len();

    import_company(&files, &mut state, &mut stats);

    info!("{stats}");
    Ok((state, stats))
}

fn import_buildings(files: &ExportFiles, state: &mut SimulationState, stats: &mut ImportStats) {
    for raw in read_list::<RawBuilding>(files, "buildings.json", stats) {
        state.buildings.insert(
            raw.ticker.clone(),
            Building {
                ticker: raw.ticker,
                name: raw.name,
                area: raw.area,
                expertise: raw.expertise.filter(|e| !e.trim().is_empty()),
                costs: Vec::new(),
                workforce: Vec::new(),
            },
        );
    }

    for raw in read_list::<RawBuildingCost>(files, "building_costs.json", stats) {
        match state.buildings.get_mut(&raw.building) {
            Some(b) => b.costs.push(BuildingCostItem {
                material_ticker: raw.material,
                amount: raw.amount,
            }),
            None => {
                warn!("Cost entry for unknown building {}", raw.building);
                stats.skipped += 1;
            }
        }
    }

    for raw in read_list::<RawBuildingWorkforce>(files, "building_workforces.json", stats) {
        match state.buildings.get_mut(&raw.building) {
            Some(b) => b.workforce.push(WorkforceRequirement {
                workforce_type: raw.level,
                capacity: raw.capacity,
            }),
            None => {
                warn!("Workforce entry for unknown building {}", raw.building);
                stats.skipped += 1;
            }
        }
    }
    stats.buildings = state.buildings.len();
}

fn import_recipes(files: &ExportFiles, state: &mut SimulationState, stats: &mut ImportStats) {
    for raw in read_list::<RawRecipe>(files, "recipes.json", stats) {
        let parsed = match parse_standard_recipe_name(&raw.standard_recipe_name) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("{e}");
                stats.skipped += 1;
                continue;
            }
        };
        if state.recipe(&raw.standard_recipe_name).is_some() {
            debug!("Duplicate recipe {}", raw.standard_recipe_name);
            stats.skipped += 1;
            continue;
        }
        state.recipes.push(Recipe {
            name: raw
                .recipe_name
                .unwrap_or_else(|| raw.standard_recipe_name.clone()),
            building_ticker: parsed.building_ticker.clone(),
            duration_ms: raw.time_ms,
            inputs: parsed.recipe_inputs(),
            outputs: parsed.recipe_outputs(),
            standard_name: raw.standard_recipe_name,
        });
    }
    stats.recipes = state.recipes.len();
}

fn import_planets(files: &ExportFiles, state: &mut SimulationState, stats: &mut ImportStats) {
    let mut raws: Vec<RawPlanet> = read_list(files, "planets.json", stats);
    for path in &files.planet_files {
        match read_json::<OneOrMany<RawPlanet>>(path) {
            Ok(OneOrMany::One(p)) => raws.push(p),
            Ok(OneOrMany::Many(list)) => raws.extend(list),
            Err(e) => {
                warn!("Error reading {}: {}", path.display(), e);
                stats.errors += 1;
            }
        }
    }

    for raw in raws {
        if state.planet(&raw.planet_id).is_some() {
            stats.skipped += 1;
            continue;
        }
        let mut resources = Vec::with_capacity(raw.resources.len());
        for r in raw.resources {
            match ResourceType::parse(&r.resource_type) {
                Some(resource_type) => resources.push(PlanetResource {
                    material_id: r.material_id,
                    resource_type,
                    factor: r.factor,
                }),
                None => {
                    warn!("Unknown resource type {} on {}", r.resource_type, raw.planet_name);
                    stats.skipped += 1;
                }
            }
        }
        state.planets.push(Planet {
            id: raw.planet_id,
            natural_id: raw.planet_natural_id,
            name: raw.planet_name,
            fertility: raw.fertility,
            resources,
            cogc_programs: raw
                .cogc_programs
                .into_iter()
                .map(|c| CogcProgram {
                    program_type: c.program_type,
                    start_ms: c.start_epoch_ms,
                    end_ms: c.end_epoch_ms,
                })
                .collect(),
            cogc_status: raw.cogc_program_status,
            has_local_market: raw.has_local_market,
            has_chamber_of_commerce: raw.has_chamber_of_commerce,
        });
    }
    stats.planets = state.planets.len();
}

fn import_company(files: &ExportFiles, state: &mut SimulationState, stats: &mut ImportStats) {
    if let Some(path) = files.get("company.json") {
        match read_json::<RawCompany>(path) {
            Ok(raw) => {
                state.company.id = raw.company_id;
                state.company.name = raw.company_name;
                state.company.hq_planet_id = raw.headquarter.and_then(|hq| hq.planet_id);
            }
            Err(e) => {
                warn!("Error reading {}: {}", path.display(), e);
                stats.errors += 1;
            }
        }
    }

    state.company.sites = read_list::<RawSite>(files, "sites.json", stats)
        .into_iter()
        .map(|raw| Site {
            id: raw.site_id,
            planet_id: raw.planet_id,
            planet_name: raw.planet_name,
            invested_permits: raw.invested_permits,
            buildings: raw
                .buildings
                .into_iter()
                .map(|b| BuildingInstance {
                    id: b.site_building_id,
                    building_ticker: b.building_ticker,
                    orders: Vec::new(),
                })
                .collect(),
        })
        .collect();
    stats.sites = state.company.sites.len();

    for line in read_list::<RawProductionLine>(files, "production.json", stats) {
        for raw in line.orders {
            let order = ProductionOrder {
                id: raw.production_line_order_id,
                recipe_name: raw.standard_recipe_name,
                created_ms: raw.created_epoch_ms,
                started_ms: raw.started_epoch_ms,
                completion_ms: raw.completion_epoch_ms,
                duration_ms: raw.duration_ms,
                halted: raw.is_halted,
                recurring: raw.recurring,
            };
            match raw
                .building_id
                .as_deref()
                .and_then(|id| building_instance_mut(&mut state.company, id))
            {
                Some(instance) => {
                    instance.orders.push(order);
                    stats.orders += 1;
                }
                None => {
                    warn!("Order {} has no matching building; dropped", order.id);
                    stats.skipped += 1;
                }
            }
        }
    }
}

fn building_instance_mut<'c>(company: &'c mut Company, id: &str) -> Option<&'c mut BuildingInstance> {
    company
        .sites
        .iter_mut()
        .flat_map(|s| s.buildings.iter_mut())
        .find(|b| b.id == id)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub materials: usize,
    pub buildings: usize,
    pub recipes: usize,
    pub planets: usize,
    pub quotes: usize,
    pub sites: usize,
    pub orders: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Imported {} materials, {} buildings, {} recipes, {} planets, {} quotes, {} sites, {} orders. Skipped: {}, Errors: {}",
            self.materials,
            self.buildings,
            self.recipes,
            self.planets,
            self.quotes,
            self.sites,
            self.orders,
            self.skipped,
            self.errors
        )
    }
}
