//! SQLite snapshot store

use std::collections::BTreeMap;

use rusqlite::{Connection, OptionalExtension};
use tracing::warn;

use crate::error::Result;
use crate::models::{
    Building, BuildingCostItem, BuildingInstance, CogcProgram, Company, MarketQuote, Material,
    Planet, PlanetResource, ProductionOrder, Recipe, RecipeInput, RecipeOutput, ResourceType,
    SimulationState, Site, WorkforceRequirement,
};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Static catalog
        CREATE TABLE IF NOT EXISTS materials (
            ticker TEXT PRIMARY KEY,
            id TEXT NOT NULL,
            name TEXT NOT NULL,
            category TEXT,
            weight REAL,
            volume REAL
        );

        CREATE TABLE IF NOT EXISTS buildings (
            ticker TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            area REAL NOT NULL,
            expertise TEXT
        );

        CREATE TABLE IF NOT EXISTS building_costs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            building_ticker TEXT NOT NULL,
            material_ticker TEXT NOT NULL,
            amount REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS building_workforces (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            building_ticker TEXT NOT NULL,
            workforce_type TEXT NOT NULL,
            capacity REAL NOT NULL
        );

        -- Recipes keep their insertion order; it breaks cost ties
        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            standard_name TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            building_ticker TEXT NOT NULL,
            duration_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_inputs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL,
            material_ticker TEXT NOT NULL,
            amount REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_outputs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL,
            material_ticker TEXT NOT NULL,
            amount REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS planets (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            natural_id TEXT,
            name TEXT NOT NULL,
            fertility REAL,
            cogc_status TEXT,
            has_local_market INTEGER NOT NULL,
            has_chamber_of_commerce INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS planet_resources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            planet_id TEXT NOT NULL,
            material_id TEXT NOT NULL,
            resource_type TEXT NOT NULL,
            factor REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cogc_programs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            planet_id TEXT NOT NULL,
            program_type TEXT,
            start_ms INTEGER NOT NULL,
            end_ms INTEGER NOT NULL
        );

        -- Market and company state
        CREATE TABLE IF NOT EXISTS market_quotes (
            ticker TEXT PRIMARY KEY,
            ask REAL,
            bid REAL,
            average REAL
        );

        CREATE TABLE IF NOT EXISTS company (
            id TEXT PRIMARY KEY,
            name TEXT,
            hq_planet_id TEXT,
            current_day INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS sites (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            planet_id TEXT NOT NULL,
            planet_name TEXT,
            invested_permits INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS site_buildings (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            site_id TEXT NOT NULL,
            building_ticker TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS production_orders (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL,
            site_building_id TEXT NOT NULL,
            recipe_name TEXT NOT NULL,
            created_ms INTEGER NOT NULL,
            started_ms INTEGER,
            completion_ms INTEGER,
            duration_ms INTEGER NOT NULL,
            halted INTEGER NOT NULL,
            recurring INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_outputs_material ON recipe_outputs(material_ticker);
        CREATE INDEX IF NOT EXISTS idx_recipe_inputs_recipe ON recipe_inputs(recipe_id);
        CREATE INDEX IF NOT EXISTS idx_site_buildings_site ON site_buildings(site_id);
        CREATE INDEX IF NOT EXISTS idx_production_orders_building ON production_orders(site_building_id);
        "#,
    )?;
    Ok(())
}

/// Clear the stored snapshot (for re-import)
pub fn clear_snapshot(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM production_orders;
        DELETE FROM site_buildings;
        DELETE FROM sites;
        DELETE FROM company;
        DELETE FROM market_quotes;
        DELETE FROM cogc_programs;
        DELETE FROM planet_resources;
        DELETE FROM planets;
        DELETE FROM recipe_outputs;
        DELETE FROM recipe_inputs;
        DELETE FROM recipes;
        DELETE FROM building_workforces;
        DELETE FROM building_costs;
        DELETE FROM buildings;
        DELETE FROM materials;
        "#,
    )?;
    Ok(())
}

/// Store a whole snapshot in one transaction, replacing rows with the same keys
pub fn save_snapshot(conn: &mut Connection, state: &SimulationState) -> Result<()> {
    let tx = conn.transaction()?;

    for m in state.materials.values() {
        tx.execute(
            "INSERT OR REPLACE INTO materials (ticker, id, name, category, weight, volume)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (&m.ticker, &m.id, &m.name, &m.category, m.weight, m.volume),
        )?;
    }

    for b in state.buildings.values() {
        tx.execute(
            "INSERT OR REPLACE INTO buildings (ticker, name, area, expertise) VALUES (?1, ?2, ?3, ?4)",
            (&b.ticker, &b.name, b.area, &b.expertise),
        )?;
        tx.execute("DELETE FROM building_costs WHERE building_ticker = ?1", [&b.ticker])?;
        tx.execute("DELETE FROM building_workforces WHERE building_ticker = ?1", [&b.ticker])?;
        for c in &b.costs {
            tx.execute(
                "INSERT INTO building_costs (building_ticker, material_ticker, amount) VALUES (?1, ?2, ?3)",
                (&b.ticker, &c.material_ticker, c.amount),
            )?;
        }
        for w in &b.workforce {
            tx.execute(
                "INSERT INTO building_workforces (building_ticker, workforce_type, capacity) VALUES (?1, ?2, ?3)",
                (&b.ticker, &w.workforce_type, w.capacity),
            )?;
        }
    }

    for r in &state.recipes {
        insert_recipe(&tx, r)?;
    }

    for p in &state.planets {
        insert_planet(&tx, p)?;
    }

    for q in state.market.values() {
        tx.execute(
            "INSERT OR REPLACE INTO market_quotes (ticker, ask, bid, average) VALUES (?1, ?2, ?3, ?4)",
            (&q.ticker, q.ask, q.bid, q.average),
        )?;
    }

    insert_company(&tx, &state.company, state.current_day)?;

    tx.commit()?;
    Ok(())
}

fn insert_recipe(conn: &Connection, r: &Recipe) -> Result<()> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM recipes WHERE standard_name = ?1",
            [&r.standard_name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        conn.execute("DELETE FROM recipe_inputs WHERE recipe_id = ?1", [id])?;
        conn.execute("DELETE FROM recipe_outputs WHERE recipe_id = ?1", [id])?;
        conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
    }

    conn.execute(
        "INSERT INTO recipes (standard_name, name, building_ticker, duration_ms) VALUES (?1, ?2, ?3, ?4)",
        (&r.standard_name, &r.name, &r.building_ticker, r.duration_ms as i64),
    )?;
    let recipe_id = conn.last_insert_rowid();
    for i in &r.inputs {
        conn.execute(
            "INSERT INTO recipe_inputs (recipe_id, material_ticker, amount) VALUES (?1, ?2, ?3)",
            (recipe_id, &i.material_ticker, i.amount),
        )?;
    }
    for o in &r.outputs {
        conn.execute(
            "INSERT INTO recipe_outputs (recipe_id, material_ticker, amount) VALUES (?1, ?2, ?3)",
            (recipe_id, &o.material_ticker, o.amount),
        )?;
    }
    Ok(())
}

fn insert_planet(conn: &Connection, p: &Planet) -> Result<()> {
    conn.execute("DELETE FROM planet_resources WHERE planet_id = ?1", [&p.id])?;
    conn.execute("DELETE FROM cogc_programs WHERE planet_id = ?1", [&p.id])?;
    conn.execute("DELETE FROM planets WHERE id = ?1", [&p.id])?;
    conn.execute(
        "INSERT INTO planets (id, natural_id, name, fertility, cogc_status, has_local_market, has_chamber_of_commerce)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            &p.id,
            &p.natural_id,
            &p.name,
            p.fertility,
            &p.cogc_status,
            p.has_local_market,
            p.has_chamber_of_commerce,
        ),
    )?;
    for r in &p.resources {
        conn.execute(
            "INSERT INTO planet_resources (planet_id, material_id, resource_type, factor) VALUES (?1, ?2, ?3, ?4)",
            (&p.id, &r.material_id, r.resource_type.as_str(), r.factor),
        )?;
    }
    for c in &p.cogc_programs {
        conn.execute(
            "INSERT INTO cogc_programs (planet_id, program_type, start_ms, end_ms) VALUES (?1, ?2, ?3, ?4)",
            (&p.id, &c.program_type, c.start_ms, c.end_ms),
        )?;
    }
    Ok(())
}

fn insert_company(conn: &Connection, company: &Company, current_day: u32) -> Result<()> {
    conn.execute("DELETE FROM company", [])?;
    conn.execute(
        "INSERT INTO company (id, name, hq_planet_id, current_day) VALUES (?1, ?2, ?3, ?4)",
        (&company.id, &company.name, &company.hq_planet_id, current_day),
    )?;

    for site in &company.sites {
        conn.execute(
            "INSERT OR REPLACE INTO sites (id, planet_id, planet_name, invested_permits) VALUES (?1, ?2, ?3, ?4)",
            (&site.id, &site.planet_id, &site.planet_name, site.invested_permits),
        )?;
        for b in &site.buildings {
            conn.execute(
                "INSERT OR REPLACE INTO site_buildings (id, site_id, building_ticker) VALUES (?1, ?2, ?3)",
                (&b.id, &site.id, &b.building_ticker),
            )?;
            conn.execute("DELETE FROM production_orders WHERE site_building_id = ?1", [&b.id])?;
            for o in &b.orders {
                conn.execute(
                    "INSERT INTO production_orders
                     (id, site_building_id, recipe_name, created_ms, started_ms, completion_ms, duration_ms, halted, recurring)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    (
                        &o.id,
                        &b.id,
                        &o.recipe_name,
                        o.created_ms,
                        o.started_ms,
                        o.completion_ms,
                        o.duration_ms as i64,
                        o.halted,
                        o.recurring,
                    ),
                )?;
            }
        }
    }
    Ok(())
}

/// Load the stored snapshot; `now_ms` becomes the snapshot's reference time
pub fn load_snapshot(conn: &Connection, now_ms: i64) -> Result<SimulationState> {
    let (company, current_day) = load_company(conn)?;
    Ok(SimulationState {
        current_day,
        now_ms,
        materials: load_materials(conn)?,
        buildings: load_buildings(conn)?,
        recipes: load_recipes(conn)?,
        planets: list_planets(conn)?,
        company,
        market: load_market(conn)?,
    })
}

fn load_materials(conn: &Connection) -> Result<BTreeMap<String, Material>> {
    let mut stmt = conn.prepare("SELECT ticker, id, name, category, weight, volume FROM materials")?;
    let rows = stmt.query_map([], |row| {
        Ok(Material {
            ticker: row.get(0)?,
            id: row.get(1)?,
            name: row.get(2)?,
            category: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            weight: row.get::<_, Option<f64>>(4)?.unwrap_or_default(),
            volume: row.get::<_, Option<f64>>(5)?.unwrap_or_default(),
        })
    })?;

    let mut results = BTreeMap::new();
    for row in rows {
        let m = row?;
        results.insert(m.ticker.clone(), m);
    }
    Ok(results)
}

fn load_buildings(conn: &Connection) -> Result<BTreeMap<String, Building>> {
    let mut stmt = conn.prepare("SELECT ticker, name, area, expertise FROM buildings")?;
    let rows = stmt.query_map([], |row| {
        Ok(Building {
            ticker: row.get(0)?,
            name: row.get(1)?,
            area: row.get(2)?,
            expertise: row.get(3)?,
            costs: Vec::new(),
            workforce: Vec::new(),
        })
    })?;
    let mut results = BTreeMap::new();
    for row in rows {
        let b = row?;
        results.insert(b.ticker.clone(), b);
    }

    let mut stmt = conn.prepare(
        "SELECT building_ticker, material_ticker, amount FROM building_costs ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            BuildingCostItem {
                material_ticker: row.get(1)?,
                amount: row.get(2)?,
            },
        ))
    })?;
    for row in rows {
        let (ticker, item) = row?;
        if let Some(b) = results.get_mut(&ticker) {
            b.costs.push(item);
        }
    }

    let mut stmt = conn.prepare(
        "SELECT building_ticker, workforce_type, capacity FROM building_workforces ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            WorkforceRequirement {
                workforce_type: row.get(1)?,
                capacity: row.get(2)?,
            },
        ))
    })?;
    for row in rows {
        let (ticker, req) = row?;
        if let Some(b) = results.get_mut(&ticker) {
            b.workforce.push(req);
        }
    }
    Ok(results)
}

fn load_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(
        "SELECT id, standard_name, name, building_ticker, duration_ms FROM recipes ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            Recipe {
                standard_name: row.get(1)?,
                name: row.get(2)?,
                building_ticker: row.get(3)?,
                duration_ms: row.get::<_, i64>(4)?.max(0) as u64,
                inputs: Vec::new(),
                outputs: Vec::new(),
            },
        ))
    })?;
    let mut recipes = Vec::new();
    for row in rows {
        recipes.push(row?);
    }

    let mut inputs_stmt = conn.prepare(
        "SELECT material_ticker, amount FROM recipe_inputs WHERE recipe_id = ?1 ORDER BY id",
    )?;
    let mut outputs_stmt = conn.prepare(
        "SELECT material_ticker, amount FROM recipe_outputs WHERE recipe_id = ?1 ORDER BY id",
    )?;

    let mut results = Vec::with_capacity(recipes.len());
    for (id, mut recipe) in recipes {
        recipe.inputs = inputs_stmt
            .query_map([id], |row| {
                Ok(RecipeInput {
                    material_ticker: row.get(0)?,
                    amount: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        recipe.outputs = outputs_stmt
            .query_map([id], |row| {
                Ok(RecipeOutput {
                    material_ticker: row.get(0)?,
                    amount: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        results.push(recipe);
    }
    Ok(results)
}

/// List all planets in the database, in stored order
pub fn list_planets(conn: &Connection) -> Result<Vec<Planet>> {
    let mut stmt = conn.prepare(
        "SELECT id, natural_id, name, fertility, cogc_status, has_local_market, has_chamber_of_commerce
         FROM planets ORDER BY seq",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Planet {
            id: row.get(0)?,
            natural_id: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            name: row.get(2)?,
            fertility: row.get::<_, Option<f64>>(3)?.unwrap_or_default(),
            resources: Vec::new(),
            cogc_programs: Vec::new(),
            cogc_status: row.get(4)?,
            has_local_market: row.get(5)?,
            has_chamber_of_commerce: row.get(6)?,
        })
    })?;
    let mut planets = Vec::new();
    for row in rows {
        planets.push(row?);
    }

    let mut resources_stmt = conn.prepare(
        "SELECT material_id, resource_type, factor FROM planet_resources WHERE planet_id = ?1 ORDER BY id",
    )?;
    let mut programs_stmt = conn.prepare(
        "SELECT program_type, start_ms, end_ms FROM cogc_programs WHERE planet_id = ?1 ORDER BY id",
    )?;

    for planet in &mut planets {
        let rows = resources_stmt.query_map([&planet.id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;
        for row in rows {
            let (material_id, kind, factor) = row?;
            match ResourceType::parse(&kind) {
                Some(resource_type) => planet.resources.push(PlanetResource {
                    material_id,
                    resource_type,
                    factor,
                }),
                None => warn!("Unknown resource type {kind} on {}; ignored", planet.name),
            }
        }

        planet.cogc_programs = programs_stmt
            .query_map([&planet.id], |row| {
                Ok(CogcProgram {
                    program_type: row.get(0)?,
                    start_ms: row.get(1)?,
                    end_ms: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
    }
    Ok(planets)
}

fn load_market(conn: &Connection) -> Result<BTreeMap<String, MarketQuote>> {
    let mut stmt = conn.prepare("SELECT ticker, ask, bid, average FROM market_quotes")?;
    let rows = stmt.query_map([], |row| {
        Ok(MarketQuote {
            ticker: row.get(0)?,
            ask: row.get(1)?,
            bid: row.get(2)?,
            average: row.get(3)?,
        })
    })?;
    let mut results = BTreeMap::new();
    for row in rows {
        let q = row?;
        results.insert(q.ticker.clone(), q);
    }
    Ok(results)
}

fn load_company(conn: &Connection) -> Result<(Company, u32)> {
    let row = conn
        .query_row(
            "SELECT id, name, hq_planet_id, current_day FROM company LIMIT 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, u32>(3)?,
                ))
            },
        )
        .optional()?;
    let (id, name, hq_planet_id, current_day) = row.unwrap_or_default();

    let mut stmt = conn.prepare(
        "SELECT id, planet_id, planet_name, invested_permits FROM sites ORDER BY seq",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Site {
            id: row.get(0)?,
            planet_id: row.get(1)?,
            planet_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            invested_permits: row.get(3)?,
            buildings: Vec::new(),
        })
    })?;
    let mut sites = Vec::new();
    for row in rows {
        sites.push(row?);
    }

    let mut buildings_stmt = conn.prepare(
        "SELECT id, building_ticker FROM site_buildings WHERE site_id = ?1 ORDER BY seq",
    )?;
    let mut orders_stmt = conn.prepare(
        "SELECT id, recipe_name, created_ms, started_ms, completion_ms, duration_ms, halted, recurring
         FROM production_orders WHERE site_building_id = ?1 ORDER BY seq",
    )?;

    for site in &mut sites {
        site.buildings = buildings_stmt
            .query_map([&site.id], |row| {
                Ok(BuildingInstance {
                    id: row.get(0)?,
                    building_ticker: row.get(1)?,
                    orders: Vec::new(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for building in &mut site.buildings {
            building.orders = orders_stmt
                .query_map([&building.id], |row| {
                    Ok(ProductionOrder {
                        id: row.get(0)?,
                        recipe_name: row.get(1)?,
                        created_ms: row.get(2)?,
                        started_ms: row.get(3)?,
                        completion_ms: row.get(4)?,
                        duration_ms: row.get::<_, i64>(5)?.max(0) as u64,
                        halted: row.get(6)?,
                        recurring: row.get(7)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
        }
    }

    let company = Company {
        id,
        name: name.unwrap_or_default(),
        hq_planet_id,
        sites,
    };
    Ok((company, current_day))
}

/// List all materials some recipe produces
pub fn list_producible_materials(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT material_ticker FROM recipe_outputs ORDER BY material_ticker",
    )?;

    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}
