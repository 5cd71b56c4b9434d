//! Production categories derived from building expertise

use std::fmt;

use crate::models::SimulationState;
use crate::trace::SimulationLog;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Agriculture,
    ResourceExtraction,
    Metallurgy,
    Refining,
    Chemical,
    FoodProcessing,
    ProcessedGood,
    Recycling,
    /// Any other expertise, upper-cased. No suitability rule applies to it.
    Other(String),
}

impl Category {
    /// Case- and separator-insensitive parse of an expertise string.
    pub fn from_expertise(expertise: &str) -> Option<Self> {
        let normalized = expertise.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        if normalized.is_empty() {
            return None;
        }
        Some(match normalized.as_str() {
            "AGRICULTURE" => Category::Agriculture,
            "RESOURCE_EXTRACTION" => Category::ResourceExtraction,
            "METALLURGY" | "METALURGY" => Category::Metallurgy,
            "REFINING" => Category::Refining,
            "CHEMICAL" | "CHEMISTRY" => Category::Chemical,
            "FOOD_PROCESSING" => Category::FoodProcessing,
            "PROCESSED_GOOD" | "PROCESSED_GOODS" => Category::ProcessedGood,
            "RECYCLING" => Category::Recycling,
            _ => Category::Other(normalized),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Agriculture => "AGRICULTURE",
            Category::ResourceExtraction => "RESOURCE_EXTRACTION",
            Category::Metallurgy => "METALLURGY",
            Category::Refining => "REFINING",
            Category::Chemical => "CHEMICAL",
            Category::FoodProcessing => "FOOD_PROCESSING",
            Category::ProcessedGood => "PROCESSED_GOOD",
            Category::Recycling => "RECYCLING",
            Category::Other(s) => s,
        }
    }

    /// Expertise spellings that name this category in game data.
    fn spellings(&self) -> &[&str] {
        match self {
            Category::Metallurgy => &["METALLURGY", "METALURGY"],
            Category::Chemical => &["CHEMICAL", "CHEMISTRY"],
            Category::ProcessedGood => &["PROCESSED_GOOD", "PROCESSED_GOODS"],
            _ => &[],
        }
    }

    /// COGC program that boosts this category.
    pub fn cogc_program(&self) -> String {
        format!("ADVERTISING_{}", self.as_str())
    }

    /// Whether `program_type` is the boosting program, under any spelling of the category.
    pub fn is_boosted_by(&self, program_type: &str) -> bool {
        let program = program_type.trim().to_ascii_uppercase();
        if program == self.cogc_program() {
            return true;
        }
        program
            .strip_prefix("ADVERTISING_")
            .is_some_and(|suffix| self.spellings().contains(&suffix))
    }

    /// Processing categories that need industrial infrastructure or a COGC program.
    pub fn is_industrial(&self) -> bool {
        matches!(
            self,
            Category::Metallurgy
                | Category::Refining
                | Category::Chemical
                | Category::FoodProcessing
                | Category::ProcessedGood
                | Category::Recycling
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of the building that produces `material_ticker`.
///
/// Producing buildings are tried in recipe order; the first with a non-empty
/// expertise wins.
pub fn category_of_material(
    state: &SimulationState,
    material_ticker: &str,
    log: &mut SimulationLog,
    depth: usize,
) -> Option<Category> {
    let mut any_producer = false;
    for recipe in state.recipes_producing(material_ticker) {
        any_producer = true;
        let category = state
            .buildings
            .get(&recipe.building_ticker)
            .and_then(|b| b.expertise.as_deref())
            .and_then(Category::from_expertise);
        if let Some(category) = category {
            log.info(
                depth,
                format!("{material_ticker} is produced by {} ({category}).", recipe.building_ticker),
            );
            return Some(category);
        }
    }

    if any_producer {
        log.warn(
            depth,
            format!("No expertise known for producers of {material_ticker}; no COGC bonus applies."),
        );
    } else {
        log.info(depth, format!("No recipe produces {material_ticker}; it has no category."));
    }
    None
}

/// Category of a building from its own expertise.
pub fn category_of_building(state: &SimulationState, building_ticker: &str) -> Option<Category> {
    state
        .buildings
        .get(building_ticker)
        .and_then(|b| b.expertise.as_deref())
        .and_then(Category::from_expertise)
}
