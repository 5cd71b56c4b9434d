//! Planet suitability and expansion-planet selection

use rand::Rng;
use rand::seq::SliceRandom;

use crate::category::Category;
use crate::models::{Planet, ResourceType, SimulationState};
use crate::trace::SimulationLog;

/// Resource type an extraction building works, by ticker.
fn extractor_resource_type(building_ticker: &str) -> Option<ResourceType> {
    match building_ticker.to_ascii_uppercase().as_str() {
        "RIG" => Some(ResourceType::Liquid),
        "EXT" | "EXTRACTOR" => Some(ResourceType::Mineral),
        "COL" | "COLLECTOR" => Some(ResourceType::Gaseous),
        _ => None,
    }
}

/// Material id the extraction building yields: the first output of its first recipe.
fn extracted_material_id<'a>(state: &'a SimulationState, building_ticker: &str) -> Option<&'a str> {
    let ticker = state
        .recipes
        .iter()
        .filter(|r| r.building_ticker == building_ticker)
        .find_map(|r| r.outputs.first())
        .map(|o| o.material_ticker.as_str())?;
    state.material_by_ticker(ticker).map(|m| m.id.as_str())
}

fn suits_extraction(state: &SimulationState, planet: &Planet, building_ticker: Option<&str>) -> bool {
    let target = building_ticker.and_then(|b| extracted_material_id(state, b).map(|id| (b, id)));
    match target {
        Some((building, material_id)) => {
            // Only RIG, EXT and COL can extract.
            let Some(kind) = extractor_resource_type(building) else {
                return false;
            };
            planet.resources.iter().any(|r| {
                r.material_id == material_id && r.factor > 0.0 && r.resource_type == kind
            })
        }
        None => planet.resources.iter().any(|r| r.factor > 0.0),
    }
}

/// Whether `planet` may host a building of `category`.
pub fn is_suitable(
    state: &SimulationState,
    planet: &Planet,
    category: Option<&Category>,
    building_ticker: Option<&str>,
) -> bool {
    match category {
        Some(Category::Agriculture) => planet.fertility > 0.0,
        Some(Category::ResourceExtraction) => suits_extraction(state, planet, building_ticker),
        Some(c) if c.is_industrial() => {
            has_matching_cogc(state, planet, Some(c))
                || planet.has_local_market
                || planet.has_chamber_of_commerce
        }
        _ => true,
    }
}

/// Whether `planet` runs the COGC program boosting `category` right now.
pub fn has_matching_cogc(state: &SimulationState, planet: &Planet, category: Option<&Category>) -> bool {
    category.is_some_and(|c| planet.active_programs(state.now_ms).any(|p| c.is_boosted_by(p)))
}

/// Pick a planet to expand onto for `category`.
///
/// Planets with an active matching COGC program form the preferred tier;
/// the winner is drawn uniformly from the best non-empty tier.
pub fn select_expansion_planet<'a, R: Rng + ?Sized>(
    state: &'a SimulationState,
    category: Option<&Category>,
    building_ticker: Option<&str>,
    rng: &mut R,
    log: &mut SimulationLog,
    depth: usize,
) -> Option<&'a Planet> {
    let label = category.map_or("ANY", Category::as_str);
    log.info(
        depth,
        format!(
            "Searching expansion planet for {label} (building {})",
            building_ticker.unwrap_or("-")
        ),
    );

    let candidates: Vec<&Planet> = state
        .planets
        .iter()
        .filter(|p| is_suitable(state, p, category, building_ticker))
        .collect();

    if candidates.is_empty() {
        log.info(depth, "No suitable expansion planet found.");
        return None;
    }

    let preferred: Vec<&Planet> = candidates
        .iter()
        .copied()
        .filter(|p| has_matching_cogc(state, p, category))
        .collect();

    let (tier, label) = if preferred.is_empty() {
        (candidates, "general")
    } else {
        (preferred, "COGC-preferred")
    };
    let chosen = tier.choose(rng).copied()?;
    log.info(
        depth,
        format!("Expansion planet ({label}): {} ({})", chosen.name, chosen.id),
    );
    Some(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanetResource;
    use crate::test_fixtures::{active_cogc, building, material, planet, rat_state, recipe};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn agriculture_needs_fertility() {
        let state = rat_state();
        let cat = Some(&Category::Agriculture);
        assert!(is_suitable(&state, &state.planets[0], cat, None));
        assert!(!is_suitable(&state, &state.planets[1], cat, None));
        assert!(!is_suitable(&state, &state.planets[2], cat, None));
    }

    #[test]
    fn extraction_matches_material_and_resource_type() {
        let state = rat_state();
        let cat = Some(&Category::ResourceExtraction);
        // Montem has FEO as a mineral, Vallis only as a gas.
        assert!(is_suitable(&state, &state.planets[0], cat, Some("EXT")));
        assert!(!is_suitable(&state, &state.planets[2], cat, Some("EXT")));
        assert!(!is_suitable(&state, &state.planets[1], cat, Some("EXT")));
    }

    #[test]
    fn rig_needs_a_liquid_deposit() {
        let mut state = rat_state();
        state.materials.insert("H2O".into(), material("mat-h2o", "H2O"));
        state
            .buildings
            .insert("RIG".into(), building("RIG", 15.0, Some("RESOURCE_EXTRACTION"), &[], &[]));
        state.recipes.push(recipe("RIG:=>1xH2O", "RIG", 3_600_000, &[], &[("H2O", 1.0)]));
        let water = |resource_type| PlanetResource {
            material_id: "mat-h2o".to_string(),
            resource_type,
            factor: 0.4,
        };
        state.planets[0].resources.push(water(ResourceType::Liquid));
        state.planets[2].resources.push(water(ResourceType::Mineral));

        let cat = Some(&Category::ResourceExtraction);
        assert!(is_suitable(&state, &state.planets[0], cat, Some("RIG")));
        assert!(!is_suitable(&state, &state.planets[2], cat, Some("RIG")));
    }

    #[test]
    fn unknown_extractor_is_never_suitable() {
        let mut state = rat_state();
        state
            .buildings
            .insert("DRL".into(), building("DRL", 20.0, Some("RESOURCE_EXTRACTION"), &[], &[]));
        state.recipes.push(recipe("DRL:=>1xFEO", "DRL", 3_600_000, &[], &[("FEO", 1.0)]));

        let cat = Some(&Category::ResourceExtraction);
        // FEO is on Montem as a mineral and on Vallis as a gas.
        assert!(!is_suitable(&state, &state.planets[0], cat, Some("DRL")));
        assert!(!is_suitable(&state, &state.planets[2], cat, Some("DRL")));
    }

    #[test]
    fn cogc_matches_alternate_category_spelling() {
        let mut state = rat_state();
        let mut p = planet("p-x", "X");
        p.cogc_status = Some("ACTIVE".to_string());
        p.cogc_programs = vec![active_cogc("ADVERTISING_METALURGY")];
        state.planets = vec![p.clone()];

        let metallurgy = Category::from_expertise("METALURGY");
        assert!(has_matching_cogc(&state, &p, metallurgy.as_ref()));
        assert!(is_suitable(&state, &p, metallurgy.as_ref(), Some("SME")));
        assert!(!has_matching_cogc(&state, &p, Some(&Category::Refining)));
    }

    #[test]
    fn extraction_without_known_output_accepts_any_resource() {
        let state = rat_state();
        let cat = Some(&Category::ResourceExtraction);
        assert!(is_suitable(&state, &state.planets[2], cat, Some("COL")));
        assert!(is_suitable(&state, &state.planets[2], cat, None));
        assert!(!is_suitable(&state, &state.planets[1], cat, None));
    }

    #[test]
    fn industrial_needs_cogc_or_infrastructure() {
        let state = rat_state();
        let cat = Some(&Category::FoodProcessing);
        assert!(is_suitable(&state, &state.planets[0], cat, Some("FP")));
        assert!(is_suitable(&state, &state.planets[1], cat, Some("FP")));
        assert!(!is_suitable(&state, &state.planets[2], cat, Some("FP")));
        assert!(is_suitable(&state, &state.planets[2], None, None));
    }

    #[test]
    fn expired_or_inactive_program_does_not_count() {
        let mut state = rat_state();
        let mut p = planet("p-x", "X");
        p.cogc_programs = vec![active_cogc("ADVERTISING_FOOD_PROCESSING")];
        p.cogc_status = Some("VOTING".to_string());
        state.planets = vec![p.clone()];
        assert!(!has_matching_cogc(&state, &p, Some(&Category::FoodProcessing)));

        p.cogc_status = Some("ACTIVE".to_string());
        state.now_ms += 10_000;
        assert!(!has_matching_cogc(&state, &p, Some(&Category::FoodProcessing)));
    }

    #[test]
    fn cogc_tier_is_strictly_preferred() {
        let state = rat_state();
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut log = SimulationLog::new();
            let chosen = select_expansion_planet(
                &state,
                Some(&Category::FoodProcessing),
                Some("FP"),
                &mut rng,
                &mut log,
                0,
            )
            .unwrap();
            assert_eq!(chosen.id, "p-promitor");
        }
    }

    #[test]
    fn same_seed_same_choice() {
        let state = rat_state();
        let pick = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut log = SimulationLog::new();
            select_expansion_planet(&state, None, None, &mut rng, &mut log, 0)
                .map(|p| p.id.clone())
        };
        assert_eq!(pick(7), pick(7));
    }

    #[test]
    fn no_candidate_returns_none() {
        let mut state = rat_state();
        state.planets.retain(|p| p.fertility <= 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut log = SimulationLog::new();
        assert!(
            select_expansion_planet(&state, Some(&Category::Agriculture), None, &mut rng, &mut log, 0)
                .is_none()
        );
    }
}
