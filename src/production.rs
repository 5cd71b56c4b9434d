//! Current production rate from active orders

use crate::models::{MS_PER_DAY, SimulationState};
use crate::trace::SimulationLog;

/// Units of `ticker` produced per day by the company's running orders.
///
/// Only orders that are not halted and have a completion time count. With
/// `site_id` set, only that site is considered. Missing building or recipe
/// definitions are logged and skipped.
pub fn current_production(
    state: &SimulationState,
    ticker: &str,
    site_id: Option<&str>,
    log: &mut SimulationLog,
) -> f64 {
    match site_id {
        Some(site) => log.info(0, format!("--- Current production of {ticker} on site {site} ---")),
        None => log.info(0, format!("--- Current production of {ticker} across all sites ---")),
    }

    let mut total = 0.0;
    for site in &state.company.sites {
        if site_id.is_some_and(|id| id != site.id) {
            continue;
        }
        log.info(1, format!("Site {} on {}", site.id, site.planet_name));

        for instance in &site.buildings {
            let Some(building) = state.buildings.get(&instance.building_ticker) else {
                log.warn(
                    2,
                    format!("Building definition for {} not found.", instance.building_ticker),
                );
                continue;
            };

            for order in instance.orders.iter().filter(|o| o.is_active()) {
                let Some(recipe) = state.recipe(&order.recipe_name) else {
                    log.warn(3, format!("Recipe {} not found.", order.recipe_name));
                    continue;
                };
                let amount = recipe.output_amount(ticker);
                if amount <= 0.0 {
                    continue;
                }
                if order.duration_ms == 0 {
                    log.warn(3, format!("Order {} has zero duration; skipped.", order.id));
                    continue;
                }
                let per_day = amount * (MS_PER_DAY / order.duration_ms as f64);
                total += per_day;
                log.info(
                    3,
                    format!(
                        "Order {}: {:.2} {}/day from {} on site {}",
                        order.id, per_day, ticker, building.name, site.id
                    ),
                );
            }
        }
    }

    log.info(0, format!("--- Current production of {ticker}: {total:.2} units/day ---"));
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductionOrder;
    use crate::test_fixtures::{active_order, rat_state};

    #[test]
    fn sums_active_orders_only() {
        let mut state = rat_state();
        let site = &mut state.company.sites[0];
        site.buildings[0].orders = vec![
            active_order("o1", 3_600_000),
            ProductionOrder { halted: true, ..active_order("o2", 3_600_000) },
            ProductionOrder { completion_ms: None, ..active_order("o3", 3_600_000) },
        ];

        let mut log = SimulationLog::new();
        let rate = current_production(&state, "RAT", None, &mut log);
        assert!((rate - 96.0).abs() < 1e-9);
    }

    #[test]
    fn site_filter_excludes_other_sites() {
        let mut state = rat_state();
        state.company.sites[0].buildings[0].orders = vec![active_order("o1", 3_600_000)];

        let mut log = SimulationLog::new();
        assert!(current_production(&state, "RAT", Some("elsewhere"), &mut log).abs() < 1e-9);
        let own = state.company.sites[0].id.clone();
        assert!((current_production(&state, "RAT", Some(own.as_str()), &mut log) - 96.0).abs() < 1e-9);
    }

    #[test]
    fn missing_recipe_is_logged_not_fatal() {
        let mut state = rat_state();
        let mut order = active_order("o1", 3_600_000);
        order.recipe_name = "FP:=>1xGHOST".into();
        state.company.sites[0].buildings[0].orders = vec![order];

        let mut log = SimulationLog::new();
        let rate = current_production(&state, "RAT", None, &mut log);
        assert!(rate.abs() < 1e-9);
        assert!(log.lines().iter().any(|l| l.contains("Recipe FP:=>1xGHOST not found")));
    }

    #[test]
    fn zero_duration_order_is_skipped() {
        let mut state = rat_state();
        state.company.sites[0].buildings[0].orders = vec![active_order("o1", 0)];

        let mut log = SimulationLog::new();
        assert!(current_production(&state, "RAT", None, &mut log).abs() < 1e-9);
        assert!(log.lines().iter().any(|l| l.contains("zero duration")));
    }
}
