//! Market price lookups

use crate::models::{Building, SimulationState};
use crate::trace::SimulationLog;

/// Buy price for one unit of `ticker`: ask, else bid, else average.
pub fn buy_price(state: &SimulationState, ticker: &str) -> Option<f64> {
    state.quote(ticker).and_then(|q| q.price())
}

/// One-time construction cost of `building` at current market prices.
///
/// Bill-of-materials items without a usable quote are priced at zero and logged.
pub fn construction_cost(
    state: &SimulationState,
    building: &Building,
    log: &mut SimulationLog,
    depth: usize,
) -> f64 {
    let mut total = 0.0;
    for item in &building.costs {
        match buy_price(state, &item.material_ticker) {
            Some(price) => total += item.amount * price,
            None => log.warn(
                depth,
                format!(
                    "No market price for construction material {} of {}; counted as free.",
                    item.material_ticker, building.ticker
                ),
            ),
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuildingCostItem, MarketQuote};

    fn quote(ticker: &str, ask: Option<f64>, bid: Option<f64>, average: Option<f64>) -> MarketQuote {
        MarketQuote {
            ticker: ticker.to_string(),
            ask,
            bid,
            average,
        }
    }

    #[test]
    fn price_falls_back_from_ask_to_average() {
        let mut state = SimulationState::default();
        state.market.insert("A".into(), quote("A", Some(10.0), Some(8.0), Some(9.0)));
        state.market.insert("B".into(), quote("B", None, Some(8.0), Some(9.0)));
        state.market.insert("C".into(), quote("C", None, None, Some(9.0)));
        state.market.insert("D".into(), quote("D", None, None, None));

        assert_eq!(buy_price(&state, "A"), Some(10.0));
        assert_eq!(buy_price(&state, "B"), Some(8.0));
        assert_eq!(buy_price(&state, "C"), Some(9.0));
        assert_eq!(buy_price(&state, "D"), None);
        assert_eq!(buy_price(&state, "E"), None);
    }

    #[test]
    fn construction_cost_skips_unpriced_items() {
        let mut state = SimulationState::default();
        state.market.insert("BSE".into(), quote("BSE", Some(100.0), None, None));
        let building = Building {
            ticker: "FP".into(),
            name: "Food Processor".into(),
            area: 50.0,
            expertise: None,
            costs: vec![
                BuildingCostItem { material_ticker: "BSE".into(), amount: 4.0 },
                BuildingCostItem { material_ticker: "XYZ".into(), amount: 2.0 },
            ],
            workforce: vec![],
        };
        let mut log = SimulationLog::new();
        let cost = construction_cost(&state, &building, &mut log, 0);
        assert!((cost - 400.0).abs() < 1e-9);
        assert_eq!(log.lines().len(), 1);
    }
}
