//! Standard recipe name parsing
//!
//! Recipes are identified by names such as `FP:2xH2O-1xNUT=>4xRAT`: the
//! building ticker, then `-` or `+` separated `<amount>x<TICKER>` items for the
//! inputs and the outputs. Either side may be empty, as in `RIG:=>`.

use regex::Regex;

use crate::error::{PlannerError, Result};
use crate::models::{RecipeInput, RecipeOutput};

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecipeName {
    pub building_ticker: String,
    pub inputs: Vec<(String, f64)>,
    pub outputs: Vec<(String, f64)>,
}

impl ParsedRecipeName {
    pub fn recipe_inputs(&self) -> Vec<RecipeInput> {
        self.inputs
            .iter()
            .map(|(ticker, amount)| RecipeInput {
                material_ticker: ticker.clone(),
                amount: *amount,
            })
            .collect()
    }

    pub fn recipe_outputs(&self) -> Vec<RecipeOutput> {
        self.outputs
            .iter()
            .map(|(ticker, amount)| RecipeOutput {
                material_ticker: ticker.clone(),
                amount: *amount,
            })
            .collect()
    }
}

pub fn parse_standard_recipe_name(name: &str) -> Result<ParsedRecipeName> {
    let invalid = |reason: &str| PlannerError::InvalidRecipeName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let name_re = Regex::new(r"^\s*([^:]*):(.*)=>(.*)$")?;
    let Some(cap) = name_re.captures(name) else {
        return Err(invalid("expected '<BUILDING>:<inputs>=><outputs>'"));
    };

    let building_ticker = cap[1].trim();
    if building_ticker.is_empty() {
        return Err(invalid("empty building ticker"));
    }

    // Pattern: 2xH2O or 0.5xHE3
    let item_re = Regex::new(r"^(\d+(?:\.\d+)?)x([A-Za-z0-9]+)$")?;
    let parse_side = |side: &str| -> Result<Vec<(String, f64)>> {
        let side = side.trim();
        if side.is_empty() {
            return Ok(Vec::new());
        }
        side.split(['-', '+'])
            .map(|item| {
                let item = item.trim();
                let cap = item_re
                    .captures(item)
                    .ok_or_else(|| invalid(&format!("bad item '{item}'")))?;
                let amount = cap[1]
                    .parse::<f64>()
                    .map_err(|e| invalid(&format!("bad amount in '{item}': {e}")))?;
                Ok((cap[2].to_string(), amount))
            })
            .collect()
    };

    Ok(ParsedRecipeName {
        building_ticker: building_ticker.to_string(),
        inputs: parse_side(&cap[2])?,
        outputs: parse_side(&cap[3])?,
    })
}
