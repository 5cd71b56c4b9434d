//! Planner constants and the housing catalog

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingCapacity {
    pub workforce_type: String,
    pub capacity: f64,
}

/// A housing building and the workforce capacity one unit provides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingSpec {
    pub building_ticker: String,
    pub capacities: Vec<HousingCapacity>,
}

impl HousingSpec {
    fn new(ticker: &str, capacities: &[(&str, f64)]) -> Self {
        Self {
            building_ticker: ticker.to_string(),
            capacities: capacities
                .iter()
                .map(|(wf, cap)| HousingCapacity {
                    workforce_type: (*wf).to_string(),
                    capacity: *cap,
                })
                .collect(),
        }
    }

    /// Total capacity this building offers for `workforce_type`.
    pub fn capacity_for(&self, workforce_type: &str) -> f64 {
        self.capacities
            .iter()
            .filter(|c| c.workforce_type == workforce_type && c.capacity > 0.0)
            .map(|c| c.capacity)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Area available with the first (free) permit.
    pub base_max_area_first_permit: f64,
    pub additional_area_per_permit: f64,
    pub max_additional_permits: u32,
    pub permit_cost: f64,
    /// Area taken by the core module of a new site.
    pub site_base_area_cost: f64,
    pub max_recursion_depth: usize,
    /// Construction cost is spread over this many days of output.
    pub amortization_days: f64,
    /// Recipe duration multiplier under a matching COGC program.
    pub cogc_duration_factor: f64,
    pub housing: Vec<HousingSpec>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_max_area_first_permit: 500.0,
            additional_area_per_permit: 250.0,
            max_additional_permits: 2,
            permit_cost: 50_000.0,
            site_base_area_cost: 25.0,
            max_recursion_depth: 3,
            amortization_days: 365.0,
            cogc_duration_factor: 0.90,
            housing: default_housing(),
        }
    }
}

fn default_housing() -> Vec<HousingSpec> {
    vec![
        HousingSpec::new("HB1", &[("PIONEER", 100.0)]),
        HousingSpec::new("HB2", &[("SETTLER", 100.0)]),
        HousingSpec::new("HB3", &[("TECHNICIAN", 100.0)]),
        HousingSpec::new("HB4", &[("ENGINEER", 100.0)]),
        HousingSpec::new("HB5", &[("SCIENTIST", 100.0)]),
        HousingSpec::new("HBB", &[("PIONEER", 75.0), ("SETTLER", 75.0)]),
        HousingSpec::new("HBC", &[("SETTLER", 75.0), ("TECHNICIAN", 75.0)]),
        HousingSpec::new("HBM", &[("TECHNICIAN", 75.0), ("ENGINEER", 75.0)]),
        HousingSpec::new("HBL", &[("ENGINEER", 75.0), ("SCIENTIST", 75.0)]),
    ]
}

impl PlannerConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: PlannerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_max_area_first_permit <= 0.0 || self.additional_area_per_permit <= 0.0 {
            return Err(PlannerError::InvalidConfig(
                "permit areas must be positive".to_string(),
            ));
        }
        if self.site_base_area_cost < 0.0 || self.site_base_area_cost >= self.max_site_area() {
            return Err(PlannerError::InvalidConfig(format!(
                "site base area {} does not fit in a site of {}",
                self.site_base_area_cost,
                self.max_site_area()
            )));
        }
        if !(self.cogc_duration_factor > 0.0 && self.cogc_duration_factor <= 1.0) {
            return Err(PlannerError::InvalidConfig(format!(
                "cogc_duration_factor must be in (0, 1], got {}",
                self.cogc_duration_factor
            )));
        }
        if self.amortization_days <= 0.0 {
            return Err(PlannerError::InvalidConfig(
                "amortization_days must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Largest site area reachable with every additional permit bought.
    pub fn max_site_area(&self) -> f64 {
        self.base_max_area_first_permit
            + f64::from(self.max_additional_permits) * self.additional_area_per_permit
    }

    /// Area left for production and housing buildings on a fully permitted site.
    pub fn buildable_area(&self) -> f64 {
        self.max_site_area() - self.site_base_area_cost
    }
}
