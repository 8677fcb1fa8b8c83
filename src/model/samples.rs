//! Bundled sample reports and the demo schema they run against.

use super::report::{DefinitionError, ReportDefinition};

/// Names accepted by [`sample`].
pub const SAMPLE_NAMES: &[&str] = &["sales", "inventory", "purchase"];

/// SQLite schema and rows the samples query.
pub const DEMO_SCHEMA: &str = include_str!("../../reports/demo.sql");

const SALES: &str = include_str!("../../reports/sales.json");
const INVENTORY: &str = include_str!("../../reports/inventory.json");
const PURCHASE: &str = include_str!("../../reports/purchase.json");

/// Load a bundled sample report by name.
pub fn sample(name: &str) -> Result<ReportDefinition, DefinitionError> {
    let json = match name {
        "sales" => SALES,
        "inventory" => INVENTORY,
        "purchase" => PURCHASE,
        other => return Err(DefinitionError::UnknownSample(other.to_string())),
    };
    ReportDefinition::from_json(json)
}
