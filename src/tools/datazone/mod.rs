//! Amazon DataZone tools: projects, environments and connections, assets,
//! listings, data sources, subscriptions and form types.
//!
//! Request members use the API's camelCase names.

mod data_management;
mod environment;
mod project_management;

use crate::aws::ClientHandle;
use crate::error::Result;
use crate::registry::ToolRegistry;

const SERVICE: &str = "datazone";
const LABEL: &str = "DataZone";
/// Upper bound DataZone accepts for `maxResults` on list and search calls.
const MAX_PAGE_SIZE: u32 = 50;

pub fn register(registry: &ToolRegistry, client: ClientHandle) -> Result<()> {
    project_management::register(registry, client.clone())?;
    environment::register(registry, client.clone())?;
    data_management::register(registry, client)?;
    Ok(())
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}
