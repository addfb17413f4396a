use std::fmt;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// The five business datasets carried by every service level report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    MasterData,
    ServiceLevel,
    ServiceGroup,
    Forecast,
    Customer,
}

impl Entity {
    /// Extraction and commit order.
    pub const ALL: [Entity; 5] = [
        Entity::MasterData,
        Entity::ServiceLevel,
        Entity::ServiceGroup,
        Entity::Forecast,
        Entity::Customer,
    ];

    /// Warehouse table name, also used as the entity name in export keys.
    pub fn table_name(&self) -> &'static str {
        match self {
            Entity::MasterData => "hilton_masterdata",
            Entity::ServiceLevel => "hilton_servicelevel",
            Entity::ServiceGroup => "hilton_servicegroup",
            Entity::Forecast => "hilton_forecast",
            Entity::Customer => "hilton_customer",
        }
    }

    pub fn sheet_name(&self) -> &'static str {
        match self {
            Entity::MasterData => "Master Data",
            Entity::ServiceLevel => "Service Level Data",
            Entity::ServiceGroup => "Service Group",
            Entity::Forecast => "Forecast Data",
            Entity::Customer => "Customer Master",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    Truganina,
    Heathwood,
    Bunbury,
    Other,
}

impl Site {
    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Truganina => "Truganina",
            Site::Heathwood => "Heathwood",
            Site::Bunbury => "Bunbury",
            Site::Other => "Other",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entity's rows as read from its sheet, with `filename_date` and
/// `filename_site` already attached.
#[derive(Debug, Clone)]
pub struct EntityFrame {
    pub entity: Entity,
    pub df: DataFrame,
}
