use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::Item;

/// Update body. Absent fields overwrite their column with NULL; the store
/// rejects a NULL name or starting_price.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) starting_price: Option<f64>,
    #[serde(default)]
    pub(crate) end_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ItemResponse {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) starting_price: f64,
    pub(crate) current_price: f64,
    pub(crate) image_url: Option<String>,
    pub(crate) end_time: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ItemResponse {
    pub(crate) fn from_db(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            starting_price: item.starting_price,
            current_price: item.current_price,
            image_url: item.image_url,
            end_time: item.end_time.map(format_primitive),
            created_at: format_primitive(item.created_at),
            updated_at: format_primitive(item.updated_at),
        }
    }
}

/// List envelope; the camelCase keys are the wire contract.
#[derive(Debug, Serialize)]
pub(crate) struct ItemListResponse {
    pub(crate) items: Vec<ItemResponse>,
    #[serde(rename = "currentPage")]
    pub(crate) current_page: i64,
    #[serde(rename = "totalPages")]
    pub(crate) total_pages: i64,
    #[serde(rename = "totalItems")]
    pub(crate) total_items: i64,
}
