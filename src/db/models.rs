use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

/// An auctionable item. `current_price` is seeded from `starting_price` at
/// creation and only ever moves through bidding flows outside this API;
/// updates here never touch it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Item {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) starting_price: f64,
    pub(crate) current_price: f64,
    pub(crate) image_url: Option<String>,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
