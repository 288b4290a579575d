use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Item;

const ITEM_COLUMNS: &str = "id, name, description, starting_price, current_price, image_url, \
                            end_time, created_at, updated_at";

/// Column values for an insert. Required columns are still `Option` here:
/// absent input is bound as NULL so the store's NOT NULL constraints decide,
/// rather than handler-side validation.
pub(crate) struct CreateItem<'a> {
    pub(crate) name: Option<&'a str>,
    pub(crate) description: Option<&'a str>,
    pub(crate) starting_price: Option<f64>,
    pub(crate) current_price: Option<f64>,
    pub(crate) image_url: Option<&'a str>,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Update overwrites exactly these columns; `current_price` and `image_url`
/// are deliberately absent from the statement.
pub(crate) struct UpdateItem<'a> {
    pub(crate) name: Option<&'a str>,
    pub(crate) description: Option<&'a str>,
    pub(crate) starting_price: Option<f64>,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One optional field per supported list query parameter.
#[derive(Debug, Default)]
pub(crate) struct ItemFilter {
    pub(crate) name: Option<String>,
    pub(crate) min_price: Option<f64>,
    pub(crate) max_price: Option<f64>,
    pub(crate) end_time: Option<PrimitiveDateTime>,
}

/// Pure translation of the filter into SQL predicates; shared by the count
/// and the page query so both always agree.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ItemFilter) {
    let mut prefix = " WHERE ";

    if let Some(name) = &filter.name {
        builder.push(prefix).push("name ILIKE ").push_bind(format!("%{name}%"));
        prefix = " AND ";
    }
    if let Some(min_price) = filter.min_price {
        builder.push(prefix).push("current_price >= ").push_bind(min_price);
        prefix = " AND ";
    }
    if let Some(max_price) = filter.max_price {
        builder.push(prefix).push("current_price <= ").push_bind(max_price);
        prefix = " AND ";
    }
    if let Some(end_time) = filter.end_time {
        builder.push(prefix).push("end_time <= ").push_bind(end_time);
    }
}

pub(crate) async fn create(pool: &PgPool, params: CreateItem<'_>) -> Result<Item, sqlx::Error> {
    sqlx::query_as::<_, Item>(&format!(
        "INSERT INTO items (
            name, description, starting_price, current_price, image_url, end_time,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         RETURNING {ITEM_COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.description)
    .bind(params.starting_price)
    .bind(params.current_price)
    .bind(params.image_url)
    .bind(params.end_time)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, item_id: i64) -> Result<Option<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
        .bind(item_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn count(pool: &PgPool, filter: &ItemFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
    push_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Limit and offset are passed through unclamped; degenerate values surface
/// as the store's own error.
pub(crate) async fn list(
    pool: &PgPool,
    filter: &ItemFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Item>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {ITEM_COLUMNS} FROM items"));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY id");
    builder.push(" LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    builder.build_query_as::<Item>().fetch_all(pool).await
}

pub(crate) async fn update(
    pool: &PgPool,
    item_id: i64,
    params: UpdateItem<'_>,
) -> Result<Item, sqlx::Error> {
    sqlx::query_as::<_, Item>(&format!(
        "UPDATE items SET
            name = $1,
            description = $2,
            starting_price = $3,
            end_time = $4,
            updated_at = $5
         WHERE id = $6
         RETURNING {ITEM_COLUMNS}",
    ))
    .bind(params.name)
    .bind(params.description)
    .bind(params.starting_price)
    .bind(params.end_time)
    .bind(params.updated_at)
    .bind(item_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, item_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM items WHERE id = $1").bind(item_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_filter_empty_adds_no_predicates() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
        push_filter(&mut builder, &ItemFilter::default());
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM items");
    }

    #[test]
    fn push_filter_combines_predicates_with_and() {
        let filter = ItemFilter {
            name: Some("vase".to_string()),
            min_price: Some(50.0),
            max_price: Some(200.0),
            end_time: None,
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
        push_filter(&mut builder, &filter);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM items WHERE name ILIKE $1 \
             AND current_price >= $2 AND current_price <= $3"
        );
    }

    #[test]
    fn push_filter_end_time_only() {
        let filter = ItemFilter {
            end_time: crate::core::time::parse_flexible_timestamp("2025-01-01"),
            ..ItemFilter::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
        push_filter(&mut builder, &filter);
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM items WHERE end_time <= $1");
    }
}
