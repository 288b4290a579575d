use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::{require_role, CurrentUser, ITEM_WRITE_ROLES};
use crate::core::state::AppState;
use crate::core::time::{parse_flexible_timestamp, primitive_now_utc};
use crate::repositories::items::{self, CreateItem, ItemFilter, UpdateItem};
use crate::schemas::item::{ItemListResponse, ItemResponse, ItemUpdate};

const ITEM_NOT_FOUND: &str = "Item not found";
const IMAGE_FIELD: &str = "image";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:item_id", get(get_item).put(update_item).delete(delete_item))
}

const fn default_page() -> i64 {
    1
}

const fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
struct ItemListQuery {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    min_price: Option<f64>,
    #[serde(default)]
    max_price: Option<f64>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn parse_end_time(raw: Option<&str>) -> Result<Option<time::PrimitiveDateTime>, ApiError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    parse_flexible_timestamp(raw).map(Some).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "end_time must be an RFC 3339 timestamp or YYYY-MM-DD date, got '{raw}'"
        ))
    })
}

fn total_pages(total_items: i64, limit: i64) -> i64 {
    if limit > 0 {
        (total_items + limit - 1) / limit
    } else {
        0
    }
}

async fn list_items(
    Query(params): Query<ItemListQuery>,
    State(state): State<AppState>,
) -> Result<Json<ItemListResponse>, ApiError> {
    let filter = ItemFilter {
        name: params.name,
        min_price: params.min_price,
        max_price: params.max_price,
        end_time: parse_end_time(params.end_time.as_deref())?,
    };

    // page and limit are taken as-is; out-of-range values fail in the store
    // and come back as the 400 below.
    let offset = (params.page - 1) * params.limit;

    let total_items = items::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let rows = items::list(state.db(), &filter, params.limit, offset)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(ItemListResponse {
        items: rows.into_iter().map(ItemResponse::from_db).collect(),
        current_page: params.page,
        total_pages: total_pages(total_items, params.limit),
        total_items,
    }))
}

async fn get_item(
    Path(item_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = items::find_by_id(state.db(), item_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch item"))?
        .ok_or_else(|| ApiError::NotFound(ITEM_NOT_FOUND.to_string()))?;

    Ok(Json(ItemResponse::from_db(item)))
}

/// Text fields and the optional image drained from the create form. Absent
/// required fields stay `None` so the store decides.
#[derive(Debug, Default)]
struct CreateForm {
    name: Option<String>,
    description: Option<String>,
    starting_price: Option<String>,
    end_time: Option<String>,
    image: Option<(String, Vec<u8>)>,
}

async fn read_create_form(multipart: &mut Multipart, max_bytes: u64) -> Result<CreateForm, ApiError> {
    let mut form = CreateForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name == IMAGE_FIELD {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let mut bytes = Vec::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|_| ApiError::BadRequest("Failed to read uploaded file".to_string()))?
            {
                if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                    return Err(ApiError::BadRequest(format!(
                        "File size exceeds {}MB limit",
                        max_bytes / (1024 * 1024)
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }
            form.image = Some((filename, bytes));
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|_| ApiError::BadRequest(format!("Invalid value for field '{field_name}'")))?;
        match field_name.as_str() {
            "name" => form.name = Some(text),
            "description" => form.description = Some(text),
            "starting_price" => form.starting_price = Some(text),
            "end_time" => form.end_time = Some(text),
            _ => {}
        }
    }

    Ok(form)
}

async fn create_item(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    require_role(&user, ITEM_WRITE_ROLES)?;

    let form =
        read_create_form(&mut multipart, state.settings().storage().max_upload_bytes()).await?;

    let starting_price = form
        .starting_price
        .as_deref()
        .map(|raw| {
            raw.parse::<f64>().map_err(|_| {
                ApiError::BadRequest(format!("starting_price must be a number, got '{raw}'"))
            })
        })
        .transpose()?;
    let end_time = parse_end_time(form.end_time.as_deref())?;

    let image_url = match form.image {
        Some((filename, bytes)) => Some(
            state
                .storage()
                .store(&filename, bytes)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to persist uploaded image"))?,
        ),
        None => None,
    };

    let now = primitive_now_utc();
    let item = items::create(
        state.db(),
        CreateItem {
            name: form.name.as_deref(),
            description: form.description.as_deref(),
            starting_price,
            // Seeded once here; update never touches it.
            current_price: starting_price,
            image_url: image_url.as_deref(),
            end_time,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(user_id = %user.id, item_id = item.id, "Item created");

    Ok((StatusCode::CREATED, Json(ItemResponse::from_db(item))))
}

async fn update_item(
    Path(item_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ItemUpdate>,
) -> Result<Json<ItemResponse>, ApiError> {
    require_role(&user, ITEM_WRITE_ROLES)?;

    let existing = items::find_by_id(state.db(), item_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch item"))?;
    if existing.is_none() {
        return Err(ApiError::NotFound(ITEM_NOT_FOUND.to_string()));
    }

    let end_time = parse_end_time(payload.end_time.as_deref())?;

    let item = items::update(
        state.db(),
        item_id,
        UpdateItem {
            name: payload.name.as_deref(),
            description: payload.description.as_deref(),
            starting_price: payload.starting_price,
            end_time,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(ItemResponse::from_db(item)))
}

async fn delete_item(
    Path(item_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_role(&user, ITEM_WRITE_ROLES)?;

    let existing = items::find_by_id(state.db(), item_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch item"))?;
    if existing.is_none() {
        return Err(ApiError::NotFound(ITEM_NOT_FOUND.to_string()));
    }

    let deleted = items::delete(state.db(), item_id)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if !deleted {
        // Raced with a concurrent delete between the fetch and here.
        return Err(ApiError::NotFound(ITEM_NOT_FOUND.to_string()));
    }

    tracing::info!(user_id = %user.id, item_id = item_id, "Item deleted");

    Ok(Json(serde_json::json!({ "message": "Item deleted" })))
}


#[cfg(test)]
mod unit_tests {
    use super::total_pages;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(12, 5), 3);
        assert_eq!(total_pages(10, 5), 2);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(0, 10), 0);
    }

    #[test]
    fn total_pages_degenerate_limit_reports_zero() {
        assert_eq!(total_pages(12, 0), 0);
        assert_eq!(total_pages(12, -3), 0);
    }
}
