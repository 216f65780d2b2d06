use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::restaurant::{parse_restaurant_id, Restaurant, RestaurantPatch};
use crate::search::{self, SearchRequest};
use crate::store::RestaurantStore;

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RestaurantStore>,
    project_menu_items: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn RestaurantStore>, project_menu_items: bool) -> Self {
        Self {
            store,
            project_menu_items,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/restaurant", post(create_restaurant))
        .route("/restaurant/search", post(search_restaurants))
        .route(
            "/restaurant/:restaurant_id",
            get(get_restaurant)
                .put(update_restaurant)
                .delete(delete_restaurant),
        )
        .with_state(state)
}

/// Unwraps a JSON body. A request sent without a JSON content type carries
/// no fields, so it reads as an empty object.
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> AppResult<Value> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(Value::Object(Map::new())),
        Err(rejection) => Err(AppError::InvalidInput(rejection.body_text())),
    }
}

#[tracing::instrument(skip(state))]
async fn get_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> AppResult<Json<Restaurant>> {
    let id = parse_restaurant_id(&restaurant_id)?;
    let restaurant = state
        .store
        .get(id)
        .await?
        .ok_or(AppError::RestaurantNotFound(restaurant_id))?;

    Ok(Json(restaurant))
}

#[tracing::instrument(skip_all)]
async fn create_restaurant(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Restaurant>)> {
    let fields = RestaurantPatch::from_json(json_body(payload)?)?;
    let restaurant = state.store.create(fields).await?;

    info!(id = %restaurant.id, "Created restaurant");
    Ok((StatusCode::CREATED, Json(restaurant)))
}

#[tracing::instrument(skip(state, payload))]
async fn update_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Restaurant>> {
    let restaurant = merge_restaurant(&state, restaurant_id, payload)
        .await
        .map_err(AppError::into_update_failure)?;

    info!(id = %restaurant.id, "Updated restaurant");
    Ok(Json(restaurant))
}

async fn merge_restaurant(
    state: &AppState,
    restaurant_id: String,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Restaurant> {
    let id = parse_restaurant_id(&restaurant_id)?;
    let body = json_body(payload)?;

    let mut restaurant = state
        .store
        .get(id)
        .await?
        .ok_or(AppError::RestaurantNotFound(restaurant_id))?;
    RestaurantPatch::from_json(body)?.apply(&mut restaurant);
    state.store.replace(&restaurant).await?;
    Ok(restaurant)
}

#[tracing::instrument(skip(state))]
async fn delete_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_restaurant_id(&restaurant_id)?;
    if !state.store.delete(id).await? {
        return Err(AppError::RestaurantNotFound(restaurant_id));
    }

    info!(%id, "Deleted restaurant");
    Ok(Json(MessageResponse {
        message: "Restaurant deleted".to_string(),
    }))
}

#[tracing::instrument(skip_all)]
async fn search_restaurants(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<Vec<Restaurant>>> {
    let request = SearchRequest::from_json(json_body(payload)?)?;
    let restaurants =
        search::search(state.store.as_ref(), request, state.project_menu_items).await?;

    Ok(Json(restaurants))
}
