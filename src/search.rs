use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::restaurant::{cast_text, CastErrors, Restaurant};
use crate::store::RestaurantStore;

/// Body of `POST /restaurant/search`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub city: Option<String>,
    pub coupon_code: Option<String>,
}

impl SearchRequest {
    /// Reads `city` and `couponCode` from a raw body.
    ///
    /// A falsy `couponCode` (absent, `null`, `false`, `0`, `""`) means no
    /// coupon filter. Values that cannot be cast to text fail the query.
    pub fn from_json(body: Value) -> AppResult<Self> {
        let mut errors = CastErrors::default();
        let city = body
            .get("city")
            .and_then(|value| cast_text(value, "city", &mut errors));
        let coupon_code = body
            .get("couponCode")
            .filter(|value| is_truthy(value))
            .and_then(|value| cast_text(value, "menuItems.couponCode", &mut errors));

        if !errors.is_empty() {
            return Err(AppError::InvalidQuery(format!(
                "Cast failed for query on model \"Restaurant\": {}",
                errors.join()
            )));
        }

        Ok(Self { city, coupon_code })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Equality filter over the restaurant collection.
///
/// `city` is compared exactly, with `None` matching restaurants that have no
/// city. When `coupon_code` is set, a restaurant matches only if at least one
/// of its menu items carries that code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestaurantFilter {
    pub city: Option<String>,
    pub coupon_code: Option<String>,
}

impl From<SearchRequest> for RestaurantFilter {
    fn from(request: SearchRequest) -> Self {
        Self {
            city: request.city,
            coupon_code: request.coupon_code,
        }
    }
}

impl RestaurantFilter {
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        if restaurant.city != self.city {
            return false;
        }
        match &self.coupon_code {
            Some(code) => restaurant.menu_items.iter().any(|item| item.has_coupon(code)),
            None => true,
        }
    }

    /// Trims a matched restaurant's menu down to the items carrying the
    /// filter's coupon code. No-op without a coupon code.
    pub fn project(&self, mut restaurant: Restaurant) -> Restaurant {
        if let Some(code) = &self.coupon_code {
            restaurant.menu_items.retain(|item| item.has_coupon(code));
        }
        restaurant
    }
}

/// Runs a search against the store.
///
/// With `project_menu_items` unset, matching restaurants are returned whole.
/// With it set, each one only keeps the menu items matching the coupon code.
pub async fn search(
    store: &dyn RestaurantStore,
    request: SearchRequest,
    project_menu_items: bool,
) -> AppResult<Vec<Restaurant>> {
    let filter = RestaurantFilter::from(request);
    debug!(?filter, project_menu_items, "searching restaurants");

    let restaurants = store.find(&filter).await?;
    if !project_menu_items {
        return Ok(restaurants);
    }

    Ok(restaurants
        .into_iter()
        .map(|restaurant| filter.project(restaurant))
        .collect())
}
