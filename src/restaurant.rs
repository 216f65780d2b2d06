use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const MODEL_NAME: &str = "Restaurant";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Restaurant {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "menuItems", default)]
    pub menu_items: Vec<MenuItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MenuItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Number>,
    #[serde(
        rename = "couponCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub coupon_code: Option<String>,
}

impl MenuItem {
    pub fn has_coupon(&self, code: &str) -> bool {
        self.coupon_code.as_deref() == Some(code)
    }
}

impl Restaurant {
    /// Creates an empty restaurant with the given id.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            name: None,
            city: None,
            menu_items: Vec::new(),
        }
    }
}

/// Parses a path segment into a restaurant id.
pub fn parse_restaurant_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId(raw.to_string()))
}

/// The client-writable fields of a restaurant.
///
/// Used both as the body of a create (applied over an empty restaurant) and
/// as the body of an update (applied over the stored one). The outer `Option`
/// records whether the field was present in the request; the inner one
/// whether it was set to a value or cleared with `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestaurantPatch {
    pub name: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub menu_items: Option<Vec<MenuItem>>,
}

impl RestaurantPatch {
    /// Casts a raw JSON body into a patch.
    ///
    /// Values are cast to the field type where a lossless conversion exists
    /// (numbers to text, numeric strings to numbers). Unknown fields are
    /// ignored. `id` is assigned by the store and may never be supplied.
    /// All failures are reported together as a single `InvalidInput`.
    pub fn from_json(body: Value) -> AppResult<Self> {
        let fields = match body {
            Value::Object(fields) => fields,
            other => {
                return Err(AppError::InvalidInput(format!(
                    "{} validation failed: request body must be an object, got {}",
                    MODEL_NAME,
                    json_type(&other)
                )))
            }
        };

        let mut errors = CastErrors::default();
        for key in ["id", "_id"] {
            if fields.contains_key(key) {
                errors.push(key, "field is assigned by the server and cannot be set");
            }
        }

        let patch = Self {
            name: fields.get("name").map(|v| cast_text(v, "name", &mut errors)),
            city: fields.get("city").map(|v| cast_text(v, "city", &mut errors)),
            menu_items: fields
                .get("menuItems")
                .map(|v| cast_menu_items(v, "menuItems", &mut errors)),
        };

        errors.into_result(patch).map_err(AppError::InvalidInput)
    }

    /// Shallow merge: every present field overwrites the stored one.
    pub fn apply(self, restaurant: &mut Restaurant) {
        if let Some(name) = self.name {
            restaurant.name = name;
        }
        if let Some(city) = self.city {
            restaurant.city = city;
        }
        if let Some(menu_items) = self.menu_items {
            restaurant.menu_items = menu_items;
        }
    }

    pub fn into_restaurant(self, id: Uuid) -> Restaurant {
        let mut restaurant = Restaurant::new(id);
        self.apply(&mut restaurant);
        restaurant
    }
}

/// Accumulates `path: reason` entries while casting a document.
#[derive(Debug, Default)]
pub(crate) struct CastErrors(Vec<String>);

impl CastErrors {
    pub(crate) fn push(&mut self, path: &str, reason: &str) {
        self.0.push(format!("{}: {}", path, reason));
    }

    fn push_cast(&mut self, path: &str, kind: &str, value: &Value) {
        self.push(
            path,
            &format!(
                "Cast to {} failed for value {} (type {})",
                kind,
                value,
                json_type(value)
            ),
        );
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn join(&self) -> String {
        self.0.join(", ")
    }

    fn into_result<T>(self, value: T) -> Result<T, String> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(format!("{} validation failed: {}", MODEL_NAME, self.join()))
        }
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

pub(crate) fn cast_text(value: &Value, path: &str, errors: &mut CastErrors) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => {
            errors.push_cast(path, "string", other);
            None
        }
    }
}

fn cast_number(value: &Value, path: &str, errors: &mut CastErrors) -> Option<Number> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(n.clone()),
        Value::Bool(b) => Some(Number::from(u8::from(*b))),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            let parsed = trimmed
                .parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| trimmed.parse::<u64>().map(Number::from).ok())
                .or_else(|| trimmed.parse::<f64>().ok().and_then(Number::from_f64));
            if parsed.is_none() {
                errors.push_cast(path, "Number", value);
            }
            parsed
        }
        other => {
            errors.push_cast(path, "Number", other);
            None
        }
    }
}

fn cast_menu_item(fields: &Map<String, Value>, path: &str, errors: &mut CastErrors) -> MenuItem {
    MenuItem {
        name: fields
            .get("name")
            .and_then(|v| cast_text(v, &format!("{}.name", path), errors)),
        price: fields
            .get("price")
            .and_then(|v| cast_number(v, &format!("{}.price", path), errors)),
        coupon_code: fields
            .get("couponCode")
            .and_then(|v| cast_text(v, &format!("{}.couponCode", path), errors)),
    }
}

fn cast_menu_items(value: &Value, path: &str, errors: &mut CastErrors) -> Vec<MenuItem> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let item_path = format!("{}.{}", path, index);
                match item {
                    Value::Object(fields) => Some(cast_menu_item(fields, &item_path, errors)),
                    other => {
                        errors.push_cast(&item_path, "Embedded", other);
                        None
                    }
                }
            })
            .collect(),
        // A lone item is treated as a one-element list.
        Value::Object(fields) => vec![cast_menu_item(fields, &format!("{}.0", path), errors)],
        other => {
            errors.push_cast(path, "Array", other);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pizza_place() -> Restaurant {
        RestaurantPatch::from_json(json!({
            "name": "Pizza Place",
            "city": "Springfield",
            "menuItems": [{ "name": "Slice", "price": 3, "couponCode": "SAVE5" }]
        }))
        .unwrap()
        .into_restaurant(Uuid::now_v7())
    }

    #[test]
    fn builds_a_full_document() {
        let restaurant = pizza_place();
        assert_eq!(restaurant.name.as_deref(), Some("Pizza Place"));
        assert_eq!(restaurant.city.as_deref(), Some("Springfield"));
        assert_eq!(
            restaurant.menu_items,
            vec![MenuItem {
                name: Some("Slice".into()),
                price: Some(Number::from(3)),
                coupon_code: Some("SAVE5".into()),
            }]
        );
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let restaurant = pizza_place();
        let value = serde_json::to_value(&restaurant).unwrap();
        assert_eq!(value["id"], json!(restaurant.id.to_string()));
        assert_eq!(value["menuItems"][0]["couponCode"], json!("SAVE5"));
        assert_eq!(value["menuItems"][0]["price"], json!(3));
    }

    #[test]
    fn empty_document_keeps_menu_items_key() {
        let restaurant = RestaurantPatch::default().into_restaurant(Uuid::now_v7());
        let value = serde_json::to_value(&restaurant).unwrap();
        assert_eq!(value["menuItems"], json!([]));
        assert!(value.get("name").is_none());
        assert!(value.get("city").is_none());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut restaurant = pizza_place();
        let before = restaurant.clone();
        RestaurantPatch::from_json(json!({ "city": "Shelbyville" }))
            .unwrap()
            .apply(&mut restaurant);

        assert_eq!(restaurant.city.as_deref(), Some("Shelbyville"));
        assert_eq!(restaurant.name, before.name);
        assert_eq!(restaurant.menu_items, before.menu_items);
        assert_eq!(restaurant.id, before.id);
    }

    #[test]
    fn patch_replaces_menu_items_wholesale() {
        let mut restaurant = pizza_place();
        RestaurantPatch::from_json(json!({ "menuItems": [{ "name": "Calzone" }] }))
            .unwrap()
            .apply(&mut restaurant);

        assert_eq!(restaurant.menu_items.len(), 1);
        assert_eq!(restaurant.menu_items[0].name.as_deref(), Some("Calzone"));
        assert_eq!(restaurant.menu_items[0].price, None);
        assert_eq!(restaurant.menu_items[0].coupon_code, None);
    }

    #[test]
    fn null_clears_a_field() {
        let mut restaurant = pizza_place();
        RestaurantPatch::from_json(json!({ "name": null }))
            .unwrap()
            .apply(&mut restaurant);
        assert_eq!(restaurant.name, None);
        assert_eq!(restaurant.city.as_deref(), Some("Springfield"));
    }

    #[test]
    fn rejects_client_supplied_id() {
        let err = RestaurantPatch::from_json(json!({ "id": "abc", "city": "X" })).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(err.to_string().contains("id: field is assigned by the server"));

        let err = RestaurantPatch::from_json(json!({ "_id": "abc" })).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn casts_numbers_and_numeric_strings() {
        let patch = RestaurantPatch::from_json(json!({
            "name": 42,
            "menuItems": [
                { "price": "4.5" },
                { "price": " 7 " },
                { "price": "" },
                { "price": true, "couponCode": 10 }
            ]
        }))
        .unwrap();

        assert_eq!(patch.name, Some(Some("42".to_string())));
        let items = patch.menu_items.unwrap();
        assert_eq!(items[0].price, Number::from_f64(4.5));
        assert_eq!(items[1].price, Some(Number::from(7)));
        assert_eq!(items[2].price, None);
        assert_eq!(items[3].price, Some(Number::from(1)));
        assert_eq!(items[3].coupon_code.as_deref(), Some("10"));
    }

    #[test]
    fn wraps_a_single_menu_item() {
        let patch = RestaurantPatch::from_json(json!({ "menuItems": { "name": "Slice" } })).unwrap();
        assert_eq!(patch.menu_items.unwrap().len(), 1);
    }

    #[test]
    fn collects_every_cast_failure() {
        let err = RestaurantPatch::from_json(json!({
            "city": { "nested": true },
            "menuItems": [{ "price": "abc" }, "not an item"]
        }))
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Restaurant validation failed: "));
        assert!(message.contains("city: Cast to string failed"));
        assert!(message.contains("menuItems.0.price: Cast to Number failed for value \"abc\""));
        assert!(message.contains("menuItems.1: Cast to Embedded failed"));
    }

    #[test]
    fn rejects_non_object_body() {
        let err = RestaurantPatch::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn ignores_unknown_fields() {
        let patch = RestaurantPatch::from_json(json!({ "rating": 5, "city": "X" })).unwrap();
        assert_eq!(
            patch,
            RestaurantPatch {
                city: Some(Some("X".into())),
                ..Default::default()
            }
        );
    }

    #[test]
    fn parses_ids() {
        let id = Uuid::now_v7();
        assert_eq!(parse_restaurant_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_restaurant_id("not-an-id"),
            Err(AppError::InvalidId(_))
        ));
    }
}
