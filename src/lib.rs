//! Restaurant Service
//!
//! A small HTTP service exposing CRUD and a filtered search over restaurants,
//! each embedding its list of menu items, stored as JSON documents in Redis.
//!
//! # Architecture
//!
//! Every request follows the same path: validate the path and body, run one
//! store operation, shape the JSON response.
//!
//! * `api` - Axum router, shared state and the five handlers
//! * `restaurant` - `Restaurant` / `MenuItem` documents and the writable-field patch
//! * `search` - search request parsing and the restaurant filter
//! * `store` - `RestaurantStore` trait with Redis and in-memory backends
//! * `config` - environment configuration
//! * `error` - Error handling and HTTP response mapping
//!
//! ## Storage Layer
//! - One Redis hash holds the whole collection, one field per restaurant id
//! - Ids are time-ordered UUIDs, so scans come back in creation order
//! - The connection is opened once at startup and shared by all requests
//!
//! # Environment Configuration
//!
//! ```bash
//! HOST=127.0.0.1                      # Server host
//! PORT=3000                           # Server port
//! STORE_BACKEND=redis                 # redis | memory
//! REDIS_URL=redis://localhost:6379    # Redis connection URL
//! RESTAURANTS_KEY=restaurants         # Redis hash holding the collection
//! SEARCH_PROJECT_MENU_ITEMS=false     # Keep only coupon-matching menu items in search results
//! RUST_LOG=info                       # Logging level
//! ```
//!
//! # Error Handling
//!
//! Every failure is an `AppError`, rendered as `{"message": "..."}`:
//! - unknown id: 404
//! - invalid document on create/update: 400
//! - malformed id, bad query values, Redis or decoding failures: 500
//!
//! # API Endpoints
//!
//! ## GET /restaurant/:restaurant_id
//! Returns the restaurant document.
//!
//! ## POST /restaurant
//! Creates a restaurant and answers `201` with the stored document.
//!
//! ```json
//! {
//!   "name": "Pizza Place",
//!   "city": "Springfield",
//!   "menuItems": [
//!     { "name": "Slice", "price": 3, "couponCode": "SAVE5" }
//!   ]
//! }
//! ```
//!
//! ## PUT /restaurant/:restaurant_id
//! Overwrites the top-level fields present in the body. `menuItems` is
//! replaced as a whole. `id` cannot be changed.
//!
//! ## DELETE /restaurant/:restaurant_id
//! Deletes the restaurant and answers `{"message": "Restaurant deleted"}`.
//!
//! ## POST /restaurant/search
//! ```json
//! {
//!   "city": "Springfield",   // exact match
//!   "couponCode": "SAVE5"    // optional, at least one menu item must carry it
//! }
//! ```
//! Answers with the list of matching restaurants.

pub mod api;
pub mod config;
pub mod error;
pub mod restaurant;
pub mod search;
pub mod store;
