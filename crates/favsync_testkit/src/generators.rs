//! Property-based test generators using proptest.
//!
//! Poi ids are drawn from a small pool so that generated batches hit the
//! same keys repeatedly.

use favsync_model::{FavoriteRecord, WireFavorite};
use proptest::prelude::*;

/// Strategy for poi ids from a pool of twenty.
pub fn poi_id_strategy() -> impl Strategy<Value = String> {
    (0u8..20).prop_map(|n| format!("p{n}"))
}

/// Strategy for place names, including blank ones.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::string::string_regex("[A-Za-zÁÉÍÓÚáéíóúñ ]{1,24}").expect("Invalid regex"),
        1 => Just(String::new()),
        1 => Just("   ".to_string()),
    ]
}

/// Strategy for ratings, including ones the model must drop.
pub fn rating_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(None),
        (0.0f64..=5.0).prop_map(Some),
        (-5.0f64..0.0).prop_map(Some),
        Just(Some(f64::NAN)),
    ]
}

/// Strategy for favorites owned by `user_id`.
pub fn record_strategy(user_id: &str) -> impl Strategy<Value = FavoriteRecord> {
    let user_id = user_id.to_string();
    (
        poi_id_strategy(),
        name_strategy(),
        prop::option::of((-90.0f64..90.0, -180.0f64..180.0)),
        prop::option::of("[a-z]{3,10}"),
    )
        .prop_map(move |(poi_id, name, location, category)| {
            let mut record = FavoriteRecord::new(user_id.clone(), poi_id, name);
            if let Some((lat, lon)) = location {
                record = record.with_location(lat, lon);
            }
            if let Some(category) = category {
                record = record.with_category(category);
            }
            record
        })
}

/// Strategy for a single pulled change: an upsert or a removal.
///
/// Upserts may carry ratings the receiver has to drop.
pub fn wire_change_strategy(user_id: &str) -> impl Strategy<Value = WireFavorite> {
    let owner = user_id.to_string();
    prop_oneof![
        3 => (record_strategy(user_id), rating_strategy()).prop_map(|(record, rating)| {
            let mut wire = record.to_wire("2024-01-01T00:00:00Z");
            wire.calificacion = rating;
            wire
        }),
        1 => poi_id_strategy()
            .prop_map(move |poi| WireFavorite::removal(owner.clone(), poi, "2024-01-01T00:00:00Z")),
    ]
}

/// Strategy for a pull batch of up to 30 changes.
pub fn pull_batch_strategy(user_id: &str) -> impl Strategy<Value = Vec<WireFavorite>> {
    prop::collection::vec(wire_change_strategy(user_id), 0..30)
}

/// A local user action on a device.
#[derive(Debug, Clone)]
pub enum LocalAction {
    /// Favorite a place.
    Favorite(FavoriteRecord),
    /// Unfavorite a place.
    Unfavorite(String),
}

/// Strategy for a sequence of local actions.
pub fn local_actions_strategy(user_id: &str) -> impl Strategy<Value = Vec<LocalAction>> {
    prop::collection::vec(
        prop_oneof![
            3 => record_strategy(user_id).prop_map(LocalAction::Favorite),
            1 => poi_id_strategy().prop_map(LocalAction::Unfavorite),
        ],
        0..20,
    )
}
