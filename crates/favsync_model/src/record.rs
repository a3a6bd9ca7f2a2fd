//! Favorite records in their local and wire forms.

use serde::{Deserialize, Serialize};

/// Name used when a point of interest arrives without one.
pub const UNNAMED_PLACE: &str = "Unnamed place";

/// A point of interest as delivered by the places catalogue.
///
/// Only the fields a favorite keeps are modelled here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterest {
    /// Stable identifier.
    pub id: String,
    /// Display name (may be empty in the catalogue).
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Category label.
    #[serde(default)]
    pub category: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Latitude.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude.
    #[serde(default)]
    pub lon: Option<f64>,
    /// Average rating.
    #[serde(default)]
    pub rating: Option<f64>,
    /// Image references, best first.
    #[serde(default)]
    pub images: Vec<String>,
}

/// A favorite as held in the local store.
///
/// The local form has no `isFavorite` flag: a record that exists is a
/// favorite, and unfavoriting removes it.
///
/// # Invariants
///
/// - `nombre` is never empty (see [`UNNAMED_PLACE`])
/// - `calificacion`, when present, is finite and non-negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    /// Owner identity.
    pub user_id: String,
    /// Identifier of the favorited point of interest.
    pub poi_id: String,
    /// Display name.
    pub nombre: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    /// Category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
    /// Address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    /// Latitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Longitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calificacion: Option<f64>,
    /// Image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagen_url: Option<String>,
}

impl FavoriteRecord {
    /// Creates a record with only the required fields.
    ///
    /// An empty `nombre` is replaced with [`UNNAMED_PLACE`].
    pub fn new(
        user_id: impl Into<String>,
        poi_id: impl Into<String>,
        nombre: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            poi_id: poi_id.into(),
            nombre: normalize_name(nombre.into()),
            descripcion: None,
            categoria: None,
            direccion: None,
            lat: None,
            lon: None,
            calificacion: None,
            imagen_url: None,
        }
    }

    /// Builds the record stored when `user_id` favorites `poi`.
    pub fn from_poi(user_id: impl Into<String>, poi: &PointOfInterest) -> Self {
        Self {
            user_id: user_id.into(),
            poi_id: poi.id.clone(),
            nombre: normalize_name(poi.name.clone()),
            descripcion: poi.description.clone(),
            categoria: poi.category.clone(),
            direccion: poi.address.clone(),
            lat: poi.lat,
            lon: poi.lon,
            calificacion: normalize_rating(poi.rating),
            imagen_url: poi.images.first().cloned(),
        }
    }

    /// Sets the coordinates.
    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, categoria: impl Into<String>) -> Self {
        self.categoria = Some(categoria.into());
        self
    }

    /// Sets the rating. Negative or non-finite ratings are dropped.
    pub fn with_rating(mut self, calificacion: f64) -> Self {
        self.calificacion = normalize_rating(Some(calificacion));
        self
    }

    /// Converts to the wire form used by push, stamped with `timestamp`.
    ///
    /// Records pushed from the local store are always `isFavorite = true`.
    pub fn to_wire(&self, timestamp: impl Into<String>) -> WireFavorite {
        WireFavorite {
            user_id: self.user_id.clone(),
            poi_id: self.poi_id.clone(),
            nombre: self.nombre.clone(),
            descripcion: self.descripcion.clone(),
            categoria: self.categoria.clone(),
            direccion: self.direccion.clone(),
            lat: self.lat,
            lon: self.lon,
            calificacion: self.calificacion,
            imagen_url: self.imagen_url.clone(),
            is_favorite: true,
            timestamp: timestamp.into(),
        }
    }
}

/// A favorite as exchanged with the backend.
///
/// `is_favorite = true` asks the receiver to upsert the record,
/// `false` asks it to remove the `(user_id, poi_id)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFavorite {
    /// Owner identity; pull responses may leave it out.
    #[serde(default)]
    pub user_id: String,
    /// Identifier of the favorited point of interest.
    pub poi_id: String,
    /// Display name; may be empty on removals.
    #[serde(default)]
    pub nombre: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    /// Category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
    /// Address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    /// Latitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Longitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calificacion: Option<f64>,
    /// Image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagen_url: Option<String>,
    /// Upsert (`true`) or remove (`false`).
    pub is_favorite: bool,
    /// When the change was prepared for transmission.
    #[serde(default)]
    pub timestamp: String,
}

impl WireFavorite {
    /// Creates a removal marker for `(user_id, poi_id)`.
    pub fn removal(
        user_id: impl Into<String>,
        poi_id: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            poi_id: poi_id.into(),
            nombre: String::new(),
            descripcion: None,
            categoria: None,
            direccion: None,
            lat: None,
            lon: None,
            calificacion: None,
            imagen_url: None,
            is_favorite: false,
            timestamp: timestamp.into(),
        }
    }

    /// Converts to the local form, restoring the record invariants.
    pub fn into_record(self) -> FavoriteRecord {
        FavoriteRecord {
            user_id: self.user_id,
            poi_id: self.poi_id,
            nombre: normalize_name(self.nombre),
            descripcion: self.descripcion,
            categoria: self.categoria,
            direccion: self.direccion,
            lat: self.lat,
            lon: self.lon,
            calificacion: normalize_rating(self.calificacion),
            imagen_url: self.imagen_url,
        }
    }
}

fn normalize_name(name: String) -> String {
    if name.trim().is_empty() {
        UNNAMED_PLACE.to_string()
    } else {
        name
    }
}

fn normalize_rating(rating: Option<f64>) -> Option<f64> {
    rating.filter(|r| r.is_finite() && *r >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi() -> PointOfInterest {
        PointOfInterest {
            id: "p1".into(),
            name: "Café".into(),
            images: vec!["a.jpg".into(), "b.jpg".into()],
            rating: Some(4.5),
            ..Default::default()
        }
    }

    #[test]
    fn from_poi_takes_first_image() {
        let record = FavoriteRecord::from_poi("u1", &poi());
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.poi_id, "p1");
        assert_eq!(record.nombre, "Café");
        assert_eq!(record.imagen_url.as_deref(), Some("a.jpg"));
        assert_eq!(record.calificacion, Some(4.5));
    }

    #[test]
    fn empty_names_get_placeholder() {
        let mut source = poi();
        source.name = "   ".into();
        assert_eq!(FavoriteRecord::from_poi("u1", &source).nombre, UNNAMED_PLACE);
        assert_eq!(FavoriteRecord::new("u1", "p2", "").nombre, UNNAMED_PLACE);
    }

    #[test]
    fn negative_ratings_are_dropped() {
        let record = FavoriteRecord::new("u1", "p1", "x").with_rating(-1.0);
        assert_eq!(record.calificacion, None);
        let record = FavoriteRecord::new("u1", "p1", "x").with_rating(f64::NAN);
        assert_eq!(record.calificacion, None);
        let record = FavoriteRecord::new("u1", "p1", "x").with_rating(0.0);
        assert_eq!(record.calificacion, Some(0.0));
    }

    #[test]
    fn to_wire_marks_favorite() {
        let wire = FavoriteRecord::new("u1", "p1", "Café").to_wire("2024-01-01T00:00:00.000Z");
        assert!(wire.is_favorite);
        assert_eq!(wire.nombre, "Café");
        assert_eq!(wire.timestamp, "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn removal_into_record_keeps_key() {
        let record = WireFavorite::removal("u1", "p9", "t").into_record();
        assert_eq!(record.poi_id, "p9");
        assert_eq!(record.nombre, UNNAMED_PLACE);
    }

    #[test]
    fn wire_json_uses_camel_case() {
        let wire = FavoriteRecord::new("u1", "p1", "Café")
            .with_location(40.4, -3.7)
            .to_wire("t");
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["poiId"], "p1");
        assert_eq!(json["isFavorite"], true);
        assert_eq!(json["lat"], 40.4);
        assert!(json.get("imagenUrl").is_none());
    }

    #[test]
    fn wire_json_tolerates_missing_and_null_fields() {
        let wire: WireFavorite = serde_json::from_str(
            r#"{"userId":"u1","poiId":"p2","isFavorite":false,"descripcion":null,"extra":1}"#,
        )
        .unwrap();
        assert!(!wire.is_favorite);
        assert_eq!(wire.nombre, "");
        assert_eq!(wire.descripcion, None);
    }

    #[test]
    fn wire_json_without_user_id_decodes() {
        let wire: WireFavorite =
            serde_json::from_str(r#"{"poiId":"p1","isFavorite":true}"#).unwrap();
        assert_eq!(wire.user_id, "");
        assert_eq!(wire.poi_id, "p1");
        assert!(wire.is_favorite);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn into_record_restores_invariants(
                nombre in ".{0,16}",
                rating in proptest::option::of(any::<f64>()),
            ) {
                let mut wire = FavoriteRecord::new("u1", "p1", "x").to_wire("t");
                wire.nombre = nombre;
                wire.calificacion = rating;
                let record = wire.into_record();
                prop_assert!(!record.nombre.trim().is_empty());
                if let Some(r) = record.calificacion {
                    prop_assert!(r.is_finite() && r >= 0.0);
                }
            }
        }
    }
}
