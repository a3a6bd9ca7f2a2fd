//! Local favorite management: add, remove, list.
//!
//! These commands never touch the network; changes go out with the next
//! sync.

use favsync_model::{FavoriteRecord, PointOfInterest};
use favsync_store::{DataDir, LocalFavoritesStore};
use tracing::info;

/// Runs the add command.
pub fn add(
    dir: &DataDir,
    user_id: &str,
    poi: &PointOfInterest,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = dir.favorites()?;
    let record = FavoriteRecord::from_poi(user_id, poi);
    let existed = store.contains(&record.poi_id)?;
    let name = record.nombre.clone();
    store.upsert(record)?;

    info!(poi_id = %poi.id, "favorite saved locally");
    if existed {
        println!("✓ Updated favorite {} ({})", poi.id, name);
    } else {
        println!("✓ Added favorite {} ({})", poi.id, name);
    }
    Ok(())
}

/// Runs the remove command.
pub fn remove(dir: &DataDir, poi_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = dir.favorites()?;
    if store.delete(poi_id)? {
        println!("✓ Removed favorite {}", poi_id);
    } else {
        println!("No favorite {} to remove", poi_id);
    }
    Ok(())
}

/// Runs the list command.
pub fn list(dir: &DataDir, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let records = dir.favorites()?.list()?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => print_text(&records),
    }
    Ok(())
}

fn print_text(records: &[FavoriteRecord]) {
    if records.is_empty() {
        println!("No favorites");
        return;
    }

    println!("{} favorite(s)", records.len());
    for record in records {
        let category = record.categoria.as_deref().unwrap_or("-");
        print!("  {:<16} {:<32} {:<12}", record.poi_id, record.nombre, category);
        if let (Some(lat), Some(lon)) = (record.lat, record.lon) {
            print!(" ({lat:.5}, {lon:.5})");
        }
        if let Some(rating) = record.calificacion {
            print!(" ★{rating:.1}");
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn add_then_remove() {
        let temp = tempdir().unwrap();
        let dir = DataDir::open(temp.path()).unwrap();
        let poi = PointOfInterest {
            id: "p1".into(),
            name: "  ".into(),
            images: vec!["a.jpg".into(), "b.jpg".into()],
            ..PointOfInterest::default()
        };

        add(&dir, "u1", &poi).unwrap();
        let stored = dir.favorites().unwrap().list().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].nombre, favsync_model::UNNAMED_PLACE);
        assert_eq!(stored[0].imagen_url.as_deref(), Some("a.jpg"));

        remove(&dir, "p1").unwrap();
        assert_eq!(dir.favorites().unwrap().count().unwrap(), 0);
    }
}
