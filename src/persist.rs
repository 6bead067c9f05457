use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;

use crate::contact::{Contact, Location};

const APP_DIR: &str = "firmdex";
const STORE_FILE_NAME: &str = "contacts.json";

/// Platform data-dir location of the store when none is configured.
pub fn default_store_path() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine data directories")?;
    Ok(base.data_dir().join(APP_DIR).join(STORE_FILE_NAME))
}

/// Load the contact list, falling back to the bundled defaults when the file
/// is missing or malformed. Hydration never fails: the in-memory list is
/// authoritative for the session, so a broken store only costs a warning.
pub fn load(path: &Path) -> Vec<Contact> {
    if !path.exists() {
        return default_contacts();
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!(
                "warning: could not read {}: {}; starting from defaults",
                path.display(),
                err
            );
            return default_contacts();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(contacts) => contacts,
        Err(err) => {
            eprintln!(
                "warning: {} is not a valid contact store: {}; starting from defaults",
                path.display(),
                err
            );
            default_contacts()
        }
    }
}

/// Persist the full list. Failures are reported to the caller, which
/// surfaces them without blocking further edits.
pub fn save(path: &Path, contacts: &[Contact]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(contacts).context("failed to serialize contacts")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Seed list used on first run and as the malformed-store fallback.
pub fn default_contacts() -> Vec<Contact> {
    vec![
        Contact::new("Caspian Foods", "L. Karimi", "021-555-0184")
            .with_location(Location::new(35.7219, 51.3347)),
        Contact::new("Alborz Logistics", "M. Rahimi", "021-555-0327")
            .with_location(Location::new(35.7448, 51.3753)),
        Contact::new("Zagros Textiles", "S. Ahmadi", "031-555-0262"),
    ]
    .into_iter()
    .map(Contact::defaulted)
    .collect()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::contact::DEFAULT_LOGO;

    #[test]
    fn save_then_load_round_trips_field_for_field() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contacts.json");

        let contacts = vec![
            Contact::new("Acme", "Jo", "555")
                .with_logo("a.png")
                .with_location(Location::new(35.69, 51.39)),
            Contact::new("Beta", "Sam", "556").with_logo("b.png"),
        ];

        save(&path, &contacts).unwrap();
        let loaded = load(&path);
        assert_eq!(loaded, contacts);
    }

    #[test]
    fn missing_store_hydrates_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = load(&dir.path().join("nope.json"));
        // Default ids are generated per call, so compare by company
        assert_eq!(
            loaded.iter().map(|c| &c.company).collect::<Vec<_>>(),
            default_contacts().iter().map(|c| &c.company).collect::<Vec<_>>()
        );
        assert!(loaded.iter().all(|c| c.logo == DEFAULT_LOGO));
    }

    #[test]
    fn malformed_store_hydrates_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contacts.json");
        fs::write(&path, "{ definitely not json").unwrap();

        let loaded = load(&path);
        assert_eq!(loaded.len(), default_contacts().len());
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep").join("nested").join("contacts.json");
        save(&path, &[Contact::new("Acme", "Jo", "555")]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn legacy_store_without_ids_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contacts.json");
        fs::write(
            &path,
            r#"[{"company":"Acme","manager":"Jo","phone":"555","logo":"a.png",
                "location":{"lat":35.69,"lng":51.39}}]"#,
        )
        .unwrap();

        let loaded = load(&path);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].company, "Acme");
        assert!(!loaded[0].id.is_nil());
    }
}
