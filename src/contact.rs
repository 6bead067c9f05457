use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logo path used when an entry is created without one.
pub const DEFAULT_LOGO: &str = "logos/placeholder.png";

/// A geographic coordinate as stored on a contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// One directory entry.
///
/// The `id` is the stable identity used by overlays and the action router;
/// the position in the store list is only display order. Stores written
/// without ids (the original browser exports have none) get one generated
/// during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub company: String,
    #[serde(default)]
    pub manager: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub location: Option<Location>,
}

impl Contact {
    pub fn new(
        company: impl Into<String>,
        manager: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company: company.into(),
            manager: manager.into(),
            phone: phone.into(),
            logo: String::new(),
            location: None,
        }
    }

    pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = logo.into();
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Fill defaulted fields on entry to the store. An empty logo becomes
    /// the placeholder path.
    pub fn defaulted(mut self) -> Self {
        if self.logo.trim().is_empty() {
            self.logo = DEFAULT_LOGO.to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_without_id_generates_one() {
        let json = r#"{"company":"Acme","manager":"Jo","phone":"555","logo":"a.png"}"#;
        let contact: Contact = serde_json::from_str(json).unwrap();
        assert_eq!(contact.company, "Acme");
        assert!(!contact.id.is_nil());
        assert!(contact.location.is_none());
    }

    #[test]
    fn id_survives_round_trip() {
        let contact = Contact::new("Acme", "Jo", "555").with_logo("a.png");
        let json = serde_json::to_string(&contact).unwrap();
        let back: Contact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, contact);
    }

    #[test]
    fn defaulted_fills_empty_logo_only() {
        let blank = Contact::new("Acme", "Jo", "555").defaulted();
        assert_eq!(blank.logo, DEFAULT_LOGO);

        let kept = Contact::new("Acme", "Jo", "555")
            .with_logo("custom.png")
            .defaulted();
        assert_eq!(kept.logo, "custom.png");
    }
}
