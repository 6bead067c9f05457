use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use uuid::Uuid;

use crate::contact::{Contact, Location, DEFAULT_LOGO};
use crate::map::{MapMode, MapView};
use crate::store::ContactPatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit { target: Uuid },
}

/// Focusable rows of the form, in cycle order. Location is a pseudo-field:
/// no text input, Enter on it opens the map picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Company,
    Manager,
    Phone,
    Logo,
    Location,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Company,
        FormField::Manager,
        FormField::Phone,
        FormField::Logo,
        FormField::Location,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Company => "Company",
            FormField::Manager => "Manager",
            FormField::Phone => "Phone",
            FormField::Logo => "Logo",
            FormField::Location => "Location",
        }
    }

    fn next(self) -> Self {
        match self {
            FormField::Company => FormField::Manager,
            FormField::Manager => FormField::Phone,
            FormField::Phone => FormField::Logo,
            FormField::Logo => FormField::Location,
            FormField::Location => FormField::Company,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Company => FormField::Location,
            FormField::Manager => FormField::Company,
            FormField::Phone => FormField::Manager,
            FormField::Logo => FormField::Phone,
            FormField::Location => FormField::Logo,
        }
    }
}

/// Per-field presence errors, rendered inline under the offending input.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    pub company: Option<&'static str>,
    pub manager: Option<&'static str>,
    pub phone: Option<&'static str>,
}

impl FormErrors {
    pub fn any(&self) -> bool {
        self.company.is_some() || self.manager.is_some() || self.phone.is_some()
    }

    pub fn for_field(&self, field: FormField) -> Option<&'static str> {
        match field {
            FormField::Company => self.company,
            FormField::Manager => self.manager,
            FormField::Phone => self.phone,
            _ => None,
        }
    }

    fn clear(&mut self, field: FormField) {
        match field {
            FormField::Company => self.company = None,
            FormField::Manager => self.manager = None,
            FormField::Phone => self.phone = None,
            _ => {}
        }
    }
}

/// Map-picking sub-state of an open form. The picker's map center is the
/// continuously reported candidate coordinate; `pending_generation` is set
/// while a geolocation request for this picker is in flight.
#[derive(Debug, Clone)]
pub struct MapPicker {
    pub map: MapView,
    pub pending_generation: Option<u64>,
}

impl MapPicker {
    pub fn new(center: Location, span: f64) -> Self {
        Self {
            map: MapView::new(MapMode::Select, center, span),
            pending_generation: None,
        }
    }
}

/// Draft state behind the add and edit overlays. Nothing here touches the
/// store; a validated submit produces a contact or a patch for the caller
/// to apply.
pub struct ContactForm {
    pub mode: FormMode,
    pub focus: FormField,
    pub company: Input,
    pub manager: Input,
    pub phone: Input,
    pub logo: Input,
    pub location: Option<Location>,
    pub errors: FormErrors,
    pub picker: Option<MapPicker>,
}

impl ContactForm {
    pub fn new_add() -> Self {
        Self {
            mode: FormMode::Add,
            focus: FormField::Company,
            company: Input::default(),
            manager: Input::default(),
            phone: Input::default(),
            logo: Input::default(),
            location: None,
            errors: FormErrors::default(),
            picker: None,
        }
    }

    pub fn new_edit(contact: &Contact) -> Self {
        Self {
            mode: FormMode::Edit { target: contact.id },
            focus: FormField::Company,
            company: Input::new(contact.company.clone()),
            manager: Input::new(contact.manager.clone()),
            phone: Input::new(contact.phone.clone()),
            logo: Input::new(contact.logo.clone()),
            location: contact.location,
            errors: FormErrors::default(),
            picker: None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            FormMode::Add => " ADD CONTACT ",
            FormMode::Edit { .. } => " EDIT CONTACT ",
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn input(&self, field: FormField) -> Option<&Input> {
        match field {
            FormField::Company => Some(&self.company),
            FormField::Manager => Some(&self.manager),
            FormField::Phone => Some(&self.phone),
            FormField::Logo => Some(&self.logo),
            FormField::Location => None,
        }
    }

    fn focused_input_mut(&mut self) -> Option<&mut Input> {
        match self.focus {
            FormField::Company => Some(&mut self.company),
            FormField::Manager => Some(&mut self.manager),
            FormField::Phone => Some(&mut self.phone),
            FormField::Logo => Some(&mut self.logo),
            FormField::Location => None,
        }
    }

    /// Route a key to the focused text input. Typing clears that field's
    /// error, matching the inline-validation contract.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        let focus = self.focus;
        let Some(input) = self.focused_input_mut() else {
            return false;
        };
        match input.handle_event(&Event::Key(key)) {
            Some(change) => {
                if change.value {
                    self.errors.clear(focus);
                }
                true
            }
            None => false,
        }
    }

    /// Presence checks; returns true when the draft may be submitted.
    pub fn validate(&mut self) -> bool {
        self.errors.company = self
            .company
            .value()
            .trim()
            .is_empty()
            .then_some("Company name is required");
        self.errors.manager = self
            .manager
            .value()
            .trim()
            .is_empty()
            .then_some("Manager name is required");
        self.errors.phone = self
            .phone
            .value()
            .trim()
            .is_empty()
            .then_some("Phone number is required");
        !self.errors.any()
    }

    /// Draft for an Add submission. The store defaults the logo when blank.
    pub fn draft_contact(&self) -> Contact {
        let mut contact = Contact::new(
            self.company.value().trim(),
            self.manager.value().trim(),
            self.phone.value().trim(),
        )
        .with_logo(self.logo.value().trim());
        contact.location = self.location;
        contact
    }

    /// Draft for an Edit submission: the form edits every field, so every
    /// patch field is set. A cleared logo falls back to the placeholder.
    pub fn draft_patch(&self) -> ContactPatch {
        let logo = self.logo.value().trim();
        ContactPatch {
            company: Some(self.company.value().trim().to_string()),
            manager: Some(self.manager.value().trim().to_string()),
            phone: Some(self.phone.value().trim().to_string()),
            logo: Some(if logo.is_empty() {
                DEFAULT_LOGO.to_string()
            } else {
                logo.to_string()
            }),
            location: Some(self.location),
        }
    }

    pub fn open_picker(&mut self, fallback_center: Location, span: f64) {
        let center = self.location.unwrap_or(fallback_center);
        self.picker = Some(MapPicker::new(center, span));
    }

    pub fn close_picker(&mut self) {
        self.picker = None;
    }

    pub fn clear_location(&mut self) {
        self.location = None;
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};

    use super::*;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn typed(form: &mut ContactForm, text: &str) {
        for c in text.chars() {
            form.handle_input(key(c));
        }
    }

    #[test]
    fn empty_required_fields_block_submission() {
        let mut form = ContactForm::new_add();
        assert!(!form.validate());
        assert!(form.errors.company.is_some());
        assert!(form.errors.manager.is_some());
        assert!(form.errors.phone.is_some());
    }

    #[test]
    fn typing_clears_the_field_error() {
        let mut form = ContactForm::new_add();
        form.validate();
        assert!(form.errors.company.is_some());

        typed(&mut form, "Acme");
        assert!(form.errors.company.is_none());
        // Untouched fields keep their errors
        assert!(form.errors.manager.is_some());
    }

    #[test]
    fn whitespace_only_fields_fail_validation() {
        let mut form = ContactForm::new_add();
        typed(&mut form, "   ");
        form.focus_next();
        typed(&mut form, "Jo");
        form.focus_next();
        typed(&mut form, "555");
        assert!(!form.validate());
        assert!(form.errors.company.is_some());
    }

    #[test]
    fn add_draft_collects_trimmed_fields_and_location() {
        let mut form = ContactForm::new_add();
        typed(&mut form, " Acme ");
        form.focus_next();
        typed(&mut form, "Jo");
        form.focus_next();
        typed(&mut form, "555");
        form.location = Some(Location::new(35.0, 51.0));

        assert!(form.validate());
        let draft = form.draft_contact();
        assert_eq!(draft.company, "Acme");
        assert_eq!(draft.manager, "Jo");
        assert_eq!(draft.phone, "555");
        assert_eq!(draft.location, Some(Location::new(35.0, 51.0)));
    }

    #[test]
    fn edit_form_prefills_and_patches_every_field() {
        let contact = Contact::new("Acme", "Jo", "555")
            .with_logo("a.png")
            .with_location(Location::new(35.0, 51.0));
        let mut form = ContactForm::new_edit(&contact);
        assert_eq!(form.mode, FormMode::Edit { target: contact.id });
        assert_eq!(form.company.value(), "Acme");
        assert_eq!(form.location, contact.location);

        form.clear_location();
        let patch = form.draft_patch();
        assert_eq!(patch.company.as_deref(), Some("Acme"));
        assert_eq!(patch.logo.as_deref(), Some("a.png"));
        assert_eq!(patch.location, Some(None));
    }

    #[test]
    fn cleared_logo_patches_back_to_the_placeholder() {
        let form = ContactForm::new_add();
        let patch = form.draft_patch();
        assert_eq!(patch.logo.as_deref(), Some(DEFAULT_LOGO));
    }

    #[test]
    fn picker_opens_on_the_existing_location_when_set() {
        let contact =
            Contact::new("Acme", "Jo", "555").with_location(Location::new(10.0, 20.0));
        let mut form = ContactForm::new_edit(&contact);
        form.open_picker(Location::new(0.0, 0.0), 24.0);
        let picker = form.picker.as_ref().unwrap();
        assert_eq!(picker.map.center(), Location::new(10.0, 20.0));
        assert!(picker.pending_generation.is_none());
    }

    #[test]
    fn focus_cycles_through_all_fields_and_back() {
        let mut form = ContactForm::new_add();
        for expected in FormField::ALL {
            assert_eq!(form.focus, expected);
            form.focus_next();
        }
        assert_eq!(form.focus, FormField::Company);
        form.focus_prev();
        assert_eq!(form.focus, FormField::Location);
    }
}
