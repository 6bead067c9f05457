use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use tui_widgets::popup::PopupState;
use uuid::Uuid;

use crate::config::Config;
use crate::contact::{Contact, Location};
use crate::dialer::{self, Dialer};
use crate::geo::{GeoError, GeoRequest};
use crate::map::{MapMode, MapView};
use crate::persist;
use crate::router::{self, Action};
use crate::selection::{Anchor, SelectionGate};
use crate::store::ContactStore;

use super::draw;
use super::form::{ContactForm, FormField, FormMode};

#[derive(Debug, Clone)]
pub struct ConfirmModal {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

/// Action to perform when the confirm modal is accepted
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    /// Delete the contact with this id
    DeleteContact { target: Uuid },
}

pub struct App<'a> {
    config: &'a Config,
    store_path: PathBuf,
    pub store: ContactStore,
    pub gate: SelectionGate,
    pub map: MapView,
    pub search_input: Input,
    pub search_focused: bool,
    /// Indices into the store for the current query, display order.
    pub filtered: Vec<usize>,
    /// Row within `filtered` the cursor is on.
    pub selected_row: usize,
    /// Highlighted action inside the open popover.
    pub popover_index: usize,
    pub form: Option<ContactForm>,
    pub confirm_modal: Option<ConfirmModal>,
    pub modal_popup: PopupState,
    pub status: Option<String>,
    // Set during rendering; the popover anchor is derived from them.
    pub list_area: Rect,
    pub list_offset: usize,
    geo: Option<GeoRequest>,
    geo_generation: u64,
    dialer: Box<dyn Dialer>,
}

impl<'a> App<'a> {
    pub fn new(config: &'a Config, store_path: PathBuf, contacts: Vec<Contact>) -> Self {
        // Hydration is a SetAll, same as any other mutation
        let mut store = ContactStore::default();
        store.set_all(contacts);
        let filtered = store.filtered("");
        Self {
            config,
            store_path,
            store,
            gate: SelectionGate::default(),
            map: MapView::new(MapMode::View, config.map.center, config.map.span),
            search_input: Input::default(),
            search_focused: false,
            filtered,
            selected_row: 0,
            popover_index: 0,
            form: None,
            confirm_modal: None,
            modal_popup: PopupState::default(),
            status: None,
            list_area: Rect::default(),
            list_offset: 0,
            geo: None,
            geo_generation: 0,
            dialer: dialer::from_config(config.commands.dial.as_ref()),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;

            self.poll_geolocation();

            if event::poll(Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Ctrl+C always quits (hardcoded for safety)
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        // Overlays first, most recently layered on top
        if self.confirm_modal.is_some() {
            self.handle_confirm_modal_key(key);
            return Ok(false);
        }

        if self.gate.form_open() {
            let picker_open = self.form.as_ref().is_some_and(|f| f.picker.is_some());
            if picker_open {
                self.handle_picker_key(key);
            } else {
                self.handle_form_key(key);
            }
            return Ok(false);
        }

        if self.gate.popover().is_some() {
            self.handle_popover_key(key);
            return Ok(false);
        }

        self.handle_browse_key(key)
    }

    // =========================================================================
    // Browse context: search input + contact list
    // =========================================================================

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<bool> {
        let config = self.config;

        if self.search_focused {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    self.search_focused = false;
                }
                KeyCode::Down => self.move_selection(1),
                KeyCode::Up => self.move_selection(-1),
                _ => {
                    if let Some(change) = self.search_input.handle_event(&Event::Key(key)) {
                        if change.value {
                            self.refresh_filter();
                        }
                    }
                }
            }
            return Ok(false);
        }

        if key_matches_any(&key, &config.keys.global.quit) {
            return Ok(true);
        }
        if key_matches_any(&key, &config.keys.global.search) {
            self.search_focused = true;
            return Ok(false);
        }
        if key_matches_any(&key, &config.keys.global.add) {
            self.open_add_form();
            return Ok(false);
        }
        if key_matches_any(&key, &config.keys.list.next) {
            self.move_selection(1);
            return Ok(false);
        }
        if key_matches_any(&key, &config.keys.list.prev) {
            self.move_selection(-1);
            return Ok(false);
        }
        if key_matches_any(&key, &config.keys.list.page_down) {
            self.move_selection(5);
            return Ok(false);
        }
        if key_matches_any(&key, &config.keys.list.page_up) {
            self.move_selection(-5);
            return Ok(false);
        }
        if key_matches_any(&key, &config.keys.list.open) {
            self.open_popover();
            return Ok(false);
        }

        Ok(false)
    }

    fn move_selection(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let max = self.filtered.len() as isize - 1;
        self.selected_row = (self.selected_row as isize + delta).clamp(0, max) as usize;
    }

    pub fn refresh_filter(&mut self) {
        self.filtered = self.store.filtered(self.search_input.value());
        if self.selected_row >= self.filtered.len() {
            self.selected_row = self.filtered.len().saturating_sub(1);
        }
    }

    /// Contact under the cursor, resolved through the filtered view.
    pub fn selected_contact(&self) -> Option<&Contact> {
        let index = *self.filtered.get(self.selected_row)?;
        self.store.get(index)
    }

    /// Contacts rendered as map markers: every located contact. The view-mode
    /// map is not narrowed by the active filter, only the list is.
    pub fn map_markers(&self) -> impl Iterator<Item = &Contact> {
        self.store
            .contacts()
            .iter()
            .filter(|c| c.location.is_some())
    }

    // =========================================================================
    // Popover
    // =========================================================================

    fn open_popover(&mut self) {
        let Some(contact) = self.selected_contact() else {
            self.set_status("No contact selected");
            return;
        };
        let target = contact.id;

        // Anchor under the selected row, as rendered last frame
        let visible = self.selected_row.saturating_sub(self.list_offset) as u16;
        let anchor = Anchor::new(
            self.list_area.x.saturating_add(2),
            self.list_area.y.saturating_add(visible),
        );

        self.popover_index = 0;
        self.gate.open_popover(target, anchor);
    }

    fn handle_popover_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let Some((target, _)) = self.gate.popover() else {
            return;
        };

        if key_matches_any(&key, &config.keys.popover.cancel) {
            self.gate.close();
            return;
        }
        if key_matches_any(&key, &config.keys.popover.next) {
            self.popover_index = (self.popover_index + 1) % Action::ALL.len();
            return;
        }
        if key_matches_any(&key, &config.keys.popover.prev) {
            self.popover_index = self
                .popover_index
                .checked_sub(1)
                .unwrap_or(Action::ALL.len() - 1);
            return;
        }
        if key_matches_any(&key, &config.keys.popover.confirm) {
            self.trigger_action(Action::ALL[self.popover_index], target);
            return;
        }
        if let KeyCode::Char(c) = key.code {
            if let Some(action) = Action::from_key(c) {
                self.trigger_action(action, target);
            }
        }
    }

    fn trigger_action(&mut self, action: Action, target: Uuid) {
        // Destructive path goes through the confirm modal first
        if action == Action::Delete {
            let company = self
                .store
                .by_id(target)
                .map(|c| c.company.clone())
                .unwrap_or_default();
            self.gate.close();
            self.confirm_modal = Some(ConfirmModal {
                title: "DELETE CONTACT".to_string(),
                message: format!("Delete \"{}\"?", company),
                action: ConfirmAction::DeleteContact { target },
            });
            return;
        }

        self.dispatch(action, target);

        // The router only moves the gate; materialize the edit form here
        if let Some(target) = self.gate.edit_target() {
            match self.store.by_id(target) {
                Some(contact) => self.form = Some(ContactForm::new_edit(contact)),
                None => {
                    self.gate.close();
                    self.set_status("Contact no longer exists");
                }
            }
        }
    }

    fn dispatch(&mut self, action: Action, target: Uuid) {
        let outcome = router::dispatch(
            action,
            target,
            &mut self.store,
            &mut self.gate,
            &mut self.map,
            self.dialer.as_ref(),
        );
        if outcome.mutated {
            self.after_mutation();
        }
        if let Some(notice) = outcome.notice {
            self.set_status(notice);
        }
    }

    // =========================================================================
    // Confirm modal
    // =========================================================================

    fn handle_confirm_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.confirm_modal.take() else {
            return;
        };
        let config = self.config;

        if key_matches_any(&key, &config.keys.modal.cancel) {
            return;
        }
        if key_matches_any(&key, &config.keys.modal.confirm) {
            match modal.action {
                ConfirmAction::DeleteContact { target } => {
                    self.dispatch(Action::Delete, target);
                }
            }
            return;
        }

        // Put the modal back if the key wasn't handled
        self.confirm_modal = Some(modal);
    }

    // =========================================================================
    // Add / edit form
    // =========================================================================

    fn open_add_form(&mut self) {
        self.gate.open_add();
        self.form = Some(ContactForm::new_add());
    }

    fn close_form(&mut self) {
        self.form = None;
        self.gate.close();
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let config = self.config;

        if key_matches_any(&key, &config.keys.form.cancel) {
            self.close_form();
            return;
        }

        if key_matches_any(&key, &config.keys.form.submit) {
            let on_location = self
                .form
                .as_ref()
                .map(|f| f.focus == FormField::Location)
                .unwrap_or(false);
            if on_location {
                if let Some(form) = self.form.as_mut() {
                    form.open_picker(config.map.center, config.map.span);
                }
                self.set_status("Pan with arrows, Enter accepts the center");
            } else {
                self.submit_form();
            }
            return;
        }

        let Some(form) = self.form.as_mut() else {
            return;
        };
        if key_matches_any(&key, &config.keys.form.next_field) {
            form.focus_next();
            return;
        }
        if key_matches_any(&key, &config.keys.form.prev_field) {
            form.focus_prev();
            return;
        }
        if form.focus == FormField::Location {
            if matches!(
                key.code,
                KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace
            ) {
                form.clear_location();
            }
            return;
        }
        form.handle_input(key);
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if !form.validate() {
            self.set_status("Fill in the highlighted fields");
            return;
        }

        match form.mode {
            FormMode::Add => {
                let mut draft = form.draft_contact();
                if draft.logo.is_empty() {
                    draft.logo = self.config.default_logo.clone();
                }
                self.store.add(draft);
            }
            FormMode::Edit { target } => {
                let patch = form.draft_patch();
                let Some(index) = self.store.position_of(target) else {
                    // Deleted while the form was open; drop the stale draft
                    self.close_form();
                    self.set_status("Contact no longer exists");
                    return;
                };
                if let Err(err) = self.store.update(index, patch) {
                    self.close_form();
                    self.set_status(err.to_string());
                    return;
                }
            }
        }

        self.close_form();
        self.after_mutation();
        self.set_status("Contact saved");
    }

    // =========================================================================
    // Map picker
    // =========================================================================

    fn handle_picker_key(&mut self, key: KeyEvent) {
        let config = self.config;
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let Some(picker) = form.picker.as_mut() else {
            return;
        };

        if key_matches_any(&key, &config.keys.picker.cancel) {
            form.close_picker();
            return;
        }
        if key_matches_any(&key, &config.keys.picker.confirm) {
            let picked = picker.map.center();
            form.location = Some(picked);
            form.close_picker();
            self.set_status(format!(
                "Location set to {:.4}, {:.4}",
                picked.lat, picked.lng
            ));
            return;
        }
        if key_matches_any(&key, &config.keys.picker.zoom_in) {
            picker.map.zoom_in();
            return;
        }
        if key_matches_any(&key, &config.keys.picker.zoom_out) {
            picker.map.zoom_out();
            return;
        }
        if key_matches_any(&key, &config.keys.picker.locate) {
            self.geo_generation += 1;
            picker.pending_generation = Some(self.geo_generation);
            self.geo = Some(GeoRequest::spawn(self.geo_generation));
            self.set_status("Looking up current position...");
            return;
        }
        match key.code {
            KeyCode::Left => picker.map.pan(-1, 0),
            KeyCode::Right => picker.map.pan(1, 0),
            KeyCode::Up => picker.map.pan(0, 1),
            KeyCode::Down => picker.map.pan(0, -1),
            _ => {}
        }
    }

    fn poll_geolocation(&mut self) {
        let Some(request) = &self.geo else {
            return;
        };
        let Some(result) = request.try_result() else {
            return;
        };
        let generation = request.generation();
        self.geo = None;
        self.apply_geolocation(generation, result);
    }

    /// Apply a finished geolocation lookup, unless the picker that asked for
    /// it has gone away or a newer request superseded it. A stale result is
    /// discarded, never re-targeted.
    fn apply_geolocation(&mut self, generation: u64, result: Result<Location, GeoError>) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match form.picker.as_mut() {
            Some(picker) if picker.pending_generation == Some(generation) => {
                picker.pending_generation = None;
            }
            _ => return,
        }

        match result {
            Ok(location) => {
                form.location = Some(location);
                if let Some(picker) = form.picker.as_mut() {
                    picker.map.fly_to(location);
                }
                self.set_status("Current position applied");
            }
            Err(err) => self.set_status(err.to_string()),
        }
    }

    // =========================================================================
    // Shared plumbing
    // =========================================================================

    /// Persist and rebuild the derived view after any accepted mutation.
    fn after_mutation(&mut self) {
        if let Err(err) = persist::save(&self.store_path, self.store.contacts()) {
            // Non-blocking: the in-memory list stays authoritative
            self.set_status(format!("Warning: contacts not saved: {err:#}"));
        }
        self.refresh_filter();
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }
}

/// Check if the key event matches any of the bindings in the list
pub fn key_matches_any(event: &KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|b| key_matches_single(event, b))
}

/// Check if the key event matches a single binding string
fn key_matches_single(event: &KeyEvent, binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Disallow Ctrl/Alt/Super modifiers (we don't support them)
    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "enter" => matches!(event.code, KeyCode::Enter),
        "tab" => matches!(event.code, KeyCode::Tab),
        "backtab" | "shift+tab" => matches!(event.code, KeyCode::BackTab),
        "backspace" => matches!(event.code, KeyCode::Backspace),
        "esc" | "escape" => matches!(event.code, KeyCode::Esc),
        "space" => matches!(event.code, KeyCode::Char(' ')),
        "up" => matches!(event.code, KeyCode::Up),
        "down" => matches!(event.code, KeyCode::Down),
        "left" => matches!(event.code, KeyCode::Left),
        "right" => matches!(event.code, KeyCode::Right),
        "pageup" | "page_up" => matches!(event.code, KeyCode::PageUp),
        "pagedown" | "page_down" => matches!(event.code, KeyCode::PageDown),
        "home" => matches!(event.code, KeyCode::Home),
        "end" => matches!(event.code, KeyCode::End),
        // Single character - case-sensitive (m != M, since M requires Shift)
        _ => {
            let mut chars = trimmed.chars();
            match (chars.next(), chars.next()) {
                (Some(first), None) => matches!(event.code, KeyCode::Char(c) if c == first),
                _ => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Commands, Keys, MapConfig};
    use crate::contact::DEFAULT_LOGO;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_config() -> Config {
        Config {
            config_path: PathBuf::from("test.toml"),
            store_path: None,
            default_logo: DEFAULT_LOGO.to_string(),
            map: MapConfig::default(),
            commands: Commands::default(),
            keys: Keys::default(),
        }
    }

    fn test_app(config: &Config, contacts: Vec<Contact>) -> App<'_> {
        App::new(config, PathBuf::from("contacts.json"), contacts)
    }

    #[test]
    fn map_markers_are_not_narrowed_by_the_filter() {
        let config = test_config();
        let contacts = vec![
            Contact::new("Acme", "Jo", "555").with_location(Location::new(35.0, 51.0)),
            Contact::new("Beta", "Sam", "556").with_location(Location::new(36.0, 52.0)),
            Contact::new("Gamma", "Kim", "557"),
        ];
        let mut app = test_app(&config, contacts);

        app.search_input = Input::new("acme".to_string());
        app.refresh_filter();
        assert_eq!(app.filtered, vec![0]);

        // Every located contact stays on the map while the list is filtered
        let markers: Vec<&str> = app.map_markers().map(|c| c.company.as_str()).collect();
        assert_eq!(markers, ["Acme", "Beta"]);
    }

    #[test]
    fn geolocation_result_applies_to_the_matching_picker() {
        let config = test_config();
        let mut app = test_app(&config, Vec::new());
        app.open_add_form();
        let form = app.form.as_mut().unwrap();
        form.open_picker(Location::new(0.0, 0.0), 24.0);
        form.picker.as_mut().unwrap().pending_generation = Some(3);

        app.apply_geolocation(3, Ok(Location::new(35.69, 51.39)));

        let form = app.form.as_ref().unwrap();
        assert_eq!(form.location, Some(Location::new(35.69, 51.39)));
        let picker = form.picker.as_ref().unwrap();
        assert_eq!(picker.pending_generation, None);
        assert_eq!(picker.map.center(), Location::new(35.69, 51.39));
    }

    #[test]
    fn geolocation_result_with_a_stale_generation_is_discarded() {
        let config = test_config();
        let mut app = test_app(&config, Vec::new());
        app.open_add_form();
        let form = app.form.as_mut().unwrap();
        form.open_picker(Location::new(0.0, 0.0), 24.0);
        form.picker.as_mut().unwrap().pending_generation = Some(4);

        app.apply_geolocation(3, Ok(Location::new(35.69, 51.39)));

        let form = app.form.as_ref().unwrap();
        assert_eq!(form.location, None);
        assert_eq!(form.picker.as_ref().unwrap().pending_generation, Some(4));
        assert!(app.status.is_none());
    }

    #[test]
    fn geolocation_result_after_the_picker_closed_is_discarded() {
        let config = test_config();
        let mut app = test_app(&config, Vec::new());
        app.open_add_form();

        // Form open but no picker asked for anything
        app.apply_geolocation(1, Ok(Location::new(35.69, 51.39)));
        assert_eq!(app.form.as_ref().unwrap().location, None);
        assert!(app.status.is_none());

        // Form gone entirely
        app.close_form();
        app.apply_geolocation(1, Ok(Location::new(35.69, 51.39)));
        assert!(app.form.is_none());
        assert!(app.status.is_none());
    }

    #[test]
    fn bindings_match_named_and_character_keys() {
        let bindings = vec!["enter".to_string(), "j".to_string()];
        assert!(key_matches_any(&key(KeyCode::Enter), &bindings));
        assert!(key_matches_any(&key(KeyCode::Char('j')), &bindings));
        assert!(!key_matches_any(&key(KeyCode::Char('k')), &bindings));
    }

    #[test]
    fn modified_keys_never_match() {
        let bindings = vec!["j".to_string()];
        let ctrl_j = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL);
        assert!(!key_matches_any(&ctrl_j, &bindings));
    }

    #[test]
    fn character_bindings_are_case_sensitive() {
        let bindings = vec!["g".to_string()];
        assert!(key_matches_any(&key(KeyCode::Char('g')), &bindings));
        assert!(!key_matches_any(&key(KeyCode::Char('G')), &bindings));
    }

    // Default tables must leave the e/d/v/c shortcuts reachable in the popover.
    #[test]
    fn popover_shortcuts_do_not_collide_with_defaults() {
        let keys = Keys::default();
        for c in ['e', 'd', 'v', 'c'] {
            let event = key(KeyCode::Char(c));
            assert!(!key_matches_any(&event, &keys.popover.next));
            assert!(!key_matches_any(&event, &keys.popover.prev));
            assert!(!key_matches_any(&event, &keys.popover.cancel));
            assert!(!key_matches_any(&event, &keys.popover.confirm));
        }
    }
}
