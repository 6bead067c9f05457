use uuid::Uuid;

use crate::dialer::Dialer;
use crate::map::MapView;
use crate::selection::SelectionGate;
use crate::store::ContactStore;

/// The four actions a popover can trigger for its target contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Delete,
    View,
    Call,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Edit, Action::Delete, Action::View, Action::Call];

    pub fn label(self) -> &'static str {
        match self {
            Action::Edit => "Edit",
            Action::Delete => "Delete",
            Action::View => "Show on map",
            Action::Call => "Call",
        }
    }

    /// Direct-dispatch shortcut inside the popover.
    pub fn from_key(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'e' => Some(Action::Edit),
            'd' => Some(Action::Delete),
            'v' => Some(Action::View),
            'c' => Some(Action::Call),
            _ => None,
        }
    }
}

/// What a dispatch did, for the caller to persist and report.
#[derive(Debug, Default)]
pub struct Outcome {
    /// The store changed; the caller must persist and re-render.
    pub mutated: bool,
    /// Status-line message, if any.
    pub notice: Option<String>,
}

impl Outcome {
    fn notice(message: impl Into<String>) -> Self {
        Self {
            mutated: false,
            notice: Some(message.into()),
        }
    }
}

/// Resolve the action against the target's *current* position and dispatch.
///
/// Targets are stable ids; a target that no longer resolves (deleted while
/// an overlay was pointed at it) is a defended no-op that still closes the
/// gate, same as an unrecognized action in the observed contract.
pub fn dispatch(
    action: Action,
    target: Uuid,
    store: &mut ContactStore,
    gate: &mut SelectionGate,
    map: &mut MapView,
    dialer: &dyn Dialer,
) -> Outcome {
    let Some(index) = store.position_of(target) else {
        gate.close();
        return Outcome::notice("Contact no longer exists");
    };

    match action {
        Action::Edit => {
            // No store mutation yet; deferred to form submission.
            gate.open_edit(target);
            Outcome::default()
        }
        Action::Delete => {
            gate.close();
            match store.delete(index) {
                Ok(()) => Outcome {
                    mutated: true,
                    notice: Some("Contact deleted".to_string()),
                },
                Err(err) => Outcome::notice(err.to_string()),
            }
        }
        Action::View => {
            let location = store.get(index).and_then(|c| c.location);
            gate.close();
            match location {
                Some(location) => {
                    map.fly_to(location);
                    Outcome::default()
                }
                None => Outcome::notice("No location on record"),
            }
        }
        Action::Call => {
            let phone = store
                .get(index)
                .map(|c| c.phone.clone())
                .unwrap_or_default();
            gate.close();
            match dialer.dial(&phone) {
                Ok(()) => Outcome::notice(format!("Dialing {}", phone.trim())),
                Err(err) => Outcome::notice(format!("Call failed: {err}")),
            }
        }
    }
}
