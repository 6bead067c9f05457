use uuid::Uuid;

/// Screen-space cell the popover is anchored to (the triggering row).
/// Placement only; it carries no business meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub x: u16,
    pub y: u16,
}

impl Anchor {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Top-left corner for a popover of the given width: below the trigger,
    /// left-aligned, with the left edge pulled in so the right edge never
    /// passes the viewport.
    pub fn popover_origin(self, popover_width: u16, viewport_width: u16) -> (u16, u16) {
        let max_x = viewport_width.saturating_sub(popover_width);
        (self.x.min(max_x), self.y.saturating_add(1))
    }
}

/// Which overlay, if any, is open. One tagged value instead of a boolean per
/// overlay: a second open overlay is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionGate {
    #[default]
    Closed,
    PopoverOpen {
        target: Uuid,
        anchor: Anchor,
    },
    EditOpen {
        target: Uuid,
    },
    AddOpen,
}

impl SelectionGate {
    /// `Closed -> PopoverOpen`, or re-anchoring onto another row. Any other
    /// open overlay is replaced.
    pub fn open_popover(&mut self, target: Uuid, anchor: Anchor) {
        *self = SelectionGate::PopoverOpen { target, anchor };
    }

    pub fn open_edit(&mut self, target: Uuid) {
        *self = SelectionGate::EditOpen { target };
    }

    pub fn open_add(&mut self) {
        *self = SelectionGate::AddOpen;
    }

    pub fn close(&mut self) {
        *self = SelectionGate::Closed;
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SelectionGate::Closed)
    }

    pub fn popover(&self) -> Option<(Uuid, Anchor)> {
        match self {
            SelectionGate::PopoverOpen { target, anchor } => Some((*target, *anchor)),
            _ => None,
        }
    }

    /// Target of the open edit form, `None` for the add form or anything else.
    pub fn edit_target(&self) -> Option<Uuid> {
        match self {
            SelectionGate::EditOpen { target } => Some(*target),
            _ => None,
        }
    }

    pub fn form_open(&self) -> bool {
        matches!(
            self,
            SelectionGate::EditOpen { .. } | SelectionGate::AddOpen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_any_overlay_replaces_the_previous_one() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut gate = SelectionGate::default();
        assert!(gate.is_closed());

        gate.open_popover(a, Anchor::new(4, 7));
        assert_eq!(gate.popover().map(|(t, _)| t), Some(a));

        gate.open_edit(b);
        assert!(gate.popover().is_none());
        assert_eq!(gate.edit_target(), Some(b));

        gate.open_add();
        assert_eq!(gate.edit_target(), None);
        assert!(gate.form_open());

        gate.open_popover(b, Anchor::new(0, 0));
        assert!(!gate.form_open());
        assert!(gate.popover().is_some());

        gate.close();
        assert!(gate.is_closed());
    }

    #[test]
    fn popover_to_edit_carries_the_target() {
        let target = Uuid::new_v4();
        let mut gate = SelectionGate::default();
        gate.open_popover(target, Anchor::new(10, 3));

        let (carried, _) = gate.popover().unwrap();
        gate.open_edit(carried);
        assert_eq!(gate.edit_target(), Some(target));
    }

    #[test]
    fn popover_origin_sits_below_the_anchor() {
        let anchor = Anchor::new(5, 8);
        assert_eq!(anchor.popover_origin(20, 100), (5, 9));
    }

    #[test]
    fn popover_origin_clamps_to_the_right_edge() {
        let anchor = Anchor::new(95, 2);
        assert_eq!(anchor.popover_origin(20, 100), (80, 3));

        // Popover wider than the viewport pins to column zero
        let anchor = Anchor::new(3, 0);
        assert_eq!(anchor.popover_origin(200, 100), (0, 1));
    }
}
