//! # Screen Navigation
//!
//! The kiosk shows the home screen or exactly one flow screen. Switching is
//! two-phase: [`Navigator::begin`] marks the outgoing screen as leaving
//! (exit animation running) while the incoming screen stays hidden, and
//! [`Navigator::complete`] swaps them in one step. At every instant exactly
//! one screen is visible or leaving, so the display is never blank and
//! never shows two screens at once.

use kiosk_core::FlowKind;
use serde::{Deserialize, Serialize};

/// A kiosk screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    /// Flow chooser.
    Home,
    /// Deposit flow.
    Deposit,
    /// Withdrawal flow.
    Withdrawal,
}

impl Screen {
    /// Every screen.
    pub const ALL: [Screen; 3] = [Screen::Home, Screen::Deposit, Screen::Withdrawal];

    /// Flow shown on this screen, `None` for home.
    pub fn flow(&self) -> Option<FlowKind> {
        match self {
            Self::Home => None,
            Self::Deposit => Some(FlowKind::Deposit),
            Self::Withdrawal => Some(FlowKind::Withdrawal),
        }
    }

    /// Lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }
}

impl From<FlowKind> for Screen {
    fn from(flow: FlowKind) -> Self {
        match flow {
            FlowKind::Deposit => Self::Deposit,
            FlowKind::Withdrawal => Self::Withdrawal,
        }
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility of a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Fully shown.
    Visible,
    /// Exit animation in progress.
    Leaving,
    /// Not shown.
    Hidden,
}

/// An in-progress screen switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Pass to [`Navigator::complete`].
    pub id: u64,
    /// Screen being left.
    pub from: Screen,
    /// Screen being shown.
    pub to: Screen,
}

/// Screen visibility model.
#[derive(Debug, Clone)]
pub struct Navigator {
    shown: Screen,
    transition: Option<Transition>,
    next_id: u64,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    /// Home visible, nothing in progress.
    pub fn new() -> Self {
        Self {
            shown: Screen::Home,
            transition: None,
            next_id: 0,
        }
    }

    /// The screen the kiosk is on or heading to.
    pub fn target(&self) -> Screen {
        self.transition.map_or(self.shown, |t| t.to)
    }

    /// The in-progress switch, if any.
    pub fn transition(&self) -> Option<Transition> {
        self.transition
    }

    /// Start switching to `to`.
    ///
    /// A newer call supersedes an unfinished switch; the screen that is
    /// still leaving stays the outgoing one. Returns `None` when `to` is
    /// already shown, in which case any unfinished switch is cancelled.
    pub fn begin(&mut self, to: Screen) -> Option<Transition> {
        if to == self.shown {
            self.transition = None;
            return None;
        }
        self.next_id += 1;
        let transition = Transition {
            id: self.next_id,
            from: self.shown,
            to,
        };
        self.transition = Some(transition);
        Some(transition)
    }

    /// Finish switch `id`. Returns `false` for a superseded or unknown id.
    pub fn complete(&mut self, id: u64) -> bool {
        match self.transition {
            Some(t) if t.id == id => {
                self.shown = t.to;
                self.transition = None;
                true
            }
            _ => false,
        }
    }

    /// Current visibility of `screen`.
    pub fn visibility(&self, screen: Screen) -> Visibility {
        match self.transition {
            Some(t) if t.from == screen => Visibility::Leaving,
            Some(_) => Visibility::Hidden,
            None if self.shown == screen => Visibility::Visible,
            None => Visibility::Hidden,
        }
    }
}
