//! Scroll synchronization across panes of different lengths.
//!
//! Each axis has one logical adjustment in `[0, 1]` shared by every pane,
//! and one attached adjustment per pane holding that pane's own range.
//! A change on either side is pushed one way only: pane → logical → panes.
//! Pane values written while pushing a logical change never feed back into
//! the logical value, and every write is skipped when the value is already
//! equal, so a notification chain always ends after one pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default wheel step: four step increments per notch
pub const DEFAULT_WHEEL_MULTIPLIER: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
    Left,
    Right,
}

impl WheelDirection {
    pub fn axis(self) -> Axis {
        match self {
            WheelDirection::Up | WheelDirection::Down => Axis::Vertical,
            WheelDirection::Left | WheelDirection::Right => Axis::Horizontal,
        }
    }

    fn sign(self) -> f64 {
        match self {
            WheelDirection::Up | WheelDirection::Left => -1.0,
            WheelDirection::Down | WheelDirection::Right => 1.0,
        }
    }
}

/// Index of a pane inside a compare view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaneId(pub usize);

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scrollable range, as an editor exposes it
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Adjustment {
    pub lower: f64,
    pub upper: f64,
    pub value: f64,
    pub page_size: f64,
    pub step_increment: f64,
    pub page_increment: f64,
}

impl Adjustment {
    pub fn new(
        lower: f64,
        upper: f64,
        page_size: f64,
        step_increment: f64,
        page_increment: f64,
    ) -> Self {
        Self {
            lower,
            upper,
            value: lower,
            page_size,
            step_increment,
            page_increment,
        }
    }

    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    /// Largest value that still shows a full page
    pub fn max_value(&self) -> f64 {
        (self.upper - self.page_size).max(self.lower)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.max_value())
    }

    /// Set the clamped value; false when it was already there or is not
    /// finite
    fn set_value(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let value = self.clamp(value);
        if self.value == value {
            return false;
        }
        self.value = value;
        true
    }
}

#[derive(Debug, Clone)]
struct AxisState {
    logical: Adjustment,
    attached: Vec<Adjustment>,
}

impl AxisState {
    fn new() -> Self {
        Self {
            logical: Adjustment::new(0.0, 1.0, 0.0, 0.0, 0.0),
            attached: Vec::new(),
        }
    }

    /// Map the logical value onto every pane. Returns the panes that moved.
    fn push_logical(&mut self) -> Vec<PaneId> {
        let logical = self.logical.value;
        let mut moved = Vec::new();
        for (index, local) in self.attached.iter_mut().enumerate() {
            let span = local.span();
            if span <= 0.0 {
                continue;
            }
            let target = (logical * span).round();
            if local.value != target && local.set_value(target) {
                moved.push(PaneId(index));
            }
        }
        moved
    }

    fn recompute_bounds(&mut self) {
        let ratio = |f: fn(&Adjustment) -> f64| {
            let min = self
                .attached
                .iter()
                .filter(|adj| adj.span() > 0.0)
                .map(|adj| f(adj) / adj.span())
                .fold(f64::INFINITY, f64::min);
            if min.is_finite() {
                min
            } else {
                0.0
            }
        };
        let page_size = ratio(|adj| adj.page_size);
        let step_increment = ratio(|adj| adj.step_increment);
        let page_increment = ratio(|adj| adj.page_increment);

        self.logical.lower = 0.0;
        self.logical.upper = 1.0;
        self.logical.page_size = page_size;
        self.logical.step_increment = step_increment;
        self.logical.page_increment = page_increment;
    }
}

/// Keeps every attached pane at the same proportional scroll position
#[derive(Debug, Clone)]
pub struct ScrollSynchronizer {
    vertical: AxisState,
    horizontal: AxisState,
    wheel_multiplier: f64,
}

impl Default for ScrollSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollSynchronizer {
    pub fn new() -> Self {
        Self {
            vertical: AxisState::new(),
            horizontal: AxisState::new(),
            wheel_multiplier: DEFAULT_WHEEL_MULTIPLIER,
        }
    }

    pub fn with_wheel_multiplier(mut self, multiplier: f64) -> Self {
        self.wheel_multiplier = multiplier;
        self
    }

    fn axis(&self, axis: Axis) -> &AxisState {
        match axis {
            Axis::Vertical => &self.vertical,
            Axis::Horizontal => &self.horizontal,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisState {
        match axis {
            Axis::Vertical => &mut self.vertical,
            Axis::Horizontal => &mut self.horizontal,
        }
    }

    /// Attach a pane's adjustment on one axis. The pane is moved to the
    /// current logical position.
    pub fn attach(&mut self, adjustment: Adjustment, axis: Axis) -> PaneId {
        let state = self.axis_mut(axis);
        state.attached.push(adjustment);
        state.recompute_bounds();
        state.push_logical();
        PaneId(state.attached.len() - 1)
    }

    pub fn pane_count(&self, axis: Axis) -> usize {
        self.axis(axis).attached.len()
    }

    /// The shared normalized adjustment of an axis
    pub fn logical(&self, axis: Axis) -> &Adjustment {
        &self.axis(axis).logical
    }

    pub fn logical_value(&self, axis: Axis) -> f64 {
        self.axis(axis).logical.value
    }

    pub fn local(&self, pane: PaneId, axis: Axis) -> Option<&Adjustment> {
        self.axis(axis).attached.get(pane.0)
    }

    /// A pane scrolled itself. Returns true when the logical value moved.
    pub fn set_local_value(&mut self, pane: PaneId, axis: Axis, value: f64) -> bool {
        let Some(local) = self.axis_mut(axis).attached.get_mut(pane.0) else {
            return false;
        };
        if !local.set_value(value) {
            return false;
        }
        self.on_local_changed(pane, axis)
    }

    /// Propagate a pane's current value to the logical adjustment and from
    /// there to every pane.
    pub fn on_local_changed(&mut self, pane: PaneId, axis: Axis) -> bool {
        let state = self.axis_mut(axis);
        let Some(local) = state.attached.get(pane.0) else {
            return false;
        };
        let span = local.span();
        if span <= 0.0 {
            return false;
        }
        let normalized = (local.value / span).clamp(0.0, 1.0);
        if state.logical.value == normalized {
            return false;
        }
        state.logical.value = normalized;
        state.push_logical();
        true
    }

    /// Set the logical position. Returns the panes that moved.
    /// Non-finite values are ignored.
    pub fn set_logical_value(&mut self, axis: Axis, value: f64) -> Vec<PaneId> {
        if !value.is_finite() {
            return Vec::new();
        }
        let state = self.axis_mut(axis);
        let value = value.clamp(0.0, 1.0);
        if state.logical.value == value {
            return Vec::new();
        }
        state.logical.value = value;
        state.push_logical()
    }

    /// Re-map the current logical value onto every pane
    pub fn on_logical_changed(&mut self, axis: Axis) -> Vec<PaneId> {
        self.axis_mut(axis).push_logical()
    }

    /// Recompute the logical page size and increments from the panes
    pub fn recompute_bounds(&mut self, axis: Axis) {
        self.axis_mut(axis).recompute_bounds();
    }

    /// Replace a pane's range (content or viewport size changed). The pane
    /// keeps its value, clamped to the new range.
    pub fn set_local_bounds(&mut self, pane: PaneId, axis: Axis, bounds: Adjustment) {
        let finite = [bounds.lower, bounds.upper, bounds.page_size]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            tracing::warn!(pane = pane.0, ?axis, "ignoring non-finite scroll bounds");
            return;
        }
        let state = self.axis_mut(axis);
        let Some(local) = state.attached.get_mut(pane.0) else {
            return;
        };
        let value = local.value;
        *local = Adjustment { value, ..bounds };
        local.value = local.clamp(value);
        state.recompute_bounds();
    }

    /// Scroll the logical position by one wheel notch. Does nothing when a
    /// page already shows everything.
    pub fn scroll_wheel(&mut self, direction: WheelDirection) -> Vec<PaneId> {
        let axis = direction.axis();
        let logical = self.axis(axis).logical;
        if logical.page_size >= logical.upper {
            return Vec::new();
        }
        let delta = logical.step_increment * self.wheel_multiplier * direction.sign();
        let value = logical.clamp(logical.value + delta);
        self.set_logical_value(axis, value)
    }

    /// Centre the logical viewport on `fraction` of the document, as a click
    /// on the overview strip does
    pub fn jump_to_fraction(&mut self, axis: Axis, fraction: f64) -> Vec<PaneId> {
        if !fraction.is_finite() {
            return Vec::new();
        }
        let logical = self.axis(axis).logical;
        let position = fraction * logical.upper - logical.page_size / 2.0;
        let value = position.clamp(0.0, (logical.upper - logical.page_size).max(0.0));
        self.set_logical_value(axis, value)
    }
}
