//! Compare view: panes, their diff relations and everything derived from them.
//!
//! Every mutating call drains the change events of all panes before it
//! returns, so hunk stores, word paths and scroll extents are never observed
//! out of date.

use crate::config::Config;
use crate::document::{Document, TextBuffer};
use crate::geometry::{
    overview_markers, Band, Connector, ControlLayout, OverviewMarker, Point, ViewMetrics,
};
use crate::hunk::{Hunk, Side, Tone};
use crate::layout::{Layout, Relation, RelationId};
use crate::merge::{self, MergeError};
use crate::mirror::{MirrorError, MirrorRegistry};
use crate::scroll::{Adjustment, Axis, PaneId, ScrollSynchronizer, WheelDirection};
use crate::store::HunkStore;
use crate::word_cache::{HunkPaths, PaneView, WordDiffCache};
use std::ops::Range;
use thiserror::Error;

const CONNECTOR_LINE_WIDTH: f64 = 1.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewError {
    #[error("{layout:?} layout needs {expected} panes, got {actual}")]
    PaneCount {
        layout: Layout,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown pane {0}")]
    UnknownPane(PaneId),

    #[error("Unknown relation {0}")]
    UnknownRelation(RelationId),

    #[error("Pane {0} is read-only")]
    ReadOnly(PaneId),

    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("Mirror failed: {0}")]
    Mirror(#[from] MirrorError),
}

/// A hunk drawn over a pane, with the relation side it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneHunk {
    pub relation: RelationId,
    pub side: Side,
    pub hunk: Hunk,
    pub tone: Tone,
}

/// Position and size of the visible window on the overview strip, as
/// fractions of the strip height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverviewViewport {
    pub start: f64,
    pub height: f64,
}

/// Multi-pane diff/merge view
pub struct CompareView {
    layout: Layout,
    panes: Vec<Document>,
    /// Visible (width, height) of each pane
    viewports: Vec<(f64, f64)>,
    stores: Vec<HunkStore>,
    controls: Vec<ControlLayout>,
    /// Hunk under the pointer, per relation
    selected: Vec<Hunk>,
    cache: WordDiffCache,
    scroll: ScrollSynchronizer,
    mirror: MirrorRegistry,
    metrics: ViewMetrics,
    word_level: bool,
}

impl CompareView {
    pub fn new(layout: Layout, panes: Vec<Document>, config: &Config) -> Result<Self, ViewError> {
        let expected = layout.pane_count();
        if panes.len() != expected {
            tracing::error!(?layout, expected, actual = panes.len(), "wrong pane count");
            return Err(ViewError::PaneCount {
                layout,
                expected,
                actual: panes.len(),
            });
        }

        let engine = config.engine();
        let mut scroll =
            ScrollSynchronizer::new().with_wheel_multiplier(config.scroll.wheel_multiplier);
        for _ in &panes {
            scroll.attach(Adjustment::default(), Axis::Vertical);
            scroll.attach(Adjustment::default(), Axis::Horizontal);
        }

        let relations = layout.relations();
        let mut view = Self {
            layout,
            viewports: vec![(0.0, 0.0); panes.len()],
            panes,
            stores: relations.iter().map(|_| HunkStore::new(engine)).collect(),
            controls: relations
                .iter()
                .map(|relation| ControlLayout {
                    width: config.view.middle_area_width,
                    button_size: config.view.button_size,
                    line_width: CONNECTOR_LINE_WIDTH,
                    source_on_left: relation.source_on_left,
                })
                .collect(),
            selected: vec![Hunk::EMPTY; relations.len()],
            cache: WordDiffCache::new(engine),
            scroll,
            mirror: MirrorRegistry::new(),
            metrics: config.metrics(),
            word_level: config.diff.word_level,
        };

        for pane in &mut view.panes {
            pane.take_changes();
        }
        let all: Vec<PaneId> = (0..expected).map(PaneId).collect();
        view.refresh(&all);
        Ok(view)
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn pane(&self, pane: PaneId) -> Option<&Document> {
        self.panes.get(pane.0)
    }

    pub fn store(&self, relation: RelationId) -> Option<&HunkStore> {
        self.stores.get(relation.0)
    }

    pub fn scroll(&self) -> &ScrollSynchronizer {
        &self.scroll
    }

    pub fn word_cache(&self) -> &WordDiffCache {
        &self.cache
    }

    pub fn metrics(&self) -> ViewMetrics {
        self.metrics
    }

    fn relation(&self, id: RelationId) -> Result<Relation, ViewError> {
        self.layout.relation(id).ok_or_else(|| {
            tracing::error!(relation = id.0, "unknown relation");
            ViewError::UnknownRelation(id)
        })
    }

    fn check_pane(&self, pane: PaneId) -> Result<(), ViewError> {
        if pane.0 < self.panes.len() {
            Ok(())
        } else {
            tracing::error!(pane = pane.0, "unknown pane");
            Err(ViewError::UnknownPane(pane))
        }
    }

    // ------------------------------------------------------------------
    // Change dispatch
    // ------------------------------------------------------------------

    /// Drain pending change events, mirror local edits, then refresh every
    /// pane whose text changed
    fn dispatch(&mut self) -> Result<(), ViewError> {
        let mut pending = Vec::new();
        for (index, pane) in self.panes.iter_mut().enumerate() {
            let events = pane.take_changes();
            if !events.is_empty() {
                pending.push((PaneId(index), events));
            }
        }

        let mut dirty: Vec<PaneId> = pending.iter().map(|(pane, _)| *pane).collect();
        let mut result = Ok(());
        'mirror: for (pane, events) in &pending {
            for event in events {
                match self.mirror.on_local_changed(*pane, event, &mut self.panes) {
                    Ok(touched) => dirty.extend(touched),
                    Err(e) => {
                        result = Err(e.into());
                        break 'mirror;
                    }
                }
            }
        }
        dirty.sort();
        dirty.dedup();

        self.refresh(&dirty);
        result
    }

    /// Re-diff every relation touching a dirty pane and update extents
    fn refresh(&mut self, dirty: &[PaneId]) {
        if dirty.is_empty() {
            return;
        }

        for (index, relation) in self.layout.relations().iter().enumerate() {
            if !dirty.contains(&relation.source) && !dirty.contains(&relation.target) {
                continue;
            }
            let source = self.panes.get(relation.source.0).map(|d| d as &dyn TextBuffer);
            let target = self.panes.get(relation.target.0).map(|d| d as &dyn TextBuffer);
            if let Some(store) = self.stores.get_mut(index) {
                store.recompute(source, target);
                if !store.contains(&self.selected[index]) {
                    self.selected[index] = Hunk::EMPTY;
                }
            }
        }
        self.cache.clear();

        for &pane in dirty {
            self.update_extents(pane);
        }
    }

    fn update_extents(&mut self, pane: PaneId) {
        let Some(document) = self.panes.get(pane.0) else {
            return;
        };
        let (width, height) = self.viewports[pane.0];
        let line_height = self.metrics.line_height;
        let char_width = self.metrics.char_width;

        let longest = (0..document.line_count())
            .filter_map(|i| document.line_text(i))
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let content_height = document.line_count() as f64 * line_height;
        let content_width = longest as f64 * char_width;

        self.scroll.set_local_bounds(
            pane,
            Axis::Vertical,
            Adjustment::new(
                0.0,
                content_height.max(height),
                height,
                line_height,
                (height - line_height).max(0.0),
            ),
        );
        self.scroll.set_local_bounds(
            pane,
            Axis::Horizontal,
            Adjustment::new(
                0.0,
                content_width.max(width),
                width,
                char_width,
                (width - char_width).max(0.0),
            ),
        );
    }

    // ------------------------------------------------------------------
    // Text mutation
    // ------------------------------------------------------------------

    /// Edit a pane as the user would
    pub fn edit(
        &mut self,
        pane: PaneId,
        offset: usize,
        removed_len: usize,
        text: &str,
    ) -> Result<(), ViewError> {
        self.check_pane(pane)?;
        let document = &mut self.panes[pane.0];
        if document.is_read_only() {
            tracing::error!(pane = pane.0, "edit of a read-only pane");
            return Err(ViewError::ReadOnly(pane));
        }
        document.replace(offset, removed_len, text);
        self.dispatch()
    }

    /// Undo the last edit group of a pane
    pub fn undo(&mut self, pane: PaneId) -> Result<bool, ViewError> {
        self.check_pane(pane)?;
        let undone = self.panes[pane.0].undo();
        self.dispatch()?;
        Ok(undone)
    }

    pub fn set_read_only(&mut self, pane: PaneId, read_only: bool) -> Result<(), ViewError> {
        self.check_pane(pane)?;
        self.panes[pane.0].set_read_only(read_only);
        self.clear_read_only_selections();
        Ok(())
    }

    /// Revert one hunk of a relation: the target's lines become the source's.
    ///
    /// Returns `Ok(false)` without touching anything when `hunk` is not part
    /// of the relation's current sequence, so reverting the same hunk twice
    /// is a no-op the second time.
    pub fn revert_hunk(&mut self, id: RelationId, hunk: Hunk) -> Result<bool, ViewError> {
        let relation = self.relation(id)?;
        if !self.stores[id.0].contains(&hunk) {
            return Ok(false);
        }

        let (source, target) = pane_pair(&mut self.panes, relation.source.0, relation.target.0)
            .ok_or(ViewError::UnknownPane(relation.target))?;
        let changed = merge::revert(source, target, hunk).map_err(|e| {
            tracing::error!(relation = id.0, ?hunk, error = %e, "revert refused");
            e
        })?;
        self.dispatch()?;
        Ok(changed)
    }

    // ------------------------------------------------------------------
    // Live mirroring
    // ------------------------------------------------------------------

    /// Install the reference document. Attached panes are reloaded with its
    /// text.
    pub fn set_reference(&mut self, reference: Document) {
        let reloaded = self.mirror.set_reference(reference, &mut self.panes);
        self.refresh(&reloaded);
    }

    pub fn reference(&self) -> Option<&Document> {
        self.mirror.reference()
    }

    /// Load the reference text into `pane` and keep the two in sync
    pub fn attach_local(&mut self, pane: PaneId) -> Result<(), ViewError> {
        self.check_pane(pane)?;
        self.mirror.attach(pane, &mut self.panes[pane.0])?;
        self.refresh(&[pane]);
        Ok(())
    }

    pub fn detach_local(&mut self, pane: PaneId) -> Result<(), ViewError> {
        self.check_pane(pane)?;
        self.mirror.detach(pane, &mut self.panes[pane.0])?;
        self.clear_read_only_selections();
        Ok(())
    }

    /// Edit the reference document; attached panes follow
    pub fn edit_reference(
        &mut self,
        offset: usize,
        removed_len: usize,
        text: &str,
    ) -> Result<(), ViewError> {
        let touched = self
            .mirror
            .edit_reference(offset, removed_len, text, &mut self.panes)?;
        self.refresh(&touched);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rendering queries
    // ------------------------------------------------------------------

    /// Hunks drawn over `pane` that touch the line window `lines`
    pub fn hunks_at(
        &self,
        pane: PaneId,
        lines: Range<usize>,
    ) -> impl Iterator<Item = PaneHunk> + '_ {
        self.layout
            .overlays(pane)
            .into_iter()
            .filter_map(move |(relation, side)| {
                self.stores
                    .get(relation.0)
                    .map(|store| (relation, side, store))
            })
            .flat_map(move |(relation, side, store)| {
                store
                    .sequence()
                    .touching(side, lines.clone())
                    .map(move |hunk| PaneHunk {
                        relation,
                        side,
                        hunk,
                        tone: hunk.tone(side),
                    })
            })
    }

    /// Word highlight paths of a hunk, computed on first request. `None` when
    /// word-level diffing is off or the hunk is not current.
    pub fn paths_for(&mut self, id: RelationId, hunk: Hunk) -> Option<&HunkPaths> {
        if !self.word_level {
            return None;
        }
        let relation = self.layout.relation(id)?;
        let store = self.stores.get(id.0)?;
        if !store.contains(&hunk) {
            return None;
        }
        let source = self.panes.get(relation.source.0)?;
        let target = self.panes.get(relation.target.0)?;
        Some(self.cache.get_paths(
            store.sequence(),
            hunk,
            PaneView::new(source, &self.metrics),
            PaneView::new(target, &self.metrics),
        ))
    }

    /// Change presentation metrics. Cached word paths are dropped.
    pub fn set_metrics(&mut self, metrics: ViewMetrics) {
        if self.metrics == metrics {
            return;
        }
        self.metrics = metrics;
        self.cache.clear();
        for index in 0..self.panes.len() {
            self.update_extents(PaneId(index));
        }
    }

    pub fn set_word_level(&mut self, enabled: bool) {
        self.word_level = enabled;
        if !enabled {
            self.cache.clear();
        }
    }

    /// Connectors between the panes of a relation whose band is visible in
    /// either pane
    pub fn connectors(&self, id: RelationId) -> Vec<Connector> {
        let (Some(relation), Some(store), Some(layout)) = (
            self.layout.relation(id),
            self.stores.get(id.0),
            self.controls.get(id.0),
        ) else {
            return Vec::new();
        };
        let show_buttons = self.buttons_enabled(relation);
        let source_scroll = self.local_scroll(relation.source, Axis::Vertical);
        let target_scroll = self.local_scroll(relation.target, Axis::Vertical);
        let source_height = self.viewports[relation.source.0].1;
        let target_height = self.viewports[relation.target.0].1;
        let selected = self.selected[id.0];

        store
            .sequence()
            .iter()
            .filter_map(|hunk| {
                let source = Band::of(&hunk, Side::Source, &self.metrics, source_scroll);
                let target = Band::of(&hunk, Side::Target, &self.metrics, target_scroll);
                let visible = (source.bottom > 0.0 && source.top < source_height)
                    || (target.bottom > 0.0 && target.top < target_height);
                if !visible {
                    return None;
                }
                let (x1, x2) = layout.connector_span(&hunk, show_buttons);
                Some(Connector {
                    hunk,
                    source,
                    target,
                    x1,
                    x2,
                    button: show_buttons.then(|| layout.button(&hunk, source, target)),
                    selected: hunk == selected,
                })
            })
            .collect()
    }

    fn buttons_enabled(&self, relation: Relation) -> bool {
        self.panes
            .get(relation.target.0)
            .is_some_and(|target| !target.is_read_only())
    }

    fn clear_read_only_selections(&mut self) {
        for (index, relation) in self.layout.relations().iter().enumerate() {
            if !self.buttons_enabled(*relation) {
                self.selected[index] = Hunk::EMPTY;
            }
        }
    }

    // ------------------------------------------------------------------
    // Merge controls
    // ------------------------------------------------------------------

    /// Track the pointer over a relation's middle area. Returns the hunk
    /// whose merge button is now under the pointer.
    pub fn pointer_moved(&mut self, id: RelationId, x: f64, y: f64) -> Hunk {
        let point = Point { x, y };
        let hovered = self
            .connectors(id)
            .into_iter()
            .find(|c| c.button.is_some_and(|b| b.rect.contains(point)))
            .map(|c| c.hunk)
            .unwrap_or(Hunk::EMPTY);
        if let Some(selected) = self.selected.get_mut(id.0) {
            *selected = hovered;
        }
        hovered
    }

    pub fn pointer_left(&mut self, id: RelationId) {
        if let Some(selected) = self.selected.get_mut(id.0) {
            *selected = Hunk::EMPTY;
        }
    }

    /// Click on the middle area: revert the selected hunk, if any
    pub fn pointer_pressed(&mut self, id: RelationId) -> Result<bool, ViewError> {
        let hunk = self.selected_hunk(id);
        if hunk == Hunk::EMPTY {
            return Ok(false);
        }
        self.revert_hunk(id, hunk)
    }

    pub fn selected_hunk(&self, id: RelationId) -> Hunk {
        self.selected.get(id.0).copied().unwrap_or(Hunk::EMPTY)
    }

    // ------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------

    /// Resize a pane's visible area
    pub fn set_viewport(&mut self, pane: PaneId, width: f64, height: f64) -> Result<(), ViewError> {
        self.check_pane(pane)?;
        self.viewports[pane.0] = (width, height);
        self.update_extents(pane);
        Ok(())
    }

    pub fn logical_scroll_position(&self, axis: Axis) -> f64 {
        self.scroll.logical_value(axis)
    }

    pub fn local_scroll(&self, pane: PaneId, axis: Axis) -> f64 {
        self.scroll.local(pane, axis).map_or(0.0, |adj| adj.value)
    }

    /// Scroll one pane; the others follow proportionally
    pub fn scroll_pane(&mut self, pane: PaneId, axis: Axis, value: f64) -> Result<(), ViewError> {
        self.check_pane(pane)?;
        self.scroll.set_local_value(pane, axis, value);
        Ok(())
    }

    pub fn set_logical_scroll(&mut self, axis: Axis, value: f64) {
        self.scroll.set_logical_value(axis, value);
    }

    pub fn scroll_wheel(&mut self, direction: WheelDirection) {
        self.scroll.scroll_wheel(direction);
    }

    // ------------------------------------------------------------------
    // Overview
    // ------------------------------------------------------------------

    /// Markers of one overview strip
    pub fn overview_markers(&self, strip: usize) -> Vec<OverviewMarker> {
        let Some(strip) = self.layout.overview_strips().get(strip) else {
            return Vec::new();
        };
        let (Some(store), Some(pane)) = (
            self.stores.get(strip.relation.0),
            self.panes.get(strip.pane.0),
        ) else {
            return Vec::new();
        };
        overview_markers(store.sequence().iter(), strip.side, pane.line_count())
    }

    pub fn overview_viewport(&self) -> OverviewViewport {
        let logical = self.scroll.logical(Axis::Vertical);
        OverviewViewport {
            start: logical.value,
            height: logical.page_size,
        }
    }

    /// Click on an overview strip at `fraction` of its height
    pub fn overview_clicked(&mut self, fraction: f64) {
        self.scroll.jump_to_fraction(Axis::Vertical, fraction);
    }
}

/// Borrow two distinct panes, the first shared and the second mutable
fn pane_pair(
    panes: &mut [Document],
    source: usize,
    target: usize,
) -> Option<(&Document, &mut Document)> {
    if source == target || source >= panes.len() || target >= panes.len() {
        return None;
    }
    if source < target {
        let (head, tail) = panes.split_at_mut(target);
        Some((&head[source], &mut tail[0]))
    } else {
        let (head, tail) = panes.split_at_mut(source);
        Some((&tail[0], &mut head[target]))
    }
}
