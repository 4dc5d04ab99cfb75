//! Pane arrangements of a compare view

use crate::hunk::Side;
use crate::scroll::PaneId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a diff relation inside a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationId(pub usize);

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A diffed pane pair. The target is the pane reverts write into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub source: PaneId,
    pub target: PaneId,
    /// True when the source pane sits left of the middle area
    pub source_on_left: bool,
}

/// Which side of which relation an overview strip tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverviewStrip {
    pub pane: PaneId,
    pub relation: RelationId,
    pub side: Side,
}

const TWO_PANE_RELATIONS: [Relation; 1] = [Relation {
    source: PaneId(0),
    target: PaneId(1),
    source_on_left: true,
}];

const THREE_PANE_RELATIONS: [Relation; 2] = [
    Relation {
        source: PaneId(0),
        target: PaneId(1),
        source_on_left: true,
    },
    Relation {
        source: PaneId(2),
        target: PaneId(1),
        source_on_left: false,
    },
];

const TWO_PANE_STRIPS: [OverviewStrip; 2] = [
    OverviewStrip {
        pane: PaneId(0),
        relation: RelationId(0),
        side: Side::Source,
    },
    OverviewStrip {
        pane: PaneId(1),
        relation: RelationId(0),
        side: Side::Target,
    },
];

const THREE_PANE_STRIPS: [OverviewStrip; 2] = [
    OverviewStrip {
        pane: PaneId(0),
        relation: RelationId(0),
        side: Side::Source,
    },
    OverviewStrip {
        pane: PaneId(2),
        relation: RelationId(1),
        side: Side::Source,
    },
];

/// Pane arrangement, fixed when the view is built. Pane 1 is always the
/// main pane every relation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Left pane diffed against the main pane
    #[default]
    TwoPane,
    /// Left and right panes each diffed against the centre pane
    ThreePane,
}

impl Layout {
    pub fn pane_count(self) -> usize {
        match self {
            Layout::TwoPane => 2,
            Layout::ThreePane => 3,
        }
    }

    pub fn main_pane(self) -> PaneId {
        PaneId(1)
    }

    pub fn relations(self) -> &'static [Relation] {
        match self {
            Layout::TwoPane => &TWO_PANE_RELATIONS,
            Layout::ThreePane => &THREE_PANE_RELATIONS,
        }
    }

    pub fn relation(self, id: RelationId) -> Option<Relation> {
        self.relations().get(id.0).copied()
    }

    /// Relations that involve `pane`, either side
    pub fn relations_of(self, pane: PaneId) -> impl Iterator<Item = RelationId> {
        self.relations()
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.source == pane || r.target == pane)
            .map(|(i, _)| RelationId(i))
    }

    /// Relation sides whose hunks are drawn over `pane`. In three-pane mode
    /// the main pane carries both relations.
    pub fn overlays(self, pane: PaneId) -> Vec<(RelationId, Side)> {
        match (self, pane.0) {
            (Layout::TwoPane, 0) => vec![(RelationId(0), Side::Source)],
            (Layout::TwoPane, 1) => vec![(RelationId(0), Side::Target)],
            (Layout::ThreePane, 0) => vec![(RelationId(0), Side::Source)],
            (Layout::ThreePane, 1) => {
                vec![(RelationId(0), Side::Target), (RelationId(1), Side::Target)]
            }
            (Layout::ThreePane, 2) => vec![(RelationId(1), Side::Source)],
            _ => Vec::new(),
        }
    }

    pub fn overview_strips(self) -> &'static [OverviewStrip] {
        match self {
            Layout::TwoPane => &TWO_PANE_STRIPS,
            Layout::ThreePane => &THREE_PANE_STRIPS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_pane_is_every_target() {
        for layout in [Layout::TwoPane, Layout::ThreePane] {
            assert!(layout.relations().iter().all(|r| r.target == layout.main_pane()));
            assert_eq!(layout.relations().len(), layout.pane_count() - 1);
        }
    }

    #[test]
    fn test_three_pane_relations() {
        let right = Layout::ThreePane.relation(RelationId(1)).unwrap();
        assert_eq!(right.source, PaneId(2));
        assert!(!right.source_on_left);
        assert!(Layout::TwoPane.relation(RelationId(1)).is_none());
    }

    #[test]
    fn test_relations_of_pane() {
        let main: Vec<_> = Layout::ThreePane.relations_of(PaneId(1)).collect();
        assert_eq!(main, vec![RelationId(0), RelationId(1)]);
        let right: Vec<_> = Layout::ThreePane.relations_of(PaneId(2)).collect();
        assert_eq!(right, vec![RelationId(1)]);
    }

    #[test]
    fn test_overlays() {
        assert_eq!(
            Layout::ThreePane.overlays(PaneId(1)),
            vec![(RelationId(0), Side::Target), (RelationId(1), Side::Target)]
        );
        assert_eq!(
            Layout::TwoPane.overlays(PaneId(0)),
            vec![(RelationId(0), Side::Source)]
        );
        assert!(Layout::TwoPane.overlays(PaneId(2)).is_empty());
    }

    #[test]
    fn test_overview_strips_track_outer_panes_in_three_pane_mode() {
        let panes: Vec<_> = Layout::ThreePane
            .overview_strips()
            .iter()
            .map(|s| s.pane)
            .collect();
        assert_eq!(panes, vec![PaneId(0), PaneId(2)]);
        assert_eq!(Layout::TwoPane.overview_strips()[1].side, Side::Target);
    }
}
