//! panesync-core - multi-pane diff/merge synchronization engine
//!
//! Line hunks between two or three editor panes, word-level refinement of
//! hunks on demand, proportional scroll synchronization and hunk reverts.
//! [`CompareView`] ties the pieces together for a two- or three-pane layout.

pub mod config;
pub mod diff;
pub mod document;
pub mod geometry;
pub mod hunk;
pub mod layout;
pub mod merge;
pub mod mirror;
pub mod scroll;
pub mod store;
pub mod view;
pub mod word_cache;
pub mod words;

pub use config::{Config, ConfigError};
pub use diff::{DiffAlgorithm, DiffEngine};
pub use document::{ChangeEvent, Document, LineSpan, TextBuffer};
pub use geometry::{Band, Connector, DiffPath, OverviewMarker, Point, Rect, ViewMetrics};
pub use hunk::{Hunk, HunkSequence, Side, Tone};
pub use layout::{Layout, Relation, RelationId};
pub use merge::{revert, MergeError};
pub use mirror::{MirrorError, MirrorRegistry};
pub use scroll::{Adjustment, Axis, PaneId, ScrollSynchronizer, WheelDirection};
pub use store::HunkStore;
pub use view::{CompareView, OverviewViewport, PaneHunk, ViewError};
pub use word_cache::{HunkPaths, PaneView, WordDiffCache};
