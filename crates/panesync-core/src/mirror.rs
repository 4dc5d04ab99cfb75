//! Live mirroring of edits between attached panes and a reference document

use crate::document::{ChangeEvent, Document, TextBuffer};
use crate::scroll::PaneId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    #[error("No reference document to mirror")]
    NoReference,

    #[error("Pane {0} is not attached to the reference")]
    NotAttached(PaneId),
}

/// Keeps attached panes and one reference document in sync.
///
/// Every replay onto a document drains the change events it produced, so a
/// mirrored edit is never seen as a fresh local edit and mirrored again.
#[derive(Debug, Default)]
pub struct MirrorRegistry {
    reference: Option<Document>,
    attached: Vec<PaneId>,
}

impl MirrorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new reference. Panes already attached are reloaded with
    /// its text and returned, so later edits replay at matching offsets.
    pub fn set_reference(
        &mut self,
        reference: Document,
        documents: &mut [Document],
    ) -> Vec<PaneId> {
        let text = reference.text();
        self.reference = Some(reference);

        let mut reloaded = Vec::new();
        for &pane in &self.attached {
            if let Some(document) = documents.get_mut(pane.0) {
                document.load(&text);
                reloaded.push(pane);
            }
        }
        if !reloaded.is_empty() {
            tracing::debug!(panes = reloaded.len(), "reloaded attached panes");
        }
        reloaded
    }

    pub fn reference(&self) -> Option<&Document> {
        self.reference.as_ref()
    }

    pub fn is_attached(&self, pane: PaneId) -> bool {
        self.attached.contains(&pane)
    }

    pub fn attached(&self) -> &[PaneId] {
        &self.attached
    }

    /// Load the reference text into `document` and start mirroring it
    pub fn attach(&mut self, pane: PaneId, document: &mut Document) -> Result<(), MirrorError> {
        let Some(reference) = self.reference.as_ref() else {
            tracing::error!(pane = pane.0, "attach without a reference document");
            return Err(MirrorError::NoReference);
        };

        document.set_read_only(false);
        document.load(&reference.text());
        if !self.attached.contains(&pane) {
            self.attached.push(pane);
        }
        tracing::debug!(pane = pane.0, "attached to reference");
        Ok(())
    }

    /// Stop mirroring `pane` and make its document read-only
    pub fn detach(&mut self, pane: PaneId, document: &mut Document) -> Result<(), MirrorError> {
        let Some(index) = self.attached.iter().position(|p| *p == pane) else {
            tracing::error!(pane = pane.0, "detach of a pane that is not attached");
            return Err(MirrorError::NotAttached(pane));
        };
        self.attached.remove(index);
        document.set_read_only(true);
        Ok(())
    }

    /// Replay an edit made in `pane` onto the reference and every other
    /// attached pane. Returns the panes whose text changed as a result.
    /// Edits from panes that are not attached are ignored.
    pub fn on_local_changed(
        &mut self,
        pane: PaneId,
        event: &ChangeEvent,
        documents: &mut [Document],
    ) -> Result<Vec<PaneId>, MirrorError> {
        if !self.is_attached(pane) {
            return Ok(Vec::new());
        }
        let reference = self.reference.as_mut().ok_or(MirrorError::NoReference)?;
        reference.replace(event.offset, event.removed_len, &event.inserted);
        let events = reference.take_changes();
        Ok(self.forward(&events, documents, Some(pane)))
    }

    /// Edit the reference and forward the edit to every attached pane
    pub fn edit_reference(
        &mut self,
        offset: usize,
        removed_len: usize,
        text: &str,
        documents: &mut [Document],
    ) -> Result<Vec<PaneId>, MirrorError> {
        let reference = self.reference.as_mut().ok_or(MirrorError::NoReference)?;
        reference.replace(offset, removed_len, text);
        let events = reference.take_changes();
        Ok(self.forward(&events, documents, None))
    }

    fn forward(
        &self,
        events: &[ChangeEvent],
        documents: &mut [Document],
        origin: Option<PaneId>,
    ) -> Vec<PaneId> {
        if events.is_empty() {
            return Vec::new();
        }

        let mut touched = Vec::new();
        for &pane in self.attached.iter().filter(|p| Some(**p) != origin) {
            let Some(document) = documents.get_mut(pane.0) else {
                continue;
            };
            for event in events {
                document.replace(event.offset, event.removed_len, &event.inserted);
            }
            // The replayed edits are not local edits of this pane
            document.take_changes();
            touched.push(pane);
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(n: usize) -> Vec<Document> {
        (0..n).map(|_| Document::new("")).collect()
    }

    fn registry(text: &str) -> MirrorRegistry {
        let mut registry = MirrorRegistry::new();
        registry.set_reference(Document::new(text), &mut []);
        registry
    }

    #[test]
    fn test_attach_requires_reference() {
        let mut registry = MirrorRegistry::new();
        let mut doc = Document::new("x");
        assert_eq!(
            registry.attach(PaneId(0), &mut doc),
            Err(MirrorError::NoReference)
        );
        assert!(!registry.is_attached(PaneId(0)));
    }

    #[test]
    fn test_attach_copies_reference_and_unlocks() {
        let mut registry = registry("shared");
        let mut doc = Document::new("old");
        doc.set_read_only(true);
        registry.attach(PaneId(0), &mut doc).unwrap();
        assert_eq!(doc.text(), "shared");
        assert!(!doc.is_read_only());
        assert!(doc.take_changes().is_empty());
        assert!(!doc.can_undo());
    }

    #[test]
    fn test_new_reference_reloads_attached_panes() {
        let mut registry = registry("abc");
        let mut documents = docs(2);
        registry.attach(PaneId(0), &mut documents[0]).unwrap();

        let reloaded = registry.set_reference(Document::new("xyz123"), &mut documents);
        assert_eq!(reloaded, vec![PaneId(0)]);
        assert_eq!(documents[0].text(), "xyz123");
        assert_eq!(documents[1].text(), "");

        documents[0].insert(3, "!");
        let events = documents[0].take_changes();
        for event in &events {
            registry.on_local_changed(PaneId(0), event, &mut documents).unwrap();
        }
        assert_eq!(documents[0].text(), "xyz!123");
        assert_eq!(registry.reference().unwrap().text(), "xyz!123");
    }

    #[test]
    fn test_local_edit_is_applied_exactly_once_everywhere() {
        let mut registry = registry("abc");
        let mut documents = docs(3);
        for pane in [PaneId(0), PaneId(2)] {
            registry.attach(pane, &mut documents[pane.0]).unwrap();
        }

        // The user types into pane 0
        documents[0].replace(1, 1, "XY");
        let events = documents[0].take_changes();
        let mut touched = Vec::new();
        for event in &events {
            touched.extend(registry.on_local_changed(PaneId(0), event, &mut documents).unwrap());
        }

        assert_eq!(touched, vec![PaneId(2)]);
        assert_eq!(documents[0].text(), "aXYc");
        assert_eq!(documents[2].text(), "aXYc");
        assert_eq!(registry.reference().unwrap().text(), "aXYc");
        assert!(documents[2].take_changes().is_empty());
        assert_eq!(documents[1].text(), "");
    }

    #[test]
    fn test_reference_edit_reaches_every_local_once() {
        let mut registry = registry("line");
        let mut documents = docs(2);
        registry.attach(PaneId(0), &mut documents[0]).unwrap();
        registry.attach(PaneId(1), &mut documents[1]).unwrap();

        let touched = registry.edit_reference(4, 0, "!", &mut documents).unwrap();
        assert_eq!(touched, vec![PaneId(0), PaneId(1)]);
        assert_eq!(documents[0].text(), "line!");
        assert_eq!(documents[1].text(), "line!");
    }

    #[test]
    fn test_detach_stops_mirroring() {
        let mut registry = registry("a");
        let mut documents = docs(2);
        registry.attach(PaneId(0), &mut documents[0]).unwrap();
        registry.attach(PaneId(1), &mut documents[1]).unwrap();
        registry.detach(PaneId(1), &mut documents[1]).unwrap();
        assert!(documents[1].is_read_only());

        registry.edit_reference(0, 1, "b", &mut documents).unwrap();
        assert_eq!(documents[0].text(), "b");
        assert_eq!(documents[1].text(), "a");

        assert_eq!(
            registry.detach(PaneId(1), &mut documents[1]),
            Err(MirrorError::NotAttached(PaneId(1)))
        );
    }

    #[test]
    fn test_edits_from_unattached_panes_are_ignored() {
        let mut registry = registry("a");
        let mut documents = docs(1);
        let event = ChangeEvent {
            offset: 0,
            removed_len: 0,
            inserted: "z".to_string(),
        };
        assert!(registry
            .on_local_changed(PaneId(0), &event, &mut documents)
            .unwrap()
            .is_empty());
        assert_eq!(registry.reference().unwrap().text(), "a");
    }
}
