use super::types::TranscriptEntry;
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared, append-only copy of the transcript held by the front end.
#[derive(Debug, Clone)]
pub struct TranscriptLog {
    entries: Arc<RwLock<Vec<TranscriptEntry>>>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn push(&self, entry: TranscriptEntry) {
        self.entries.write().push(entry);
    }

    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries.read().clone()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for TranscriptLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Speaker;

    #[test]
    fn test_push_preserves_order() {
        let log = TranscriptLog::new();
        log.push(TranscriptEntry::new(Speaker::Bot, "first"));
        log.push(TranscriptEntry::new(Speaker::User, "second"));

        let texts: Vec<_> = log.snapshot().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_clones_share_entries() {
        let log = TranscriptLog::new();
        let other = log.clone();
        other.push(TranscriptEntry::new(Speaker::Bot, "hi"));
        assert_eq!(log.len(), 1);

        log.clear();
        assert!(other.is_empty());
    }
}
