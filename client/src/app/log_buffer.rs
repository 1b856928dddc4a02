//! Session log buffer
//!
//! Append-only between resets. The log collector is the only appender; the
//! submission controller resets it when a new attempt starts.

use tokio::sync::{watch, RwLock};

#[derive(Debug, Default)]
struct Lines {
    epoch: u64,
    lines: Vec<String>,
}

/// Read position of a follower; survives resets by tracking the epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogCursor {
    epoch: u64,
    index: usize,
}

/// Ordered build log lines for the current submission
pub struct LogBuffer {
    inner: RwLock<Lines>,
    changes: watch::Sender<u64>,
}

impl LogBuffer {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: RwLock::new(Lines::default()),
            changes,
        }
    }

    pub(crate) async fn append(&self, line: String) {
        self.inner.write().await.lines.push(line);
        self.changes.send_modify(|version| *version += 1);
    }

    pub(crate) async fn clear(&self) {
        {
            let mut inner = self.inner.write().await;
            inner.lines.clear();
            inner.epoch += 1;
        }
        self.changes.send_modify(|version| *version += 1);
    }

    /// All lines in arrival order
    pub async fn lines(&self) -> Vec<String> {
        self.inner.read().await.lines.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.lines.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Lines added since the cursor last read, advancing it
    pub async fn read_from(&self, cursor: &mut LogCursor) -> Vec<String> {
        let inner = self.inner.read().await;
        if cursor.epoch != inner.epoch || cursor.index > inner.lines.len() {
            *cursor = LogCursor {
                epoch: inner.epoch,
                index: 0,
            };
        }
        let fresh = inner.lines[cursor.index..].to_vec();
        cursor.index = inner.lines.len();
        fresh
    }

    /// Notified after every append or reset
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_keeps_arrival_order() {
        let buffer = LogBuffer::new();
        for line in ["Step 1/3 : FROM python", "Step 2/3 : COPY . .", "Step 3/3 : CMD app"] {
            buffer.append(line.to_string()).await;
        }

        assert_eq!(
            buffer.lines().await,
            vec!["Step 1/3 : FROM python", "Step 2/3 : COPY . .", "Step 3/3 : CMD app"]
        );
    }

    #[tokio::test]
    async fn test_clear_empties_buffer() {
        let buffer = LogBuffer::new();
        buffer.append("old".to_string()).await;
        buffer.clear().await;

        assert!(buffer.is_empty().await);
    }

    #[tokio::test]
    async fn test_cursor_follows_appends() {
        let buffer = LogBuffer::new();
        let mut cursor = LogCursor::default();

        buffer.append("a".to_string()).await;
        buffer.append("b".to_string()).await;
        assert_eq!(buffer.read_from(&mut cursor).await, vec!["a", "b"]);
        assert!(buffer.read_from(&mut cursor).await.is_empty());

        buffer.append("c".to_string()).await;
        assert_eq!(buffer.read_from(&mut cursor).await, vec!["c"]);
    }

    #[tokio::test]
    async fn test_cursor_restarts_after_reset() {
        let buffer = LogBuffer::new();
        let mut cursor = LogCursor::default();

        buffer.append("a".to_string()).await;
        buffer.append("b".to_string()).await;
        buffer.read_from(&mut cursor).await;

        buffer.clear().await;
        buffer.append("x".to_string()).await;
        buffer.append("y".to_string()).await;
        buffer.append("z".to_string()).await;
        assert_eq!(buffer.read_from(&mut cursor).await, vec!["x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_subscribe_sees_changes() {
        let buffer = LogBuffer::new();
        let mut changes = buffer.subscribe();

        buffer.append("a".to_string()).await;
        changes.changed().await.unwrap();
        assert_eq!(*changes.borrow_and_update(), 1);
    }
}
