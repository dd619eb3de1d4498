use chrono::{DateTime, Utc};

/// A note as stored in the `note` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for a note that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub is_done: bool,
}

/// Sparse set of changes. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_done: Option<bool>,
}

impl NotePatch {
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.is_done.is_none()
    }
}

impl Note {
    /// Overwrites only the fields present in `patch`. `id` and `created_at`
    /// are never touched.
    pub fn apply(&mut self, patch: NotePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(is_done) = patch.is_done {
            self.is_done = is_done;
        }
    }
}
