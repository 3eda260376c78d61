//! Short, fire-and-forget notices for the display layer ("Color Saved", camera errors, ...).

/// How a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: Option<String>,
    pub description: String,
}

impl Notice {
    pub fn info(title: Option<&str>, description: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.map(str::to_string),
            description: description.into(),
        }
    }

    pub fn error(title: &str, description: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: Some(title.to_string()),
            description: description.into(),
        }
    }
}

/// The notification surface. The core signals; it never renders.
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Collects notices in memory.
#[derive(Debug, Clone, Default)]
pub struct NoticeLog {
    pub notices: Vec<Notice>,
}

impl NoticeLog {
    pub fn last(&self) -> Option<&Notice> {
        self.notices.last()
    }
}

impl Notifier for NoticeLog {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// Drops every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Notifier for Silent {
    fn notify(&mut self, _notice: Notice) {}
}
