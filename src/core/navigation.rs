//! # Citation Navigation
//!
//! Maps a citation (document + page) to locator updates for the document
//! viewer.
//!
//! A viewer still rendering one document drops a combined "other document
//! at page N" update, so a jump to a different document is split in two:
//!
//! ```text
//! navigate_to(doc1, 5), viewer on doc2:
//!   locator = <base>/static/doc1            (reload)    → Deferred(seek)
//!   ... seek delay ...
//!   complete_seek(seek)
//!   locator = <base>/static/doc1#page=5     (seek)
//!
//! navigate_to(doc1, 5), viewer on doc1:
//!   locator = <base>/static/doc1#page=5                 → Applied
//! ```
//!
//! Each navigation bumps a generation counter. A deferred seek only applies
//! if no later navigation happened and the viewer still shows its document.

use std::time::Duration;

use log::debug;

/// Address of a served document.
pub fn document_locator(base_url: &str, document_id: &str) -> String {
    format!(
        "{}/static/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(document_id)
    )
}

/// Address of a served document scrolled to `page`.
pub fn page_locator(base_url: &str, document_id: &str, page: u32) -> String {
    format!("{}#page={}", document_locator(base_url, document_id), page)
}

/// What the document surface is currently told to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerState {
    pub active_document: Option<String>,
    pub pending_page: Option<u32>,
    pub locator: Option<String>,
    /// Number of locator updates issued so far.
    pub revision: u64,
}

/// Second half of a reload-then-seek, due after the seek delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSeek {
    pub document_id: String,
    pub page: u32,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Page locator issued immediately.
    Applied,
    /// Document reloaded; the seek must be completed after the delay.
    Deferred(PageSeek),
}

#[derive(Debug, Clone)]
pub struct NavigationBridge {
    base_url: String,
    seek_delay: Duration,
    generation: u64,
    viewer: ViewerState,
}

impl NavigationBridge {
    pub fn new(base_url: impl Into<String>, seek_delay: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            seek_delay,
            generation: 0,
            viewer: ViewerState::default(),
        }
    }

    pub fn viewer(&self) -> &ViewerState {
        &self.viewer
    }

    pub fn seek_delay(&self) -> Duration {
        self.seek_delay
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shows `document_id` from its first page (upload, session selection).
    pub fn open(&mut self, document_id: &str) {
        self.generation += 1;
        self.load_document(document_id);
    }

    pub fn navigate_to(&mut self, document_id: &str, page: u32) -> Navigation {
        self.generation += 1;

        if self.viewer.active_document.as_deref() == Some(document_id) {
            self.seek(document_id, page);
            return Navigation::Applied;
        }

        self.load_document(document_id);
        debug!(
            "Deferring seek to page {} of {} (generation {})",
            page, document_id, self.generation
        );
        Navigation::Deferred(PageSeek {
            document_id: document_id.to_string(),
            page,
            generation: self.generation,
        })
    }

    /// Applies a deferred seek. Returns false if it was superseded.
    pub fn complete_seek(&mut self, seek: &PageSeek) -> bool {
        if seek.generation != self.generation
            || self.viewer.active_document.as_deref() != Some(seek.document_id.as_str())
        {
            debug!(
                "Dropping superseded seek to page {} of {}",
                seek.page, seek.document_id
            );
            return false;
        }
        self.seek(&seek.document_id, seek.page);
        true
    }

    /// Clears the viewer (sign-out, session removed).
    pub fn close(&mut self) {
        self.generation += 1;
        if self.viewer.locator.is_some() {
            self.viewer.revision += 1;
        }
        self.viewer.active_document = None;
        self.viewer.pending_page = None;
        self.viewer.locator = None;
    }

    fn load_document(&mut self, document_id: &str) {
        self.viewer.active_document = Some(document_id.to_string());
        self.viewer.pending_page = None;
        self.viewer.locator = Some(document_locator(&self.base_url, document_id));
        self.viewer.revision += 1;
    }

    fn seek(&mut self, document_id: &str, page: u32) {
        self.viewer.pending_page = Some(page);
        self.viewer.locator = Some(page_locator(&self.base_url, document_id, page));
        self.viewer.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8000";

    fn bridge() -> NavigationBridge {
        NavigationBridge::new(BASE, Duration::from_millis(100))
    }

    #[test]
    fn test_locators_escape_document_name() {
        assert_eq!(
            document_locator(BASE, "my lease.pdf"),
            "http://localhost:8000/static/my%20lease.pdf"
        );
        assert_eq!(
            page_locator("http://h/", "a&b.pdf", 3),
            "http://h/static/a%26b.pdf#page=3"
        );
    }

    #[test]
    fn test_same_document_is_single_update() {
        let mut nav = bridge();
        nav.open("doc1.pdf");
        let before = nav.viewer().revision;

        assert_eq!(nav.navigate_to("doc1.pdf", 5), Navigation::Applied);

        let viewer = nav.viewer();
        assert_eq!(viewer.revision, before + 1);
        assert_eq!(viewer.pending_page, Some(5));
        assert!(viewer.locator.as_deref().unwrap().ends_with("#page=5"));
    }

    #[test]
    fn test_other_document_reloads_then_seeks() {
        let mut nav = bridge();
        nav.open("doc2.pdf");
        let before = nav.viewer().revision;

        let Navigation::Deferred(seek) = nav.navigate_to("doc1.pdf", 5) else {
            panic!("expected deferred seek");
        };
        assert_eq!(nav.viewer().revision, before + 1);
        assert_eq!(
            nav.viewer().locator.as_deref(),
            Some("http://localhost:8000/static/doc1.pdf")
        );
        assert_eq!(nav.viewer().active_document.as_deref(), Some("doc1.pdf"));
        assert_eq!(nav.viewer().pending_page, None);

        assert!(nav.complete_seek(&seek));
        assert_eq!(nav.viewer().revision, before + 2);
        assert_eq!(
            nav.viewer().locator.as_deref(),
            Some("http://localhost:8000/static/doc1.pdf#page=5")
        );
    }

    #[test]
    fn test_empty_viewer_defers() {
        let mut nav = bridge();
        assert!(matches!(nav.navigate_to("a.pdf", 2), Navigation::Deferred(_)));
    }

    #[test]
    fn test_newer_navigation_supersedes_pending_seek() {
        let mut nav = bridge();
        let Navigation::Deferred(first) = nav.navigate_to("a.pdf", 2) else {
            panic!("expected deferred seek");
        };
        assert_eq!(nav.navigate_to("a.pdf", 7), Navigation::Applied);

        assert!(!nav.complete_seek(&first));
        assert_eq!(nav.viewer().pending_page, Some(7));
    }

    #[test]
    fn test_seek_dropped_after_close() {
        let mut nav = bridge();
        let Navigation::Deferred(seek) = nav.navigate_to("a.pdf", 2) else {
            panic!("expected deferred seek");
        };
        nav.close();
        assert!(!nav.complete_seek(&seek));
        assert_eq!(nav.viewer().locator, None);
        assert_eq!(nav.viewer().active_document, None);
    }

    #[test]
    fn test_open_resets_page() {
        let mut nav = bridge();
        nav.open("a.pdf");
        nav.navigate_to("a.pdf", 4);
        nav.open("b.pdf");
        assert_eq!(nav.viewer().pending_page, None);
        assert_eq!(nav.viewer().active_document.as_deref(), Some("b.pdf"));
    }
}
