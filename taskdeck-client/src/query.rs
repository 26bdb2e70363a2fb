/// List query state for the task views
///
/// [`TaskQuery`] holds what the dashboard and folder views send to the list
/// endpoints; [`PageCursor`] tracks where in the result the user is.

use taskdeck_shared::pagination::Page;

/// Page, search and priority filter of a task listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    page: i64,
    search: Option<String>,
    priority_only: bool,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            page: 1,
            search: None,
            priority_only: false,
        }
    }
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn priority_only(&self) -> bool {
        self.priority_only
    }

    /// Sets the search term and returns to page 1
    ///
    /// A blank term clears the search.
    pub fn set_search(&mut self, term: &str) {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self.page = 1;
    }

    /// Toggles the priority filter and returns to page 1
    pub fn set_priority_only(&mut self, priority_only: bool) {
        if self.priority_only != priority_only {
            self.priority_only = priority_only;
            self.page = 1;
        }
    }

    /// Jumps to `page`, never below 1
    pub fn set_page(&mut self, page: i64) {
        self.page = page.max(1);
    }

    /// Builder form of [`set_search`](Self::set_search)
    pub fn with_search(mut self, term: &str) -> Self {
        self.set_search(term);
        self
    }

    /// Builder form of [`set_page`](Self::set_page)
    pub fn with_page(mut self, page: i64) -> Self {
        self.set_page(page);
        self
    }

    /// Query-string pairs for the list endpoints
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string())];
        if let Some(ref search) = self.search {
            pairs.push(("search", search.clone()));
        }
        if self.priority_only {
            pairs.push(("priority", "1".to_string()));
        }
        pairs
    }
}

/// Current and last page of a paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    current: i64,
    last: i64,
}

impl PageCursor {
    /// Creates a cursor, clamping `current` into `1..=last`
    pub fn new(current: i64, last: i64) -> Self {
        let last = last.max(1);
        Self {
            current: current.clamp(1, last),
            last,
        }
    }

    /// Cursor matching a fetched page
    pub fn from_page<T>(page: &Page<T>) -> Self {
        Self::new(page.current_page, page.last_page)
    }

    pub fn current(&self) -> i64 {
        self.current
    }

    pub fn last(&self) -> i64 {
        self.last
    }

    pub fn has_next(&self) -> bool {
        self.current < self.last
    }

    pub fn has_prev(&self) -> bool {
        self.current > 1
    }

    /// Advances one page, staying on the last page at the end
    pub fn next(&mut self) -> i64 {
        self.go_to(self.current + 1)
    }

    /// Goes back one page, staying on page 1 at the start
    pub fn prev(&mut self) -> i64 {
        self.go_to(self.current - 1)
    }

    /// Jumps to `page`, clamped into `1..=last`
    pub fn go_to(&mut self, page: i64) -> i64 {
        self.current = page.clamp(1, self.last);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_shared::pagination::PageRequest;

    #[test]
    fn test_search_resets_page() {
        let mut query = TaskQuery::new().with_page(4);
        assert_eq!(query.page(), 4);

        query.set_search("  report ");
        assert_eq!(query.page(), 1);
        assert_eq!(query.search(), Some("report"));

        query.set_page(3);
        query.set_search("   ");
        assert_eq!(query.search(), None);
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_priority_toggle_resets_page_only_on_change() {
        let mut query = TaskQuery::new().with_page(2);
        query.set_priority_only(false);
        assert_eq!(query.page(), 2);

        query.set_priority_only(true);
        assert_eq!(query.page(), 1);
        assert!(query.priority_only());
    }

    #[test]
    fn test_query_pairs() {
        assert_eq!(TaskQuery::new().to_query_pairs(), vec![("page", "1".to_string())]);

        let mut query = TaskQuery::new().with_search("a_b");
        query.set_priority_only(true);
        query.set_page(2);
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("page", "2".to_string()),
                ("search", "a_b".to_string()),
                ("priority", "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_cursor_clamps() {
        let mut cursor = PageCursor::new(1, 3);
        assert!(!cursor.has_prev());
        assert_eq!(cursor.prev(), 1);
        assert_eq!(cursor.next(), 2);
        assert_eq!(cursor.next(), 3);
        assert_eq!(cursor.next(), 3);
        assert!(!cursor.has_next());
        assert_eq!(cursor.go_to(0), 1);
        assert_eq!(cursor.go_to(99), 3);
    }

    #[test]
    fn test_cursor_from_empty_page() {
        let page: Page<()> = Page::new(vec![], PageRequest::new(Some(5)), 0);
        let cursor = PageCursor::from_page(&page);
        assert_eq!(cursor.last(), 1);
        assert_eq!(cursor.current(), 1);
    }
}
