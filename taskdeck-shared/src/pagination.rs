/// Offset pagination and title search helpers
///
/// Every list endpoint returns a [`Page`] envelope with a fixed page size of
/// [`PER_PAGE`].
///
/// # Example
///
/// ```
/// use taskdeck_shared::pagination::{Page, PageRequest};
///
/// let request = PageRequest::new(Some(2));
/// assert_eq!(request.offset(), 10);
///
/// let page = Page::new(vec!["k"], request, 11);
/// assert_eq!(page.last_page, 2);
/// assert_eq!(page.from, Some(11));
/// assert_eq!(page.to, Some(11));
/// ```

use serde::{Deserialize, Serialize};

/// Fixed page size for every list endpoint
pub const PER_PAGE: i64 = 10;

/// A validated 1-based page number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
}

impl PageRequest {
    /// Builds a request, treating missing or non-positive pages as page 1
    pub fn new(page: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(1),
        }
    }

    /// 1-based page number
    pub fn page(&self) -> i64 {
        self.page
    }

    /// Rows to skip
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(PER_PAGE)
    }

    /// Rows to return
    pub fn limit(&self) -> i64 {
        PER_PAGE
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Paginated list envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub data: Vec<T>,

    /// 1-based page number
    pub current_page: i64,

    /// Last page number, at least 1 even for an empty result
    pub last_page: i64,

    /// Page size
    pub per_page: i64,

    /// Total matching rows
    pub total: i64,

    /// 1-based index of the first item on this page
    pub from: Option<i64>,

    /// 1-based index of the last item on this page
    pub to: Option<i64>,
}

impl<T> Page<T> {
    /// Wraps one page of rows together with the total row count
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        let last_page = ((total + PER_PAGE - 1) / PER_PAGE).max(1);
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let from = request.offset() + 1;
            (Some(from), Some(from + data.len() as i64 - 1))
        };

        Self {
            data,
            current_page: request.page(),
            last_page,
            per_page: PER_PAGE,
            total,
            from,
            to,
        }
    }

    /// Maps the items while keeping the paging metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            last_page: self.last_page,
            per_page: self.per_page,
            total: self.total,
            from: self.from,
            to: self.to,
        }
    }
}

/// Turns a user search term into an `ILIKE` substring pattern
///
/// `%`, `_` and `\` in the term match literally. Use with `ESCAPE '\'`.
///
/// # Example
///
/// ```
/// use taskdeck_shared::pagination::search_pattern;
///
/// assert_eq!(search_pattern("50%"), "%50\\%%");
/// ```
pub fn search_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Normalizes an optional search term: blank means no filter
pub fn normalize_search(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(search_pattern)
}
