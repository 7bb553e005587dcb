//! Page of list records

use crate::model::Record;

/// A page of list records with pagination metrics.
///
/// # Example
///
/// ```
/// use gridlist_lib::model::Record;
/// use gridlist_lib::pagination::RecordPage;
///
/// let page = RecordPage::new(vec![Record::new("Movie"); 5])
///     .with_page(3, 20)
///     .with_total(45);
///
/// assert_eq!(page.last_page(), Some(3));
/// assert_eq!(page.first_item(), Some(41));
/// assert_eq!(page.last_item(), Some(45));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPage {
    records: Vec<Record>,
    current_page: usize,
    per_page: Option<usize>,
    total: Option<usize>,
    has_more: bool,
}

impl RecordPage {
    /// Creates an unpaginated page holding every record.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            current_page: 1,
            per_page: None,
            total: None,
            has_more: false,
        }
    }

    /// Sets the page number and page size.
    pub fn with_page(mut self, current_page: usize, per_page: usize) -> Self {
        self.current_page = current_page.max(1);
        self.per_page = Some(per_page);
        self
    }

    /// Sets the total number of matching records.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    /// Sets whether a further page exists.
    pub fn with_more_pages(mut self, has_more: bool) -> Self {
        self.has_more = has_more;
        self
    }

    /// Returns the records on this page.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the page and returns the records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Replaces the records, keeping the metrics.
    pub fn replace_records(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    /// Number of records on this page.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the page holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The 1-based page number.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// The page size, when paginated.
    pub fn per_page(&self) -> Option<usize> {
        self.per_page
    }

    /// Total matching records, when counted.
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    /// The last page number, when counted.
    pub fn last_page(&self) -> Option<usize> {
        let total = self.total?;
        match self.per_page {
            Some(per_page) if per_page > 0 => Some(total.div_ceil(per_page).max(1)),
            _ => Some(1),
        }
    }

    /// Position of the first record on this page among all matches.
    pub fn first_item(&self) -> Option<usize> {
        if self.records.is_empty() {
            return None;
        }
        let per_page = self.per_page.unwrap_or(0);
        Some(
            (self.current_page - 1)
                .saturating_mul(per_page)
                .saturating_add(1),
        )
    }

    /// Position of the last record on this page among all matches.
    pub fn last_item(&self) -> Option<usize> {
        self.first_item()
            .map(|first| first.saturating_add(self.records.len() - 1))
    }

    /// Returns `true` if a further page exists.
    pub fn has_more_pages(&self) -> bool {
        match self.last_page() {
            Some(last) => self.current_page < last,
            None => self.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_page_has_no_items() {
        let page = RecordPage::new(Vec::new()).with_page(1, 20).with_total(0);
        assert_eq!(page.first_item(), None);
        assert_eq!(page.last_item(), None);
        assert_eq!(page.last_page(), Some(1));
        assert!(!page.has_more_pages());
    }

    #[test]
    fn test_simple_pagination_uses_flag() {
        let page = RecordPage::new(vec![Record::new("Movie")])
            .with_page(2, 1)
            .with_more_pages(true);
        assert_eq!(page.total(), None);
        assert!(page.has_more_pages());
    }
}
