//! Executes list queries page by page

use log::debug;

use super::RecordPage;
use crate::error::Error;
use crate::executor::QueryExecutor;
use crate::hooks::ExtensionHooks;
use crate::query::ListQuery;
use crate::storage::SESSION_LAST_PAGE;
use crate::storage::SessionStore;

/// How a list pages its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSettings {
    /// Page size; `None` or `0` disables pagination.
    pub per_page: Option<usize>,
    /// Whether pagination is shown at all.
    pub show_pagination: bool,
    /// Counted pagination with page numbers, else "has more" pagination.
    pub show_page_numbers: bool,
}

impl PageSettings {
    /// Page size when pagination is in effect.
    pub fn effective_per_page(&self) -> Option<usize> {
        if !self.show_pagination {
            return None;
        }
        self.per_page.filter(|per_page| *per_page > 0)
    }
}

/// Resolves the current page and fetches it.
pub struct Paginator<'a> {
    executor: &'a dyn QueryExecutor,
    session: Option<&'a SessionStore>,
    hooks: Option<&'a ExtensionHooks>,
}

impl<'a> Paginator<'a> {
    pub fn new(executor: &'a dyn QueryExecutor) -> Self {
        Self {
            executor,
            session: None,
            hooks: None,
        }
    }

    /// Restores and saves the last visited page in `session`.
    pub fn session(mut self, session: &'a SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    /// Invites the records hook after fetching.
    pub fn hooks(mut self, hooks: &'a ExtensionHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Resolves the page to show: the requested page, else the last visited
    /// page, else 1, clamped to the last page holding records.
    pub fn resolve_page(
        &self,
        query: &ListQuery,
        requested: Option<usize>,
        per_page: usize,
    ) -> Result<(usize, Option<usize>), Error> {
        let mut page = match requested.filter(|page| *page > 0) {
            Some(page) => page,
            None => match self.session {
                Some(session) => session.get::<usize>(SESSION_LAST_PAGE)?.unwrap_or(1),
                None => 1,
            },
        }
        .max(1);

        let mut count = None;
        if page > 1 {
            let total = self.executor.count(query)?;
            if total <= (page - 1).saturating_mul(per_page) {
                let clamped = total.div_ceil(per_page).max(1);
                debug!("Page {} is past the last page; showing page {}", page, clamped);
                page = clamped;
            }
            count = Some(total);
        }
        Ok((page, count))
    }

    /// Fetches the records for the query.
    pub fn fetch(
        &self,
        query: &ListQuery,
        requested: Option<usize>,
        settings: PageSettings,
    ) -> Result<RecordPage, Error> {
        let mut page = match settings.effective_per_page() {
            Some(per_page) => {
                let (current, count) = self.resolve_page(query, requested, per_page)?;
                let offset = (current - 1).saturating_mul(per_page);

                let page = if settings.show_page_numbers {
                    let total = match count {
                        Some(total) => total,
                        None => self.executor.count(query)?,
                    };
                    let records = self.executor.get(query, Some(per_page), offset)?;
                    RecordPage::new(records)
                        .with_page(current, per_page)
                        .with_total(total)
                } else {
                    let mut records =
                        self.executor
                            .get(query, Some(per_page.saturating_add(1)), offset)?;
                    let has_more = records.len() > per_page;
                    records.truncate(per_page);
                    RecordPage::new(records)
                        .with_page(current, per_page)
                        .with_more_pages(has_more)
                };

                if let Some(session) = self.session {
                    session.put(SESSION_LAST_PAGE, &current)?;
                }
                page
            }
            None => {
                let records = self.executor.get(query, None, 0)?;
                let total = records.len();
                RecordPage::new(records).with_total(total)
            }
        };

        if let Some(hooks) = self.hooks
            && let Some(records) = hooks.after_records_fetch(page.records_mut())
        {
            debug!("List records replaced by extension hook ({} rows)", records.len());
            page.replace_records(records);
        }

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::executor::MemoryExecutor;
    use crate::model::EntityDefinition;
    use crate::model::Record;
    use crate::storage::MemoryBackend;

    fn executor(count: usize) -> MemoryExecutor {
        MemoryExecutor::new(
            (1..=count)
                .map(|id| Record::new("Movie").set("id", id))
                .collect(),
        )
    }

    fn query() -> ListQuery {
        ListQuery::new(EntityDefinition::new("Movie", "movies"))
    }

    fn counted(per_page: usize) -> PageSettings {
        PageSettings {
            per_page: Some(per_page),
            show_pagination: true,
            show_page_numbers: true,
        }
    }

    #[test]
    fn test_clamp_to_last_page() {
        let executor = executor(41);
        let paginator = Paginator::new(&executor);
        let (page, _) = paginator.resolve_page(&query(), Some(3), 20).unwrap();
        assert_eq!(page, 3);

        let executor = self::executor(20);
        let paginator = Paginator::new(&executor);
        let (page, _) = paginator.resolve_page(&query(), Some(3), 20).unwrap();
        assert_eq!(page, 1);

        let executor = self::executor(0);
        let paginator = Paginator::new(&executor);
        let (page, _) = paginator.resolve_page(&query(), Some(5), 20).unwrap();
        assert_eq!(page, 1);
    }

    #[test]
    fn test_huge_page_clamps_without_overflow() {
        let executor = executor(5);
        let paginator = Paginator::new(&executor);
        let (page, count) = paginator.resolve_page(&query(), Some(usize::MAX), 2).unwrap();
        assert_eq!(page, 3);
        assert_eq!(count, Some(5));

        let page = paginator
            .fetch(&query(), Some(usize::MAX), counted(usize::MAX))
            .unwrap();
        assert_eq!(page.current_page(), 1);
        assert_eq!(page.count(), 5);
    }

    #[test]
    fn test_counted_page_metrics() {
        let executor = executor(45);
        let page = Paginator::new(&executor)
            .fetch(&query(), Some(3), counted(20))
            .unwrap();
        assert_eq!(page.count(), 5);
        assert_eq!(page.total(), Some(45));
        assert_eq!(page.last_page(), Some(3));
        assert_eq!(page.first_item(), Some(41));
    }

    #[test]
    fn test_simple_pagination_detects_more() {
        let executor = executor(45);
        let settings = PageSettings {
            show_page_numbers: false,
            ..counted(20)
        };
        let page = Paginator::new(&executor)
            .fetch(&query(), Some(2), settings)
            .unwrap();
        assert_eq!(page.count(), 20);
        assert_eq!(page.total(), None);
        assert!(page.has_more_pages());
    }

    #[test]
    fn test_disabled_fetches_everything() {
        let executor = executor(45);
        let settings = PageSettings {
            per_page: None,
            show_pagination: false,
            show_page_numbers: true,
        };
        let page = Paginator::new(&executor)
            .fetch(&query(), Some(2), settings)
            .unwrap();
        assert_eq!(page.count(), 45);
        assert_eq!(page.total(), Some(45));
        assert_eq!(page.current_page(), 1);
    }

    #[test]
    fn test_session_restores_last_page() {
        let executor = executor(45);
        let session = SessionStore::new(Arc::new(MemoryBackend::new()), "s1", "movies");
        let paginator = Paginator::new(&executor).session(&session);

        paginator.fetch(&query(), Some(2), counted(20)).unwrap();
        let page = paginator.fetch(&query(), None, counted(20)).unwrap();
        assert_eq!(page.current_page(), 2);
    }

    #[test]
    fn test_records_hook_replaces_rows() {
        let executor = executor(3);
        let mut hooks = ExtensionHooks::new();
        hooks.on_after_records_fetch(|records| {
            let mut rows = vec![Record::new("Movie").set("id", 0usize)];
            rows.append(records);
            Some(rows)
        });
        let page = Paginator::new(&executor)
            .hooks(&hooks)
            .fetch(&query(), None, counted(20))
            .unwrap();
        assert_eq!(page.count(), 4);
    }
}
