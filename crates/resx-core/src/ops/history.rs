use crate::errors::ExError;
use crate::model::PersistedEntity;
use crate::ops::HistoryProvider;

/// Iterator fetching one history page per step
///
/// Stops after the first short page, the first empty page, or the first
/// error (which is yielded once).
pub struct HistoryPages<'p> {
    provider: &'p dyn HistoryProvider,
    page_size: usize,
    offset: usize,
    done: bool,
}

impl<'p> HistoryPages<'p> {
    pub fn new(provider: &'p dyn HistoryProvider, page_size: usize) -> Self {
        Self {
            provider,
            page_size: page_size.max(1),
            offset: 0,
            done: false,
        }
    }
}

impl Iterator for HistoryPages<'_> {
    type Item = Result<Vec<PersistedEntity>, ExError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let page = match self.provider.page(self.offset, self.page_size) {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if page.is_empty() {
            self.done = true;
            return None;
        }
        self.offset += page.len();
        if page.len() < self.page_size {
            self.done = true;
        }
        Some(Ok(page))
    }
}
