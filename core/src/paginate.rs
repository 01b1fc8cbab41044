use serde::Serialize;
use std::time::Duration;

/// Records revealed per "load more".
pub const DEFAULT_WINDOW: usize = 12;
/// Pause before a "load more" is answered.
pub const LOAD_MORE_DELAY: Duration = Duration::from_millis(500);
/// Rows per page in the open-admissions table.
pub const DEFAULT_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window<'a, T> {
    pub items: &'a [T],
    pub has_more: bool,
}

/// The first `loaded` records and whether any remain.
pub fn paginate<T>(records: &[T], loaded: usize) -> Window<'_, T> {
    let end = loaded.min(records.len());
    Window { items: &records[..end], has_more: records.len() > loaded }
}

/// Progressive reveal state for an infinite-scroll list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollWindow {
    window_size: usize,
    loaded: usize,
}

impl Default for ScrollWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl ScrollWindow {
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self { window_size, loaded: window_size }
    }

    /// Resume at an already-loaded count, e.g. one sent back by a client.
    pub fn resume(window_size: usize, loaded: usize) -> Self {
        let mut w = Self::new(window_size);
        w.loaded = loaded.max(w.window_size);
        w
    }

    pub fn loaded(&self) -> usize { self.loaded }

    pub fn window_size(&self) -> usize { self.window_size }

    pub fn has_more(&self, total: usize) -> bool { total > self.loaded }

    /// Grow by one window. Returns false and stays put once everything is loaded.
    pub fn load_more(&mut self, total: usize) -> bool {
        if !self.has_more(total) {
            return false;
        }
        self.loaded += self.window_size;
        true
    }

    /// Back to the first window, e.g. after the filters change.
    pub fn reset(&mut self) {
        self.loaded = self.window_size;
    }

    pub fn view<'a, T>(&self, records: &'a [T]) -> Window<'a, T> {
        paginate(records, self.loaded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView<T> {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
    pub items: Vec<T>,
}

/// 1-based page of `per_page` rows. Out-of-range pages come back empty.
pub fn page_slice<T: Clone>(records: &[T], page: usize, per_page: usize) -> PageView<T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total = records.len();
    let start = (page - 1).saturating_mul(per_page).min(total);
    let end = start.saturating_add(per_page).min(total);
    PageView {
        page,
        per_page,
        total,
        total_pages: total.div_ceil(per_page),
        items: records[start..end].to_vec(),
    }
}
