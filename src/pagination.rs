pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Paging state of the incident table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    current_page: u32,
    page_size: u32,
    total: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self) -> u32 {
        let pages = self.total.div_ceil(u64::from(self.page_size)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn prev_disabled(&self) -> bool {
        self.current_page <= 1
    }

    pub fn next_disabled(&self) -> bool {
        self.current_page >= self.total_pages()
    }

    /// Takes the server's view of the page after a load.
    pub fn sync(&mut self, total: u64, page: u32, page_size: u32) {
        self.total = total;
        self.current_page = page.max(1);
        self.page_size = page_size.max(1);
    }

    /// Returns whether the page moved.
    pub fn prev(&mut self) -> bool {
        if self.current_page > 1 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Returns whether the page moved.
    pub fn next(&mut self) -> bool {
        if self.current_page < self.total_pages() {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
        self.current_page = 1;
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// `Page P / T (total: N)`
    pub fn label(&self) -> String {
        format!(
            "Page {} / {} (total: {})",
            self.current_page,
            self.total_pages(),
            self.total
        )
    }
}

/// Page-size input as typed by the user; junk and zero fall back to the default.
pub fn parse_page_size(raw: &str) -> u32 {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => DEFAULT_PAGE_SIZE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(page: u32, page_size: u32, total: u64) -> Pagination {
        let mut p = Pagination::new(page_size);
        p.sync(total, page, page_size);
        p
    }

    #[test]
    fn forty_five_rows_by_twenty_is_three_pages() {
        let p = at(1, 20, 45);
        assert_eq!(p.total_pages(), 3);
        assert!(p.prev_disabled());
        assert!(!p.next_disabled());

        let last = at(3, 20, 45);
        assert!(last.next_disabled());
        assert!(!last.prev_disabled());
    }

    #[test]
    fn empty_result_still_has_one_page() {
        let p = at(1, 20, 0);
        assert_eq!(p.total_pages(), 1);
        assert!(p.prev_disabled());
        assert!(p.next_disabled());
        assert_eq!(p.label(), "Page 1 / 1 (total: 0)");
    }

    #[test]
    fn moves_stay_within_bounds() {
        let mut p = at(1, 20, 45);
        assert!(!p.prev());
        assert_eq!(p.current_page(), 1);
        assert!(p.next());
        assert!(p.next());
        assert!(!p.next());
        assert_eq!(p.current_page(), 3);
        assert!(p.prev());
        assert_eq!(p.current_page(), 2);
    }

    #[test]
    fn page_size_change_resets_to_first_page() {
        let mut p = at(3, 20, 45);
        p.set_page_size(50);
        assert_eq!(p.current_page(), 1);
        assert_eq!(p.page_size(), 50);
        assert_eq!(p.total_pages(), 1);
    }

    #[test]
    fn page_size_parsing_falls_back() {
        assert_eq!(parse_page_size("50"), 50);
        assert_eq!(parse_page_size("abc"), DEFAULT_PAGE_SIZE);
        assert_eq!(parse_page_size("0"), DEFAULT_PAGE_SIZE);
    }
}
