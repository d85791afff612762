//! Fixed-size pagination shared by every feed.
//!
//! Page numbers are 1-based. Anything that is not a positive integer falls back
//! to page 1; a number past the end is clamped to the last page.

use serde::{Deserialize, Serialize};

/// Posts shown per feed page.
pub const PAGE_SIZE: u64 = 10;

/// `?page=` query parameter, kept raw so malformed values degrade to page 1.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> PageNumber {
        PageNumber::parse(self.page.as_deref())
    }
}

/// Requested page cursor, always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumber(u64);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(1);

    /// A positive integer too large to represent still means "past the end".
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return Self::FIRST;
        };
        let digits = raw.strip_prefix('+').unwrap_or(raw);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Self::FIRST;
        }
        match digits.parse::<u64>() {
            Ok(n) => PageNumber::from(n),
            Err(_) => PageNumber(u64::MAX),
        }
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl From<u64> for PageNumber {
    fn from(n: u64) -> Self {
        PageNumber(n.max(1))
    }
}

/// Page arithmetic over a result set of `count` items.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u64,
    count: u64,
}

impl Paginator {
    pub fn new(count: u64) -> Self {
        Self::with_page_size(count, PAGE_SIZE)
    }

    pub fn with_page_size(count: u64, per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
            count,
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// An empty result set still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.per_page)
        }
    }

    /// Resolve a requested page to one that exists.
    pub fn clamp(&self, requested: PageNumber) -> u64 {
        requested.get().min(self.num_pages())
    }

    /// Row offset of the first item on `number` (already clamped).
    pub fn offset(&self, number: u64) -> u64 {
        (number.max(1) - 1) * self.per_page
    }

    pub fn page<T>(&self, number: u64, object_list: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        Page {
            object_list,
            number,
            num_pages,
            count: self.count,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }
}

/// One slice of an ordered result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_garbage_page_is_first() {
        assert_eq!(PageNumber::parse(None), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("abc")), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("")), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("2.5")), PageNumber::FIRST);
    }

    #[test]
    fn non_positive_page_is_first() {
        assert_eq!(PageNumber::parse(Some("0")), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("-3")), PageNumber::FIRST);
    }

    #[test]
    fn valid_page_is_kept() {
        assert_eq!(PageNumber::parse(Some(" 7 ")).get(), 7);
    }

    #[test]
    fn oversized_page_is_clamped_to_last() {
        let huge = PageNumber::parse(Some("99999999999999999999"));
        assert_eq!(huge.get(), u64::MAX);
        assert_eq!(Paginator::new(13).clamp(huge), 2);
        assert_eq!(PageNumber::parse(Some("+3")).get(), 3);
        assert_eq!(PageNumber::parse(Some("-99999999999999999999")), PageNumber::FIRST);
    }

    #[test]
    fn thirteen_items_make_two_pages() {
        let paginator = Paginator::new(13);
        assert_eq!(paginator.num_pages(), 2);
        assert_eq!(paginator.offset(1), 0);
        assert_eq!(paginator.offset(2), 10);
    }

    #[test]
    fn last_page_holds_the_remainder() {
        for n in 1..=45u64 {
            let paginator = Paginator::new(n);
            let last = paginator.num_pages();
            let remaining = n - paginator.offset(last);
            let expected = if n % PAGE_SIZE == 0 { PAGE_SIZE } else { n % PAGE_SIZE };
            assert_eq!(remaining, expected, "n = {}", n);
        }
    }

    #[test]
    fn page_past_the_end_is_clamped() {
        let paginator = Paginator::new(13);
        assert_eq!(paginator.clamp(PageNumber::from(99)), 2);
    }

    #[test]
    fn empty_set_has_one_empty_page() {
        let paginator = Paginator::new(0);
        assert_eq!(paginator.num_pages(), 1);
        assert_eq!(paginator.clamp(PageNumber::from(5)), 1);

        let page: Page<u8> = paginator.page(1, Vec::new());
        assert!(page.is_empty());
        assert_eq!(page.count, 0);
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn page_flags_reflect_position() {
        let paginator = Paginator::new(25);
        let middle = paginator.page(2, vec![(); 10]);
        assert!(middle.has_next);
        assert!(middle.has_previous);
        assert_eq!(middle.num_pages, 3);
    }
}
