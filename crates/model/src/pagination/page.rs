use crate::records::raw::RawRecord;

/// Body of one API page, `{ count, data }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub count: Option<u64>,
    pub data: Vec<RawRecord>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Outcome of fetching every page of one paginated source.
///
/// `count` is the total the source declared on its first page. A source
/// that could not be reached at all yields `count == 0` and no data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    pub count: u64,
    pub data: Vec<RawRecord>,
    pub failed_pages: Vec<u32>,
}

impl FetchResult {
    pub fn unavailable(first_page: u32) -> Self {
        FetchResult {
            count: 0,
            data: Vec::new(),
            failed_pages: vec![first_page],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when some page was dropped or fewer records arrived than declared.
    pub fn is_partial(&self) -> bool {
        !self.failed_pages.is_empty() || (self.data.len() as u64) < self.count
    }
}

/// Number of pages needed for `count` records at `page_size` per page,
/// saturating at `u32::MAX`.
pub fn page_count(count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    u32::try_from(count.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(1500, 1000), 2);
        assert_eq!(page_count(1000, 1000), 1);
        assert_eq!(page_count(0, 1000), 0);
        assert_eq!(page_count(5, 0), 0);
    }

    #[test]
    fn page_count_saturates() {
        assert_eq!(page_count(u64::MAX, 1), u32::MAX);
        assert_eq!(page_count(u64::from(u32::MAX) * 2, 2), u32::MAX);
        assert_eq!(page_count(u64::from(u32::MAX) * 2 + 1, 2), u32::MAX);
    }

    #[test]
    fn partial_when_pages_fail() {
        let mut result = FetchResult {
            count: 2,
            data: vec![RawRecord::new(), RawRecord::new()],
            failed_pages: vec![],
        };
        assert!(!result.is_partial());

        result.failed_pages.push(3);
        assert!(result.is_partial());
        assert!(FetchResult::unavailable(1).is_partial());
    }
}
