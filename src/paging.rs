use serde::{Deserialize, Serialize};

/// One page of an ordered listing plus the information a client needs to
/// request the neighbouring pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub data: Vec<T>,
    /// Row count of the whole, unpaged set
    pub total_count: i64,
    /// Zero-based page index echoed from the request
    pub page: u32,
    pub page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn new(data: Vec<T>, total_count: i64, page: u32, page_size: u32) -> Self {
        PagedResult {
            data,
            total_count,
            page,
            page_size,
        }
    }

    pub fn empty(page: u32, page_size: u32) -> Self {
        PagedResult::new(Vec::new(), 0, page, page_size)
    }

    /// Projects every item while keeping the page bookkeeping intact.
    pub fn map<U, F>(self, f: F) -> PagedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedResult {
            data: self.data.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Row offset of the first item on `page`. Saturates instead of overflowing so
/// an absurd page simply lands past the end of the set.
pub fn page_offset(page: u32, page_size: u32) -> i64 {
    i64::from(page)
        .checked_mul(i64::from(page_size))
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(0, 10), 0);
        assert_eq!(page_offset(1, 10), 10);
        assert_eq!(page_offset(3, 15), 45);
        assert_eq!(page_offset(u32::MAX, 2), 2 * u32::MAX as i64);
        assert_eq!(page_offset(u32::MAX, u32::MAX), i64::MAX);
    }

    #[test]
    fn test_map_preserves_page_fields() {
        let page = PagedResult::new(vec![1, 2, 3], 42, 4, 3);
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.data, vec!["1", "2", "3"]);
        assert_eq!(mapped.total_count, 42);
        assert_eq!(mapped.page, 4);
        assert_eq!(mapped.page_size, 3);
    }

    #[test]
    fn test_empty() {
        let page: PagedResult<String> = PagedResult::empty(2, 25);
        assert!(page.data.is_empty());
        assert_eq!(page.total_count, 0);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 25);
    }
}
