//! Pagination for list operations

/// Offset/limit window for `list` calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListOptions {
    pub offset: i64,
    /// `None` returns every row after `offset`
    pub limit: Option<i64>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit.max(0));
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset.max(0);
        self
    }
}

/// One page of results plus the total row count
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ListPage<T> {
    pub total_count: i64,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_bounds_are_clamped() {
        let options = ListOptions::new().with_offset(-5).with_limit(-1);
        assert_eq!(options.offset, 0);
        assert_eq!(options.limit, Some(0));
    }

    #[test]
    fn default_is_unbounded() {
        assert_eq!(
            ListOptions::default(),
            ListOptions {
                offset: 0,
                limit: None
            }
        );
    }
}
