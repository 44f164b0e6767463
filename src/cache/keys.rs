//! Cache key scheme for the article listing.
//!
//! Two logical namespaces: a single fixed key holding the max-page scalar,
//! and a family of keys parameterized by page number holding serialized page
//! projections. The page size is folded into the prefix, so a deployment
//! with a different page size reads and writes a disjoint key space instead
//! of consuming entries whose skip/limit math no longer matches.

use std::num::NonZeroU32;

/// Key builder for one listing namespace.
#[derive(Debug, Clone)]
pub struct ListingKeys {
    prefix: String,
}

impl ListingKeys {
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            prefix: format!("articles:{page_size}"),
        }
    }

    /// Fixed key for the cached max-page value.
    pub fn max_page(&self) -> String {
        format!("{}:max-page", self.prefix)
    }

    /// Key for the cached content of page `n`.
    pub fn page(&self, n: u32) -> String {
        format!("{}:page:{n}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(page_size: u32) -> ListingKeys {
        ListingKeys::new(NonZeroU32::new(page_size).expect("nonzero page size"))
    }

    #[test]
    fn key_layout_matches_contract() {
        let keys = keys(2);
        assert_eq!(keys.max_page(), "articles:2:max-page");
        assert_eq!(keys.page(1), "articles:2:page:1");
        assert_eq!(keys.page(37), "articles:2:page:37");
    }

    #[test]
    fn page_size_separates_namespaces() {
        let small = keys(2);
        let large = keys(20);
        assert_ne!(small.max_page(), large.max_page());
        assert_ne!(small.page(1), large.page(1));
    }
}
