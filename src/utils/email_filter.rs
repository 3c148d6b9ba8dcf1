use autoscale_cuckoo_filter::CuckooFilter;
use std::sync::{PoisonError, RwLock};

/// Expected capacity and false-positive rate.
/// Tune these based on real head count.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Fast negative check for registered emails. A miss means the email is
/// certainly free; a hit still needs the store to confirm.
pub struct EmailFilter {
    inner: RwLock<CuckooFilter<String>>,
}

impl Default for EmailFilter {
    fn default() -> Self {
        Self::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)
    }
}

impl EmailFilter {
    pub fn new(capacity: usize, false_positive_rate: f64) -> Self {
        Self {
            inner: RwLock::new(CuckooFilter::new(capacity, false_positive_rate)),
        }
    }

    /// Check if an email might be registered (false positives possible)
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize(email);
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&email)
    }

    pub fn insert(&self, email: &str) {
        let email = normalize(email);
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&email);
    }

    /// Insert many emails under a single write lock
    pub fn insert_batch(&self, emails: &[String]) -> usize {
        let mut filter = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        for email in emails {
            filter.add(&normalize(email));
        }
        emails.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_emails_are_found_case_insensitively() {
        let filter = EmailFilter::new(1_000, 0.001);
        assert!(!filter.might_exist("jane@corp.io"));

        filter.insert("Jane@Corp.io");
        assert!(filter.might_exist("jane@corp.io"));

        let loaded = filter.insert_batch(&["a@corp.io".to_string(), "b@corp.io".to_string()]);
        assert_eq!(loaded, 2);
        assert!(filter.might_exist("B@corp.io"));
    }
}
