use moka::future::Cache;
use std::time::Duration;

use crate::model::employee::Employee;

/// Short-lived cache of employees resolved from bearer tokens, so each
/// authenticated call does not hit the store.
#[derive(Clone)]
pub struct EmployeeCache {
    inner: Cache<u64, Employee>,
}

impl EmployeeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(50_000) // tune based on memory
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, employee_id: u64) -> Option<Employee> {
        self.inner.get(&employee_id).await
    }

    pub async fn insert(&self, employee: Employee) {
        self.inner.insert(employee.id, employee).await;
    }
}
