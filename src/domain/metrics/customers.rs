//! Customer metric reduction over user documents.

use crate::domain::billing::UserAccount;

use super::window::MetricWindow;

/// Customer counts for a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerMetrics {
    /// Users whose program status is set and neither `none` nor `free`.
    pub active: u64,
    /// Users whose creation timestamp falls inside the window.
    pub new: u64,
}

/// Reduces user documents into customer counts.
///
/// Creation timestamps are already normalized by the store adapters; users
/// without one simply never count as new.
pub fn reduce_customers(users: &[UserAccount], window: &MetricWindow) -> CustomerMetrics {
    let active = users.iter().filter(|u| u.status.is_active()).count() as u64;
    let new = users
        .iter()
        .filter(|u| {
            u.created_at
                .map(|created| window.contains(&created))
                .unwrap_or(false)
        })
        .count() as u64;

    CustomerMetrics { active, new }
}
