// src/ingest/quota.rs

/// Quota units charged per accepted item: one search query (100) plus the
/// details and channel lookups.
pub const DEFAULT_QUOTA_PER_ITEM: u64 = 102;

pub fn quota_cost(count: usize) -> u64 {
    quota_cost_with(count, DEFAULT_QUOTA_PER_ITEM)
}

pub fn quota_cost_with(count: usize, per_item: u64) -> u64 {
    (count as u64).saturating_mul(per_item)
}
