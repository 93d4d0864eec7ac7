//! Mentor cache
//!
//! Typed view over a `TtlCache` of JSON values. Keys follow
//! `mentor:{mentor_id}:{slot}`; any write to a mentor's data drops every
//! slot for that mentor.
//!
//! Each mentor also carries an invalidation generation. A loader reads it
//! before going to the store and refills through [`MentorCache::set_if_current`],
//! so a load that straddles an invalidation never repopulates old data.

use dashmap::DashMap;
use kernel::id::UserId;
use platform::cache::TtlCache;
use platform::clock::Clock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::application::config::CacheTtls;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheSlot {
    Dashboard,
    Mentorships,
    Sessions,
    Reviews,
    Analytics,
    /// Raw sessions/mentorships/reviews loaded together for the dashboard
    Batch,
    Documents,
}

impl CacheSlot {
    pub const ALL: [CacheSlot; 7] = [
        CacheSlot::Dashboard,
        CacheSlot::Mentorships,
        CacheSlot::Sessions,
        CacheSlot::Reviews,
        CacheSlot::Analytics,
        CacheSlot::Batch,
        CacheSlot::Documents,
    ];

    pub const fn code(&self) -> &'static str {
        match self {
            CacheSlot::Dashboard => "dashboard",
            CacheSlot::Mentorships => "mentorships",
            CacheSlot::Sessions => "sessions",
            CacheSlot::Reviews => "reviews",
            CacheSlot::Analytics => "analytics",
            CacheSlot::Batch => "batch",
            CacheSlot::Documents => "documents",
        }
    }

    pub fn key(&self, mentor_id: UserId) -> String {
        format!("mentor:{}:{}", mentor_id, self.code())
    }
}

pub struct MentorCache {
    entries: TtlCache<serde_json::Value>,
    generations: DashMap<UserId, u64>,
    /// Bumped by `clear`, which fences every mentor at once
    epoch: AtomicU64,
    ttls: CacheTtls,
}

impl MentorCache {
    pub fn new(clock: Arc<dyn Clock>, ttls: CacheTtls) -> Self {
        Self {
            entries: TtlCache::new(clock),
            generations: DashMap::new(),
            epoch: AtomicU64::new(0),
            ttls,
        }
    }

    /// Cached value for the slot, or `None` on miss
    ///
    /// An entry that no longer deserializes is dropped and reported as a miss.
    pub fn get<T: DeserializeOwned>(&self, mentor_id: UserId, slot: CacheSlot) -> Option<T> {
        let key = slot.key(mentor_id);
        let value = self.entries.get(&key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "Dropping undecodable cache entry");
                self.entries.delete(&key);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, mentor_id: UserId, slot: CacheSlot, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => {
                self.entries
                    .set(slot.key(mentor_id), json, self.ttls.for_slot(slot));
            }
            Err(err) => {
                tracing::warn!(slot = slot.code(), error = %err, "Value not cacheable");
            }
        }
    }

    /// Current invalidation generation for the mentor
    pub fn generation(&self, mentor_id: UserId) -> u64 {
        let own = self.generations.get(&mentor_id).map_or(0, |g| *g);
        own + self.epoch.load(Ordering::SeqCst)
    }

    /// Store `value` only if no invalidation happened since `generation` was read
    pub fn set_if_current<T: Serialize>(
        &self,
        mentor_id: UserId,
        slot: CacheSlot,
        value: &T,
        generation: u64,
    ) -> bool {
        let own = self.generations.entry(mentor_id).or_insert(0);
        if *own + self.epoch.load(Ordering::SeqCst) != generation {
            tracing::debug!(
                mentor_id = %mentor_id,
                slot = slot.code(),
                "Skipping refill from before an invalidation"
            );
            return false;
        }
        self.set(mentor_id, slot, value);
        true
    }

    /// Drop every slot for the mentor
    ///
    /// Loads that began before this call can no longer refill the cache.
    pub fn invalidate_mentor(&self, mentor_id: UserId) -> usize {
        *self.generations.entry(mentor_id).or_insert(0) += 1;
        let removed = self
            .entries
            .delete_many(CacheSlot::ALL.iter().map(|slot| slot.key(mentor_id)));
        tracing::debug!(mentor_id = %mentor_id, removed, "Invalidated mentor cache");
        removed
    }

    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
    }

    pub fn purge_expired(&self) -> usize {
        self.entries.purge_expired()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
