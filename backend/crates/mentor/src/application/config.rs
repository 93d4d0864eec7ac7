//! Application Configuration
//!
//! Configuration for the mentor application layer.

use chrono::{DateTime, Utc};
use platform::rate_limit::RateLimitConfig;
use std::time::Duration;

use crate::application::cache::CacheSlot;

/// Per-action rate limits
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub create_session: RateLimitConfig,
    /// Reschedule, start, complete, cancel, no-show
    pub lifecycle: RateLimitConfig,
    pub upload_document: RateLimitConfig,
    pub create_document: RateLimitConfig,
    /// Requesting and resolving reviews
    pub review: RateLimitConfig,
    pub fetch_dashboard: RateLimitConfig,
    /// Plain list and detail reads
    pub read: RateLimitConfig,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            create_session: RateLimitConfig::new(10, 60),
            lifecycle: RateLimitConfig::new(30, 60),
            upload_document: RateLimitConfig::new(20, 3600),
            create_document: RateLimitConfig::new(30, 3600),
            review: RateLimitConfig::new(30, 60),
            fetch_dashboard: RateLimitConfig::new(60, 60),
            read: RateLimitConfig::new(120, 60),
        }
    }
}

/// Cache TTL per data class; volatile data expires sooner
#[derive(Debug, Clone)]
pub struct CacheTtls {
    pub sessions: Duration,
    pub mentorships: Duration,
    pub reviews: Duration,
    pub analytics: Duration,
    pub documents: Duration,
    /// Composite; never outlives its shortest constituent
    pub dashboard: Duration,
    pub batch: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            sessions: Duration::from_secs(5 * 60),
            mentorships: Duration::from_secs(10 * 60),
            reviews: Duration::from_secs(3 * 60),
            analytics: Duration::from_secs(15 * 60),
            documents: Duration::from_secs(5 * 60),
            dashboard: Duration::from_secs(3 * 60),
            batch: Duration::from_secs(3 * 60),
        }
    }
}

impl CacheTtls {
    pub fn for_slot(&self, slot: CacheSlot) -> Duration {
        match slot {
            CacheSlot::Dashboard => self.dashboard,
            CacheSlot::Mentorships => self.mentorships,
            CacheSlot::Sessions => self.sessions,
            CacheSlot::Reviews => self.reviews,
            CacheSlot::Analytics => self.analytics,
            CacheSlot::Batch => self.batch,
            CacheSlot::Documents => self.documents,
        }
    }
}

/// Mentor application configuration
#[derive(Debug, Clone)]
pub struct MentorConfig {
    pub rate_limits: RateLimits,
    pub cache_ttls: CacheTtls,
    /// Upper bound on every store call
    pub store_timeout: Duration,
    /// Upper bound on notification and file storage calls
    pub collaborator_timeout: Duration,
    /// Rate-limit violations after which an actor's violations are audited as high risk
    pub suspicious_activity_threshold: u32,
    pub max_document_bytes: usize,
    pub allowed_document_extensions: Vec<String>,
    pub min_session_minutes: u32,
    pub max_session_minutes: u32,
    /// How far ahead a session may be booked
    pub booking_horizon_days: u32,
    pub max_title_chars: usize,
    /// Recompute and cache analytics after each write
    pub warm_analytics_on_write: bool,
}

impl Default for MentorConfig {
    fn default() -> Self {
        Self {
            rate_limits: RateLimits::default(),
            cache_ttls: CacheTtls::default(),
            store_timeout: Duration::from_secs(5),
            collaborator_timeout: Duration::from_secs(3),
            suspicious_activity_threshold: 5,
            max_document_bytes: 10 * 1024 * 1024,
            allowed_document_extensions: ["pdf", "doc", "docx", "txt", "md", "rtf"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_session_minutes: 15,
            max_session_minutes: 240,
            booking_horizon_days: 730,
            max_title_chars: 200,
            warm_analytics_on_write: true,
        }
    }
}

impl MentorConfig {
    /// Create config for development (relaxed limits, patient store)
    pub fn development() -> Self {
        let relaxed = RateLimitConfig::new(1_000, 60);
        Self {
            rate_limits: RateLimits {
                create_session: relaxed.clone(),
                lifecycle: relaxed.clone(),
                upload_document: relaxed.clone(),
                create_document: relaxed.clone(),
                review: relaxed.clone(),
                fetch_dashboard: relaxed.clone(),
                read: relaxed,
            },
            store_timeout: Duration::from_secs(30),
            ..Self::default()
        }
    }

    /// Defaults overridden by `MENTOR_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_parse::<u64>("MENTOR_STORE_TIMEOUT_MS") {
            config.store_timeout = Duration::from_millis(ms);
        }
        if let Some(bytes) = env_parse::<usize>("MENTOR_MAX_DOCUMENT_BYTES") {
            config.max_document_bytes = bytes;
        }
        if let Some(threshold) = env_parse::<u32>("MENTOR_SUSPICIOUS_THRESHOLD") {
            config.suspicious_activity_threshold = threshold;
        }
        if let Some(days) = env_parse::<u32>("MENTOR_BOOKING_HORIZON_DAYS") {
            config.booking_horizon_days = days;
        }
        config
    }

    pub fn store_timeout_ms(&self) -> i64 {
        self.store_timeout.as_millis() as i64
    }

    /// Latest start a booking made at `now` may have
    pub fn booking_horizon(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(chrono::Duration::days(i64::from(self.booking_horizon_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn allows_extension(&self, file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.allowed_document_extensions.contains(&ext))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment override");
            None
        }
    }
}
