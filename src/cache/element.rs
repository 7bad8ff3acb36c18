//! Cache Element Module
//!
//! Defines the value container stored in a cache, together with its TTL state.
//! Expiration is evaluated lazily: nothing fires when an element expires, the
//! cache checks [`CacheElement::is_expired_at`] on read and during sweeps.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheKey;

// == Cache Element ==
/// A value stored in a cache, keyed by its [`CacheKey`].
///
/// `lives_indefinitely` is true exactly when the last expiration-setting call
/// used a TTL of zero or less; `expires_at` is `None` in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheElement<V> {
    id: CacheKey,
    value: V,
    /// TTL in minutes used by the last expiration-setting call
    ttl_minutes: i64,
    /// Instant after which the element is expired, None = never
    expires_at: Option<DateTime<Utc>>,
    lives_indefinitely: bool,
}

impl<V> CacheElement<V> {
    // == Constructors ==
    /// Creates an element that never expires on its own.
    pub fn new(id: impl Into<CacheKey>, value: V) -> Self {
        Self::with_ttl(id, value, 0)
    }

    /// Creates an element with its own TTL in minutes.
    ///
    /// Caches overwrite this TTL with their own on insert.
    pub fn with_ttl(id: impl Into<CacheKey>, value: V, ttl_minutes: i64) -> Self {
        let mut element = Self {
            id: id.into(),
            value,
            ttl_minutes,
            expires_at: None,
            lives_indefinitely: true,
        };
        element.set_expiration(ttl_minutes);
        element
    }

    // == Accessors ==
    pub fn id(&self) -> &CacheKey {
        &self.id
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl_minutes
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn lives_indefinitely(&self) -> bool {
        self.lives_indefinitely
    }

    // == Is Expired ==
    /// Checks expiry against the wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Checks expiry against `now`.
    ///
    /// The element is expired only once `now` is strictly past the expiration
    /// instant. Indefinite elements never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.lives_indefinitely {
            return false;
        }
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }

    // == Set Expiration ==
    /// Restarts the TTL window from the wall clock.
    pub fn set_expiration(&mut self, ttl_minutes: i64) {
        self.set_expiration_at(Utc::now(), ttl_minutes);
    }

    /// Restarts the TTL window from `now`, or makes the element indefinite
    /// when `ttl_minutes <= 0`.
    pub fn set_expiration_at(&mut self, now: DateTime<Utc>, ttl_minutes: i64) {
        self.ttl_minutes = ttl_minutes;
        if ttl_minutes <= 0 {
            self.lives_indefinitely = true;
            self.expires_at = None;
        } else {
            self.lives_indefinitely = false;
            self.expires_at = Some(now + Duration::minutes(ttl_minutes));
        }
    }

    // == Time To Live ==
    /// Returns the time left before expiry, or None for indefinite elements.
    ///
    /// Returns a zero duration once the element has expired.
    pub fn ttl_remaining_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at.map(|expires| {
            if expires > now {
                expires - now
            } else {
                Duration::zero()
            }
        })
    }
}
