//! Retention settings for history buffers.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest accepted retention window, in days.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// How much history a buffer keeps.
///
/// Both limits are optional and apply together: a sample is evicted as soon
/// as either limit excludes it. The default keeps everything.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use tickflow::HistoryConfig;
///
/// let config = HistoryConfig::default()
///     .with_max_ticks(128)
///     .with_window(Duration::seconds(30));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Keep at most this many samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<usize>,

    /// Keep samples no older than `last_time - window`.
    #[serde(
        default,
        rename = "window_ms",
        with = "window_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub window: Option<Duration>,
}

impl HistoryConfig {
    /// Unbounded retention.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Caps the sample count.
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: usize) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Caps sample age relative to the newest sample.
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = Some(window);
        self
    }

    /// True if either limit is set.
    pub const fn is_bounded(&self) -> bool {
        self.max_ticks.is_some() || self.window.is_some()
    }

    /// Checks the limits are usable.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidHistoryConfig` if `max_ticks` is zero
    /// or `window` is not positive or longer than [`MAX_WINDOW_DAYS`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_ticks == Some(0) {
            return Err(ValidationError::InvalidHistoryConfig {
                reason: "max_ticks must be positive".to_string(),
            });
        }
        if let Some(window) = self.window {
            if window <= Duration::zero() {
                return Err(ValidationError::InvalidHistoryConfig {
                    reason: format!("window must be positive, got {window}"),
                });
            }
            if window > Duration::days(MAX_WINDOW_DAYS) {
                return Err(ValidationError::InvalidHistoryConfig {
                    reason: format!("window must not exceed {MAX_WINDOW_DAYS} days, got {window}"),
                });
            }
        }
        Ok(())
    }
}

mod window_millis {
    use chrono::Duration;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(window: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match window {
            Some(w) => s.serialize_some(&w.num_milliseconds()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Option::<i64>::deserialize(d)?
            .map(|ms| {
                Duration::try_milliseconds(ms)
                    .ok_or_else(|| D::Error::custom(format!("window_ms out of range: {ms}")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded() {
        let config = HistoryConfig::default();
        assert!(!config.is_bounded());
        assert!(config.validate().is_ok());
        assert_eq!(config, HistoryConfig::unbounded());
    }

    #[test]
    fn test_zero_ticks_rejected() {
        let config = HistoryConfig::default().with_max_ticks(0);
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidHistoryConfig { .. })
        ));
    }

    #[test]
    fn test_non_positive_window_rejected() {
        assert!(HistoryConfig::default()
            .with_window(Duration::zero())
            .validate()
            .is_err());
        assert!(HistoryConfig::default()
            .with_window(Duration::seconds(-1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_oversized_window_rejected() {
        let config: HistoryConfig =
            serde_json::from_str(r#"{"window_ms":9223372036854775807}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("36500 days"));

        let limit = HistoryConfig::default().with_window(Duration::days(MAX_WINDOW_DAYS));
        assert!(limit.validate().is_ok());
    }

    #[test]
    fn test_unrepresentable_window_fails_to_deserialize() {
        let result = serde_json::from_str::<HistoryConfig>(r#"{"window_ms":-9223372036854775808}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialization_uses_millis() {
        let config = HistoryConfig::default()
            .with_max_ticks(10)
            .with_window(Duration::seconds(2));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"max_ticks":10,"window_ms":2000}"#);

        let back: HistoryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_deserialize_missing_fields() {
        let config: HistoryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, HistoryConfig::unbounded());
    }
}
