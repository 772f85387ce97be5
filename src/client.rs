use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

use crate::config::CheckWindow;

/// Scheduler API for the Trusted Traveler Programs enrollment centers.
pub const DEFAULT_BASE_URL: &str = "https://ttp.cbp.dhs.gov/schedulerapi";

/// Every request carries a hard deadline; a hung request would otherwise
/// stall the poll loop indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One appointment slot from the scheduler's listing.
///
/// The remote payload carries more fields than this; only the two the poller
/// acts on are decoded and the rest are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Slot {
    pub timestamp: NaiveDateTime,
    pub active: bool,
}

/// Ways a single availability fetch can fail. The poll loop retries them all
/// identically; the variants exist so the warning line can say what went
/// wrong.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("scheduler returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed slot listing: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can list appointment slots for a window.
#[allow(async_fn_in_trait)]
pub trait SlotSource {
    async fn fetch_slots(&self, window: &CheckWindow) -> Result<Vec<Slot>, FetchError>;
}

/// Client for the slot-listing endpoint of the scheduler API.
pub struct SchedulerClient {
    http: reqwest::Client,
    base_url: String,
    location_id: u32,
}

impl SchedulerClient {
    pub fn new(base_url: impl Into<String>, location_id: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            location_id,
        })
    }

    fn slots_url(&self) -> String {
        format!("{}/locations/{}/slots", self.base_url, self.location_id)
    }
}

impl SlotSource for SchedulerClient {
    async fn fetch_slots(&self, window: &CheckWindow) -> Result<Vec<Slot>, FetchError> {
        let response = self
            .http
            .get(self.slots_url())
            .query(&[
                ("startTimestamp", window.start_param()),
                ("endTimestamp", window.end_param()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        decode_slots(&body)
    }
}

/// Decode a slot-listing body. Anything other than an array of records with
/// a `timestamp` and an `active` flag fails into `FetchError::Decode`.
fn decode_slots(body: &str) -> Result<Vec<Slot>, FetchError> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    #[test]
    fn test_slots_url_targets_the_location() {
        let client =
            SchedulerClient::new(DEFAULT_BASE_URL, 5020).expect("should build client");

        assert_eq!(
            client.slots_url(),
            "https://ttp.cbp.dhs.gov/schedulerapi/locations/5020/slots"
        );
    }

    #[test]
    fn test_decode_empty_listing() {
        let slots = decode_slots("[]").expect("should decode empty listing");
        assert!(slots.is_empty());
    }

    #[test]
    fn test_decode_slot_record() {
        let body = r#"[{"timestamp": "2024-06-02T09:00:00", "active": true}]"#;
        let slots = decode_slots(body).expect("should decode slot record");

        let expected = NaiveDate::from_ymd_opt(2024, 6, 2)
            .expect("valid date")
            .and_hms_opt(9, 0, 0)
            .expect("valid time");
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].timestamp, expected);
        assert!(slots[0].active);
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        let body = r#"[
            {"locationId": 5020, "timestamp": "2024-06-02T09:00:00", "active": false, "duration": 15},
            {"locationId": 5020, "timestamp": "2024-06-02T09:15:00", "active": true, "duration": 15}
        ]"#;
        let slots = decode_slots(body).expect("should decode listing with extra fields");

        assert_eq!(slots.len(), 2);
        assert!(!slots[0].active);
        assert!(slots[1].active);
    }

    #[test]
    fn test_decode_rejects_missing_active_flag() {
        let body = r#"[{"timestamp": "2024-06-02T09:00:00"}]"#;
        let err = decode_slots(body).expect_err("should reject record without active flag");
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_malformed_timestamp() {
        let body = r#"[{"timestamp": "not-a-timestamp", "active": true}]"#;
        let err = decode_slots(body).expect_err("should reject malformed timestamp");
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_non_array_body() {
        let err = decode_slots(r#"{"error": "location unknown"}"#)
            .expect_err("should reject non-array body");
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
