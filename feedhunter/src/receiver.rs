use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::error::ReceiverError;
use crate::tuner::{DEFAULT_SYSTEM, ServiceReference, TransponderParams};
use crate::types::{DeliverySystem, FeedRecord};

/// One tuner frontend as the receiver reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TunerInfo {
    pub name: String,
    /// Frontend description, e.g. `"Vuplus DVB-S NIM(45208 FBC) (DVB-S2)"`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl TunerInfo {
    pub fn supports(&self, system: DeliverySystem) -> bool {
        self.kind.to_ascii_uppercase().contains(system.to_name())
    }
}

/**
    The host receiver's tuner APIs: enumerate frontends, play a service,
    start a transponder scan.
*/
pub trait Receiver: Send + Sync {
    fn tuners(&self) -> impl Future<Output = Result<Vec<TunerInfo>, ReceiverError>> + Send;

    fn zap(
        &self,
        reference: &ServiceReference,
    ) -> impl Future<Output = Result<(), ReceiverError>> + Send;

    fn scan(
        &self,
        params: &TransponderParams,
    ) -> impl Future<Output = Result<(), ReceiverError>> + Send;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TuneMode {
    /// Play the service reference directly.
    #[default]
    Play,
    /// Start a transponder scan on the feed's parameters.
    Scan,
}

/// What the user sees after a tune attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuneStatus {
    Tuned,
    ScanStarted,
    NoTuner(DeliverySystem),
    Failed(String),
}

impl TuneStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Tuned | Self::ScanStarted)
    }

    pub fn message(&self) -> String {
        match self {
            Self::Tuned => "Tuned successfully".to_string(),
            Self::ScanStarted => "Scan started".to_string(),
            Self::NoTuner(system) => format!("No {} tuner available", system),
            Self::Failed(reason) => format!("Tuning failed: {}", reason),
        }
    }
}

/**
    Tune the receiver to `record`.

    Never returns an error: a missing tuner or a failed call becomes a status
    for the user, and no scan or zap is attempted without a capable tuner.
*/
pub async fn tune_feed<R: Receiver>(
    receiver: &R,
    record: &FeedRecord,
    mode: TuneMode,
) -> TuneStatus {
    let system = record.system.unwrap_or(DEFAULT_SYSTEM);

    let tuners = match receiver.tuners().await {
        Ok(tuners) => tuners,
        Err(e) => {
            tracing::warn!(error = %e, "[receiver] Failed to enumerate tuners");
            return TuneStatus::Failed(e.to_string());
        }
    };

    if !tuners.iter().any(|t| t.supports(system)) {
        tracing::warn!(%system, tuners = tuners.len(), "[receiver] No capable tuner");
        return TuneStatus::NoTuner(system);
    }

    let result = match mode {
        TuneMode::Play => {
            let reference = ServiceReference::from_record(record);
            tracing::info!(%reference, "[receiver] Zapping");
            receiver.zap(&reference).await.map(|()| TuneStatus::Tuned)
        }
        TuneMode::Scan => {
            let params = TransponderParams::from_record(record);
            tracing::info!(?params, "[receiver] Starting scan");
            receiver.scan(&params).await.map(|()| TuneStatus::ScanStarted)
        }
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "[receiver] Tune failed");
        TuneStatus::Failed(e.to_string())
    })
}

/**
    OpenWebif-style HTTP API of a set-top box: `GET /api/about` for the
    frontends and `GET /api/zap?sRef=...` to play a service.
*/
#[derive(Debug, Clone)]
pub struct WebifReceiver {
    base: Url,
    client: Client,
}

#[derive(Deserialize)]
struct AboutResponse {
    info: AboutInfo,
}

#[derive(Deserialize)]
struct AboutInfo {
    #[serde(default)]
    tuners: Vec<TunerInfo>,
}

#[derive(Deserialize)]
struct ZapResponse {
    result: bool,
    #[serde(default)]
    message: String,
}

impl WebifReceiver {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ReceiverError> {
        let base = Url::parse(base_url).map_err(|e| ReceiverError::Url {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ReceiverError> {
        self.base.join(path).map_err(|e| ReceiverError::Url {
            url: format!("{}{}", self.base, path),
            reason: e.to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, ReceiverError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ReceiverError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

impl Receiver for WebifReceiver {
    async fn tuners(&self) -> Result<Vec<TunerInfo>, ReceiverError> {
        let about: AboutResponse = self.get_json(self.endpoint("api/about")?).await?;
        Ok(about.info.tuners)
    }

    async fn zap(&self, reference: &ServiceReference) -> Result<(), ReceiverError> {
        let mut url = self.endpoint("api/zap")?;
        url.query_pairs_mut()
            .append_pair("sRef", &reference.to_string());

        let response: ZapResponse = self.get_json(url).await?;
        if response.result {
            Ok(())
        } else {
            Err(ReceiverError::Rejected(response.message))
        }
    }

    async fn scan(&self, _params: &TransponderParams) -> Result<(), ReceiverError> {
        Err(ReceiverError::Unsupported("transponder scan"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::Json;
    use axum::Router;
    use axum::extract::Query;
    use axum::routing::get;
    use parking_lot::Mutex;

    use super::*;
    use crate::testing::serve;
    use crate::types::{Fec, Polarization};

    fn record() -> FeedRecord {
        FeedRecord {
            frequency_mhz: 11585,
            polarization: Polarization::Vertical,
            symbol_rate_ksym: 27500,
            forward_error_correction: Fec::ThreeQuarters,
            ..FeedRecord::new("12.5°W")
        }
    }

    fn s2_tuner() -> TunerInfo {
        TunerInfo {
            name: "Tuner A".to_string(),
            kind: "BCM4506 (internal) (DVB-S2)".to_string(),
        }
    }

    /// Records every call; fails the ones it is told to.
    #[derive(Default)]
    struct MockReceiver {
        tuners: Vec<TunerInfo>,
        fail_zap: bool,
        zapped: Mutex<Vec<String>>,
        scanned: Mutex<Vec<TransponderParams>>,
    }

    impl Receiver for MockReceiver {
        async fn tuners(&self) -> Result<Vec<TunerInfo>, ReceiverError> {
            Ok(self.tuners.clone())
        }

        async fn zap(&self, reference: &ServiceReference) -> Result<(), ReceiverError> {
            if self.fail_zap {
                return Err(ReceiverError::Rejected("no signal".to_string()));
            }
            self.zapped.lock().push(reference.to_string());
            Ok(())
        }

        async fn scan(&self, params: &TransponderParams) -> Result<(), ReceiverError> {
            self.scanned.lock().push(*params);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_play_zaps_service_reference() {
        let receiver = MockReceiver {
            tuners: vec![s2_tuner()],
            ..Default::default()
        };

        let status = tune_feed(&receiver, &record(), TuneMode::Play).await;
        assert_eq!(status, TuneStatus::Tuned);
        assert_eq!(status.message(), "Tuned successfully");
        assert_eq!(*receiver.zapped.lock(), vec!["1:0:1:11585:1:27500:4:0:0:0:"]);
    }

    #[tokio::test]
    async fn test_scan_passes_transponder_params() {
        let receiver = MockReceiver {
            tuners: vec![s2_tuner()],
            ..Default::default()
        };

        let status = tune_feed(&receiver, &record(), TuneMode::Scan).await;
        assert_eq!(status, TuneStatus::ScanStarted);
        let scanned = receiver.scanned.lock();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].frequency, 11_585_000);
        assert_eq!(scanned[0].orbital_position, 3475);
    }

    #[tokio::test]
    async fn test_no_capable_tuner() {
        let receiver = MockReceiver {
            tuners: vec![TunerInfo {
                name: "Tuner B".to_string(),
                kind: "Si2169 (DVB-T2/C)".to_string(),
            }],
            ..Default::default()
        };

        let status = tune_feed(&receiver, &record(), TuneMode::Scan).await;
        assert_eq!(status, TuneStatus::NoTuner(DeliverySystem::DvbS2));
        assert_eq!(status.message(), "No DVB-S2 tuner available");
        assert!(receiver.scanned.lock().is_empty());
    }

    #[tokio::test]
    async fn test_dvb_s_feed_accepts_s2_tuner() {
        let receiver = MockReceiver {
            tuners: vec![s2_tuner()],
            ..Default::default()
        };
        let record = FeedRecord {
            system: Some(DeliverySystem::DvbS),
            ..record()
        };
        assert!(tune_feed(&receiver, &record, TuneMode::Play).await.is_success());
    }

    #[tokio::test]
    async fn test_failure_becomes_status() {
        let receiver = MockReceiver {
            tuners: vec![s2_tuner()],
            fail_zap: true,
            ..Default::default()
        };

        let status = tune_feed(&receiver, &record(), TuneMode::Play).await;
        assert!(!status.is_success());
        assert_eq!(
            status.message(),
            "Tuning failed: receiver rejected the request: no signal"
        );
    }

    #[tokio::test]
    async fn test_webif_receiver() {
        let router = Router::new()
            .route(
                "/api/about",
                get(|| async {
                    Json(serde_json::json!({
                        "info": {
                            "model": "solo2",
                            "tuners": [
                                { "name": "Tuner A", "type": "BCM7356 (internal) (DVB-S2)" },
                                { "name": "Tuner B", "type": "BCM7356 (internal) (DVB-S2)" }
                            ]
                        }
                    }))
                }),
            )
            .route(
                "/api/zap",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let ok = params.get("sRef").map(String::as_str)
                        == Some("1:0:1:11585:1:27500:4:0:0:0:");
                    let message = if ok { "Active service switched" } else { "bad sRef" };
                    Json(serde_json::json!({ "result": ok, "message": message }))
                }),
            );
        let addr = serve(router).await;

        let receiver =
            WebifReceiver::new(&format!("http://{}/", addr), Duration::from_secs(5)).unwrap();

        let tuners = receiver.tuners().await.unwrap();
        assert_eq!(tuners.len(), 2);
        assert!(tuners[0].supports(DeliverySystem::DvbS2));

        assert_eq!(tune_feed(&receiver, &record(), TuneMode::Play).await, TuneStatus::Tuned);

        let other = FeedRecord {
            frequency_mhz: 12000,
            ..record()
        };
        assert!(matches!(
            tune_feed(&receiver, &other, TuneMode::Play).await,
            TuneStatus::Failed(_)
        ));

        assert!(matches!(
            receiver.scan(&TransponderParams::from_record(&record())).await,
            Err(ReceiverError::Unsupported(_))
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            WebifReceiver::new("not a url", Duration::from_secs(1)),
            Err(ReceiverError::Url { .. })
        ));
    }
}
