/// Batch orchestration: encode then send each report, in order, one at a time.
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::{model::PositionReport, protocol::cot, transport::CotSink, RelayResult};

pub struct Relay<S> {
    sink: S,
}

/// Result of relaying one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    /// Reports attempted; always the batch size.
    pub count: usize,
    pub sent: usize,
    pub failures: Vec<ItemFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub index: usize,
    pub uid: String,
    pub error: String,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<S> Relay<S>
where
    S: CotSink,
{
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Encode and send a single report.
    pub fn relay_report(
        &self,
        report: &PositionReport,
        stale_minutes: u32,
        now: DateTime<Utc>,
    ) -> RelayResult<()> {
        let payload = cot::encode(report, stale_minutes, now)?;
        self.sink.send(&payload)
    }

    /// Relay every report in order. A failed item is recorded and the rest of the batch still
    /// goes out.
    pub fn relay_batch(
        &self,
        reports: &[PositionReport],
        stale_minutes: u32,
        now: DateTime<Utc>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            count: reports.len(),
            sent: 0,
            failures: Vec::new(),
        };
        for (index, report) in reports.iter().enumerate() {
            match self.relay_report(report, stale_minutes, now) {
                Ok(()) => outcome.sent += 1,
                Err(e) => {
                    let uid = report.event_uid();
                    warn!("report {index} ({uid}) not relayed: {e}");
                    outcome.failures.push(ItemFailure {
                        index,
                        uid,
                        error: e.to_string(),
                    });
                }
            }
        }
        info!(
            "relayed {}/{} reports, stale window {} min",
            outcome.sent, outcome.count, stale_minutes
        );
        outcome
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{lazy_init_tracing, model::ObjectKind, protocol::CotEvent, transport::MemorySink};

    fn now() -> DateTime<Utc> {
        "2024-06-01T00:00:00Z".parse().unwrap()
    }

    fn reports() -> Vec<PositionReport> {
        vec![
            PositionReport::new("Alpha1", ObjectKind::Person, 34.05, -118.24)
                .with_remarks("moving north"),
            PositionReport::new("Bravo2", ObjectKind::Helicopter, 10.0, 20.0).with_hae(5.0),
            PositionReport::new("Charlie3", ObjectKind::Car, -1.5, 2.25).with_uid("veh-3"),
        ]
    }

    fn uids(sink: &MemorySink) -> Vec<String> {
        sink.sent()
            .iter()
            .map(|p| {
                let event: CotEvent =
                    quick_xml::de::from_str(std::str::from_utf8(p).unwrap()).unwrap();
                event.uid
            })
            .collect()
    }

    #[test]
    fn test_relay_batch_in_order() {
        lazy_init_tracing();
        let relay = Relay::new(MemorySink::new());
        let outcome = relay.relay_batch(&reports(), 5, now());
        assert!(outcome.is_complete());
        assert_eq!(outcome.count, 3);
        assert_eq!(outcome.sent, 3);
        assert_eq!(uids(relay.sink()), ["REST_Alpha1", "REST_Bravo2", "veh-3"]);
    }

    #[test]
    fn test_relay_batch_continues_after_send_failure() {
        lazy_init_tracing();
        let relay = Relay::new(MemorySink::failing_on([0]));
        let outcome = relay.relay_batch(&reports(), 5, now());
        assert_eq!(outcome.count, 3);
        assert_eq!(outcome.sent, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 0);
        assert_eq!(outcome.failures[0].uid, "REST_Alpha1");
        assert_eq!(relay.sink().attempts(), 3);
        assert_eq!(uids(relay.sink()), ["REST_Bravo2", "veh-3"]);
    }

    #[test]
    fn test_relay_batch_encode_failure_is_local() {
        let relay = Relay::new(MemorySink::new());
        let outcome = relay.relay_batch(&reports(), 5, DateTime::<Utc>::MAX_UTC);
        assert_eq!(outcome.sent, 0);
        assert_eq!(outcome.failures.len(), 3);
        // nothing reached the sink
        assert_eq!(relay.sink().attempts(), 0);

        let outcome = relay.relay_batch(&reports(), 5, now());
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_relay_empty_batch() {
        let relay = Relay::new(MemorySink::new());
        let outcome = relay.relay_batch(&[], 5, now());
        assert_eq!(outcome.count, 0);
        assert!(outcome.is_complete());
    }
}
