use metrics_exporter_prometheus::PrometheusHandle;
use pulse_score::error::AppError;
use pulse_score::workflows::pulse::{
    CertificationNotice, InMemoryPulseStore, NotificationError, NotificationSink,
    PulseServiceError, UnitId,
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notification adapter that logs each notice and keeps it for inspection.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotificationSink {
    notices: Arc<Mutex<Vec<CertificationNotice>>>,
}

impl NotificationSink for LoggingNotificationSink {
    fn notify(&self, notice: CertificationNotice) -> Result<(), NotificationError> {
        info!(
            recipient = %notice.recipient,
            unit = %notice.unit,
            certificate_id = %notice.certificate_id,
            score = notice.score,
            "certification notice dispatched"
        );
        self.notices
            .lock()
            .map_err(|_| NotificationError::Transport("notice log poisoned".to_string()))?
            .push(notice);
        Ok(())
    }
}

impl LoggingNotificationSink {
    pub(crate) fn notices(&self) -> Vec<CertificationNotice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }
}

/// Enrolls `emp-1..=emp-{roster_size}` as pending respondents for `unit`.
pub(crate) fn seed_roster(
    store: &InMemoryPulseStore,
    unit: &UnitId,
    roster_size: usize,
    contact: Option<&str>,
) -> Result<(), AppError> {
    store
        .enroll(unit, (1..=roster_size).map(|index| format!("emp-{index}")))
        .map_err(PulseServiceError::from)?;
    if let Some(contact) = contact {
        store
            .set_contact(unit, contact)
            .map_err(PulseServiceError::from)?;
    }
    info!(unit = %unit, roster_size, "roster seeded");
    Ok(())
}
