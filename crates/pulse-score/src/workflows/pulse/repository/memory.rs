use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::super::domain::{
    Certification, CertificationId, CompletionStatus, DateRange, IssuanceKey, RespondentId,
    ResponseId, ResponseRecord, RosterMember, UnitId,
};
use super::{PulseRepository, RepositoryError};

#[derive(Debug, Default)]
struct StoreState {
    responses: HashMap<ResponseId, ResponseRecord>,
    rosters: HashMap<UnitId, Vec<RosterMember>>,
    contacts: HashMap<UnitId, String>,
    certifications: Vec<Certification>,
    issuance_keys: HashMap<IssuanceKey, CertificationId>,
}

/// Process-local store backing the demo server and tests.
///
/// All state sits behind one mutex, so the certification guard's check and
/// write happen under the same lock.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPulseStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryPulseStore {
    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    /// Adds pending roster entries for `respondents`, skipping ones already enrolled.
    pub fn enroll<I, S>(&self, unit: &UnitId, respondents: I) -> Result<(), RepositoryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.lock()?;
        let roster = state.rosters.entry(unit.clone()).or_default();
        for respondent in respondents {
            let respondent = RespondentId(respondent.into());
            if roster.iter().any(|member| member.respondent == respondent) {
                continue;
            }
            roster.push(RosterMember {
                respondent,
                unit: unit.clone(),
                status: CompletionStatus::Pending,
            });
        }
        Ok(())
    }

    pub fn set_contact(
        &self,
        unit: &UnitId,
        contact: impl Into<String>,
    ) -> Result<(), RepositoryError> {
        self.lock()?.contacts.insert(unit.clone(), contact.into());
        Ok(())
    }

    /// Loads a historical certification without going through the guard.
    pub fn seed_certification(&self, certification: Certification) -> Result<(), RepositoryError> {
        self.lock()?.certifications.push(certification);
        Ok(())
    }

    pub fn certification_count(&self) -> usize {
        self.lock()
            .map(|state| state.certifications.len())
            .unwrap_or_default()
    }
}

impl PulseRepository for InMemoryPulseStore {
    fn insert_response(&self, record: ResponseRecord) -> Result<ResponseRecord, RepositoryError> {
        let mut state = self.lock()?;
        if state.responses.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        state.responses.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn mark_completed(
        &self,
        unit: &UnitId,
        respondent: &RespondentId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let member = state
            .rosters
            .get_mut(unit)
            .and_then(|roster| roster.iter_mut().find(|member| &member.respondent == respondent))
            .ok_or(RepositoryError::NotFound)?;
        member.status = CompletionStatus::Completed;
        Ok(())
    }

    fn roster(&self, unit: &UnitId) -> Result<Vec<RosterMember>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.rosters.get(unit).cloned().unwrap_or_default())
    }

    fn responses(
        &self,
        unit: &UnitId,
        range: &DateRange,
    ) -> Result<Vec<ResponseRecord>, RepositoryError> {
        let state = self.lock()?;
        let mut records: Vec<ResponseRecord> = state
            .responses
            .values()
            .filter(|record| &record.unit == unit && range.contains(record.submitted_at))
            .cloned()
            .collect();
        records.sort_by(|left, right| {
            left.submitted_at
                .cmp(&right.submitted_at)
                .then_with(|| left.id.0.cmp(&right.id.0))
        });
        Ok(records)
    }

    fn unit_contact(&self, unit: &UnitId) -> Result<Option<String>, RepositoryError> {
        Ok(self.lock()?.contacts.get(unit).cloned())
    }

    fn certifications(&self, unit: &UnitId) -> Result<Vec<Certification>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .certifications
            .iter()
            .filter(|certification| &certification.unit == unit)
            .cloned()
            .collect())
    }

    fn certification(
        &self,
        id: &CertificationId,
    ) -> Result<Option<Certification>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .certifications
            .iter()
            .find(|certification| &certification.id == id)
            .cloned())
    }

    fn insert_certification(
        &self,
        key: IssuanceKey,
        certification: Certification,
        cooldown_months: u32,
    ) -> Result<Certification, RepositoryError> {
        let mut state = self.lock()?;

        if let Some(existing) = state.issuance_keys.get(&key) {
            return Err(RepositoryError::DuplicateCertification(existing.clone()));
        }

        if let Some(existing) = state
            .certifications
            .iter()
            .filter(|existing| existing.unit == certification.unit)
            .filter(|existing| existing.blocks_reissue(certification.issued_at, cooldown_months))
            .max_by_key(|existing| existing.issued_at)
        {
            return Err(RepositoryError::DuplicateCertification(existing.id.clone()));
        }

        state.issuance_keys.insert(key, certification.id.clone());
        state.certifications.push(certification.clone());
        Ok(certification)
    }
}
