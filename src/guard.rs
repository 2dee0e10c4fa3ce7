use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::error::{AppError, AppResult};

/// Tracks forms with a submission in flight so a second click is refused
/// until the first one settles.
#[derive(Debug, Clone, Default)]
pub struct SubmitGuard {
    in_flight: Arc<Mutex<HashSet<&'static str>>>,
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `form`; the claim is released when the ticket drops.
    pub fn begin(&self, form: &'static str) -> AppResult<SubmitTicket> {
        if !self.lock().insert(form) {
            tracing::debug!(form, "duplicate submission refused");
            return Err(AppError::SubmissionPending(form));
        }
        Ok(SubmitTicket {
            in_flight: Arc::clone(&self.in_flight),
            form,
        })
    }

    /// Whether the triggering control should render disabled.
    pub fn is_pending(&self, form: &'static str) -> bool {
        self.lock().contains(form)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<&'static str>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct SubmitTicket {
    in_flight: Arc<Mutex<HashSet<&'static str>>>,
    form: &'static str,
}

impl Drop for SubmitTicket {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(self.form);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_fails_until_ticket_drops() {
        let guard = SubmitGuard::new();
        let ticket = guard.begin("add_product").unwrap();
        assert!(guard.is_pending("add_product"));
        assert!(matches!(
            guard.begin("add_product"),
            Err(AppError::SubmissionPending("add_product"))
        ));
        assert!(guard.begin("book_service").is_ok());

        drop(ticket);
        assert!(!guard.is_pending("add_product"));
        assert!(guard.begin("add_product").is_ok());
    }
}
