use serde::Serialize;

use super::{ViewError, format_timestamp};
use crate::models::{AuthToken, BadgeVariant, Complaint, ComplaintAction, ComplaintStatus, Worker};
use crate::services::DataGateway;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComplaintStats {
    pub pending: usize,
    pub assigned: usize,
    pub completed: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ComplaintCard<'v> {
    pub id: i64,
    pub name: &'v str,
    pub location: &'v str,
    pub description: &'v str,
    pub photo: Option<&'v str>,
    pub status: &'static str,
    pub status_label: &'static str,
    pub badge: BadgeVariant,
    pub worker: Option<&'v Worker>,
    pub created_at: String,
    pub can_assign: bool,
    pub can_complete: bool,
}

#[derive(Debug, Serialize)]
pub struct ComplaintsPage<'v> {
    pub stats: ComplaintStats,
    pub complaints: Vec<ComplaintCard<'v>>,
    pub workers: &'v [Worker],
    pub empty: bool,
}

/// Complaints manager: every complaint plus the workers they can be assigned to.
pub struct ComplaintsView<'a> {
    gateway: &'a dyn DataGateway,
    token: AuthToken,
    complaints: Vec<Complaint>,
    workers: Vec<Worker>,
}

impl<'a> ComplaintsView<'a> {
    /// Fetch complaints and workers together; if either request fails, neither is kept.
    pub async fn load(gateway: &'a dyn DataGateway, token: AuthToken) -> Result<Self, ViewError> {
        let (complaints, workers) = tokio::try_join!(
            gateway.list_complaints(&token),
            gateway.list_workers(&token)
        )?;

        Ok(ComplaintsView {
            gateway,
            token,
            complaints,
            workers,
        })
    }

    /// What is shown when loading failed.
    pub fn empty(gateway: &'a dyn DataGateway, token: AuthToken) -> Self {
        ComplaintsView {
            gateway,
            token,
            complaints: Vec::new(),
            workers: Vec::new(),
        }
    }

    pub fn stats(&self) -> ComplaintStats {
        let count = |status: ComplaintStatus| {
            self.complaints
                .iter()
                .filter(|c| c.status == status)
                .count()
        };

        ComplaintStats {
            pending: count(ComplaintStatus::Pending),
            assigned: count(ComplaintStatus::Assigned),
            completed: count(ComplaintStatus::Completed),
            total: self.complaints.len(),
        }
    }

    pub async fn assign_worker(
        &mut self,
        complaint_id: i64,
        worker_id: Option<i64>,
    ) -> Result<&Complaint, ViewError> {
        self.ensure_allowed(complaint_id, ComplaintAction::AssignWorker)?;

        let worker_id =
            worker_id.ok_or_else(|| ViewError::Invalid("Please select a worker.".to_string()))?;
        if !self.workers.iter().any(|w| w.id == worker_id) {
            return Err(ViewError::NotFound("Worker"));
        }

        let updated = self
            .gateway
            .assign_worker(&self.token, complaint_id, worker_id)
            .await?;
        Ok(self.merge(updated))
    }

    pub async fn mark_complete(&mut self, complaint_id: i64) -> Result<&Complaint, ViewError> {
        self.ensure_allowed(complaint_id, ComplaintAction::MarkComplete)?;

        let updated = self
            .gateway
            .set_complaint_status(&self.token, complaint_id, ComplaintStatus::Completed)
            .await?;
        Ok(self.merge(updated))
    }

    pub fn page(&self) -> ComplaintsPage<'_> {
        let complaints = self
            .complaints
            .iter()
            .map(|c| ComplaintCard {
                id: c.id,
                name: &c.name,
                location: &c.location,
                description: &c.description,
                photo: c.photo.as_deref(),
                status: c.status.as_str(),
                status_label: c.status.label(),
                badge: c.status.badge(),
                worker: c.assigned_worker.as_ref(),
                created_at: format_timestamp(&c.created_at),
                can_assign: c.status.allows(ComplaintAction::AssignWorker),
                can_complete: c.status.allows(ComplaintAction::MarkComplete),
            })
            .collect();

        ComplaintsPage {
            stats: self.stats(),
            complaints,
            workers: &self.workers,
            empty: self.complaints.is_empty(),
        }
    }

    fn ensure_allowed(&self, complaint_id: i64, action: ComplaintAction) -> Result<(), ViewError> {
        let complaint = self
            .complaints
            .iter()
            .find(|c| c.id == complaint_id)
            .ok_or(ViewError::NotFound("Complaint"))?;

        if complaint.status.allows(action) {
            Ok(())
        } else {
            Err(ViewError::ActionUnavailable)
        }
    }

    fn merge(&mut self, updated: Complaint) -> &Complaint {
        let index = match self.complaints.iter().position(|c| c.id == updated.id) {
            Some(index) => {
                self.complaints[index] = updated;
                index
            }
            None => {
                self.complaints.push(updated);
                self.complaints.len() - 1
            }
        };
        &self.complaints[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{AuthBackend, MemoryBackend};

    async fn admin_token(backend: &MemoryBackend) -> AuthToken {
        backend.login("admin@example.com", "demo").await.unwrap().token
    }

    #[tokio::test]
    async fn counts_by_status() {
        let backend = MemoryBackend::seeded("admin@example.com", 100);
        let token = admin_token(&backend).await;
        let view = ComplaintsView::load(&backend, token).await.unwrap();

        assert_eq!(
            view.stats(),
            ComplaintStats {
                pending: 1,
                assigned: 1,
                completed: 0,
                total: 2,
            }
        );
        assert_eq!(view.workers.len(), 3);
    }

    #[tokio::test]
    async fn assigning_a_pending_complaint() {
        let backend = MemoryBackend::seeded("admin@example.com", 100);
        let token = admin_token(&backend).await;
        let mut view = ComplaintsView::load(&backend, token).await.unwrap();

        let updated = view.assign_worker(1, Some(3)).await.unwrap();
        assert_eq!(updated.status, ComplaintStatus::Assigned);
        let worker = updated.assigned_worker.as_ref().unwrap();
        assert_eq!(worker.name, "Sam Okafor");
        assert_eq!(worker.phone, "555-0103");
        assert_eq!(worker.area, "Riverside");

        assert_eq!(view.stats().assigned, 2);
        assert_eq!(view.stats().pending, 0);
    }

    #[tokio::test]
    async fn assigning_requires_pending_and_never_calls_out() {
        let backend = MemoryBackend::seeded("admin@example.com", 100);
        let token = admin_token(&backend).await;
        let mut view = ComplaintsView::load(&backend, token).await.unwrap();
        let calls = backend.gateway_calls();

        let err = view.assign_worker(2, Some(1)).await.unwrap_err();
        assert!(matches!(err, ViewError::ActionUnavailable));

        let err = view.assign_worker(1, None).await.unwrap_err();
        assert!(matches!(err, ViewError::Invalid(_)));

        let err = view.assign_worker(1, Some(42)).await.unwrap_err();
        assert!(matches!(err, ViewError::NotFound("Worker")));

        assert_eq!(backend.gateway_calls(), calls);
    }

    #[tokio::test]
    async fn completing_only_from_assigned() {
        let backend = MemoryBackend::seeded("admin@example.com", 100);
        let token = admin_token(&backend).await;
        let mut view = ComplaintsView::load(&backend, token).await.unwrap();

        assert!(matches!(
            view.mark_complete(1).await,
            Err(ViewError::ActionUnavailable)
        ));

        let updated = view.mark_complete(2).await.unwrap();
        assert_eq!(updated.status, ComplaintStatus::Completed);
        assert!(updated.status.actions().is_empty());

        assert!(matches!(
            view.mark_complete(2).await,
            Err(ViewError::ActionUnavailable)
        ));
        assert_eq!(view.stats().completed, 1);
    }

    #[tokio::test]
    async fn failed_load_discards_both_collections() {
        let backend = MemoryBackend::seeded("admin@example.com", 100);
        let token = admin_token(&backend).await;
        backend.set_available(false);

        let err = ComplaintsView::load(&backend, token).await.err().unwrap();
        assert!(matches!(err, ViewError::Gateway(_)));
    }

    #[tokio::test]
    async fn page_marks_offered_actions() {
        let backend = MemoryBackend::seeded("admin@example.com", 100);
        let token = admin_token(&backend).await;
        let view = ComplaintsView::load(&backend, token).await.unwrap();
        let page = view.page();

        let pending = page.complaints.iter().find(|c| c.id == 1).unwrap();
        assert!(pending.can_assign && !pending.can_complete);
        let assigned = page.complaints.iter().find(|c| c.id == 2).unwrap();
        assert!(!assigned.can_assign && assigned.can_complete);
        assert!(!page.empty);
    }
}
