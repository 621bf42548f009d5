use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    access_denied: AtomicU64,
    moderation_actions: AtomicU64,
    reviews_deleted: AtomicU64,
    payouts_requested: AtomicU64,
    payouts_completed: AtomicU64,
    payouts_failed: AtomicU64,
    refunds_processed: AtomicU64,
    refunds_failed: AtomicU64,
    notifications_created: AtomicU64,
    email_failures: AtomicU64,
}

impl Metrics {
    pub fn record_access_denied(&self) {
        self.access_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_moderation(&self) {
        self.moderation_actions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reviews_deleted(&self, count: u64) {
        self.reviews_deleted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_payout_requested(&self) {
        self.payouts_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_payout_completed(&self) {
        self.payouts_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_payout_failed(&self) {
        self.payouts_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refund_processed(&self) {
        self.refunds_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refund_failed(&self) {
        self.refunds_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_notification(&self) {
        self.notifications_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_email_failure(&self) {
        self.email_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notifications_created(&self) -> u64 {
        self.notifications_created.load(Ordering::Relaxed)
    }

    pub fn email_failures(&self) -> u64 {
        self.email_failures.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let counters = [
            ("stagepass_access_denied_total", &self.access_denied),
            ("stagepass_moderation_actions_total", &self.moderation_actions),
            ("stagepass_reviews_deleted_total", &self.reviews_deleted),
            ("stagepass_payouts_requested_total", &self.payouts_requested),
            ("stagepass_payouts_completed_total", &self.payouts_completed),
            ("stagepass_payouts_failed_total", &self.payouts_failed),
            ("stagepass_refunds_processed_total", &self.refunds_processed),
            ("stagepass_refunds_failed_total", &self.refunds_failed),
            ("stagepass_notifications_created_total", &self.notifications_created),
            ("stagepass_email_failures_total", &self.email_failures),
        ];
        let mut out = String::new();
        for (name, counter) in counters {
            out.push_str(&format!(
                "# TYPE {} counter\n{} {}\n",
                name,
                name,
                counter.load(Ordering::Relaxed)
            ));
        }
        out
    }
}
