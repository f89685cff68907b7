use std::sync::Arc;

use crate::clock::Clock;
use crate::notifier::Notifier;
use crate::repository::ClassRepository;
use crate::services::ReminderScheduler;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ClassRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub scheduler: Arc<ReminderScheduler>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn ClassRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let scheduler = Arc::new(ReminderScheduler::new(
            repository.clone(),
            notifier.clone(),
            clock.clone(),
        ));
        Self {
            repository,
            notifier,
            clock,
            scheduler,
        }
    }
}
