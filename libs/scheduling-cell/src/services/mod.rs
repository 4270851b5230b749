// libs/scheduling-cell/src/services/mod.rs
use std::sync::Arc;

use shared_config::AppConfig;

use crate::store::{MemoryStore, SchedulingStore};

pub mod allocator;
pub mod availability;
pub mod catalog;
pub mod directory;
pub mod ledger;
pub mod notify;
pub mod validator;

pub use allocator::SlotAllocator;
pub use availability::AvailabilityAggregator;
pub use catalog::ScheduleCatalog;
pub use directory::DirectoryClient;
pub use ledger::BookingLedger;
pub use notify::NotificationClient;
pub use validator::BookingValidator;

/// Shared handler state: one store, one service graph wired over it.
pub struct SchedulingState {
    pub config: AppConfig,
    pub catalog: Arc<ScheduleCatalog>,
    pub allocator: Arc<SlotAllocator>,
    pub validator: Arc<BookingValidator>,
    pub ledger: Arc<BookingLedger>,
    pub aggregator: Arc<AvailabilityAggregator>,
    pub store: Arc<dyn SchedulingStore>,
}

impl SchedulingState {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: &AppConfig, store: Arc<dyn SchedulingStore>) -> Self {
        let catalog = Arc::new(ScheduleCatalog::new(Arc::clone(&store)));
        let allocator = Arc::new(SlotAllocator::new(Arc::clone(&catalog), Arc::clone(&store)));
        let validator = Arc::new(BookingValidator::new(
            Arc::clone(&catalog),
            Arc::clone(&allocator),
            config.booking_granularity_minutes,
        ));
        let notifier = Arc::new(NotificationClient::new(config));
        let directory = Arc::new(DirectoryClient::new(config));
        let ledger = Arc::new(BookingLedger::new(
            Arc::clone(&store),
            Arc::clone(&validator),
            notifier,
            directory,
            config.reserve_retry_attempts,
        ));
        let aggregator = Arc::new(AvailabilityAggregator::new(
            Arc::clone(&catalog),
            Arc::clone(&store),
            config.density_range_max_days,
        ));

        Self {
            config: config.clone(),
            catalog,
            allocator,
            validator,
            ledger,
            aggregator,
            store,
        }
    }
}
