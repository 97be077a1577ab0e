use crate::config::AppConfig;
use crate::services::booking::BookingStore;
use crate::services::nlp::NlpService;

pub struct AppState {
    pub config: AppConfig,
    pub store: BookingStore,
    pub nlp: NlpService,
}
