use inference::LocatorService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LocatorService>,
}

impl AppState {
    pub fn new(service: LocatorService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
