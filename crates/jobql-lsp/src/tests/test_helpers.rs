//! Test helper functions and fixtures for validator tests

use std::sync::Arc;
use std::time::Duration;

use jobql_core::testing::MockPollingClient;

use crate::{BufferSurface, DebouncedValidator, ValidatorConfig};

pub const DELAY: Duration = Duration::from_millis(1500);

pub struct Fixture {
    pub buffer: Arc<BufferSurface>,
    pub client: Arc<MockPollingClient>,
    pub validator: DebouncedValidator,
}

/// Build a validator over a buffer holding `text`
pub fn fixture(text: &str) -> Fixture {
    let buffer = Arc::new(BufferSurface::new(text));
    let client = MockPollingClient::new();
    let validator = DebouncedValidator::new(buffer.clone(), client.clone(), ValidatorConfig::default());
    Fixture {
        buffer,
        client,
        validator,
    }
}

/// Let the debounce timer elapse
pub async fn wait_past_delay() {
    tokio::time::sleep(DELAY + Duration::from_millis(100)).await;
}
