//! Named driver registry

use crate::domain::driver::SoundDriver;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Lookup and registration of sound drivers by name
pub trait DriverRegistry: Send + Sync {
    fn register(&self, driver: Arc<dyn SoundDriver>);

    fn get_driver(&self, name: &str) -> Option<Arc<dyn SoundDriver>>;

    /// All registered drivers in registration order
    fn drivers(&self) -> Vec<Arc<dyn SoundDriver>>;
}

/// Registry kept in process memory
#[derive(Default)]
pub struct InMemoryRegistry {
    drivers: RwLock<Vec<Arc<dyn SoundDriver>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DriverRegistry for InMemoryRegistry {
    fn register(&self, driver: Arc<dyn SoundDriver>) {
        let mut drivers = match self.drivers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(slot) = drivers.iter_mut().find(|d| d.name() == driver.name()) {
            warn!(driver = driver.name(), "Driver already registered, replacing it");
            *slot = driver;
            return;
        }

        debug!(driver = driver.name(), "Driver registered");
        drivers.push(driver);
    }

    fn get_driver(&self, name: &str) -> Option<Arc<dyn SoundDriver>> {
        let drivers = match self.drivers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        drivers.iter().find(|d| d.name() == name).cloned()
    }

    fn drivers(&self) -> Vec<Arc<dyn SoundDriver>> {
        match self.drivers.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
