//! Platform registry — the process-wide directory of platforms.

use std::sync::{Arc, PoisonError, RwLock};

use hearth_domain::accessory::{Accessory, AccessoryDefinition};
use hearth_domain::error::{BridgeError, NotFoundError};

use crate::ports::Platform;

/// Registered platforms, kept in registration order.
///
/// There is no unregistration; platforms live for the whole process.
#[derive(Default)]
pub struct PlatformRegistry {
    platforms: RwLock<Vec<Arc<dyn Platform>>>,
}

impl PlatformRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `platform` under its name.
    ///
    /// The first registration wins; returns `false` (and keeps the existing
    /// platform) when the name is already taken.
    pub fn register(&self, platform: Arc<dyn Platform>) -> bool {
        let mut platforms = self.platforms.write().unwrap_or_else(PoisonError::into_inner);
        if platforms.iter().any(|p| p.name() == platform.name()) {
            tracing::debug!(platform = platform.name(), "platform already registered");
            return false;
        }
        tracing::info!(platform = platform.name(), "platform registered");
        platforms.push(platform);
        true
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Platform>> {
        self.platforms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.snapshot().iter().map(|p| p.name()).collect()
    }

    /// Start every platform.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first startup failure.
    pub async fn startup_all(&self) -> Result<(), BridgeError> {
        for platform in self.snapshot() {
            tracing::debug!(platform = platform.name(), "starting platform");
            platform.startup().await?;
        }
        Ok(())
    }

    /// Start background work on every platform; failures are logged.
    pub async fn background_all(&self) {
        for platform in self.snapshot() {
            if let Err(err) = platform.background().await {
                tracing::warn!(platform = platform.name(), error = %err, "background start failed");
            }
        }
    }

    /// Shut every platform down; failures are logged.
    pub async fn shutdown_all(&self) {
        for platform in self.snapshot() {
            if let Err(err) = platform.shutdown().await {
                tracing::warn!(platform = platform.name(), error = %err, "shutdown failed");
            }
        }
    }

    /// Hand a definition to the platform it names.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] for an invalid definition,
    /// [`BridgeError::NotFound`] when no platform has that name, or whatever
    /// the platform's `add_accessory` failed with.
    pub async fn add_accessory(&self, def: AccessoryDefinition) -> Result<Arc<Accessory>, BridgeError> {
        def.validate()?;
        let platform = self.lookup(&def.platform).ok_or_else(|| NotFoundError {
            entity: "Platform",
            id: def.platform.clone(),
        })?;
        platform.add_accessory(def).await
    }

    // Platforms are awaited without holding the lock.
    fn snapshot(&self) -> Vec<Arc<dyn Platform>> {
        self.platforms.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hearth_domain::error::ValidationError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Named {
        name: &'static str,
        tag: usize,
        started: Arc<Mutex<Vec<&'static str>>>,
        fail_startup: bool,
    }

    impl Named {
        fn new(name: &'static str, tag: usize) -> Self {
            Self {
                name,
                tag,
                started: Arc::default(),
                fail_startup: false,
            }
        }
    }

    #[async_trait]
    impl Platform for Named {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn startup(&self) -> Result<(), BridgeError> {
            if self.fail_startup {
                return Err(ValidationError::EmptyName.into());
            }
            self.started.lock().unwrap().push(self.name);
            Ok(())
        }

        async fn add_accessory(&self, def: AccessoryDefinition) -> Result<Arc<Accessory>, BridgeError> {
            let accessory = Accessory::builder()
                .definition(&def)
                .address(format!("tag-{}", self.tag))
                .build()?;
            Ok(Arc::new(accessory))
        }
    }

    fn definition(platform: &str) -> AccessoryDefinition {
        AccessoryDefinition {
            platform: platform.to_string(),
            name: "Porch".to_string(),
            ..AccessoryDefinition::default()
        }
    }

    #[tokio::test]
    async fn should_keep_first_platform_when_name_registered_twice() {
        let registry = PlatformRegistry::new();
        assert!(registry.register(Arc::new(Named::new("X", 1))));
        assert!(!registry.register(Arc::new(Named::new("X", 2))));

        let accessory = registry.add_accessory(definition("X")).await.unwrap();
        assert_eq!(accessory.address(), "tag-1");
        assert_eq!(registry.names(), ["X"]);
    }

    #[test]
    fn should_return_none_when_platform_unknown() {
        let registry = PlatformRegistry::new();
        assert!(registry.lookup("Kasa").is_none());
    }

    #[tokio::test]
    async fn should_start_platforms_in_registration_order() {
        let started = Arc::new(Mutex::new(Vec::new()));
        let registry = PlatformRegistry::new();
        for name in ["HomeControl", "Kasa", "Konnected"] {
            let mut platform = Named::new(name, 0);
            platform.started = Arc::clone(&started);
            registry.register(Arc::new(platform));
        }

        registry.startup_all().await.unwrap();

        assert_eq!(*started.lock().unwrap(), ["HomeControl", "Kasa", "Konnected"]);
    }

    #[tokio::test]
    async fn should_stop_startup_at_first_failure() {
        let registry = PlatformRegistry::new();
        let mut broken = Named::new("Broken", 0);
        broken.fail_startup = true;
        registry.register(Arc::new(broken));

        assert!(registry.startup_all().await.is_err());
    }

    #[tokio::test]
    async fn should_reject_definition_for_unknown_platform() {
        let registry = PlatformRegistry::new();
        let result = registry.add_accessory(definition("Shelly")).await;
        assert!(matches!(result, Err(BridgeError::NotFound(e)) if e.entity == "Platform"));
    }

    #[tokio::test]
    async fn should_reject_definition_without_platform() {
        let registry = PlatformRegistry::new();
        let result = registry.add_accessory(definition("")).await;
        assert!(matches!(
            result,
            Err(BridgeError::Validation(ValidationError::EmptyPlatform))
        ));
    }

    #[tokio::test]
    async fn should_run_shutdown_on_every_platform() {
        struct Counting(Arc<AtomicUsize>, &'static str);

        #[async_trait]
        impl Platform for Counting {
            fn name(&self) -> &'static str {
                self.1
            }

            async fn shutdown(&self) -> Result<(), BridgeError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(ValidationError::EmptyName.into())
            }
        }

        let count = Arc::new(AtomicUsize::new(0));
        let registry = PlatformRegistry::new();
        registry.register(Arc::new(Counting(Arc::clone(&count), "a")));
        registry.register(Arc::new(Counting(Arc::clone(&count), "b")));

        registry.shutdown_all().await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
