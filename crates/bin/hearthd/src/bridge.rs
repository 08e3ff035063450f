//! Bridge assembly and accessory loading.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use hearth_adapter_http_axum::HttpPlatform;
use hearth_adapter_http_axum::router;
use hearth_adapter_http_axum::state::{AppState, BridgeInfo};
use hearth_adapter_kasa::KasaPlatform;
use hearth_adapter_konnected::{KonnectedError, KonnectedPlatform, webhook};
use hearth_adapter_virtual::VirtualPlatform;
use hearth_app::dispatcher::ActionDispatcher;
use hearth_app::hub::InProcessHub;
use hearth_app::ports::Platform;
use hearth_app::registry::PlatformRegistry;
use hearth_domain::accessory::AccessoryDefinition;

use crate::config::Config;

/// Hub change events buffered per subscriber.
const HUB_CAPACITY: usize = 256;

/// Path the alarm boards report to.
const KONNECTED_MOUNT: &str = "/konnected";

/// Every platform, wired and registered, not yet started.
pub struct Bridge {
    pub registry: Arc<PlatformRegistry>,
    pub hub: Arc<InProcessHub>,
    /// The router the HTTP platform serves.
    pub router: Router,
    http: Arc<HttpPlatform>,
}

impl Bridge {
    /// Build and register the platforms: the hub first, then HTTP, Kasa,
    /// Konnected and Virtual.
    ///
    /// # Errors
    ///
    /// Returns [`KonnectedError::Http`] when the board HTTP client cannot be
    /// built.
    pub fn assemble(config: &Config) -> Result<Self, KonnectedError> {
        let registry = Arc::new(PlatformRegistry::new());
        let hub = Arc::new(InProcessHub::new(HUB_CAPACITY));
        let dispatcher = ActionDispatcher::new(&registry);

        let kasa = Arc::new(KasaPlatform::new(config.kasa.clone(), hub.clone(), dispatcher.clone()));
        let konnected = Arc::new(KonnectedPlatform::new(
            config.konnected.clone(),
            hub.clone(),
            dispatcher.clone(),
        )?);
        let switches = Arc::new(VirtualPlatform::new(hub.clone(), dispatcher));

        let state = AppState::new(
            hub.clone(),
            BridgeInfo {
                name: config.bridge.name.clone(),
                id: config.bridge.id.clone(),
            },
        );
        let mounts = vec![(KONNECTED_MOUNT.to_string(), webhook::routes(konnected.clone()))];
        let router = router::build(state, mounts);
        let http = Arc::new(HttpPlatform::new(config.bind_addr(), router.clone()));

        let platforms: [Arc<dyn Platform>; 5] = [hub.clone(), http.clone(), kasa, konnected, switches];
        for platform in platforms {
            registry.register(platform);
        }

        Ok(Self {
            registry,
            hub,
            router,
            http,
        })
    }

    /// Hand every definition to its platform. Failures are logged and the
    /// accessory dropped; returns how many were loaded.
    pub async fn load_accessories(&self, definitions: &[AccessoryDefinition]) -> usize {
        let mut loaded = 0;
        for def in definitions {
            match self.registry.add_accessory(def.clone()).await {
                Ok(accessory) => {
                    loaded += 1;
                    tracing::info!(platform = %def.platform, accessory = accessory.name(), "accessory loaded");
                }
                Err(err) => {
                    tracing::warn!(platform = %def.platform, accessory = %def.name, error = %err, "accessory dropped");
                }
            }
        }
        loaded
    }

    /// Address the HTTP platform bound, once started.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.local_addr()
    }
}
