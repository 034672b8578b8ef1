//! # Application State
//!
//! Shared state for the Axum application: the shop catalog, the Stripe
//! gateway, and the notification dispatcher.

use atelier_core::ShopCatalog;
use atelier_notify::{Dispatcher, OperatorRecipient, OrderLogRecipient};
use atelier_stripe::{CheckoutGateway, RedirectUrls};
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL for checkout redirect callbacks
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Operator notification endpoint, when configured
    pub operator_webhook_url: Option<String>,
    /// Order record-keeping endpoint, when configured
    pub order_log_url: Option<String>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            operator_webhook_url: std::env::var("OPERATOR_WEBHOOK_URL").ok(),
            order_log_url: std::env::var("ORDER_LOG_URL").ok(),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Stripe checkout gateway
    pub gateway: Arc<CheckoutGateway>,
    /// Order notification dispatcher
    pub dispatcher: Arc<Dispatcher>,
    /// Shop catalog
    pub catalog: ShopCatalog,
    /// Checkout redirect URLs
    pub urls: RedirectUrls,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create the production state from environment and config files
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let urls = RedirectUrls::new(&config.base_url);
        let catalog = load_shop_catalog()?;

        let gateway = CheckoutGateway::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        let dispatcher = build_dispatcher(&config)?;

        Ok(Self {
            gateway: Arc::new(gateway),
            dispatcher: Arc::new(dispatcher),
            catalog,
            urls,
            config,
        })
    }

    /// Assemble a state from pre-built parts (used by tests)
    pub fn with_parts(
        config: AppConfig,
        catalog: ShopCatalog,
        gateway: CheckoutGateway,
        dispatcher: Dispatcher,
    ) -> Self {
        let urls = RedirectUrls::new(&config.base_url);
        Self {
            gateway: Arc::new(gateway),
            dispatcher: Arc::new(dispatcher),
            catalog,
            urls,
            config,
        }
    }
}

/// Register notification recipients for every configured endpoint
fn build_dispatcher(config: &AppConfig) -> anyhow::Result<Dispatcher> {
    let mut dispatcher = Dispatcher::new();

    if let Some(url) = &config.operator_webhook_url {
        let recipient = OperatorRecipient::new(url.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build operator recipient: {}", e))?;
        dispatcher.register(Arc::new(recipient));
    }
    if let Some(url) = &config.order_log_url {
        let recipient = OrderLogRecipient::new(url.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build order-log recipient: {}", e))?;
        dispatcher.register(Arc::new(recipient));
    }

    if dispatcher.is_empty() {
        tracing::warn!("No notification recipients configured, completed orders will only be logged");
    }

    Ok(dispatcher)
}

/// Load the shop catalog from config file
fn load_shop_catalog() -> anyhow::Result<ShopCatalog> {
    let config_paths = [
        "config/shop.toml",
        "../config/shop.toml",
        "../../config/shop.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = ShopCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!(
                "Loaded {} prints, {} plans, {} delivery zones from {}",
                catalog.prints.len(),
                catalog.subscriptions.len(),
                catalog.delivery_zones.len(),
                path
            );
            return Ok(catalog);
        }
    }

    tracing::warn!("No shop catalog found, using empty catalog");
    Ok(ShopCatalog::default())
}
