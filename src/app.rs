//! App Context

use anyhow::Context as _;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, StoreBackend};
use crate::domain::cart::{Cart, CartService};
use crate::domain::catalog::{CatalogStore, InMemoryCatalog, RateProvider, SettingsRateProvider};
use crate::domain::order::{Order, OrderService};
use crate::domain::reservation::{Reservation, ReservationService};
use crate::event_sourcing::{connect_session, AggregateStore, InMemoryStore, Repository, ScyllaStore};
use crate::metrics::Metrics;
use crate::notifications::{DispatcherConfig, LogMailer, NotificationDispatcher, Notifier};
use crate::scheduler::{EscalationConfig, EscalationScheduler};

/// One store per aggregate type.
pub struct Stores {
    pub carts: Arc<dyn AggregateStore<Cart>>,
    pub orders: Arc<dyn AggregateStore<Order>>,
    pub reservations: Arc<dyn AggregateStore<Reservation>>,
}

impl Stores {
    pub fn memory() -> Self {
        Self {
            carts: Arc::new(InMemoryStore::<Cart>::new()),
            orders: Arc::new(InMemoryStore::<Order>::new()),
            reservations: Arc::new(InMemoryStore::<Reservation>::new()),
        }
    }

    pub async fn scylla(nodes: &[String], keyspace: &str) -> anyhow::Result<Self> {
        let session = connect_session(nodes, keyspace).await?;
        Ok(Self {
            carts: Arc::new(ScyllaStore::<Cart>::new(session.clone())),
            orders: Arc::new(ScyllaStore::<Order>::new(session.clone())),
            reservations: Arc::new(ScyllaStore::<Reservation>::new(session)),
        })
    }
}

/// Collaborators the services are built from.
pub struct Dependencies {
    pub stores: Stores,
    pub catalog: Arc<dyn CatalogStore>,
    pub rates: Arc<dyn RateProvider>,
    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn Notifier>,
    pub metrics: Arc<Metrics>,
    pub escalation: EscalationConfig,
}

#[derive(Clone)]
pub struct AppContext {
    pub carts: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub reservations: Arc<ReservationService>,
    pub scheduler: Arc<EscalationScheduler>,
    pub metrics: Arc<Metrics>,
}

impl AppContext {
    /// Wire services over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error when the stores cannot be read to seed numbering.
    pub async fn new(deps: Dependencies) -> anyhow::Result<Self> {
        let cart_repo = Arc::new(Repository::new(deps.stores.carts));
        let order_repo = Arc::new(Repository::new(deps.stores.orders));
        let reservation_repo = Arc::new(Repository::new(deps.stores.reservations));

        let carts = Arc::new(CartService::new(
            cart_repo.clone(),
            deps.catalog.clone(),
            deps.rates,
            deps.clock.clone(),
        ));
        let orders = Arc::new(
            OrderService::new(
                order_repo,
                cart_repo,
                deps.catalog.clone(),
                deps.clock.clone(),
                deps.notifier.clone(),
                deps.metrics.clone(),
            )
            .await
            .context("failed to initialise order service")?,
        );
        let reservations = Arc::new(
            ReservationService::new(
                reservation_repo,
                deps.catalog,
                deps.clock,
                deps.notifier,
                deps.metrics.clone(),
            )
            .await
            .context("failed to initialise reservation service")?,
        );
        let scheduler = Arc::new(EscalationScheduler::new(
            orders.clone(),
            deps.escalation,
            deps.metrics.clone(),
        ));

        Ok(Self {
            carts,
            orders,
            reservations,
            scheduler,
            metrics: deps.metrics,
        })
    }
}

/// Everything `main` owns for the lifetime of the process.
pub struct App {
    pub context: AppContext,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub dispatcher_task: JoinHandle<()>,
}

impl App {
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new()?);
        tracing::info!(families = metrics.registry().gather().len(), "📊 Metrics registry created");

        let stores = match config.store_backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory stores; state is lost on restart");
                Stores::memory()
            }
            StoreBackend::Scylla => {
                tracing::info!(nodes = ?config.scylla_nodes, keyspace = %config.scylla_keyspace, "Connecting to ScyllaDB");
                Stores::scylla(&config.scylla_nodes, &config.scylla_keyspace).await?
            }
        };

        let catalog = match &config.catalog_path {
            Some(path) => InMemoryCatalog::load(path)
                .await
                .with_context(|| format!("failed to load catalog from {path}"))?,
            None => {
                tracing::warn!("No CATALOG_PATH set, starting with an empty catalog");
                InMemoryCatalog::new()
            }
        };

        let (dispatcher, dispatcher_task) = NotificationDispatcher::start(
            Arc::new(LogMailer),
            DispatcherConfig {
                queue_capacity: config.notification_queue_capacity,
                ..DispatcherConfig::default()
            },
            metrics.clone(),
        );

        let context = AppContext::new(Dependencies {
            stores,
            catalog: Arc::new(catalog),
            rates: Arc::new(SettingsRateProvider::new(config.commission_rate)),
            clock: Arc::new(SystemClock),
            notifier: dispatcher.clone(),
            metrics,
            escalation: EscalationConfig {
                interval: config.escalation_interval(),
                threshold: config.escalation_threshold(),
            },
        })
        .await?;

        Ok(Self {
            context,
            dispatcher,
            dispatcher_task,
        })
    }
}
