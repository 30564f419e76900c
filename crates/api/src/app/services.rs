//! Service wiring: catalog, the demo shopping session, event bus, scan history.
//!
//! The server hosts a single shopping session (one cart, one reward account).
//! Every reward event is applied to the account under the session lock, then
//! published on the bus after the lock is released; the scan recorder worker
//! persists it in the background.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use ecosmart_cart::{Cart, CartItem, EcoMetrics, GoalStatus, format_co2_comparison};
use ecosmart_catalog::{CatalogProvider, Product, ProductId, demo_catalog};
use ecosmart_core::{Aggregate, AggregateRoot, DomainError, DomainResult, UserId};
use ecosmart_events::{EventBus, EventEnvelope, InMemoryEventBus};
use ecosmart_infra::catalog_loader::load_catalog;
use ecosmart_infra::workers::{ScanRecorder, WorkerHandle};
use ecosmart_infra::{
    AppConfig, InMemoryScanHistory, PostgresScanHistory, ScanHistoryStore, ScanRecord, ScanTotals, StoreError,
};
use ecosmart_rewards::{
    AwardBadge, Badge, REWARD_OPTIONS, Rarity, RecordOptimization, RecordScan, RecordSwap, RedeemReward, RewardAccount,
    RewardCommand, RewardEvent, RewardOption, demo_account, find_reward,
};
use ecosmart_swap::{
    AlertPolicy, CartOptimization, EcoAlert, ImpactLevel, SwapRecommendation, optimize_cart_in, recommend_for,
};

pub type RewardBus = InMemoryEventBus<EventEnvelope<RewardEvent>>;

/// The one shopping session the server hosts.
#[derive(Debug)]
pub struct Session {
    pub cart: Cart,
    pub account: RewardAccount,
}

pub struct AppServices {
    catalog: Arc<dyn CatalogProvider>,
    policy: AlertPolicy,
    co2e_goal_kg: f64,
    history_limit: usize,
    session: Mutex<Session>,
    bus: Arc<RewardBus>,
    history: Arc<dyn ScanHistoryStore>,
    recorder: Mutex<Option<WorkerHandle>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub metrics: EcoMetrics,
    pub goal_status: GoalStatus,
    pub comparison: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub item: CartItem,
    pub quantity: u32,
    pub points_earned: u64,
    pub impact_level: ImpactLevel,
    pub alert: Option<EcoAlert>,
    pub swap: Option<SwapRecommendation>,
    pub cart: CartView,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwapOutcome {
    pub recommendation: SwapRecommendation,
    pub item: CartItem,
    pub points_earned: u64,
    pub cart: CartView,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeOutcome {
    pub optimization: CartOptimization,
    pub points_earned: u64,
    pub cash_earned_cents: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RewardsView {
    pub user_id: UserId,
    pub name: String,
    pub points: u64,
    pub cash_cents: u64,
    pub weekly_rank: u32,
    pub level: u64,
    pub points_to_next_level: u64,
    pub level_progress_percent: f64,
    pub total_co2_saved_kg: f64,
    pub session_co2_saved_kg: f64,
    pub daily_goal_progress_percent: f64,
    pub badges: Vec<Badge>,
    pub reward_options: Vec<RewardOption>,
}

/// Catalog details shown next to a history record.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub name: String,
    pub brand: String,
    pub image_url: String,
    pub co2e: f64,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name().to_string(),
            brand: product.brand().to_string(),
            image_url: product.image_url().to_string(),
            co2e: product.co2e(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: ScanRecord,
    /// `None` for optimizations and for products no longer in the catalog.
    pub product: Option<ProductSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub records: Vec<HistoryEntry>,
    pub totals: ScanTotals,
}

/// Wire services from configuration.
///
/// With `DATABASE_URL` set the catalog is loaded from Postgres and scan history
/// is written there; otherwise the demo catalog and in-memory history are used.
/// Must be called from inside a tokio runtime.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let (catalog, history): (Arc<dyn CatalogProvider>, Arc<dyn ScanHistoryStore>) = match &config.database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url).await?;
            let catalog = load_catalog(&pool).await?;
            let history = PostgresScanHistory::new(pool);
            history.ensure_schema().await?;
            info!(products = catalog.len(), "using postgres catalog and scan history");
            (Arc::new(catalog), Arc::new(history))
        }
        None => {
            let catalog = demo_catalog()?;
            info!(products = catalog.len(), "using demo catalog and in-memory scan history");
            (Arc::new(catalog), Arc::new(InMemoryScanHistory::new()))
        }
    };

    let services = AppServices::new(catalog, history, config);
    services.start_recorder(tokio::runtime::Handle::current())?;
    Ok(services)
}

impl AppServices {
    pub fn new(catalog: Arc<dyn CatalogProvider>, history: Arc<dyn ScanHistoryStore>, config: &AppConfig) -> Self {
        Self {
            catalog,
            policy: config.alert_policy,
            co2e_goal_kg: config.co2e_goal_kg,
            history_limit: config.history_limit,
            session: Mutex::new(Session {
                cart: Cart::new(),
                account: demo_account(UserId::new()),
            }),
            bus: Arc::new(RewardBus::new()),
            history,
            recorder: Mutex::new(None),
        }
    }

    /// Spawn the scan recorder for this session's user.
    pub fn start_recorder(&self, runtime: tokio::runtime::Handle) -> std::io::Result<()> {
        let user_id = self.session().account.id_typed();
        let handle = ScanRecorder::spawn(&*self.bus, self.history.clone(), runtime, Some(user_id))?;
        if let Some(previous) = self.recorder.lock().unwrap_or_else(PoisonError::into_inner).replace(handle) {
            previous.shutdown();
        }
        Ok(())
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn catalog(&self) -> &dyn CatalogProvider {
        &*self.catalog
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    fn cart_view(&self, cart: &Cart) -> CartView {
        let metrics = cart.metrics(self.co2e_goal_kg);
        CartView {
            items: cart.items().to_vec(),
            goal_status: metrics.goal_status(),
            comparison: format_co2_comparison(metrics.total_co2e),
            metrics,
        }
    }

    /// Apply a reward command to the session account; returns the publishable envelopes.
    fn reward(account: &mut RewardAccount, command: RewardCommand) -> DomainResult<Vec<EventEnvelope<RewardEvent>>> {
        let first_sequence = account.version() + 1;
        let events = account.execute(&command)?;
        let user_id = account.id_typed();
        Ok(events
            .into_iter()
            .enumerate()
            .map(|(i, event)| EventEnvelope::wrap(user_id, first_sequence + i as u64, event))
            .collect())
    }

    fn publish(&self, envelopes: Vec<EventEnvelope<RewardEvent>>) {
        for envelope in envelopes {
            let event_type = envelope.event_type();
            if let Err(err) = self.bus.publish(envelope) {
                warn!(event_type, error = %err, "failed to publish reward event");
            }
        }
    }

    pub fn cart(&self) -> CartView {
        self.cart_view(&self.session().cart)
    }

    pub fn scan(&self, barcode: &str) -> DomainResult<ScanOutcome> {
        let product = self
            .catalog
            .get_by_barcode(barcode)
            .ok_or_else(|| DomainError::not_found(format!("product with barcode {}", barcode.trim())))?;

        let now = Utc::now();
        let (outcome, envelopes) = {
            let mut session = self.session();
            let user_id = session.account.id_typed();
            let envelopes = Self::reward(
                &mut session.account,
                RewardCommand::RecordScan(RecordScan {
                    user_id,
                    product_id: product.id_typed().clone(),
                    is_eco_friendly: product.is_eco_friendly(),
                    occurred_at: now,
                }),
            )?;
            let quantity = session.cart.add_scanned(product.clone(), now);
            let points_earned = envelopes.iter().map(|e| e.payload().points_earned()).sum();
            let item = session
                .cart
                .get(product.id_typed())
                .cloned()
                .ok_or_else(|| DomainError::invariant("scanned line missing from cart"))?;

            let outcome = ScanOutcome {
                item,
                quantity,
                points_earned,
                impact_level: self.policy.impact_level(&product),
                alert: self.policy.alert_for(&product),
                swap: self.swap_prompt(&product),
                cart: self.cart_view(&session.cart),
            };
            (outcome, envelopes)
        };

        info!(
            barcode = product.barcode(),
            product_id = %product.id_typed(),
            quantity = outcome.quantity,
            points = outcome.points_earned,
            alert = outcome.alert.is_some(),
            "product scanned"
        );
        self.publish(envelopes);
        Ok(outcome)
    }

    fn swap_prompt(&self, product: &Product) -> Option<SwapRecommendation> {
        if self.policy.should_offer_swap(product) {
            recommend_for(product)
        } else {
            None
        }
    }

    pub fn remove_item(&self, product_id: &ProductId) -> DomainResult<CartView> {
        let mut session = self.session();
        session
            .cart
            .remove(product_id)
            .ok_or_else(|| DomainError::not_found(format!("cart line {product_id}")))?;
        Ok(self.cart_view(&session.cart))
    }

    pub fn clear_cart(&self) -> CartView {
        let mut session = self.session();
        session.cart.clear();
        self.cart_view(&session.cart)
    }

    /// The catalog's copy of `product`, which carries its own alternatives.
    fn resolve(&self, product: &Product) -> Product {
        self.catalog.get(product.id_typed()).unwrap_or_else(|| product.clone())
    }

    /// Replace a cart line with its recommended alternative and award the swap bonus.
    pub fn swap(&self, product_id: &ProductId) -> DomainResult<SwapOutcome> {
        let (outcome, envelopes) = {
            let mut session = self.session();
            let line = session
                .cart
                .get(product_id)
                .ok_or_else(|| DomainError::not_found(format!("cart line {product_id}")))?;
            let recommendation = recommend_for(&self.resolve(line.product()))
                .ok_or_else(|| DomainError::invariant(format!("product {product_id} has no alternatives")))?;

            let user_id = session.account.id_typed();
            let envelopes = Self::reward(
                &mut session.account,
                RewardCommand::RecordSwap(RecordSwap {
                    user_id,
                    original_product_id: product_id.clone(),
                    chosen_product_id: recommendation.chosen.id_typed().clone(),
                    co2_saved_kg: recommendation.savings.co2_saved,
                    occurred_at: Utc::now(),
                }),
            )?;
            let item = session.cart.replace(product_id, self.resolve(&recommendation.chosen))?.clone();
            let points_earned = envelopes.iter().map(|e| e.payload().points_earned()).sum();

            let outcome = SwapOutcome {
                recommendation,
                item,
                points_earned,
                cart: self.cart_view(&session.cart),
            };
            (outcome, envelopes)
        };

        info!(
            original = %product_id,
            chosen = %outcome.recommendation.chosen.id_typed(),
            co2_saved = outcome.recommendation.savings.co2_saved,
            "swap accepted"
        );
        self.publish(envelopes);
        Ok(outcome)
    }

    pub fn optimization_preview(&self) -> DomainResult<CartOptimization> {
        optimize_cart_in(&self.session().cart, &*self.catalog, &self.policy, self.co2e_goal_kg)
    }

    /// Apply every qualifying swap at once and award the optimization bonus.
    pub fn optimize(&self) -> DomainResult<OptimizeOutcome> {
        let (outcome, envelopes) = {
            let mut session = self.session();
            let optimization = optimize_cart_in(&session.cart, &*self.catalog, &self.policy, self.co2e_goal_kg)?;
            if optimization.is_noop() {
                return Err(DomainError::validation("cart has nothing to optimize"));
            }

            let user_id = session.account.id_typed();
            let cash_before = session.account.cash_cents();
            let envelopes = Self::reward(
                &mut session.account,
                RewardCommand::RecordOptimization(RecordOptimization {
                    user_id,
                    swaps: u32::try_from(optimization.swaps.len()).unwrap_or(u32::MAX),
                    co2_reduction_kg: optimization.co2_reduction,
                    occurred_at: Utc::now(),
                }),
            )?;
            session.cart = optimization.optimized.clone();

            let outcome = OptimizeOutcome {
                points_earned: envelopes.iter().map(|e| e.payload().points_earned()).sum(),
                cash_earned_cents: session.account.cash_cents() - cash_before,
                optimization,
            };
            (outcome, envelopes)
        };

        info!(
            swaps = outcome.optimization.swaps.len(),
            co2_reduction = outcome.optimization.co2_reduction,
            "cart optimized"
        );
        self.publish(envelopes);
        Ok(outcome)
    }

    fn rewards_view(account: &RewardAccount) -> RewardsView {
        RewardsView {
            user_id: account.id_typed(),
            name: account.name().to_string(),
            points: account.points(),
            cash_cents: account.cash_cents(),
            weekly_rank: account.weekly_rank(),
            level: account.level(),
            points_to_next_level: account.points_to_next_level(),
            level_progress_percent: account.level_progress_percent(),
            total_co2_saved_kg: account.total_co2_saved_kg(),
            session_co2_saved_kg: account.session_co2_saved_kg(),
            daily_goal_progress_percent: account.daily_goal_progress_percent(),
            badges: account.badges().to_vec(),
            reward_options: REWARD_OPTIONS.to_vec(),
        }
    }

    pub fn rewards(&self) -> RewardsView {
        Self::rewards_view(&self.session().account)
    }

    pub fn redeem(&self, reward_id: &str) -> DomainResult<RewardsView> {
        let reward = find_reward(reward_id).ok_or_else(|| DomainError::not_found(format!("reward {reward_id}")))?;

        let (view, envelopes) = {
            let mut session = self.session();
            let user_id = session.account.id_typed();
            let envelopes = Self::reward(
                &mut session.account,
                RewardCommand::RedeemReward(RedeemReward {
                    user_id,
                    reward,
                    occurred_at: Utc::now(),
                }),
            )?;
            (Self::rewards_view(&session.account), envelopes)
        };

        info!(reward_id, points_spent = reward.cost_points, "reward redeemed");
        self.publish(envelopes);
        Ok(view)
    }

    /// Award a badge to the session account. Re-awarding a held badge changes nothing.
    pub fn award_badge(
        &self,
        name: &str,
        description: &str,
        icon: &str,
        rarity: Rarity,
    ) -> DomainResult<RewardsView> {
        let (view, envelopes) = {
            let mut session = self.session();
            let user_id = session.account.id_typed();
            let envelopes = Self::reward(
                &mut session.account,
                RewardCommand::AwardBadge(AwardBadge {
                    user_id,
                    badge: Badge::new(name.trim(), description, icon, rarity, Utc::now()),
                }),
            )?;
            (Self::rewards_view(&session.account), envelopes)
        };

        info!(badge = name.trim(), awarded = !envelopes.is_empty(), "badge awarded");
        self.publish(envelopes);
        Ok(view)
    }

    pub async fn history(&self) -> Result<HistoryView, StoreError> {
        let user_id = self.session().account.id_typed();
        let records = self.history.recent_for_user(user_id, self.history_limit).await?;
        let totals = ScanTotals::from_records(&records);
        let records = records
            .into_iter()
            .map(|record| HistoryEntry {
                product: record
                    .product_id
                    .as_ref()
                    .and_then(|id| self.catalog.get(id))
                    .map(|p| ProductSummary::from(&p)),
                record,
            })
            .collect();
        Ok(HistoryView { records, totals })
    }
}

impl Drop for AppServices {
    fn drop(&mut self) {
        if let Some(handle) = self.recorder.get_mut().unwrap_or_else(PoisonError::into_inner).take() {
            handle.shutdown();
        }
    }
}
