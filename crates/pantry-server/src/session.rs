//! The one live ordering session the service hosts.
//!
//! Owns the supplier pool cache, the planner, the seeded RNG and the current
//! order. Every plan bumps a generation number; a delivery timer or an
//! in-progress sourcing run only touches the order while its generation is
//! still current, so cancelling or re-planning can never be overwritten by
//! stale work.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pantry_core::{
    total_travel_minutes, AppConfig, Catalog, Coordinate, Ingredient, Landmark, OrderDetails,
    OrderError, OrderStatus, RecipeAnalysis, Shipment, Supplier,
};
use pantry_sourcing::{PoolSettings, SourcingPlanner, SupplierPool};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;

/// Grace period added on top of the slowest shipment's travel time.
const DELIVERY_GRACE_MS: u64 = 500;

/// How long a dispatched order stays `PACKAGING` before it leaves.
const DEFAULT_PACKAGING_MS: u64 = 1_000;

#[derive(Debug, Default)]
struct OrderState {
    details: OrderDetails,
    generation: u64,
    delivery_timer: Option<JoinHandle<()>>,
}

impl OrderState {
    /// Start a new generation, stopping any pending delivery timer.
    fn advance(&mut self) -> u64 {
        if let Some(timer) = self.delivery_timer.take() {
            timer.abort();
        }
        self.generation += 1;
        self.generation
    }
}

#[derive(Debug)]
pub struct Session {
    pool: SupplierPool,
    planner: SourcingPlanner,
    rng: Mutex<StdRng>,
    order: Mutex<OrderState>,
    delivery_ms_per_minute: u64,
    packaging_ms: u64,
}

// Guarded values are replaced wholesale, so a poisoned lock is still usable.
fn recover<'a, T>(
    result: Result<MutexGuard<'a, T>, PoisonError<MutexGuard<'a, T>>>,
) -> MutexGuard<'a, T> {
    result.unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    #[must_use]
    pub fn new(
        pool: SupplierPool,
        planner: SourcingPlanner,
        rng: StdRng,
        delivery_ms_per_minute: u64,
    ) -> Self {
        Self {
            pool,
            planner,
            rng: Mutex::new(rng),
            order: Mutex::new(OrderState::default()),
            delivery_ms_per_minute,
            packaging_ms: DEFAULT_PACKAGING_MS,
        }
    }

    #[must_use]
    pub fn with_packaging_ms(mut self, packaging_ms: u64) -> Self {
        self.packaging_ms = packaging_ms;
        self
    }

    /// Session wired from configuration. A configured seed makes supplier
    /// pools and timings reproducible across restarts.
    #[must_use]
    pub fn from_config(config: &AppConfig, catalog: Catalog) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let planner = SourcingPlanner::new(catalog.virtual_hub_name.clone());
        let pool = SupplierPool::new(catalog, PoolSettings::from_app_config(config));
        Self::new(pool, planner, rng, config.delivery_ms_per_minute)
    }

    #[must_use]
    pub fn pool(&self) -> &SupplierPool {
        &self.pool
    }

    fn order(&self) -> MutexGuard<'_, OrderState> {
        recover(self.order.lock())
    }

    #[must_use]
    pub fn current_order(&self) -> OrderDetails {
        self.order().details.clone()
    }

    /// Pool for `center`, reusing the cached one when close enough.
    pub fn suppliers_near(&self, center: Coordinate) -> Vec<Arc<Supplier>> {
        let mut rng = recover(self.rng.lock());
        self.pool.generate_suppliers(&mut *rng, center)
    }

    /// Open a fresh order for `meal` and mark it as being analysed.
    ///
    /// Returns the generation the caller must present to
    /// [`Session::finish_analysis`].
    ///
    /// # Errors
    ///
    /// Returns the in-flight status when sourcing or delivery is under way.
    pub fn begin_analysis(&self, meal: &str, headcount: u32) -> Result<u64, OrderStatus> {
        let mut state = self.order();
        if state.details.status.is_in_flight() {
            return Err(state.details.status);
        }
        let generation = state.advance();
        state.details = OrderDetails {
            meal: meal.to_string(),
            headcount,
            status: OrderStatus::Analyzing,
            ..OrderDetails::default()
        };
        tracing::debug!(generation, meal, "analysis started");
        Ok(generation)
    }

    /// Record the analysis result and return the order to `PENDING`.
    ///
    /// Returns `None` when `generation` is stale: a newer analysis, plan or
    /// cancel replaced the order while this one was running.
    pub fn finish_analysis(
        &self,
        generation: u64,
        recipe: Option<RecipeAnalysis>,
    ) -> Option<OrderDetails> {
        let mut state = self.order();
        if state.generation != generation || state.details.status != OrderStatus::Analyzing {
            tracing::info!(generation, "discarding analysis for superseded order");
            return None;
        }
        state.details.recipe = recipe;
        state.details.status = OrderStatus::Pending;
        Some(state.details.clone())
    }

    /// Mark the order as sourcing and return the generation the caller must
    /// present to [`Session::dispatch`].
    pub fn begin_sourcing(&self) -> u64 {
        let mut state = self.order();
        let generation = state.advance();
        state.details.shipments.clear();
        state.details.status = OrderStatus::Sourcing;
        tracing::info!(generation, "sourcing started");
        generation
    }

    /// Plan shipments for `required` around `location`.
    pub fn plan(
        &self,
        location: Coordinate,
        required: &[Ingredient],
        suppliers: &[Arc<Supplier>],
        landmark: Option<&Landmark>,
    ) -> Vec<Shipment> {
        let mut rng = recover(self.rng.lock());
        self.planner
            .create_sourcing_plan(&mut *rng, location, required, suppliers, landmark)
    }

    /// Attach `shipments` to the order, mark it `PACKAGING` and start the
    /// timer that moves it to `DELIVERING` and then `COMPLETED`.
    ///
    /// Returns `None` when `generation` is stale, i.e. the order was
    /// cancelled or re-planned while sourcing.
    pub fn dispatch(
        self: &Arc<Self>,
        generation: u64,
        shipments: Vec<Shipment>,
    ) -> Option<OrderDetails> {
        let mut state = self.order();
        if state.generation != generation || state.details.status != OrderStatus::Sourcing {
            tracing::info!(generation, "discarding plan for superseded order");
            return None;
        }

        let minutes = total_travel_minutes(&shipments);
        state.details.shipments = shipments;
        state.details.status = OrderStatus::Packaging;
        tracing::info!(
            generation,
            shipments = state.details.shipments.len(),
            "order packaging"
        );

        let packaging_ms = self.packaging_ms;
        let delay_ms = u64::from(minutes)
            .saturating_mul(self.delivery_ms_per_minute)
            .saturating_add(DELIVERY_GRACE_MS);
        let session = Arc::clone(self);
        state.delivery_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(packaging_ms)).await;
            if !session.start_delivery(generation, delay_ms) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            session.complete_delivery(generation);
        }));

        Some(state.details.clone())
    }

    fn start_delivery(&self, generation: u64, delay_ms: u64) -> bool {
        let mut state = self.order();
        if state.generation != generation || state.details.status != OrderStatus::Packaging {
            return false;
        }
        state.details.status = OrderStatus::Delivering;
        tracing::info!(generation, delay_ms, "order delivering");
        true
    }

    fn complete_delivery(&self, generation: u64) {
        let mut state = self.order();
        if state.generation == generation && state.details.status == OrderStatus::Delivering {
            state.details.status = OrderStatus::Completed;
            state.delivery_timer = None;
            tracing::info!(generation, "order delivered");
        }
    }

    /// Cancel the current order and stop its delivery timer.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotCancellable`] when the order already completed
    /// or was cancelled.
    pub fn cancel(&self) -> Result<OrderDetails, OrderError> {
        let mut state = self.order();
        state.details.cancel()?;
        let generation = state.advance();
        tracing::info!(generation, "order cancelled");
        Ok(state.details.clone())
    }

    #[cfg(test)]
    fn has_pending_timer(&self) -> bool {
        self.order()
            .delivery_timer
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAIPEI: Coordinate = Coordinate::new(25.03, 121.56);

    fn session(ms_per_minute: u64) -> Arc<Session> {
        Arc::new(
            Session::new(
                SupplierPool::new(Catalog::default(), PoolSettings::default()),
                SourcingPlanner::new("Test Hub"),
                StdRng::seed_from_u64(42),
                ms_per_minute,
            )
            .with_packaging_ms(0),
        )
    }

    fn recipe(name: &str) -> RecipeAnalysis {
        RecipeAnalysis {
            recipe_name: name.to_string(),
            recipe_url: String::new(),
            instructions: String::new(),
            ingredients: Vec::new(),
        }
    }

    fn plan_beef(session: &Arc<Session>) -> Option<OrderDetails> {
        let generation = session.begin_sourcing();
        let suppliers = session.suppliers_near(TAIPEI);
        let shipments = session.plan(
            TAIPEI,
            &[Ingredient::new("Beef", 1.0, "pack")],
            &suppliers,
            None,
        );
        session.dispatch(generation, shipments)
    }

    #[tokio::test]
    async fn dispatch_packages_then_delivers() {
        let session = session(60_000);
        let order = plan_beef(&session).expect("current generation");
        assert_eq!(order.status, OrderStatus::Packaging);
        assert_eq!(order.shipments.len(), 1);
        assert!(session.has_pending_timer());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.current_order().status, OrderStatus::Delivering);
        assert!(session.has_pending_timer());
    }

    #[tokio::test]
    async fn packaging_is_visible_until_the_order_leaves() {
        let session = Arc::new(
            Session::new(
                SupplierPool::new(Catalog::default(), PoolSettings::default()),
                SourcingPlanner::new("Test Hub"),
                StdRng::seed_from_u64(42),
                60_000,
            )
            .with_packaging_ms(60_000),
        );
        plan_beef(&session).expect("dispatched");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(session.current_order().status, OrderStatus::Packaging);

        let order = session.cancel().expect("packaging order cancels");
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(!session.has_pending_timer());
    }

    #[tokio::test]
    async fn delivery_timer_completes_order() {
        let session = session(0);
        plan_beef(&session).expect("dispatched");
        tokio::time::sleep(Duration::from_millis(DELIVERY_GRACE_MS + 300)).await;
        assert_eq!(session.current_order().status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn cancel_stops_timer_before_it_fires() {
        let session = session(0);
        plan_beef(&session).expect("dispatched");
        let order = session.cancel().expect("delivering order cancels");
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(!session.has_pending_timer());

        tokio::time::sleep(Duration::from_millis(DELIVERY_GRACE_MS + 300)).await;
        assert_eq!(session.current_order().status, OrderStatus::Cancelled);
        assert_eq!(
            session.cancel().unwrap_err(),
            OrderError::NotCancellable(OrderStatus::Cancelled)
        );
    }

    #[tokio::test]
    async fn cancelling_during_sourcing_discards_the_plan() {
        let session = session(60_000);
        let generation = session.begin_sourcing();
        session.cancel().expect("sourcing order cancels");
        assert!(session.dispatch(generation, Vec::new()).is_none());
        assert_eq!(session.current_order().status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn replanning_supersedes_previous_timer() {
        let session = session(0);
        let stale = session.begin_sourcing();
        let current = session.begin_sourcing();
        assert!(session.dispatch(stale, Vec::new()).is_none());
        assert!(session.dispatch(current, Vec::new()).is_some());
    }

    #[tokio::test]
    async fn analysis_is_refused_while_delivering() {
        let session = session(60_000);
        plan_beef(&session).expect("dispatched");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            session.begin_analysis("curry", 2),
            Err(OrderStatus::Delivering)
        );
    }

    #[test]
    fn analysis_round_trip_resets_order() {
        let session = session(60_000);
        let generation = session.begin_analysis("hot pot", 4).expect("idle session");
        assert_eq!(session.current_order().status, OrderStatus::Analyzing);

        let order = session
            .finish_analysis(generation, None)
            .expect("current generation");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.meal, "hot pot");
        assert_eq!(order.headcount, 4);
        assert!(order.recipe.is_none());
    }

    #[test]
    fn overlapping_analyses_keep_the_latest_meal_and_recipe() {
        let session = session(60_000);
        let tofu = session.begin_analysis("mapo tofu", 2).expect("idle session");
        let stew = session.begin_analysis("beef stew", 4).expect("still idle");

        // The older request finishes first and must not touch the new order.
        assert!(session
            .finish_analysis(tofu, Some(recipe("Mapo Tofu")))
            .is_none());
        assert_eq!(session.current_order().status, OrderStatus::Analyzing);

        let order = session
            .finish_analysis(stew, Some(recipe("Beef Stew")))
            .expect("latest generation");
        assert_eq!(order.meal, "beef stew");
        assert_eq!(order.headcount, 4);
        assert_eq!(
            order.recipe.map(|r| r.recipe_name).as_deref(),
            Some("Beef Stew")
        );
    }

    #[test]
    fn analysis_finishing_after_cancel_is_discarded() {
        let session = session(60_000);
        let generation = session.begin_analysis("curry", 2).expect("idle session");
        session.cancel().expect("analysing order cancels");
        assert!(session
            .finish_analysis(generation, Some(recipe("Curry")))
            .is_none());
        assert_eq!(session.current_order().status, OrderStatus::Cancelled);
    }
}
