use std::sync::Arc;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::market_data::{PriceAggregator, PriceSnapshot, RefreshRequest};
use crate::models::Holding;
use crate::portfolio::PortfolioView;

use super::{plan_refresh, RefreshPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A run completed and its snapshot replaced the previous one.
    Refreshed,
    /// Cached prices already cover the holdings; nothing was fetched.
    UpToDate,
    /// A run completed but the aggregator failed as a whole.
    Failed,
}

/// Owns the price snapshot and decides when to replace it.
///
/// At most one aggregator run is in flight: runs happen inside `&mut self`
/// methods and are awaited to completion before anything is re-evaluated.
/// Failed runs are not retried until the needed ids change or a reprice is
/// requested.
pub struct RefreshController {
    aggregator: PriceAggregator,
    state: RefreshState,
    last_completed: Option<RefreshRequest>,
    snapshot: Option<PriceSnapshot>,
    error: bool,
    runs: usize,
}

impl RefreshController {
    pub fn new(aggregator: PriceAggregator) -> Self {
        Self {
            aggregator,
            state: RefreshState::Idle,
            last_completed: None,
            snapshot: None,
            error: false,
            runs: 0,
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    /// Number of aggregator runs started so far.
    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn snapshot(&self) -> Option<&PriceSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn plan(&self, holdings: &[Holding]) -> Option<RefreshPlan> {
        let has_cached_prices = self
            .snapshot
            .as_ref()
            .is_some_and(|s| !s.prices.is_empty());
        plan_refresh(holdings, self.last_completed.as_ref(), has_cached_prices)
    }

    /// Forget the last completed run so the next evaluation fetches again.
    pub fn invalidate(&mut self) {
        self.last_completed = None;
    }

    /// Evaluate `holdings` and run the aggregator if they need it.
    pub async fn sync(&mut self, holdings: &[Holding]) -> RefreshOutcome {
        match self.plan(holdings) {
            Some(plan) => self.run(plan).await,
            None => {
                debug!(holdings = holdings.len(), "prices up to date");
                RefreshOutcome::UpToDate
            }
        }
    }

    pub fn view(&self, holdings: &[Holding]) -> PortfolioView {
        PortfolioView::build(
            holdings,
            self.snapshot.as_ref(),
            self.error,
            self.state == RefreshState::Refreshing,
        )
    }

    async fn run(&mut self, plan: RefreshPlan) -> RefreshOutcome {
        let request = self.begin(plan);
        self.finish(request).await
    }

    fn begin(&mut self, plan: RefreshPlan) -> RefreshRequest {
        self.state = RefreshState::Refreshing;
        self.runs += 1;
        info!(
            reason = %plan.reason,
            ids = plan.request.id_count(),
            featured = ?plan.request.featured,
            "refreshing prices"
        );
        plan.request
    }

    async fn finish(&mut self, request: RefreshRequest) -> RefreshOutcome {
        let result = self.aggregator.fetch(&request).await;
        self.state = RefreshState::Idle;

        let outcome = match result {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.error = false;
                RefreshOutcome::Refreshed
            }
            Err(err) => {
                warn!(error = %err, "price refresh failed; showing error state");
                self.snapshot = Some(PriceSnapshot {
                    featured_id: request.featured.clone(),
                    ..PriceSnapshot::empty()
                });
                self.error = true;
                RefreshOutcome::Failed
            }
        };
        self.last_completed = Some(request);
        outcome
    }

    /// Run the controller as a background task driven by `holdings_rx`.
    ///
    /// Every holdings change and every completed run re-evaluates the plan
    /// against the latest holdings; changes that arrive mid-run are coalesced
    /// into that evaluation. A view is published whenever a run starts and
    /// after every evaluation. The task ends when the holdings sender is
    /// dropped.
    pub fn spawn(self, mut holdings_rx: watch::Receiver<Vec<Holding>>) -> RefreshHandle {
        let initial = holdings_rx.borrow_and_update().clone();
        let (views_tx, views_rx) = watch::channel(self.view(&initial));
        let reprice = Arc::new(Notify::new());
        let task = tokio::spawn(run_loop(self, holdings_rx, views_tx, reprice.clone()));
        RefreshHandle {
            task,
            views: views_rx,
            reprice,
        }
    }
}

async fn run_loop(
    mut controller: RefreshController,
    mut holdings_rx: watch::Receiver<Vec<Holding>>,
    views_tx: watch::Sender<PortfolioView>,
    reprice: Arc<Notify>,
) {
    loop {
        let holdings = holdings_rx.borrow_and_update().clone();
        if let Some(plan) = controller.plan(&holdings) {
            let request = controller.begin(plan);
            views_tx.send_replace(controller.view(&holdings));
            controller.finish(request).await;
            continue;
        }

        views_tx.send_replace(controller.view(&holdings));

        tokio::select! {
            changed = holdings_rx.changed() => {
                if changed.is_err() {
                    debug!("holdings channel closed; stopping refresh loop");
                    break;
                }
            }
            _ = reprice.notified() => {
                debug!("reprice requested");
                controller.invalidate();
            }
        }
    }
}

/// Handle to a controller running in the background.
pub struct RefreshHandle {
    task: JoinHandle<()>,
    views: watch::Receiver<PortfolioView>,
    reprice: Arc<Notify>,
}

impl RefreshHandle {
    /// Latest published views.
    pub fn views(&self) -> watch::Receiver<PortfolioView> {
        self.views.clone()
    }

    /// Fetch prices again at the next evaluation even if ids are unchanged.
    /// Never interrupts a run in flight.
    pub fn request_reprice(&self) {
        self.reprice.notify_one();
    }

    /// Wait for the loop to end (after the holdings sender is dropped).
    pub async fn join(self) {
        if let Err(err) = self.task.await {
            warn!(error = %err, "refresh loop ended abnormally");
        }
    }
}
