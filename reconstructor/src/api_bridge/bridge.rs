use crate::api_bridge::model::ReconModel;
use crate::workflow::runner::{ReconOutcome, Runner};
use anyhow::Result;
use fbpcore::api_interface::{ReconFailure, ReconRequest};
use fbpcore::telemetry::MetricsRecorder;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

fn bridge_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

fn model_from_outcome(outcome: &ReconOutcome) -> ReconModel {
    ReconModel {
        filter: outcome.resolved_filter.to_string(),
        size: outcome.output_size,
        num_angles: outcome.num_angles,
        num_detectors: outcome.num_detectors,
        degenerate_contrast: outcome.degenerate_contrast,
        notes: outcome.notes.clone(),
    }
}

/// Bridge that hosts the reconstruction HTTP endpoint and serves results.
pub struct ApiBridge {
    state: Arc<RwLock<ReconModel>>,
    metrics: Arc<MetricsRecorder>,
}

impl ApiBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        let state = Arc::new(RwLock::new(ReconModel::default()));
        let metrics = Arc::new(MetricsRecorder::new());

        let state_for_filter = state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let metrics_for_filter = metrics.clone();
        let metrics_filter = warp::any().map(move || metrics_for_filter.clone());
        let runner_filter = warp::any().map(move || runner.clone());

        let result_route = warp::path("result")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: Arc<RwLock<ReconModel>>| warp::reply::json(&*state.read().unwrap()));

        let metrics_route = warp::path("metrics")
            .and(warp::get())
            .and(metrics_filter.clone())
            .map(|metrics: Arc<MetricsRecorder>| warp::reply::json(&metrics.snapshot()));

        let reconstruct_route = warp::path("reconstruct")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(metrics_filter)
            .and(runner_filter)
            .and_then(
                |request: ReconRequest,
                 state: Arc<RwLock<ReconModel>>,
                 metrics: Arc<MetricsRecorder>,
                 runner: Arc<Runner>| async move {
                    match runner.execute_request(&request) {
                        Ok((response, outcome)) => {
                            metrics.record_processed();
                            if outcome.degenerate_contrast {
                                metrics.record_degenerate();
                            }
                            let mut guard = state.write().unwrap();
                            *guard = model_from_outcome(&outcome);
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&response),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            metrics.record_error();
                            eprintln!("reconstruct error: {err:#}");
                            let failure =
                                ReconFailure::new(err.to_string(), Some(format!("{err:#}")));
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&failure),
                                StatusCode::INTERNAL_SERVER_ERROR,
                            ))
                        }
                    }
                },
            );

        thread::spawn(move || {
            let routes = result_route.or(reconstruct_route).or(metrics_route);
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build runtime");
            runtime.block_on(async move {
                warp::serve(routes).run(bridge_bind_address()).await;
            });
        });

        Self { state, metrics }
    }

    pub fn publish(&self, model: &ReconModel) -> Result<()> {
        let mut guard = self.state.write().unwrap();
        *guard = model.clone();
        println!(
            "[BRIDGE] published {} {}x{} ({} angles)",
            guard.filter, guard.size, guard.size, guard.num_angles
        );
        Ok(())
    }

    pub fn publish_outcome(&self, outcome: &ReconOutcome) -> Result<()> {
        self.metrics.record_processed();
        if outcome.degenerate_contrast {
            self.metrics.record_degenerate();
        }
        self.publish(&model_from_outcome(outcome))
    }

    pub fn publish_status(&self, message: &str) {
        println!("[BRIDGE] {message}");
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> ReconModel {
        self.state.read().unwrap().clone()
    }
}
