use crate::generator::profile::GeneratorConfig;
use crate::http_bridge::model::MagnitudeModel;
use crate::workflow::runner::Runner;
use anyhow::Result;
use log::{error, info};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

pub fn bridge_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct WarpError;

impl warp::reject::Reject for WarpError {}

/// Holds the latest magnitude model and serves it over HTTP.
pub struct MagnitudeBridge {
    state: Arc<RwLock<MagnitudeModel>>,
    runner: Arc<Runner>,
}

impl MagnitudeBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            state: Arc::new(RwLock::new(MagnitudeModel::default())),
            runner,
        }
    }

    /// Starts the HTTP endpoints on a background thread:
    /// `GET /magnitude` returns the latest model, `POST /scenario` runs a
    /// generator config and replaces it.
    pub fn spawn_server(&self, address: SocketAddr) {
        let state_for_filter = self.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());

        let get_route = warp::path("magnitude")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: Arc<RwLock<MagnitudeModel>>| match state.read() {
                Ok(model) => warp::reply::with_status(warp::reply::json(&*model), StatusCode::OK),
                Err(_) => warp::reply::with_status(
                    warp::reply::json(&json!({"status": "unavailable"})),
                    StatusCode::INTERNAL_SERVER_ERROR,
                ),
            });

        let scenario_route = warp::path("scenario")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |config: GeneratorConfig,
                 state: Arc<RwLock<MagnitudeModel>>,
                 runner: Arc<Runner>| async move {
                    match runner.execute_config(&config) {
                        Ok(result) => {
                            let model = MagnitudeModel::from_result(
                                &result,
                                config.scenario.clone(),
                                config.description.clone(),
                            );
                            if let Ok(mut guard) = state.write() {
                                *guard = model;
                            }
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "ok",
                                    "final_mw": result.final_mw(),
                                    "stations_in_range": result.stations_in_range,
                                })),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            error!("scenario error: {:#}", err);
                            Err(warp::reject::custom(WarpError))
                        }
                    }
                },
            );

        thread::spawn(move || {
            let routes = get_route.or(scenario_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                warp::serve(routes).run(address).await;
            });
        });
    }

    pub fn publish(&self, model: &MagnitudeModel) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| anyhow::anyhow!("magnitude state lock poisoned"))?;
        *guard = model.clone();
        println!(
            "[BRIDGE] network Mw points: {}, final Mw: {}",
            guard.series.as_ref().map_or(0, |s| s.len()),
            guard
                .final_mw
                .map_or_else(|| "n/a".to_string(), |mw| format!("{:.2}", mw))
        );
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        info!("{}", message);
        println!("[BRIDGE] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> MagnitudeModel {
        self.state.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::build_scenario;
    use crate::workflow::config::WorkflowConfig;
    use pgdcore::ScalingLaw;

    #[test]
    fn bridge_publish_updates_state() {
        let cfg = WorkflowConfig::from_args(4, 7.0, 20.0, 2, ScalingLaw::Melgar2015);
        let runner = Arc::new(Runner::new(cfg));
        let bridge = MagnitudeBridge::new(runner.clone());
        let scenario = build_scenario(4, 7.0).unwrap();
        let result = runner.execute(&scenario).unwrap();
        let model = MagnitudeModel::from_result(&result, Some("test".into()), None);
        bridge.publish(&model).unwrap();

        let snapshot = bridge.snapshot();
        assert_eq!(snapshot.scenario.as_deref(), Some("test"));
        assert_eq!(snapshot.final_mw, result.final_mw());
        assert_eq!(snapshot.stations_registered, 4);
    }

    #[test]
    fn model_serializes_missing_values_as_null() {
        let model = MagnitudeModel::default();
        let value = serde_json::to_value(&model).unwrap();
        assert!(value["final_mw"].is_null());
        assert!(value["series"].is_null());
    }
}
