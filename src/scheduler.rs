//! Timer-driven ticks for the refresh pipeline and the retention sweeper.
//! Both loops run on their own cadence; overlap within a loop is prevented
//! by the engine itself, so a slow tick only delays the next one.

use std::{sync::Arc, time::Duration};

use tokio::{
	task::{self, AbortHandle},
	time::{self, MissedTickBehavior},
};

use crate::{
	config::{Config, ResourcesRef},
	refresh::{RefreshEngine, RetentionSweeper},
};

pub struct Scheduler {
	refresh_task: AbortHandle,
	sweep_task: AbortHandle,
}

impl Scheduler {
	pub fn spawn(config: &Config, resources: &ResourcesRef) -> Self {
		let refresh_task = task::spawn(refresh_loop(
			resources.engine.clone(),
			Duration::from_secs(config.refresh.interval_secs),
		))
		.abort_handle();

		let sweep_task = task::spawn(sweep_loop(
			resources.sweeper.clone(),
			Duration::from_secs(config.retention.sweep_interval_secs),
		))
		.abort_handle();

		Self {
			refresh_task,
			sweep_task,
		}
	}

	pub fn abort(&self) {
		self.refresh_task.abort();
		self.sweep_task.abort();
	}
}

async fn refresh_loop(engine: Arc<RefreshEngine>, period: Duration) {
	let mut interval = time::interval(period);
	interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		interval.tick().await;

		if let Err(err) = engine.run_once().await {
			tracing::error!(err = %err, "refresh tick failed");
		}
	}
}

async fn sweep_loop(sweeper: Arc<RetentionSweeper>, period: Duration) {
	let mut interval = time::interval(period);
	interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		interval.tick().await;

		if let Err(err) = sweeper.sweep() {
			tracing::error!(err = %err, "retention sweep failed");
		}
	}
}
