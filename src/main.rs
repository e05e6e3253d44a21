use std::{
	net::{IpAddr, Ipv4Addr, SocketAddr},
	sync::Arc,
};

use axum::{Router, http::HeaderName, http::header, routing::get};
use eyre::WrapErr;
use tokio::{net::TcpListener, signal};
use tower_http::{
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	sensitive_headers::{SetSensitiveRequestHeadersLayer, SetSensitiveResponseHeadersLayer},
	trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use feedstash::{
	api,
	config::{Config, Resources},
	scheduler::Scheduler,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
	let config = Config::load_file_from_env().wrap_err("could not load the config")?;
	setup_tracing();

	let resources = Resources::init(&config).wrap_err("could not init resources")?;

	tracing::info!("starting scheduler");
	let scheduler = Scheduler::spawn(&config, &resources);

	let app = Router::new()
		.route("/", get(async || "feedstash"))
		.nest("/api", api::router(&resources));

	let x_request_id = HeaderName::from_static("x-request-id");
	let headers: Arc<[_]> = Arc::new([header::AUTHORIZATION]);

	let layered_app = app
		.layer(PropagateRequestIdLayer::new(x_request_id.clone()))
		.layer(SetSensitiveResponseHeadersLayer::from_shared(headers.clone()))
		.layer(
			TraceLayer::new_for_http()
				.make_span_with(DefaultMakeSpan::new())
				.on_response(DefaultOnResponse::new()),
		)
		.layer(SetSensitiveRequestHeadersLayer::from_shared(headers))
		.layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
		.with_state(resources);

	let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.server.port);
	let listener = TcpListener::bind(addr)
		.await
		.wrap_err_with(|| format!("could not bind to the specified interface: {addr:?}"))?;

	tracing::info!("starting app router");
	axum::serve(listener, layered_app)
		.with_graceful_shutdown(shutdown_signal(scheduler))
		.await
		.wrap_err("could not serve app")?;

	Ok(())
}

fn setup_tracing() {
	Registry::default()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,feedstash=debug".into()))
		.with(
			tracing_subscriber::fmt::layer()
				.with_file(true)
				.with_line_number(true),
		)
		.init();
}

async fn shutdown_signal(scheduler: Scheduler) {
	let ctrl_c = async {
		signal::ctrl_c()
			.await
			.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		signal::unix::signal(signal::unix::SignalKind::terminate())
			.expect("failed to install signal handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => scheduler.abort(),
		() = terminate => scheduler.abort(),
	}
}
