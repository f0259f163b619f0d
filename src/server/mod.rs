pub mod authn;
pub mod handlers;
pub mod router;

use anyhow::Context;

use crate::conf::Settings;
use crate::state::AppState;
use router::build_routes;

pub async fn listen(settings: &Settings, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", settings.listen_port))
        .await
        .with_context(|| format!("could not bind port {}", settings.listen_port))?;
    tracing::info!("Listening at port {}", settings.listen_port);
    tokio::select! {
        r = axum::serve(listener, build_routes(state)) => {
            tracing::warn!("server ended unexpectedly: {:?}", &r)
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl+c interrupt, closing server");
        }
    }
    Ok(())
}
