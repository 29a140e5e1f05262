use kube::Client;
use oprc_dbaas::{config::OperatorConfig, init_tracing, runtime};
use tracing::info;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    // Missing INSTALL_NAMESPACE is fatal here, never per reconcile.
    let cfg = OperatorConfig::load()?;
    info!(?cfg, "Starting DBaaS operator");

    let client = Client::try_default().await?;
    runtime::run_all(client, cfg).await
}
