use anyhow::Context;

use ecosmart_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ecosmart_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let app = ecosmart_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        co2e_goal_kg = config.co2e_goal_kg,
        alert_threshold_kg = config.alert_policy.high_impact_threshold_kg,
        swap_threshold_kg = config.alert_policy.swap_prompt_threshold_kg,
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
