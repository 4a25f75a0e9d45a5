use std::sync::Arc;

use gatherpad_core::config::Config;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), gatherpad_core::Error> {
    gatherpad_core::logging::init("gatherpad")?;

    let cfg = Arc::new(Config::load()?);

    if let Err(e) = gatherpad_telegram::router::run_polling(cfg).await {
        error!("telegram bot failed: {e:#}");
        return Err(gatherpad_core::Error::External(format!(
            "telegram bot failed: {e}"
        )));
    }

    Ok(())
}
