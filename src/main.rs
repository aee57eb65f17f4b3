use anyhow::Result;
use log::{error, info};

use item_cutout::api::build_rocket;
use item_cutout::bootstrap::{initialize_logger, initialize_state};
use item_cutout::common::ROCKET_RUNTIME;

fn main() -> Result<()> {
    initialize_logger();
    let state = initialize_state()?;

    let result = ROCKET_RUNTIME.block_on(async {
        let rocket_instance = build_rocket(state).ignite().await?;
        info!("Item cutout service ready");
        rocket_instance.launch().await
    });

    if let Err(e) = result {
        error!("Rocket server failed: {}", e);
        return Err(anyhow::Error::from(e));
    }
    Ok(())
}
