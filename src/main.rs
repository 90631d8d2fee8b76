use anyhow::Result;
use log::error;

use growatt_node::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let options = Options::new();

    if let Err(e) = growatt_node::app(options).await {
        error!("Application error: {:?}", e);
        return Err(e);
    }

    Ok(())
}
