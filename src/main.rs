// src/main.rs
//! crate3d: 3D Bin-Packing Engine
//!
//! A first-fit-decreasing packer: given a multiset of rectangular items and
//! a palette of candidate boxes, chooses the best box and produces a
//! concrete parcel assignment.

use crate3d::config::AppConfig;
use crate3d::api;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let default_max_weight = app_config.packer.max_weight();

    println!("🚀 Packing engine starting...");
    api::start_api_server(api_config, default_max_weight).await;
}
