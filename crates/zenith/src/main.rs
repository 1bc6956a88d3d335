//! Zenith world server executable entry point.

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lib_zenith::init().await
}
