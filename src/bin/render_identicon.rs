//! Renders the identicon for one key straight to a PNG file, no cache involved.
//!
//! Usage: render_identicon <key> [output.png]

use anyhow::{bail, Context, Result};
use imgret::domains::identicon::{render_identicon, BitmapGeometry};
use shared::Config;
use std::env;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = env::args().skip(1);
    let Some(key) = args.next() else {
        bail!("usage: render_identicon <key> [output.png]");
    };
    let output = args.next().unwrap_or_else(|| "identicon.png".to_string());

    let config = Config::from_env()?;
    let geometry = BitmapGeometry::new(
        config.identicon.magnification,
        config.identicon.canvas_size,
    )?;

    let png = render_identicon(key.as_bytes(), geometry)?;
    std::fs::write(&output, &png).with_context(|| format!("Error writing {}", output))?;

    info!("🖼️ Wrote {} ({} bytes) for key {}", output, png.len(), key);
    Ok(())
}
