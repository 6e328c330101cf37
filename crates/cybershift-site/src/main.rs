//! CyberShift: a virtual runway page rendered on a shared 3D surface.

mod app;
mod fabric_lab;
mod hero_cloth;
mod lookbook;
mod macro_weave;
mod page;
mod smooth_scroll;

use cybershift_engine::logging::{init_logging, LoggingConfig};

use crate::app::Site;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());
    log::info!("cybershift starting");

    Site::new()
        .title("CyberShift // Virtual Runway")
        .size(1280.0, 800.0)
        .assets("assets")
        .run()
}
