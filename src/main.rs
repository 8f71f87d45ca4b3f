mod app;
mod network;
mod util;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to an entity network snapshot (JSON).
    #[arg(long, default_value = "data/sample_network.json")]
    snapshot: String,
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "ring-lens",
        options,
        Box::new(move |cc| Ok(Box::new(app::RingLensApp::new(cc, args.snapshot.clone())))),
    )
}
