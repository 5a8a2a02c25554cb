mod app;
mod source;
mod util;

use std::sync::Arc;

use clap::Parser;

use source::FileGraphService;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding graph.json, taxonomy.json, and details/.
    #[arg(long, default_value = "./data")]
    data_dir: String,
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let service = Arc::new(FileGraphService::new(args.data_dir));

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "graphlens",
        options,
        Box::new(move |cc| Ok(Box::new(app::GraphLensApp::new(cc, service)))),
    )
}
