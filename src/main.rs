use anyhow::Context;
use clap::Parser;

use plinth::{
    assets::AssetLibrary,
    config::Cli,
    store::MemoryStore,
    EditorApp,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = cli.into_config();
    let store = match &config.layout_path {
        Some(path) => MemoryStore::load_json(path, config.default_color)
            .with_context(|| format!("reading layout {}", path.display()))?,
        None => MemoryStore::new(config.default_color),
    };
    let library = AssetLibrary::new(config.sofa_model.clone());

    log::info!(
        "starting with {} placed objects, sofa model {}",
        store.len(),
        if library.has_model(plinth::store::PrototypeKind::Sofa) {
            "available"
        } else {
            "not configured"
        }
    );

    EditorApp::new(config, store, library)
        .run()
        .context("event loop terminated abnormally")?;
    Ok(())
}
