use std::path::PathBuf;

use shading_sandbox::{flow, settings::Settings};

/// `shading-sandbox [settings.json]`
fn main() -> anyhow::Result<()> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load(path.as_deref())?;
    flow::run(settings)
}
