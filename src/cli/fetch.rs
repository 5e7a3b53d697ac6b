//! Fetch command - populate the local artifact store and exit

use tracing::info;

use crate::domain::{ArtifactFetcher, ModelName};
use crate::infrastructure::HttpArtifactFetcher;

/// Download every missing artifact; files already present are left alone
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap();
    let fetcher = HttpArtifactFetcher::from_config(&config.models)?;

    for model in ModelName::ALL {
        let path = fetcher.ensure_local(model).await?;
        info!(model = %model, path = %path.display(), "Artifact available");
        println!("{}\t{}", model, path.display());
    }

    Ok(())
}
