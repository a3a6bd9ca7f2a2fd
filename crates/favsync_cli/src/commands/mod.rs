//! CLI command implementations.

pub mod config;
pub mod favorites;
pub mod sync;
pub mod watch;

use crate::http::ReqwestClient;
use crate::settings::Settings;
use favsync_engine::{HttpRemote, StaticIdentity, SyncEngine};
use favsync_store::{DataDir, FileCursorStore, FileFavoritesStore};
use std::sync::Arc;

/// The engine as the CLI assembles it.
pub type CliEngine = SyncEngine<HttpRemote<ReqwestClient>, FileFavoritesStore, FileCursorStore>;

/// Builds an engine over the data directory's file stores.
pub fn open_engine(
    dir: &DataDir,
    settings: &Settings,
) -> Result<CliEngine, Box<dyn std::error::Error>> {
    let server_url = settings.require_server_url()?;
    let identity = StaticIdentity::signed_in(settings.require_user_id()?);
    let remote = HttpRemote::new(server_url, ReqwestClient::new(settings.timeout())?);
    let engine = SyncEngine::new(remote, dir.favorites()?, dir.cursor(), Arc::new(identity))
        .with_config(settings.engine_config());
    Ok(engine)
}
