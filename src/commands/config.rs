use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{
    auth::FileTokenStore,
    config::{GatewayConfig, default_token_path},
    gateway::ApiGateway,
    http::HttpTransport,
    navigate::ConsoleNavigator,
    notify::LogNotifier,
    runtime::Runtime,
};

/// Gateway wired to the console collaborators used by the command line.
pub type ConsoleGateway<R> =
    ApiGateway<FileTokenStore<R>, LogNotifier, ConsoleNavigator, HttpTransport>;

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub gateway: ConsoleGateway<R>,
}

impl<R: Runtime + Clone> Config<R> {
    pub fn new(runtime: R, origin: Option<String>, token_file: Option<PathBuf>) -> Result<Self> {
        let settings = GatewayConfig::load(&runtime, origin)?;

        let token_path = token_file.or_else(|| default_token_path(&runtime));
        if let Some(path) = &token_path {
            debug!("Reading stored credential from {}", path.display());
        }
        let store = FileTokenStore::new(runtime.clone(), token_path);

        let gateway = ApiGateway::connect(&settings, store, LogNotifier, ConsoleNavigator::new())?;

        Ok(Self { runtime, gateway })
    }
}
