//! Building plugin sets from the configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{info, warn};

use showrunner_core::config::Config;
use showrunner_core::notifier::{Notifier, NotifierSet, TelegramNotifier, WebhookNotifier};
use showrunner_core::retriever::{FileRetriever, HttpRetriever, Retriever, RetrieverDispatcher};
use showrunner_core::searcher::{LocalSearcher, Searcher, SearcherSet};

/// Searchers named in `[searchers] enabled`, in that order.
pub fn build_searchers(config: &Config) -> SearcherSet {
    let mut available: Vec<Arc<dyn Searcher>> = Vec::new();
    if let Some(local) = &config.searchers.local {
        info!("Initializing local searcher over {} path(s)", local.paths.len());
        available.push(Arc::new(LocalSearcher::new(local)));
    }

    let set = SearcherSet::from_enabled(available, &config.searchers.enabled);
    if set.is_empty() {
        warn!("No searchers enabled; ready episodes will not be searched");
    } else {
        info!("Enabled searchers: {}", set.names().join(", "));
    }
    set
}

/// Every known retriever; the dispatcher decides which are eligible.
pub fn build_dispatcher(config: &Config) -> Result<RetrieverDispatcher> {
    let http = HttpRetriever::new(&config.retrievers.http)
        .context("Failed to create HTTP retriever")?;
    let available: Vec<Arc<dyn Retriever>> = vec![Arc::new(FileRetriever::new()), Arc::new(http)];

    Ok(RetrieverDispatcher::new(
        available,
        config.retrievers.enabled.clone(),
    ))
}

pub fn build_notifiers(config: &Config, client: &Client) -> NotifierSet {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    for name in &config.notifiers.enabled {
        match name.as_str() {
            "telegram" => match &config.notifiers.telegram {
                Some(cfg) => notifiers.push(Arc::new(TelegramNotifier::new(client.clone(), cfg))),
                None => warn!("telegram notifier enabled without configuration"),
            },
            "webhook" => match &config.notifiers.webhook {
                Some(cfg) => notifiers.push(Arc::new(WebhookNotifier::new(client.clone(), cfg))),
                None => warn!("webhook notifier enabled without configuration"),
            },
            other => warn!("Unknown notifier {:?} in config; ignoring", other),
        }
    }

    info!("{} notifier(s) enabled", notifiers.len());
    NotifierSet::new(notifiers)
}
