// src/core/managers/gist.rs

//! # GitHub Gist Manager
//!
//! `sync` downloads the gists of the configured user into a JSON cache; snippets are
//! then served from that cache without touching the network.

use super::{Manager, ManagerError};
use crate::constants::APP_NAME;
use crate::core::config::model::{GistAuthentication, GistConfig};
use crate::core::paths;
use crate::core::secrets::SecretStore;
use crate::core::snippet::{Snippet, StaticSnippet};
use crate::models::{
    InteractiveInput, Language, ManagerDescription, ManagerInfoLine, SyncEvent, SyncInputType,
    SyncReply, SyncStatus,
};
use crate::system::runtime;
use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

pub const KEY: &str = "githubGist";

/// Largest page the gist listing endpoint serves.
const GIST_PAGE_SIZE: usize = 100;

/// Where the token used for a sync came from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Stored(String),
    /// Typed at the sync prompt. Kept only once a request accepted it.
    Entered(String),
}

impl Token {
    fn value(&self) -> &str {
        match self {
            Token::Stored(token) | Token::Entered(token) => token,
        }
    }
}

// --- CACHE FORMAT ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct GistCache {
    pub user: String,
    pub synced_at: Option<DateTime<Utc>>,
    pub gists: Vec<CachedGist>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CachedGist {
    pub id: String,
    pub description: String,
    pub files: Vec<CachedFile>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub filename: String,
    pub content: String,
}

// --- API FORMAT ---

#[derive(Deserialize, Debug)]
struct ApiGist {
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    files: BTreeMap<String, ApiGistFile>,
}

#[derive(Deserialize, Debug)]
struct ApiGistFile {
    filename: String,
    raw_url: String,
}

pub struct GistManager {
    config: GistConfig,
    cache_path: PathBuf,
    secrets: Arc<dyn SecretStore>,
}

impl GistManager {
    pub fn new(config: GistConfig, secrets: Arc<dyn SecretStore>) -> Result<Self, ManagerError> {
        let cache_path = paths::cache_dir()?.join(format!("gists-{}.json", config.user));
        Ok(Self::with_cache_path(config, secrets, cache_path))
    }

    pub fn with_cache_path(config: GistConfig, secrets: Arc<dyn SecretStore>, cache_path: PathBuf) -> Self {
        Self {
            config,
            cache_path,
            secrets,
        }
    }

    fn token_account(&self) -> String {
        format!("github-gist-{}", self.config.user)
    }

    pub fn load_cache(&self) -> Result<Option<GistCache>, ManagerError> {
        if !self.cache_path.is_file() {
            log::debug!("No gist cache at '{}'", self.cache_path.display());
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.cache_path).map_err(|source| ManagerError::Io {
            path: self.cache_path.clone(),
            source,
        })?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ManagerError::Cache(e.to_string()))
    }

    fn write_cache(&self, cache: &GistCache) -> Result<(), ManagerError> {
        let json = serde_json::to_string_pretty(cache).map_err(|e| ManagerError::Cache(e.to_string()))?;
        if let Some(parent) = self.cache_path.parent() {
            fs::create_dir_all(parent).map_err(|source| ManagerError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.cache_path, json).map_err(|source| ManagerError::Io {
            path: self.cache_path.clone(),
            source,
        })
    }

    /// Returns the stored token, or asks for one through the sync screen.
    /// `None` means the user aborted or the screen went away.
    fn token(&self, events: &Sender<SyncEvent>) -> Result<Option<Token>, ManagerError> {
        if let Some(token) = self.secrets.get(&self.token_account())? {
            return Ok(Some(Token::Stored(token)));
        }

        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        let prompt = InteractiveInput {
            content: format!("GitHub token for '{}'", self.config.user),
            input_type: SyncInputType::Text,
            reply: reply_tx,
        };
        let event = SyncEvent::new(SyncStatus::Started, "Waiting for an access token").with_input(prompt);
        if events.send(event).is_err() {
            return Ok(None);
        }

        match reply_rx.recv() {
            Ok(SyncReply::Text(token)) if !token.trim().is_empty() => Ok(Some(Token::Entered(token.trim().to_string()))),
            Ok(reply) => {
                log::debug!("Token prompt answered with {:?}", reply);
                Ok(None)
            }
            Err(_) => {
                log::debug!("Token prompt closed without an answer");
                Ok(None)
            }
        }
    }

    /// Runs one sync. `Ok(None)` means the user cancelled.
    fn try_sync(&self, events: &Sender<SyncEvent>) -> Result<Option<String>, ManagerError> {
        if self.config.user.trim().is_empty() {
            return Err(ManagerError::MissingSetting(KEY, "user"));
        }
        let token = match self.config.authentication {
            GistAuthentication::None => None,
            GistAuthentication::Token => match self.token(events)? {
                Some(token) => Some(token),
                None => return Ok(None),
            },
        };

        let _ = events.send(SyncEvent::new(
            SyncStatus::Started,
            format!("Downloading gists of '{}'", self.config.user),
        ));
        let fetched = runtime::block_on(fetch_gists(
            &self.config.api_url,
            &self.config.user,
            token.as_ref().map(Token::value),
            GIST_PAGE_SIZE,
        ))
        .map_err(|e| ManagerError::Http(e.to_string()))?;
        let gists = match (fetched, &token) {
            (Ok(gists), Some(Token::Entered(entered))) => {
                self.secrets.set(&self.token_account(), entered)?;
                gists
            }
            (Ok(gists), _) => gists,
            (Err(e @ ManagerError::Unauthorized(_)), Some(Token::Stored(_))) => {
                // Forget it so the next sync prompts for a new one.
                log::warn!("Stored gist token for '{}' was rejected, removing it", self.config.user);
                self.secrets.delete(&self.token_account())?;
                return Err(e);
            }
            (Err(e), _) => return Err(e),
        };

        let files: usize = gists.iter().map(|g| g.files.len()).sum();
        let summary = format!("Synced {} gist(s), {} file(s)", gists.len(), files);
        self.write_cache(&GistCache {
            user: self.config.user.clone(),
            synced_at: Some(Utc::now()),
            gists,
        })?;
        Ok(Some(summary))
    }
}

/// Splits a gist description into its title and `#tags`.
pub fn split_description(description: &str) -> (String, Vec<String>) {
    let mut words = Vec::new();
    let mut tags = Vec::new();
    for word in description.split_whitespace() {
        match word.strip_prefix('#') {
            Some(tag) if !tag.is_empty() => tags.push(tag.to_string()),
            _ => words.push(word),
        }
    }
    (words.join(" "), tags)
}

/// Turns a cache into snippets, one per gist file.
pub fn snippets_from_cache(cache: &GistCache, hide_title_in_preview: bool) -> Vec<Arc<dyn Snippet>> {
    let mut snippets: Vec<Arc<dyn Snippet>> = Vec::new();
    for gist in &cache.gists {
        let (title, tags) = split_description(&gist.description);
        for file in &gist.files {
            let title = if title.is_empty() {
                file.filename.clone()
            } else {
                title.clone()
            };
            snippets.push(Arc::new(StaticSnippet {
                id: format!("gist-{}-{}", gist.id, file.filename),
                title,
                tags: tags.clone(),
                language: Language::from_filename(&file.filename),
                content: file.content.clone(),
                hide_title_in_preview,
            }));
        }
    }
    snippets
}

fn http_error(e: reqwest::Error) -> ManagerError {
    ManagerError::Http(e.to_string())
}

/// Downloads every gist of `user`, following the listing page by page until a short or
/// empty page comes back.
async fn fetch_gists(
    api_url: &str,
    user: &str,
    token: Option<&str>,
    page_size: usize,
) -> Result<Vec<CachedGist>, ManagerError> {
    let client = reqwest::Client::builder()
        .user_agent(APP_NAME)
        .build()
        .map_err(http_error)?;
    let authorize = |request: reqwest::RequestBuilder| match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    };

    let mut listed: Vec<ApiGist> = Vec::new();
    for page in 1.. {
        let url = format!(
            "{}/users/{}/gists?per_page={}&page={}",
            api_url.trim_end_matches('/'),
            user,
            page_size,
            page
        );
        log::debug!("GET {}", url);
        let response = authorize(client.get(&url).header(reqwest::header::ACCEPT, "application/vnd.github+json"))
            .send()
            .await
            .map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("{} {}", status, body.trim());
            return Err(match status {
                reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => ManagerError::Unauthorized(message),
                _ => ManagerError::Http(message),
            });
        }
        let batch: Vec<ApiGist> = response.json().await.map_err(http_error)?;
        let last = batch.len() < page_size;
        listed.extend(batch);
        if last {
            break;
        }
    }

    let mut gists = Vec::with_capacity(listed.len());
    for gist in listed {
        let mut files = Vec::with_capacity(gist.files.len());
        for file in gist.files.into_values() {
            let content = authorize(client.get(&file.raw_url))
                .send()
                .await
                .map_err(http_error)?
                .error_for_status()
                .map_err(http_error)?
                .text()
                .await
                .map_err(http_error)?;
            files.push(CachedFile {
                filename: file.filename,
                content,
            });
        }
        gists.push(CachedGist {
            id: gist.id,
            description: gist.description.unwrap_or_default(),
            files,
        });
    }
    Ok(gists)
}

impl Manager for GistManager {
    fn key(&self) -> &'static str {
        KEY
    }

    fn description(&self) -> ManagerDescription {
        ManagerDescription {
            key: KEY.to_string(),
            name: "GitHub Gist".to_string(),
            description: "Gists of a GitHub user, cached locally by `sync`".to_string(),
            enabled: self.config.enabled,
        }
    }

    fn snippets(&self) -> Result<Vec<Arc<dyn Snippet>>, ManagerError> {
        Ok(self
            .load_cache()?
            .map(|cache| snippets_from_cache(&cache, self.config.hide_title_in_preview))
            .unwrap_or_default())
    }

    fn info(&self) -> Vec<ManagerInfoLine> {
        let authentication = match self.config.authentication {
            GistAuthentication::None => "none",
            GistAuthentication::Token => "token",
        };
        let mut lines = vec![
            ManagerInfoLine::new("User", self.config.user.clone()),
            ManagerInfoLine::new("Authentication", authentication),
            ManagerInfoLine::new("Cache", self.cache_path.display().to_string()),
        ];
        match self.load_cache() {
            Ok(Some(cache)) => {
                let synced = cache
                    .synced_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string());
                lines.push(ManagerInfoLine::new("Last sync", synced));
                lines.push(ManagerInfoLine::new(
                    "Snippets",
                    snippets_from_cache(&cache, false).len().to_string(),
                ));
            }
            Ok(None) => lines.push(ManagerInfoLine::new("Last sync", "never synced")),
            Err(e) => lines.push(ManagerInfoLine::new("Last sync", e.to_string())),
        }
        lines
    }

    fn sync(&self, events: &Sender<SyncEvent>) -> bool {
        let _ = events.send(SyncEvent::new(
            SyncStatus::Started,
            format!("Syncing gists of '{}'", self.config.user),
        ));
        let last = match self.try_sync(events) {
            Ok(Some(summary)) => SyncEvent::new(SyncStatus::Finished, summary),
            Ok(None) => SyncEvent::new(SyncStatus::Aborted, "Cancelled"),
            Err(e) => {
                log::error!("Gist sync failed: {}", e);
                SyncEvent::new(SyncStatus::Aborted, e.to_string())
            }
        };
        let _ = events.send(last);
        true
    }
}

// MARK: --- UNIT TESTS ---
