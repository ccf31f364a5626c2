//! [`BlizzardClient`]: the game-data API as a [`RosterSource`].

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use artisan_core::roster::{
  AccessToken, CharacterProfessions, CharacterSummary, ProfessionRef, RecipeCategory,
  RecipeDetails, RosterMember, RosterSource, SkillTierRef,
};

use crate::{
  retry::{BackoffPolicy, is_retryable_error, is_retryable_status},
  wire::{
    ProfessionDetailResponse, ProfessionIndexResponse, ProfessionsResponse, RecipeResponse,
    RosterResponse, SkillTierResponse, SummaryResponse, TokenResponse,
  },
  Error, Result,
};

/// Cached tokens are treated as expired this long before upstream says so.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Lowercase, apostrophes removed, spaces to hyphens: `"Kel'Thuzad"` →
/// `"kelthuzad"`, `"Area 52"` → `"area-52"`.
pub fn slugify(name: &str) -> String {
  name
    .trim()
    .to_lowercase()
    .replace('\'', "")
    .replace(' ', "-")
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// Connection settings for the game-data API.
#[derive(Debug, Clone)]
pub struct BlizzardConfig {
  pub region:        String,
  pub locale:        String,
  pub client_id:     String,
  pub client_secret: String,
  /// Guild realm display name; slugified for URLs.
  pub realm:         String,
  /// Guild display name; slugified for URLs.
  pub guild:         String,
  pub timeout:       Duration,
  pub backoff:       BackoffPolicy,
  /// Overrides `https://{region}.battle.net`.
  pub oauth_base:    Option<String>,
  /// Overrides `https://{region}.api.blizzard.com`.
  pub api_base:      Option<String>,
}

impl Default for BlizzardConfig {
  fn default() -> Self {
    Self {
      region:        "us".into(),
      locale:        "en_US".into(),
      client_id:     String::new(),
      client_secret: String::new(),
      realm:         String::new(),
      guild:         String::new(),
      timeout:       Duration::from_secs(20),
      backoff:       BackoffPolicy::default(),
      oauth_base:    None,
      api_base:      None,
    }
  }
}

/// Which upstream data namespace an endpoint lives in.
#[derive(Debug, Clone, Copy)]
enum Namespace {
  Profile,
  Static,
}

impl Namespace {
  fn for_region(self, region: &str) -> String {
    match self {
      Self::Profile => format!("profile-{region}"),
      Self::Static => format!("static-{region}"),
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for the game-data API.
///
/// Holds one cached access token shared by every request made through this
/// client.
pub struct BlizzardClient {
  http:   Client,
  config: BlizzardConfig,
  token:  Mutex<Option<AccessToken>>,
}

impl BlizzardClient {
  pub fn new(config: BlizzardConfig) -> Result<Self> {
    let http = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { http, config, token: Mutex::new(None) })
  }

  fn oauth_url(&self) -> String {
    match &self.config.oauth_base {
      Some(base) => format!("{}/oauth/token", base.trim_end_matches('/')),
      None => format!("https://{}.battle.net/oauth/token", self.config.region),
    }
  }

  fn api_url(&self, path: &str) -> String {
    match &self.config.api_base {
      Some(base) => format!("{}{path}", base.trim_end_matches('/')),
      None => format!("https://{}.api.blizzard.com{path}", self.config.region),
    }
  }

  /// Drop the cached token so the next [`RosterSource::fetch_access_token`]
  /// requests a fresh one.
  pub async fn invalidate_token(&self) { self.token.lock().await.take(); }

  /// Send the request built by `build`, retrying retryable failures.
  ///
  /// Returns the first response that is successful or not worth retrying,
  /// or the last response once retries are exhausted.
  async fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response> {
    let backoff = self.config.backoff;
    let mut attempt = 0;

    loop {
      match build().send().await {
        Ok(resp) if !is_retryable_status(resp.status()) || attempt >= backoff.max_retries => {
          return Ok(resp);
        }
        Ok(resp) => {
          debug!(status = resp.status().as_u16(), url = %resp.url(), attempt, "retrying upstream request");
        }
        Err(err) if !is_retryable_error(&err) || attempt >= backoff.max_retries => {
          return Err(err.into());
        }
        Err(err) => {
          debug!(error = %err, attempt, "retrying upstream request");
        }
      }
      tokio::time::sleep(backoff.delay_for_attempt(attempt)).await;
      attempt += 1;
    }
  }

  /// `GET` a JSON document. A 404 is `Ok(None)`; a 401 also invalidates the
  /// cached token.
  async fn get_optional<T: DeserializeOwned>(
    &self,
    path: &str,
    namespace: Namespace,
    token: &AccessToken,
  ) -> Result<Option<T>> {
    let url = self.api_url(path);
    let query = [
      ("namespace", namespace.for_region(&self.config.region)),
      ("locale", self.config.locale.clone()),
    ];

    let resp = self
      .send(|| self.http.get(&url).bearer_auth(token.secret()).query(&query))
      .await?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if status == StatusCode::UNAUTHORIZED {
      warn!(url = %url, "access token rejected; discarding cached token");
      self.invalidate_token().await;
    }
    if !status.is_success() {
      return Err(Error::Status { status: status.as_u16(), url });
    }

    let body = resp.bytes().await?;
    serde_json::from_slice(&body)
      .map(Some)
      .map_err(|source| Error::Decode { url, source })
  }

  /// Like [`Self::get_optional`], but a 404 is an error.
  async fn get_required<T: DeserializeOwned>(
    &self,
    path: &str,
    namespace: Namespace,
    token: &AccessToken,
  ) -> Result<T> {
    self
      .get_optional(path, namespace, token)
      .await?
      .ok_or_else(|| Error::Status { status: 404, url: self.api_url(path) })
  }

  async fn request_token(&self) -> Result<AccessToken> {
    if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
      return Err(Error::MissingCredentials);
    }

    let url = self.oauth_url();
    let resp = self
      .send(|| {
        self
          .http
          .post(&url)
          .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
          .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
          .body("grant_type=client_credentials")
      })
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status { status: status.as_u16(), url });
    }

    let body = resp.bytes().await?;
    let token: TokenResponse =
      serde_json::from_slice(&body).map_err(|source| Error::Decode { url, source })?;

    let expires_at = token.expires_in.map(|secs| {
      Utc::now() + chrono::Duration::seconds((secs - TOKEN_EXPIRY_MARGIN_SECS).max(0))
    });
    info!(?expires_at, "obtained access token");
    Ok(AccessToken::new(token.access_token, expires_at))
  }
}

// ─── RosterSource impl ───────────────────────────────────────────────────────

impl RosterSource for BlizzardClient {
  type Error = Error;

  async fn fetch_access_token(&self) -> Result<AccessToken> {
    let mut cached = self.token.lock().await;
    if let Some(token) = cached.as_ref().filter(|t| !t.is_expired_at(Utc::now())) {
      return Ok(token.clone());
    }

    let fresh = self.request_token().await?;
    *cached = Some(fresh.clone());
    Ok(fresh)
  }

  async fn fetch_roster_members(&self, token: &AccessToken) -> Result<Vec<RosterMember>> {
    let path = format!(
      "/data/wow/guild/{}/{}/roster",
      slugify(&self.config.realm),
      slugify(&self.config.guild),
    );
    let roster: RosterResponse = self.get_required(&path, Namespace::Profile, token).await?;
    let members = roster.into_members();
    info!(count = members.len(), "fetched guild roster");
    Ok(members)
  }

  async fn fetch_character_summary(
    &self,
    realm: &str,
    name: &str,
    token: &AccessToken,
  ) -> Result<Option<CharacterSummary>> {
    let path = format!("/profile/wow/character/{realm}/{}", name.to_lowercase());
    let summary: Option<SummaryResponse> =
      self.get_optional(&path, Namespace::Profile, token).await?;
    Ok(summary.map(|s| s.into_summary(&self.config.locale)))
  }

  async fn fetch_character_professions(
    &self,
    realm: &str,
    name: &str,
    token: &AccessToken,
  ) -> Result<Option<CharacterProfessions>> {
    let path = format!("/profile/wow/character/{realm}/{}/professions", name.to_lowercase());
    let profs: Option<ProfessionsResponse> =
      self.get_optional(&path, Namespace::Profile, token).await?;
    Ok(profs.map(|p| p.into_professions(&self.config.locale)))
  }

  async fn fetch_profession_index(&self, token: &AccessToken) -> Result<Vec<ProfessionRef>> {
    let index: ProfessionIndexResponse = self
      .get_required("/data/wow/profession/index", Namespace::Static, token)
      .await?;
    Ok(index.into_refs())
  }

  async fn fetch_profession_skill_tiers(
    &self,
    profession_id: i64,
    token: &AccessToken,
  ) -> Result<Vec<SkillTierRef>> {
    let path = format!("/data/wow/profession/{profession_id}");
    let detail: Option<ProfessionDetailResponse> =
      self.get_optional(&path, Namespace::Static, token).await?;
    Ok(detail.map(|d| d.into_tiers(&self.config.locale)).unwrap_or_default())
  }

  async fn fetch_recipes_for_tier(
    &self,
    profession_id: i64,
    tier_id: i64,
    token: &AccessToken,
  ) -> Result<Vec<RecipeCategory>> {
    let path = format!("/data/wow/profession/{profession_id}/skill-tier/{tier_id}");
    let tier: Option<SkillTierResponse> =
      self.get_optional(&path, Namespace::Static, token).await?;
    Ok(tier.map(|t| t.into_categories(&self.config.locale)).unwrap_or_default())
  }

  async fn fetch_recipe_details(&self, recipe_id: i64, token: &AccessToken) -> Option<RecipeDetails> {
    let path = format!("/data/wow/recipe/{recipe_id}");
    match self.get_optional::<RecipeResponse>(&path, Namespace::Static, token).await {
      Ok(found) => found.map(|r| r.into_details(&self.config.locale)),
      Err(err) => {
        debug!(recipe_id, error = %err, "recipe detail lookup failed");
        None
      }
    }
  }
}
