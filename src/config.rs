use anyhow::Context;
use chrono::FixedOffset;
use std::env;
use std::str::FromStr;

use crate::media::AVATAR_DIMENSION;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Byte budget shared by all stored slices; `None` disables the check.
    pub storage_quota_bytes: Option<u64>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    /// Additional CORS origins, e.g. for LAN testing from another device.
    pub cors_extra_origins: Vec<String>,

    pub ai_api_key: String,
    pub ai_base_url: String,
    pub ai_model: String,
    pub ai_temperature: f32,
    pub ai_timeout_secs: u64,
    pub ai_rate_limit_per_minute: u32,

    /// Offset of the user's local time, used for calendar days.
    pub utc_offset_minutes: i32,

    pub media: MediaLimits,
}

#[derive(Debug, Clone, Copy)]
pub struct MediaLimits {
    pub max_image_dimension: u32,
    pub max_avatar_dimension: u32,
    pub max_voice_bytes: usize,
    /// Largest image accepted before downscaling, in decoded bytes.
    pub max_image_bytes: usize,
}

impl MediaLimits {
    /// Request body cap for routes that carry media: one image and one voice
    /// note as base64 data URLs plus room for the rest of the JSON.
    pub fn body_limit(&self) -> usize {
        const JSON_OVERHEAD: usize = 64 * 1024;
        base64_len(self.max_image_bytes) + base64_len(self.max_voice_bytes) + JSON_OVERHEAD
    }
}

fn base64_len(decoded: usize) -> usize {
    decoded.div_ceil(3) * 4
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            max_image_dimension: 800,
            max_avatar_dimension: AVATAR_DIMENSION,
            max_voice_bytes: 2 * 1024 * 1024,
            max_image_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://moodlog.db?mode=rwc".into(),
            storage_quota_bytes: Some(5 * 1024 * 1024),
            host: "0.0.0.0".into(),
            port: 8080,
            frontend_url: "http://localhost:3000".into(),
            cors_extra_origins: Vec::new(),

            ai_api_key: String::new(),
            ai_base_url: "https://ark.cn-beijing.volces.com/api/v3/chat/completions".into(),
            ai_model: "doubao-lite-4k".into(),
            ai_temperature: 0.8,
            ai_timeout_secs: 30,
            ai_rate_limit_per_minute: 20,

            utc_offset_minutes: 0,

            media: MediaLimits::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let quota: u64 = parse_var("STORAGE_QUOTA_BYTES", defaults.storage_quota_bytes.unwrap_or(0))?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            storage_quota_bytes: (quota > 0).then_some(quota),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            frontend_url: env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),

            ai_api_key: env::var("DOUBAO_API_KEY").unwrap_or_default(),
            ai_base_url: env::var("AI_BASE_URL").unwrap_or(defaults.ai_base_url),
            ai_model: env::var("AI_MODEL").unwrap_or(defaults.ai_model),
            ai_temperature: parse_var("AI_TEMPERATURE", defaults.ai_temperature)?,
            ai_timeout_secs: parse_var("AI_TIMEOUT_SECS", defaults.ai_timeout_secs)?,
            ai_rate_limit_per_minute: parse_var(
                "AI_RATE_LIMIT_PER_MINUTE",
                defaults.ai_rate_limit_per_minute,
            )?,

            utc_offset_minutes: parse_var("UTC_OFFSET_MINUTES", defaults.utc_offset_minutes)?,

            media: MediaLimits {
                max_image_dimension: parse_var(
                    "MAX_IMAGE_DIMENSION",
                    defaults.media.max_image_dimension,
                )?,
                max_avatar_dimension: defaults.media.max_avatar_dimension,
                max_voice_bytes: parse_var("MAX_VOICE_BYTES", defaults.media.max_voice_bytes)?,
                max_image_bytes: parse_var("MAX_IMAGE_BYTES", defaults.media.max_image_bytes)?,
            },
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn utc_offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).with_context(|| {
            format!(
                "UTC_OFFSET_MINUTES out of range: {}",
                self.utc_offset_minutes
            )
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a valid number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
