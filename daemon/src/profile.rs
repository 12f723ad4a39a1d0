/// Remote profile lookup for the logged-in player.
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::extract::{parse_global_context, USERNAME_POINTER};
use crate::session::NOT_LOGGED_IN;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Pointer to the id of the server the player is currently on.
const CURRENT_SERVER_POINTER: &str = "/session/playingOn/serverGuid";

/// Where the player currently is, as far as the profile page knows.
///
/// Both fields absent means "not in a known session", which is an ordinary
/// result (signed out, page changed, network down).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlayerStatus {
    pub username: Option<String>,
    pub current_server_id: Option<String>,
}

impl PlayerStatus {
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Reads the player status out of a profile page body.
    pub fn from_profile_page(body: &str) -> Self {
        let Some(ctx) = parse_global_context(body) else {
            return Self::unknown();
        };
        let Some(username) = string_at(&ctx, USERNAME_POINTER) else {
            return Self::unknown();
        };
        Self {
            username: Some(username),
            current_server_id: string_at(&ctx, CURRENT_SERVER_POINTER),
        }
    }
}

fn string_at(ctx: &Value, pointer: &str) -> Option<String> {
    ctx.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Queries the profile endpoint with a shared HTTP client.
pub struct ProfileClient {
    client: Client,
    url: String,
}

impl ProfileClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }

    /// Fetches the profile page and extracts the player status.
    ///
    /// Skips the request entirely when nobody is logged in. Network, status and
    /// body failures all resolve to [`PlayerStatus::unknown`].
    pub async fn player_status(&self, logged_in_user: &str) -> PlayerStatus {
        if logged_in_user == NOT_LOGGED_IN {
            return PlayerStatus::unknown();
        }

        let response = self
            .client
            .get(&self.url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status());
        let body = match response {
            Ok(r) => r.text().await,
            Err(e) => Err(e),
        };

        match body {
            Ok(body) => PlayerStatus::from_profile_page(&body),
            Err(e) => {
                debug!("profile query failed: {e}");
                PlayerStatus::unknown()
            }
        }
    }
}
