use serde::Deserialize;

/// Identity claims extracted from a verified Google ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleIdentity {
    /// Stable subject id of the Google account.
    pub sub: String,
    #[serde(default)]
    pub aud: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

/// Verifies Google ID tokens against the tokeninfo endpoint, which checks
/// the signature and expiration server-side. The audience is checked here.
/// Transport errors are verification failures (fail-closed).
#[derive(Clone)]
pub struct GoogleVerifier {
    client: reqwest::Client,
    url: String,
    client_id: Option<String>,
}

impl GoogleVerifier {
    pub fn new(url: String, client_id: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            client_id,
        }
    }

    pub async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, String> {
        let Some(client_id) = &self.client_id else {
            return Err("Google sign-in is not configured".to_string());
        };

        let resp = self
            .client
            .get(&self.url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("google tokeninfo error: {e}");
                "Google token verification failed".to_string()
            })?;

        if !resp.status().is_success() {
            return Err("Invalid Google ID token".to_string());
        }

        let identity: GoogleIdentity = resp.json().await.map_err(|e| {
            tracing::warn!("google tokeninfo parse error: {e}");
            "Google token verification failed".to_string()
        })?;

        if &identity.aud != client_id {
            return Err("Google ID token has wrong audience".to_string());
        }

        Ok(identity)
    }
}
