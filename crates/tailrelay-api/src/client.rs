// Web UI backend HTTP client
//
// Thin wrapper around `reqwest::Client` that knows the backend's paths,
// its plain-text error bodies, and its habit of encoding empty lists as
// `null`. Every method is one request; retries and state live upstream.

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{
    LevelResponse, LogLevel, LogSnapshot, Proxy, ProxyForm, Relay, RelayStatus, SetLevelRequest,
    TailscaleStatus, ToggleProxyRequest,
};
use crate::stream::{self, EventStream};
use crate::transport::TransportConfig;

const CERT_MIME: &str = "application/x-x509-ca-cert";

/// HTTP client for the tailrelay web UI.
///
/// Holds two `reqwest::Client`s built from the same [`TransportConfig`]:
/// one with the request timeout for REST calls and one without it for the
/// long-lived log stream.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    stream_http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client rooted at `base_url` (e.g. `http://tailrelay:8021`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            stream_http: transport.build_stream_client()?,
            base_url,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            stream_http: http.clone(),
            http,
            base_url,
        }
    }

    /// The dashboard base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{base}/api/{path}`, keeping any path prefix on the base URL.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let full = format!("{}/api/{}", self.base_url.as_str().trim_end_matches('/'), path);
        Ok(Url::parse(&full)?)
    }

    /// `{base}/api/{path}?id={id}` with the id percent-encoded.
    fn id_url(&self, path: &str, id: &str) -> Result<Url, Error> {
        let mut url = self.api_url(path)?;
        url.query_pairs_mut().append_pair("id", id);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        parse_json(resp).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        parse_json(resp).await
    }

    /// POST a JSON body where only the status matters.
    async fn post_ack(&self, url: Url, body: &impl Serialize) -> Result<(), Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        check_status(resp).await.map(drop)
    }

    /// POST with no body (id travels in the query string).
    async fn post_empty(&self, url: Url) -> Result<(), Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).send().await?;
        check_status(resp).await.map(drop)
    }

    async fn post_form(&self, url: Url, form: Form) -> Result<(), Error> {
        debug!("POST {} (multipart)", url);
        let resp = self.http.post(url).multipart(form).send().await?;
        check_status(resp).await.map(drop)
    }

    // ── Listing ──────────────────────────────────────────────────────

    pub async fn list_relays(&self) -> Result<Vec<RelayStatus>, Error> {
        let relays: Option<Vec<RelayStatus>> = self.get(self.api_url("socat/relays")?).await?;
        Ok(relays.unwrap_or_default())
    }

    pub async fn list_proxies(&self) -> Result<Vec<Proxy>, Error> {
        let proxies: Option<Vec<Proxy>> = self.get(self.api_url("caddy/proxies")?).await?;
        Ok(proxies.unwrap_or_default())
    }

    pub async fn tailscale_status(&self) -> Result<TailscaleStatus, Error> {
        self.get(self.api_url("tailscale/status")?).await
    }

    // ── Relay commands ───────────────────────────────────────────────

    pub async fn start_relay(&self, id: &str) -> Result<(), Error> {
        self.post_empty(self.id_url("socat/start", id)?).await
    }

    pub async fn stop_relay(&self, id: &str) -> Result<(), Error> {
        self.post_empty(self.id_url("socat/stop", id)?).await
    }

    pub async fn create_relay(&self, relay: &Relay) -> Result<(), Error> {
        self.post_ack(self.api_url("socat/create")?, relay).await
    }

    /// Full-record replace.
    pub async fn update_relay(&self, relay: &Relay) -> Result<(), Error> {
        self.post_ack(self.api_url("socat/update")?, relay).await
    }

    pub async fn delete_relay(&self, id: &str) -> Result<(), Error> {
        self.post_empty(self.id_url("socat/delete", id)?).await
    }

    // ── Proxy commands ───────────────────────────────────────────────

    pub async fn toggle_proxy(&self, id: &str, enabled: bool) -> Result<(), Error> {
        let body = ToggleProxyRequest { id, enabled };
        self.post_ack(self.api_url("caddy/toggle")?, &body).await
    }

    pub async fn create_proxy(&self, form: ProxyForm) -> Result<(), Error> {
        self.post_form(self.api_url("caddy/create")?, proxy_multipart(form)?)
            .await
    }

    pub async fn update_proxy(&self, form: ProxyForm) -> Result<(), Error> {
        self.post_form(self.api_url("caddy/update")?, proxy_multipart(form)?)
            .await
    }

    /// Full-record replace as JSON, used for single-field changes that
    /// carry no certificate.
    pub async fn replace_proxy(&self, proxy: &Proxy) -> Result<(), Error> {
        self.post_ack(self.api_url("caddy/update")?, proxy).await
    }

    pub async fn delete_proxy(&self, id: &str) -> Result<(), Error> {
        self.post_empty(self.id_url("caddy/delete", id)?).await
    }

    // ── Logs ─────────────────────────────────────────────────────────

    pub async fn log_snapshot(&self) -> Result<LogSnapshot, Error> {
        self.get(self.api_url("logs")?).await
    }

    pub async fn set_log_level(&self, level: LogLevel) -> Result<LevelResponse, Error> {
        self.post_json(self.api_url("logs/level")?, &SetLevelRequest { level })
            .await
    }

    /// Open the log push stream. Resolves once response headers arrive.
    pub async fn open_log_stream(&self) -> Result<EventStream, Error> {
        let url = self.api_url("logs/stream")?;
        debug!("GET {} (stream)", url);
        let resp = self
            .stream_http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(stream::events(resp))
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Map a non-2xx response to [`Error::Http`], passing 2xx through.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::from_status(status, &body))
}

async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let body = check_status(resp).await?.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

fn proxy_multipart(form: ProxyForm) -> Result<Form, Error> {
    let flag = |b: bool| if b { "true" } else { "false" };

    let mut multipart = Form::new()
        .text("hostname", form.hostname)
        .text("target", form.target)
        .text("port", form.port.to_string())
        .text("trusted_proxies", flag(form.trusted_proxies))
        .text("autostart", flag(form.autostart))
        .text("enabled", flag(form.enabled));

    if let Some(id) = form.id {
        multipart = multipart.text("id", id);
    }
    if let Some(cert) = form.tls_cert {
        let part = Part::stream(cert.contents)
            .file_name(cert.file_name)
            .mime_str(CERT_MIME)
            .map_err(|e| Error::Upload(e.to_string()))?;
        multipart = multipart.part("tls_cert_upload", part);
    }
    if form.remove_tls_cert {
        multipart = multipart.text("remove_tls_cert", "true");
    }
    Ok(multipart)
}
