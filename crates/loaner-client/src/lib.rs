// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use loaner_app::{
    CheckinForm, DeviceBackend, DeviceId, DeviceListing, Lendee, Location, ProposalReply,
    ProposalResponse,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const CSRF_HEADER: &str = "x-csrftoken";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub session_id: Option<String>,
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let base_url = parse_base_url(&options.base_url)?;
        let http = HttpClient::builder()
            .timeout(options.timeout)
            .default_headers(session_headers(options)?)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout: options.timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn location_url(&self, location: Location) -> Result<Url> {
        self.endpoint(&location.path())
    }

    pub fn list_devices(&self) -> Result<DeviceListing> {
        let response = self.send(
            self.http
                .get(self.endpoint("/devices/")?)
                .header(ACCEPT, "application/json"),
        )?;
        response.json().context("decode device listing")
    }

    pub fn propose_checkout(&self, device: DeviceId, lendee: &Lendee) -> Result<ProposalReply> {
        let response = self.send(
            self.http
                .post(self.endpoint(&format!("/devices/{device}/checkout/"))?)
                .form(&[("lendee", lendee.as_str())]),
        )?;
        let parsed: ProposalResponse = response.json().context("decode checkout proposal")?;
        if let Some(created) = parsed.created_subject {
            debug!(device = device.get(), created_subject = created, "subject resolved");
        }
        parsed
            .into_reply()
            .ok_or_else(|| anyhow!("checkout proposal carried neither a name nor an error"))
    }

    pub fn commit_checkout(&self, device: DeviceId, lendee: &Lendee) -> Result<()> {
        self.send(
            self.http
                .post(self.endpoint(&format!("/devices/{device}/checkout/confirm"))?)
                .form(&[("lendee", lendee.as_str())]),
        )?;
        Ok(())
    }

    pub fn submit_checkin(&self, device: DeviceId, form: &CheckinForm) -> Result<()> {
        self.send(
            self.http
                .post(self.endpoint(&Location::CheckIn(device).path())?)
                .form(&[
                    ("condition", form.condition.as_str()),
                    ("comment", form.comment.as_str()),
                ]),
        )?;
        Ok(())
    }

    pub fn delete_device(&self, device: DeviceId) -> Result<()> {
        self.send(
            self.http
                .post(self.endpoint(&format!("/devices/{device}/delete/"))?),
        )?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("build URL for {path}"))
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build().context("build request")?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending request");

        let response = self
            .http
            .execute(request)
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body))
                .with_context(|| format!("{method} {}", url.path()));
        }
        Ok(response)
    }
}

impl DeviceBackend for Client {
    fn list_devices(&mut self) -> Result<DeviceListing> {
        Client::list_devices(self)
    }

    fn propose_checkout(&mut self, device: DeviceId, lendee: &Lendee) -> Result<ProposalReply> {
        Client::propose_checkout(self, device, lendee)
    }

    fn commit_checkout(&mut self, device: DeviceId, lendee: &Lendee) -> Result<()> {
        Client::commit_checkout(self, device, lendee)
    }

    fn submit_checkin(&mut self, device: DeviceId, form: &CheckinForm) -> Result<()> {
        Client::submit_checkin(self, device, form)
    }

    fn delete_device(&mut self, device: DeviceId) -> Result<()> {
        Client::delete_device(self, device)
    }
}

// Trailing slash keeps any path prefix across relative joins.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("server.base_url must not be empty");
    }
    let mut url = Url::parse(trimmed).with_context(|| format!("parse server URL {trimmed:?}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!(
            "server.base_url must use http or https, got {:?}",
            url.scheme()
        );
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn session_headers(options: &ClientOptions) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut cookies = Vec::new();
    if let Some(session_id) = &options.session_id {
        cookies.push(format!("sessionid={session_id}"));
    }
    if let Some(token) = &options.csrf_token {
        cookies.push(format!("csrftoken={token}"));
        headers.insert(
            HeaderName::from_static(CSRF_HEADER),
            HeaderValue::from_str(token).context("server.csrf_token is not a valid header value")?,
        );
    }
    if !cookies.is_empty() {
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookies.join("; "))
                .context("server session cookie is not a valid header value")?,
        );
    }
    Ok(headers)
}

fn connection_error(base_url: &Url, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("{base_url} did not answer in time -- raise [server].timeout ({error})");
    }
    anyhow!("cannot reach {base_url} -- check [server].base_url and that the server is running ({error})")
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error);
    }

    if body.len() < 100 && !body.contains('<') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::{ClientOptions, clean_error_response, parse_base_url, session_headers};
    use anyhow::Result;
    use reqwest::StatusCode;
    use std::time::Duration;

    fn options() -> ClientOptions {
        ClientOptions {
            base_url: "http://localhost:8000".to_owned(),
            timeout: Duration::from_secs(1),
            session_id: None,
            csrf_token: None,
        }
    }

    #[test]
    fn base_url_gains_trailing_slash() -> Result<()> {
        assert_eq!(
            parse_base_url("http://localhost:8000")?.as_str(),
            "http://localhost:8000/"
        );
        assert_eq!(
            parse_base_url("https://example.org/inventory")?.as_str(),
            "https://example.org/inventory/"
        );
        Ok(())
    }

    #[test]
    fn base_url_rejects_non_http_schemes() {
        let error = parse_base_url("ftp://example.org").expect_err("ftp is not supported");
        assert!(error.to_string().contains("http or https"));
        assert!(parse_base_url("  ").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn session_headers_carry_cookie_and_csrf_token() -> Result<()> {
        assert!(session_headers(&options())?.is_empty());

        let headers = session_headers(&ClientOptions {
            session_id: Some("abc".to_owned()),
            csrf_token: Some("tok".to_owned()),
            ..options()
        })?;
        assert_eq!(headers["cookie"], "sessionid=abc; csrftoken=tok");
        assert_eq!(headers["x-csrftoken"], "tok");
        Ok(())
    }

    #[test]
    fn error_response_prefers_json_error_field() {
        let error = clean_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Invalid subject ID. Please try again."}"#,
        );
        assert_eq!(
            error.to_string(),
            "server error (400): Invalid subject ID. Please try again."
        );

        let error = clean_error_response(StatusCode::FORBIDDEN, "<html>CSRF verification failed</html>");
        assert_eq!(error.to_string(), "server returned 403");

        let error = clean_error_response(StatusCode::NOT_FOUND, "no such device\n");
        assert_eq!(error.to_string(), "server error (404): no such device");
    }
}
