// Hand-crafted async HTTP client for the platform REST API.
//
// Base path: /api/
// Auth: `X-Authorization: Bearer <jwt>` header

use std::future::Future;

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::auth::{AuthToken, Credentials};
use crate::error::{Error, error_code};
use crate::transport::TransportConfig;
use crate::types::{
    ChecksumAlgorithm, DeviceCredentials, DeviceKeyKind, DeviceProfile, DeviceProfileInfo,
    DeviceTransportType, Firmware, FirmwareDownload, FirmwareInfo, FirmwareType, ObjectLwM2M,
    PageData, PageLink, SecurityMode, ServerSecurityConfig, SortOrder,
};

// ── Error response shape from the platform ───────────────────────────

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_code: Option<u32>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the platform's device profile, LwM2M and firmware API.
///
/// Uses JWT authentication and communicates via JSON REST endpoints
/// under `/api/`.
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PlatformClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a pre-issued JWT and transport config.
    ///
    /// Injects `X-Authorization: Bearer <token>` as a default header on
    /// every request.
    pub fn from_token(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid token header value: {e}"),
            })?;
        auth_value.set_sensitive(true);
        headers.insert("X-Authorization", auth_value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Exchange username + password for a JWT, then build an authenticated client.
    pub async fn login(
        base_url: &str,
        username: &str,
        password: &SecretString,
        transport: &TransportConfig,
    ) -> Result<(Self, AuthToken), Error> {
        #[derive(Serialize)]
        struct Body<'a> {
            username: &'a str,
            password: &'a str,
        }

        let url = Self::normalize_base_url(base_url)?.join("api/auth/login")?;
        debug!("logging in at {url}");

        let resp = transport
            .build_client()?
            .post(url)
            .json(&Body {
                username,
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {message}"),
            });
        }

        let token: AuthToken = resp.json().await?;
        debug!("login successful");
        let client = Self::from_token(base_url, &token.token, transport)?;
        Ok((client, token))
    }

    /// Build an authenticated client from either credential flavour.
    pub async fn connect(
        base_url: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        match credentials {
            Credentials::Token(token) => Self::from_token(base_url, token, transport),
            Credentials::Password { username, password } => {
                let (client, _token) = Self::login(base_url, username, password, transport).await?;
                Ok(client)
            }
        }
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The platform base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ensure the base URL ends with `/` so relative joins keep any path prefix.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"api/deviceProfiles"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).send().await?;
        self.handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorResponse>(&raw).ok();
        let error_code = parsed.as_ref().and_then(|e| e.error_code);
        let message = parsed
            .and_then(|e| e.message)
            .unwrap_or_else(|| if raw.is_empty() { status.to_string() } else { raw });

        match status {
            reqwest::StatusCode::UNAUTHORIZED => {
                if error_code == Some(error_code::AUTHENTICATION) {
                    Error::Authentication { message }
                } else {
                    Error::SessionExpired
                }
            }
            reqwest::StatusCode::FORBIDDEN => Error::PermissionDenied { message },
            reqwest::StatusCode::TOO_MANY_REQUESTS => Error::RateLimited { message },
            _ => Error::Platform {
                status: status.as_u16(),
                message,
                error_code,
            },
        }
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Collect all pages into a single `Vec<T>`, following `hasNext`.
    pub async fn paginate_all<T, F, Fut>(&self, first: PageLink, fetch: F) -> Result<Vec<T>, Error>
    where
        F: Fn(PageLink) -> Fut,
        Fut: Future<Output = Result<PageData<T>, Error>>,
    {
        let mut all = Vec::new();
        let mut link = first;

        loop {
            let page = fetch(link.clone()).await?;
            let received = page.data.len();
            all.extend(page.data);

            if !page.has_next || received == 0 {
                break;
            }
            link = link.next_page();
        }

        Ok(all)
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Device profiles ──────────────────────────────────────────────

    pub async fn get_device_profiles(
        &self,
        page_link: &PageLink,
    ) -> Result<PageData<DeviceProfile>, Error> {
        self.get_with_params("api/deviceProfiles", &page_link.to_query())
            .await
    }

    pub async fn get_device_profile(&self, id: &Uuid) -> Result<DeviceProfile, Error> {
        self.get(&format!("api/deviceProfile/{id}")).await
    }

    pub async fn save_device_profile(&self, profile: &DeviceProfile) -> Result<DeviceProfile, Error> {
        self.post("api/deviceProfile", profile).await
    }

    pub async fn delete_device_profile(&self, id: &Uuid) -> Result<(), Error> {
        self.delete(&format!("api/deviceProfile/{id}")).await
    }

    pub async fn set_default_device_profile(&self, id: &Uuid) -> Result<DeviceProfile, Error> {
        self.post_empty(&format!("api/deviceProfile/{id}/default"))
            .await
    }

    pub async fn get_default_device_profile_info(&self) -> Result<DeviceProfileInfo, Error> {
        self.get("api/deviceProfileInfo/default").await
    }

    pub async fn get_device_profile_info(&self, id: &Uuid) -> Result<DeviceProfileInfo, Error> {
        self.get(&format!("api/deviceProfileInfo/{id}")).await
    }

    pub async fn get_device_profile_infos(
        &self,
        page_link: &PageLink,
        transport_type: Option<DeviceTransportType>,
    ) -> Result<PageData<DeviceProfileInfo>, Error> {
        let mut params = page_link.to_query();
        if let Some(transport) = transport_type {
            params.push(("transportType", transport.to_string()));
        }
        self.get_with_params("api/deviceProfileInfos", &params)
            .await
    }

    /// Attribute or timeseries key names seen on devices of a profile
    /// (or of all profiles when `profile_id` is `None`).
    pub async fn get_device_profile_devices_keys(
        &self,
        kind: DeviceKeyKind,
        profile_id: Option<&Uuid>,
    ) -> Result<Vec<String>, Error> {
        let path = format!("api/deviceProfile/devices/keys/{kind}");
        match profile_id {
            Some(id) => {
                self.get_with_params(&path, &[("deviceProfileId", id.to_string())])
                    .await
            }
            None => self.get(&path).await,
        }
    }

    // ── LwM2M ────────────────────────────────────────────────────────

    /// LwM2M object models, optionally filtered by object ids and search text.
    pub async fn get_lwm2m_objects(
        &self,
        sort_order: &SortOrder,
        object_ids: &[String],
        search_text: Option<&str>,
    ) -> Result<Vec<ObjectLwM2M>, Error> {
        let mut params = vec![
            ("sortProperty", sort_order.property.clone()),
            ("sortOrder", sort_order.direction.to_string()),
        ];
        if !object_ids.is_empty() {
            params.push(("objectIds", object_ids.join(",")));
        }
        if let Some(text) = search_text.filter(|t| !t.is_empty()) {
            params.push(("searchText", text.to_owned()));
        }
        self.get_with_params("api/resource/lwm2m/", &params).await
    }

    pub async fn get_lwm2m_objects_page(
        &self,
        page_link: &PageLink,
    ) -> Result<Vec<ObjectLwM2M>, Error> {
        self.get_with_params("api/resource/lwm2m/page", &page_link.to_query())
            .await
    }

    /// Server-side security defaults for a security mode and server role.
    pub async fn get_lwm2m_bootstrap_security_info(
        &self,
        security_mode: SecurityMode,
        bootstrap_server_is: bool,
    ) -> Result<ServerSecurityConfig, Error> {
        self.get(&format!(
            "api/lwm2m/deviceProfile/bootstrap/{security_mode}/{bootstrap_server_is}"
        ))
        .await
    }

    // ── Device credentials ───────────────────────────────────────────

    pub async fn get_device_credentials(&self, device_id: &Uuid) -> Result<DeviceCredentials, Error> {
        self.get(&format!("api/device/{device_id}/credentials"))
            .await
    }

    pub async fn save_device_credentials(
        &self,
        credentials: &DeviceCredentials,
    ) -> Result<DeviceCredentials, Error> {
        self.post("api/device/credentials", credentials).await
    }

    // ── Firmware ─────────────────────────────────────────────────────

    pub async fn get_firmwares(&self, page_link: &PageLink) -> Result<PageData<FirmwareInfo>, Error> {
        self.get_with_params("api/firmwares", &page_link.to_query())
            .await
    }

    /// Firmware of one type attached to a profile, filtered by payload presence.
    pub async fn get_firmwares_for_profile(
        &self,
        profile_id: &Uuid,
        firmware_type: FirmwareType,
        has_data: bool,
        page_link: &PageLink,
    ) -> Result<PageData<FirmwareInfo>, Error> {
        self.get_with_params(
            &format!("api/firmwares/{profile_id}/{firmware_type}/{has_data}"),
            &page_link.to_query(),
        )
        .await
    }

    pub async fn get_firmware(&self, id: &Uuid) -> Result<Firmware, Error> {
        self.get(&format!("api/firmware/{id}")).await
    }

    pub async fn get_firmware_info(&self, id: &Uuid) -> Result<FirmwareInfo, Error> {
        self.get(&format!("api/firmware/info/{id}")).await
    }

    pub async fn save_firmware_info(&self, info: &FirmwareInfo) -> Result<FirmwareInfo, Error> {
        self.post("api/firmware", info).await
    }

    /// Upload the binary for an existing firmware entry.
    ///
    /// Without a checksum algorithm the platform computes a SHA-256 itself.
    pub async fn upload_firmware_data(
        &self,
        id: &Uuid,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
        checksum: Option<(ChecksumAlgorithm, String)>,
    ) -> Result<Firmware, Error> {
        let url = self.url(&format!("api/firmware/{id}"))?;
        debug!("POST {url} (multipart, {} bytes)", data.len());

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name.to_owned())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut params = Vec::new();
        if let Some((algorithm, value)) = checksum {
            params.push(("checksumAlgorithm", algorithm.to_string()));
            params.push(("checksum", value));
        }

        let resp = self
            .http
            .post(url)
            .query(&params)
            .multipart(form)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    pub async fn delete_firmware(&self, id: &Uuid) -> Result<(), Error> {
        self.delete(&format!("api/firmware/{id}")).await
    }

    /// Download the raw firmware binary.
    pub async fn download_firmware(&self, id: &Uuid) -> Result<FirmwareDownload, Error> {
        let url = self.url(&format!("api/firmware/{id}/download"))?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(self.parse_error(status, resp).await);
        }

        let headers = resp.headers();
        let file_name = header_str(headers, "x-filename")
            .or_else(|| header_str(headers, CONTENT_DISPOSITION.as_str()).and_then(filename_from_disposition));
        let content_type = header_str(headers, CONTENT_TYPE.as_str());
        let data = resp.bytes().await?;

        Ok(FirmwareDownload {
            file_name,
            content_type,
            data,
        })
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Pull `filename=` out of `attachment;filename=fw.bin`.
fn filename_from_disposition(value: String) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_owned())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = PlatformClient::from_reqwest("https://iot.example.com/tb", reqwest::Client::new())
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://iot.example.com/tb/");
        assert_eq!(
            client.url("api/firmwares").unwrap().as_str(),
            "https://iot.example.com/tb/api/firmwares"
        );
    }

    #[test]
    fn disposition_filename() {
        assert_eq!(
            filename_from_disposition("attachment;filename=fw-1.2.bin".into()).as_deref(),
            Some("fw-1.2.bin")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=\"a b.bin\"".into()).as_deref(),
            Some("a b.bin")
        );
        assert_eq!(filename_from_disposition("inline".into()), None);
    }
}
