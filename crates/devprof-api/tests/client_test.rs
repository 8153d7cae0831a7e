#![allow(clippy::unwrap_used)]
// Integration tests for `PlatformClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devprof_api::types::{
    DeviceCredentialsType, DeviceKeyKind, DeviceTransportType, Direction, PageLink, SecurityMode,
    SortOrder,
};
use devprof_api::{Error, PlatformClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

const PROFILE_ID: &str = "784f394c-42b6-435a-983c-b7beff2784f9";

async fn setup() -> (MockServer, PlatformClient) {
    let server = MockServer::start().await;
    let token: SecretString = "test-jwt".to_string().into();
    let client =
        PlatformClient::from_token(&server.uri(), &token, &TransportConfig::default()).unwrap();
    (server, client)
}

fn profile_json(name: &str) -> serde_json::Value {
    json!({
        "id": { "entityType": "DEVICE_PROFILE", "id": PROFILE_ID },
        "createdTime": 1_617_000_000_000_i64,
        "name": name,
        "description": null,
        "default": false,
        "type": "DEFAULT",
        "transportType": "LWM2M",
        "provisionType": "DISABLED",
        "profileData": { "configuration": { "type": "DEFAULT" } },
        "image": null
    })
}

fn page(data: serde_json::Value, has_next: bool) -> serde_json::Value {
    let count = data.as_array().map_or(0, Vec::len);
    json!({
        "data": data,
        "totalPages": if has_next { 2 } else { 1 },
        "totalElements": count,
        "hasNext": has_next
    })
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_header_is_sent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/deviceProfileInfo/default"))
        .and(header("X-Authorization", "Bearer test-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": { "entityType": "DEVICE_PROFILE", "id": PROFILE_ID },
            "name": "default",
            "type": "DEFAULT",
            "transportType": "DEFAULT"
        })))
        .mount(&server)
        .await;

    let info = client.get_default_device_profile_info().await.unwrap();
    assert_eq!(info.name, "default");
    assert_eq!(info.transport_type, DeviceTransportType::Default);
}

#[tokio::test]
async fn test_login_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "username": "tenant@example.com", "password": "secret" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "jwt-1", "refreshToken": "refresh-1" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/deviceProfile/devices/keys/attributes"))
        .and(header("X-Authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["fw_version"])))
        .mount(&server)
        .await;

    let password: SecretString = "secret".to_string().into();
    let (client, token) = PlatformClient::login(
        &server.uri(),
        "tenant@example.com",
        &password,
        &TransportConfig::default(),
    )
    .await
    .unwrap();

    assert!(token.refresh_token.is_some());
    let keys = client
        .get_device_profile_devices_keys(DeviceKeyKind::Attributes, None)
        .await
        .unwrap();
    assert_eq!(keys, vec!["fw_version".to_owned()]);
}

#[tokio::test]
async fn test_login_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": 401,
            "message": "Invalid username or password",
            "errorCode": 10
        })))
        .mount(&server)
        .await;

    let password: SecretString = "wrong".to_string().into();
    let result =
        PlatformClient::login(&server.uri(), "x", &password, &TransportConfig::default()).await;

    match result {
        Err(Error::Authentication { message }) => {
            assert!(message.contains("Invalid username or password"), "{message}");
        }
        Err(other) => panic!("expected Authentication error, got: {other:?}"),
        Ok(_) => panic!("expected Authentication error, got a client"),
    }
}

#[tokio::test]
async fn test_expired_token_maps_to_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/firmwares"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": 401,
            "message": "Token has expired",
            "errorCode": 11
        })))
        .mount(&server)
        .await;

    let result = client.get_firmwares(&PageLink::default()).await;
    assert!(
        matches!(result, Err(Error::SessionExpired)),
        "expected SessionExpired, got: {result:?}"
    );
}

// ── Device profiles ─────────────────────────────────────────────────

#[tokio::test]
async fn test_list_device_profiles_with_page_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/deviceProfiles"))
        .and(query_param("pageSize", "10"))
        .and(query_param("page", "0"))
        .and(query_param("sortProperty", "name"))
        .and(query_param("sortOrder", "ASC"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(json!([profile_json("lwm2m")]), false)),
        )
        .mount(&server)
        .await;

    let link = PageLink::new(10, 0).with_sort(SortOrder::new("name", Direction::Asc));
    let profiles = client.get_device_profiles(&link).await.unwrap();

    assert_eq!(profiles.data.len(), 1);
    assert_eq!(profiles.data[0].name, "lwm2m");
    assert_eq!(profiles.data[0].transport_type, DeviceTransportType::Lwm2m);
    assert!(profiles.data[0].extra.contains_key("image"));
}

#[tokio::test]
async fn test_profile_infos_with_transport_filter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/deviceProfileInfos"))
        .and(query_param("transportType", "MQTT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), false)))
        .mount(&server)
        .await;

    let infos = client
        .get_device_profile_infos(&PageLink::default(), Some(DeviceTransportType::Mqtt))
        .await
        .unwrap();
    assert!(infos.data.is_empty());
}

#[tokio::test]
async fn test_save_set_default_and_delete_profile() {
    let (server, client) = setup().await;
    let id = Uuid::parse_str(PROFILE_ID).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/deviceProfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json("saved")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/api/deviceProfile/{PROFILE_ID}/default")))
        .respond_with(ResponseTemplate::new(200).set_body_json({
            let mut p = profile_json("saved");
            p["default"] = json!(true);
            p
        }))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("/api/deviceProfile/{PROFILE_ID}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let draft: devprof_api::types::DeviceProfile =
        serde_json::from_value(profile_json("draft")).unwrap();
    let saved = client.save_device_profile(&draft).await.unwrap();
    assert_eq!(saved.name, "saved");

    let default = client.set_default_device_profile(&id).await.unwrap();
    assert!(default.default);

    client.delete_device_profile(&id).await.unwrap();
}

#[tokio::test]
async fn test_timeseries_keys_scoped_to_profile() {
    let (server, client) = setup().await;
    let id = Uuid::parse_str(PROFILE_ID).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/deviceProfile/devices/keys/timeseries"))
        .and(query_param("deviceProfileId", PROFILE_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["temperature", "rssi"])))
        .mount(&server)
        .await;

    let keys = client
        .get_device_profile_devices_keys(DeviceKeyKind::Timeseries, Some(&id))
        .await
        .unwrap();
    assert_eq!(keys.len(), 2);
}

#[tokio::test]
async fn test_not_found_error_body() {
    let (server, client) = setup().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/api/deviceProfile/{id}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": 404,
            "message": "Requested item wasn't found!",
            "errorCode": 32
        })))
        .mount(&server)
        .await;

    let err = client.get_device_profile(&id).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.platform_error_code(), Some(32));
}

// ── LwM2M ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bootstrap_security_info_path() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/lwm2m/deviceProfile/bootstrap/RPK/true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "host": "0.0.0.0",
            "port": 5688,
            "bootstrapServerIs": true,
            "securityMode": "RPK",
            "serverPublicKey": "3059",
            "clientHoldOffTime": 1,
            "serverId": 111,
            "bootstrapServerAccountTimeout": 0
        })))
        .mount(&server)
        .await;

    let cfg = client
        .get_lwm2m_bootstrap_security_info(SecurityMode::Rpk, true)
        .await
        .unwrap();
    assert_eq!(cfg.port, Some(5688));
    assert_eq!(cfg.server_id, Some(111));
    assert_eq!(cfg.security_mode, SecurityMode::Rpk);
}

#[tokio::test]
async fn test_lwm2m_objects_filters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/resource/lwm2m/"))
        .and(query_param("sortProperty", "id"))
        .and(query_param("sortOrder", "ASC"))
        .and(query_param("objectIds", "3_1.0,5_1.0"))
        .and(query_param_is_missing("searchText"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "keyId": "3_1.0", "name": "Device", "multiple": false, "mandatory": true, "instances": [] },
            { "id": 5, "keyId": "5_1.0", "name": "Firmware Update", "multiple": false, "mandatory": false, "instances": [] }
        ])))
        .mount(&server)
        .await;

    let objects = client
        .get_lwm2m_objects(
            &SortOrder::new("id", Direction::Asc),
            &["3_1.0".to_owned(), "5_1.0".to_owned()],
            Some(""),
        )
        .await
        .unwrap();
    assert_eq!(objects.len(), 2);
    assert!(objects[0].mandatory);
    assert_eq!(objects[1].key_id, "5_1.0");
}

#[tokio::test]
async fn test_lwm2m_objects_single_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/resource/lwm2m/page"))
        .and(query_param("pageSize", "2"))
        .and(query_param("page", "1"))
        .and(query_param("textSearch", "firm"))
        .and(query_param("sortProperty", "name"))
        .and(query_param("sortOrder", "DESC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 5, "keyId": "5_1.0", "name": "Firmware Update", "multiple": false, "mandatory": false, "instances": [] }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let link = PageLink::new(2, 1)
        .with_text_search("firm")
        .with_sort(SortOrder::new("name", Direction::Desc));
    let objects = client.get_lwm2m_objects_page(&link).await.unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].name, "Firmware Update");
}

// ── Device credentials ──────────────────────────────────────────────

#[tokio::test]
async fn test_device_credentials_round_trip() {
    let (server, client) = setup().await;
    let device_id = Uuid::new_v4();

    let body = json!({
        "credentialsType": "MQTT_BASIC",
        "credentialsId": null,
        "credentialsValue": "{\"clientId\":\"abc123\",\"userName\":null,\"password\":null}"
    });

    Mock::given(method("GET"))
        .and(path(format!("/api/device/{device_id}/credentials")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/device/credentials"))
        .and(body_json(&body))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let creds = client.get_device_credentials(&device_id).await.unwrap();
    assert_eq!(creds.credentials_type, DeviceCredentialsType::MqttBasic);
    let saved = client.save_device_credentials(&creds).await.unwrap();
    assert_eq!(saved, creds);
}

// ── Firmware ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_paginate_all_firmwares() {
    let (server, client) = setup().await;

    let fw = |title: &str| json!({ "type": "FIRMWARE", "title": title, "version": "1.0", "hasData": true });

    Mock::given(method("GET"))
        .and(path("/api/firmwares"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([fw("a"), fw("b")]), true)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/firmwares"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([fw("c")]), false)))
        .mount(&server)
        .await;

    let all = client
        .paginate_all(PageLink::new(2, 0), |link| {
            let client = &client;
            async move { client.get_firmwares(&link).await }
        })
        .await
        .unwrap();

    let titles: Vec<_> = all.iter().filter_map(|f| f.title.as_deref()).collect();
    assert_eq!(titles, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_download_firmware() {
    let (server, client) = setup().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/api/firmware/{id}/download")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-filename", "fw-2.0.bin")
                .insert_header("content-type", "application/octet-stream")
                .set_body_bytes(vec![0xde, 0xad, 0xbe, 0xef]),
        )
        .mount(&server)
        .await;

    let download = client.download_firmware(&id).await.unwrap();
    assert_eq!(download.file_name.as_deref(), Some("fw-2.0.bin"));
    assert_eq!(download.data.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
}

#[tokio::test]
async fn test_upload_firmware_passes_checksum() {
    let (server, client) = setup().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path(format!("/api/firmware/{id}")))
        .and(query_param("checksumAlgorithm", "md5"))
        .and(query_param("checksum", "d41d8cd98f00b204e9800998ecf8427e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "FIRMWARE",
            "title": "fw",
            "hasData": true,
            "fileName": "fw.bin",
            "dataSize": 3,
            "data": "AQID"
        })))
        .mount(&server)
        .await;

    let saved = client
        .upload_firmware_data(
            &id,
            "fw.bin",
            "application/octet-stream",
            vec![1, 2, 3],
            Some((
                devprof_api::types::ChecksumAlgorithm::Md5,
                "d41d8cd98f00b204e9800998ecf8427e".to_owned(),
            )),
        )
        .await
        .unwrap();
    assert_eq!(saved.info.data_size, Some(3));
}

#[tokio::test]
async fn test_delete_firmware_forbidden() {
    let (server, client) = setup().await;
    let id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path(format!("/api/firmware/{id}")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "status": 403,
            "message": "You don't have permission to perform this operation!",
            "errorCode": 20
        })))
        .mount(&server)
        .await;

    let result = client.delete_firmware(&id).await;
    assert!(
        matches!(result, Err(Error::PermissionDenied { .. })),
        "expected PermissionDenied, got: {result:?}"
    );
}

#[tokio::test]
async fn test_rate_limited_request_is_not_repeated() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/deviceProfileInfo/default"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "status": 429,
            "message": "Too many requests for current tenant!",
            "errorCode": 33
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.get_default_device_profile_info().await;
    assert!(
        matches!(result, Err(Error::RateLimited { .. })),
        "expected RateLimited, got: {result:?}"
    );
}
