#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devprof_core::{
    AuthCredentials, Controller, ControllerConfig, CoreError, CredentialsModel,
    DeviceCredentialsType, SecurityConfigModel, SecurityMode,
};

async fn setup() -> (MockServer, Controller) {
    let server = MockServer::start().await;
    let url: Url = server.uri().parse().unwrap();
    let config = ControllerConfig::new(url, AuthCredentials::Token(SecretString::from("jwt")));
    let controller = Controller::connect(config).await.unwrap();
    (server, controller)
}

fn profile(name: &str) -> serde_json::Value {
    json!({
        "id": {"entityType": "DEVICE_PROFILE", "id": Uuid::new_v4()},
        "name": name,
        "type": "DEFAULT",
        "transportType": "LWM2M",
        "profileData": {}
    })
}

#[tokio::test]
async fn test_device_profiles_walks_all_pages() {
    let (server, controller) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/deviceProfiles"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [profile("first")],
            "totalPages": 2,
            "totalElements": 2,
            "hasNext": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/deviceProfiles"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [profile("second")],
            "totalPages": 2,
            "totalElements": 2,
            "hasNext": false
        })))
        .mount(&server)
        .await;

    let profiles = controller.device_profiles(None, None).await.unwrap();
    let names: Vec<_> = profiles.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["first", "second"]);
}

#[tokio::test]
async fn test_missing_profile_names_the_entity() {
    let (server, controller) = setup().await;
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

    let err = controller.device_profile(&id).await.unwrap_err();
    match err {
        CoreError::NotFound {
            entity_type,
            identifier,
        } => {
            assert_eq!(entity_type, "device profile");
            assert_eq!(identifier, id.to_string());
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_credentials_are_not_sent() {
    let (server, controller) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/device/credentials"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let model = CredentialsModel::new(DeviceCredentialsType::AccessToken);
    let err = controller.save_device_credentials(&model).await.unwrap_err();
    match err {
        CoreError::Invalid { errors } => assert!(errors.has("credentialsId", "required")),
        other => panic!("expected Invalid, got {other:?}"),
    }
}

#[tokio::test]
async fn test_mqtt_credentials_load_into_model() {
    let (server, controller) = setup().await;
    let device_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/api/device/{device_id}/credentials")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceId": {"entityType": "DEVICE", "id": device_id},
            "credentialsType": "MQTT_BASIC",
            "credentialsId": "ignored",
            "credentialsValue": "{\"clientId\":\"dev1\",\"userName\":\"u\",\"password\":\"p\"}"
        })))
        .mount(&server)
        .await;

    let model = controller.device_credentials(&device_id).await.unwrap();
    assert_eq!(model.credentials_type(), DeviceCredentialsType::MqttBasic);
    let basic = model.mqtt_basic().unwrap();
    assert_eq!(basic.client_id.as_deref(), Some("dev1"));
    assert!(model.user_name_required());
    assert!(model.is_valid());
}

#[tokio::test]
async fn test_security_mode_change_pulls_platform_defaults() {
    let (server, controller) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/lwm2m/deviceProfile/bootstrap/PSK/true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "host": "0.0.0.0",
            "port": 5688,
            "bootstrapServerIs": true,
            "securityMode": "PSK",
            "serverPublicKey": "",
            "clientHoldOffTime": 1,
            "serverId": 111,
            "bootstrapServerAccountTimeout": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = controller.config().url.clone();
    let mut model = SecurityConfigModel::initialize(true, true, &url);
    assert_eq!(model.value().host, "127.0.0.1");

    let merged = model
        .change_security_mode(&controller, SecurityMode::Psk)
        .await
        .unwrap();
    assert!(merged);
    assert_eq!(model.value().port, Some(5688));
    assert_eq!(model.value().server_id, Some(111));
    assert_eq!(model.value().security_mode, SecurityMode::Psk);
    assert!(model.is_valid());
}
