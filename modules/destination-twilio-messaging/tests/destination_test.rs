use actions_core::testing::RecordingTransport;
use actions_core::{settings_schema, Destination, ExtendedTransport, Method};
use destination_twilio_messaging::{PersonasMessagingTwilio, Settings, AUTH_TEST_URL};
use serde_json::json;

fn settings() -> Settings {
    serde_json::from_value(json!({
        "twilioAccountId": "AC123",
        "twilioAuthToken": "secret-token",
        "profileApiEnvironment": "production",
        "profileApiSpaceId": "spa_1",
        "profileApiAccessToken": "profile-secret"
    }))
    .unwrap()
}

#[test]
fn settings_require_every_credential() {
    let partial = serde_json::from_value::<Settings>(json!({
        "twilioAccountId": "AC123",
        "twilioAuthToken": "secret-token"
    }));
    assert!(partial.is_err());
    assert_eq!(settings().profile_api_space_id, "spa_1");
}

#[test]
fn settings_schema_lists_every_credential_as_required() {
    let schema = serde_json::to_value(settings_schema::<PersonasMessagingTwilio>()).unwrap();
    let mut required: Vec<&str> = schema["required"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    required.sort();
    assert_eq!(
        required,
        vec![
            "profileApiAccessToken",
            "profileApiEnvironment",
            "profileApiSpaceId",
            "twilioAccountId",
            "twilioAuthToken",
        ]
    );
    assert_eq!(schema["properties"]["twilioAuthToken"]["description"], "Twilio Auth Token");
}

#[tokio::test]
async fn test_authentication_calls_the_twilio_api_root() {
    let destination = PersonasMessagingTwilio::new();
    let transport = ExtendedTransport::new(
        RecordingTransport::new(),
        destination.extend_request(&settings()),
    );

    let response = destination
        .definition()
        .authentication
        .test(&transport)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.status, 200);

    let request = &transport.inner().requests()[0];
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.url, AUTH_TEST_URL);
    assert_eq!(request.header("authorization"), None);
}

#[test]
fn no_actions_are_registered() {
    let destination = PersonasMessagingTwilio::new();
    assert_eq!(destination.definition().actions().count(), 0);
    assert!(destination.definition().find_action("sendSms").is_err());
}
