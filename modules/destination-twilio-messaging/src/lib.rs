use actions_core::{Destination, DestinationDefinition, Endpoint, Mode};
use schemars::JsonSchema;
use serde::Deserialize;

pub const AUTH_TEST_URL: &str = "https://api.twilio.com/2010-04-01";

/// Credentials for Twilio and the Profile API. Both tokens are secrets.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Twilio Account ID
    pub twilio_account_id: String,
    /// Twilio Auth Token
    pub twilio_auth_token: String,
    /// Profile API Environment
    pub profile_api_environment: String,
    /// Profile API Space ID
    pub profile_api_space_id: String,
    /// Profile API Access Token
    pub profile_api_access_token: String,
}

pub struct PersonasMessagingTwilio {
    definition: DestinationDefinition,
}

impl PersonasMessagingTwilio {
    pub fn new() -> Self {
        let definition = DestinationDefinition::new(
            "Personas Messaging Twilio",
            "personas-messaging-twilio",
            Mode::Cloud,
        )
        .test_endpoint(Endpoint::get(AUTH_TEST_URL));
        Self { definition }
    }
}

impl Default for PersonasMessagingTwilio {
    fn default() -> Self {
        Self::new()
    }
}

// Requests go out without Twilio credentials: the same client also reaches the
// Profile API, which rejects Twilio basic auth.
// TODO: attach basic auth (account id / auth token) once SMS delivery stops
// calling the Profile API.
impl Destination for PersonasMessagingTwilio {
    type Settings = Settings;

    fn definition(&self) -> &DestinationDefinition {
        &self.definition
    }
}
