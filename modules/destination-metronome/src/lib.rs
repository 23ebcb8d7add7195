pub mod send_event;

pub use send_event::IngestEvent;

use actions_core::{Destination, DestinationDefinition, Mode, RequestExtension, SchemaError};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Your Metronome API token.
    pub api_token: String,
}

pub struct Metronome {
    definition: DestinationDefinition,
}

impl Metronome {
    pub fn new() -> Result<Self, SchemaError> {
        let definition = DestinationDefinition::new("Metronome (Actions)", "metronome", Mode::Cloud)
            .action(send_event::definition()?)?;
        Ok(Self { definition })
    }
}

impl Destination for Metronome {
    type Settings = Settings;

    fn definition(&self) -> &DestinationDefinition {
        &self.definition
    }

    fn extend_request(&self, settings: &Settings) -> RequestExtension {
        RequestExtension::bearer(&settings.api_token)
    }
}
