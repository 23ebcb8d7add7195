//! Static adapter descriptions: destinations, their actions, and the field
//! schemas the runner executes.

use std::collections::BTreeMap;

use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dispatch::Endpoint;
use crate::error::{ActionError, SchemaError, TransportError};
use crate::schema::FieldSchema;
use crate::transport::{OutboundRequest, RequestExtension, Response, Transport};

/// Which runner entry points an action supports. Batch delivery trades
/// per-event isolation for throughput: one rejected event fails the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchCapabilities {
    pub single: bool,
    pub batch: bool,
}

impl DispatchCapabilities {
    pub const SINGLE: Self = Self {
        single: true,
        batch: false,
    };
    pub const BATCH: Self = Self {
        single: false,
        batch: true,
    };
    pub const ALL: Self = Self {
        single: true,
        batch: true,
    };
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionDefinition {
    pub key: String,
    pub title: String,
    pub description: String,
    pub fields: FieldSchema,
    pub endpoint: Endpoint,
    pub dispatch: DispatchCapabilities,
}

impl ActionDefinition {
    pub fn describe(&self) -> &FieldSchema {
        &self.fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Cloud,
    Device,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Authentication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_endpoint: Option<Endpoint>,
}

impl Authentication {
    /// Issue the credential test call, if the destination declares one. The
    /// response comes back as-is; judging it is the caller's job.
    pub async fn test<T: Transport + ?Sized>(
        &self,
        transport: &T,
    ) -> Result<Option<Response>, TransportError> {
        let Some(endpoint) = &self.test_endpoint else {
            return Ok(None);
        };
        let request = OutboundRequest::new(endpoint.method, &endpoint.url);
        transport.send(request).await.map(Some)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DestinationDefinition {
    pub name: String,
    pub slug: String,
    pub mode: Mode,
    pub authentication: Authentication,
    actions: BTreeMap<String, ActionDefinition>,
}

impl DestinationDefinition {
    pub fn new(name: &str, slug: &str, mode: Mode) -> Self {
        Self {
            name: name.to_string(),
            slug: slug.to_string(),
            mode,
            authentication: Authentication::default(),
            actions: BTreeMap::new(),
        }
    }

    pub fn test_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.authentication.test_endpoint = Some(endpoint);
        self
    }

    pub fn action(mut self, action: ActionDefinition) -> Result<Self, SchemaError> {
        if self.actions.contains_key(&action.key) {
            return Err(SchemaError::DuplicateAction(action.key));
        }
        self.actions.insert(action.key.clone(), action);
        Ok(self)
    }

    pub fn find_action(&self, key: &str) -> Result<&ActionDefinition, ActionError> {
        self.actions
            .get(key)
            .ok_or_else(|| ActionError::UnknownAction(key.to_string()))
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.values()
    }
}

/// One integration target. The host deserializes [`Destination::Settings`]
/// from its credential store and asks the destination which headers to add.
pub trait Destination: Send + Sync {
    type Settings: DeserializeOwned + JsonSchema + Send + Sync;

    fn definition(&self) -> &DestinationDefinition;

    fn extend_request(&self, _settings: &Self::Settings) -> RequestExtension {
        RequestExtension::none()
    }
}

/// JSON schema of the credentials a destination expects.
pub fn settings_schema<D: Destination + ?Sized>() -> RootSchema {
    schemars::schema_for!(D::Settings)
}
