use axum::Router;
use hubspot_connector::{Config, Server};

/// Test harness wiring a memory-cache server against fixture OAuth settings.
/// When a mock provider URI is given, the token and contacts endpoints point
/// at it so wiremock can play HubSpot.
pub struct TestHarness {
    pub server: Server,
    pub app: Router,
}

impl TestHarness {
    pub fn with_mock_provider(provider_uri: &str) -> Self {
        Self::build(Some(provider_uri))
    }

    fn build(provider_uri: Option<&str>) -> Self {
        let mut config = Config::default();
        config.oauth.client_id = "test-client-id".to_string();
        config.oauth.client_secret = "test-client-secret".to_string();
        config.oauth.redirect_uri =
            "http://localhost:8000/integrations/hubspot/oauth2callback".to_string();

        if let Some(uri) = provider_uri {
            config.oauth.authorization_url = format!("{uri}/oauth/authorize");
            config.oauth.token_url = format!("{uri}/oauth/v1/token");
            config.oauth.contacts_url = format!("{uri}/crm/v3/objects/contacts");
        }

        let server = Server::with_memory_cache(config);
        let app = server.create_app();

        Self { server, app }
    }
}

/// Encode a form body, percent-escaping values
pub fn form_body(fields: &[(&str, &str)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
