use serde::{Deserialize, Serialize};

/// Token endpoint response body, as received.
///
/// Every field is optional; an empty string is treated the same as a missing
/// value for tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerTokenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Space-delimited granted scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Seconds until the access token expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext_expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_info: Option<String>,
    /// Family of client ids the refresh token belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foci: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl ServerTokenResponse {
    pub fn access_token(&self) -> Option<&str> {
        non_empty(&self.access_token)
    }

    pub fn refresh_token(&self) -> Option<&str> {
        non_empty(&self.refresh_token)
    }

    pub fn id_token(&self) -> Option<&str> {
        non_empty(&self.id_token)
    }

    pub fn client_info(&self) -> Option<&str> {
        non_empty(&self.client_info)
    }

    pub fn family_id(&self) -> Option<&str> {
        non_empty(&self.foci)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tokens_read_as_absent() {
        let response: ServerTokenResponse = serde_json::from_str(
            r#"{"access_token":"","refresh_token":"RT","token_type":"Bearer","foci":"1"}"#,
        )
        .unwrap();
        assert_eq!(response.access_token(), None);
        assert_eq!(response.refresh_token(), Some("RT"));
        assert_eq!(response.family_id(), Some("1"));
        assert_eq!(response.id_token(), None);
    }
}
