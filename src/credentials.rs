use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Credentials file structure
///
/// Format:
/// ```toml
/// [operator.profile_name]
/// token = "your_operator_token_here"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Credentials {
    #[serde(default)]
    pub operator: HashMap<String, CredentialProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialProfile {
    pub token: String,
}

/// Get the default credentials file path: ~/.config/signage_server/credentials.toml
pub fn get_credentials_path() -> PathBuf {
    let home = std::env::var("HOME").expect("HOME environment variable not set");
    PathBuf::from(home)
        .join(".config")
        .join("signage_server")
        .join("credentials.toml")
}

/// Load credentials from the default location
/// Returns None if the file doesn't exist
pub fn load_credentials() -> Result<Option<Credentials>, Box<dyn std::error::Error + Send + Sync>> {
    let creds_path = get_credentials_path();

    if !creds_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&creds_path)?;
    let credentials: Credentials = toml::from_str(&content)?;

    Ok(Some(credentials))
}

/// Get the operator token for a specific profile
pub fn get_operator_token(
    credentials: &Option<Credentials>,
    profile: &str,
) -> Result<String, String> {
    match credentials {
        Some(creds) => creds
            .operator
            .get(profile)
            .map(|p| p.token.clone())
            .ok_or_else(|| {
                format!(
                    "Credential profile '[operator.{}]' not found in credentials file",
                    profile
                )
            }),
        None => Err(format!(
            "Credentials file not found. Expected at: {}",
            get_credentials_path().display()
        )),
    }
}
