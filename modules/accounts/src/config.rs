use serde::Deserialize;

/// `modules.accounts` settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountsConfig {
    /// Random bytes per login token; the token is their upper-case hex.
    #[serde(default = "default_token_bytes")]
    pub token_bytes: usize,
}

fn default_token_bytes() -> usize {
    16
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            token_bytes: default_token_bytes(),
        }
    }
}
