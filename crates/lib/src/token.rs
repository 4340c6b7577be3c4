//! Per-run auth token: generation, comparison, and the token file the extension reads.
//!
//! A fresh token is generated on every start and never rewritten while the process runs.
//! The token file is truncated and overwritten each time.

use anyhow::{Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File name of the token file placed next to the executable.
pub const TOKEN_FILE_NAME: &str = "bridge_config.json";

/// Random bytes per token (43 characters once base64url-encoded).
pub const TOKEN_BYTES: usize = 32;

/// Shared secret required in `X-Auth-Token`. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Generate a new token from the OS random source.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; TOKEN_BYTES];
        getrandom::getrandom(&mut bytes).map_err(|e| anyhow::anyhow!("getrandom: {}", e))?;
        Ok(Self(
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a request-supplied value without an early exit on the first mismatch.
    pub fn matches(&self, candidate: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), candidate.as_bytes())
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    let max_len = left.len().max(right.len());
    let mut diff = left.len() ^ right.len();
    for i in 0..max_len {
        let l = *left.get(i).unwrap_or(&0);
        let r = *right.get(i).unwrap_or(&0);
        diff |= (l ^ r) as usize;
    }
    diff == 0
}

/// Contents of the token file: `{"auth_token": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenFile {
    pub auth_token: String,
}

/// Default token file path: next to the running executable, else the working directory.
pub fn default_token_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join(TOKEN_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(TOKEN_FILE_NAME))
}

/// Write the token file, replacing any previous contents. Creates parent dirs if needed.
pub fn write_token_file(path: &Path, token: &AuthToken) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let file = TokenFile {
        auth_token: token.as_str().to_string(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json).with_context(|| format!("writing token to {}", path.display()))?;
    Ok(())
}
