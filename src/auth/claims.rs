use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Access tokens authenticate API calls; refresh tokens only mint new pairs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn label(self) -> &'static str {
        match self {
            TokenKind::Access => "an access",
            TokenKind::Refresh => "a refresh",
        }
    }
}

/// Token payload. `sub` is the profile id; the profile itself is looked up per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

impl Claims {
    pub fn issue(sub: Uuid, kind: TokenKind, ttl: Duration, iss: &str, aud: &str) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            sub,
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
            iss: iss.to_owned(),
            aud: aud.to_owned(),
            kind,
        }
    }

    pub fn require(self, kind: TokenKind) -> anyhow::Result<Self> {
        if self.kind != kind {
            anyhow::bail!("not {} token", kind.label());
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_sets_window_from_ttl() {
        let claims = Claims::issue(Uuid::new_v4(), TokenKind::Access, Duration::minutes(5), "i", "a");
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn require_checks_kind() {
        let claims = Claims::issue(Uuid::new_v4(), TokenKind::Refresh, Duration::minutes(1), "i", "a");
        let err = claims.clone().require(TokenKind::Access).unwrap_err();
        assert_eq!(err.to_string(), "not an access token");
        assert!(claims.require(TokenKind::Refresh).is_ok());
    }
}
