//! A redacted wrapper around the bot's authentication token (§6: "the bot
//! token is supplied as an opaque secret value; it is never logged").
//!
//! The grounding codebase's `DiscordHttpClient` hand-wrote a `Debug` impl
//! that redacted the token field; this type generalizes that so both the
//! gateway and the HTTP client share one redaction rule.

use std::fmt;

#[derive(Clone)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The `Authorization` header value for this token.
    pub fn authorization_header(&self) -> String {
        format!("Bot {}", self.0)
    }

    /// The raw token string. Only reach for this at the transport boundary
    /// (building the identify payload or the auth header); never log it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&"<redacted>").finish()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_never_print_the_secret() {
        let token = Token::new("super-secret-value");
        assert!(!format!("{:?}", token).contains("super-secret-value"));
        assert!(!format!("{}", token).contains("super-secret-value"));
    }

    #[test]
    fn authorization_header_format() {
        let token = Token::new("abc123");
        assert_eq!(token.authorization_header(), "Bot abc123");
    }
}
