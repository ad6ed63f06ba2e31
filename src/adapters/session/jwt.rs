//! JWT session resolver.
//!
//! Validates HS256 bearer tokens issued by the external identity
//! provider and extracts the subject claim as the user id. Token
//! issuance is out of scope; any token that fails validation resolves
//! to `None` rather than an error, so callers treat it exactly like a
//! missing session.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::SessionResolver;

/// Claims readvault cares about; extra claims are ignored.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: usize,
}

/// HS256 bearer-token session resolver.
pub struct JwtSessionResolver {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionResolver {
    /// Creates a resolver for tokens signed with the given secret.
    pub fn new_hs256(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve(&self, credential: &str) -> Result<Option<UserId>, DomainError> {
        match decode::<Claims>(credential, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(UserId::new(data.claims.sub).ok()),
            Err(e) => {
                tracing::debug!(error = %e, "bearer token rejected");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    const SECRET: &[u8] = b"session_test_secret";

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: usize,
    }

    fn token(sub: &str, exp_offset_secs: i64) -> String {
        let exp = (chrono::Utc::now().timestamp() + exp_offset_secs) as usize;
        encode(
            &Header::default(),
            &TestClaims {
                sub: sub.to_string(),
                exp,
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn valid_token_resolves_subject() {
        let resolver = JwtSessionResolver::new_hs256(SECRET);

        let user = resolver.resolve(&token("u1", 3600)).await.unwrap();

        assert_eq!(user.unwrap().as_str(), "u1");
    }

    #[tokio::test]
    async fn expired_token_resolves_to_none() {
        let resolver = JwtSessionResolver::new_hs256(SECRET);

        let user = resolver.resolve(&token("u1", -3600)).await.unwrap();

        assert!(user.is_none());
    }

    #[tokio::test]
    async fn wrong_secret_resolves_to_none() {
        let resolver = JwtSessionResolver::new_hs256(b"other_secret");

        let user = resolver.resolve(&token("u1", 3600)).await.unwrap();

        assert!(user.is_none());
    }

    #[tokio::test]
    async fn garbage_resolves_to_none() {
        let resolver = JwtSessionResolver::new_hs256(SECRET);

        let user = resolver.resolve("not-a-jwt").await.unwrap();

        assert!(user.is_none());
    }

    #[tokio::test]
    async fn empty_subject_resolves_to_none() {
        let resolver = JwtSessionResolver::new_hs256(SECRET);

        let user = resolver.resolve(&token("", 3600)).await.unwrap();

        assert!(user.is_none());
    }
}
