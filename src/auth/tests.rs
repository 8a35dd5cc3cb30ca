//! Tests for auth module

#[cfg(test)]
mod tests {
    use super::super::*;
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

    #[test]
    fn test_claims_structure() {
        let claims = models::Claims {
            sub: "U_ABC123".to_string(),
            exp: 1234567890,
        };

        assert_eq!(claims.sub, "U_ABC123");
        assert_eq!(claims.exp, 1234567890);
    }

    #[test]
    fn test_jwt_encoding_and_decoding() {
        let secret = "test_secret_key";
        let claims = models::Claims {
            sub: "U_TEST01".to_string(),
            exp: 9999999999,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        let decoded = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("Failed to decode token");

        assert_eq!(decoded.claims.sub, "U_TEST01");
        assert_eq!(decoded.claims.exp, 9999999999);
    }

    #[test]
    fn test_jwt_validation_fails_with_wrong_secret() {
        let secret = "test_secret_key";
        let wrong_secret = "wrong_secret_key";

        let claims = models::Claims {
            sub: "U_TEST01".to_string(),
            exp: 9999999999,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        let result = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(wrong_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        );

        assert!(result.is_err(), "Decoding with wrong secret should fail");
    }

    #[test]
    fn test_generate_jwt_round_trip() {
        let secret = "round_trip_secret";
        let token = handlers::generate_jwt("U_ROUND1", secret).expect("generate_jwt failed");

        let decoded = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("Failed to decode generated token");

        assert_eq!(decoded.claims.sub, "U_ROUND1");
        assert!(decoded.claims.exp > chrono::Utc::now().timestamp() as usize);
    }

    #[test]
    fn test_jwt_validation_fails_when_expired() {
        let secret = "expiry_secret";
        let claims = models::Claims {
            sub: "U_OLD001".to_string(),
            exp: 1000, // 1970
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        let result = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        );

        assert!(result.is_err(), "Expired token should be rejected");
    }
}
