//! Identity tokens: an HS256 JWT whose `meta` claim is the hex-encoded
//! AES-256-CBC ciphertext of `{id}+{role}`, prefixed with the hex IV.
//! Possession of the JWT alone is not enough to forge an identity; the
//! meta must also decrypt under the server's encryption key.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use models::types::Role;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::Identity;
use super::errors::AuthError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const IV_LEN: usize = 16;
const IV_HEX_LEN: usize = IV_LEN * 2;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    meta: String,
    iat: i64,
    exp: i64,
}

pub struct TokenService {
    jwt_secret: String,
    encrypt_key: [u8; 32],
    ttl: Duration,
}

impl TokenService {
    pub fn new(jwt_secret: &str, encrypt_secret: &str, ttl_secs: i64) -> Result<Self, AuthError> {
        let key_bytes = encrypt_secret.as_bytes();
        if key_bytes.len() != 32 {
            return Err(AuthError::Crypto(format!(
                "encryption secret must be exactly 32 bytes, got {}",
                key_bytes.len()
            )));
        }
        let mut encrypt_key = [0u8; 32];
        encrypt_key.copy_from_slice(key_bytes);
        Ok(Self {
            jwt_secret: jwt_secret.to_owned(),
            encrypt_key,
            ttl: Duration::seconds(ttl_secs),
        })
    }

    /// Mint a token for the given identity.
    pub fn issue(&self, id: Uuid, role: Role) -> Result<String, AuthError> {
        let meta = self.encrypt_meta(&format!("{id}+{role}"));
        let now = Utc::now();
        let claims = Claims {
            meta,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Token(e.to_string()))
    }

    /// Authenticate a raw `Authorization` header value. Expects the
    /// `Bearer ` scheme.
    pub fn authenticate(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let header = header.ok_or(AuthError::MissingToken)?;
        let token = header.strip_prefix("Bearer ").ok_or(AuthError::MissingToken)?;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        let plain = self.decrypt_meta(&data.claims.meta)?;
        let (id, role) = plain.split_once('+').ok_or(AuthError::InvalidToken)?;
        let id = Uuid::parse_str(id).map_err(|_| AuthError::InvalidToken)?;
        let role = role.parse::<Role>().map_err(|_| AuthError::InvalidToken)?;
        Ok(Identity { id, role })
    }

    fn encrypt_meta(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        let ciphertext = Aes256CbcEnc::new(&self.encrypt_key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        format!("{}{}", hex::encode(iv), hex::encode(ciphertext))
    }

    fn decrypt_meta(&self, meta: &str) -> Result<String, AuthError> {
        let iv_hex = meta.get(..IV_HEX_LEN).ok_or(AuthError::InvalidToken)?;
        let body_hex = meta.get(IV_HEX_LEN..).ok_or(AuthError::InvalidToken)?;
        let iv = hex::decode(iv_hex).map_err(|_| AuthError::InvalidToken)?;
        let body = hex::decode(body_hex).map_err(|_| AuthError::InvalidToken)?;
        let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| AuthError::InvalidToken)?;

        let plain = Aes256CbcDec::new(&self.encrypt_key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&body)
            .map_err(|_| AuthError::InvalidToken)?;
        String::from_utf8(plain).map_err(|_| AuthError::InvalidToken)
    }
}
