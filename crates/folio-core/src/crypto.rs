//! # 암호화 모듈
//!
//! AES-256-GCM을 사용한 API 시크릿 암호화/복호화 기능을 제공합니다.
//! 자격증명 저장소는 시크릿을 암호화된 상태로 보관하고, 거래소 호출
//! 직전에만 복호화합니다.
//!
//! ## 보안 고려사항
//! - 마스터 키는 환경변수 또는 보안 저장소에서 로드
//! - 각 암호화마다 고유한 nonce (12바이트) 사용
//! - 암호화된 데이터와 nonce를 함께 저장

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use thiserror::Error;

/// 암호화 에러
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid master key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid nonce length: expected 12 bytes, got {0}")]
    InvalidNonceLength(usize),

    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error("UTF-8 decode error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

/// AES-256-GCM nonce 크기 (바이트)
pub const NONCE_SIZE: usize = 12;

/// AES-256 키 크기 (바이트)
pub const KEY_SIZE: usize = 32;

/// 자격증명 암호화 관리자
pub struct CredentialEncryptor {
    cipher: Aes256Gcm,
}

impl CredentialEncryptor {
    /// 마스터 키로 암호화 관리자 생성
    ///
    /// # Arguments
    /// * `master_key` - Base64로 인코딩된 32바이트 마스터 키
    ///
    /// # Example
    /// ```ignore
    /// let key = std::env::var("ENCRYPTION_MASTER_KEY")?;
    /// let encryptor = CredentialEncryptor::new(&key)?;
    /// ```
    pub fn new(master_key: &str) -> Result<Self, CryptoError> {
        let key_bytes = Self::decode_key(master_key)?;
        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Base64로 인코딩된 마스터 키 디코드
    fn decode_key(master_key: &str) -> Result<Vec<u8>, CryptoError> {
        use base64::Engine;
        let key_bytes = base64::engine::general_purpose::STANDARD.decode(master_key)?;

        if key_bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength(key_bytes.len()));
        }

        Ok(key_bytes)
    }

    /// 랜덤 nonce 생성
    pub fn generate_nonce() -> [u8; NONCE_SIZE] {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }

    /// 문자열 암호화
    ///
    /// # Returns
    /// * `(encrypted_data, nonce)` - 암호화된 데이터와 사용된 nonce
    pub fn encrypt(&self, plaintext: &str) -> Result<(Vec<u8>, [u8; NONCE_SIZE]), CryptoError> {
        let nonce_bytes = Self::generate_nonce();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok((ciphertext, nonce_bytes))
    }

    /// 암호화된 데이터 복호화
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &[u8]) -> Result<String, CryptoError> {
        if nonce.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength(nonce.len()));
        }

        let nonce = Nonce::from_slice(nonce);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(CryptoError::from)
    }

    /// 시크릿을 단일 Base64 문자열로 봉인합니다.
    ///
    /// 자격증명 저장소에 단일 컬럼으로 보관할 수 있도록 `nonce || ciphertext`를
    /// 이어붙여 Base64로 인코딩합니다.
    pub fn seal(&self, plaintext: &str) -> Result<String, CryptoError> {
        use base64::Engine;
        let (ciphertext, nonce) = self.encrypt(plaintext)?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(combined))
    }

    /// `seal`로 봉인된 문자열을 복호화합니다.
    pub fn open(&self, sealed: &str) -> Result<String, CryptoError> {
        use base64::Engine;
        let combined = base64::engine::general_purpose::STANDARD.decode(sealed)?;

        if combined.len() < NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength(combined.len()));
        }

        let (nonce, ciphertext) = combined.split_at(NONCE_SIZE);
        self.decrypt(ciphertext, nonce)
    }
}

/// 새로운 마스터 키 생성 (초기 설정용)
///
/// # Example
/// ```
/// let key = folio_core::crypto::generate_master_key();
/// println!("ENCRYPTION_MASTER_KEY={}", key);
/// ```
pub fn generate_master_key() -> String {
    use base64::Engine;
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    base64::engine::general_purpose::STANDARD.encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_encryptor() -> CredentialEncryptor {
        let key = generate_master_key();
        CredentialEncryptor::new(&key).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_string() {
        let encryptor = test_encryptor();
        let plaintext = "my-secret-api-key-12345";

        let (ciphertext, nonce) = encryptor.encrypt(plaintext).unwrap();
        let decrypted = encryptor.decrypt(&ciphertext, &nonce).unwrap();

        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let encryptor = test_encryptor();
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP";

        let sealed = encryptor.seal(secret).unwrap();
        assert_ne!(sealed, secret);

        let opened = encryptor.open(&sealed).unwrap();
        assert_eq!(opened, secret);
    }

    #[test]
    fn test_seal_unique_per_call() {
        let encryptor = test_encryptor();

        // 매 호출마다 새 nonce를 사용하므로 출력이 달라야 함
        let a = encryptor.seal("same-secret").unwrap();
        let b = encryptor.seal("same-secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_key_length() {
        use base64::Engine;
        let short_key = base64::engine::general_purpose::STANDARD.encode([0u8; 16]);
        let result = CredentialEncryptor::new(&short_key);
        assert!(matches!(result, Err(CryptoError::InvalidKeyLength(16))));
    }

    #[test]
    fn test_wrong_nonce_fails() {
        let encryptor = test_encryptor();
        let plaintext = "test";

        let (ciphertext, _nonce) = encryptor.encrypt(plaintext).unwrap();
        let wrong_nonce = [0u8; NONCE_SIZE];

        let result = encryptor.decrypt(&ciphertext, &wrong_nonce);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn test_generate_master_key() {
        let key1 = generate_master_key();
        let key2 = generate_master_key();

        // 키가 서로 다름 (랜덤)
        assert_ne!(key1, key2);

        // 생성된 키로 encryptor 생성 가능
        assert!(CredentialEncryptor::new(&key1).is_ok());
    }
}
