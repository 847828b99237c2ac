use tracing::error;

/// bcrypt work factor for new hashes.
pub const HASH_COST: u32 = 10;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    bcrypt::hash(plain, HASH_COST).map_err(|e| {
        error!(error = %e, "bcrypt hash_password error");
        anyhow::anyhow!(e)
    })
}

/// Errors on a malformed hash; a wrong password is `Ok(false)`.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    bcrypt::verify(plain, hash).map_err(|e| {
        error!(error = %e, "bcrypt verify error");
        anyhow::anyhow!(e)
    })
}

/// Well-formed cost-10 hash that no login password is expected to match.
/// Verified against when the account does not exist, so both branches pay for bcrypt.
pub const DUMMY_HASH: &str = "$2a$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";

/// Runs [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain)).await?
}

/// Runs [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_hash_is_well_formed_and_rejects() {
        assert!(DUMMY_HASH.starts_with("$2a$10$"));
        assert!(!verify_password("not-the-password", DUMMY_HASH).unwrap());
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(hash.starts_with("$2"));
        assert!(hash.contains("$10$"));
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn blocking_wrappers_agree() {
        let hash = hash_password_blocking("pa55word!".into()).await.unwrap();
        assert!(verify_password_blocking("pa55word!".into(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("nope-nope".into(), hash).await.unwrap());
    }
}
