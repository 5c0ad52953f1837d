//! bcrypt on the blocking pool. Hashing at the default cost takes long enough
//! to stall a runtime worker.

use crate::ServiceError;

pub async fn hash_password(password: String, cost: u32) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ServiceError::Internal(format!("hash task: {e}")))?
        .map_err(|e| ServiceError::Internal(format!("hash password: {e}")))
}

/// Returns `false` for a mismatch and for a stored hash bcrypt cannot parse.
pub async fn verify_password(password: String, hash: String) -> Result<bool, ServiceError> {
    let result = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("verify task: {e}")))?;
    match result {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!("unreadable password hash: {e}");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("123456".into(), TEST_COST).await.unwrap();
        assert_ne!(hash, "123456");
        assert!(verify_password("123456".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("654321".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_does_not_verify() {
        assert!(!verify_password("123456".into(), "not-a-hash".into())
            .await
            .unwrap());
    }
}
