// Admin token check shared by every privileged route

use subtle::ConstantTimeEq;
use tracing::warn;

use crate::utils::ServiceError;

/// Compare the supplied token with the configured one in constant time.
///
/// A missing token is a mismatch. The supplied value is never logged.
pub fn authorize(expected: &str, provided: Option<&str>) -> Result<(), ServiceError> {
    let Some(provided) = provided else {
        warn!("Admin request without a token rejected");
        return Err(ServiceError::Forbidden);
    };

    if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
        Ok(())
    } else {
        warn!("Admin request with an invalid token rejected");
        Err(ServiceError::Forbidden)
    }
}
