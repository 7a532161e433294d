// Utility modules

pub mod service_error;
pub mod validation;

pub use service_error::{ServiceError, ServiceResult, FORBIDDEN_BODY, NOT_FOUND_BODY};
pub use validation::{trim_and_validate_field, trim_optional_field};
