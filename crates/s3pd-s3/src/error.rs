//! Mapping of SDK failures onto `StoreError`.

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;

use s3pd_core::{ObjectLocator, StoreError};

/// Error codes S3 uses for a missing bucket or key.
const NOT_FOUND_CODES: &[&str] = &["NoSuchKey", "NoSuchBucket", "NotFound"];

/// Error codes S3 uses for rejected or insufficient credentials.
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
];

/// Classify a failure from its HTTP status and S3 error code.
pub(crate) fn classify(
    locator: &ObjectLocator,
    status: Option<u16>,
    code: Option<&str>,
    message: String,
) -> StoreError {
    if status == Some(404) || code.is_some_and(|c| NOT_FOUND_CODES.contains(&c)) {
        return StoreError::not_found(locator);
    }

    if status == Some(401)
        || status == Some(403)
        || code.is_some_and(|c| ACCESS_DENIED_CODES.contains(&c))
    {
        return StoreError::access_denied(message);
    }

    match status {
        Some(status) => StoreError::network_with_status(message, status),
        None => StoreError::network(message),
    }
}

fn map_sdk_error<E>(locator: &ObjectLocator, err: &SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let message = DisplayErrorContext(err).to_string();
    classify(locator, status, err.code(), message)
}

/// Convert a failed `HeadObject` call.
pub(crate) fn map_head_error(
    locator: &ObjectLocator,
    err: &SdkError<HeadObjectError, HttpResponse>,
) -> StoreError {
    if let SdkError::ServiceError(ctx) = err {
        if ctx.err().is_not_found() {
            return StoreError::not_found(locator);
        }
    }
    map_sdk_error(locator, err)
}

/// Convert a failed ranged `GetObject` call.
pub(crate) fn map_get_error(
    locator: &ObjectLocator,
    err: &SdkError<GetObjectError, HttpResponse>,
) -> StoreError {
    if let SdkError::ServiceError(ctx) = err {
        if ctx.err().is_no_such_key() {
            return StoreError::not_found(locator);
        }
    }
    map_sdk_error(locator, err)
}
