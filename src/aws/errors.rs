use aws_sdk_organizations::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Error codes AWS returns when a call was throttled or hit a transient fault.
const RETRYABLE_CODES: &[&str] = &[
    "ThrottlingException",
    "Throttling",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "ServiceException",
    "ServiceUnavailable",
    "ServiceUnavailableException",
    "InternalFailure",
    "ConcurrentModificationException",
];

#[derive(Debug, Error)]
pub enum AwsError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("Failed to create {resource}: {message}")]
    Creation { resource: String, message: String },

    #[error(
        "Failed to move account {account_id} from {source_parent_id} to {destination_parent_id}: {message}"
    )]
    Move {
        account_id: String,
        source_parent_id: String,
        destination_parent_id: String,
        message: String,
    },

    #[error("{operation} failed: {message}")]
    Service {
        operation: String,
        code: Option<String>,
        message: String,
        retryable: bool,
    },

    #[error("{operation} response is missing {field}")]
    MissingField { operation: String, field: String },

    #[error("Gave up waiting for {operation} after {attempts} status checks")]
    PollingExhausted { operation: String, attempts: u32 },
}

impl AwsError {
    /// Convert an SDK error at the client boundary.
    ///
    /// Every service crate re-exports the same smithy `SdkError`, so this one
    /// conversion serves Organizations, STS, ACM, IAM, KMS and the rest.
    pub fn from_sdk<E, R>(operation: &str, err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug,
    {
        let code = err.code().map(str::to_string);
        let retryable = matches!(
            err,
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_)
        ) || code
            .as_deref()
            .is_some_and(|code| RETRYABLE_CODES.contains(&code));
        let message = err
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

        AwsError::Service {
            operation: operation.to_string(),
            code,
            message,
            retryable,
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AwsError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn missing(operation: &str, field: &str) -> Self {
        AwsError::MissingField {
            operation: operation.to_string(),
            field: field.to_string(),
        }
    }

    /// Whether retrying the same call later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AwsError::Service { retryable: true, .. })
    }

    /// Rewrap a failed mutation as a creation error, keeping the service message verbatim.
    pub fn into_creation(self, resource: impl Into<String>) -> Self {
        match self {
            AwsError::Service { message, .. } => AwsError::Creation {
                resource: resource.into(),
                message,
            },
            other => other,
        }
    }

    /// Operator-facing hints printed beneath the error.
    pub fn remediation(&self) -> Vec<&'static str> {
        match self {
            AwsError::NotFound { .. } => vec![
                "Check that the management account has AWS Organizations enabled",
                "Verify the active profile: aws sts get-caller-identity",
            ],
            AwsError::Creation { .. } => vec![
                "Names and email addresses must be unique within the organization",
                "Check the account quota: aws service-quotas list-service-quotas --service-code organizations",
            ],
            AwsError::Move { .. } => vec![
                "The account stays at the organization root until it is moved",
                "Move it manually: aws organizations move-account",
            ],
            AwsError::Service {
                code: Some(code), ..
            } if code.contains("AccessDenied") => vec![
                "The current credentials lack permission for this call",
                "Run from the organization's management account",
            ],
            AwsError::Service {
                retryable: true, ..
            } => vec!["The service is throttling or unavailable; try again shortly"],
            AwsError::Service { .. } | AwsError::MissingField { .. } => {
                vec!["Verify the active profile: aws sts get-caller-identity"]
            }
            AwsError::PollingExhausted { .. } => vec![
                "The operation may still complete; check the AWS console",
                "Raise polling.max_attempts or leave it unset to wait indefinitely",
            ],
        }
    }
}
