use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use tracing::instrument;

use super::types::Secret;
use super::AwsError;

#[derive(Debug, Clone)]
pub struct SecretsService {
    client: SecretsManagerClient,
}

impl SecretsService {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: SecretsManagerClient::new(config),
        }
    }

    /// Create an empty secret. Without `kms_key_id` Secrets Manager uses `aws/secretsmanager`.
    #[instrument(skip(self))]
    pub async fn create_secret(
        &self,
        name: &str,
        kms_key_id: Option<&str>,
    ) -> Result<Secret, AwsError> {
        let output = self
            .client
            .create_secret()
            .name(name)
            .set_kms_key_id(kms_key_id.map(str::to_string))
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateSecret", e).into_creation(format!("secret '{name}'")))?;

        Ok(Secret {
            name: output.name().unwrap_or(name).to_string(),
            arn: output
                .arn()
                .map(str::to_string)
                .ok_or_else(|| AwsError::missing("CreateSecret", "ARN"))?,
        })
    }
}
