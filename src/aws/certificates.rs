use async_trait::async_trait;
use aws_sdk_acm::types::{CertificateDetail, ValidationMethod};
use aws_sdk_acm::Client as AcmClient;
use tracing::instrument;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use super::types::{Certificate, DnsRecord, DomainValidationOption};
use super::AwsError;

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CertificateClient: Send + Sync {
    /// Request a DNS-validated public certificate and return its ARN.
    async fn request_certificate(
        &self,
        domain_name: &str,
        subject_alternative_names: &[String],
    ) -> Result<String, AwsError>;

    async fn describe_certificate(&self, certificate_arn: &str) -> Result<Certificate, AwsError>;
}

/// ACM client bound to the credentials of a member account and one region.
#[derive(Debug, Clone)]
pub struct AcmCertificates {
    client: AcmClient,
}

impl AcmCertificates {
    pub fn new(config: &aws_config::SdkConfig, region: Option<String>) -> Self {
        let mut builder = aws_sdk_acm::config::Builder::from(config);
        if let Some(region) = region {
            builder = builder.region(aws_sdk_acm::config::Region::new(region));
        }
        Self {
            client: AcmClient::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl CertificateClient for AcmCertificates {
    #[instrument(skip(self))]
    async fn request_certificate(
        &self,
        domain_name: &str,
        subject_alternative_names: &[String],
    ) -> Result<String, AwsError> {
        let alternative_names =
            (!subject_alternative_names.is_empty()).then(|| subject_alternative_names.to_vec());

        let output = self
            .client
            .request_certificate()
            .validation_method(ValidationMethod::Dns)
            .domain_name(domain_name)
            .set_subject_alternative_names(alternative_names)
            .send()
            .await
            .map_err(|e| {
                AwsError::from_sdk("RequestCertificate", e)
                    .into_creation(format!("certificate for {domain_name}"))
            })?;

        output
            .certificate_arn()
            .map(str::to_string)
            .ok_or_else(|| AwsError::missing("RequestCertificate", "CertificateArn"))
    }

    #[instrument(skip(self))]
    async fn describe_certificate(&self, certificate_arn: &str) -> Result<Certificate, AwsError> {
        let output = self
            .client
            .describe_certificate()
            .certificate_arn(certificate_arn)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DescribeCertificate", e))?;

        let detail = output
            .certificate()
            .ok_or_else(|| AwsError::missing("DescribeCertificate", "Certificate"))?;
        Ok(to_certificate(certificate_arn, detail))
    }
}

fn to_certificate(certificate_arn: &str, detail: &CertificateDetail) -> Certificate {
    Certificate {
        arn: detail
            .certificate_arn()
            .unwrap_or(certificate_arn)
            .to_string(),
        status: detail.status().map(|status| status.as_str().to_string()),
        failure_reason: detail
            .failure_reason()
            .map(|reason| reason.as_str().to_string()),
        domain_validation_options: detail
            .domain_validation_options()
            .iter()
            .map(|option| DomainValidationOption {
                domain_name: option.domain_name().to_string(),
                resource_record: option.resource_record().map(|record| DnsRecord {
                    name: record.name().to_string(),
                    record_type: record.r#type().as_str().to_string(),
                    value: record.value().to_string(),
                }),
            })
            .collect(),
    }
}
