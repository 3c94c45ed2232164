//! Certificate issuance: request a DNS-validated certificate and wait until ACM
//! has generated the validation records the operator must publish.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, info_span, Instrument};

use crate::aws::types::Certificate;
use crate::aws::{AwsError, CertificateClient};
use crate::workflows::poller::{AsyncJob, JobOutcome, JobPoller, JobSnapshot, JobStatus};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CertificateRequestError {
    #[error("at least one fully qualified domain name is required")]
    NoDomains,
}

/// Domains for one certificate. The first is the primary name, the rest are SANs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    pub domain_name: String,
    pub subject_alternative_names: Vec<String>,
}

impl CertificateRequest {
    /// Parse a comma-separated list such as `example.com, www.example.com`.
    pub fn parse(input: &str) -> Result<Self, CertificateRequestError> {
        let mut domains = input
            .split(',')
            .map(str::trim)
            .filter(|domain| !domain.is_empty())
            .map(str::to_string);

        let domain_name = domains.next().ok_or(CertificateRequestError::NoDomains)?;
        Ok(Self {
            domain_name,
            subject_alternative_names: domains.collect(),
        })
    }
}

struct CertificateJob<'a, C: CertificateClient + ?Sized> {
    client: &'a C,
    request: &'a CertificateRequest,
}

impl<'a, C: CertificateClient + ?Sized> CertificateJob<'a, C> {
    fn classify(certificate: Certificate) -> JobStatus<Certificate> {
        if certificate.has_validation_records() {
            JobStatus::Succeeded(certificate)
        } else if certificate.is_failed() {
            JobStatus::Failed(
                certificate
                    .failure_reason
                    .unwrap_or_else(|| "certificate request failed".to_string()),
            )
        } else {
            JobStatus::InProgress
        }
    }
}

#[async_trait]
impl<'a, C: CertificateClient + ?Sized> AsyncJob for CertificateJob<'a, C> {
    type Output = Certificate;

    fn operation(&self) -> &str {
        "RequestCertificate"
    }

    async fn submit(&self) -> Result<JobSnapshot<Certificate>, AwsError> {
        let arn = self
            .client
            .request_certificate(
                &self.request.domain_name,
                &self.request.subject_alternative_names,
            )
            .await?;
        info!(certificate_arn = %arn, "Certificate requested");

        // Validation records are never present in the RequestCertificate response.
        Ok(JobSnapshot {
            request_id: arn,
            status: JobStatus::InProgress,
        })
    }

    async fn status(&self, request_id: &str) -> Result<JobSnapshot<Certificate>, AwsError> {
        let certificate = self.client.describe_certificate(request_id).await?;
        Ok(JobSnapshot {
            request_id: request_id.to_string(),
            status: Self::classify(certificate),
        })
    }
}

pub struct CertificateIssuer<'a, C: CertificateClient + ?Sized> {
    client: &'a C,
    poller: JobPoller,
}

impl<'a, C: CertificateClient + ?Sized> CertificateIssuer<'a, C> {
    pub fn new(client: &'a C, poller: JobPoller) -> Self {
        Self { client, poller }
    }

    /// Request the certificate and wait for its DNS validation records.
    pub async fn issue(
        &self,
        request: &CertificateRequest,
    ) -> Result<JobOutcome<Certificate>, AwsError> {
        let span = info_span!("issue_certificate", domain = %request.domain_name);
        let job = CertificateJob {
            client: self.client,
            request,
        };
        self.poller.run(&job).instrument(span).await
    }
}
