// org-provision library - AWS Organizations account provisioning
// This exposes the core components for testing and integration

pub mod aws;
pub mod cli;
pub mod config;
pub mod shutdown;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use aws::{
    AcmCertificates, AwsError, CertificateClient, CredentialExchange, DirectoryClient,
    MemberAccountSession, OrganizationsDirectory,
};
pub use config::OrgProvisionConfig;
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry, OperationTimer};
pub use workflows::{
    AccountChoice, AccountLocation, AccountProvisioner, AsyncJob, CertificateIssuer,
    CertificateRequest, JobOutcome, JobPoller, JobSnapshot, JobStatus, OrganizationContext,
    OrganizationalUnitChoice, PollConfig, ProvisioningOutcome,
};
