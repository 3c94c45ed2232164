// Long-running provisioning workflows built on the job poller

pub mod certificates;
pub mod poller;
pub mod provisioning;

pub use certificates::{CertificateIssuer, CertificateRequest, CertificateRequestError};
pub use poller::{AsyncJob, JobOutcome, JobPoller, JobSnapshot, JobStatus, PollConfig};
pub use provisioning::{
    AccountChoice, AccountLocation, AccountProvisioner, OrganizationContext,
    OrganizationalUnitChoice, ProvisioningOutcome,
};
