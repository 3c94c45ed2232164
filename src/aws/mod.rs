pub mod certificates;
pub mod credentials;
pub mod errors;
pub mod iam;
pub mod kms;
pub mod organizations;
pub mod regions;
pub mod secrets;
pub mod types;

pub use certificates::{AcmCertificates, CertificateClient};
pub use credentials::{CredentialExchange, MemberAccountSession};
pub use errors::AwsError;
pub use organizations::{DirectoryClient, OrganizationsDirectory};

/// Load the operator's base SDK configuration, honouring profile and region overrides.
pub async fn load_sdk_config(profile: Option<&str>, region: Option<&str>) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region.to_string()));
    }
    loader.load().await
}
