use aws_sdk_account::types::RegionOptStatus;
use aws_sdk_account::Client as AccountClient;
use tracing::instrument;

use super::AwsError;

#[derive(Debug, Clone)]
pub struct RegionService {
    client: AccountClient,
}

impl RegionService {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: AccountClient::new(config),
        }
    }

    /// Regions enabled for the account, whether opted in or on by default.
    #[instrument(skip(self))]
    pub async fn list_enabled_regions(&self) -> Result<Vec<String>, AwsError> {
        let mut pages = self
            .client
            .list_regions()
            .set_region_opt_status_contains(Some(vec![
                RegionOptStatus::Enabled,
                RegionOptStatus::EnabledByDefault,
            ]))
            .into_paginator()
            .page_size(50)
            .send();

        let mut regions = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| AwsError::from_sdk("ListRegions", e))?;
            regions.extend(
                page.regions()
                    .iter()
                    .filter_map(|region| region.region_name().map(str::to_string)),
            );
        }
        regions.sort();
        Ok(regions)
    }
}
