//! Catalog retrieval.

use crate::client::BrokerClient;
use osb_types::{Catalog, ResolvedPlan, Result};
use tracing::debug;

impl BrokerClient {
	/// Fetches `GET /v2/catalog`. Any non-2xx status is a remote error.
	pub async fn fetch_catalog(&self) -> Result<Catalog> {
		let response = self.get("/v2/catalog").await?;
		if !response.status.is_success() {
			return Err(response.into_error());
		}

		let catalog: Catalog = response.parse()?;
		debug!("Catalog lists {} service(s)", catalog.services.len());
		Ok(catalog)
	}

	/// Fetches the catalog and resolves a service/plan pair against it.
	pub async fn resolve_plan(&self, service_ref: &str, plan_ref: &str) -> Result<ResolvedPlan> {
		self.fetch_catalog()
			.await?
			.resolve_plan(service_ref, plan_ref)
	}
}
