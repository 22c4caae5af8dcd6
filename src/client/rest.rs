use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::{ClientError, Transport};
use crate::models::*;
use crate::store::{PolicyStore, StoreError, WorkspaceStore};

/// Ask the REST gateway for a single object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

const RETURN_REPRESENTATION: &str = "return=representation";

/// Store backed by the hosted REST data API.
///
/// Inserts return the created row. There are no multi-row transactions over
/// this interface, so the policy/link pair uses the compensating default of
/// [`PolicyStore::create_linked_policy`].
#[derive(Debug, Clone)]
pub struct RestStore {
    transport: Transport,
}

impl RestStore {
    /// Create with explicit configuration.
    pub fn new(rest_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            transport: Transport::new(rest_url, api_key),
        }
    }

    /// Create reusing an existing connection pool.
    pub fn with_client(client: Client, rest_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            transport: Transport::with_client(client, rest_url, api_key),
        }
    }

    /// Insert a row into `collection` and return the created record.
    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        collection: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .transport
            .request(Method::POST, &format!("/{}", collection))
            .header("Accept", SINGLE_OBJECT)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await?;
        self.transport.handle_response(response).await
    }

    // ============================================================
    // Parent records
    // ============================================================

    /// Create a project.
    pub async fn create_project(&self, input: &CreateProjectInput) -> Result<Project, ClientError> {
        self.insert("projects", input).await
    }

    /// Create a feature under a project.
    pub async fn create_feature(
        &self,
        project_id: Uuid,
        input: &CreateFeatureInput,
    ) -> Result<Feature, ClientError> {
        let response = self
            .transport
            .request(Method::POST, &format!("/projects/{}/features", project_id))
            .json(input)
            .send()
            .await?;
        self.transport.handle_response(response).await
    }

    /// List the policies attached to a feature.
    pub async fn get_feature_policies(&self, feature_id: Uuid) -> Result<Vec<Policy>, ClientError> {
        let response = self
            .transport
            .request(Method::GET, &format!("/features/{}/policies", feature_id))
            .send()
            .await?;
        self.transport.handle_response(response).await
    }
}

#[async_trait]
impl PolicyStore for RestStore {
    async fn create_policy(&self, input: &CreatePolicyInput) -> Result<Policy, StoreError> {
        Ok(self.insert("policies", input).await?)
    }

    async fn create_feature_policy(
        &self,
        input: &CreateFeaturePolicyInput,
    ) -> Result<FeaturePolicy, StoreError> {
        Ok(self.insert("feature_policies", input).await?)
    }

    /// A filtered delete succeeds whether or not a row matched, so the
    /// deleted rows are requested back and an empty result means `false`.
    async fn delete_policy(&self, id: Uuid) -> Result<bool, StoreError> {
        let response = self
            .transport
            .request(Method::DELETE, "/policies")
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .send()
            .await
            .map_err(ClientError::from)?;

        let deleted: Vec<Policy> = self.transport.handle_response(response).await?;
        Ok(!deleted.is_empty())
    }
}

#[async_trait]
impl WorkspaceStore for RestStore {
    async fn create_organization(
        &self,
        input: &CreateOrganizationInput,
    ) -> Result<Organization, StoreError> {
        Ok(self.insert("organizations", input).await?)
    }

    async fn create_actor(&self, input: &CreateActorInput) -> Result<Actor, StoreError> {
        Ok(self.insert("actors", input).await?)
    }
}
