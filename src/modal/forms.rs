//! Single-field create dialogs: organization and actor.

use thiserror::Error;
use uuid::Uuid;

use super::ValidationError;
use crate::i18n::Localizer;
use crate::models::*;
use crate::notify::Notifier;
use crate::store::{StoreError, WorkspaceStore};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Trimmed name, or a validation error when nothing is left.
fn required_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        Err(ValidationError::BlankName)
    } else {
        Ok(name.to_string())
    }
}

/// "Create organization" dialog. The creating user becomes the owner.
#[derive(Debug, Clone)]
pub struct OrganizationForm {
    owner_id: Uuid,
    name: String,
}

impl OrganizationForm {
    pub fn new(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            name: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn can_submit(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Create the organization and report the outcome through `notifier`.
    ///
    /// The field is cleared only on success.
    pub async fn submit(
        &mut self,
        store: &dyn WorkspaceStore,
        notifier: &dyn Notifier,
        localizer: &dyn Localizer,
    ) -> Result<Organization, FormError> {
        let name = match required_name(&self.name) {
            Ok(name) => name,
            Err(e) => {
                notifier.show_error(
                    &localizer.text("orgCreate.input_error_title"),
                    &localizer.text("orgCreate.input_name_required"),
                );
                return Err(e.into());
            }
        };

        let input = CreateOrganizationInput {
            name,
            owner_id: self.owner_id,
        };
        match store.create_organization(&input).await {
            Ok(organization) => {
                notifier.show_success(
                    &localizer.text("orgCreate.success_title"),
                    &localizer
                        .text("orgCreate.success_message")
                        .replace("{org}", &organization.name),
                );
                self.name.clear();
                Ok(organization)
            }
            Err(e) => {
                tracing::error!("Organization creation error: {}", e);
                notifier.show_error(
                    &localizer.text("orgCreate.failure_title"),
                    &localizer.text("orgCreate.failure_message"),
                );
                Err(e.into())
            }
        }
    }

    /// Discard the typed name.
    pub fn close(&mut self) {
        self.name.clear();
    }
}

/// "Add actor" dialog for a project.
#[derive(Debug, Clone)]
pub struct ActorForm {
    project_id: Uuid,
    name: String,
}

impl ActorForm {
    pub fn new(project_id: Uuid) -> Self {
        Self {
            project_id,
            name: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn can_submit(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub async fn submit(&mut self, store: &dyn WorkspaceStore) -> Result<Actor, FormError> {
        let input = CreateActorInput {
            project_id: self.project_id,
            name: required_name(&self.name)?,
        };
        let actor = store.create_actor(&input).await?;
        self.name.clear();
        Ok(actor)
    }

    pub fn close(&mut self) {
        self.name.clear();
    }
}
