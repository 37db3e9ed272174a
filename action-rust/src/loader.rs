use crate::{
    errors::BoxedError,
    types::{Campaign, CampaignContact},
    ActionError, ActionResult,
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};
use van_sdk::Organization;

/// Access to the host application's records. Implementations are usually
/// backed by a cache in front of the database.
#[async_trait]
pub trait DataLoader: Send + Sync {
    async fn load_contact(&self, id: i64) -> Result<Option<CampaignContact>, BoxedError>;
    async fn load_campaign(&self, id: i64) -> Result<Option<Campaign>, BoxedError>;
    async fn load_organization(&self, id: i64) -> Result<Option<Organization>, BoxedError>;
}

/// A contact together with the campaign and organization it belongs to.
#[derive(Debug, Clone)]
pub struct ContactContext {
    pub contact: CampaignContact,
    pub campaign: Campaign,
    pub organization: Organization,
}

/// Resolve contact, then campaign, then organization. Each lookup depends on
/// the previous one.
pub async fn resolve_contact_context(
    loader: &dyn DataLoader,
    campaign_contact_id: i64,
) -> ActionResult<ContactContext> {
    let contact = loader
        .load_contact(campaign_contact_id)
        .await
        .map_err(ActionError::Loader)?
        .ok_or_else(|| ActionError::NotFound(format!("Campaign contact {campaign_contact_id}")))?;

    let campaign = loader
        .load_campaign(contact.campaign_id)
        .await
        .map_err(ActionError::Loader)?
        .ok_or_else(|| ActionError::NotFound(format!("Campaign {}", contact.campaign_id)))?;

    let organization = loader
        .load_organization(campaign.organization_id)
        .await
        .map_err(ActionError::Loader)?
        .ok_or_else(|| {
            ActionError::NotFound(format!("Organization {}", campaign.organization_id))
        })?;

    Ok(ContactContext {
        contact,
        campaign,
        organization,
    })
}

#[derive(Default)]
struct InMemoryState {
    contacts: HashMap<i64, CampaignContact>,
    campaigns: HashMap<i64, Campaign>,
    organizations: HashMap<i64, Organization>,
}

/// A [`DataLoader`] over records held in memory.
#[derive(Default)]
pub struct InMemoryDataLoader {
    state: Mutex<InMemoryState>,
}

impl InMemoryDataLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_contact(&self, contact: CampaignContact) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contacts
            .insert(contact.id, contact);
    }

    pub fn insert_campaign(&self, campaign: Campaign) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .campaigns
            .insert(campaign.id, campaign);
    }

    pub fn insert_organization(&self, organization: Organization) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .organizations
            .insert(organization.id, organization);
    }
}

#[async_trait]
impl DataLoader for InMemoryDataLoader {
    async fn load_contact(&self, id: i64) -> Result<Option<CampaignContact>, BoxedError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.contacts.get(&id).cloned())
    }

    async fn load_campaign(&self, id: i64) -> Result<Option<Campaign>, BoxedError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.campaigns.get(&id).cloned())
    }

    async fn load_organization(&self, id: i64) -> Result<Option<Organization>, BoxedError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.organizations.get(&id).cloned())
    }
}
