//! User management.

use serde::Deserialize;
use store::{
    MarketplaceStore, MarketplaceStoreExt, NewUser, Preference, PreferencePatch, User, UserId,
    UserPatch, UserQuery,
};

use crate::error::DomainError;
use crate::validation::{self, NAME_MAX_CHARS};

/// Body of a create-user request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    #[serde(default)]
    pub user_preference: PreferenceInput,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceInput {
    #[serde(default)]
    pub receive_email: bool,
}

/// Body of a user patch request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchUser {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub user_preference: Option<PatchPreference>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPreference {
    pub receive_email: Option<bool>,
}

impl CreateUser {
    pub fn validate(self) -> Result<NewUser, DomainError> {
        validation::email(&self.email)?;
        validation::bounded("firstName", &self.first_name, NAME_MAX_CHARS)?;
        validation::bounded("lastName", &self.last_name, NAME_MAX_CHARS)?;
        validation::non_empty("address", &self.address)?;

        Ok(NewUser {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            address: self.address,
            preference: Preference {
                receive_email: self.user_preference.receive_email,
            },
        })
    }
}

impl PatchUser {
    /// Checks only the fields that are present.
    pub fn validate(self) -> Result<UserPatch, DomainError> {
        if let Some(email) = &self.email {
            validation::email(email)?;
        }
        if let Some(first_name) = &self.first_name {
            validation::bounded("firstName", first_name, NAME_MAX_CHARS)?;
        }
        if let Some(last_name) = &self.last_name {
            validation::bounded("lastName", last_name, NAME_MAX_CHARS)?;
        }
        if let Some(address) = &self.address {
            validation::non_empty("address", address)?;
        }

        Ok(UserPatch {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            address: self.address,
            preference: self.user_preference.map(|p| PreferencePatch {
                receive_email: p.receive_email,
            }),
        })
    }
}

/// Service for managing user accounts.
pub struct UserService<S: MarketplaceStore> {
    store: S,
}

impl<S: MarketplaceStore> UserService<S> {
    /// Creates a new user service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a user together with its preference record.
    #[tracing::instrument(skip(self, request))]
    pub async fn create_user(&self, request: CreateUser) -> Result<User, DomainError> {
        let user = self.store.create_user(request.validate()?).await?;
        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, id: UserId) -> Result<User, DomainError> {
        Ok(self.store.require_user(id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_users(&self, query: UserQuery) -> Result<Vec<User>, DomainError> {
        Ok(self.store.list_users(query).await?)
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn update_user(&self, id: UserId, request: PatchUser) -> Result<User, DomainError> {
        Ok(self.store.update_user(id, request.validate()?).await?)
    }

    /// Deletes a user; preference, saved products and orders go with it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: UserId) -> Result<(), DomainError> {
        self.store.delete_user(id).await?;
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(email: &str, first_name: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: "Kim".to_string(),
            address: "Busan".to_string(),
            user_preference: PreferenceInput {
                receive_email: true,
            },
        }
    }

    #[test]
    fn create_user_validation() {
        let user = create("kim@example.com", "Minji").validate().unwrap();
        assert!(user.preference.receive_email);

        assert!(create("kim.example.com", "Minji").validate().is_err());
        assert!(create("kim@example.com", "").validate().is_err());
        assert!(create("kim@example.com", &"x".repeat(31)).validate().is_err());
    }

    #[test]
    fn patch_checks_present_fields_only() {
        let patch = PatchUser {
            address: Some("Daegu".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());

        let patch = PatchUser {
            address: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(patch.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn preference_defaults_to_no_email() {
        let request: CreateUser = serde_json::from_value(serde_json::json!({
            "email": "a@b.c",
            "firstName": "A",
            "lastName": "B",
            "address": "C"
        }))
        .unwrap();
        assert!(!request.user_preference.receive_email);
    }
}
