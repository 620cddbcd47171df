//! Rights calls.

use super::AdminClient;
use crate::grant::Grant;
use crate::parser::Collection;
use crate::request::{GrantTarget, Grantee, RequestDescriptor, Right};
use crate::Result;
use serde_json::Value;

impl AdminClient {
    /// Grants a right on a target.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn grant_right(
        &self,
        target: &GrantTarget,
        grantee: &Grantee,
        right: &Right,
    ) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::grant_right(target, grantee, right))
            .await
    }

    /// Revokes a right on a target.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn revoke_right(
        &self,
        target: &GrantTarget,
        grantee: &Grantee,
        right: &Right,
    ) -> Result<Value> {
        self.perform_ack(&RequestDescriptor::revoke_right(target, grantee, right))
            .await
    }

    /// Grants held on a target, by a grantee, or both.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn get_grants(
        &self,
        target: Option<&GrantTarget>,
        grantee: Option<&Grantee>,
    ) -> Result<Collection<Grant>> {
        self.perform_request(&RequestDescriptor::get_grants(target, grantee))
            .await?
            .into_typed_collection()
    }
}
