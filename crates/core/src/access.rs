//! Vessel-level access control

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::FleetRepository;
use crate::user::Role;
use crate::Result;

/// The authenticated identity behind a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Admins may access every vessel; crew only the vessels they are assigned to.
pub async fn can_access_vessel<R>(repo: &R, principal: &Principal, vessel_id: Uuid) -> Result<bool>
where
    R: FleetRepository + ?Sized,
{
    if principal.is_admin() {
        return Ok(true);
    }
    Ok(repo.find_assignment(principal.id, vessel_id).await?.is_some())
}
