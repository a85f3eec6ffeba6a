use crate::core::error::{ServiceError, ServiceResult};
use crate::models::{BrokerId, Interest, Principal, Profile};

/// Who may pass the ownership gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only the owning broker
    Owner,
    /// The owning broker, or an admin acting on their behalf
    OwnerOrAdmin,
}

/// Something the gate can name in a `Forbidden` error
pub trait Guarded {
    const KIND: &'static str;

    fn key(&self) -> String;
}

impl Guarded for Profile {
    const KIND: &'static str = "profile";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Guarded for Interest {
    const KIND: &'static str = "interest";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

/// Ownership gate shared by every read and write path
///
/// `owner_of` extracts the owning broker from the entity. Hands the entity
/// back when `principal` may act on it, `Forbidden` otherwise.
pub fn authorize<E, F>(entity: E, owner_of: F, principal: &Principal, access: Access) -> ServiceResult<E>
where
    E: Guarded,
    F: FnOnce(&E) -> BrokerId,
{
    let owner = owner_of(&entity);
    let admin_override = access == Access::OwnerOrAdmin && principal.is_admin();

    if owner == principal.id || admin_override {
        return Ok(entity);
    }

    tracing::warn!(
        "Ownership check failed: broker {} on {} {}",
        principal.id,
        E::KIND,
        entity.key()
    );
    Err(ServiceError::forbidden(E::KIND, entity.key(), principal.id))
}

/// Gate for profiles, whose owner is stored on the record
pub fn authorize_profile(profile: Profile, principal: &Principal, access: Access) -> ServiceResult<Profile> {
    authorize(profile, |p| p.owner_id, principal, access)
}
