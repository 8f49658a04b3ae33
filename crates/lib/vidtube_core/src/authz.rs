//! Ownership guard.

use uuid::Uuid;

use crate::error::Error;

/// Authorize a mutation by comparing the resource's recorded owner to the
/// acting identity. No administrator elevation exists in this design.
pub fn authorize_owner(resource_owner: Uuid, actor: Uuid) -> Result<(), Error> {
    if resource_owner == actor {
        Ok(())
    } else {
        Err(Error::PermissionDenied(
            "you do not own this resource".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_allowed() {
        let id = Uuid::new_v4();
        assert!(authorize_owner(id, id).is_ok());
    }

    #[test]
    fn non_owner_is_denied() {
        let result = authorize_owner(Uuid::new_v4(), Uuid::new_v4());
        assert!(matches!(result, Err(Error::PermissionDenied(_))));
    }
}
