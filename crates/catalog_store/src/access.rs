//! Role-aware catalog operations.
//!
//! These wrap the plain [`Library`] operations with the checks that depend
//! on who is acting: only librarians manage and lend media, guests are held
//! to the reservation limit, and nobody takes over another user's
//! reservation.

use entities::{Media, MediaKind, User};

use crate::{CatalogError, CatalogResult, CatalogStorage, Library, UNKNOWN_BORROWER};

impl<S: CatalogStorage> Library<S> {
    /// Returns true if `user` may reserve the item right now.
    pub fn can_reserve(&self, user: &User, id: &str) -> bool {
        let Some(media) = self.get(id) else {
            return false;
        };
        self.check_reservable(user, media).is_ok()
    }

    /// Reserves an item on behalf of `user`.
    ///
    /// Fails if the item is lent, reserved by someone else, or if a guest
    /// has reached the reservation limit.
    pub fn reserve_as(&mut self, user: &User, id: &str) -> CatalogResult<()> {
        let media = self.get(id).ok_or_else(|| CatalogError::medium_not_found(id))?;
        self.check_reservable(user, media)?;
        self.reserve(id, &user.username)
    }

    /// Cancels the reservation if there is one, otherwise reserves the item.
    /// Returns the new reserved flag.
    ///
    /// Librarians may cancel any reservation, everybody else only their own.
    /// Guests may not touch lent items.
    pub fn toggle_reservation_as(&mut self, user: &User, id: &str) -> CatalogResult<bool> {
        let media = self.get(id).ok_or_else(|| CatalogError::medium_not_found(id))?;

        if user.is_guest() && media.is_lent {
            return Err(CatalogError::PermissionDenied(
                "guests cannot change a lent medium".to_string(),
            ));
        }

        if media.is_reserved {
            if !user.is_librarian() && !media.is_reserved_by(&user.username) {
                return Err(reservation_held(media));
            }
            self.cancel_reservation(id)?;
            return Ok(false);
        }

        self.reserve_as(user, id)?;
        Ok(true)
    }

    /// Lends the item to its reservation holder (or an unknown borrower), or
    /// takes it back if it is lent. Returns the new lent flag.
    pub fn toggle_lending_as(&mut self, user: &User, id: &str) -> CatalogResult<bool> {
        require_librarian(user, "change the lending status")?;
        let media = self.get(id).ok_or_else(|| CatalogError::medium_not_found(id))?;

        if media.is_lent {
            self.return_item(id)?;
            return Ok(false);
        }

        let borrower = media
            .reserved_by
            .clone()
            .unwrap_or_else(|| UNKNOWN_BORROWER.to_string());
        self.lend(id, &borrower)?;
        Ok(true)
    }

    /// Adds an item on behalf of `user`.
    pub fn add_as(&mut self, user: &User, media: Media) -> CatalogResult<()> {
        require_librarian(user, "add media")?;
        self.add_medium(media)
    }

    /// Creates an item with a generated identifier on behalf of `user`.
    pub fn create_as(
        &mut self,
        user: &User,
        kind: MediaKind,
        title: &str,
        creator: &str,
        extra: &str,
    ) -> CatalogResult<&Media> {
        require_librarian(user, "add media")?;
        self.create_medium(kind, title, creator, extra)
    }

    /// Removes an item on behalf of `user`. Lent items cannot be removed.
    pub fn remove_as(&mut self, user: &User, id: &str) -> CatalogResult<Media> {
        require_librarian(user, "remove media")?;
        let media = self.get(id).ok_or_else(|| CatalogError::medium_not_found(id))?;
        if media.is_lent {
            return Err(CatalogError::MediumLent {
                id: media.id.clone(),
            });
        }

        self.remove_medium(id)
            .ok_or_else(|| CatalogError::medium_not_found(id))
    }

    fn check_reservable(&self, user: &User, media: &Media) -> CatalogResult<()> {
        if media.is_lent {
            return Err(CatalogError::MediumLent {
                id: media.id.clone(),
            });
        }

        if media.is_reserved && !media.is_reserved_by(&user.username) {
            return Err(reservation_held(media));
        }

        if user.is_guest()
            && !media.is_reserved_by(&user.username)
            && !self.can_guest_reserve(&user.username)
        {
            return Err(CatalogError::QuotaExceeded {
                user: user.username.clone(),
                limit: self.guest_reservation_limit(),
            });
        }

        Ok(())
    }
}

fn require_librarian(user: &User, action: &str) -> CatalogResult<()> {
    if user.is_librarian() {
        Ok(())
    } else {
        Err(CatalogError::PermissionDenied(format!(
            "{} may not {action}",
            user.username
        )))
    }
}

fn reservation_held(media: &Media) -> CatalogError {
    CatalogError::ReservationHeld {
        id: media.id.clone(),
        holder: media
            .reserved_by
            .clone()
            .unwrap_or_else(|| UNKNOWN_BORROWER.to_string()),
    }
}
