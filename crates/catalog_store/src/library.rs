//! The library catalog store.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Local};
use entities::{
    eq_ignore_case, LendingAction, LendingHistoryEntry, Media, MediaDetails, MediaKind,
};

use crate::{CatalogError, CatalogResult, CatalogStorage, CsvFileStorage};

/// Maximum number of concurrent reservations a guest may hold.
pub const DEFAULT_GUEST_RESERVATION_LIMIT: usize = 5;

/// Borrower recorded when an item is lent without a known holder.
pub const UNKNOWN_BORROWER: &str = "Unbekannt";

/// The media catalog.
///
/// Holds every item in display order (newest additions first, loaded items
/// in file order) and writes the whole catalog to its storage after every
/// successful change. Storage failures are logged and do not undo the
/// in-memory change.
#[derive(Debug)]
pub struct Library<S = CsvFileStorage> {
    storage: S,
    media: Vec<Media>,
    history: Vec<LendingHistoryEntry>,
    guest_reservation_limit: usize,
}

impl Library<CsvFileStorage> {
    /// Opens the catalog file at `path`, creating it if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let storage = CsvFileStorage::new(path);
        if let Err(e) = storage.ensure_exists() {
            tracing::error!(error = %e, "Failed to create catalog file");
        }
        Self::new(storage)
    }
}

impl<S: CatalogStorage> Library<S> {
    /// Creates a library over `storage` and loads its contents.
    pub fn new(storage: S) -> Self {
        let mut library = Self {
            storage,
            media: Vec::new(),
            history: Vec::new(),
            guest_reservation_limit: DEFAULT_GUEST_RESERVATION_LIMIT,
        };
        library.reload();
        library
    }

    /// Sets the guest reservation limit.
    pub fn with_guest_reservation_limit(mut self, limit: usize) -> Self {
        self.guest_reservation_limit = limit;
        self
    }

    /// Returns the guest reservation limit.
    pub fn guest_reservation_limit(&self) -> usize {
        self.guest_reservation_limit
    }

    /// Replaces the in-memory catalog with the stored one.
    ///
    /// On failure the catalog is left empty.
    pub fn reload(&mut self) {
        self.media = match self.storage.load() {
            Ok(media) => media,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load catalog");
                Vec::new()
            }
        };
        tracing::info!(count = self.media.len(), "Catalog loaded");
    }

    /// Writes the whole catalog to storage. Failures are logged.
    pub fn persist(&mut self) {
        if let Err(e) = self.storage.save(&self.media) {
            tracing::error!(error = %e, "Failed to save catalog");
        }
    }

    /// Returns the storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ========== Read views ==========

    /// Returns all items in display order.
    pub fn media(&self) -> &[Media] {
        &self.media
    }

    /// Returns the items of one kind, in display order.
    pub fn by_kind(&self, kind: MediaKind) -> impl Iterator<Item = &Media> + '_ {
        self.media.iter().filter(move |m| m.kind() == kind)
    }

    /// Returns all books.
    pub fn books(&self) -> impl Iterator<Item = &Media> + '_ {
        self.by_kind(MediaKind::Book)
    }

    /// Returns all DVDs.
    pub fn dvds(&self) -> impl Iterator<Item = &Media> + '_ {
        self.by_kind(MediaKind::Dvd)
    }

    /// Returns all software items.
    pub fn software(&self) -> impl Iterator<Item = &Media> + '_ {
        self.by_kind(MediaKind::Software)
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.media.len()
    }

    /// Returns true if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    /// Looks up an item by identifier, ignoring case.
    pub fn get(&self, id: &str) -> Option<&Media> {
        self.media.iter().find(|m| m.has_id(id))
    }

    /// Returns the items whose title, creator or identifier contains
    /// `query`, ignoring case. A blank query matches everything.
    pub fn search(&self, query: &str) -> Vec<&Media> {
        let query = query.trim();
        self.media
            .iter()
            .filter(|m| query.is_empty() || m.matches(query))
            .collect()
    }

    /// Like [`Library::search`], restricted to one kind.
    pub fn search_kind(&self, kind: MediaKind, query: &str) -> Vec<&Media> {
        self.search(query)
            .into_iter()
            .filter(|m| m.kind() == kind)
            .collect()
    }

    /// Returns the next free identifier for `kind`, e.g. `B007`.
    pub fn next_identifier(&self, kind: MediaKind) -> String {
        let prefix = kind.id_prefix();
        let max = self
            .media
            .iter()
            .filter_map(|m| m.id.strip_prefix(prefix))
            .filter_map(|rest| rest.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        format!("{prefix}{:03}", max.saturating_add(1))
    }

    // ========== Add / remove ==========

    /// Adds an item at the front of the catalog.
    ///
    /// Fails if the title or identifier is blank, or if another item
    /// already uses the identifier (ignoring case).
    pub fn add_medium(&mut self, media: Media) -> CatalogResult<()> {
        if media.title.trim().is_empty() {
            return Err(CatalogError::Validation("title must not be empty".to_string()));
        }
        if media.id.trim().is_empty() {
            return Err(CatalogError::Validation(
                "identifier must not be empty".to_string(),
            ));
        }
        if self.get(&media.id).is_some() {
            return Err(CatalogError::duplicate(media.id));
        }

        tracing::info!(id = %media.id, kind = %media.kind(), "Adding medium");
        self.media.insert(0, media);
        self.persist();
        Ok(())
    }

    /// Builds an item from user input, assigns the next free identifier and
    /// adds it. Returns the new item.
    pub fn create_medium(
        &mut self,
        kind: MediaKind,
        title: &str,
        creator: &str,
        extra: &str,
    ) -> CatalogResult<&Media> {
        if title.trim().is_empty() || creator.trim().is_empty() {
            return Err(CatalogError::Validation(
                "title and creator are required".to_string(),
            ));
        }
        let details = MediaDetails::from_extra_field(kind, extra).ok_or_else(|| {
            CatalogError::Validation(format!("duration must be a number: '{extra}'"))
        })?;

        let id = self.next_identifier(kind);
        self.add_medium(Media::new(id, title, creator, details))?;
        Ok(&self.media[0])
    }

    /// Removes an item. Returns `None` without touching storage if no item
    /// has the identifier.
    ///
    /// Lent items are removed too; use [`Library::remove_as`] for the
    /// guarded variant.
    pub fn remove_medium(&mut self, id: &str) -> Option<Media> {
        let index = self.media.iter().position(|m| m.has_id(id))?;
        let removed = self.media.remove(index);

        tracing::info!(id = %removed.id, "Removed medium");
        self.persist();
        Some(removed)
    }

    // ========== Lending and reservations ==========

    /// Reserves an item for `username`, replacing any reservation or lending.
    pub fn reserve(&mut self, id: &str, username: &str) -> CatalogResult<()> {
        self.transition(id, LendingAction::Reserved, |m, _| m.reserve(username))
    }

    /// Clears the reservation of an item.
    pub fn cancel_reservation(&mut self, id: &str) -> CatalogResult<()> {
        self.transition(id, LendingAction::ReservationCancelled, |m, _| {
            m.cancel_reservation()
        })
    }

    /// Lends an item to `username` as of now, clearing any reservation.
    pub fn lend(&mut self, id: &str, username: &str) -> CatalogResult<()> {
        self.transition(id, LendingAction::Lent, |m, now| m.lend(username, now))
    }

    /// Takes a lent item back.
    pub fn return_item(&mut self, id: &str) -> CatalogResult<()> {
        self.transition(id, LendingAction::Returned, |m, _| m.return_item())
    }

    /// Legacy lending toggle. Returns the new lent flag.
    ///
    /// Prefer [`Library::lend`] and [`Library::return_item`].
    pub fn toggle_lent(&mut self, id: &str) -> CatalogResult<bool> {
        let media = self.get_mut(id)?;
        let lent = media.toggle_lent();
        tracing::debug!(id, lent, "Toggled lent flag");
        self.persist();
        Ok(lent)
    }

    /// Legacy reservation toggle. Returns the new reserved flag.
    ///
    /// Prefer [`Library::reserve`] and [`Library::cancel_reservation`].
    pub fn toggle_reserved(&mut self, id: &str) -> CatalogResult<bool> {
        let media = self.get_mut(id)?;
        let reserved = media.toggle_reserved();
        tracing::debug!(id, reserved, "Toggled reserved flag");
        self.persist();
        Ok(reserved)
    }

    /// Counts the active reservations held by `username`, ignoring case.
    pub fn reservation_count(&self, username: &str) -> usize {
        if username.trim().is_empty() {
            return 0;
        }
        self.media
            .iter()
            .filter(|m| m.is_reserved_by(username))
            .count()
    }

    /// Returns true if a guest named `username` may take another reservation.
    pub fn can_guest_reserve(&self, username: &str) -> bool {
        self.reservation_count(username) < self.guest_reservation_limit
    }

    // ========== History ==========

    /// Returns the lending history of this session, oldest first.
    pub fn history(&self) -> &[LendingHistoryEntry] {
        &self.history
    }

    /// Returns the history entries involving `username`, ignoring case.
    pub fn history_for<'a>(
        &'a self,
        username: &'a str,
    ) -> impl Iterator<Item = &'a LendingHistoryEntry> + 'a {
        self.history.iter().filter(move |entry| {
            entry
                .user
                .as_deref()
                .is_some_and(|user| eq_ignore_case(user, username))
        })
    }

    fn get_mut(&mut self, id: &str) -> CatalogResult<&mut Media> {
        self.media
            .iter_mut()
            .find(|m| m.has_id(id))
            .ok_or_else(|| CatalogError::medium_not_found(id))
    }

    fn transition(
        &mut self,
        id: &str,
        action: LendingAction,
        apply: impl FnOnce(&mut Media, DateTime<FixedOffset>),
    ) -> CatalogResult<()> {
        let now = Local::now().fixed_offset();
        let media = self.get_mut(id)?;
        let previous_holder = media.reserved_by.clone();
        let previous_borrower = media.lent_to.clone();

        apply(media, now);

        let user = match action {
            LendingAction::Reserved => media.reserved_by.clone(),
            LendingAction::Lent => media.lent_to.clone(),
            LendingAction::ReservationCancelled => previous_holder.or(previous_borrower),
            LendingAction::Returned => previous_borrower.or(previous_holder),
        };
        tracing::debug!(id = %media.id, ?action, status = %media.status(), "Lending transition");

        let entry = LendingHistoryEntry::new(media.id.clone(), user, now, action);
        self.history.push(entry);
        self.persist();
        Ok(())
    }
}
