//! Media entity definitions.
//!
//! A [`Media`] item carries shared catalog fields plus a kind-specific
//! [`MediaDetails`] payload. Reservation and lending are tracked with the raw
//! flags and holder fields that the catalog file stores, and
//! [`Media::lending_state`] exposes them as a single state.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Kind of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// A printed book.
    Book,
    /// A DVD.
    Dvd,
    /// A software package.
    Software,
}

impl MediaKind {
    /// All kinds, in catalog display order.
    pub const ALL: [MediaKind; 3] = [MediaKind::Book, MediaKind::Dvd, MediaKind::Software];

    /// Returns the type tag written to the catalog file.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Book => "Buch",
            Self::Dvd => "DVD",
            Self::Software => "Software",
        }
    }

    /// Parses a catalog type tag. Tags are matched exactly.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "Buch" => Some(Self::Book),
            "DVD" => Some(Self::Dvd),
            "Software" => Some(Self::Software),
            _ => None,
        }
    }

    /// Returns the identifier prefix used for generated identifiers.
    pub fn id_prefix(&self) -> char {
        match self {
            Self::Book => 'B',
            Self::Dvd => 'D',
            Self::Software => 'S',
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Kind-specific payload of a media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaDetails {
    /// Book payload.
    Book {
        /// Publisher name.
        publisher: String,
    },
    /// DVD payload.
    Dvd {
        /// Running time in minutes.
        duration_minutes: i32,
    },
    /// Software payload.
    Software {
        /// Target operating system.
        operating_system: String,
    },
}

impl MediaDetails {
    /// Returns the kind this payload belongs to.
    pub fn kind(&self) -> MediaKind {
        match self {
            Self::Book { .. } => MediaKind::Book,
            Self::Dvd { .. } => MediaKind::Dvd,
            Self::Software { .. } => MediaKind::Software,
        }
    }

    /// Returns the payload as the single "extra" text field.
    pub fn extra_field(&self) -> String {
        match self {
            Self::Book { publisher } => publisher.clone(),
            Self::Dvd { duration_minutes } => duration_minutes.to_string(),
            Self::Software { operating_system } => operating_system.clone(),
        }
    }

    /// Builds a payload of the given kind from its text form.
    ///
    /// Returns `None` when a DVD duration is not an integer.
    pub fn from_extra_field(kind: MediaKind, extra: &str) -> Option<Self> {
        match kind {
            MediaKind::Book => Some(Self::Book {
                publisher: extra.to_string(),
            }),
            MediaKind::Dvd => extra
                .trim()
                .parse()
                .ok()
                .map(|duration_minutes| Self::Dvd { duration_minutes }),
            MediaKind::Software => Some(Self::Software {
                operating_system: extra.to_string(),
            }),
        }
    }
}

/// Status derived from the lending flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaStatus {
    /// Neither lent nor reserved.
    Available,
    /// Reserved by a user.
    Reserved,
    /// Lent to a user.
    Lent,
}

impl MediaStatus {
    /// Returns the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Lent => "lent",
        }
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lending state of a media item.
///
/// Lent takes precedence over reserved, matching [`MediaStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LendingState {
    /// Free to reserve or lend.
    Available,
    /// Held for a user. The holder is absent after a legacy toggle.
    Reserved { by: Option<String> },
    /// Lent out. Borrower and time are absent after a legacy toggle.
    Lent {
        to: Option<String>,
        since: Option<DateTime<FixedOffset>>,
    },
}

/// A single catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Unique identifier (unique case-insensitively across the catalog).
    pub id: String,
    /// Title.
    pub title: String,
    /// Author, director or manufacturer.
    pub creator: String,
    /// Kind-specific payload.
    pub details: MediaDetails,
    /// Whether the item is lent out.
    pub is_lent: bool,
    /// Whether the item is reserved.
    pub is_reserved: bool,
    /// User holding the reservation.
    pub reserved_by: Option<String>,
    /// User the item is lent to.
    pub lent_to: Option<String>,
    /// When the item was lent.
    pub lent_at: Option<DateTime<FixedOffset>>,
}

impl Media {
    /// Creates a new available item.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        creator: impl Into<String>,
        details: MediaDetails,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            creator: creator.into(),
            details,
            is_lent: false,
            is_reserved: false,
            reserved_by: None,
            lent_to: None,
            lent_at: None,
        }
    }

    /// Creates a new book.
    pub fn book(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        publisher: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            title,
            author,
            MediaDetails::Book {
                publisher: publisher.into(),
            },
        )
    }

    /// Creates a new DVD.
    pub fn dvd(
        id: impl Into<String>,
        title: impl Into<String>,
        director: impl Into<String>,
        duration_minutes: i32,
    ) -> Self {
        Self::new(id, title, director, MediaDetails::Dvd { duration_minutes })
    }

    /// Creates a new software item.
    pub fn software(
        id: impl Into<String>,
        title: impl Into<String>,
        manufacturer: impl Into<String>,
        operating_system: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            title,
            manufacturer,
            MediaDetails::Software {
                operating_system: operating_system.into(),
            },
        )
    }

    /// Returns the kind of this item.
    pub fn kind(&self) -> MediaKind {
        self.details.kind()
    }

    /// Returns the derived status.
    pub fn status(&self) -> MediaStatus {
        if self.is_lent {
            MediaStatus::Lent
        } else if self.is_reserved {
            MediaStatus::Reserved
        } else {
            MediaStatus::Available
        }
    }

    /// Returns the lending state.
    pub fn lending_state(&self) -> LendingState {
        match self.status() {
            MediaStatus::Lent => LendingState::Lent {
                to: self.lent_to.clone(),
                since: self.lent_at,
            },
            MediaStatus::Reserved => LendingState::Reserved {
                by: self.reserved_by.clone(),
            },
            MediaStatus::Available => LendingState::Available,
        }
    }

    /// Returns true if the identifier matches, ignoring case.
    pub fn has_id(&self, id: &str) -> bool {
        eq_ignore_case(&self.id, id)
    }

    /// Returns true if the item is actively reserved by `username`, ignoring case.
    pub fn is_reserved_by(&self, username: &str) -> bool {
        self.is_reserved
            && self
                .reserved_by
                .as_deref()
                .is_some_and(|holder| eq_ignore_case(holder, username))
    }

    /// Reserves the item for `username` and clears any lending.
    ///
    /// An existing reservation is overwritten.
    pub fn reserve(&mut self, username: &str) {
        self.is_reserved = true;
        self.is_lent = false;
        self.reserved_by = non_blank(username);
    }

    /// Clears the reservation. Lending is left untouched.
    pub fn cancel_reservation(&mut self) {
        self.is_reserved = false;
        self.reserved_by = None;
    }

    /// Lends the item to `username` at `at` and clears any reservation.
    pub fn lend(&mut self, username: &str, at: DateTime<FixedOffset>) {
        self.is_lent = true;
        self.is_reserved = false;
        self.reserved_by = None;
        self.lent_to = non_blank(username);
        self.lent_at = Some(at);
    }

    /// Takes the item back. The reservation is left untouched.
    pub fn return_item(&mut self) {
        self.is_lent = false;
        self.lent_to = None;
        self.lent_at = None;
    }

    /// Legacy lending toggle.
    ///
    /// Turning lending on clears the reservation but records no borrower;
    /// turning it off clears borrower and time. Returns the new flag.
    pub fn toggle_lent(&mut self) -> bool {
        self.is_lent = !self.is_lent;
        if self.is_lent {
            self.is_reserved = false;
            self.reserved_by = None;
        } else {
            self.lent_to = None;
            self.lent_at = None;
        }
        self.is_lent
    }

    /// Legacy reservation toggle.
    ///
    /// Turning the reservation on clears the lent flag and keeps
    /// `reserved_by` as it was; turning it off clears the holder. Returns
    /// the new flag.
    pub fn toggle_reserved(&mut self) -> bool {
        self.is_reserved = !self.is_reserved;
        if self.is_reserved {
            self.is_lent = false;
        } else {
            self.reserved_by = None;
        }
        self.is_reserved
    }

    /// Returns true if title, creator or identifier contains `needle`, ignoring case.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.title, &self.creator, &self.id]
            .iter()
            .any(|field| !field.is_empty() && field.to_lowercase().contains(&needle))
    }

    /// Returns a one-line description of the item.
    pub fn info(&self) -> String {
        match &self.details {
            MediaDetails::Book { publisher } => format!(
                "Buch: {}, Autor: {}, Verlag: {}, ID: {}",
                self.title, self.creator, publisher, self.id
            ),
            MediaDetails::Dvd { duration_minutes } => format!(
                "DVD: {}, Regisseur: {}, Dauer: {} Minuten, ID: {}",
                self.title, self.creator, duration_minutes, self.id
            ),
            MediaDetails::Software { operating_system } => format!(
                "Software: {}, Hersteller: {}, OS: {}, ID: {}",
                self.title, self.creator, operating_system, self.id
            ),
        }
    }
}

/// Case-insensitive string equality used for identifiers and user names.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
