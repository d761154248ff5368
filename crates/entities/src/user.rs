//! User account entity definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a user account.
///
/// Serialized by name so that stored files stay readable across versions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    /// May do everything, including user management.
    Admin,
    /// May manage, lend and take back media.
    #[serde(rename = "Bibliothekar")]
    Librarian,
    /// May search and hold a limited number of reservations.
    #[default]
    #[serde(rename = "Gast")]
    Guest,
}

impl UserRole {
    /// Returns the stored name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Librarian => "Bibliothekar",
            Self::Guest => "Gast",
        }
    }

    /// Checks if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Checks if this role may manage media (admins included)
    pub fn is_librarian(&self) -> bool {
        matches!(self, Self::Admin | Self::Librarian)
    }

    /// Checks if this role is a guest
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A login account.
///
/// Passwords are kept and compared as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name, unique ignoring case.
    #[serde(rename = "Benutzername", alias = "benutzername", alias = "username")]
    pub username: String,
    /// Plain-text password.
    #[serde(rename = "Passwort", alias = "passwort", alias = "password")]
    pub password: String,
    /// Role of the account.
    #[serde(rename = "Rolle", alias = "rolle", alias = "role", default)]
    pub role: UserRole,
}

impl User {
    /// Creates a new user.
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: UserRole) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role,
        }
    }

    /// Returns true for librarians and admins.
    pub fn is_librarian(&self) -> bool {
        self.role.is_librarian()
    }

    /// Returns true for guests.
    pub fn is_guest(&self) -> bool {
        self.role.is_guest()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.role)
    }
}
