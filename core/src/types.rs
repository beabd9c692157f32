//! License and seat-holder types.
//!
//! This module defines the records a parse pass produces: one [`License`]
//! per product seen in a status dump, each holding the [`LicenseUser`]s that
//! currently have a seat checked out. The types serialize with [`serde`] so
//! reports can be emitted as JSON or YAML.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A user currently holding one or more seats of a [`License`].
///
/// # Examples
///
/// ```
/// use license_monitor_core::LicenseUser;
///
/// let mut user = LicenseUser::new("jdoe");
/// assert_eq!(user.seats_in_use, 1);
/// assert!(user.checkout_time.is_none());
///
/// user.add_seat();
/// assert_eq!(user.seats_in_use, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseUser {
    /// User name as reported by the license server.
    pub name: String,
    /// Number of concurrent checkouts held by this user (at least 1).
    pub seats_in_use: u32,
    /// When the session began, in server-local time.
    ///
    /// `None` when the dump never reported a start time for this user.
    pub checkout_time: Option<NaiveDateTime>,
}

impl LicenseUser {
    /// Creates a user holding a single seat with no known checkout time.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            seats_in_use: 1,
            checkout_time: None,
        }
    }

    /// Sets the checkout time.
    pub fn with_checkout_time(mut self, checkout_time: NaiveDateTime) -> Self {
        self.checkout_time = Some(checkout_time);
        self
    }

    /// Records one more concurrent checkout by the same identity.
    pub fn add_seat(&mut self) {
        self.seats_in_use += 1;
    }
}

/// Seat capacity and current holders for one product.
///
/// # Examples
///
/// ```
/// use license_monitor_core::{License, LicenseUser};
///
/// let mut license = License::with_seats("Revit", 10);
/// assert!(license.insert_user(LicenseUser::new("jdoe")));
/// assert!(!license.insert_user(LicenseUser::new("jdoe")));
///
/// assert_eq!(license.users.len(), 1);
/// assert_eq!(license.usage().to_string(), "1 / 10 licenses in use.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Product display name, unique within a table.
    pub name: String,
    /// Total concurrent-use capacity accumulated for this product.
    pub seats_available: u32,
    /// Current holders, keyed by user name.
    pub users: BTreeMap<String, LicenseUser>,
}

impl License {
    /// Creates a license with no seats and no users.
    pub fn new(name: &str) -> Self {
        Self::with_seats(name, 0)
    }

    /// Creates a license with the given seat capacity.
    pub fn with_seats(name: &str, seats_available: u32) -> Self {
        Self {
            name: name.to_string(),
            seats_available,
            users: BTreeMap::new(),
        }
    }

    /// Inserts `user` unless a user with the same name already holds a seat.
    ///
    /// Returns `true` when the user was inserted. The existing entry is left
    /// untouched otherwise.
    pub fn insert_user(&mut self, user: LicenseUser) -> bool {
        if self.users.contains_key(&user.name) {
            return false;
        }
        self.users.insert(user.name.clone(), user);
        true
    }

    /// Records a checkout by `name`, adding a seat to an existing holder.
    ///
    /// Returns the holder after the update.
    pub fn checkout(&mut self, name: &str) -> &mut LicenseUser {
        self.users
            .entry(name.to_string())
            .and_modify(LicenseUser::add_seat)
            .or_insert_with(|| LicenseUser::new(name))
    }

    /// Returns the holder named `name`.
    pub fn user(&self, name: &str) -> Option<&LicenseUser> {
        self.users.get(name)
    }

    /// Returns a mutable reference to the holder named `name`.
    pub fn user_mut(&mut self, name: &str) -> Option<&mut LicenseUser> {
        self.users.get_mut(name)
    }

    /// Number of distinct users holding at least one seat.
    pub fn holders(&self) -> usize {
        self.users.len()
    }

    /// Returns the in-use / available summary for this license.
    pub fn usage(&self) -> LicenseUsage {
        LicenseUsage {
            name: self.name.clone(),
            in_use: self.holders(),
            available: self.seats_available,
        }
    }
}

/// In-use versus available seat counts for one product.
///
/// `in_use` counts distinct holders, matching what a license dashboard
/// shows next to the product list.
///
/// # Examples
///
/// ```
/// use license_monitor_core::LicenseUsage;
///
/// let usage = LicenseUsage { name: "SAP 2023".into(), in_use: 5, available: 5 };
/// assert!(!usage.has_free_seat());
/// assert_eq!(usage.to_string(), "5 / 5 licenses in use.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseUsage {
    pub name: String,
    pub in_use: usize,
    pub available: u32,
}

impl LicenseUsage {
    /// Returns `true` when at least one more user could check out a seat.
    pub fn has_free_seat(&self) -> bool {
        (self.available as usize) > self.in_use
    }
}

impl std::fmt::Display for LicenseUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {} licenses in use.", self.in_use, self.available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_insert_user_keeps_first_occurrence() {
        let mut license = License::with_seats("Revit", 2);
        assert!(license.insert_user(LicenseUser::new("jdoe").with_checkout_time(at(8, 0))));
        assert!(!license.insert_user(LicenseUser::new("jdoe").with_checkout_time(at(9, 0))));

        let user = license.user("jdoe").unwrap();
        assert_eq!(user.seats_in_use, 1);
        assert_eq!(user.checkout_time, Some(at(8, 0)));
    }

    #[test]
    fn test_checkout_increments_existing_holder() {
        let mut license = License::new("SAP 2023");
        license.checkout("jdoe");
        license.checkout("asmith");
        let user = license.checkout("jdoe");
        assert_eq!(user.seats_in_use, 2);
        assert_eq!(license.holders(), 2);
    }

    #[test]
    fn test_usage_counts_holders_not_seats() {
        let mut license = License::with_seats("SAP 2023", 2);
        license.checkout("jdoe");
        license.checkout("jdoe");
        let usage = license.usage();
        assert_eq!(usage.in_use, 1);
        assert!(usage.has_free_seat());
    }

    #[test]
    fn test_license_serializes_users_by_name() {
        let mut license = License::with_seats("Revit", 3);
        license.insert_user(LicenseUser::new("zed"));
        license.insert_user(LicenseUser::new("amy"));

        let json = serde_json::to_value(&license).unwrap();
        let names: Vec<&str> = json["users"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(names, vec!["amy", "zed"]);
        assert_eq!(json["seats_available"], 3);
    }
}
