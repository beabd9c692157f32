//! The license aggregate built by one parse pass.

use std::collections::{BTreeMap, btree_map};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::{License, LicenseUsage, LicenseUser};

/// Placeholder emitted by [`LicenseTable::users_of`] when nobody holds a seat.
pub const NO_LICENSES_IN_USE: &str = "No licenses in use.";

/// Mapping from product display name to [`License`].
///
/// A table is rebuilt from scratch on every parse pass; it never merges with
/// the results of an earlier pass. Iteration is in product-name order.
///
/// # Examples
///
/// ```
/// use license_monitor_core::{LicenseTable, LicenseUser, NO_LICENSES_IN_USE};
///
/// let mut table = LicenseTable::new();
/// table.insert_if_absent("Revit", 10);
/// table.insert_if_absent("Revit", 99);
/// assert_eq!(table.get("Revit").unwrap().seats_available, 10);
///
/// let report: Vec<String> = table.users_of("Revit").collect();
/// assert_eq!(report, vec![NO_LICENSES_IN_USE.to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseTable {
    licenses: BTreeMap<String, License>,
}

impl LicenseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every license.
    pub fn clear(&mut self) {
        self.licenses.clear();
    }

    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.licenses.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&License> {
        self.licenses.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut License> {
        self.licenses.get_mut(name)
    }

    /// Iterates licenses in name order.
    pub fn iter(&self) -> impl Iterator<Item = &License> {
        self.licenses.values()
    }

    /// Iterates product names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.licenses.keys().map(String::as_str)
    }

    /// Registers `name` with `seats` unless it already exists.
    ///
    /// The first declaration seen in a pass wins; later seat counts for the
    /// same product are ignored.
    pub fn insert_if_absent(&mut self, name: &str, seats: u32) -> &mut License {
        self.licenses
            .entry(name.to_string())
            .or_insert_with(|| License::with_seats(name, seats))
    }

    /// Drops `name` if it ended up with no seats at all.
    ///
    /// Returns `true` when an entry was removed.
    pub fn remove_if_seatless(&mut self, name: &str) -> bool {
        if self
            .licenses
            .get(name)
            .is_some_and(|license| license.seats_available == 0)
        {
            self.licenses.remove(name);
            return true;
        }
        false
    }

    /// Returns the in-use / available counts for one product.
    pub fn usage(&self, name: &str) -> Option<LicenseUsage> {
        self.get(name).map(License::usage)
    }

    /// Returns usage counts for every product, in name order.
    pub fn summary(&self) -> Vec<LicenseUsage> {
        self.iter().map(License::usage).collect()
    }

    /// Iterates licenses whose name contains any of `filters`.
    ///
    /// An empty filter list selects every license.
    ///
    /// # Examples
    ///
    /// ```
    /// use license_monitor_core::LicenseTable;
    ///
    /// let mut table = LicenseTable::new();
    /// table.insert_if_absent("SAP 2023", 5);
    /// table.insert_if_absent("Revit", 10);
    ///
    /// let featured: Vec<&str> = table.featured(&["SAP"]).map(|l| l.name.as_str()).collect();
    /// assert_eq!(featured, vec!["SAP 2023"]);
    /// assert_eq!(table.featured::<&str>(&[]).count(), 2);
    /// ```
    pub fn featured<'a, S: AsRef<str>>(
        &'a self,
        filters: &'a [S],
    ) -> impl Iterator<Item = &'a License> + 'a {
        self.iter().filter(move |license| {
            filters.is_empty()
                || filters
                    .iter()
                    .any(|filter| license.name.contains(filter.as_ref()))
        })
    }

    /// Reports the current holders of `product`, measured against the local
    /// clock.
    ///
    /// Yields `"<user> [<hours>h <minutes>m]"` per holder. An unknown product
    /// or one without holders yields exactly one [`NO_LICENSES_IN_USE`] item;
    /// the sequence is never empty.
    pub fn users_of(&self, product: &str) -> UsersOf<'_> {
        self.users_of_at(product, Local::now().naive_local())
    }

    /// Same as [`users_of`](Self::users_of) with an explicit "now".
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use license_monitor_core::{LicenseTable, LicenseUser};
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(8, 15, 0).unwrap();
    /// let now = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(10, 20, 0).unwrap();
    ///
    /// let mut table = LicenseTable::new();
    /// table
    ///     .insert_if_absent("Revit", 10)
    ///     .insert_user(LicenseUser::new("jdoe").with_checkout_time(start));
    ///
    /// let report: Vec<String> = table.users_of_at("Revit", now).collect();
    /// assert_eq!(report, vec!["jdoe [2h 5m]".to_string()]);
    /// ```
    pub fn users_of_at(&self, product: &str, now: NaiveDateTime) -> UsersOf<'_> {
        match self.get(product) {
            Some(license) if !license.users.is_empty() => UsersOf {
                state: UsersOfState::Holders {
                    users: license.users.values(),
                    now,
                },
            },
            _ => UsersOf {
                state: UsersOfState::Placeholder(Some(NO_LICENSES_IN_USE)),
            },
        }
    }
}

impl<'a> IntoIterator for &'a LicenseTable {
    type Item = &'a License;
    type IntoIter = btree_map::Values<'a, String, License>;

    fn into_iter(self) -> Self::IntoIter {
        self.licenses.values()
    }
}

/// Lazy "users of" report returned by [`LicenseTable::users_of`].
pub struct UsersOf<'a> {
    state: UsersOfState<'a>,
}

enum UsersOfState<'a> {
    Placeholder(Option<&'static str>),
    Holders {
        users: btree_map::Values<'a, String, LicenseUser>,
        now: NaiveDateTime,
    },
}

impl Iterator for UsersOf<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match &mut self.state {
            UsersOfState::Placeholder(pending) => pending.take().map(str::to_string),
            UsersOfState::Holders { users, now } => users
                .next()
                .map(|user| format!("{} [{}]", user.name, format_elapsed(user.checkout_time, *now))),
        }
    }
}

/// Formats the time elapsed since `checkout` as `"<h>h <m>m"`.
///
/// Checkouts stamped in the future (clock skew between server and reader)
/// count as zero. A missing checkout time renders as `unknown`.
pub fn format_elapsed(checkout: Option<NaiveDateTime>, now: NaiveDateTime) -> String {
    let Some(checkout) = checkout else {
        return "unknown".to_string();
    };
    let minutes = (now - checkout).num_minutes().max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_users_of_unknown_product_yields_one_placeholder() {
        let table = LicenseTable::new();
        let report: Vec<String> = table.users_of("Nope").collect();
        assert_eq!(report, vec![NO_LICENSES_IN_USE]);
    }

    #[test]
    fn test_users_of_product_without_holders_yields_one_placeholder() {
        let mut table = LicenseTable::new();
        table.insert_if_absent("SAP 2023", 5);
        let report: Vec<String> = table.users_of_at("SAP 2023", ts(2, 9, 0)).collect();
        assert_eq!(report, vec![NO_LICENSES_IN_USE]);
    }

    #[test]
    fn test_users_of_formats_multi_day_sessions() {
        let mut table = LicenseTable::new();
        let license = table.insert_if_absent("Revit", 3);
        license.insert_user(LicenseUser::new("amy").with_checkout_time(ts(1, 7, 30)));
        license.insert_user(LicenseUser::new("bob").with_checkout_time(ts(2, 9, 59)));
        license.insert_user(LicenseUser::new("cid"));

        let report: Vec<String> = table.users_of_at("Revit", ts(2, 10, 0)).collect();
        assert_eq!(report, vec!["amy [26h 30m]", "bob [0h 1m]", "cid [unknown]"]);
    }

    #[test]
    fn test_format_elapsed_clamps_future_checkouts() {
        assert_eq!(format_elapsed(Some(ts(3, 0, 0)), ts(2, 0, 0)), "0h 0m");
    }

    #[test]
    fn test_remove_if_seatless_only_drops_zero_seat_entries() {
        let mut table = LicenseTable::new();
        table.insert_if_absent("Expired 2019", 0);
        table.insert_if_absent("SAP 2023", 5);

        assert!(table.remove_if_seatless("Expired 2019"));
        assert!(!table.remove_if_seatless("SAP 2023"));
        assert!(!table.remove_if_seatless("Missing"));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["SAP 2023"]);
    }

    #[test]
    fn test_summary_lists_every_product() {
        let mut table = LicenseTable::new();
        table.insert_if_absent("Revit", 10).checkout("jdoe");
        table.insert_if_absent("AutoCAD", 2);

        let summary = table.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].name, "AutoCAD");
        assert_eq!(summary[1].to_string(), "1 / 10 licenses in use.");
    }

    #[test]
    fn test_clear_empties_table() {
        let mut table = LicenseTable::new();
        table.insert_if_absent("Revit", 10);
        table.clear();
        assert!(table.is_empty());
    }
}
