//! Product-code to display-name resolution.
//!
//! License servers report products by short vendor codes (`RVT`, `ACDLT`).
//! A [`ProductCatalog`] rewrites those codes to the names users recognize
//! before they become keys in a [`LicenseTable`](crate::LicenseTable).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Vendor codes known out of the box.
const BUILTIN_PRODUCTS: &[(&str, &str)] = &[
    ("ACD", "AutoCAD"),
    ("ACDLT", "AutoCAD LT"),
    ("ACAD_E", "AutoCAD Electrical"),
    ("AECCOL_T_F", "AEC Collection"),
    ("AMECH_PP", "AutoCAD Mechanical"),
    ("ARCHDESK", "AutoCAD Architecture"),
    ("CIV3D", "Civil 3D"),
    ("INVPROSA", "Inventor Professional"),
    ("MAP", "AutoCAD Map 3D"),
    ("MAYA", "Maya"),
    ("MEPCS", "AutoCAD MEP"),
    ("NAVMAN", "Navisworks Manage"),
    ("NAVSIM", "Navisworks Simulate"),
    ("PDCOLL", "Product Design & Manufacturing Collection"),
    ("PLNT3D", "AutoCAD Plant 3D"),
    ("RECAP", "ReCap Pro"),
    ("RSAPRO", "Robot Structural Analysis"),
    ("RVT", "Revit"),
];

static BUILTIN: LazyLock<ProductCatalog> =
    LazyLock::new(|| ProductCatalog::from_entries(BUILTIN_PRODUCTS.iter().copied()));

/// Immutable mapping from vendor product codes to display names.
///
/// # Examples
///
/// ```
/// use license_monitor_core::ProductCatalog;
///
/// let catalog = ProductCatalog::builtin();
/// assert_eq!(catalog.resolve("RVT"), "Revit");
/// assert_eq!(catalog.resolve("UNKNOWN"), "UNKNOWN");
///
/// let custom = catalog.with_overrides([("RVT", "Revit Architecture")]);
/// assert_eq!(custom.resolve("RVT"), "Revit Architecture");
/// assert_eq!(catalog.resolve("RVT"), "Revit");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCatalog {
    entries: BTreeMap<String, String>,
}

impl ProductCatalog {
    /// Returns the process-wide built-in catalog.
    pub fn builtin() -> &'static ProductCatalog {
        &BUILTIN
    }

    /// Creates an empty catalog; every code resolves to itself.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a catalog from `(code, name)` pairs. Later pairs win.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(code, name)| (code.into(), name.into()))
                .collect(),
        }
    }

    /// Returns a new catalog with `overrides` added on top of this one.
    pub fn with_overrides<I, K, V>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries = self.entries.clone();
        entries.extend(
            overrides
                .into_iter()
                .map(|(code, name)| (code.into(), name.into())),
        );
        Self { entries }
    }

    /// Looks up the display name registered for `code`.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    /// Resolves `code` to its display name, passing unmapped codes through.
    pub fn resolve<'a>(&'a self, code: &'a str) -> &'a str {
        self.get(code).unwrap_or(code)
    }

    /// Iterates `(code, name)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(code, name)| (code.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
