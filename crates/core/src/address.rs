//! Saved shipping addresses.
//!
//! The address book is an ordered list. `is_default` only decides which
//! address is preselected when checkout opens; nothing else relies on there
//! being exactly one default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::AddressId;
use crate::validation::{self, ValidationErrors};

/// Where an address is used, shown as a chip next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AddressLabel {
    #[default]
    Home,
    Work,
    Other,
}

impl AddressLabel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Work => "Work",
            Self::Other => "Other",
        }
    }
}

impl std::str::FromStr for AddressLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "work" => Ok(Self::Work),
            "other" => Ok(Self::Other),
            _ => Err(format!("invalid address label: {s}")),
        }
    }
}

/// The flat set of fields that make up a deliverable address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub phone: String,
}

impl ShippingDetails {
    /// Field-level validation of every address field.
    #[must_use]
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check("name", validation::required(&self.name, "Full name"));
        errors.check(
            "address_line1",
            validation::required(&self.address_line1, "Address"),
        );
        errors.check("city", validation::required(&self.city, "City"));
        errors.check("state", validation::required(&self.state, "State"));
        errors.check("pincode", validation::pincode(&self.pincode));
        errors.check("phone", validation::phone(&self.phone));
        errors
    }

    /// Copy with surrounding whitespace removed from every field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            address_line1: self.address_line1.trim().to_string(),
            address_line2: self.address_line2.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            pincode: self.pincode.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }

    /// One-line rendering for summaries.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.address_line1.as_str()];
        if !self.address_line2.is_empty() {
            parts.push(self.address_line2.as_str());
        }
        parts.push(self.city.as_str());
        format!("{}, {} - {}", parts.join(", "), self.state, self.pincode)
    }
}

/// An address the shopper has saved for reuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddress {
    pub id: AddressId,
    pub name: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub phone: String,
    pub label: AddressLabel,
    pub is_default: bool,
}

impl SavedAddress {
    /// The address as a flat form record.
    #[must_use]
    pub fn details(&self) -> ShippingDetails {
        ShippingDetails {
            name: self.name.clone(),
            address_line1: self.address_line1.clone(),
            address_line2: self.address_line2.clone().unwrap_or_default(),
            city: self.city.clone(),
            state: self.state.clone(),
            pincode: self.pincode.clone(),
            phone: self.phone.clone(),
        }
    }

    fn apply(&mut self, details: ShippingDetails, label: AddressLabel) {
        self.name = details.name;
        self.address_line1 = details.address_line1;
        self.address_line2 = Some(details.address_line2).filter(|line| !line.is_empty());
        self.city = details.city;
        self.state = details.state;
        self.pincode = details.pincode;
        self.phone = details.phone;
        self.label = label;
    }
}

/// Address book errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Invalid address: {0}")]
    Invalid(ValidationErrors),
    #[error("Address not found: {0}")]
    NotFound(AddressId),
}

/// The shopper's saved addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook {
    addresses: Vec<SavedAddress>,
}

impl AddressBook {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            addresses: Vec::new(),
        }
    }

    /// Validate and save a new address. The first address becomes the default.
    ///
    /// Returns the id of the saved address.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Invalid` if any field fails validation.
    pub fn add(
        &mut self,
        details: &ShippingDetails,
        label: AddressLabel,
    ) -> Result<AddressId, AddressError> {
        let details = details.trimmed();
        details
            .validate()
            .into_result()
            .map_err(AddressError::Invalid)?;

        let mut address = SavedAddress {
            id: AddressId::generate(),
            name: String::new(),
            address_line1: String::new(),
            address_line2: None,
            city: String::new(),
            state: String::new(),
            pincode: String::new(),
            phone: String::new(),
            label,
            is_default: self.addresses.is_empty(),
        };
        address.apply(details, label);
        let id = address.id.clone();
        self.addresses.push(address);
        Ok(id)
    }

    /// Replace the fields of an existing address.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` for an unknown id and
    /// `AddressError::Invalid` if any field fails validation.
    pub fn update(
        &mut self,
        id: &AddressId,
        details: &ShippingDetails,
        label: AddressLabel,
    ) -> Result<&SavedAddress, AddressError> {
        let details = details.trimmed();
        details
            .validate()
            .into_result()
            .map_err(AddressError::Invalid)?;

        let address = self
            .addresses
            .iter_mut()
            .find(|address| &address.id == id)
            .ok_or_else(|| AddressError::NotFound(id.clone()))?;
        address.apply(details, label);
        Ok(address)
    }

    /// Delete an address. Returns whether anything was removed.
    pub fn remove(&mut self, id: &AddressId) -> bool {
        let before = self.addresses.len();
        self.addresses.retain(|address| &address.id != id);
        self.addresses.len() != before
    }

    /// Mark one address as the default and clear the flag on the rest.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` for an unknown id.
    pub fn set_default(&mut self, id: &AddressId) -> Result<(), AddressError> {
        if self.get(id).is_none() {
            return Err(AddressError::NotFound(id.clone()));
        }
        for address in &mut self.addresses {
            address.is_default = &address.id == id;
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &AddressId) -> Option<&SavedAddress> {
        self.addresses.iter().find(|address| &address.id == id)
    }

    /// The address to preselect: the first default, else the first saved.
    #[must_use]
    pub fn preselected(&self) -> Option<&SavedAddress> {
        self.addresses
            .iter()
            .find(|address| address.is_default)
            .or_else(|| self.addresses.first())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedAddress> {
        self.addresses.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[SavedAddress] {
        &self.addresses
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.addresses.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn details() -> ShippingDetails {
        ShippingDetails {
            name: "Asha Rao".to_string(),
            address_line1: "12 Residency Road".to_string(),
            address_line2: String::new(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560025".to_string(),
            phone: "9876543210".to_string(),
        }
    }

    #[test]
    fn test_first_address_becomes_default() {
        let mut book = AddressBook::new();
        let first = book.add(&details(), AddressLabel::Home).unwrap();
        let second = book.add(&details(), AddressLabel::Work).unwrap();

        assert!(book.get(&first).unwrap().is_default);
        assert!(!book.get(&second).unwrap().is_default);
        assert_eq!(book.preselected().unwrap().id, first);
    }

    #[test]
    fn test_add_rejects_invalid_fields() {
        let mut book = AddressBook::new();
        let mut bad = details();
        bad.pincode = "5600".to_string();
        bad.phone = "12345".to_string();

        let Err(AddressError::Invalid(errors)) = book.add(&bad, AddressLabel::Home) else {
            panic!("expected validation failure");
        };
        assert!(errors.get("pincode").is_some());
        assert!(errors.get("phone").is_some());
        assert!(book.is_empty());
    }

    #[test]
    fn test_add_trims_and_drops_empty_second_line() {
        let mut book = AddressBook::new();
        let mut padded = details();
        padded.city = "  Bengaluru ".to_string();
        padded.address_line2 = "   ".to_string();

        let id = book.add(&padded, AddressLabel::Other).unwrap();
        let saved = book.get(&id).unwrap();
        assert_eq!(saved.city, "Bengaluru");
        assert_eq!(saved.address_line2, None);
    }

    #[test]
    fn test_set_default_moves_flag() {
        let mut book = AddressBook::new();
        let first = book.add(&details(), AddressLabel::Home).unwrap();
        let second = book.add(&details(), AddressLabel::Work).unwrap();

        book.set_default(&second).unwrap();
        assert!(!book.get(&first).unwrap().is_default);
        assert_eq!(book.preselected().unwrap().id, second);
        assert!(matches!(
            book.set_default(&AddressId::new("missing")),
            Err(AddressError::NotFound(_))
        ));
    }

    #[test]
    fn test_preselected_falls_back_to_first_when_default_removed() {
        let mut book = AddressBook::new();
        let first = book.add(&details(), AddressLabel::Home).unwrap();
        let second = book.add(&details(), AddressLabel::Work).unwrap();

        assert!(book.remove(&first));
        assert_eq!(book.preselected().unwrap().id, second);
    }

    #[test]
    fn test_update() {
        let mut book = AddressBook::new();
        let id = book.add(&details(), AddressLabel::Home).unwrap();
        let mut moved = details();
        moved.city = "Mysuru".to_string();
        moved.pincode = "570001".to_string();

        let updated = book.update(&id, &moved, AddressLabel::Work).unwrap();
        assert_eq!(updated.city, "Mysuru");
        assert_eq!(updated.label, AddressLabel::Work);
    }

    #[test]
    fn test_one_line() {
        assert_eq!(
            details().one_line(),
            "12 Residency Road, Bengaluru, Karnataka - 560025"
        );
    }

    #[test]
    fn test_label_from_str() {
        assert_eq!("work".parse::<AddressLabel>().unwrap(), AddressLabel::Work);
        assert!("villa".parse::<AddressLabel>().is_err());
    }
}
