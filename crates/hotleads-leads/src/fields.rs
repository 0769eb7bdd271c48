//! Attribute conventions for contact and address data.

use hotleads_core::RawRecord;

/// Address sub-fields, in display order.
pub const ADDRESS_FIELDS: [&str; 5] = [
    "addr:housenumber",
    "addr:street",
    "addr:city",
    "addr:state",
    "addr:postcode",
];

/// Contact attributes, most preferred first.
pub const CONTACT_FIELDS: [&str; 6] = [
    "phone",
    "contact:phone",
    "mobile",
    "contact:mobile",
    "email",
    "contact:email",
];

pub const ADDRESS_SEPARATOR: &str = ", ";

/// Present address sub-fields in [`ADDRESS_FIELDS`] order.
#[must_use]
pub fn address_parts(record: &RawRecord) -> Vec<&str> {
    ADDRESS_FIELDS
        .iter()
        .filter_map(|key| record.attr(key))
        .collect()
}

/// The first explicit phone or email attribute.
#[must_use]
pub fn explicit_contact(record: &RawRecord) -> Option<&str> {
    CONTACT_FIELDS.iter().find_map(|key| record.attr(key))
}

/// City used for directory lookups.
#[must_use]
pub fn city(record: &RawRecord) -> Option<&str> {
    record.attr("addr:city")
}
