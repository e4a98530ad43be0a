//! Logical tables of the key-value store
//!
//! Every backend keeps all tables in a single keyspace; a one-byte table tag
//! prefixes each physical key so a whole table can be scanned by prefix.

use std::fmt;

/// A named table inside a [`Store`](crate::Store)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// License plates (asset registry)
    Plates,
    /// Cars (asset registry)
    Cars,
    /// Renter contact records
    Renters,
    /// Plate leases
    Leases,
    /// Car rentals
    Rentals,
    /// Payment records, keyed by payment id
    Payments,
    /// One-to-many links (agreement -> payments, asset/renter -> agreements)
    Links,
    /// Unique index: asset key -> id of the agreement holding its active claim
    ActiveClaims,
    /// Unique index: natural key (e.g. plate number) -> owning record id
    UniqueKeys,
    /// Monotonic counters
    Sequences,
}

impl Table {
    /// All tables, in tag order
    pub const ALL: [Table; 10] = [
        Table::Plates,
        Table::Cars,
        Table::Renters,
        Table::Leases,
        Table::Rentals,
        Table::Payments,
        Table::Links,
        Table::ActiveClaims,
        Table::UniqueKeys,
        Table::Sequences,
    ];

    /// One-byte tag prefixed to every physical key of this table
    pub fn tag(self) -> u8 {
        match self {
            Table::Plates => 0x01,
            Table::Cars => 0x02,
            Table::Renters => 0x03,
            Table::Leases => 0x04,
            Table::Rentals => 0x05,
            Table::Payments => 0x06,
            Table::Links => 0x07,
            Table::ActiveClaims => 0x08,
            Table::UniqueKeys => 0x09,
            Table::Sequences => 0x0a,
        }
    }

    /// Table name used in logs and error messages
    pub fn name(self) -> &'static str {
        match self {
            Table::Plates => "plates",
            Table::Cars => "cars",
            Table::Renters => "renters",
            Table::Leases => "leases",
            Table::Rentals => "rentals",
            Table::Payments => "payments",
            Table::Links => "links",
            Table::ActiveClaims => "active_claims",
            Table::UniqueKeys => "unique_keys",
            Table::Sequences => "sequences",
        }
    }

    /// Build the physical key for a logical key in this table
    pub fn physical_key(self, key: &[u8]) -> Vec<u8> {
        let mut physical = Vec::with_capacity(key.len() + 1);
        physical.push(self.tag());
        physical.extend_from_slice(key);
        physical
    }

    /// Strip the table tag from a physical key
    pub fn logical_key(self, physical: &[u8]) -> Option<&[u8]> {
        match physical.split_first() {
            Some((tag, rest)) if *tag == self.tag() => Some(rest),
            _ => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
