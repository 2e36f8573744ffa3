//! Domain models for the centralisation pipeline.
//!
//! - [`Entity`] - The six business tables the pipeline cleans
//! - [`COUNTRIES`], [`COUNTRY_CODES`], [`CONTINENTS`], [`STORE_TYPES`], [`TIME_PERIODS`] - Closed value sets
//! - [`CardProvider`] - Card schemes and their allowed card-number lengths
//! - [`WeightUnit`] - Units accepted in product weights and their kg factor

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

// =============================================================================
// Entity
// =============================================================================

/// One of the business tables handled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    /// Legacy users table.
    Users,
    /// Card details extracted from the card document.
    Cards,
    /// Store details from the stores API.
    Stores,
    /// Product catalogue from object storage.
    Products,
    /// Orders table.
    Orders,
    /// Sale date/time details from the JSON feed.
    SaleTimes,
}

impl Entity {
    /// Every entity, in pipeline order.
    pub const ALL: [Entity; 6] = [
        Entity::Users,
        Entity::Cards,
        Entity::Stores,
        Entity::Products,
        Entity::Orders,
        Entity::SaleTimes,
    ];

    /// Logical name of the cleaned table handed to the loader.
    pub fn clean_table_name(&self) -> &'static str {
        match self {
            Self::Users => "user_data_clean",
            Self::Cards => "card_data_clean",
            Self::Stores => "store_data_clean",
            Self::Products => "product_data_clean",
            Self::Orders => "order_data_clean",
            Self::SaleTimes => "sales_date_clean",
        }
    }

    /// Parse the names used on the command line and in URLs.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "users" | "user" => Some(Self::Users),
            "cards" | "card" => Some(Self::Cards),
            "stores" | "store" => Some(Self::Stores),
            "products" | "product" => Some(Self::Products),
            "orders" | "order" => Some(Self::Orders),
            "sale_times" | "sales" | "dates" | "date_times" => Some(Self::SaleTimes),
            _ => None,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Users => "users",
            Self::Cards => "cards",
            Self::Stores => "stores",
            Self::Products => "products",
            Self::Orders => "orders",
            Self::SaleTimes => "sale_times",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Closed value sets
// =============================================================================

/// Countries the business trades in.
pub const COUNTRIES: &[&str] = &["United Kingdom", "United States", "Germany"];

/// ISO country codes of users and stores.
pub const COUNTRY_CODES: &[&str] = &["GB", "US", "DE"];

/// Continents a store can be on.
pub const CONTINENTS: &[&str] = &["Europe", "America"];

/// Kinds of store.
pub const STORE_TYPES: &[&str] = &["Local", "Super Store", "Mall Kiosk", "Outlet", "Web Portal"];

/// Parts of the day a sale can fall in.
pub const TIME_PERIODS: &[&str] = &["Morning", "Midday", "Evening", "Late_Hours"];

// =============================================================================
// Card providers
// =============================================================================

/// Card scheme as written in the card document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardProvider {
    DinersClub,
    AmericanExpress,
    Jcb16,
    Jcb15,
    Maestro,
    Mastercard,
    Discover,
    Visa19,
    Visa16,
    Visa13,
}

impl CardProvider {
    pub const ALL: [CardProvider; 10] = [
        Self::DinersClub,
        Self::AmericanExpress,
        Self::Jcb16,
        Self::Jcb15,
        Self::Maestro,
        Self::Mastercard,
        Self::Discover,
        Self::Visa19,
        Self::Visa16,
        Self::Visa13,
    ];

    /// Provider names as they appear in the source document.
    pub const NAMES: &'static [&'static str] = &[
        "Diners Club / Carte Blanche",
        "American Express",
        "JCB 16 digit",
        "JCB 15 digit",
        "Maestro",
        "Mastercard",
        "Discover",
        "VISA 19 digit",
        "VISA 16 digit",
        "VISA 13 digit",
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Provider name exactly as it appears in the source document.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DinersClub => "Diners Club / Carte Blanche",
            Self::AmericanExpress => "American Express",
            Self::Jcb16 => "JCB 16 digit",
            Self::Jcb15 => "JCB 15 digit",
            Self::Maestro => "Maestro",
            Self::Mastercard => "Mastercard",
            Self::Discover => "Discover",
            Self::Visa19 => "VISA 19 digit",
            Self::Visa16 => "VISA 16 digit",
            Self::Visa13 => "VISA 13 digit",
        }
    }

    /// Card-number lengths this provider issues.
    pub fn allowed_lengths(&self) -> RangeInclusive<usize> {
        match self {
            Self::DinersClub => 14..=14,
            Self::AmericanExpress | Self::Jcb15 => 15..=15,
            Self::Jcb16 | Self::Mastercard | Self::Discover | Self::Visa16 => 16..=16,
            Self::Maestro => 12..=20,
            Self::Visa19 => 19..=19,
            Self::Visa13 => 13..=13,
        }
    }
}

// =============================================================================
// Weight units
// =============================================================================

/// Unit found in a product weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightUnit {
    Kg,
    G,
    Ml,
    Oz,
}

impl WeightUnit {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "kg" => Some(Self::Kg),
            "g" => Some(Self::G),
            "ml" => Some(Self::Ml),
            "oz" => Some(Self::Oz),
            _ => None,
        }
    }

    /// Multiplier to kilograms. Millilitres are taken as grams.
    pub fn kg_factor(&self) -> f64 {
        match self {
            Self::Kg => 1.0,
            Self::G | Self::Ml => 0.001,
            Self::Oz => 0.02834952,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
