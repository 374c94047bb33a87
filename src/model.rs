//! Data models for the packing engine: items, box types, parcels, and results.
//!
//! `ValidationError` and `PackError` both follow the corpus convention of a
//! hand-rolled `Display` + `std::error::Error` impl rather than `thiserror`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geometry::Block;
use crate::types::{Dims, DimsError};

/// Validation error for malformed item/box input.
#[derive(Debug, Clone)]
pub enum ValidationError {
    InvalidDimension(String),
    InvalidWeight(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidDimension(msg) => write!(f, "invalid dimension: {}", msg),
            ValidationError::InvalidWeight(msg) => write!(f, "invalid weight: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<DimsError> for ValidationError {
    fn from(e: DimsError) -> Self {
        ValidationError::InvalidDimension(e.to_string())
    }
}

/// Helper to validate a weight value (DRY principle, mirrors dimension validation).
fn validate_weight_value(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidWeight(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Like `validate_weight_value`, but zero is allowed (an empty-box tare can be 0).
fn validate_tare_weight_value(value: f64, name: &str) -> Result<(), ValidationError> {
    if value < 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidWeight(format!(
            "{} must be non-negative, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// A single item to be packed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item {
    pub id: u64,
    pub dims: Dims,
    pub weight: f64,
}

impl Item {
    pub fn new(id: u64, dims: Dims, weight: f64) -> Result<Self, ValidationError> {
        validate_weight_value(weight, "item weight")?;
        Ok(Self { id, dims, weight })
    }

    pub fn volume(&self) -> f64 {
        self.dims.volume()
    }
}

/// A candidate shipping box.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxType {
    pub name: String,
    pub dims: Dims,
    pub tare_weight: f64,
}

impl BoxType {
    pub fn new(name: impl Into<String>, dims: Dims, tare_weight: f64) -> Result<Self, ValidationError> {
        validate_tare_weight_value(tare_weight, "box tare weight")?;
        Ok(Self {
            name: name.into(),
            dims,
            tare_weight,
        })
    }

    pub fn volume(&self) -> f64 {
        self.dims.volume()
    }
}

/// An ordered sequence of items assigned to one physical box. No coordinates
/// are tracked — placement order is the only record kept of how items were
/// arranged inside the box.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parcel {
    pub items: Vec<Item>,
}

impl Parcel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_weight(&self) -> f64 {
        self.items.iter().map(|i| i.weight).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The outcome of packing one multiset of items: which box was chosen, how
/// many physical parcels of that box are needed, and whether the final
/// parcel could be downgraded to a smaller box.
#[derive(Clone, Debug, PartialEq)]
pub struct PackResult {
    pub chosen_box: BoxType,
    pub parcels: Vec<Parcel>,
    pub last_parcel: Option<BoxType>,
}

/// Diagnostic report backing `space_after_packing`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SpaceReport {
    pub remaining_blocks: Vec<[f64; 3]>,
    pub remaining_volume: f64,
}

impl SpaceReport {
    pub(crate) fn from_blocks(blocks: &[Block]) -> Self {
        let remaining_blocks: Vec<[f64; 3]> = blocks.iter().map(|b| b.as_dims().as_array()).collect();
        let remaining_volume = blocks.iter().map(|b| b.volume()).sum();
        Self {
            remaining_blocks,
            remaining_volume,
        }
    }
}

/// Diagnostic report backing `how_many_fit`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct FitReport {
    pub total_packed: usize,
    pub remaining_volume: f64,
}

/// Errors produced by the packing engine's public operations.
#[derive(Debug, Clone)]
pub enum PackError {
    /// A single item does not fit in any candidate box at all.
    DoesNotFit,
    /// Every candidate box was tried and none could hold the input items.
    NoBoxesFit,
    /// An item's weight alone exceeds the configured weight cap.
    ItemTooHeavy,
    /// Two or more candidate boxes share the same name.
    DuplicateBoxName(String),
    /// No items or no boxes were supplied.
    EmptyInput,
    /// Malformed item or box construction.
    Validation(ValidationError),
}

impl std::fmt::Display for PackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackError::DoesNotFit => write!(f, "item does not fit in any candidate box"),
            PackError::NoBoxesFit => write!(f, "no candidate box could hold the given items"),
            PackError::ItemTooHeavy => write!(f, "item weight exceeds the maximum allowed weight"),
            PackError::DuplicateBoxName(name) => write!(f, "duplicate box name: {}", name),
            PackError::EmptyInput => write!(f, "items and boxes must both be non-empty"),
            PackError::Validation(e) => write!(f, "validation error: {}", e),
        }
    }
}

impl std::error::Error for PackError {}

impl From<ValidationError> for PackError {
    fn from(e: ValidationError) -> Self {
        PackError::Validation(e)
    }
}
