//! # Domain Records and Validation
//!
//! This module owns the raw inputs of the screening flow. Its responsibility
//! is to give every user-provided value a strict, named domain before any of
//! it reaches the codec or the model:
//!
//! - Strict domains: the age range, the ethnicity list, and the administrator
//!   list are fixed by the trained model and are not configurable.
//! - User-centric errors: a failed validation names the offending field and
//!   lists the values that would have been accepted.
//! - Canonical labels: the five-point answer scale carries the instrument's
//!   original labels; the ordering, not the wording, is the contract.

use crate::model::CategoricalEncoders;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of Q-Chat-10 items.
pub const NUM_ITEMS: usize = 10;

/// Inclusive age bounds (in months) the screening instrument covers.
pub const MIN_AGE_MONTHS: u32 = 12;
pub const MAX_AGE_MONTHS: u32 = 36;

/// The eleven ethnicity values present in the training data.
pub const ETHNICITY_VALUES: [&str; 11] = [
    "Timur Tengah",
    "Eropa Kulit Putih",
    "Hispanik",
    "Kulit Hitam",
    "Asia",
    "Asian Selatan",
    "Indian Asli",
    "Yang lain",
    "Latin",
    "Campuran",
    "Pasifik",
];

/// The four test-administrator values present in the training data.
pub const ADMINISTRATOR_VALUES: [&str; 4] = [
    "Anggota Keluarga",
    "Tenaga kesehatan",
    "Diri sendiri",
    "Yang lain",
];

/// One of the ten questionnaire items, `A1`..`A10`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey(u8);

impl ItemKey {
    /// Builds a key from a 1-based item number.
    pub fn new(number: u8) -> Option<Self> {
        (1..=NUM_ITEMS as u8).contains(&number).then_some(ItemKey(number))
    }

    /// Parses a textual key such as `"A7"`.
    pub fn parse(text: &str) -> Option<Self> {
        text.strip_prefix('A')
            .and_then(|digits| digits.parse().ok())
            .and_then(Self::new)
    }

    /// All ten keys in order.
    pub fn all() -> impl Iterator<Item = ItemKey> {
        (1..=NUM_ITEMS as u8).map(ItemKey)
    }

    /// 1-based item number.
    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based position in per-item arrays.
    pub fn slot(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// Column name in the training data (`A1`..`A10`).
    pub fn column_name(self) -> String {
        format!("A{}", self.0)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}

/// The five-point ordinal answer scale, most frequent behaviour first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrdinalAnswer {
    Always,
    Usually,
    Sometimes,
    Rarely,
    Never,
}

impl OrdinalAnswer {
    /// The scale in descending frequency order.
    pub const ALL: [OrdinalAnswer; 5] = [
        OrdinalAnswer::Always,
        OrdinalAnswer::Usually,
        OrdinalAnswer::Sometimes,
        OrdinalAnswer::Rarely,
        OrdinalAnswer::Never,
    ];

    /// The canonical label, as presented by the original instrument.
    pub fn label(self) -> &'static str {
        match self {
            OrdinalAnswer::Always => "Selalu",
            OrdinalAnswer::Usually => "Biasanya",
            OrdinalAnswer::Sometimes => "Kadang-kadang",
            OrdinalAnswer::Rarely => "Jarang",
            OrdinalAnswer::Never => "Tidak pernah",
        }
    }

    /// Parses a canonical label. Anything else is rejected.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|answer| answer.label() == label)
    }
}

impl fmt::Display for OrdinalAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The (possibly partial) answer sheet collected on step 2.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Answers {
    slots: [Option<OrdinalAnswer>; NUM_ITEMS],
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, item: ItemKey, answer: OrdinalAnswer) {
        self.slots[item.slot()] = Some(answer);
    }

    pub fn get(&self, item: ItemKey) -> Option<OrdinalAnswer> {
        self.slots[item.slot()]
    }

    /// Keys of the items that have not been answered yet, in order.
    pub fn missing(&self) -> Vec<ItemKey> {
        ItemKey::all()
            .filter(|item| self.slots[item.slot()].is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}

/// A completed step-1 demographic record.
///
/// Immutable once accepted by the session; the string fields hold the raw
/// encoder/choice-list values, not their display translations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    /// Age in months, within [`MIN_AGE_MONTHS`]..=[`MAX_AGE_MONTHS`].
    pub age_months: u32,
    /// Sex as a fitted-encoder value (e.g. `F` / `M`).
    pub sex: String,
    /// Jaundice history as a fitted-encoder value (`Yes` / `No`).
    pub jaundice: String,
    /// Family ASD history as a fitted-encoder value (`Yes` / `No`).
    pub family_asd: String,
    /// One of [`ETHNICITY_VALUES`].
    pub ethnicity: String,
    /// Who administered the test; one of [`ADMINISTRATOR_VALUES`].
    pub who_completed: String,
}

/// A demographic field whose value falls outside its allowed domain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("age must be between {MIN_AGE_MONTHS} and {MAX_AGE_MONTHS} months, got {0}")]
    AgeOutOfRange(u32),
    #[error("'{value}' is not a valid {field}; allowed values: {}", .allowed.iter().join(", "))]
    UnknownChoice {
        field: &'static str,
        value: String,
        allowed: Vec<String>,
    },
}

impl Demographics {
    /// Checks every field against its domain. The three label-encoded fields
    /// are checked against the fitted encoders so the allowed values always
    /// match what the model can actually consume.
    pub fn validate(&self, encoders: &CategoricalEncoders) -> Result<(), ValidationError> {
        if !(MIN_AGE_MONTHS..=MAX_AGE_MONTHS).contains(&self.age_months) {
            return Err(ValidationError::AgeOutOfRange(self.age_months));
        }
        check_choice("sex", &self.sex, encoders.sex.known_values())?;
        check_choice("jaundice history", &self.jaundice, encoders.jaundice.known_values())?;
        check_choice(
            "family ASD history",
            &self.family_asd,
            encoders.family_asd.known_values(),
        )?;
        check_choice("ethnicity", &self.ethnicity, &ETHNICITY_VALUES)?;
        check_choice("test administrator", &self.who_completed, &ADMINISTRATOR_VALUES)?;
        Ok(())
    }
}

fn check_choice<S: AsRef<str>>(
    field: &'static str,
    value: &str,
    allowed: &[S],
) -> Result<(), ValidationError> {
    if allowed.iter().any(|candidate| candidate.as_ref() == value) {
        Ok(())
    } else {
        Err(ValidationError::UnknownChoice {
            field,
            value: value.to_string(),
            allowed: allowed.iter().map(|candidate| candidate.as_ref().to_string()).collect(),
        })
    }
}
