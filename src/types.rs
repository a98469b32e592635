use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PredictError;

// ---------- Request/Response types ----------

/// Body of `POST /predict`, exactly as the client sent it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PredictionRequest {
    pub part_name: String,
    pub eco_friendly: bool,
    pub material: String,
    pub item_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub reward_points: f64,
}

// ---------- Allow-lists ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartName {
    Exterior,
    Interior,
}

impl PartName {
    pub const ALL: [PartName; 2] = [PartName::Exterior, PartName::Interior];

    pub fn as_str(self) -> &'static str {
        match self {
            PartName::Exterior => "EXTERIOR",
            PartName::Interior => "INTERIOR",
        }
    }

    /// Exact, case-sensitive match.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Material {
    Cotton,
    Viscose,
    Fiber,
    Elastane,
    Polyester,
    Linen,
    Lyocell,
    Polyamide,
    Nylon,
    Wool,
    Acrylic,
    Camel,
    Cupro,
    Modal,
}

impl Material {
    pub const ALL: [Material; 14] = [
        Material::Cotton,
        Material::Viscose,
        Material::Fiber,
        Material::Elastane,
        Material::Polyester,
        Material::Linen,
        Material::Lyocell,
        Material::Polyamide,
        Material::Nylon,
        Material::Wool,
        Material::Acrylic,
        Material::Camel,
        Material::Cupro,
        Material::Modal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Material::Cotton => "cotton",
            Material::Viscose => "viscose",
            Material::Fiber => "fiber",
            Material::Elastane => "elastane",
            Material::Polyester => "polyester",
            Material::Linen => "linen",
            Material::Lyocell => "lyocell",
            Material::Polyamide => "polyamide",
            Material::Nylon => "nylon",
            Material::Wool => "wool",
            Material::Acrylic => "acrylic",
            Material::Camel => "camel",
            Material::Cupro => "cupro",
            Material::Modal => "modal",
        }
    }

    /// Exact, case-sensitive match.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    /// `cotton, viscose, ..., modal` in allow-list order.
    pub fn accepted_list() -> String {
        Self::ALL.map(Material::as_str).join(", ")
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------- Validation ----------

/// A request whose categorical fields passed the allow-lists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedRequest {
    pub part_name: PartName,
    pub eco_friendly: bool,
    pub material: Material,
    pub item_price: f64,
}

impl PredictionRequest {
    /// Reference payload used for the startup warm-up.
    pub fn sample() -> Self {
        Self {
            part_name: PartName::Exterior.as_str().to_string(),
            eco_friendly: true,
            material: Material::Cotton.as_str().to_string(),
            item_price: 120.5,
        }
    }

    /// `part_name` is checked before `material`, so a bad part name wins
    /// regardless of the other fields.
    pub fn validate(&self) -> Result<ValidatedRequest, PredictError> {
        let part_name = PartName::parse(&self.part_name).ok_or_else(|| {
            PredictError::InvalidInput(format!(
                "Invalid part_name '{}'! Must be 'EXTERIOR' or 'INTERIOR'.",
                self.part_name
            ))
        })?;
        let material = Material::parse(&self.material).ok_or_else(|| {
            PredictError::InvalidInput(format!(
                "Invalid material '{}'! Choose from: {}.",
                self.material,
                Material::accepted_list()
            ))
        })?;

        Ok(ValidatedRequest {
            part_name,
            eco_friendly: self.eco_friendly,
            material,
            item_price: self.item_price,
        })
    }
}
