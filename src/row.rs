use crate::types::ValidatedRequest;

/// Column order of the single-row table handed to the model.
pub const COLUMNS: [&str; 4] = ["part_name", "eco_friendly", "material", "item_price"];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Bool(bool),
    Number(f64),
}

/// One row, named columns in a stable order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    cells: Vec<(String, Cell)>,
}

impl FeatureRow {
    pub fn new(cells: Vec<(String, Cell)>) -> Self {
        Self { cells }
    }

    pub fn from_request(req: &ValidatedRequest) -> Self {
        let [part, eco, material, price] = COLUMNS;
        Self::new(vec![
            (part.to_string(), Cell::Text(req.part_name.as_str().to_string())),
            (eco.to_string(), Cell::Bool(req.eco_friendly)),
            (material.to_string(), Cell::Text(req.material.as_str().to_string())),
            (price.to_string(), Cell::Number(req.item_price)),
        ])
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
