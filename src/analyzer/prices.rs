use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-type, per-model price lists. The first price of a list is the current one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(pub BTreeMap<String, BTreeMap<String, Vec<f64>>>);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRow {
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub model: String,
    pub price: Option<f64>,
}

impl PriceTable {
    pub fn price(&self, equipment_type: &str, model: &str) -> Option<f64> {
        self.0
            .get(equipment_type)
            .and_then(|models| models.get(model))
            .and_then(|prices| prices.first().copied())
    }

    /// Replaces the current price, creating the type/model entry when missing.
    pub fn set_price(&mut self, equipment_type: &str, model: &str, price: f64) {
        let prices = self
            .0
            .entry(equipment_type.to_string())
            .or_default()
            .entry(model.to_string())
            .or_default();
        match prices.first_mut() {
            Some(current) => *current = price,
            None => prices.push(price),
        }
    }

    /// Removes a model; the type goes too once it has no models left.
    /// Returns false when there was nothing to remove.
    pub fn remove_model(&mut self, equipment_type: &str, model: &str) -> bool {
        let Some(models) = self.0.get_mut(equipment_type) else {
            return false;
        };
        let removed = models.remove(model).is_some();
        if models.is_empty() {
            self.0.remove(equipment_type);
        }
        removed
    }

    /// Flat rows sorted by type, then model.
    pub fn rows(&self) -> Vec<PriceRow> {
        self.0
            .iter()
            .flat_map(|(equipment_type, models)| {
                models.iter().map(move |(model, prices)| PriceRow {
                    equipment_type: equipment_type.clone(),
                    model: model.clone(),
                    price: prices.first().copied(),
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
