use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::deserializers::{de, parse_number};

/// Bucket label for records whose technician, type or part is missing.
pub const UNSPECIFIED: &str = "unspecified";

/// Returns `value`, or the "unspecified" bucket label when it is blank.
pub fn label_or_unspecified(value: &str) -> &str {
    if value.trim().is_empty() {
        UNSPECIFIED
    } else {
        value
    }
}

// ─── Raw documents (as stored, loosely typed) ────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRaw {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub client_name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub client_phone: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub technician: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_items")]
    pub equipment: Vec<EquipmentItemRaw>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentItemRaw {
    #[serde(rename = "type", default, deserialize_with = "de::lenient_string")]
    pub equipment_type: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub custom_type: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub serial: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub warranty: Option<bool>,
    #[serde(default, deserialize_with = "de::lenient_bool")]
    pub guarantee: Option<bool>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub repair_details: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub services: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub repair_cost: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub price: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectRepairRaw {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "de::lenient_string")]
    pub equipment_type: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub serial: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub part_used: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub technician: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub retail_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyCardRaw {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string_list")]
    pub serials: Vec<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub issued_at: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub date: Option<String>,
}

// ─── Normalized records ──────────────────────────────────────────────────────

/// Repair progress of a single equipment item.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum RepairStatus {
    #[default]
    Diagnostics,
    InRepair,
    Done,
}

impl RepairStatus {
    /// Urgency rank: lower means the item needs attention sooner.
    pub fn rank(self) -> u8 {
        match self {
            RepairStatus::Diagnostics => 0,
            RepairStatus::InRepair => 1,
            RepairStatus::Done => 2,
        }
    }

    /// Accepts the canonical names as well as the labels used by the intake screens.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "diagnostics" | "диагностика" => Some(RepairStatus::Diagnostics),
            "inrepair" | "in-repair" | "in_repair" | "ремонт" => Some(RepairStatus::InRepair),
            "done" | "готово" => Some(RepairStatus::Done),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RepairStatus::Diagnostics => "Diagnostics",
            RepairStatus::InRepair => "InRepair",
            RepairStatus::Done => "Done",
        }
    }
}

impl fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepairStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepairStatus::parse_lenient(s).ok_or_else(|| format!("Unknown repair status: {}", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentItem {
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub custom_type: String,
    pub name: String,
    pub serial: String,
    pub status: RepairStatus,
    pub warranty: bool,
    pub repair_details: String,
    pub repair_cost: String,
}

/// Completion data recorded when an item is marked done.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairOutcome {
    pub warranty: bool,
    pub repair_details: String,
    pub repair_cost: String,
}

impl EquipmentItem {
    /// Display/grouping category: the free-text override wins whenever it is non-empty.
    pub fn effective_type(&self) -> &str {
        if self.custom_type.trim().is_empty() {
            &self.equipment_type
        } else {
            &self.custom_type
        }
    }

    /// Billable cost. Warranty repairs are always free, whatever was stored.
    pub fn effective_cost(&self) -> f64 {
        if self.warranty {
            0.0
        } else {
            parse_number(&self.repair_cost).unwrap_or(0.0)
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == RepairStatus::Done
    }

    pub fn set_status(&mut self, status: RepairStatus) {
        self.status = status;
    }

    pub fn complete(&mut self, outcome: RepairOutcome) {
        self.status = RepairStatus::Done;
        self.warranty = outcome.warranty;
        if outcome.warranty {
            self.repair_details.clear();
            self.repair_cost.clear();
        } else {
            self.repair_details = outcome.repair_details;
            self.repair_cost = outcome.repair_cost;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub client_name: String,
    pub client_phone: String,
    pub city: String,
    pub technician: String,
    pub created_at: Option<NaiveDateTime>,
    pub notes: String,
    pub equipment: Vec<EquipmentItem>,
}

impl Ticket {
    /// Minimum status rank over the items; a ticket with no items sorts after finished ones.
    pub fn urgency_rank(&self) -> u8 {
        self.equipment
            .iter()
            .map(|eq| eq.status.rank())
            .min()
            .unwrap_or(RepairStatus::Done.rank() + 1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectRepair {
    pub id: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub model: String,
    pub serial: String,
    pub part_used: String,
    pub technician: String,
    pub date: Option<NaiveDateTime>,
    pub retail_price: Option<f64>,
}

impl DefectRepair {
    /// Bonus accrued by this repair, or None when no retail price was recorded.
    pub fn bonus(&self, rate: f64) -> Option<f64> {
        self.retail_price.map(|price| price * rate)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyCard {
    pub id: String,
    pub phone: String,
    pub serials: Vec<String>,
    pub issued_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseWarning {
    pub index: usize,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(cost: &str, warranty: bool) -> EquipmentItem {
        EquipmentItem {
            equipment_type: "Моноблок".into(),
            name: "AT810 i5".into(),
            serial: "SN-1".into(),
            status: RepairStatus::Done,
            warranty,
            repair_cost: cost.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_effective_type_prefers_custom() {
        let mut eq = item("", false);
        assert_eq!(eq.effective_type(), "Моноблок");
        eq.custom_type = "Весы".into();
        assert_eq!(eq.effective_type(), "Весы");
        eq.custom_type = "  ".into();
        assert_eq!(eq.effective_type(), "Моноблок");
    }

    #[test]
    fn test_effective_cost_warranty_is_zero() {
        assert_eq!(item("2500", true).effective_cost(), 0.0);
        assert_eq!(item("2500", false).effective_cost(), 2500.0);
    }

    #[test]
    fn test_effective_cost_non_numeric_is_zero() {
        assert_eq!(item("", false).effective_cost(), 0.0);
        assert_eq!(item("бесплатно", false).effective_cost(), 0.0);
    }

    #[test]
    fn test_complete_with_warranty_clears_billing() {
        let mut eq = item("", false);
        eq.status = RepairStatus::InRepair;
        eq.complete(RepairOutcome {
            warranty: true,
            repair_details: "Замена платы".into(),
            repair_cost: "3000".into(),
        });
        assert_eq!(eq.status, RepairStatus::Done);
        assert!(eq.warranty);
        assert!(eq.repair_cost.is_empty());
        assert!(eq.repair_details.is_empty());
    }

    #[test]
    fn test_complete_paid_keeps_billing() {
        let mut eq = item("", false);
        eq.complete(RepairOutcome {
            warranty: false,
            repair_details: "Замена платы".into(),
            repair_cost: "3000".into(),
        });
        assert_eq!(eq.repair_cost, "3000");
        assert_eq!(eq.effective_cost(), 3000.0);
    }

    #[test]
    fn test_status_parse_lenient() {
        assert_eq!(RepairStatus::parse_lenient("Готово"), Some(RepairStatus::Done));
        assert_eq!(RepairStatus::parse_lenient("Ремонт"), Some(RepairStatus::InRepair));
        assert_eq!(
            RepairStatus::parse_lenient("diagnostics"),
            Some(RepairStatus::Diagnostics)
        );
        assert_eq!(RepairStatus::parse_lenient("InRepair"), Some(RepairStatus::InRepair));
        assert_eq!(RepairStatus::parse_lenient("lost"), None);
        assert!("lost".parse::<RepairStatus>().is_err());
    }

    #[test]
    fn test_urgency_rank() {
        let mut ticket = Ticket {
            equipment: vec![item("", false)],
            ..Default::default()
        };
        assert_eq!(ticket.urgency_rank(), 2);
        ticket.equipment[0].status = RepairStatus::Diagnostics;
        assert_eq!(ticket.urgency_rank(), 0);
        ticket.equipment.clear();
        assert_eq!(ticket.urgency_rank(), 3);
    }

    #[test]
    fn test_defect_bonus() {
        let mut repair = DefectRepair {
            retail_price: Some(1000.0),
            ..Default::default()
        };
        assert_eq!(repair.bonus(0.04), Some(40.0));
        repair.retail_price = None;
        assert_eq!(repair.bonus(0.04), None);
    }

    #[test]
    fn test_label_or_unspecified() {
        assert_eq!(label_or_unspecified("Мади"), "Мади");
        assert_eq!(label_or_unspecified(""), UNSPECIFIED);
        assert_eq!(label_or_unspecified("  "), UNSPECIFIED);
    }
}
