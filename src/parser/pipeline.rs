use std::collections::BTreeSet;
use std::io::Read;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::parser::deserializers::parse_timestamp;
use crate::parser::types::{
    DefectRepair, DefectRepairRaw, EquipmentItem, EquipmentItemRaw, ParseWarning, RepairStatus,
    Ticket, TicketRaw, WarrantyCard, WarrantyCardRaw,
};

/// Output of the document loaders: normalized records plus what was dropped and why.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOutput<T> {
    pub records: Vec<T>,
    pub warnings: Vec<ParseWarning>,
    pub total_documents: usize,
    pub skipped: usize,
    pub parse_duration_ms: u64,
}

/// Result of a ticket import: the generic output plus intake-specific diagnostics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketImport {
    #[serde(flatten)]
    pub output: ParseOutput<Ticket>,
    pub unique_types: Vec<String>,
    pub outside_closed_sets: usize,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn owned(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Returns the first of two alternate field names that carries a value.
fn either(primary: &Option<String>, alternate: &Option<String>) -> String {
    non_empty(primary)
        .or_else(|| non_empty(alternate))
        .map(str::to_string)
        .unwrap_or_default()
}

fn required_id(id: &Option<String>) -> Result<String, String> {
    non_empty(id)
        .map(str::to_string)
        .ok_or_else(|| "Document has no id".to_string())
}

pub fn normalize_equipment_item(raw: &EquipmentItemRaw) -> EquipmentItem {
    let status = raw
        .status
        .as_deref()
        .and_then(RepairStatus::parse_lenient)
        .unwrap_or_default();
    let warranty = raw.warranty.or(raw.guarantee).unwrap_or(false);

    let (repair_details, repair_cost) = if warranty {
        (String::new(), String::new())
    } else {
        (
            either(&raw.repair_details, &raw.services),
            either(&raw.repair_cost, &raw.price),
        )
    };

    EquipmentItem {
        equipment_type: owned(&raw.equipment_type),
        custom_type: owned(&raw.custom_type),
        name: owned(&raw.name),
        serial: owned(&raw.serial),
        status,
        warranty,
        repair_details,
        repair_cost,
    }
}

pub fn normalize_ticket(raw: &TicketRaw) -> Result<Ticket, String> {
    let id = required_id(&raw.id)?;
    let created_at = non_empty(&raw.created_at)
        .or_else(|| non_empty(&raw.date))
        .and_then(parse_timestamp);

    Ok(Ticket {
        id,
        client_name: owned(&raw.client_name),
        client_phone: either(&raw.client_phone, &raw.phone),
        city: owned(&raw.city),
        technician: owned(&raw.technician),
        created_at,
        notes: owned(&raw.notes),
        equipment: raw.equipment.iter().map(normalize_equipment_item).collect(),
    })
}

pub fn normalize_defect_repair(raw: &DefectRepairRaw) -> Result<DefectRepair, String> {
    let id = required_id(&raw.id)?;
    let date = non_empty(&raw.date)
        .or_else(|| non_empty(&raw.created_at))
        .and_then(parse_timestamp);

    Ok(DefectRepair {
        id,
        equipment_type: owned(&raw.equipment_type),
        model: owned(&raw.model),
        serial: owned(&raw.serial),
        part_used: owned(&raw.part_used),
        technician: owned(&raw.technician),
        date,
        retail_price: raw.retail_price,
    })
}

pub fn normalize_warranty_card(raw: &WarrantyCardRaw) -> Result<WarrantyCard, String> {
    let id = required_id(&raw.id)?;
    let issued_at = non_empty(&raw.issued_at)
        .or_else(|| non_empty(&raw.date))
        .and_then(parse_timestamp);

    Ok(WarrantyCard {
        id,
        phone: owned(&raw.phone),
        serials: raw.serials.clone(),
        issued_at,
    })
}

/// Splits a JSON payload into documents. Accepts either an array of documents or an
/// object keyed by document id (the id is injected when the document lacks one).
pub fn split_documents(payload: Value) -> Result<Vec<Value>, AppError> {
    match payload {
        Value::Array(docs) => Ok(docs),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, mut doc)| {
                if let Value::Object(fields) = &mut doc {
                    fields.entry("id").or_insert(Value::String(key));
                }
                doc
            })
            .collect()),
        _ => Err(AppError::Custom(
            "Expected a JSON array or an object keyed by id".to_string(),
        )),
    }
}

/// Deserializes and normalizes each document independently; a bad document is skipped
/// with a warning and never aborts the batch.
pub fn parse_documents<Raw, T>(
    docs: Vec<Value>,
    normalize: impl Fn(&Raw) -> Result<T, String>,
) -> ParseOutput<T>
where
    Raw: DeserializeOwned,
{
    let start = Instant::now();
    let total_documents = docs.len();
    let mut records = Vec::with_capacity(total_documents);
    let mut warnings = Vec::new();

    for (index, doc) in docs.into_iter().enumerate() {
        let outcome = serde_json::from_value::<Raw>(doc)
            .map_err(|e| e.to_string())
            .and_then(|raw| normalize(&raw));
        match outcome {
            Ok(record) => records.push(record),
            Err(message) => {
                log::warn!("Skipping document #{}: {}", index, message);
                warnings.push(ParseWarning { index, message });
            }
        }
    }

    ParseOutput {
        skipped: warnings.len(),
        records,
        warnings,
        total_documents,
        parse_duration_ms: start.elapsed().as_millis() as u64,
    }
}

/// Loads ticket documents from `reader` and flags values outside the configured closed sets.
/// Out-of-set records are kept; they only produce warnings.
pub fn parse_tickets_reader<R: Read>(reader: R, config: &AppConfig) -> Result<TicketImport, AppError> {
    let payload: Value = serde_json::from_reader(reader)?;
    let mut output = parse_documents(split_documents(payload)?, normalize_ticket);

    let mut unique_types = BTreeSet::new();
    let mut outside_closed_sets = 0usize;

    for (index, ticket) in output.records.iter().enumerate() {
        for eq in &ticket.equipment {
            let t = eq.effective_type();
            if !t.is_empty() {
                unique_types.insert(t.to_string());
            }
        }

        let unknown_city = !ticket.city.is_empty() && !config.is_known_city(&ticket.city);
        let unknown_tech =
            !ticket.technician.is_empty() && !config.is_known_technician(&ticket.technician);
        let unknown_types: Vec<&str> = ticket
            .equipment
            .iter()
            .map(|eq| eq.equipment_type.as_str())
            .filter(|t| !t.is_empty() && !config.is_known_equipment_type(t))
            .collect();

        if unknown_city || unknown_tech || !unknown_types.is_empty() {
            outside_closed_sets += 1;
            output.warnings.push(ParseWarning {
                index,
                message: format!(
                    "Ticket {} has city '{}' / technician '{}' / types {:?} outside the configured lists",
                    ticket.id, ticket.city, ticket.technician, unknown_types
                ),
            });
        }
    }

    log::info!(
        "Parsed {} tickets ({} skipped, {} outside closed sets)",
        output.records.len(),
        output.skipped,
        outside_closed_sets
    );

    Ok(TicketImport {
        output,
        unique_types: unique_types.into_iter().collect(),
        outside_closed_sets,
    })
}

pub fn parse_defect_repairs_reader<R: Read>(
    reader: R,
) -> Result<ParseOutput<DefectRepair>, AppError> {
    let payload: Value = serde_json::from_reader(reader)?;
    let output = parse_documents(split_documents(payload)?, normalize_defect_repair);
    log::info!(
        "Parsed {} defect repairs ({} skipped)",
        output.records.len(),
        output.skipped
    );
    Ok(output)
}

pub fn parse_warranty_cards_reader<R: Read>(
    reader: R,
) -> Result<ParseOutput<WarrantyCard>, AppError> {
    let payload: Value = serde_json::from_reader(reader)?;
    let output = parse_documents(split_documents(payload)?, normalize_warranty_card);
    log::info!(
        "Parsed {} warranty cards ({} skipped)",
        output.records.len(),
        output.skipped
    );
    Ok(output)
}
