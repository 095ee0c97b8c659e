pub mod deserializers;
pub mod pipeline;
pub mod types;

pub use pipeline::{
    parse_defect_repairs_reader, parse_tickets_reader, parse_warranty_cards_reader, ParseOutput,
    TicketImport,
};
pub use types::{
    DefectRepair, EquipmentItem, ParseWarning, RepairOutcome, RepairStatus, Ticket, WarrantyCard,
    UNSPECIFIED,
};
