pub mod defects;
pub mod filter;
pub mod period;
pub mod prices;
pub mod repairs;

pub use defects::{compute_defect_stats, compute_defect_stats_default_rate, DefectReport};
pub use filter::{
    filter_defect_repairs, filter_tickets, search_warranty_cards, DateRange, DefectFilterConfig,
    FilterConfig, SortMode, WarrantySearch,
};
pub use period::{default_period, previous_period, HalfOpenRange};
pub use prices::{PriceRow, PriceTable};
pub use repairs::{
    compute_daily_series, compute_period_stats, compute_technician_stats, select_done_items,
    DailyPoint, DoneItem, PeriodStats, ReportConfig, TechnicianStats,
};
