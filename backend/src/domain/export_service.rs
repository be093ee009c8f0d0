//! CSV export of closing data.
//!
//! Read-only consumer of closing results; assembles the export in memory so
//! the REST layer can stream it without touching the data directory.

use anyhow::Context;

use crate::domain::commands::closing::ClosingWithDetails;
use crate::domain::errors::EngineError;

#[derive(Clone, Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Render a closing's line items as CSV, one row per client.
    pub fn closing_details_csv(&self, result: &ClosingWithDetails) -> Result<String, EngineError> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record([
                "reference_month",
                "partner_id",
                "client_id",
                "client_name",
                "category",
                "client_status",
                "monthly_revenue",
                "commission_rate",
                "commission_value",
                "bonus_value",
                "total_value",
                "observations",
            ])
            .context("Failed to write export header")?;

        for detail in &result.details {
            writer
                .write_record([
                    result.closing.reference_month.to_string().as_str(),
                    detail.partner_id.as_str(),
                    detail.client_id.as_str(),
                    detail.client_name.as_str(),
                    detail.category.as_str(),
                    detail.client_status.as_str(),
                    detail.monthly_revenue.to_string().as_str(),
                    detail
                        .commission_rate
                        .map(|rate| rate.to_string())
                        .unwrap_or_default()
                        .as_str(),
                    detail.commission_value.to_string().as_str(),
                    detail.bonus_value.to_string().as_str(),
                    detail.total_value.to_string().as_str(),
                    detail.observations.as_str(),
                ])
                .context("Failed to write export row")?;
        }

        let bytes = writer
            .into_inner()
            .context("Failed to flush export buffer")?;
        String::from_utf8(bytes)
            .context("Export buffer was not valid UTF-8")
            .map_err(EngineError::from)
    }
}
