//! PDF and Excel financial reports

use crate::error::{AppError, AppResult};
use crate::models::{EntryType, OwedShare, Payment, PaymentFilter};
use crate::repositories::{ExpenseRepository, PaymentRepository};
use crate::services::payment_service::check_range;
use chrono::{Duration, NaiveDate, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Upper bound on transactions included in one report
const MAX_REPORT_ROWS: i64 = 10_000;
const DEFAULT_PERIOD_DAYS: i64 = 30;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const BOTTOM: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Excel,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(ReportFormat::Pdf),
            "excel" | "xlsx" => Ok(ReportFormat::Excel),
            _ => Err(format!("Invalid report format: {} (expected pdf or excel)", s)),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Excel => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    pub format: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub payment_type: Option<String>,
    #[serde(default)]
    pub include_group_expenses: bool,
}

/// Everything a rendered report shows
#[derive(Debug, Clone)]
pub struct ReportData {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub payments: Vec<Payment>,
    pub group_shares: Vec<OwedShare>,
    pub include_group_expenses: bool,
}

impl ReportData {
    pub fn total_for(&self, entry_type: EntryType) -> Decimal {
        self.payments
            .iter()
            .filter(|p| p.payment_type == entry_type.as_str())
            .map(|p| p.amount)
            .sum()
    }

    pub fn net(&self) -> Decimal {
        self.total_for(EntryType::Income) - self.total_for(EntryType::Expense)
    }

    /// (category, type) -> total, sorted by name
    pub fn by_category(&self) -> Vec<(String, String, Decimal)> {
        let mut totals: BTreeMap<(String, String), Decimal> = BTreeMap::new();
        for p in &self.payments {
            let name = p.category_name.clone().unwrap_or_else(|| "Uncategorized".to_string());
            *totals.entry((name, p.payment_type.clone())).or_default() += p.amount;
        }
        totals.into_iter().map(|((c, t), v)| (c, t, v)).collect()
    }

    pub fn owed_total(&self) -> Decimal {
        self.group_shares
            .iter()
            .filter(|s| !s.is_settled)
            .map(|s| s.amount)
            .sum()
    }

    pub fn filename(&self, format: ReportFormat) -> String {
        format!(
            "paydhan-report-{}-{}.{}",
            self.from.format("%Y-%m-%d"),
            self.to.format("%Y-%m-%d"),
            format.extension()
        )
    }
}

/// A rendered report ready to send
pub struct ReportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub struct ReportService {
    payment_repo: Arc<PaymentRepository>,
    expense_repo: Arc<ExpenseRepository>,
}

impl ReportService {
    pub fn new(payment_repo: Arc<PaymentRepository>, expense_repo: Arc<ExpenseRepository>) -> Self {
        Self {
            payment_repo,
            expense_repo,
        }
    }

    pub async fn generate(&self, user_id: Uuid, req: &GenerateReportRequest) -> AppResult<ReportFile> {
        let format = ReportFormat::from_str(&req.format).map_err(AppError::Validation)?;
        check_range(req.from, req.to)?;

        let to = req.to.unwrap_or_else(|| Utc::now().date_naive());
        let from = req.from.unwrap_or(to - Duration::days(DEFAULT_PERIOD_DAYS));
        check_range(Some(from), Some(to))?;

        let payment_type = match req.payment_type.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(t) => Some(EntryType::from_str(t).map_err(AppError::Validation)?),
        };

        let filter = PaymentFilter {
            payment_type: payment_type.map(String::from),
            category_id: None,
            from: Some(from),
            to: Some(to),
            limit: MAX_REPORT_ROWS,
            offset: 0,
        };
        let payments = self.payment_repo.find_by_user(user_id, &filter).await?;

        let group_shares = if req.include_group_expenses {
            self.expense_repo
                .find_owed_shares(user_id, Some(from), Some(to))
                .await?
        } else {
            Vec::new()
        };

        let data = ReportData {
            from,
            to,
            payments,
            group_shares,
            include_group_expenses: req.include_group_expenses,
        };

        let bytes = match format {
            ReportFormat::Pdf => render_pdf(&data)?,
            ReportFormat::Excel => render_xlsx(&data)?,
        };

        info!(
            "Generated {} report for {} ({} transactions, {} bytes)",
            format.extension(),
            user_id,
            data.payments.len(),
            bytes.len()
        );

        Ok(ReportFile {
            filename: data.filename(format),
            content_type: format.content_type(),
            bytes,
        })
    }
}

// =============================================================================
// PDF
// =============================================================================

fn money(value: Decimal) -> String {
    format!("Rs. {:.2}", value)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// Writes rows top to bottom, starting a new page when the cursor runs out
struct PdfCursor<'a> {
    doc: &'a printpdf::PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PdfCursor<'_> {
    fn ensure_space(&mut self, needed: f32) {
        if self.y - needed < BOTTOM {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text(&self, font: &IndirectFontRef, size: f32, x: f32, text: &str) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn rule(&self) {
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(self.y)), false),
                (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(self.y)), false),
            ],
            is_closed: false,
        });
    }

    fn advance(&mut self, by: f32) {
        self.y -= by;
    }
}

pub fn render_pdf(data: &ReportData) -> AppResult<Vec<u8>> {
    let pdf_err = |e: printpdf::Error| AppError::Message(format!("Failed to render PDF: {e}"));

    let (doc, page, layer) =
        PdfDocument::new("PayDhan Report", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;

    let mut cur = PdfCursor {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - 20.0,
    };

    cur.text(&bold, 20.0, MARGIN, "PayDhan Financial Report");
    cur.advance(9.0);
    cur.text(
        &font,
        11.0,
        MARGIN,
        &format!("Period: {} to {}", data.from.format("%d %b %Y"), data.to.format("%d %b %Y")),
    );
    cur.advance(12.0);

    cur.text(&bold, 14.0, MARGIN, "Summary");
    cur.advance(7.0);
    for (label, value) in [
        ("Total income", money(data.total_for(EntryType::Income))),
        ("Total expense", money(data.total_for(EntryType::Expense))),
        ("Net balance", money(data.net())),
        ("Transactions", data.payments.len().to_string()),
    ] {
        cur.text(&font, 11.0, MARGIN, label);
        cur.text(&font, 11.0, 80.0, &value);
        cur.advance(6.0);
    }
    if data.include_group_expenses {
        cur.text(&font, 11.0, MARGIN, "Owed in groups");
        cur.text(&font, 11.0, 80.0, &money(data.owed_total()));
        cur.advance(6.0);
    }
    cur.advance(6.0);

    let categories = data.by_category();
    if !categories.is_empty() {
        cur.ensure_space(20.0);
        cur.text(&bold, 14.0, MARGIN, "By category");
        cur.advance(7.0);
        for (name, kind, total) in &categories {
            cur.ensure_space(6.0);
            cur.text(&font, 10.0, MARGIN, &truncate(name, 40));
            cur.text(&font, 10.0, 110.0, kind);
            cur.text(&font, 10.0, 150.0, &money(*total));
            cur.advance(6.0);
        }
        cur.advance(6.0);
    }

    cur.ensure_space(20.0);
    cur.text(&bold, 14.0, MARGIN, "Transactions");
    cur.advance(7.0);
    for (x, header) in [(MARGIN, "Date"), (42.0, "Type"), (65.0, "Category"), (105.0, "Description"), (165.0, "Amount")] {
        cur.text(&bold, 10.0, x, header);
    }
    cur.advance(2.0);
    cur.rule();
    cur.advance(5.0);

    if data.payments.is_empty() {
        cur.text(&font, 10.0, MARGIN, "No transactions in this period");
        cur.advance(6.0);
    }
    for p in &data.payments {
        cur.ensure_space(6.0);
        cur.text(&font, 9.0, MARGIN, &p.payment_date.format("%Y-%m-%d").to_string());
        cur.text(&font, 9.0, 42.0, &p.payment_type);
        cur.text(&font, 9.0, 65.0, &truncate(p.category_name.as_deref().unwrap_or("-"), 20));
        cur.text(&font, 9.0, 105.0, &truncate(p.description.as_deref().unwrap_or(""), 30));
        cur.text(&font, 9.0, 165.0, &money(p.amount));
        cur.advance(5.5);
    }

    if data.include_group_expenses && !data.group_shares.is_empty() {
        cur.advance(6.0);
        cur.ensure_space(20.0);
        cur.text(&bold, 14.0, MARGIN, "Group expense shares");
        cur.advance(7.0);
        for share in &data.group_shares {
            cur.ensure_space(6.0);
            cur.text(&font, 9.0, MARGIN, &share.created_at.format("%Y-%m-%d").to_string());
            cur.text(&font, 9.0, 42.0, &truncate(&share.group_name, 20));
            cur.text(&font, 9.0, 85.0, &truncate(&share.description, 35));
            cur.text(&font, 9.0, 145.0, if share.is_settled { "settled" } else { "owed" });
            cur.text(&font, 9.0, 165.0, &money(share.amount));
            cur.advance(5.5);
        }
    }

    drop(cur);
    doc.save_to_bytes().map_err(pdf_err)
}

// =============================================================================
// Excel
// =============================================================================

fn as_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

pub fn render_xlsx(data: &ReportData) -> AppResult<Vec<u8>> {
    build_workbook(data).map_err(|e| AppError::Message(format!("Failed to render workbook: {e}")))
}

fn build_workbook(data: &ReportData) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let amount = Format::new().set_num_format("#,##0.00");

    let summary = workbook.add_worksheet();
    summary.set_name("Summary")?;
    summary.set_column_width(0, 24)?;
    summary.set_column_width(1, 16)?;
    summary.write_string_with_format(0, 0, "PayDhan Financial Report", &bold)?;
    summary.write_string(1, 0, "From")?;
    summary.write_string(1, 1, data.from.format("%Y-%m-%d").to_string())?;
    summary.write_string(2, 0, "To")?;
    summary.write_string(2, 1, data.to.format("%Y-%m-%d").to_string())?;

    summary.write_string(4, 0, "Total income")?;
    summary.write_number_with_format(4, 1, as_f64(data.total_for(EntryType::Income)), &amount)?;
    summary.write_string(5, 0, "Total expense")?;
    summary.write_number_with_format(5, 1, as_f64(data.total_for(EntryType::Expense)), &amount)?;
    summary.write_string(6, 0, "Net balance")?;
    summary.write_number_with_format(6, 1, as_f64(data.net()), &amount)?;
    summary.write_string(7, 0, "Transactions")?;
    summary.write_number(7, 1, data.payments.len() as f64)?;

    let mut row = 9;
    if data.include_group_expenses {
        summary.write_string(8, 0, "Owed in groups")?;
        summary.write_number_with_format(8, 1, as_f64(data.owed_total()), &amount)?;
        row = 10;
    }

    summary.write_string_with_format(row, 0, "Category", &bold)?;
    summary.write_string_with_format(row, 1, "Type", &bold)?;
    summary.write_string_with_format(row, 2, "Total", &bold)?;
    for (name, kind, total) in data.by_category() {
        row += 1;
        summary.write_string(row, 0, name)?;
        summary.write_string(row, 1, kind)?;
        summary.write_number_with_format(row, 2, as_f64(total), &amount)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Transactions")?;
    for (col, header) in ["Date", "Type", "Category", "Description", "Method", "Amount"]
        .iter()
        .enumerate()
    {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    sheet.set_column_width(3, 40)?;
    for (i, p) in data.payments.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, p.payment_date.format("%Y-%m-%d").to_string())?;
        sheet.write_string(r, 1, &p.payment_type)?;
        sheet.write_string(r, 2, p.category_name.as_deref().unwrap_or(""))?;
        sheet.write_string(r, 3, p.description.as_deref().unwrap_or(""))?;
        sheet.write_string(r, 4, p.payment_method.as_deref().unwrap_or(""))?;
        sheet.write_number_with_format(r, 5, as_f64(p.amount), &amount)?;
    }

    if data.include_group_expenses {
        let shares = workbook.add_worksheet();
        shares.set_name("Group Expenses")?;
        for (col, header) in ["Date", "Group", "Description", "Status", "Amount"].iter().enumerate() {
            shares.write_string_with_format(0, col as u16, *header, &bold)?;
        }
        for (i, s) in data.group_shares.iter().enumerate() {
            let r = i as u32 + 1;
            shares.write_string(r, 0, s.created_at.format("%Y-%m-%d").to_string())?;
            shares.write_string(r, 1, &s.group_name)?;
            shares.write_string(r, 2, &s.description)?;
            shares.write_string(r, 3, if s.is_settled { "settled" } else { "owed" })?;
            shares.write_number_with_format(r, 4, as_f64(s.amount), &amount)?;
        }
    }

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn payment(kind: &str, amount: &str, category: Option<&str>) -> Payment {
        let now = Utc::now().naive_utc();
        Payment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: Decimal::from_str(amount).unwrap(),
            payment_type: kind.to_string(),
            category_id: None,
            category_name: category.map(String::from),
            description: Some("Lunch with the team at the office canteen".to_string()),
            payment_method: Some("upi".to_string()),
            payment_date: now.date(),
            created_at: now,
            updated_at: now,
        }
    }

    fn data(rows: usize) -> ReportData {
        let mut payments = vec![
            payment("income", "50000", Some("Salary")),
            payment("expense", "1200.50", Some("Food")),
            payment("expense", "300", None),
        ];
        for _ in 0..rows {
            payments.push(payment("expense", "10", Some("Food")));
        }
        ReportData {
            from: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            payments,
            group_shares: vec![OwedShare {
                expense_id: Uuid::new_v4(),
                group_name: "Goa trip".to_string(),
                description: "Hotel".to_string(),
                amount: Decimal::from(2500),
                is_settled: false,
                created_at: Utc::now().naive_utc(),
            }],
            include_group_expenses: true,
        }
    }

    #[test]
    fn test_totals() {
        let data = data(0);
        assert_eq!(data.total_for(EntryType::Income), Decimal::from(50000));
        assert_eq!(data.total_for(EntryType::Expense), Decimal::from_str("1500.50").unwrap());
        assert_eq!(data.net(), Decimal::from_str("48499.50").unwrap());
        assert_eq!(data.owed_total(), Decimal::from(2500));

        let categories = data.by_category();
        assert_eq!(categories.len(), 3);
        assert!(categories.iter().any(|(name, _, _)| name == "Uncategorized"));
    }

    #[test]
    fn test_filename() {
        let data = data(0);
        assert_eq!(data.filename(ReportFormat::Pdf), "paydhan-report-2024-04-01-2024-04-30.pdf");
        assert_eq!(data.filename(ReportFormat::Excel), "paydhan-report-2024-04-01-2024-04-30.xlsx");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(ReportFormat::from_str("PDF").unwrap(), ReportFormat::Pdf);
        assert_eq!(ReportFormat::from_str("excel").unwrap(), ReportFormat::Excel);
        assert!(ReportFormat::from_str("csv").is_err());
    }

    #[test]
    fn test_render_pdf_paginates() {
        let bytes = render_pdf(&data(200)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_xlsx_is_zip() {
        let bytes = render_xlsx(&data(5)).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
