use anyhow::Result;
use chrono::NaiveDate;
use std::io::Write;

use crate::application::BalanceSheet;
use crate::domain::{DATE_FORMAT, format_date_time, format_millis};

/// The two tables of the balance sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    /// Every user's share of every expense
    Individual,
    /// One row per expense
    Overall,
}

impl SheetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetKind::Individual => "individual",
            SheetKind::Overall => "overall",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "individual" => Some(SheetKind::Individual),
            "overall" => Some(SheetKind::Overall),
            _ => None,
        }
    }

    /// Attachment name, e.g. `balance-sheet-for-2024-06-15-overall.csv`.
    pub fn file_name(&self, date: Option<NaiveDate>) -> String {
        match date {
            Some(date) => format!(
                "balance-sheet-for-{}-{}.csv",
                date.format(DATE_FORMAT),
                self.as_str()
            ),
            None => format!("balance-sheet-{}.csv", self.as_str()),
        }
    }
}

/// Exporter for converting a balance sheet to CSV
pub struct Exporter<'a> {
    sheet: &'a BalanceSheet,
}

impl<'a> Exporter<'a> {
    pub fn new(sheet: &'a BalanceSheet) -> Self {
        Self { sheet }
    }

    /// Write the requested table, returning the number of data rows.
    pub fn export_csv<W: Write>(&self, kind: SheetKind, writer: W) -> Result<usize> {
        match kind {
            SheetKind::Individual => self.export_individual_csv(writer),
            SheetKind::Overall => self.export_overall_csv(writer),
        }
    }

    /// Export every participation, grouped by user
    pub fn export_individual_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "User ID",
            "Email",
            "Expense ID",
            "Title",
            "Description",
            "Expense Date",
            "Amount Owed",
        ])?;

        for entry in &self.sheet.individual {
            csv_writer.write_record(&[
                entry.user_id.to_string(),
                entry.email.clone(),
                entry.expense_id.to_string(),
                entry.title.clone(),
                entry.description.clone().unwrap_or_default(),
                format_date_time(entry.occurred_at),
                format_millis(entry.amount_owed),
            ])?;
        }

        csv_writer.flush()?;
        Ok(self.sheet.individual.len())
    }

    /// Export one row per expense
    pub fn export_overall_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "Expense ID",
            "Title",
            "Description",
            "Expense Date",
            "Total Amount",
            "Split Method",
        ])?;

        for expense in &self.sheet.overall {
            csv_writer.write_record(&[
                expense.id.to_string(),
                expense.title.clone(),
                expense.description.clone().unwrap_or_default(),
                format_date_time(expense.occurred_at),
                format_millis(expense.total_amount),
                expense.split_method.as_str().to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(self.sheet.overall.len())
    }
}
