//! Report storage

use rusqlite::{params, Row};

use super::{parse_datetime, Database, SQLITE_DATETIME};
use crate::error::{Error, Result};
use crate::models::{Report, ReportContent, ReportType};

const REPORT_COLUMNS: &str =
    "id, case_id, case_title, report_type, description, content, created_at";

/// Raw columns; content is decoded outside the rusqlite closure
struct ReportRow {
    id: i64,
    case_id: String,
    case_title: String,
    report_type: String,
    description: String,
    content: String,
    created_at: String,
}

fn report_row(row: &Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get(0)?,
        case_id: row.get(1)?,
        case_title: row.get(2)?,
        report_type: row.get(3)?,
        description: row.get(4)?,
        content: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl ReportRow {
    fn into_report(self) -> Result<Report> {
        let report_type: ReportType = self.report_type.parse().map_err(Error::InvalidData)?;
        // Decode by the stored type rather than relying on untagged matching
        let content = match report_type {
            ReportType::Summary => ReportContent::Summary(serde_json::from_str(&self.content)?),
            ReportType::InDepthAnalysis => {
                ReportContent::InDepth(serde_json::from_str(&self.content)?)
            }
        };
        Ok(Report {
            id: Some(self.id),
            case_id: self.case_id,
            case_title: self.case_title,
            report_type,
            description: self.description,
            content,
            created_at: parse_datetime(&self.created_at),
        })
    }
}

impl Database {
    pub fn store_report(&self, report: &Report) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO reports (case_id, case_title, report_type, description, content, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                report.case_id,
                report.case_title,
                report.report_type.as_str(),
                report.description,
                serde_json::to_string(&report.content)?,
                report.created_at.format(SQLITE_DATETIME).to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent reports first, optionally for one case
    pub fn recent_reports(&self, case_id: Option<&str>) -> Result<Vec<Report>> {
        let conn = self.conn()?;
        let rows = match case_id {
            Some(case_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM reports WHERE case_id = ? ORDER BY id DESC",
                    REPORT_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![case_id], report_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM reports ORDER BY id DESC",
                    REPORT_COLUMNS
                ))?;
                let rows = stmt
                    .query_map([], report_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };
        rows.into_iter().map(ReportRow::into_report).collect()
    }

    pub fn report_by_id(&self, id: i64) -> Result<Option<Report>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM reports WHERE id = ?",
            REPORT_COLUMNS
        ))?;
        let row = stmt.query_map(params![id], report_row)?.next().transpose()?;
        row.map(ReportRow::into_report).transpose()
    }
}
