use agent_scorecard::workflows::linkage::{
    ApplicantFilter, ApplicantRow, ApplicantSource, AssessmentSource, SourceError,
};
use chrono::{DateTime, Local, NaiveDateTime};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::path::Path;

const APPLICANT_QUERY: &str = "SELECT DISTINCT
    pa.id AS applicant_id,
    pa.first_name,
    pa.last_name,
    pa.email,
    pa.created_at AS application_date,
    pr.position AS requisition_position,
    pr.client_id,
    pc.name AS client_name
FROM portal_applicants pa
JOIN portal_requisitions pr ON pa.requisition_id = pr.id
JOIN portal_clients pc ON pr.client_id = pc.id";

const RESUME_QUERY: &str = "SELECT
    rs.applicant_id,
    rs.resume_only_score,
    rs.resume_only_education
FROM portal_resume_scores rs";

const JAKIB_QUERY: &str = "SELECT
    jr.applicant_id,
    jr.score AS jakib_score,
    jr.decision AS jakib_decision
FROM portal_jakib_results jr";

/// Applicant store backed by a SQLite copy of the applicant portal tables.
pub(crate) struct SqliteApplicantSource {
    conn: Connection,
}

impl SqliteApplicantSource {
    pub(crate) fn open(path: &Path) -> Result<Self, SourceError> {
        let conn = Connection::open(path).map_err(unavailable)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

fn unavailable(err: rusqlite::Error) -> SourceError {
    SourceError::Unavailable(err.to_string())
}

fn render_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(number) => Some(number.to_string()),
        ValueRef::Real(number) => Some(number.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn in_clause(column: &str, count: usize) -> String {
    let placeholders: Vec<String> = (1..=count).map(|idx| format!("?{idx}")).collect();
    format!("\nWHERE {column} IN ({})", placeholders.join(", "))
}

/// Runs `sql` with `ids` bound in order and returns every row keyed by column name.
fn query_rows(conn: &Connection, sql: &str, ids: &[i64]) -> Result<Vec<ApplicantRow>, SourceError> {
    let mut stmt = conn.prepare(sql).map_err(unavailable)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut rows = stmt
        .query(rusqlite::params_from_iter(ids.iter()))
        .map_err(unavailable)?;

    let mut collected = Vec::new();
    while let Some(row) = rows.next().map_err(unavailable)? {
        let mut record = ApplicantRow::new();
        for (idx, column) in columns.iter().enumerate() {
            if let Some(value) = render_value(row.get_ref(idx).map_err(unavailable)?) {
                record.insert(column.clone(), value);
            }
        }
        collected.push(record);
    }
    Ok(collected)
}

impl ApplicantSource for SqliteApplicantSource {
    fn fetch(&self, filter: &ApplicantFilter) -> Result<Vec<ApplicantRow>, SourceError> {
        let mut sql = APPLICANT_QUERY.to_string();
        if !filter.client_ids.is_empty() {
            sql.push_str(&in_clause("pc.id", filter.client_ids.len()));
        }
        sql.push_str("\nORDER BY pa.created_at DESC");
        query_rows(&self.conn, &sql, &filter.client_ids)
    }
}

/// Resume scores and AI assessment results from the same SQLite copy of the portal.
pub(crate) struct SqliteAssessmentSource {
    conn: Connection,
}

impl SqliteAssessmentSource {
    pub(crate) fn open(path: &Path) -> Result<Self, SourceError> {
        let conn = Connection::open(path).map_err(unavailable)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl AssessmentSource for SqliteAssessmentSource {
    /// Resume rows first, then assessment rows; both halves share `applicant_id`.
    fn fetch(&self, applicant_ids: &[i64]) -> Result<Vec<ApplicantRow>, SourceError> {
        if applicant_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut rows = Vec::new();
        for query in [RESUME_QUERY, JAKIB_QUERY] {
            let sql = format!(
                "{query}{}",
                in_clause("applicant_id", applicant_ids.len())
            );
            rows.extend(query_rows(&self.conn, &sql, applicant_ids)?);
        }
        Ok(rows)
    }
}

/// Wall-clock time for artifact names and the semantic processed timestamp.
pub(crate) fn now() -> NaiveDateTime {
    let now: DateTime<Local> = Local::now();
    now.naive_local()
}

pub(crate) fn artifact_stamp(at: NaiveDateTime) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn seeded() -> SqliteApplicantSource {
        let conn = Connection::open_in_memory().expect("in-memory sqlite");
        conn.execute_batch(
            "CREATE TABLE portal_clients (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE portal_requisitions (id INTEGER PRIMARY KEY, client_id INTEGER, position TEXT);
             CREATE TABLE portal_applicants (
                 id INTEGER PRIMARY KEY, first_name TEXT, last_name TEXT, email TEXT,
                 created_at TEXT, requisition_id INTEGER
             );
             INSERT INTO portal_clients VALUES (53, 'AEP'), (625, 'AEP Energy'), (999, 'Other');
             INSERT INTO portal_requisitions VALUES (1, 53, 'CSR'), (2, 625, 'CSR II'), (3, 999, 'Sales');
             INSERT INTO portal_applicants VALUES
                 (298188, 'Ashley', 'Clowser', 'ashley@example.com', '2018-08-18 10:00:00', 1),
                 (28207, 'Michael', 'Marks', NULL, '2016-01-26', 2),
                 (34899, 'Aaron', 'Holycross', 'aaron@example.com', '2016-02-22', 3);",
        )
        .expect("seed schema");
        SqliteApplicantSource::from_connection(conn)
    }

    #[test]
    fn fetch_filters_by_client_and_orders_newest_first() {
        let source = seeded();
        let rows = source
            .fetch(&ApplicantFilter::for_clients(vec![53, 625]))
            .expect("query succeeds");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["first_name"], "Ashley");
        assert_eq!(rows[0]["client_name"], "AEP");
        assert_eq!(rows[0]["applicant_id"], "298188");
        assert_eq!(rows[1]["requisition_position"], "CSR II");
        assert!(!rows[1].contains_key("email"));
    }

    #[test]
    fn empty_filter_returns_every_client() {
        let rows = seeded()
            .fetch(&ApplicantFilter::default())
            .expect("query succeeds");
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn missing_tables_surface_as_unavailable() {
        let source = SqliteApplicantSource::from_connection(
            Connection::open_in_memory().expect("in-memory sqlite"),
        );
        let err = source
            .fetch(&ApplicantFilter::default())
            .expect_err("no schema");
        assert!(matches!(err, SourceError::Unavailable(_)));
    }

    fn seeded_assessments() -> SqliteAssessmentSource {
        let conn = Connection::open_in_memory().expect("in-memory sqlite");
        conn.execute_batch(
            "CREATE TABLE portal_resume_scores (
                 applicant_id INTEGER, resume_only_score REAL, resume_only_education TEXT
             );
             CREATE TABLE portal_jakib_results (applicant_id INTEGER, score REAL, decision TEXT);
             INSERT INTO portal_resume_scores VALUES
                 (298188, 85.5, 'High School'), (28207, 92.3, 'Bachelor''s Degree');
             INSERT INTO portal_jakib_results VALUES
                 (298188, 78.5, 'hire'), (34899, 60.0, 'no_hire');",
        )
        .expect("seed schema");
        SqliteAssessmentSource::from_connection(conn)
    }

    #[test]
    fn assessment_rows_cover_both_tables_for_requested_ids() {
        let rows = seeded_assessments()
            .fetch(&[298188, 28207])
            .expect("query succeeds");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["resume_only_score"], "85.5");
        assert_eq!(rows[2]["jakib_decision"], "hire");
        assert_eq!(rows[2]["jakib_score"], "78.5");
        assert!(rows.iter().all(|row| row["applicant_id"] != "34899"));
    }

    #[test]
    fn empty_id_list_skips_the_store() {
        let source = SqliteAssessmentSource::from_connection(
            Connection::open_in_memory().expect("in-memory sqlite"),
        );
        assert!(source.fetch(&[]).expect("no query").is_empty());
    }

    #[test]
    fn artifact_stamp_uses_compact_timestamp() {
        let at = NaiveDate::from_ymd_opt(2025, 9, 3)
            .and_then(|date| date.and_hms_opt(7, 4, 5))
            .expect("timestamp");
        assert_eq!(artifact_stamp(at), "20250903_070405");
    }
}
