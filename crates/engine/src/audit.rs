use crate::error::Result;
use reco_protocol::{
    JobLevel, RecommendationRequest, RecommendationResponse, RecommendedProduct, UseCase, Volume,
};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// One recommendation as it lands in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: u64,
    pub job_title: String,
    pub job_family: String,
    pub job_level: JobLevel,
    pub use_case: UseCase,
    pub volume: Volume,
    pub bundle_id: String,
    pub total_duration_min: u32,
    pub constructs_covered: Vec<String>,
    pub request: RecommendationRequest,
    pub products: Vec<RecommendedProduct>,
}

impl AuditRecord {
    #[must_use]
    pub fn new(req: &RecommendationRequest, resp: &RecommendationResponse) -> Self {
        Self::at(unix_now(), req, resp)
    }

    #[must_use]
    pub fn at(timestamp: u64, req: &RecommendationRequest, resp: &RecommendationResponse) -> Self {
        Self {
            timestamp,
            job_title: req.job_title.clone(),
            job_family: req.job_family.clone(),
            job_level: req.job_level,
            use_case: req.use_case,
            volume: req.volume,
            bundle_id: resp.bundle_id.clone(),
            total_duration_min: resp.total_duration_min,
            constructs_covered: resp.constructs_covered.clone(),
            request: req.clone(),
            products: resp.products.clone(),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Receives every completed recommendation.
pub trait AuditSink: Send + Sync {
    fn record(&self, req: &RecommendationRequest, resp: &RecommendationResponse) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _req: &RecommendationRequest, _resp: &RecommendationResponse) -> Result<()> {
        Ok(())
    }
}

/// Appends one JSON object per line.
#[derive(Debug)]
pub struct JsonlAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlAuditSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        log::debug!("Audit log opened at {}", path.display());
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, req: &RecommendationRequest, resp: &RecommendationResponse) -> Result<()> {
        let mut line = serde_json::to_string(&AuditRecord::new(req, resp))?;
        line.push('\n');

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reco_protocol::BudgetTier;

    fn request() -> RecommendationRequest {
        RecommendationRequest {
            job_title: "Contact Centre Agent".to_string(),
            job_description: "Inbound calls".to_string(),
            job_family: "customer_service".to_string(),
            job_level: JobLevel::Entry,
            use_case: UseCase::Selection,
            volume: Volume::High,
            assessment_budget: BudgetTier::Low,
            max_total_duration_min: 40,
            must_have_constructs: Vec::new(),
            nice_to_have_constructs: Vec::new(),
            languages: vec!["en".to_string()],
            unsupervised_ok: true,
        }
    }

    fn response() -> RecommendationResponse {
        RecommendationResponse {
            bundle_id: "AUTO_BUNDLE_V1".to_string(),
            products: vec![RecommendedProduct {
                product_id: "VERIFY_G_PLUS".to_string(),
                name: "Verify G+".to_string(),
                reason: "fit".to_string(),
                max_duration_min: 36,
            }],
            total_duration_min: 36,
            constructs_covered: vec!["cognitive_ability".to_string()],
            debug: None,
        }
    }

    #[test]
    fn record_copies_request_and_bundle_summary() {
        let record = AuditRecord::at(1_700_000_000, &request(), &response());
        assert_eq!(record.timestamp, 1_700_000_000);
        assert_eq!(record.job_family, "customer_service");
        assert_eq!(record.job_level, JobLevel::Entry);
        assert_eq!(record.volume, Volume::High);
        assert_eq!(record.bundle_id, "AUTO_BUNDLE_V1");
        assert_eq!(record.total_duration_min, 36);
        assert_eq!(record.products[0].product_id, "VERIFY_G_PLUS");
        assert_eq!(record.request, request());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["job_level"], "entry");
        assert_eq!(json["use_case"], "selection");
    }

    #[test]
    fn jsonl_sink_appends_one_line_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("audit.jsonl");

        let sink = JsonlAuditSink::open(&path).unwrap();
        sink.record(&request(), &response()).unwrap();
        sink.record(&request(), &response()).unwrap();
        drop(sink);

        let reopened = JsonlAuditSink::open(&path).unwrap();
        reopened.record(&request(), &response()).unwrap();
        assert_eq!(reopened.path(), path.as_path());

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let record: AuditRecord = serde_json::from_str(line).unwrap();
            assert_eq!(record.job_title, "Contact Centre Agent");
            assert!(record.timestamp > 0);
        }
    }

    #[test]
    fn noop_sink_accepts_everything() {
        assert!(NoopAuditSink.record(&request(), &response()).is_ok());
    }
}
