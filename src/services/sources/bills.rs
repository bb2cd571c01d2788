// src/services/sources/bills.rs

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use super::{LegislatorSource, LyApi};
use crate::errors::Result;
use crate::models::{
    feeds::BillRecord,
    legislator::Legislator,
    score::{is_passed, ScoreCategory},
    sync::NormalizedRecord,
};
use crate::services::week_calendar::parse_feed_date;

/// Which side of a bill the legislator is queried on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillRole {
    Proposer,
    Cosigner,
}

impl BillRole {
    fn query_key(&self) -> &'static str {
        match self {
            BillRole::Proposer => "提案人",
            BillRole::Cosigner => "連署人",
        }
    }

    fn category(&self) -> ScoreCategory {
        match self {
            BillRole::Proposer => ScoreCategory::ProposeBill,
            BillRole::Cosigner => ScoreCategory::CosignBill,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            BillRole::Proposer => "提案",
            BillRole::Cosigner => "連署",
        }
    }
}

pub struct BillSource {
    api: LyApi,
    role: BillRole,
}

impl BillSource {
    pub fn proposals(api: LyApi) -> Self {
        BillSource {
            api,
            role: BillRole::Proposer,
        }
    }

    pub fn cosigns(api: LyApi) -> Self {
        BillSource {
            api,
            role: BillRole::Cosigner,
        }
    }
}

#[async_trait]
impl LegislatorSource for BillSource {
    fn category(&self) -> ScoreCategory {
        self.role.category()
    }

    fn source_tag(&self) -> &'static str {
        match self.role {
            BillRole::Proposer => "proposals",
            BillRole::Cosigner => "cosigns",
        }
    }

    async fn fetch(&self, legislator: &Legislator) -> Result<Vec<NormalizedRecord>> {
        // The bills endpoint copes with mixed-script names, so the full name
        // is sent.
        let query = [
            (self.role.query_key(), legislator.name_ch.clone()),
            ("屆", self.api.term().to_string()),
        ];
        let bills: Vec<BillRecord> = self.api.fetch_all_pages("bills", &query).await?;
        Ok(bills
            .iter()
            .filter_map(|bill| normalize_bill(bill, self.role))
            .collect())
    }
}

/// `None` when the bill has no number or scores nothing for this role.
pub fn normalize_bill(bill: &BillRecord, role: BillRole) -> Option<NormalizedRecord> {
    let bill_number = match bill.bill_no.as_deref().map(str::trim) {
        Some(no) if !no.is_empty() => no.to_string(),
        _ => {
            warn!(title = ?bill.title, "Bill without a number, skipping");
            return None;
        }
    };

    let passed = is_passed(bill.status.as_deref());
    let category = role.category();
    let points = category.bill_points(passed)?;

    let date = bill
        .proposal_date
        .as_deref()
        .and_then(parse_feed_date)
        .or_else(|| bill.latest_progress_date.as_deref().and_then(parse_feed_date));

    let title = bill.title.clone().unwrap_or_else(|| bill_number.clone());

    Some(NormalizedRecord {
        category,
        date,
        points,
        description: format!("{}：{}", role.label(), title),
        bill_number: Some(bill_number),
        bill_title: bill.title.clone(),
        metadata: Some(json!({
            "status": bill.status,
            "passed": passed,
            "lawNumbers": bill.law_numbers,
            "proposer": bill.proposer_unit,
        })),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bill(status: Option<&str>, date: Option<&str>) -> BillRecord {
        BillRecord {
            bill_no: Some("202110012340000".to_string()),
            title: Some("公平交易法部分條文修正草案".to_string()),
            proposal_date: date.map(str::to_string),
            latest_progress_date: None,
            status: status.map(str::to_string),
            law_numbers: vec!["01234".to_string()],
            proposer_unit: Some("本院委員王小明等16人".to_string()),
            term: Some(11),
        }
    }

    #[test]
    fn passed_proposal_earns_base_plus_bonus() {
        let record = normalize_bill(&bill(Some("三讀通過"), Some("2024-03-11")), BillRole::Proposer)
            .unwrap();
        assert_eq!(record.category, ScoreCategory::ProposeBill);
        assert_eq!(record.points, 9.0);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 11));
        assert_eq!(record.bill_number.as_deref(), Some("202110012340000"));
        assert_eq!(record.metadata.unwrap()["passed"], true);
    }

    #[test]
    fn pending_proposal_earns_base_only() {
        let record =
            normalize_bill(&bill(Some("審查完畢"), Some("2024-03-11")), BillRole::Proposer).unwrap();
        assert_eq!(record.points, 3.0);
    }

    #[test]
    fn unpassed_cosign_is_dropped() {
        assert!(normalize_bill(&bill(Some("交付審查"), Some("2024-03-11")), BillRole::Cosigner).is_none());
        let passed = normalize_bill(&bill(Some("三讀"), Some("2024-03-11")), BillRole::Cosigner).unwrap();
        assert_eq!(passed.points, 3.0);
        assert!(passed.description.starts_with("連署"));
    }

    #[test]
    fn roc_dates_and_missing_dates_are_handled() {
        let roc = normalize_bill(&bill(None, Some("113/03/11")), BillRole::Proposer).unwrap();
        assert_eq!(roc.date, NaiveDate::from_ymd_opt(2024, 3, 11));
        let undated = normalize_bill(&bill(None, None), BillRole::Proposer).unwrap();
        assert_eq!(undated.date, None);
    }

    #[test]
    fn numberless_bill_is_skipped() {
        let mut record = bill(Some("三讀"), Some("2024-03-11"));
        record.bill_no = Some("  ".to_string());
        assert!(normalize_bill(&record, BillRole::Proposer).is_none());
    }
}
