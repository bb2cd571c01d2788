// src/models/feeds.rs
//! Wire shapes of the Legislative Yuan feeds. Field names are the feeds' own
//! (mostly Chinese) keys.

use serde::{Deserialize, Deserializer, Serialize};

/// One page from the `ly.govapi.tw` v2 API. The item array is keyed by
/// resource name, so every known key is aliased onto `items`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct LyPage<T> {
    #[serde(default)]
    pub total: u64,

    #[serde(default)]
    pub total_page: u32,

    #[serde(default)]
    pub page: u32,

    #[serde(
        default,
        alias = "bills",
        alias = "interpellations",
        alias = "legislators",
        alias = "meets"
    )]
    pub items: Vec<T>,

    /// Present when the API answers with an error-shaped body.
    #[serde(default)]
    pub error: Option<serde_json::Value>,

    #[serde(default)]
    pub message: Option<String>,
}

impl<T> LyPage<T> {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| match e {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Bool(true) => self.message.clone().unwrap_or_else(|| "error".to_string()),
            other => other.to_string(),
        })
    }

    pub fn is_error(&self) -> bool {
        !matches!(self.error, None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)))
    }
}

/// A bill, as returned for both the proposer and the cosigner queries.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BillRecord {
    #[serde(rename = "議案編號", default)]
    pub bill_no: Option<String>,

    #[serde(rename = "議案名稱", default)]
    pub title: Option<String>,

    #[serde(rename = "提案日期", default)]
    pub proposal_date: Option<String>,

    #[serde(rename = "最新進度日期", default)]
    pub latest_progress_date: Option<String>,

    #[serde(rename = "議案狀態", default)]
    pub status: Option<String>,

    #[serde(rename = "法律編號", default, deserialize_with = "string_or_list")]
    pub law_numbers: Vec<String>,

    #[serde(rename = "提案單位/提案委員", default)]
    pub proposer_unit: Option<String>,

    #[serde(rename = "屆", default)]
    pub term: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct InterpellationRecord {
    #[serde(rename = "質詢編號", default)]
    pub interpellation_no: Option<String>,

    #[serde(rename = "刊登日期", default)]
    pub published_date: Option<String>,

    #[serde(rename = "事由", default)]
    pub reason: Option<String>,

    #[serde(rename = "說明", default)]
    pub explanation: Option<String>,

    #[serde(rename = "質詢委員", default, deserialize_with = "string_or_list")]
    pub interpellators: Vec<String>,

    #[serde(rename = "屆", default)]
    pub term: Option<u32>,

    #[serde(rename = "會期", default)]
    pub session: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LegislatorRecord {
    #[serde(rename = "委員姓名")]
    pub name: String,

    #[serde(rename = "委員英文姓名", default)]
    pub name_en: Option<String>,

    #[serde(rename = "黨籍", default)]
    pub party: Option<String>,

    #[serde(rename = "選區名稱", default)]
    pub region: Option<String>,

    #[serde(rename = "照片位址", default)]
    pub pic_url: Option<String>,

    #[serde(rename = "離職日期", default)]
    pub leave_date: Option<String>,

    #[serde(rename = "離職原因", default)]
    pub leave_reason: Option<String>,
}

/// Floor-speech feed (open-data dataset keyed by ROC date range).
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechFeed {
    #[serde(default, alias = "jsonList", alias = "dataList")]
    pub items: Vec<SpeechMeeting>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SpeechMeeting {
    /// ROC slashed date, e.g. `113/03/11`.
    #[serde(rename = "smeetingDate", default)]
    pub meeting_date: Option<String>,

    #[serde(rename = "meetingName", default)]
    pub meeting_name: Option<String>,

    #[serde(rename = "meetingRoom", default)]
    pub meeting_room: Option<String>,

    /// Comma-joined `"0001 王小明,0002 李大華"`.
    #[serde(default)]
    pub speechers: Option<String>,
}

/// Roll-call vote index: either a bare list or wrapped under `jsonList`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RollcallIndex {
    Wrapped {
        #[serde(alias = "jsonList", alias = "dataList")]
        items: Vec<RollcallEvent>,
    },
    List(Vec<RollcallEvent>),
}

impl RollcallIndex {
    pub fn into_events(self) -> Vec<RollcallEvent> {
        match self {
            RollcallIndex::Wrapped { items } => items,
            RollcallIndex::List(items) => items,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RollcallEvent {
    #[serde(alias = "voteId", alias = "id", default)]
    pub vote_id: Option<String>,

    #[serde(alias = "voteTitle", alias = "subject", default)]
    pub title: String,

    /// ROC slashed date.
    #[serde(alias = "meetingDate", alias = "voteDate", default)]
    pub date: Option<String>,

    /// Spreadsheet download.
    #[serde(alias = "fileUrl", alias = "url", default)]
    pub file_url: Option<String>,
}

/// Accepts `"a"`, `"a;b"`, `["a", "b"]` or null.
fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::One(s)) => s
            .split([';', '、'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Raw::Many(v)) => v,
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bill_page_reads_chinese_keys() {
        let body = r#"{
            "total": 2, "total_page": 1, "page": 1,
            "bills": [
                {"議案編號": "202110012340000", "議案名稱": "公平交易法修正草案",
                 "提案日期": "2024-03-11", "議案狀態": "三讀", "法律編號": ["01234"]},
                {"議案編號": "202110012350000", "議案狀態": null, "法律編號": "05678"}
            ]
        }"#;
        let page: LyPage<BillRecord> = serde_json::from_str(body).unwrap();
        assert_eq!(page.total_page, 1);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].law_numbers, vec!["01234".to_string()]);
        assert_eq!(page.items[1].law_numbers, vec!["05678".to_string()]);
        assert!(!page.is_error());
    }

    #[test]
    fn error_shaped_body_is_detected() {
        let page: LyPage<BillRecord> =
            serde_json::from_str(r#"{"error": true, "message": "not found"}"#).unwrap();
        assert!(page.is_error());
        assert_eq!(page.error_message().as_deref(), Some("not found"));
        assert!(page.items.is_empty());
    }

    #[test]
    fn rollcall_index_accepts_both_shapes() {
        let wrapped: RollcallIndex = serde_json::from_str(
            r#"{"jsonList": [{"voteId": "1", "voteTitle": "預算案", "meetingDate": "113/03/12", "fileUrl": "https://x/1.xlsx"}]}"#,
        )
        .unwrap();
        let bare: RollcallIndex =
            serde_json::from_str(r#"[{"id": "2", "subject": "條例", "voteDate": "113/03/13"}]"#).unwrap();
        assert_eq!(wrapped.into_events()[0].title, "預算案");
        assert_eq!(bare.into_events()[0].vote_id.as_deref(), Some("2"));
    }
}
