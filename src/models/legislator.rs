use bson::oid::ObjectId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Legislator {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Id used by the LY site, taken from the photo URL.
    #[serde(rename = "externalId", skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(rename = "nameCh")]
    pub name_ch: String,

    #[serde(rename = "nameEn", skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,

    /// Free text; party names are compared as opaque strings.
    pub party: String,

    #[serde(rename = "region", default)]
    pub region: String,

    #[serde(rename = "picUrl", skip_serializing_if = "Option::is_none")]
    pub pic_url: Option<String>,

    #[serde(rename = "isLeave", default)]
    pub is_leave: bool,

    #[serde(rename = "leaveDate", skip_serializing_if = "Option::is_none")]
    pub leave_date: Option<NaiveDate>,

    #[serde(rename = "leaveReason", skip_serializing_if = "Option::is_none")]
    pub leave_reason: Option<String>,

    #[serde(rename = "errorFlag", default)]
    pub error_flag: bool,

    #[serde(rename = "errorReason", skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,

    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Legislator {
    pub fn new(name_ch: impl Into<String>, party: impl Into<String>) -> Self {
        Legislator {
            id: None,
            external_id: None,
            name_ch: name_ch.into(),
            name_en: None,
            party: party.into(),
            region: String::new(),
            pic_url: None,
            is_leave: false,
            leave_date: None,
            leave_reason: None,
            error_flag: false,
            error_reason: None,
            updated_at: None,
        }
    }
}

/// Selection of legislators for a sync run.
#[derive(Debug, Clone, Default)]
pub struct LegislatorFilter {
    pub name_contains: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl LegislatorFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        LegislatorFilter {
            name_contains: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn page(limit: Option<usize>, offset: Option<usize>) -> Self {
        LegislatorFilter {
            name_contains: None,
            limit,
            offset,
        }
    }
}

/// Pulls the LY member id out of a photo URL such as
/// `https://www.ly.gov.tw/Images/Legislators/100012.jpg`.
pub fn external_id_from_pic_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let file = path.rsplit('/').next()?;
    let stem = file.split('.').next()?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}
