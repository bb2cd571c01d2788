use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteChoice {
    #[serde(rename = "贊成")]
    For,
    #[serde(rename = "反對")]
    Against,
    #[serde(rename = "棄權")]
    Abstain,
}

impl VoteChoice {
    pub fn label(&self) -> &'static str {
        match self {
            VoteChoice::For => "贊成",
            VoteChoice::Against => "反對",
            VoteChoice::Abstain => "棄權",
        }
    }

    /// Recognises a section header such as `贊成：` or `反對:` (possibly with
    /// a head count after it).
    pub fn from_header(cell: &str) -> Option<VoteChoice> {
        let cell = cell.trim();
        [VoteChoice::For, VoteChoice::Against, VoteChoice::Abstain]
            .into_iter()
            .find(|choice| {
                cell.strip_prefix(choice.label())
                    .map(|rest| {
                        let rest = rest.trim_start();
                        rest.is_empty() || rest.starts_with(':') || rest.starts_with('：')
                    })
                    .unwrap_or(false)
            })
    }
}

/// One named vote read from a roll-call sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingData {
    #[serde(rename = "legislatorName")]
    pub legislator_name: String,
    pub vote: VoteChoice,
}

/// A vote attributed to a stored legislator.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVote {
    pub legislator_id: ObjectId,
    pub party: String,
    pub choice: VoteChoice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_recognised() {
        assert_eq!(VoteChoice::from_header("贊成："), Some(VoteChoice::For));
        assert_eq!(VoteChoice::from_header(" 反對: 12"), Some(VoteChoice::Against));
        assert_eq!(VoteChoice::from_header("棄權"), Some(VoteChoice::Abstain));
        assert_eq!(VoteChoice::from_header("贊成者名單如下"), None);
        assert_eq!(VoteChoice::from_header("0001 王小明"), None);
    }

    #[test]
    fn vote_serializes_with_chinese_label() {
        let data = VotingData {
            legislator_name: "王小明".to_string(),
            vote: VoteChoice::For,
        };
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            serde_json::json!({"legislatorName": "王小明", "vote": "贊成"})
        );
    }
}
