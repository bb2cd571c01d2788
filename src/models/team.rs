use bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;

/// Legislators a team has benched. Older documents store this as a
/// comma-joined string of ids; both shapes are read, an array is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchSet(BTreeSet<ObjectId>);

impl BenchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_comma_joined(raw: &str) -> Self {
        BenchSet(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| ObjectId::parse_str(s).ok())
                .collect(),
        )
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.0.contains(id)
    }

    pub fn insert(&mut self, id: ObjectId) -> bool {
        self.0.insert(id)
    }

    pub fn remove(&mut self, id: &ObjectId) -> bool {
        self.0.remove(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectId> {
        self.0.iter()
    }
}

impl FromIterator<ObjectId> for BenchSet {
    fn from_iter<I: IntoIterator<Item = ObjectId>>(iter: I) -> Self {
        BenchSet(iter.into_iter().collect())
    }
}

impl Serialize for BenchSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.iter().collect::<Vec<_>>().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BenchSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Ids(Vec<ObjectId>),
            Joined(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Ids(ids)) => ids.into_iter().collect(),
            Some(Raw::Joined(raw)) => BenchSet::from_comma_joined(&raw),
            None => BenchSet::new(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub name: String,

    #[serde(rename = "ownerId")]
    pub owner_id: String,

    #[serde(rename = "leagueId")]
    pub league_id: ObjectId,

    #[serde(rename = "legislatorIds", default)]
    pub legislator_ids: Vec<ObjectId>,

    #[serde(rename = "benchLegislatorIds", default)]
    pub bench: BenchSet,

    #[serde(default)]
    pub wins: u32,

    #[serde(default)]
    pub losses: u32,

    #[serde(default)]
    pub ties: u32,
}

impl Team {
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>, league_id: ObjectId) -> Self {
        Team {
            id: None,
            name: name.into(),
            owner_id: owner_id.into(),
            league_id,
            legislator_ids: Vec::new(),
            bench: BenchSet::new(),
            wins: 0,
            losses: 0,
            ties: 0,
        }
    }

    /// Roster members whose points count toward the weekly score.
    pub fn active_legislator_ids(&self) -> Vec<ObjectId> {
        self.legislator_ids
            .iter()
            .filter(|id| !self.bench.contains(id))
            .copied()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}
