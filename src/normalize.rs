// Ingestion boundary for rows coming out of the data layer.
//
// The query client returns a joined relation either as a bare object or as an
// array holding one object, depending on how the relationship is declared.
// Everything is flattened here so the report code only ever sees
// `Option<T>` relations on a typed `Tender`.
use crate::types::{Employee, Minor, NamedRef, Tender, TenderStage, TenderStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A joined relation as returned by the query layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Joined<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Joined<T> {
    pub fn into_first(self) -> Option<T> {
        match self {
            Joined::Many(items) => items.into_iter().next(),
            Joined::One(item) => Some(item),
        }
    }
}

/// `null` / missing -> `None`, object -> `Some`, array -> first element.
pub fn first_joined<T>(value: Option<Joined<T>>) -> Option<T> {
    value.and_then(Joined::into_first)
}

/// Tender row as serialized by the data layer, relations still nested.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTender {
    pub id: String,
    pub company_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub status: TenderStatus,
    #[serde(default)]
    pub stage: Option<Joined<TenderStage>>,
    #[serde(default, alias = "type")]
    pub tender_type: Option<Joined<NamedRef>>,
    #[serde(default)]
    pub platform: Option<Joined<NamedRef>>,
    #[serde(default)]
    pub manager: Option<Joined<Employee>>,
    #[serde(default)]
    pub specialist: Option<Joined<Employee>>,
    #[serde(default)]
    pub nmck: Option<Minor>,
    #[serde(default)]
    pub contract_price: Option<Minor>,
    #[serde(default)]
    pub submission_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub loss_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RawTender {
    pub fn normalize(self) -> Tender {
        let loss_reason = self
            .loss_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        Tender {
            title: self.title.unwrap_or_default().trim().to_string(),
            status: self.status,
            stage: first_joined(self.stage),
            tender_type: first_joined(self.tender_type),
            platform: first_joined(self.platform),
            manager: first_joined(self.manager),
            specialist: first_joined(self.specialist),
            nmck: self.nmck.unwrap_or(0),
            contract_price: self.contract_price,
            submission_deadline: self.submission_deadline,
            loss_reason,
            updated_at: self.updated_at.unwrap_or(self.created_at),
            created_at: self.created_at,
            id: self.id,
            company_id: self.company_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StageCategory;

    fn parse(json: &str) -> Tender {
        serde_json::from_str::<RawTender>(json).unwrap().normalize()
    }

    #[test]
    fn first_joined_handles_every_shape() {
        assert_eq!(first_joined::<u32>(None), None);
        assert_eq!(first_joined(Some(Joined::One(7))), Some(7));
        assert_eq!(first_joined(Some(Joined::Many(vec![3, 4]))), Some(3));
        assert_eq!(first_joined::<u32>(Some(Joined::Many(vec![]))), None);
    }

    #[test]
    fn object_and_array_relations_flatten_the_same() {
        let as_object = parse(
            r#"{"id":"t1","company_id":"c1","status":"won",
                "stage":{"id":"s1","name":"Подача","category":"tender_dept"},
                "manager":{"id":"e1","full_name":"Иванов"},
                "nmck":150000,"created_at":"2024-03-01T10:00:00Z"}"#,
        );
        let as_array = parse(
            r#"{"id":"t1","company_id":"c1","status":"won",
                "stage":[{"id":"s1","name":"Подача","category":"tender_dept"}],
                "manager":[{"id":"e1","full_name":"Иванов"}],
                "nmck":150000,"created_at":"2024-03-01T10:00:00Z"}"#,
        );
        assert_eq!(as_object, as_array);
        let stage = as_object.stage.unwrap();
        assert_eq!(stage.category, StageCategory::TenderDept);
        assert_eq!(as_object.manager.unwrap().id, "e1");
    }

    #[test]
    fn null_relations_and_missing_fields_default() {
        let t = parse(
            r#"{"id":"t2","company_id":"c1","status":"draft","stage":null,
                "type":[],"loss_reason":"  ","created_at":"2024-03-01T10:00:00Z"}"#,
        );
        assert!(t.stage.is_none());
        assert!(t.tender_type.is_none());
        assert_eq!(t.nmck, 0);
        assert_eq!(t.loss_reason, None);
        assert_eq!(t.updated_at, t.created_at);
    }
}
