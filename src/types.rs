use serde::{Deserialize, Serialize};

/// A geographic point. Range validation is left to the backend's `geo_point`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f32,
    pub lon: f32,
}

/// A postal record as stored in the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub ciudad: String,
    #[serde(default)]
    pub colonia: String,
    #[serde(default)]
    pub cp: String,
    #[serde(default)]
    pub delegacion: String,
    #[serde(default)]
    pub location: Location,
}

/// Caller-supplied fields for create and update. The id is always assigned
/// by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    #[serde(default)]
    pub ciudad: String,
    #[serde(default)]
    pub colonia: String,
    #[serde(default)]
    pub cp: String,
    #[serde(default)]
    pub delegacion: String,
    #[serde(default)]
    pub location: Location,
}

impl NewDocument {
    pub fn with_id(self, id: impl Into<String>) -> Document {
        Document {
            id: id.into(),
            ciudad: self.ciudad,
            colonia: self.colonia,
            cp: self.cp,
            delegacion: self.delegacion,
            location: self.location,
        }
    }
}

impl From<Document> for NewDocument {
    fn from(doc: Document) -> Self {
        Self {
            ciudad: doc.ciudad,
            colonia: doc.colonia,
            cp: doc.cp,
            delegacion: doc.delegacion,
            location: doc.location,
        }
    }
}
